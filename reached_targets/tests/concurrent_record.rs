//! Many threads recording into one bitset must never lose an update.

use std::{collections::BTreeSet, sync::atomic::AtomicU32, thread};

use rand::{rngs::SmallRng, Rng, SeedableRng};
use reached_bolts::SimpleStderrLogger;
use reached_targets::{ReachedAddressesBitset, BYTES_GRANULARITY};

const START: usize = 0x7f00_0000;
const BUCKETS: usize = 1 << 16;
const THREADS: usize = 8;
const PER_THREAD: usize = 10_000;

fn zeroed(words: usize) -> Vec<AtomicU32> {
    // Only the first test to get here installs the logger.
    let _ = SimpleStderrLogger::set_logger();
    log::set_max_level(log::LevelFilter::Debug);
    (0..words).map(|_| AtomicU32::new(0)).collect()
}

#[test]
fn test_concurrent_record_is_union() {
    let storage = zeroed(BUCKETS / 32);
    let end = START + BUCKETS * BYTES_GRANULARITY;
    let bitset = ReachedAddressesBitset::new(START, end, &storage);

    let addresses: Vec<Vec<usize>> = (0..THREADS)
        .map(|seed| {
            let mut rng = SmallRng::seed_from_u64(seed as u64);
            (0..PER_THREAD).map(|_| rng.gen_range(START..end)).collect()
        })
        .collect();

    thread::scope(|scope| {
        for chunk in &addresses {
            let bitset = &bitset;
            scope.spawn(move || {
                for &address in chunk {
                    bitset.record_address(address);
                }
            });
        }
    });

    let expected: Vec<usize> = addresses
        .iter()
        .flatten()
        .map(|address| (address - START) / BYTES_GRANULARITY * BYTES_GRANULARITY)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    assert_eq!(bitset.reached_offsets(), expected);
    assert_eq!(bitset.reached_count(), expected.len());
}

#[test]
fn test_contended_words() {
    // Few words, every thread hitting every bit of them in a different order.
    let buckets = 128;
    let storage = zeroed(buckets / 32);
    let end = START + buckets * BYTES_GRANULARITY;
    let bitset = ReachedAddressesBitset::new(START, end, &storage);

    thread::scope(|scope| {
        for thread_id in 0..THREADS {
            let bitset = &bitset;
            scope.spawn(move || {
                for round in 0..100 {
                    for bucket in 0..buckets {
                        let bucket = (bucket * 7 + thread_id + round) % buckets;
                        bitset.record_address(START + bucket * BYTES_GRANULARITY);
                    }
                    // Outside of the window on both ends.
                    bitset.record_address(START - 1 - thread_id);
                    bitset.record_address(end + thread_id);
                }
            });
        }
    });

    let expected: Vec<usize> = (0..buckets).map(|bucket| bucket * BYTES_GRANULARITY).collect();
    assert_eq!(bitset.reached_offsets(), expected);
}

#[test]
fn test_read_while_recording() {
    let storage = zeroed(BUCKETS / 32);
    let end = START + BUCKETS * BYTES_GRANULARITY;
    let bitset = ReachedAddressesBitset::new(START, end, &storage);

    thread::scope(|scope| {
        for seed in 0..THREADS {
            let bitset = &bitset;
            scope.spawn(move || {
                let mut rng = SmallRng::seed_from_u64(0x5eed + seed as u64);
                for _ in 0..PER_THREAD {
                    bitset.record_address(rng.gen_range(START..end));
                }
            });
        }

        // Read-outs racing the writers are incomplete, but always sorted and never shrinking.
        let mut previous = Vec::new();
        for _ in 0..50 {
            let offsets = bitset.reached_offsets();
            assert!(offsets.windows(2).all(|pair| pair[0] < pair[1]));
            let current: BTreeSet<usize> = offsets.iter().copied().collect();
            assert!(previous.iter().all(|offset| current.contains(offset)));
            previous = offsets;
        }
    });

    assert!(bitset.reached_count() > 0);
}
