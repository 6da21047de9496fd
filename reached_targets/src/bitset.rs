//! A lock-free bitset recording which buckets of an address window have been reached.
//!
//! Any number of threads may call [`ReachedAddressesBitset::record_address`] concurrently.
//! The read-out ([`ReachedAddressesBitset::reached_offsets`]) is memory safe while writers
//! are still running, but only complete once recording has stopped, for example after all
//! recording threads were joined.

use alloc::vec::Vec;
use core::{
    fmt,
    iter::{Enumerate, FusedIterator},
    slice::{self, Iter},
    sync::atomic::AtomicU32,
};

use num_traits::{One, PrimInt, Zero};
use reached_bolts::{
    math::{buckets_for_bytes, words_for_buckets, words_for_window},
    Error,
};

use crate::{word::BitWord, BYTES_GRANULARITY};

/// Records, with one bit per `GRANULARITY` bytes, which parts of the half-open address
/// window `[start_address, end_address)` have been reached.
///
/// The storage is borrowed, never owned: it is usually a zero-initialized static or a
/// region handed over by whoever sets up the observed program.
pub struct ReachedAddressesBitset<
    'a,
    W = AtomicU32,
    const GRANULARITY: usize = { BYTES_GRANULARITY },
> where
    W: BitWord,
{
    start_address: usize,
    end_address: usize,
    reached: &'a [W],
}

impl<'a, W> ReachedAddressesBitset<'a, W>
where
    W: BitWord,
{
    /// Creates a new [`ReachedAddressesBitset`] using the default [`BYTES_GRANULARITY`].
    ///
    /// The `storage` has to be zero-initialized, it is never cleared by the bitset.
    ///
    /// # Panics
    /// Panics if `start_address > end_address` or `storage` is too small for the window.
    #[must_use]
    pub fn new(start_address: usize, end_address: usize, storage: &'a [W]) -> Self {
        Self::with_granularity(start_address, end_address, storage)
    }

    /// Creates a new [`ReachedAddressesBitset`] using the default [`BYTES_GRANULARITY`],
    /// returning an [`Error::IllegalArgument`] instead of panicking on a bad window or storage.
    pub fn try_new(
        start_address: usize,
        end_address: usize,
        storage: &'a [W],
    ) -> Result<Self, Error> {
        Self::try_with_granularity(start_address, end_address, storage)
    }

    /// Creates a new [`ReachedAddressesBitset`] over storage handed over as a raw pointer,
    /// for example a linker-provided section or a region allocated on the other side of an FFI.
    ///
    /// # Safety
    /// `storage_ptr` has to point to `storage_len` initialized, zeroed words that stay valid
    /// and are only accessed atomically for all of `'a`.
    ///
    /// # Panics
    /// Panics if `start_address > end_address` or the storage is too small for the window.
    #[must_use]
    pub unsafe fn from_raw_parts(
        start_address: usize,
        end_address: usize,
        storage_ptr: *const W,
        storage_len: usize,
    ) -> Self {
        let storage: &'a [W] = if storage_len == 0 {
            &[]
        } else {
            slice::from_raw_parts(storage_ptr, storage_len)
        };
        Self::new(start_address, end_address, storage)
    }
}

impl<'a, W, const GRANULARITY: usize> ReachedAddressesBitset<'a, W, GRANULARITY>
where
    W: BitWord,
{
    /// The number of address bytes each bit stands for
    pub const BUCKET_BYTES: usize = GRANULARITY;

    /// The number of buckets each storage word holds
    pub const BITS_PER_WORD: usize = W::BITS;

    /// Creates a new [`ReachedAddressesBitset`] with an explicit `GRANULARITY`.
    ///
    /// # Panics
    /// Panics if `start_address > end_address`, `GRANULARITY` is not a power of two,
    /// or `storage` is too small for the window.
    #[must_use]
    pub fn with_granularity(start_address: usize, end_address: usize, storage: &'a [W]) -> Self {
        match Self::try_with_granularity(start_address, end_address, storage) {
            Ok(bitset) => bitset,
            Err(err) => panic!("Invalid reached addresses bitset: {}", err.message()),
        }
    }

    /// Creates a new [`ReachedAddressesBitset`] with an explicit `GRANULARITY`,
    /// returning an [`Error::IllegalArgument`] instead of panicking.
    pub fn try_with_granularity(
        start_address: usize,
        end_address: usize,
        storage: &'a [W],
    ) -> Result<Self, Error> {
        if !GRANULARITY.is_power_of_two() {
            log::error!("Rejecting reached addresses granularity {GRANULARITY}, not a power of two");
            return Err(Error::illegal_argument(format!(
                "granularity {GRANULARITY} is not a power of two"
            )));
        }

        let words = words_for_window(start_address, end_address, GRANULARITY, W::BITS)
            .map_err(|err| {
                log::error!("Rejecting reached addresses window: {err}");
                err
            })?;
        if words > storage.len() {
            log::error!(
                "Reached addresses window {start_address:#x}..{end_address:#x} needs {words} words, storage has {}",
                storage.len()
            );
            return Err(Error::illegal_argument(format!(
                "window {start_address:#x}..{end_address:#x} needs {words} words of storage, got {}",
                storage.len()
            )));
        }

        log::debug!(
            "Tracking reached addresses in {start_address:#x}..{end_address:#x}, {GRANULARITY} bytes per bit, {words}/{} words",
            storage.len()
        );

        Ok(Self {
            start_address,
            end_address,
            reached: storage,
        })
    }

    /// The first address of the window
    #[inline]
    #[must_use]
    pub fn start_address(&self) -> usize {
        self.start_address
    }

    /// The first address past the window
    #[inline]
    #[must_use]
    pub fn end_address(&self) -> usize {
        self.end_address
    }

    /// The number of buckets spanning the window
    #[inline]
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        buckets_for_bytes(self.end_address - self.start_address, GRANULARITY)
    }

    /// The number of storage words the window uses
    #[inline]
    #[must_use]
    pub fn word_count(&self) -> usize {
        words_for_buckets(self.bucket_count(), W::BITS)
    }

    /// The number of words in the borrowed storage, at least [`Self::word_count`]
    #[inline]
    #[must_use]
    pub fn capacity_words(&self) -> usize {
        self.reached.len()
    }

    /// Marks the bucket containing `address` as reached.
    ///
    /// Addresses outside of the window are ignored. Never blocks, never loops.
    #[inline]
    pub fn record_address(&self, address: usize) {
        // `address` is outside of the range.
        if address < self.start_address || address >= self.end_address {
            return;
        }

        let offset_index = (address - self.start_address) / GRANULARITY;
        let word_index = offset_index / W::BITS;
        debug_assert!(word_index < self.reached.len());
        // SAFETY: `address` is in the window, and the window fits into the storage,
        // as checked on construction.
        let element = unsafe { self.reached.get_unchecked(word_index) };

        // First, a racy check. This saves an atomic read-modify-write if the bit is already
        // set, and lets the cache line stay shared across CPUs.
        let mask = W::bit(offset_index % W::BITS);
        if !Zero::is_zero(&(element.load_relaxed() & mask)) {
            return;
        }
        element.fetch_or_relaxed(mask);
    }

    /// Returns `true` if the bucket containing `address` has been reached.
    #[must_use]
    pub fn is_reached(&self, address: usize) -> bool {
        if address < self.start_address || address >= self.end_address {
            return false;
        }
        let offset_index = (address - self.start_address) / GRANULARITY;
        let word = self.reached[offset_index / W::BITS].load_relaxed();
        !Zero::is_zero(&(word & W::bit(offset_index % W::BITS)))
    }

    /// The number of reached buckets
    #[must_use]
    pub fn reached_count(&self) -> usize {
        self.used_words()
            .iter()
            .map(|word| PrimInt::count_ones(word.load_relaxed()) as usize)
            .sum()
    }

    /// The byte offsets, relative to [`Self::start_address`], of all reached buckets,
    /// in strictly increasing order.
    #[must_use]
    pub fn reached_offsets(&self) -> Vec<usize> {
        self.reached_offsets_iter().collect()
    }

    /// Lazily iterates the offsets [`Self::reached_offsets`] returns.
    ///
    /// Each word is loaded once; words without reached buckets cost a single load.
    #[must_use]
    pub fn reached_offsets_iter(&self) -> ReachedOffsetsIter<'a, W, GRANULARITY> {
        ReachedOffsetsIter {
            words: self.used_words().iter().enumerate(),
            word_index: 0,
            current: Zero::zero(),
        }
    }

    #[inline]
    fn used_words(&self) -> &'a [W] {
        let reached: &'a [W] = self.reached;
        &reached[..self.word_count()]
    }
}

impl<W, const GRANULARITY: usize> fmt::Debug for ReachedAddressesBitset<'_, W, GRANULARITY>
where
    W: BitWord,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReachedAddressesBitset")
            .field("start_address", &format_args!("{:#x}", self.start_address))
            .field("end_address", &format_args!("{:#x}", self.end_address))
            .field("granularity", &GRANULARITY)
            .field("word_count", &self.word_count())
            .field("capacity_words", &self.reached.len())
            .finish()
    }
}

/// Iterator over the reached offsets of a [`ReachedAddressesBitset`],
/// see [`ReachedAddressesBitset::reached_offsets_iter`].
#[derive(Debug)]
pub struct ReachedOffsetsIter<'a, W, const GRANULARITY: usize>
where
    W: BitWord,
{
    words: Enumerate<Iter<'a, W>>,
    word_index: usize,
    /// Bits of the word at `word_index` that have not been returned yet
    current: W::Value,
}

impl<W, const GRANULARITY: usize> Iterator for ReachedOffsetsIter<'_, W, GRANULARITY>
where
    W: BitWord,
{
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while Zero::is_zero(&self.current) {
            let (word_index, word) = self.words.next()?;
            self.word_index = word_index;
            self.current = word.load_relaxed();
        }

        let bit = PrimInt::trailing_zeros(self.current) as usize;
        // Clear the lowest set bit.
        self.current = self.current & (self.current - One::one());

        Some((self.word_index * W::BITS + bit) * GRANULARITY)
    }
}

impl<W, const GRANULARITY: usize> FusedIterator for ReachedOffsetsIter<'_, W, GRANULARITY> where
    W: BitWord
{
}
