//! Every rejected construction is logged at `error` before the error is returned.

use std::sync::{atomic::AtomicU32, Mutex};

use log::{Level, Log, Metadata, Record};
use reached_targets::{ReachedAddressesBitset, BYTES_GRANULARITY};

/// Keeps the messages of all `error` records
struct ErrorCollector {
    errors: Mutex<Vec<String>>,
}

static COLLECTOR: ErrorCollector = ErrorCollector {
    errors: Mutex::new(Vec::new()),
};

impl Log for ErrorCollector {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() == Level::Error
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.errors.lock().unwrap().push(record.args().to_string());
        }
    }

    fn flush(&self) {}
}

fn logged_errors() -> Vec<String> {
    COLLECTOR.errors.lock().unwrap().clone()
}

#[test]
fn test_rejections_are_logged() {
    log::set_logger(&COLLECTOR).unwrap();
    log::set_max_level(log::LevelFilter::Debug);

    let storage: Vec<AtomicU32> = (0..8).map(|_| AtomicU32::new(0)).collect();
    let start = 0x1000;
    let end = start + 256 * BYTES_GRANULARITY;

    assert!(ReachedAddressesBitset::try_new(end, start, &storage).is_err());
    assert_eq!(logged_errors().len(), 1);

    assert!(ReachedAddressesBitset::try_new(start, end, &storage[..7]).is_err());
    assert_eq!(logged_errors().len(), 2);

    assert!(ReachedAddressesBitset::<_, 3>::try_with_granularity(0, 3, &storage).is_err());
    let errors = logged_errors();
    assert_eq!(errors.len(), 3);
    assert!(errors[2].contains("not a power of two"));

    // Accepted windows only log at `debug`.
    assert!(ReachedAddressesBitset::try_new(start, end, &storage).is_ok());
    assert_eq!(logged_errors().len(), 3);
}
