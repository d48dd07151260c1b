use log::{LevelFilter, Log, Metadata, Record};

/// Logger that prints to stderr, for host-side tests.
struct StderrLogger {
    max_level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // Format: "[LEVEL] target: message", like the kernel's own logger.
        eprintln!("[{}] {}: {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger {
    max_level: LevelFilter::Trace,
};

/// Route `log` output to stderr for the duration of the test binary.
///
/// Safe to call from every test; only the first call installs the logger,
/// later ones are no-ops.
pub fn init_test_logging() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Trace);
    }
}
