//! Defines the console logger that writes to stderr.

use std::io::{self, Write};

use log::LevelFilter;
use spin::{Mutex, Once};

pub struct Console {
    stderr: Mutex<io::Stderr>,
}

static DEFAULT: Once<Console> = Once::new();

impl Console {
    /// Installs the console as the global logger, showing records up to `level`.
    pub fn init(level: LevelFilter) -> Result<&'static Self, log::SetLoggerError> {
        let console = Self::default();
        console.install(level)?;
        Ok(console)
    }

    pub fn default() -> &'static Self {
        DEFAULT.call_once(|| Console {
            stderr: Mutex::new(io::stderr()),
        })
    }

    pub fn install(&'static self, level: LevelFilter) -> Result<(), log::SetLoggerError> {
        log::set_logger(self)?;
        log::set_max_level(level);
        Ok(())
    }
}

/// Maps the number of `-v` flags to a level filter.
pub fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

impl log::Log for Console {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut line = String::new();
        if write_log_entry_to(&mut line, record).is_err() {
            return;
        }
        // A logger has nowhere to report its own failures.
        let _ = self.stderr.lock().write_all(line.as_bytes());
    }

    fn flush(&self) {
        let _ = self.stderr.lock().flush();
    }
}

fn write_log_entry_to(
    writer: &mut impl core::fmt::Write,
    record: &log::Record,
) -> core::fmt::Result {
    #[cfg(feature = "detailed-logging")]
    return writeln!(
        writer,
        "[{} {}:{} {}] {}",
        record.level(),
        record.file().unwrap_or("unknown"),
        record.line().unwrap_or(0),
        record.target(),
        record.args()
    );
    #[cfg(not(feature = "detailed-logging"))]
    return writeln!(
        writer,
        "[{:5} {}] {}",
        record.level(),
        record.target(),
        record.args()
    );
}
