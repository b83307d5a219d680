/*!
 * Process logger for the `log` facade.
 *
 * Lines go to stderr with a local timestamp and a colour per level.
 */

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

use crate::app_config::LogLevel;

/// Stderr logger with timestamps and level colours
#[derive(Debug)]
pub struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    /// Create a logger for a level
    pub fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // ANSI colour of a level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }

    /// Format one line without colour codes
    pub fn format_line(record: &Record) -> String {
        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        format!("{} {:<5} {}", now, record.level(), record.args())
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{}\x1B[0m",
                Self::color_for_level(record.level()),
                Self::format_line(record)
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Install the logger globally. Fails if a logger is already installed.
pub fn init(level: LogLevel) -> Result<(), SetLoggerError> {
    let filter = level.to_level_filter();
    log::set_boxed_logger(Box::new(CustomLogger::new(filter)))?;
    log::set_max_level(filter);
    Ok(())
}
