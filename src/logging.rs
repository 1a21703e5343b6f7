/// Structured logging for the aurora alert service
///
/// Provides context-rich logging with alert identifiers, timestamps, and
/// severity levels. Supports both console output and file-based logging
/// for daemon operations.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl LogLevel {
    /// Parses the `logging.min_level` config value. Unknown strings fall
    /// back to Info; config validation rejects them before this runs.
    pub fn from_config(s: &str) -> LogLevel {
        match s {
            "debug" => LogLevel::Debug,
            "warn" => LogLevel::Warning,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

// ---------------------------------------------------------------------------
// Subsystem Tags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subsystem {
    Feed,
    Database,
    Notify,
    Geo,
    System,
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subsystem::Feed => write!(f, "FEED"),
            Subsystem::Database => write!(f, "DB"),
            Subsystem::Notify => write!(f, "NOTIFY"),
            Subsystem::Geo => write!(f, "GEO"),
            Subsystem::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - feed publishes gaps during maintenance windows
    Expected,
    /// Unexpected failure - indicates service degradation or an API change
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        *LOGGER.lock().unwrap() = Some(logger);
    }

    /// Log a message with the global logger
    fn log(&self, level: LogLevel, source: &Subsystem, alert_id: Option<i64>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

        let alert_part = alert_id.map(|id| format!(" [alert {}]", id)).unwrap_or_default();
        let log_entry = format!(
            "{} {} {}{}: {}",
            timestamp, level, source, alert_part, message
        );

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info => println!("{}", log_entry),
                LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", source, alert_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", source, alert_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => {} // Skip debug in non-timestamp mode
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

/// Log a general informational message
pub fn info(source: Subsystem, alert_id: Option<i64>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Info, &source, alert_id, message);
    }
}

/// Log a warning message
pub fn warn(source: Subsystem, alert_id: Option<i64>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Warning, &source, alert_id, message);
    }
}

/// Log an error message
pub fn error(source: Subsystem, alert_id: Option<i64>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Error, &source, alert_id, message);
    }
}

/// Log a debug message
pub fn debug(source: Subsystem, alert_id: Option<i64>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Debug, &source, alert_id, message);
    }
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a feed failure based on the error text.
pub fn classify_feed_failure(error_message: &str) -> FailureType {
    // An empty grid shows up during SWPC model restarts and quiet-sun
    // republish gaps; transport and parse failures mean something is wrong
    // on our side of the fence or the API changed shape.
    if error_message.contains("empty grid") {
        FailureType::Expected
    } else if error_message.contains("HTTP error") {
        FailureType::Unexpected
    } else if error_message.contains("parse error") {
        FailureType::Unexpected
    } else if error_message.contains("request failed") {
        FailureType::Unknown
    } else {
        FailureType::Unknown
    }
}

/// Log a feed failure with automatic classification
pub fn log_feed_failure(operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_feed_failure(&error_msg.to_lowercase());

    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);

    match failure_type {
        FailureType::Expected => info(Subsystem::Feed, None, &message),
        FailureType::Unexpected => error(Subsystem::Feed, None, &message),
        FailureType::Unknown => warn(Subsystem::Feed, None, &message),
    }
}

// ---------------------------------------------------------------------------
// Cycle Summary Logging
// ---------------------------------------------------------------------------

/// Log a one-line summary of an evaluation cycle
pub fn log_cycle_summary(seen: usize, notified: usize, suppressed: usize, failed: usize) {
    let message = format!(
        "Cycle complete: {} alerts, {} notified, {} suppressed, {} failed",
        seen, notified, suppressed, failed
    );

    if failed == 0 {
        info(Subsystem::System, None, &message);
    } else if notified == 0 && suppressed == 0 {
        error(Subsystem::System, None, &message);
    } else {
        warn(Subsystem::System, None, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_parses_config_values() {
        assert_eq!(LogLevel::from_config("debug"), LogLevel::Debug);
        assert_eq!(LogLevel::from_config("warn"), LogLevel::Warning);
        assert_eq!(LogLevel::from_config("info"), LogLevel::Info);
        assert_eq!(LogLevel::from_config("error"), LogLevel::Error);
    }

    #[test]
    fn test_feed_failure_classification() {
        assert_eq!(
            classify_feed_failure("feed returned an empty grid"),
            FailureType::Expected
        );
        assert_eq!(
            classify_feed_failure("feed http error: 500"),
            FailureType::Unexpected
        );
        assert_eq!(
            classify_feed_failure("feed request failed: connection timed out"),
            FailureType::Unknown
        );
    }
}
