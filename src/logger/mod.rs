//! Logger module
//!
//! Provides logging utilities for the engine including:
//! - Per-request logging with multiple formats
//! - Error, warning and debug diagnostics
//! - File-based logging support

mod format;
pub mod writer;

pub use format::RequestLogEntry;

use std::str::FromStr;

use crate::config::Config;

/// Diagnostic verbosity, ordered from quietest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Off,
    Error,
    Warn,
    Info,
    Debug,
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" | "trace" => Ok(Self::Debug),
            other => Err(format!("Unknown log level: {other}")),
        }
    }
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup. Library users who never
/// call it get no output.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level = config
        .logging
        .level
        .parse()
        .map_err(|e: String| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    writer::init(
        level,
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn write_error(level: Level, message: &str) {
    if let Some(writer) = writer::get().filter(|w| w.enabled(level)) {
        writer.write_error(message);
    }
}

pub fn log_error(message: &str) {
    write_error(Level::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(Level::Warn, &format!("[WARN] {message}"));
}

pub fn log_info(message: &str) {
    write_error(Level::Info, &format!("[INFO] {message}"));
}

pub fn log_debug(message: &str) {
    write_error(Level::Debug, &format!("[DEBUG] {message}"));
}

/// Log formatted request entry
pub fn log_request(entry: &RequestLogEntry, format: &str) {
    if let Some(writer) = writer::get() {
        writer.write_access(&entry.format(format));
    }
}
