// Configuration types module
// Defines all configuration-related data structures

use hyper::header::HeaderName;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Engine configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Namespace for stat and error headers, e.g. `X-Poteto-Size`
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Resolve relative addresses against the directory current at
    /// construction instead of at each call
    #[serde(default)]
    pub persist_cwd: bool,
    /// Value of the `Server` response header
    #[serde(default = "default_server_name")]
    pub server_name: String,
    /// Chunk size for `READ` streams
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,
}

impl EngineConfig {
    /// `X-<prefix>-<field>`, or `None` if the prefix is not a valid token
    pub fn header_name(&self, field: &str) -> Option<HeaderName> {
        HeaderName::from_bytes(format!("X-{}-{field}", self.prefix).as_bytes()).ok()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            persist_cwd: false,
            server_name: default_server_name(),
            read_chunk_size: default_read_chunk_size(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_prefix() -> String {
    "Poteto".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_server_name() -> String {
    "poteto".to_string()
}

const fn default_read_chunk_size() -> usize {
    65_536
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `off`, `error`, `warn`, `info` or `debug`
    #[serde(default = "default_level")]
    pub level: String,
    /// One line per engine request
    #[serde(default)]
    pub access_log: bool,
    /// Access log format (common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            access_log: false,
            access_log_format: default_access_log_format(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_level() -> String {
    "warn".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "common".to_string()
}
