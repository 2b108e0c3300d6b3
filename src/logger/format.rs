//! Request log format module
//!
//! Supports multiple log formats:
//! - `common` (Common Log Format style, one line per request)
//! - `json` (JSON structured logging)
//! - Custom patterns with variables

use chrono::Local;
use serde::Serialize;

/// Request log entry for one engine call
#[derive(Debug, Clone, Serialize)]
pub struct RequestLogEntry {
    /// Request timestamp
    #[serde(serialize_with = "serialize_time")]
    pub time: chrono::DateTime<Local>,
    /// Verb as given by the caller (GET, LIST, ...)
    pub method: String,
    /// Resolved resource address
    pub url: String,
    /// Response status code
    pub status: u16,
    /// Response body size in bytes, when known up front
    pub bytes: Option<u64>,
    /// Request processing time in microseconds
    pub request_time_us: u64,
}

fn serialize_time<S: serde::Serializer>(
    time: &chrono::DateTime<Local>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339())
}

impl RequestLogEntry {
    /// Create a new entry with current timestamp
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            time: Local::now(),
            method: method.into(),
            url: url.into(),
            status: 200,
            bytes: None,
            request_time_us: 0,
        }
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "common" => self.format_common(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    fn bytes_field(&self) -> String {
        self.bytes.map_or_else(|| "-".to_string(), |b| b.to_string())
    }

    /// `[$time_local] "$method $url" $status $bytes`
    fn format_common(&self) -> String {
        format!(
            "[{}] \"{} {}\" {} {}",
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.url,
            self.status,
            self.bytes_field(),
        )
    }

    fn format_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables:
    /// - `$time_local` - Local time in Common Log Format
    /// - `$time_iso8601` - ISO 8601 timestamp
    /// - `$method` - Verb
    /// - `$url` - Resource address
    /// - `$status` - Response status code
    /// - `$bytes` - Response body size, `-` when streamed
    /// - `$request_time` - Processing time in seconds (3 decimal places)
    fn format_custom(&self, pattern: &str) -> String {
        #[allow(clippy::cast_precision_loss)]
        let request_time = self.request_time_us as f64 / 1_000_000.0;

        pattern
            .replace(
                "$time_local",
                &self.time.format("%d/%b/%Y:%H:%M:%S %z").to_string(),
            )
            .replace("$time_iso8601", &self.time.to_rfc3339())
            .replace("$request_time", &format!("{request_time:.3}"))
            .replace("$method", &self.method)
            .replace("$url", &self.url)
            .replace("$status", &self.status.to_string())
            .replace("$bytes", &self.bytes_field())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entry() -> RequestLogEntry {
        let mut entry = RequestLogEntry::new("GET", "file:///tmp/test.txt");
        entry.status = 206;
        entry.bytes = Some(2);
        entry.request_time_us = 2000;
        entry
    }

    #[test]
    fn test_format_common() {
        let log = create_test_entry().format("common");
        assert!(log.contains("\"GET file:///tmp/test.txt\" 206 2"));
    }

    #[test]
    fn test_format_json() {
        let log = create_test_entry().format("json");
        let value: serde_json::Value = serde_json::from_str(&log).unwrap();
        assert_eq!(value["method"], "GET");
        assert_eq!(value["status"], 206);
        assert_eq!(value["bytes"], 2);
    }

    #[test]
    fn test_format_custom() {
        let mut entry = create_test_entry();
        entry.bytes = None;
        let log = entry.format("$method $url $status $bytes $request_time");
        assert_eq!(log, "GET file:///tmp/test.txt 206 - 0.002");
    }
}
