//! Crate error type
//!
//! Every failure a handler can produce is a variant here. [`Error::status`]
//! decides whether the executor turns it into a response or lets it escape
//! to the caller.

use hyper::StatusCode;
use serde_json::json;

use crate::fs::FsError;
use crate::http::range::RangeError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("Range not satisfiable: {0}")]
    Range(#[from] RangeError),

    #[error("Integrity mismatch: {algorithm} digest {actual} does not match {expected}")]
    IntegrityMismatch {
        algorithm: &'static str,
        expected: String,
        actual: String,
    },

    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Unexpected redirect: {link} -> {target}")]
    Redirect { link: String, target: String },

    #[error("The operation was aborted")]
    Aborted,

    #[error("Request body stream failed: {0}")]
    BodyStream(#[source] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid URL: {message}")]
    InvalidUrl { message: String },

    #[error("Invalid header: {message}")]
    InvalidHeader { message: String },

    #[error("Invalid HTTP method: {method}")]
    InvalidMethod { method: String },

    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Cannot determine working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// Status code for errors that become responses.
    ///
    /// `None` means the error escapes to the caller of `fetch`.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Fs(err) => Some(err.status()),
            Self::Range(_) => Some(StatusCode::RANGE_NOT_SATISFIABLE),
            Self::IntegrityMismatch { .. }
            | Self::UnsupportedAlgorithm(_)
            | Self::BodyStream(_) => Some(StatusCode::BAD_REQUEST),
            Self::Redirect { .. }
            | Self::Aborted
            | Self::UrlParse(_)
            | Self::InvalidUrl { .. }
            | Self::InvalidHeader { .. }
            | Self::InvalidMethod { .. }
            | Self::Network(_)
            | Self::WorkingDirectory(_)
            | Self::Config(_) => None,
        }
    }

    /// Machine-readable code carried in the `X-<prefix>-Code` header
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Fs(err) => Some(err.code()),
            Self::Range(_) => Some("ERR_OUT_OF_RANGE"),
            Self::IntegrityMismatch { .. } => Some("ERR_INTEGRITY_MISMATCH"),
            Self::UnsupportedAlgorithm(_) => Some("ERR_UNSUPPORTED_ALGORITHM"),
            Self::BodyStream(_) => Some("ERR_BODY_STREAM"),
            Self::Aborted => Some("ABORT_ERR"),
            _ => None,
        }
    }

    /// JSON payload for clients that `Accept: application/json`
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Fs(err) => err.to_json(),
            other => json!({
                "message": other.to_string(),
                "code": other.code(),
            }),
        }
    }
}
