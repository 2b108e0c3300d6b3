//! Response header construction
//!
//! Generic headers go on every engine response; stat and error fields are
//! namespaced as `X-<prefix>-<Field>`.

use std::time::SystemTime;

use hyper::header::{self, HeaderMap, HeaderValue};

use super::cache::{http_date, weak_etag};
use crate::config::EngineConfig;
use crate::error::Error;
use crate::fs::StatSnapshot;

/// `Server`, `Date` and `Accept-Ranges`
pub fn generic_headers(cfg: &EngineConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&cfg.server_name) {
        headers.insert(header::SERVER, value);
    }
    if let Ok(value) = HeaderValue::from_str(&http_date(SystemTime::now())) {
        headers.insert(header::DATE, value);
    }
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers
}

/// Insert `X-<prefix>-<field>` pairs, skipping anything that is not valid
/// header text
pub fn insert_prefixed(
    cfg: &EngineConfig,
    headers: &mut HeaderMap,
    fields: impl IntoIterator<Item = (&'static str, String)>,
) {
    for (field, value) in fields {
        let (Some(name), Ok(value)) = (cfg.header_name(field), HeaderValue::from_str(&value)) else {
            continue;
        };
        headers.insert(name, value);
    }
}

/// `Content-Length`, `Last-Modified`, `ETag` and every stat field
pub fn stat_headers(cfg: &EngineConfig, stat: &StatSnapshot, headers: &mut HeaderMap) {
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(stat.size));
    if let Some(modified) = stat.modified {
        if let Ok(value) = HeaderValue::from_str(&http_date(modified)) {
            headers.insert(header::LAST_MODIFIED, value);
        }
    }
    if let Ok(value) = HeaderValue::from_str(&weak_etag(stat)) {
        headers.insert(header::ETAG, value);
    }
    insert_prefixed(cfg, headers, stat.fields());
}

/// Override the advertised length for a partial body
///
/// Both `Content-Length` and `X-<prefix>-Size` describe the bytes actually
/// returned.
pub fn set_length(cfg: &EngineConfig, headers: &mut HeaderMap, len: u64) {
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    insert_prefixed(cfg, headers, [("Size", len.to_string())]);
}

/// `X-<prefix>-Code` and, for filesystem errors, errno, syscall and path
pub fn error_headers(cfg: &EngineConfig, err: &Error, headers: &mut HeaderMap) {
    match err {
        Error::Fs(fs_err) => insert_prefixed(cfg, headers, fs_err.fields()),
        other => {
            if let Some(code) = other.code() {
                insert_prefixed(cfg, headers, [("Code", code.to_string())]);
            }
        }
    }
}
