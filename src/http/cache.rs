//! Validators and conditional requests
//!
//! Weak `ETag` generation from a stat snapshot and evaluation of the four
//! conditional request headers.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, NaiveDateTime, Utc};
use hyper::header::{self, HeaderMap};

use crate::fs::StatSnapshot;

const PLACEHOLDER: &str = "0";

/// Weak `ETag` built from device, inode, size and mtime
///
/// Each component is base-36; a missing component becomes `0`.
///
/// # Returns
/// Quoted weak validator, e.g. `W/"1kx-16-4-1ahzcmsf0dq8"`
pub fn weak_etag(stat: &StatSnapshot) -> String {
    let parts = [
        stat.dev.map(u128::from),
        stat.ino.map(u128::from),
        Some(u128::from(stat.size)),
        stat.modified_nanos(),
    ]
    .map(|part| part.map_or_else(|| PLACEHOLDER.to_string(), base36));

    format!("W/\"{}\"", parts.join("-"))
}

fn base36(mut n: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return PLACEHOLDER.to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Check a comma-separated validator list against the current `ETag`
///
/// Supports:
/// - Single `ETag`: `"abc123"`
/// - Multiple `ETags`: `"abc123", W/"def456"`
/// - Wildcard: `*`
///
/// Weak and strong forms of the same tag match.
pub fn check_etag_match(list: &str, etag: &str) -> bool {
    let current = opaque(etag);
    list.split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || opaque(candidate) == current)
}

fn opaque(tag: &str) -> &str {
    tag.strip_prefix("W/").unwrap_or(tag)
}

/// Outcome of conditional request evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    Proceed,
    /// 304
    NotModified,
    /// 412
    Failed,
}

/// Whether any conditional header is present
pub fn has_preconditions(headers: &HeaderMap) -> bool {
    [
        header::IF_NONE_MATCH,
        header::IF_MODIFIED_SINCE,
        header::IF_MATCH,
        header::IF_UNMODIFIED_SINCE,
    ]
    .iter()
    .any(|name| headers.contains_key(name))
}

/// Evaluate conditional headers against a fresh stat
///
/// `stat` is `None` when the resource does not exist. The 304 pair is
/// checked before the 412 pair; within each pair the validator header
/// wins over the date header. Dates compare at whole seconds and
/// unparseable dates are ignored.
pub fn evaluate_preconditions(headers: &HeaderMap, stat: Option<&StatSnapshot>) -> Precondition {
    let get = |name: header::HeaderName| headers.get(name).and_then(|v| v.to_str().ok());
    let etag = stat.map(weak_etag);
    let modified = stat.and_then(|s| s.modified).and_then(unix_seconds);

    if let Some(list) = get(header::IF_NONE_MATCH) {
        if etag.as_deref().is_some_and(|e| check_etag_match(list, e)) {
            return Precondition::NotModified;
        }
    } else if let Some(since) = get(header::IF_MODIFIED_SINCE).and_then(parse_http_date) {
        if modified.is_some_and(|m| m <= since) {
            return Precondition::NotModified;
        }
    }

    if let Some(list) = get(header::IF_MATCH) {
        if !etag.as_deref().is_some_and(|e| check_etag_match(list, e)) {
            return Precondition::Failed;
        }
    } else if let Some(since) = get(header::IF_UNMODIFIED_SINCE).and_then(parse_http_date) {
        if modified.is_some_and(|m| m > since) {
            return Precondition::Failed;
        }
    }

    Precondition::Proceed
}

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Parse an HTTP date into seconds since the epoch
///
/// Accepts IMF-fixdate and the obsolete asctime form.
pub fn parse_http_date(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.timestamp());
    }
    NaiveDateTime::parse_from_str(value, "%a %b %e %H:%M:%S %Y")
        .ok()
        .map(|naive| naive.and_utc().timestamp())
}

fn unix_seconds(time: SystemTime) -> Option<i64> {
    let secs = time.duration_since(UNIX_EPOCH).ok()?.as_secs();
    i64::try_from(secs).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;
    use std::time::Duration;

    fn stat() -> StatSnapshot {
        StatSnapshot {
            size: 4,
            modified: Some(UNIX_EPOCH + Duration::from_secs(784_111_777)),
            accessed: None,
            changed: None,
            created: None,
            dev: Some(36),
            ino: Some(35),
            mode: None,
            nlink: None,
            uid: None,
            gid: None,
            rdev: None,
            blksize: None,
            blocks: None,
            is_dir: false,
        }
    }

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_weak_etag() {
        let etag = weak_etag(&stat());
        assert!(etag.starts_with("W/\"10-z-4-"));
        assert_eq!(etag, weak_etag(&stat()));

        let mut other = stat();
        other.size = 5;
        assert_ne!(etag, weak_etag(&other));
    }

    #[test]
    fn test_weak_etag_placeholders() {
        let mut bare = stat();
        bare.dev = None;
        bare.ino = None;
        bare.modified = None;
        assert_eq!(weak_etag(&bare), "W/\"0-0-4-0\"");
    }

    #[test]
    fn test_check_etag_match() {
        let etag = "W/\"abc123\"";
        assert!(check_etag_match("\"abc123\"", etag));
        assert!(check_etag_match("\"xyz\", W/\"abc123\"", etag));
        assert!(check_etag_match("*", etag));
        assert!(!check_etag_match("\"different\"", etag));
    }

    #[test]
    fn test_http_date_round_trip() {
        let time = UNIX_EPOCH + Duration::from_secs(784_111_777);
        let text = http_date(time);
        assert_eq!(text, "Sun, 06 Nov 1994 08:49:37 GMT");
        assert_eq!(parse_http_date(&text), Some(784_111_777));
        assert_eq!(parse_http_date("yesterday"), None);
    }

    #[test]
    fn test_if_none_match() {
        let current = weak_etag(&stat());
        let mut map = HeaderMap::new();
        map.insert(header::IF_NONE_MATCH, current.parse().unwrap());
        assert_eq!(
            evaluate_preconditions(&map, Some(&stat())),
            Precondition::NotModified
        );

        let map = headers(&[(header::IF_NONE_MATCH, "\"stale\"")]);
        assert_eq!(
            evaluate_preconditions(&map, Some(&stat())),
            Precondition::Proceed
        );
    }

    #[test]
    fn test_if_none_match_beats_modified_since() {
        let map = headers(&[
            (header::IF_NONE_MATCH, "\"stale\""),
            (header::IF_MODIFIED_SINCE, "Sun, 06 Nov 1994 08:49:37 GMT"),
        ]);
        assert_eq!(
            evaluate_preconditions(&map, Some(&stat())),
            Precondition::Proceed
        );
    }

    #[test]
    fn test_if_modified_since() {
        let map = headers(&[(header::IF_MODIFIED_SINCE, "Sun, 06 Nov 1994 08:49:37 GMT")]);
        assert_eq!(
            evaluate_preconditions(&map, Some(&stat())),
            Precondition::NotModified
        );

        let map = headers(&[(header::IF_MODIFIED_SINCE, "Sun, 06 Nov 1994 08:49:36 GMT")]);
        assert_eq!(
            evaluate_preconditions(&map, Some(&stat())),
            Precondition::Proceed
        );
    }

    #[test]
    fn test_if_match() {
        let map = headers(&[(header::IF_MATCH, "\"stale\"")]);
        assert_eq!(
            evaluate_preconditions(&map, Some(&stat())),
            Precondition::Failed
        );

        let map = headers(&[(header::IF_MATCH, "*")]);
        assert_eq!(
            evaluate_preconditions(&map, Some(&stat())),
            Precondition::Proceed
        );
        assert_eq!(evaluate_preconditions(&map, None), Precondition::Failed);
    }

    #[test]
    fn test_if_unmodified_since() {
        let map = headers(&[(header::IF_UNMODIFIED_SINCE, "Sat, 05 Nov 1994 08:49:37 GMT")]);
        assert_eq!(
            evaluate_preconditions(&map, Some(&stat())),
            Precondition::Failed
        );
        assert_eq!(evaluate_preconditions(&map, None), Precondition::Proceed);
    }

    #[test]
    fn test_has_preconditions() {
        assert!(!has_preconditions(&HeaderMap::new()));
        assert!(has_preconditions(&headers(&[(header::IF_MATCH, "*")])));
    }
}
