//! Stat snapshots

use std::fs::Metadata;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, Utc};

use super::error::{FsError, FsResultExt};

/// Immutable capture of a resource's `stat` result
///
/// Identity fields (`dev`, `ino`, ...) are only available on unix and are
/// `None` elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatSnapshot {
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub accessed: Option<SystemTime>,
    pub changed: Option<SystemTime>,
    pub created: Option<SystemTime>,
    pub dev: Option<u64>,
    pub ino: Option<u64>,
    pub mode: Option<u64>,
    pub nlink: Option<u64>,
    pub uid: Option<u64>,
    pub gid: Option<u64>,
    pub rdev: Option<u64>,
    pub blksize: Option<u64>,
    pub blocks: Option<u64>,
    pub is_dir: bool,
}

impl StatSnapshot {
    /// `stat` the path (follows symlinks)
    pub async fn capture(path: &Path) -> Result<Self, FsError> {
        let meta = tokio::fs::metadata(path).await.fs_context("stat", path)?;
        Ok(Self::from_metadata(&meta))
    }

    #[cfg(unix)]
    pub fn from_metadata(meta: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        Self {
            size: meta.len(),
            modified: meta.modified().ok(),
            accessed: meta.accessed().ok(),
            changed: unix_time(meta.ctime(), meta.ctime_nsec()),
            created: meta.created().ok(),
            dev: Some(meta.dev()),
            ino: Some(meta.ino()),
            mode: Some(u64::from(meta.mode())),
            nlink: Some(meta.nlink()),
            uid: Some(u64::from(meta.uid())),
            gid: Some(u64::from(meta.gid())),
            rdev: Some(meta.rdev()),
            blksize: Some(meta.blksize()),
            blocks: Some(meta.blocks()),
            is_dir: meta.is_dir(),
        }
    }

    #[cfg(not(unix))]
    pub fn from_metadata(meta: &Metadata) -> Self {
        Self {
            size: meta.len(),
            modified: meta.modified().ok(),
            accessed: meta.accessed().ok(),
            changed: None,
            created: meta.created().ok(),
            dev: None,
            ino: None,
            mode: None,
            nlink: None,
            uid: None,
            gid: None,
            rdev: None,
            blksize: None,
            blocks: None,
            is_dir: meta.is_dir(),
        }
    }

    /// Modification time in nanoseconds since the epoch
    pub fn modified_nanos(&self) -> Option<u128> {
        self.modified
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
    }

    /// Header-ready `(field, value)` pairs, missing fields skipped
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let numbers = [
            ("Dev", self.dev),
            ("Ino", self.ino),
            ("Mode", self.mode),
            ("Nlink", self.nlink),
            ("Uid", self.uid),
            ("Gid", self.gid),
            ("Rdev", self.rdev),
            ("Size", Some(self.size)),
            ("Blksize", self.blksize),
            ("Blocks", self.blocks),
        ];
        let times = [
            ("Atime", self.accessed),
            ("Mtime", self.modified),
            ("Ctime", self.changed),
            ("Birthtime", self.created),
        ];

        numbers
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v.to_string())))
            .chain(
                times
                    .into_iter()
                    .filter_map(|(name, value)| value.map(|t| (name, iso_timestamp(t)))),
            )
            .collect()
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T10:00:00.000Z`
pub fn iso_timestamp(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(unix)]
fn unix_time(secs: i64, nanos: i64) -> Option<SystemTime> {
    let secs = u64::try_from(secs).ok()?;
    let nanos = u32::try_from(nanos).ok()?;
    UNIX_EPOCH.checked_add(Duration::new(secs, nanos))
}
