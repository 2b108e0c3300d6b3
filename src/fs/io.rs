//! Range reads and streamed writes
//!
//! Descriptors opened here are scoped to the call: each one is dropped when
//! its function returns, on success and on error alike.

use std::io::SeekFrom;
use std::path::Path;

use bytes::Bytes;
use http_body_util::BodyExt;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::error::{FsError, FsResultExt};
use crate::body::Body;
use crate::error::Error;
use crate::http::range::{RangeSpec, WriteWindow};

/// How a write opens its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Create or truncate (`PUT`, `WRITE`)
    Truncate,
    /// Existing file, read+write, no truncation (`POST`)
    Update,
    /// Create or append (`APPEND`)
    Append,
}

impl WriteMode {
    pub fn open_options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        match self {
            Self::Truncate => options.write(true).create(true).truncate(true),
            Self::Update => options.read(true).write(true),
            Self::Append => options.append(true).create(true),
        };
        options
    }
}

/// Most range reads in flight at once, each holding its own descriptor
pub const MAX_PARALLEL_RANGES: usize = 16;

/// Read every range in parallel, one descriptor per range
///
/// At most [`MAX_PARALLEL_RANGES`] reads run at a time. The result keeps
/// request order regardless of completion order.
pub async fn read_ranges(path: &Path, ranges: &[RangeSpec]) -> Result<Vec<Bytes>, FsError> {
    let mut chunks = vec![Bytes::new(); ranges.len()];
    let mut tasks = JoinSet::new();

    for (index, range) in ranges.iter().copied().enumerate() {
        if tasks.len() >= MAX_PARALLEL_RANGES {
            join_range(&mut tasks, &mut chunks, path).await?;
        }
        let path = path.to_path_buf();
        tasks.spawn(async move { (index, read_range(&path, range).await) });
    }
    while !tasks.is_empty() {
        join_range(&mut tasks, &mut chunks, path).await?;
    }
    Ok(chunks)
}

type RangeTask = (usize, Result<Bytes, FsError>);

/// Wait for one range read and slot its bytes in place
async fn join_range(
    tasks: &mut JoinSet<RangeTask>,
    chunks: &mut [Bytes],
    path: &Path,
) -> Result<(), FsError> {
    if let Some(joined) = tasks.join_next().await {
        let (index, result) =
            joined.map_err(|err| FsError::new(std::io::Error::other(err), "read", path))?;
        chunks[index] = result?;
    }
    Ok(())
}

async fn read_range(path: &Path, range: RangeSpec) -> Result<Bytes, FsError> {
    let mut file = File::open(path).await.fs_context("open", path)?;
    file.seek(SeekFrom::Start(range.start))
        .await
        .fs_context("read", path)?;

    let len = usize::try_from(range.len())
        .map_err(|_| FsError::from_errno(libc::EFBIG, "read", path))?;
    let mut buf = vec![0; len];
    file.read_exact(&mut buf).await.fs_context("read", path)?;
    Ok(Bytes::from(buf))
}

/// Open `path` per `mode` and stream `body` into it
///
/// With a window, writing starts at its position and stops once its limit
/// is reached, even if the body has more to give.
pub async fn write_body(
    path: &Path,
    mode: WriteMode,
    window: Option<WriteWindow>,
    body: Body,
    signal: Option<&CancellationToken>,
) -> Result<u64, Error> {
    let mut file = mode.open_options().open(path).await.fs_context("open", path)?;

    let limit = match window {
        Some(window) => {
            file.seek(SeekFrom::Start(window.position))
                .await
                .fs_context("write", path)?;
            window.limit
        }
        None => None,
    };

    let written = copy_body(&mut file, path, body, limit, signal).await?;
    file.flush().await.fs_context("write", path)?;
    Ok(written)
}

async fn copy_body(
    file: &mut File,
    path: &Path,
    mut body: Body,
    mut limit: Option<u64>,
    signal: Option<&CancellationToken>,
) -> Result<u64, Error> {
    let mut written = 0;

    while limit != Some(0) {
        let next = match signal {
            Some(signal) => tokio::select! {
                biased;
                () = signal.cancelled() => return Err(Error::Aborted),
                frame = body.frame() => frame,
            },
            None => body.frame().await,
        };
        let Some(frame) = next else { break };
        let Ok(chunk) = frame.map_err(Error::BodyStream)?.into_data() else {
            continue;
        };

        let take = limit.map_or(chunk.len(), |remaining| {
            usize::try_from(remaining).map_or(chunk.len(), |r| r.min(chunk.len()))
        });
        file.write_all(&chunk[..take]).await.fs_context("write", path)?;

        written += take as u64;
        if let Some(remaining) = limit.as_mut() {
            *remaining -= take as u64;
        }
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_ranges_keeps_request_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("digits");
        std::fs::write(&path, b"0123456789").unwrap();

        let ranges = [
            RangeSpec { start: 7, end: 8 },
            RangeSpec { start: 1, end: 3 },
            RangeSpec { start: 1, end: 1 },
        ];
        let chunks = read_ranges(&path, &ranges).await.unwrap();
        assert_eq!(chunks.concat(), b"781231");
    }

    #[tokio::test]
    async fn test_read_many_ranges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("digits");
        std::fs::write(&path, b"0123456789").unwrap();

        let ranges: Vec<RangeSpec> = (0..5000u64)
            .map(|i| RangeSpec {
                start: i % 10,
                end: i % 10,
            })
            .collect();
        let chunks = read_ranges(&path, &ranges).await.unwrap();
        let expected: Vec<u8> = (0..5000u32).map(|i| b'0' + (i % 10) as u8).collect();
        assert_eq!(chunks.concat(), expected);
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_ranges(&dir.path().join("nope"), &[RangeSpec { start: 0, end: 0 }])
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ENOENT");
        assert_eq!(err.syscall(), "open");
    }

    #[tokio::test]
    async fn test_windowed_write_stops_at_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target");
        std::fs::write(&path, b"..........").unwrap();

        let window = WriteWindow {
            position: 2,
            limit: Some(3),
        };
        let written = write_body(&path, WriteMode::Update, Some(window), Body::from("abcdef"), None)
            .await
            .unwrap();
        assert_eq!(written, 3);
        assert_eq!(std::fs::read(&path).unwrap(), b"..abc.....");
    }

    #[tokio::test]
    async fn test_update_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_body(
            &dir.path().join("absent"),
            WriteMode::Update,
            None,
            Body::from("x"),
            None,
        )
        .await
        .unwrap_err();
        assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
    }

    #[tokio::test]
    async fn test_append_keeps_existing_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log");
        std::fs::write(&path, b"head").unwrap();

        write_body(&path, WriteMode::Append, None, Body::from("-tail"), None)
            .await
            .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"head-tail");
    }

    #[tokio::test]
    async fn test_cancelled_write() {
        let dir = tempfile::tempdir().unwrap();
        let signal = CancellationToken::new();
        signal.cancel();

        let err = write_body(
            &dir.path().join("f"),
            WriteMode::Truncate,
            None,
            Body::from("data"),
            Some(&signal),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Aborted));
    }
}
