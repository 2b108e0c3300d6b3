//! Filesystem error translation
//!
//! Every `io::Error` coming out of a filesystem call is wrapped in an
//! [`FsError`] that remembers the syscall and path, classified into a closed
//! [`FsErrorKind`], and mapped onto an HTTP status by an exhaustive match.

use std::io;
use std::path::{Path, PathBuf};

use hyper::StatusCode;
use serde_json::json;

/// Closed classification of OS errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsErrorKind {
    InvalidArgument,
    IsDirectory,
    NotDirectory,
    NameTooLong,
    PermissionDenied,
    NotFound,
    Io,
    OutOfMemory,
    Busy,
    Other,
}

impl FsErrorKind {
    /// Classify an `io::Error`, preferring the raw errno when there is one
    pub fn classify(err: &io::Error) -> Self {
        if let Some(errno) = err.raw_os_error() {
            let kind = Self::from_errno(errno);
            if kind != Self::Other {
                return kind;
            }
        }
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::InvalidInput => Self::InvalidArgument,
            io::ErrorKind::OutOfMemory => Self::OutOfMemory,
            _ => Self::Other,
        }
    }

    pub const fn from_errno(errno: i32) -> Self {
        match errno {
            libc::EINVAL => Self::InvalidArgument,
            libc::EISDIR => Self::IsDirectory,
            libc::ENOTDIR => Self::NotDirectory,
            libc::ENAMETOOLONG => Self::NameTooLong,
            libc::EACCES | libc::EPERM => Self::PermissionDenied,
            libc::ENOENT => Self::NotFound,
            libc::EIO => Self::Io,
            libc::ENOMEM => Self::OutOfMemory,
            libc::EBUSY => Self::Busy,
            _ => Self::Other,
        }
    }

    pub const fn status(self) -> StatusCode {
        match self {
            Self::InvalidArgument | Self::IsDirectory | Self::NotDirectory | Self::NameTooLong => {
                StatusCode::BAD_REQUEST
            }
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Io | Self::OutOfMemory | Self::Other => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Busy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Symbolic errno name, `UNKNOWN` when the number is not in the table
pub const fn errno_name(errno: i32) -> &'static str {
    match errno {
        libc::EPERM => "EPERM",
        libc::ENOENT => "ENOENT",
        libc::EIO => "EIO",
        libc::ENXIO => "ENXIO",
        libc::EBADF => "EBADF",
        libc::ENOMEM => "ENOMEM",
        libc::EACCES => "EACCES",
        libc::EBUSY => "EBUSY",
        libc::EEXIST => "EEXIST",
        libc::EXDEV => "EXDEV",
        libc::ENOTDIR => "ENOTDIR",
        libc::EISDIR => "EISDIR",
        libc::EINVAL => "EINVAL",
        libc::EMFILE => "EMFILE",
        libc::EFBIG => "EFBIG",
        libc::ENOSPC => "ENOSPC",
        libc::EROFS => "EROFS",
        libc::ENAMETOOLONG => "ENAMETOOLONG",
        libc::ENOTEMPTY => "ENOTEMPTY",
        libc::ELOOP => "ELOOP",
        _ => "UNKNOWN",
    }
}

/// A failed filesystem call
#[derive(Debug, thiserror::Error)]
#[error("{code}: {source}, {syscall} '{}'", .path.display())]
pub struct FsError {
    kind: FsErrorKind,
    code: &'static str,
    errno: Option<i32>,
    syscall: &'static str,
    path: PathBuf,
    #[source]
    source: io::Error,
}

impl FsError {
    pub fn new(source: io::Error, syscall: &'static str, path: impl Into<PathBuf>) -> Self {
        let errno = source.raw_os_error();
        let code = match errno {
            Some(n) => errno_name(n),
            None if source.kind() == io::ErrorKind::UnexpectedEof => "EOF",
            None => "UNKNOWN",
        };
        Self {
            kind: FsErrorKind::classify(&source),
            code,
            errno,
            syscall,
            path: path.into(),
            source,
        }
    }

    /// Error for an errno the engine raises itself (e.g. reading a directory)
    pub fn from_errno(errno: i32, syscall: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::new(io::Error::from_raw_os_error(errno), syscall, path)
    }

    pub const fn kind(&self) -> FsErrorKind {
        self.kind
    }

    pub const fn code(&self) -> &'static str {
        self.code
    }

    pub const fn errno(&self) -> Option<i32> {
        self.errno
    }

    pub const fn syscall(&self) -> &'static str {
        self.syscall
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub const fn status(&self) -> StatusCode {
        self.kind.status()
    }

    /// Header-ready `(field, value)` pairs
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("Code", self.code.to_string())];
        if let Some(errno) = self.errno {
            // negative, the way libuv reports it
            fields.push(("Errno", (-errno).to_string()));
        }
        fields.push(("Syscall", self.syscall.to_string()));
        fields.push(("Path", self.path.display().to_string()));
        fields
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "message": self.to_string(),
            "code": self.code,
            "errno": self.errno.map(|n| -n),
            "syscall": self.syscall,
            "path": self.path.display().to_string(),
        })
    }
}

/// Attach syscall and path context to an `io::Result`
pub trait FsResultExt<T> {
    fn fs_context(self, syscall: &'static str, path: &Path) -> Result<T, FsError>;
}

impl<T> FsResultExt<T> for io::Result<T> {
    fn fs_context(self, syscall: &'static str, path: &Path) -> Result<T, FsError> {
        self.map_err(|err| FsError::new(err, syscall, path))
    }
}
