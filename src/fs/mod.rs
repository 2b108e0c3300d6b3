//! Filesystem boundary
//!
//! Everything below the engine that touches the disk: error translation,
//! stat capture, range reads, body writes and descriptor-owning streams.

mod error;
pub mod io;
mod stat;
mod stream;

pub use error::{errno_name, FsError, FsErrorKind, FsResultExt};
pub use io::{read_ranges, write_body, WriteMode};
pub use stat::{iso_timestamp, StatSnapshot};
pub use stream::{FileStream, ReadStream};
