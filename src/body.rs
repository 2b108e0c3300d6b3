//! Request and response bodies
//!
//! One body type serves both directions: it is what callers hand to a
//! write and what reads hand back.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::BodyExt;
use hyper::body::{Body as HttpBody, Frame, SizeHint};
use tokio::io::AsyncRead;

use crate::fs::{FileStream, ReadStream};

#[derive(Default)]
pub enum Body {
    /// No body at all, distinct from an empty one
    #[default]
    Empty,
    Full(Bytes),
    Stream(UnsyncBoxBody<Bytes, io::Error>),
    /// Live stream over an open descriptor (`READ`)
    File(FileStream),
}

impl Body {
    /// Box any body whose chunks are `Bytes`
    pub fn stream<B>(body: B) -> Self
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Stream(UnsyncBoxBody::new(body.map_err(io::Error::other)))
    }

    /// Chunked body pulled from an async reader, e.g. stdin
    pub fn reader<R>(reader: R, chunk_size: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        Self::stream(ReadStream::new(reader, chunk_size))
    }

    /// Whether the caller supplied no body
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Collect the whole body into memory
    pub async fn bytes(self) -> io::Result<Bytes> {
        match self {
            Self::Empty => Ok(Bytes::new()),
            Self::Full(bytes) => Ok(bytes),
            other => Ok(other.collect().await?.to_bytes()),
        }
    }
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("Body::Empty"),
            Self::Full(bytes) => write!(f, "Body::Full({} bytes)", bytes.len()),
            Self::Stream(_) => f.write_str("Body::Stream"),
            Self::File(_) => f.write_str("Body::File"),
        }
    }
}

impl HttpBody for Body {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Empty => Poll::Ready(None),
            Self::Full(bytes) if bytes.is_empty() => Poll::Ready(None),
            Self::Full(bytes) => Poll::Ready(Some(Ok(Frame::data(std::mem::take(bytes))))),
            Self::Stream(body) => Pin::new(body).poll_frame(cx),
            Self::File(stream) => Pin::new(stream).poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Full(bytes) => bytes.is_empty(),
            Self::Stream(body) => body.is_end_stream(),
            Self::File(stream) => stream.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            Self::Empty => SizeHint::with_exact(0),
            Self::Full(bytes) => SizeHint::with_exact(bytes.len() as u64),
            Self::Stream(body) => body.size_hint(),
            Self::File(stream) => stream.size_hint(),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Full(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Full(bytes.into())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Full(text.into())
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Self::Full(Bytes::from_static(text.as_bytes()))
    }
}

impl From<FileStream> for Body {
    fn from(stream: FileStream) -> Self {
        Self::File(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;

    #[tokio::test]
    async fn test_absent_vs_empty() {
        assert!(Body::Empty.is_absent());
        assert!(!Body::from("").is_absent());
        assert_eq!(Body::Empty.bytes().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_full_body() {
        let body = Body::from("test");
        assert_eq!(body.size_hint().exact(), Some(4));
        assert_eq!(body.bytes().await.unwrap(), "test");
    }

    #[tokio::test]
    async fn test_boxed_stream() {
        let body = Body::stream(Full::new(Bytes::from("x")));
        assert!(matches!(body, Body::Stream(_)));
        assert_eq!(body.bytes().await.unwrap(), "x");
    }

    #[tokio::test]
    async fn test_reader_body() {
        let data: &'static [u8] = b"0123456789";
        let body = Body::reader(data, 3);
        assert_eq!(body.bytes().await.unwrap(), "0123456789");
    }
}
