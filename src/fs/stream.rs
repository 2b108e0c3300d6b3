//! Streaming reads bound to an open descriptor
//!
//! A [`ReadStream`] owns its reader and drops it the first time the stream
//! reaches end-of-file, fails, observes cancellation, or is itself dropped.
//! Whichever happens first releases the descriptor; later events find it
//! already gone.

use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{BufMut, Bytes, BytesMut};
use hyper::body::{Body as HttpBody, Frame, SizeHint};
use tokio::fs::File;
use tokio::io::AsyncRead;
use tokio_util::io::poll_read_buf;
use tokio_util::sync::CancellationToken;

use crate::logger;

/// Chunked body over any async reader
pub struct ReadStream<R> {
    reader: Option<R>,
    buf: BytesMut,
    chunk_size: usize,
    remaining: Option<u64>,
    signal: Option<CancellationToken>,
    label: PathBuf,
}

/// The stream handed out by the `READ` verb
pub type FileStream = ReadStream<File>;

impl<R: AsyncRead + Unpin> ReadStream<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader: Some(reader),
            buf: BytesMut::new(),
            chunk_size: chunk_size.max(1),
            remaining: None,
            signal: None,
            label: PathBuf::new(),
        }
    }

    /// Expected length, used only as a size hint
    #[must_use]
    pub const fn with_len(mut self, len: u64) -> Self {
        self.remaining = Some(len);
        self
    }

    #[must_use]
    pub fn with_signal(mut self, signal: Option<CancellationToken>) -> Self {
        self.signal = signal;
        self
    }

    /// Name used in debug logs when the reader is released
    #[must_use]
    pub fn with_label(mut self, label: impl Into<PathBuf>) -> Self {
        self.label = label.into();
        self
    }

    /// Whether the underlying reader is still held
    pub const fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    fn release(&mut self, reason: &str) {
        if let Some(reader) = self.reader.take() {
            drop(reader);
            logger::log_debug(&format!(
                "[Stream] Released '{}' ({reason})",
                self.label.display()
            ));
        }
    }
}

impl<R: AsyncRead + Unpin> HttpBody for ReadStream<R> {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        if this.signal.as_ref().is_some_and(CancellationToken::is_cancelled) {
            let was_open = this.is_open();
            this.release("cancelled");
            return if was_open {
                Poll::Ready(Some(Err(io::Error::new(
                    io::ErrorKind::Interrupted,
                    "The operation was aborted",
                ))))
            } else {
                Poll::Ready(None)
            };
        }

        let Some(reader) = this.reader.as_mut() else {
            return Poll::Ready(None);
        };

        this.buf.reserve(this.chunk_size);
        let mut window = (&mut this.buf).limit(this.chunk_size);

        match poll_read_buf(Pin::new(reader), cx, &mut window) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(0)) => {
                this.release("end of stream");
                Poll::Ready(None)
            }
            Poll::Ready(Ok(n)) => {
                if let Some(remaining) = this.remaining.as_mut() {
                    *remaining = remaining.saturating_sub(n as u64);
                }
                Poll::Ready(Some(Ok(Frame::data(this.buf.split().freeze()))))
            }
            Poll::Ready(Err(err)) => {
                this.release("read error");
                Poll::Ready(Some(Err(err)))
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.reader.is_none()
    }

    fn size_hint(&self) -> SizeHint {
        match self.remaining {
            Some(n) if self.is_open() => SizeHint::with_exact(n),
            Some(_) => SizeHint::with_exact(0),
            None => SizeHint::default(),
        }
    }
}

impl<R> Drop for ReadStream<R> {
    fn drop(&mut self) {
        if self.reader.take().is_some() {
            logger::log_debug(&format!(
                "[Stream] Released '{}' (dropped)",
                self.label.display()
            ));
        }
    }
}
