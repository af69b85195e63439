use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

use crate::domain::value_objects::{Ref, SizedRef};

/// Type alias for async reader
pub type BlobReader = Pin<Box<dyn AsyncRead + Send>>;

/// Future resolving to an opened blob stream.
pub type OpenFuture = Pin<Box<dyn Future<Output = io::Result<BlobReader>> + Send>>;

/// Capability to open a fresh stream over a blob's content.
///
/// `open` never fails directly: any error resolving the content surfaces on
/// the first read of the returned stream. The caller owns the stream.
pub trait ContentSource: Send + Sync {
    fn open(&self) -> BlobReader;
}

impl<F> ContentSource for F
where
    F: Fn() -> BlobReader + Send + Sync,
{
    fn open(&self) -> BlobReader {
        self()
    }
}

/// Blob entity - a sized reference plus a way to read its content.
///
/// Constructing a `Blob` does no I/O, so blobs can be built speculatively
/// and opened any number of times.
#[derive(Clone)]
pub struct Blob {
    sized_ref: SizedRef,
    source: Arc<dyn ContentSource>,
}

impl Blob {
    pub fn new(reference: Ref, size: u32, source: impl ContentSource + 'static) -> Self {
        Self {
            sized_ref: SizedRef::new(reference, size),
            source: Arc::new(source),
        }
    }

    pub fn reference(&self) -> &Ref {
        self.sized_ref.reference()
    }

    /// Size of the blob in bytes
    pub fn size(&self) -> u32 {
        self.sized_ref.size()
    }

    pub fn sized_ref(&self) -> &SizedRef {
        &self.sized_ref
    }

    /// Open a new stream over the content.
    pub fn open(&self) -> BlobReader {
        self.source.open()
    }
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blob")
            .field("sized_ref", &self.sized_ref)
            .finish_non_exhaustive()
    }
}

enum DeferredState {
    Opening(OpenFuture),
    Ready(BlobReader),
    Failed(Option<io::Error>),
}

/// Stream that resolves its source on first read.
///
/// Errors from resolving the source are returned by the first read; later
/// reads keep failing.
pub struct DeferredReader {
    state: DeferredState,
}

impl DeferredReader {
    pub fn new(open: impl Future<Output = io::Result<BlobReader>> + Send + 'static) -> Self {
        Self {
            state: DeferredState::Opening(Box::pin(open)),
        }
    }

    /// Reader whose every read fails with `error`.
    pub fn failed(error: io::Error) -> Self {
        Self {
            state: DeferredState::Failed(Some(error)),
        }
    }
}

impl AsyncRead for DeferredReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            match &mut this.state {
                DeferredState::Opening(open) => match open.as_mut().poll(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(Ok(reader)) => this.state = DeferredState::Ready(reader),
                    Poll::Ready(Err(e)) => {
                        this.state = DeferredState::Failed(None);
                        return Poll::Ready(Err(e));
                    }
                },
                DeferredState::Ready(reader) => return reader.as_mut().poll_read(cx, buf),
                DeferredState::Failed(error) => {
                    let error = error
                        .take()
                        .unwrap_or_else(|| io::Error::other("blob source unavailable"));
                    return Poll::Ready(Err(error));
                }
            }
        }
    }
}
