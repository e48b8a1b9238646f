//! Typed page stream
//!
//! Re-exposes a [`ResultStream`] as a `futures::Stream` of objects, routing
//! errors through an [`ErrorPolicy`].
//!
//! ```text
//! Running ──(cancelled)──────────────────────────► Done
//!    │
//!    └─(objects exhausted)─► Draining ─(errors exhausted or cancelled)─► Done
//! ```
//!
//! While running, the stream selects between cancellation, error arrival and
//! object arrival. Once done it yields `None` forever.

use super::engine::ResultStream;
use super::policy::{ErrorPolicy, FailFast};
use crate::error::Error;
use futures::stream::FusedStream;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running,
    Draining,
    Done,
}

/// Stream of decoded objects from one paginated call
pub struct PageStream<T> {
    objects: mpsc::Receiver<T>,
    errors: mpsc::Receiver<Error>,
    policy: Box<dyn ErrorPolicy>,
    cancel: CancellationToken,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
    pages: u32,
    phase: Phase,
}

impl<T> PageStream<T> {
    /// Wrap a result stream with an error policy
    pub fn new<P: ErrorPolicy + 'static>(results: ResultStream<T>, policy: P) -> Self {
        let cancel = results.cancel.clone();
        Self {
            objects: results.objects,
            errors: results.errors,
            policy: Box::new(policy),
            cancelled: Box::pin(cancel.clone().cancelled_owned()),
            cancel,
            pages: results.pages,
            phase: Phase::Running,
        }
    }

    /// Total page count of the underlying call
    pub fn pages(&self) -> u32 {
        self.pages
    }

    /// True once the stream has finished and will only yield `None`
    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Stop the stream; it ends at the next poll
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Close both receivers; in-flight jobs finish and their output is discarded
    fn finish(&mut self) {
        if self.phase != Phase::Done {
            debug!(pages = self.pages, "Page stream closed");
        }
        self.cancel.cancel();
        self.objects.close();
        self.errors.close();
        self.phase = Phase::Done;
    }
}

impl<T> ResultStream<T> {
    /// Stream objects, panicking on the first error
    pub fn into_stream(self) -> PageStream<T> {
        PageStream::new(self, FailFast)
    }

    /// Stream objects with a custom error policy
    pub fn into_stream_with<P: ErrorPolicy + 'static>(self, policy: P) -> PageStream<T> {
        PageStream::new(self, policy)
    }
}

impl<T> Stream for PageStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.get_mut();

        loop {
            match this.phase {
                Phase::Done => return Poll::Ready(None),
                Phase::Running => {
                    if this.cancelled.as_mut().poll(cx).is_ready() {
                        this.finish();
                        continue;
                    }

                    if let Poll::Ready(Some(err)) = this.errors.poll_recv(cx) {
                        this.policy.on_error(err, &this.cancel);
                        continue;
                    }

                    match this.objects.poll_recv(cx) {
                        Poll::Ready(Some(object)) => return Poll::Ready(Some(object)),
                        Poll::Ready(None) => this.phase = Phase::Draining,
                        Poll::Pending => return Poll::Pending,
                    }
                }
                Phase::Draining => {
                    if this.cancel.is_cancelled() {
                        this.finish();
                        continue;
                    }

                    match this.errors.poll_recv(cx) {
                        Poll::Ready(Some(err)) => this.policy.on_error(err, &this.cancel),
                        Poll::Ready(None) => this.finish(),
                        Poll::Pending => return Poll::Pending,
                    }
                }
            }
        }
    }
}

impl<T> FusedStream for PageStream<T> {
    fn is_terminated(&self) -> bool {
        self.is_done()
    }
}

impl<T> Unpin for PageStream<T> {}

impl<T> std::fmt::Debug for PageStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageStream")
            .field("pages", &self.pages)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}
