//! Error policies for typed page streams
//!
//! A policy sees every job error a [`PageStream`](super::PageStream) receives,
//! together with the stream's cancellation token. Cancelling the token ends the
//! stream; returning without cancelling keeps it running.

use crate::error::Error;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// Decides what a page error means for the stream
pub trait ErrorPolicy: Send + Sync {
    /// Handle one error; cancel the token to stop the stream
    fn on_error(&self, error: Error, cancel: &CancellationToken);
}

impl<F> ErrorPolicy for F
where
    F: Fn(Error, &CancellationToken) + Send + Sync,
{
    fn on_error(&self, error: Error, cancel: &CancellationToken) {
        self(error, cancel);
    }
}

/// Panic on the first error
///
/// The panic is raised in the task polling the stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailFast;

impl ErrorPolicy for FailFast {
    fn on_error(&self, err: Error, cancel: &CancellationToken) {
        cancel.cancel();
        error!(error = %err, "Pagination failed");
        panic!("pagination failed: {err}");
    }
}

/// End the stream gracefully on the first error
#[derive(Debug, Clone, Copy, Default)]
pub struct CancelOnError;

impl ErrorPolicy for CancelOnError {
    fn on_error(&self, err: Error, cancel: &CancellationToken) {
        warn!(error = %err, "Stopping page stream");
        cancel.cancel();
    }
}

/// Log errors and keep delivering objects from the remaining pages
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipErrors;

impl ErrorPolicy for SkipErrors {
    fn on_error(&self, err: Error, _cancel: &CancellationToken) {
        warn!(error = %err, "Skipping failed page");
    }
}

/// Keep delivering objects and record every error for later inspection
///
/// Clones share the same error list.
#[derive(Debug, Clone, Default)]
pub struct CollectErrors {
    errors: Arc<Mutex<Vec<Error>>>,
}

impl CollectErrors {
    /// Create a policy with an empty error list
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of errors recorded so far
    pub fn len(&self) -> usize {
        self.errors.lock().map(|errors| errors.len()).unwrap_or(0)
    }

    /// True while no error has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every recorded error
    pub fn take(&self) -> Vec<Error> {
        match self.errors.lock() {
            Ok(mut errors) => std::mem::take(&mut *errors),
            Err(_) => Vec::new(),
        }
    }
}

impl ErrorPolicy for CollectErrors {
    fn on_error(&self, err: Error, _cancel: &CancellationToken) {
        warn!(error = %err, "Recording failed page");
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(err);
        }
    }
}
