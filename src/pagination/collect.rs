//! Collector
//!
//! Drains a [`ResultStream`] into a single `Vec`, all-or-nothing.

use super::engine::ResultStream;
use crate::error::{Error, Result};
use tracing::{debug, warn};

/// Upper bound on the capacity reserved up front by [`ResultStream::collect`]
pub const MAX_PREALLOCATION: usize = 10_000;

impl<T> ResultStream<T> {
    /// Collect every object in arrival order
    ///
    /// The first error aborts the call: no partial result is returned, jobs
    /// that have not started are cancelled and the receivers are closed so no
    /// producer stays blocked on a send.
    pub async fn collect(mut self) -> Result<Vec<T>> {
        // pages × per_page overestimates when the last page is partial
        let hint = (self.pages as usize)
            .saturating_mul(self.per_page as usize)
            .min(MAX_PREALLOCATION);
        let mut collection = Vec::with_capacity(hint);

        loop {
            tokio::select! {
                biased;
                Some(err) = self.errors.recv() => return Err(self.abort(err)),
                object = self.objects.recv() => match object {
                    Some(object) => collection.push(object),
                    None => break,
                },
            }
        }

        // Errors from the last jobs may still be buffered after the object channel closed.
        if let Some(err) = self.errors.recv().await {
            return Err(self.abort(err));
        }

        debug!(
            pages = self.pages,
            count = collection.len(),
            "Collected paginated results"
        );
        Ok(collection)
    }

    fn abort(&mut self, err: Error) -> Error {
        warn!(error = %err, "Aborting collection");
        self.cancel.cancel();
        self.objects.close();
        self.errors.close();
        err
    }
}
