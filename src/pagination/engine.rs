//! Paginated fetch engine
//!
//! Fetches page 1, reads the page count from its `Link` header, then fans out
//! one job per remaining page, keeping at most `max_concurrency` of them alive. Decoded objects and job errors are fanned back
//! in through two bounded channels that close once every job has finished.
//!
//! ```text
//!             ┌──────────┐  Link: rel="last" → N
//!  start() ──►│  page 1  │────────────────────────┐
//!             └──────────┘                        ▼
//!                         ┌──────── supervisor (JoinSet) ────────┐
//!                         │ decode(1)  fetch+decode(2) … (N)     │ ≤ max_concurrency
//!                         └──────┬───────────────────────┬───────┘
//!                                ▼                       ▼
//!                          objects: mpsc<T>        errors: mpsc<Error>
//! ```

use super::link::LinkSet;
use super::policy::ErrorPolicy;
use super::stream::PageStream;
use super::types::{PageRequest, PaginationConfig};
use crate::decode::PageDecoder;
use crate::error::{Error, Result};
use crate::http::{QueryOption, QueryParams, Response, Transport};
use bytes::Bytes;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Builder and entry point for one paginated collection call
pub struct Paginator<T> {
    transport: Arc<dyn Transport>,
    decoder: Arc<dyn PageDecoder<T>>,
    path: String,
    query: QueryParams,
    config: PaginationConfig,
}

impl<T: Send + 'static> Paginator<T> {
    /// Create a paginator for a collection path
    pub fn new(
        transport: Arc<dyn Transport>,
        path: impl Into<String>,
        decoder: impl PageDecoder<T> + 'static,
    ) -> Self {
        Self {
            transport,
            decoder: Arc::new(decoder),
            path: path.into(),
            query: QueryParams::new(),
            config: PaginationConfig::default(),
        }
    }

    /// Merge caller query parameters
    #[must_use]
    pub fn with_query(mut self, query: &QueryParams) -> Self {
        self.query.join(query);
        self
    }

    /// Apply a single query option
    #[must_use]
    pub fn option(mut self, opt: impl QueryOption) -> Self {
        self.query.apply(&opt);
        self
    }

    /// Apply query options in order
    #[must_use]
    pub fn options<O: QueryOption>(mut self, opts: &[O]) -> Self {
        for opt in opts {
            self.query.apply(opt);
        }
        self
    }

    /// Set records per page
    #[must_use]
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.config.per_page = per_page;
        self
    }

    /// Replace the pagination config
    #[must_use]
    pub fn with_config(mut self, config: PaginationConfig) -> Self {
        self.config = config;
        self
    }

    /// The request this paginator will issue
    pub fn request(&self) -> PageRequest {
        PageRequest::new(&self.path, self.query.clone(), self.config.per_page)
    }

    /// Fetch page 1 and launch jobs for the remaining pages
    ///
    /// Never fails directly: a failure to discover the page count arrives as
    /// the only item of the error channel, with both channels already closed.
    pub async fn start(self) -> ResultStream<T> {
        let capacity = self.config.channel_capacity.max(1);
        let (objects_tx, objects_rx) = mpsc::channel(capacity);
        let (errors_tx, errors_rx) = mpsc::channel(capacity);
        let cancel = CancellationToken::new();
        let request = Arc::new(self.request());

        let mut stream = ResultStream {
            objects: objects_rx,
            errors: errors_rx,
            pages: 0,
            per_page: request.per_page,
            cancel: cancel.clone(),
        };

        if let Err(e) = self.config.validate() {
            let _ = errors_tx.send(e).await;
            return stream;
        }

        let first = first_page(
            self.transport.as_ref(),
            &request,
            self.config.job_timeout,
        )
        .await;
        let (pages, response) = match first {
            Ok(first) => first,
            Err(e) => {
                warn!(path = %request.path, error = %e, "Could not start pagination");
                let _ = errors_tx.send(e).await;
                return stream;
            }
        };

        info!(path = %request.path, pages, "Fetching pages");
        stream.pages = pages;

        let jobs = Arc::new(JobContext {
            transport: self.transport,
            decoder: self.decoder,
            request,
            objects: objects_tx,
            errors: errors_tx,
            max_jobs: self.config.max_concurrency.max(1),
            cancel,
            timeout: self.config.job_timeout,
        });
        tokio::spawn(supervise(jobs, pages, response.body));

        stream
    }

    /// Fetch every page and collect the objects (see [`ResultStream::collect`])
    pub async fn collect(self) -> Result<Vec<T>> {
        self.start().await.collect().await
    }

    /// Fetch every page as a stream that fails fast on the first error
    pub async fn stream(self) -> PageStream<T> {
        self.start().await.into_stream()
    }

    /// Fetch every page as a stream with a custom error policy
    pub async fn stream_with<P: ErrorPolicy + 'static>(self, policy: P) -> PageStream<T> {
        self.start().await.into_stream_with(policy)
    }
}

impl<T> std::fmt::Debug for Paginator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("path", &self.path)
            .field("query", &self.query)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Output of one paginated call: unordered objects plus per-page errors
///
/// Both channels close once every page job has finished.
pub struct ResultStream<T> {
    pub(super) objects: mpsc::Receiver<T>,
    pub(super) errors: mpsc::Receiver<Error>,
    pub(super) pages: u32,
    pub(super) per_page: u32,
    pub(super) cancel: CancellationToken,
}

impl<T> ResultStream<T> {
    /// Total page count (0 when discovery failed)
    pub fn pages(&self) -> u32 {
        self.pages
    }

    /// Records requested per page
    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Token observed by jobs that have not started fetching yet
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Stop launching page fetches; running ones still complete
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Split into the raw object and error receivers
    ///
    /// Both receivers must be drained concurrently, for example from one
    /// `tokio::select!` loop. Both channels are bounded: once the error
    /// channel fills up, jobs block on it and the object channel never closes,
    /// so a caller that reads all objects before looking at errors can hang.
    pub fn into_parts(self) -> (mpsc::Receiver<T>, mpsc::Receiver<Error>) {
        (self.objects, self.errors)
    }
}

impl<T> std::fmt::Debug for ResultStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStream")
            .field("pages", &self.pages)
            .field("per_page", &self.per_page)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Jobs
// ============================================================================

/// State shared by every page job of one call
struct JobContext<T> {
    transport: Arc<dyn Transport>,
    decoder: Arc<dyn PageDecoder<T>>,
    request: Arc<PageRequest>,
    objects: mpsc::Sender<T>,
    errors: mpsc::Sender<Error>,
    /// Upper bound on live page jobs
    max_jobs: usize,
    cancel: CancellationToken,
    timeout: Option<Duration>,
}

impl<T: Send + 'static> JobContext<T> {
    /// Fetch and decode one page beyond the first
    async fn run(&self, page: u32) {
        if self.cancel.is_cancelled() {
            debug!(page, "Pagination cancelled, skipping page");
            return;
        }

        match fetch_page(self.transport.as_ref(), &self.request, page, self.timeout).await {
            Ok(response) => self.deliver(page, &response.body).await,
            Err(e) => self.report(page, e).await,
        }
    }

    /// Decode a page body and push its objects in page order
    async fn deliver(&self, page: u32, body: &[u8]) {
        let objects = match self.decoder.decode(page, body) {
            Ok(objects) => objects,
            Err(e) => return self.report(page, e).await,
        };

        debug!(page, count = objects.len(), "Decoded page");
        for object in objects {
            if self.objects.send(object).await.is_err() {
                debug!(page, "Object receiver dropped, discarding page");
                return;
            }
        }
    }

    async fn report(&self, page: u32, error: Error) {
        warn!(page, error = %error, "Page failed");
        if self.errors.send(error).await.is_err() {
            debug!(page, "Error receiver dropped");
        }
    }

    /// Run a job, turning a panic into a page error
    async fn guarded(self: Arc<Self>, page: u32, first: Option<Bytes>) {
        let outcome = match &first {
            Some(body) => AssertUnwindSafe(self.deliver(page, body)).catch_unwind().await,
            None => AssertUnwindSafe(self.run(page)).catch_unwind().await,
        };

        if let Err(panic) = outcome {
            let message = panic_message(panic.as_ref());
            error!(page, %message, "Page job panicked");
            self.report(page, Error::job_failed(page, message)).await;
        }
    }
}

/// Join barrier: keeps at most `max_jobs` page jobs alive, then closes both
/// channels once the last one finishes
///
/// A job for the next page is spawned only when a slot frees up, so the
/// advertised page count never turns into that many tasks at once.
async fn supervise<T: Send + 'static>(jobs: Arc<JobContext<T>>, pages: u32, first: Bytes) {
    let mut set = JoinSet::new();
    let mut remaining = 2..=pages;

    set.spawn(jobs.clone().guarded(1, Some(first)));

    loop {
        while set.len() < jobs.max_jobs && !jobs.cancel.is_cancelled() {
            match remaining.next() {
                Some(page) => {
                    set.spawn(jobs.clone().guarded(page, None));
                }
                None => break,
            }
        }

        match set.join_next().await {
            Some(Ok(())) => {}
            Some(Err(e)) => error!(error = %e, "Page job aborted"),
            None => break,
        }
    }

    if jobs.cancel.is_cancelled() {
        debug!(path = %jobs.request.path, pages, "Pagination cancelled, stopped spawning");
    } else {
        debug!(path = %jobs.request.path, pages, "All page jobs finished");
    }
    // Last reference: dropping it drops both senders and closes the channels.
    drop(jobs);
}

/// Fetch page 1 and read the page count from its `Link` header
async fn first_page(
    transport: &dyn Transport,
    request: &PageRequest,
    timeout: Option<Duration>,
) -> Result<(u32, Response)> {
    let response = fetch_page(transport, request, 1, timeout).await?;

    let (links, failures) = match response.header("link") {
        Some(header) => LinkSet::parse_lenient(header),
        None => (LinkSet::default(), Vec::new()),
    };
    for (rel, e) in failures {
        if rel == "last" {
            return Err(e);
        }
        warn!(rel = %rel, error = %e, "Ignoring unparsable Link relation");
    }

    let last = links
        .last_page()
        .ok_or_else(|| Error::page_count_unavailable(&request.path))?;

    Ok((last.max(1), response))
}

/// GET one page, bounded by the job deadline when configured
async fn fetch_page(
    transport: &dyn Transport,
    request: &PageRequest,
    page: u32,
    timeout: Option<Duration>,
) -> Result<Response> {
    let query = request.page_query(page);
    let fetch = transport.get(&request.path, &query);

    match timeout {
        Some(limit) => tokio::time::timeout(limit, fetch)
            .await
            .map_err(|_| Error::Timeout {
                timeout_ms: limit.as_millis() as u64,
            })?,
        None => fetch.await,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "job panicked".to_string()
    }
}
