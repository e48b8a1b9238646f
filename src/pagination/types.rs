//! Pagination types
//!
//! Configuration and the per-call request description shared by every job.

use crate::error::{Error, Result};
use crate::http::QueryParams;
use std::time::Duration;

/// Default number of records requested per page
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Default number of page fetches allowed in flight at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Default capacity of the object and error channels
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Configuration for a paginated fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationConfig {
    /// Records per page (`per_page` query parameter)
    pub per_page: u32,
    /// Maximum concurrent page fetches
    pub max_concurrency: usize,
    /// Bound of the object and error channels
    pub channel_capacity: usize,
    /// Deadline for each page request
    pub job_timeout: Option<Duration>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            job_timeout: None,
        }
    }
}

impl PaginationConfig {
    /// Create a new pagination config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set records per page
    #[must_use]
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    /// Set the concurrency limit
    #[must_use]
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Set the channel capacity
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set a per-request deadline
    #[must_use]
    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = Some(timeout);
        self
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<()> {
        if self.per_page == 0 {
            return Err(Error::invalid_value("per_page", "must be at least 1"));
        }
        if self.max_concurrency == 0 {
            return Err(Error::invalid_value("max_concurrency", "must be at least 1"));
        }
        if self.channel_capacity == 0 {
            return Err(Error::invalid_value("channel_capacity", "must be at least 1"));
        }
        if self.job_timeout == Some(Duration::ZERO) {
            return Err(Error::invalid_value("job_timeout", "must be non-zero"));
        }
        Ok(())
    }
}

/// A collection request, fixed once fetching starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Collection path
    pub path: String,
    /// Caller query parameters
    pub query: QueryParams,
    /// Records per page
    pub per_page: u32,
}

impl PageRequest {
    /// Create a request for a collection path
    pub fn new(path: impl Into<String>, query: QueryParams, per_page: u32) -> Self {
        Self {
            path: path.into(),
            query,
            per_page,
        }
    }

    /// Query parameters for one page
    ///
    /// `page` and `per_page` are set first; caller parameters replace them on
    /// conflicting keys.
    pub fn page_query(&self, page: u32) -> QueryParams {
        let mut query = QueryParams::new()
            .with("page", page.to_string())
            .with("per_page", self.per_page.to_string());
        query.join(&self.query);
        query
    }
}
