//! Pagination module
//!
//! Concurrent fetching of Link-header paginated collections.
//!
//! # Overview
//!
//! - [`LinkSet`] - parses `Link` headers into page relations
//! - [`Paginator`] - fetches page 1, discovers the page count and fans out
//!   one job per remaining page
//! - [`ResultStream::collect`] - all-or-nothing collection into a `Vec`
//! - [`PageStream`] - a typed `Stream` with a pluggable [`ErrorPolicy`]
//!
//! Objects arrive in no particular page order; within one page, order is kept.

mod collect;
mod engine;
mod link;
mod policy;
mod stream;
mod types;

pub use collect::MAX_PREALLOCATION;
pub use engine::{Paginator, ResultStream};
pub use link::{LinkSet, PageLink};
pub use policy::{CancelOnError, CollectErrors, ErrorPolicy, FailFast, SkipErrors};
pub use stream::PageStream;
pub use types::{
    PageRequest, PaginationConfig, DEFAULT_CHANNEL_CAPACITY, DEFAULT_MAX_CONCURRENCY,
    DEFAULT_PER_PAGE,
};

#[cfg(test)]
mod tests;
