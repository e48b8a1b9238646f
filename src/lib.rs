// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # fanout-pager
//!
//! Concurrent fetching of paginated REST collections that advertise their
//! page count through the HTTP `Link` header.
//!
//! ## Features
//!
//! - **Fan-out**: page 1 reveals the page count, every remaining page is
//!   fetched by its own bounded job
//! - **Typed results**: one generic engine, decoded into any `serde` type
//! - **Collector**: all-or-nothing `Vec<T>`
//! - **Streams**: `futures::Stream` of objects with a pluggable error policy
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fanout_pager::resources::{course_files_path, list_files};
//! use fanout_pager::{HttpClient, HttpClientConfig, Opt};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> fanout_pager::Result<()> {
//!     let config = HttpClientConfig::builder()
//!         .base_url("https://lms.example.com/api/v1/")
//!         .header("Authorization", "Bearer <token>")
//!         .build();
//!     let client = Arc::new(HttpClient::with_config(config)?);
//!
//!     let files = list_files(client, course_files_path(42), &[Opt::new("sort", "name")]).await?;
//!     println!("{} files", files.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │          resources: File / Folder listings, CLI              │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌───────────┬─────────────────┴────────────────┬───────────────┐
//! │   HTTP    │           Pagination             │    Decode     │
//! ├───────────┼──────────────────────────────────┼───────────────┤
//! │ Transport │ Link parser    Paginator         │ PageDecoder   │
//! │ HttpClient│ Collector      PageStream        │ JSON          │
//! │ Query     │ Error policies                   │               │
//! └───────────┴──────────────────────────────────┴───────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types
pub mod types;

/// HTTP transport and query parameters
pub mod http;

/// Concurrent Link-header pagination
pub mod pagination;

/// Page decoders
pub mod decode;

/// Client configuration file
pub mod config;

/// Typed file and folder listings
pub mod resources;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::ClientConfig;
pub use decode::{JsonDecoder, PageDecoder};
pub use http::{HttpClient, HttpClientConfig, Opt, QueryOption, QueryParams, Transport};
pub use pagination::{
    CancelOnError, CollectErrors, ErrorPolicy, FailFast, PageStream, PaginationConfig, Paginator,
    ResultStream, SkipErrors,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
