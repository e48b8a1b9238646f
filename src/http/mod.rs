//! HTTP transport module
//!
//! Provides the transport abstraction the pagination engine talks to, plus a
//! reqwest-backed implementation.
//!
//! # Features
//!
//! - **Transport trait**: method + path + query in, status/headers/body out
//! - **Query parameters**: ordered multi-map with option merging
//! - **HttpClient**: base URL joining, default headers, request timeout

mod client;
mod query;
mod transport;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use query::{Opt, QueryOption, QueryParams};
pub use transport::{Response, Transport};
