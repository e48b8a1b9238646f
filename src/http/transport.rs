//! Transport abstraction
//!
//! The pagination engine only needs to issue a request and read back the
//! status, headers and body. Anything that can do that (a reqwest client,
//! a test stub, a recording proxy) implements [`Transport`].

use super::query::QueryParams;
use crate::error::Result;
use crate::types::Method;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;

/// A fully-read HTTP response
#[derive(Debug, Clone, Default)]
pub struct Response {
    /// Status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Bytes,
}

impl Response {
    /// Create a response
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Get a header value as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text (lossy)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Issues requests on behalf of the pagination engine
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and read the whole response
    async fn send(&self, method: Method, path: &str, query: &QueryParams) -> Result<Response>;

    /// Send a GET request
    async fn get(&self, path: &str, query: &QueryParams) -> Result<Response> {
        self.send(Method::GET, path, query).await
    }
}
