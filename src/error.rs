//! Error types for fanout-pager
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for fanout-pager
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Pagination Errors
    // ============================================================================
    #[error("Invalid Link header entry '{url}': {message}")]
    LinkParse { url: String, message: String },

    #[error("Could not find last page for '{path}'")]
    PageCountUnavailable { path: String },

    #[error("Failed to decode page {page}: {message}")]
    Decode { page: u32, message: String },

    #[error("Fetch job for page {page} failed: {message}")]
    JobFailed { page: u32, message: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a Link header parse error
    pub fn link_parse(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LinkParse {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a page count error
    pub fn page_count_unavailable(path: impl Into<String>) -> Self {
        Self::PageCountUnavailable { path: path.into() }
    }

    /// Create a decode error for a page
    pub fn decode(page: u32, message: impl Into<String>) -> Self {
        Self::Decode {
            page,
            message: message.into(),
        }
    }

    /// Create a failed job error
    pub fn job_failed(page: u32, message: impl Into<String>) -> Self {
        Self::JobFailed {
            page,
            message: message.into(),
        }
    }

    /// Check if the request itself failed (network, status, deadline)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::HttpStatus { .. } | Error::Timeout { .. }
        )
    }

    /// Check if a page body could not be decoded
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Decode { .. })
    }

    /// Page number this error belongs to, if it is page-scoped
    pub fn page(&self) -> Option<u32> {
        match self {
            Error::Decode { page, .. } | Error::JobFailed { page, .. } => Some(*page),
            _ => None,
        }
    }
}

/// Result type alias for fanout-pager
pub type Result<T> = std::result::Result<T, Error>;
