//! Client configuration file
//!
//! A YAML file bundling the HTTP client settings and the pagination defaults:
//!
//! ```yaml
//! base_url: "https://lms.example.com/api/v1/"
//! timeout_secs: 30
//! headers:
//!   Authorization: "Bearer <token>"
//! pagination:
//!   per_page: 50
//!   max_concurrency: 4
//!   job_timeout_secs: 20
//! ```

use crate::error::{Error, Result};
use crate::http::HttpClientConfig;
use crate::pagination::{
    PaginationConfig, DEFAULT_CHANNEL_CAPACITY, DEFAULT_MAX_CONCURRENCY, DEFAULT_PER_PAGE,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Top-Level Client Config
// ============================================================================

/// Complete client configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL that relative collection paths are joined to
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Pagination defaults
    #[serde(default)]
    pub pagination: PaginationSection,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout(),
            user_agent: None,
            headers: HashMap::new(),
            pagination: PaginationSection::default(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

// ============================================================================
// Pagination Section
// ============================================================================

/// Pagination settings as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationSection {
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Deadline for one page fetch, unbounded when absent
    #[serde(default)]
    pub job_timeout_secs: Option<u64>,
}

impl Default for PaginationSection {
    fn default() -> Self {
        Self {
            per_page: default_per_page(),
            max_concurrency: default_max_concurrency(),
            channel_capacity: default_channel_capacity(),
            job_timeout_secs: None,
        }
    }
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

// ============================================================================
// Loading
// ============================================================================

impl ClientConfig {
    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config(format!("Config file '{}' not found", path.display()))
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            }
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate a config from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        // An empty file is a valid, all-defaults config.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: ClientConfig = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse config YAML: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base_url {
            url::Url::parse(base_url)
                .map_err(|e| Error::invalid_value("base_url", e.to_string()))?;
        }

        if self.timeout_secs == 0 {
            return Err(Error::invalid_value("timeout_secs", "must be at least 1"));
        }

        if self.pagination.job_timeout_secs == Some(0) {
            return Err(Error::invalid_value(
                "pagination.job_timeout_secs",
                "must be at least 1",
            ));
        }

        self.pagination_config().validate()
    }

    /// Settings for [`HttpClient`](crate::http::HttpClient)
    pub fn http_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder().timeout(Duration::from_secs(self.timeout_secs));

        if let Some(base_url) = &self.base_url {
            builder = builder.base_url(base_url);
        }
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }

        builder.build()
    }

    /// Settings for [`Paginator`](crate::pagination::Paginator)
    pub fn pagination_config(&self) -> PaginationConfig {
        let section = &self.pagination;
        let config = PaginationConfig::new()
            .with_per_page(section.per_page)
            .with_max_concurrency(section.max_concurrency)
            .with_channel_capacity(section.channel_capacity);

        match section.job_timeout_secs {
            Some(secs) => config.with_job_timeout(Duration::from_secs(secs)),
            None => config,
        }
    }
}
