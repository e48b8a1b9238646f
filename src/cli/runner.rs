//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::ClientConfig;
use crate::decode::JsonDecoder;
use crate::error::{Error, Result};
use crate::http::{HttpClient, Opt};
use crate::pagination::{CollectErrors, Paginator};
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::List {
                path,
                per_page,
                concurrency,
                query,
                record_path,
                skip_errors,
            } => {
                self.list(
                    path,
                    *per_page,
                    *concurrency,
                    query,
                    record_path.as_deref(),
                    *skip_errors,
                )
                .await
            }
        }
    }

    /// Load the client config file, applying command-line overrides
    fn load_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        };

        if let Some(base_url) = &self.cli.base_url {
            config.base_url = Some(base_url.clone());
            config.validate()?;
        }

        Ok(config)
    }

    /// Fetch and print every object of a collection
    async fn list(
        &self,
        path: &str,
        per_page: Option<u32>,
        concurrency: Option<usize>,
        query: &[String],
        record_path: Option<&str>,
        skip_errors: bool,
    ) -> Result<()> {
        let started = Instant::now();
        let config = self.load_config()?;
        let options = parse_query(query)?;

        let mut pagination = config.pagination_config();
        if let Some(per_page) = per_page {
            pagination = pagination.with_per_page(per_page);
        }
        if let Some(concurrency) = concurrency {
            pagination = pagination.with_max_concurrency(concurrency);
        }

        let decoder = match record_path {
            Some(record_path) => JsonDecoder::<Value>::with_path(record_path),
            None => JsonDecoder::<Value>::new(),
        };

        let transport = Arc::new(HttpClient::with_config(config.http_config())?);
        let paginator = Paginator::new(transport, path, decoder)
            .options(&options)
            .with_config(pagination);

        let count = if skip_errors {
            let failures = CollectErrors::new();
            let mut stream = paginator.stream_with(failures.clone()).await;

            let mut count = 0usize;
            while let Some(object) = stream.next().await {
                self.output(&object)?;
                count += 1;
            }

            let failed = failures.take();
            for err in &failed {
                warn!(page = ?err.page(), error = %err, "Page skipped");
            }
            if !failed.is_empty() {
                eprintln!("{} page(s) failed and were skipped", failed.len());
            }
            count
        } else {
            let objects = paginator.collect().await?;
            for object in &objects {
                self.output(object)?;
            }
            objects.len()
        };

        info!(
            path,
            count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Listing complete"
        );
        Ok(())
    }

    /// Print one object
    fn output(&self, object: &Value) -> Result<()> {
        let line = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(object)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(object)?,
        };
        println!("{line}");
        Ok(())
    }
}

/// Parse `key=value` arguments into query options
fn parse_query(pairs: &[String]) -> Result<Vec<Opt>> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok(Opt::new(key, value)),
            _ => Err(Error::invalid_value(
                "query",
                format!("expected key=value, got '{pair}'"),
            )),
        })
        .collect()
}
