//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Concurrent Link-header paginator for REST collections
#[derive(Parser, Debug)]
#[command(name = "fanout-pager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Client configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL for relative collection paths (overrides the config file)
    #[arg(short, long, global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every page of a collection and print its objects
    List {
        /// Collection path (e.g. courses/42/files) or absolute URL
        path: String,

        /// Records per page
        #[arg(long)]
        per_page: Option<u32>,

        /// Maximum pages fetched at once
        #[arg(long)]
        concurrency: Option<usize>,

        /// Extra query parameter as key=value (repeatable)
        #[arg(short, long = "query", value_name = "KEY=VALUE")]
        query: Vec<String>,

        /// Dot path to the record array inside each page (e.g. data.items)
        #[arg(long)]
        record_path: Option<String>,

        /// Print objects from healthy pages and report failed pages at the end
        #[arg(long)]
        skip_errors: bool,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one object per line)
    Json,
    /// Human-readable output
    Pretty,
}
