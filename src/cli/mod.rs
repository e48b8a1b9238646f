//! CLI module
//!
//! Command-line interface for listing paginated collections.
//!
//! # Commands
//!
//! - `list` - Fetch every page of a collection and print its objects

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
