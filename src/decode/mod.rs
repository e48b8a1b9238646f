//! Page decoder module
//!
//! Supports: JSON
//!
//! # Overview
//!
//! A page decoder turns one page's raw body into typed records. Decoders are
//! supplied per resource type; closures of the shape
//! `Fn(u32, &[u8]) -> Result<Vec<T>>` work as decoders too.

mod decoders;
mod types;

pub use decoders::JsonDecoder;
pub use types::PageDecoder;
