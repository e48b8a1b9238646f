//! Decoder implementations
//!
//! Each decoder handles a specific response format.

use super::types::PageDecoder;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

// ============================================================================
// JSON Decoder
// ============================================================================

/// JSON decoder with optional record path extraction
///
/// Without a path the body must be an array of records (a bare object is
/// treated as a single record). With a path such as `data.items` the records
/// are taken from that location; a missing path yields an empty page.
pub struct JsonDecoder<T> {
    record_path: Option<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDecoder<T> {
    /// Create a new JSON decoder
    pub fn new() -> Self {
        Self {
            record_path: None,
            _marker: PhantomData,
        }
    }

    /// Create a JSON decoder with a record path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            record_path: Some(path.into()),
            _marker: PhantomData,
        }
    }

    /// Configured record path, if any
    pub fn record_path(&self) -> Option<&str> {
        self.record_path.as_deref()
    }

    /// Extract raw records from a JSON value using the path
    fn extract_records(&self, value: Value) -> Vec<Value> {
        let target = match &self.record_path {
            Some(path) => match extract_simple_path(&value, path) {
                Some(v) => v,
                None => return vec![],
            },
            None => value,
        };

        match target {
            Value::Array(arr) => arr,
            Value::Null => vec![],
            other => vec![other],
        }
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonDecoder<T> {
    fn clone(&self) -> Self {
        Self {
            record_path: self.record_path.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for JsonDecoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonDecoder")
            .field("record_path", &self.record_path)
            .finish()
    }
}

impl<T: DeserializeOwned> PageDecoder<T> for JsonDecoder<T> {
    fn decode(&self, page: u32, body: &[u8]) -> Result<Vec<T>> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| Error::decode(page, format!("Failed to parse JSON: {e}")))?;

        self.extract_records(value)
            .into_iter()
            .enumerate()
            .map(|(idx, record)| {
                serde_json::from_value(record)
                    .map_err(|e| Error::decode(page, format!("Invalid record {idx}: {e}")))
            })
            .collect()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Walk a dot-separated path (`data.items`, `$.results`, `pages[0].items`)
fn extract_simple_path(value: &Value, path: &str) -> Option<Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() || path == "$" {
        return Some(value.clone());
    }

    let mut current = value;
    for part in path.split('.') {
        if let Some(bracket_pos) = part.find('[') {
            let name = &part[..bracket_pos];
            let index_str = part[bracket_pos + 1..].trim_end_matches(']');

            if !name.is_empty() {
                current = current.get(name)?;
            }

            let index: usize = index_str.parse().ok()?;
            current = current.as_array()?.get(index)?;
        } else {
            current = current.get(part)?;
        }
    }

    Some(current.clone())
}
