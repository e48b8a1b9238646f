//! Decoder traits
//!
//! Defines the core decoder abstraction.

use crate::error::Result;

/// Decodes one page body into a sequence of records
///
/// The body is borrowed for the duration of the call only.
pub trait PageDecoder<T>: Send + Sync {
    /// Decode the body of `page` into records, in page order
    fn decode(&self, page: u32, body: &[u8]) -> Result<Vec<T>>;
}

impl<T, F> PageDecoder<T> for F
where
    F: Fn(u32, &[u8]) -> Result<Vec<T>> + Send + Sync,
{
    fn decode(&self, page: u32, body: &[u8]) -> Result<Vec<T>> {
        self(page, body)
    }
}
