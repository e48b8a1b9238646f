//! Typed LMS file-system resources
//!
//! [`File`] and [`Folder`] listings are plain instantiations of the generic
//! [`Paginator`]: the same engine, decoder and stream adapter, parameterised by
//! the record type.

use crate::decode::JsonDecoder;
use crate::error::Result;
use crate::http::{QueryOption, Transport};
use crate::pagination::{ErrorPolicy, PageStream, PaginationConfig, Paginator};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A file stored in a course or folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub id: u64,
    #[serde(default)]
    pub folder_id: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub uuid: Option<String>,
    pub filename: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(rename = "content-type", default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub mime_class: Option<String>,
}

impl File {
    /// Name shown to users, falling back to the stored filename
    pub fn name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.filename
        } else {
            &self.display_name
        }
    }
}

/// A folder in a course's file tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: u64,
    #[serde(default)]
    pub parent_folder_id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub files_url: Option<String>,
    #[serde(default)]
    pub folders_url: Option<String>,
    #[serde(default)]
    pub context_type: Option<String>,
    #[serde(default)]
    pub context_id: Option<u64>,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub files_count: u32,
    #[serde(default)]
    pub folders_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub for_submissions: bool,
}

impl Folder {
    /// True for a folder without a parent
    pub fn is_root(&self) -> bool {
        self.parent_folder_id.is_none()
    }
}

// ============================================================================
// Collection paths
// ============================================================================

pub fn course_files_path(course_id: u64) -> String {
    format!("courses/{course_id}/files")
}

pub fn course_folders_path(course_id: u64) -> String {
    format!("courses/{course_id}/folders")
}

pub fn folder_files_path(folder_id: u64) -> String {
    format!("folders/{folder_id}/files")
}

pub fn folder_folders_path(folder_id: u64) -> String {
    format!("folders/{folder_id}/folders")
}

// ============================================================================
// Listings
// ============================================================================

/// Paginator for any JSON-array collection of `T`
pub fn listing<T, O>(
    transport: Arc<dyn Transport>,
    path: impl Into<String>,
    options: &[O],
    config: PaginationConfig,
) -> Paginator<T>
where
    T: DeserializeOwned + Send + 'static,
    O: QueryOption,
{
    Paginator::new(transport, path, JsonDecoder::<T>::new())
        .options(options)
        .with_config(config)
}

/// Stream every file under `path`
pub async fn files<O, P>(
    transport: Arc<dyn Transport>,
    path: impl Into<String>,
    options: &[O],
    policy: P,
) -> PageStream<File>
where
    O: QueryOption,
    P: ErrorPolicy + 'static,
{
    listing(transport, path, options, PaginationConfig::default())
        .stream_with(policy)
        .await
}

/// Stream every folder under `path`
pub async fn folders<O, P>(
    transport: Arc<dyn Transport>,
    path: impl Into<String>,
    options: &[O],
    policy: P,
) -> PageStream<Folder>
where
    O: QueryOption,
    P: ErrorPolicy + 'static,
{
    listing(transport, path, options, PaginationConfig::default())
        .stream_with(policy)
        .await
}

/// Collect every file under `path`, failing on the first page error
pub async fn list_files<O: QueryOption>(
    transport: Arc<dyn Transport>,
    path: impl Into<String>,
    options: &[O],
) -> Result<Vec<File>> {
    listing(transport, path, options, PaginationConfig::default())
        .collect()
        .await
}

/// Collect every folder under `path`, failing on the first page error
pub async fn list_folders<O: QueryOption>(
    transport: Arc<dyn Transport>,
    path: impl Into<String>,
    options: &[O],
) -> Result<Vec<Folder>> {
    listing(transport, path, options, PaginationConfig::default())
        .collect()
        .await
}
