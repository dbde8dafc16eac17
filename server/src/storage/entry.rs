//! Entry projections returned by listing and search

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::Metadata;
use std::path::Path;
use std::time::SystemTime;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// One file or folder as seen by a client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    pub is_folder: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Immediate children only; deeper levels are not counted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub last_modified: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

impl DirectoryEntry {
    pub fn folder(name: String, path: String, count: usize, metadata: &Metadata) -> Self {
        Self {
            name,
            path,
            is_folder: true,
            size: None,
            count: Some(count),
            last_modified: modified_at(metadata),
            extension: None,
        }
    }

    pub fn file(name: String, path: String, metadata: &Metadata) -> Self {
        let extension = extension_of(&name);
        Self {
            name,
            path,
            is_folder: false,
            size: Some(metadata.len()),
            count: None,
            last_modified: modified_at(metadata),
            extension: Some(extension),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseResult {
    pub current_path: String,
    pub items: Vec<DirectoryEntry>,
    pub parent: Option<String>,
}

#[derive(Debug)]
pub struct DownloadedFile {
    pub content: Vec<u8>,
    pub mime_type: &'static str,
    pub file_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deleted {
    File,
    Folder,
}

impl Deleted {
    pub fn message(self) -> &'static str {
        match self {
            Deleted::File => "File deleted",
            Deleted::Folder => "Folder deleted",
        }
    }
}

/// Lower-cased extension with its leading dot, or `""` if there is none.
pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

fn modified_at(metadata: &Metadata) -> DateTime<Utc> {
    DateTime::<Utc>::from(metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH))
}
