//! Sandboxed filesystem storage
//!
//! [`Sandbox`] confines client paths to one root directory; [`RootStore`]
//! builds the browse, search, upload, download, delete and mkdir operations
//! on top of it.

pub mod entry;
mod listing;
pub mod sandbox;
pub mod store;

use thiserror::Error;

pub use entry::{BrowseResult, Deleted, DirectoryEntry, DownloadedFile};
pub use sandbox::{parent_of, Sandbox};
pub use store::{RootStore, UploadPolicy};

#[derive(Error, Debug)]
pub enum FsError {
    #[error("{0}")]
    AccessDenied(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("File exceeds the maximum upload size of {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("File type '{0}' is not allowed")]
    DisallowedType(String),
    #[error("'{0}' already exists")]
    AlreadyExists(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
