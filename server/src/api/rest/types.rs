//! Shared types for REST API
//!
//! Query strings and response bodies for the filesystem endpoints. Entry and
//! listing bodies are the storage types themselves.

use serde::{Deserialize, Serialize};

// ============================================================================
// QUERIES
// ============================================================================

#[derive(Deserialize)]
pub struct BrowseQuery {
    #[serde(default)]
    pub path: String,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub query: String,
}

/// Query for endpoints where the path is mandatory.
#[derive(Deserialize)]
pub struct PathQuery {
    pub path: String,
}

#[derive(Deserialize)]
pub struct MkdirQuery {
    #[serde(default)]
    pub path: String,
    pub name: String,
}

// ============================================================================
// RESPONSES
// ============================================================================

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
