//! File system routes
//!
//! Browse, search, upload, download, delete and mkdir over the sandboxed root.

use crate::api::AppState;
use crate::storage::{BrowseResult, DirectoryEntry, FsError};
use axum::{
    extract::{Multipart, Query, State},
    http::header,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use std::io::Cursor;

use super::error::{blocking, AppError};
use super::types::{BrowseQuery, MessageResponse, MkdirQuery, PathQuery, SearchQuery};

// ============================================================================
// ROUTES
// ============================================================================

pub fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/browse", get(browse))
        .route("/search", get(search))
        .route("/upload", post(upload))
        .route("/download", get(download))
        .route("/delete", delete(delete_item))
        .route("/mkdir", post(make_directory))
}

// ============================================================================
// HANDLERS
// ============================================================================

async fn browse(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<BrowseResult>, AppError> {
    let store = state.store.clone();
    let result = blocking(move || store.list(&query.path)).await?;
    Ok(Json(result))
}

async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<DirectoryEntry>>, AppError> {
    let store = state.store.clone();
    let results = blocking(move || store.search(&query.query)).await?;
    Ok(Json(results))
}

/// Multipart form with an optional `path` field and a `file` field.
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MessageResponse>, AppError> {
    let max = state.store.policy().max_bytes;
    let mut path = String::new();
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("path") => {
                path = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid path field: {}", e)))?;
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let mut data = Vec::new();
                // Stop reading as soon as the limit is crossed
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Upload interrupted: {}", e)))?
                {
                    if (data.len() + chunk.len()) as u64 > max {
                        return Err(FsError::TooLarge { limit: max }.into());
                    }
                    data.extend_from_slice(&chunk);
                }
                file = Some((file_name, data));
            }
            _ => {}
        }
    }

    let (file_name, data) =
        file.ok_or_else(|| AppError::BadRequest("No file selected.".into()))?;

    let store = state.store.clone();
    blocking(move || store.upload(&path, &file_name, Cursor::new(data))).await?;

    Ok(Json(MessageResponse::new("Upload successful")))
}

async fn download(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.clone();
    let file = blocking(move || store.download(&query.path)).await?;

    Ok((
        [
            (header::CONTENT_TYPE, file.mime_type.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&file.file_name)),
        ],
        file.content,
    ))
}

async fn delete_item(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    let store = state.store.clone();
    let deleted = blocking(move || store.delete(&query.path)).await?;
    Ok(Json(MessageResponse::new(deleted.message())))
}

async fn make_directory(
    State(state): State<AppState>,
    Query(query): Query<MkdirQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    if query.name.trim().is_empty() {
        return Err(AppError::BadRequest("Folder name cannot be empty".into()));
    }

    let store = state.store.clone();
    blocking(move || store.mkdir(&query.path, &query.name)).await?;
    Ok(Json(MessageResponse::new("Folder created")))
}

// ============================================================================
// HELPERS
// ============================================================================

/// `attachment` disposition with an ASCII fallback name plus the exact name
/// in RFC 5987 form.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        percent_encode(file_name)
    )
}

fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for b in input.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}
