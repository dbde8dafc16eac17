//! Error handling for REST API
//!
//! Provides the `AppError` type used across all REST endpoints and the mapping
//! from storage failures to HTTP status codes.

use crate::storage::FsError;
use axum::{http::StatusCode, response::IntoResponse, Json};

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Forbidden(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                // SECURITY: Log full details server-side, return generic message to client
                tracing::error!(details = %msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred".to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

impl From<FsError> for AppError {
    fn from(err: FsError) -> Self {
        match err {
            FsError::AccessDenied(msg) => AppError::Forbidden(msg),
            FsError::NotFound(msg) => AppError::NotFound(msg),
            FsError::Io(e) => AppError::Internal(format!("Filesystem error: {}", e)),
            rejected @ (FsError::InvalidInput(_)
            | FsError::TooLarge { .. }
            | FsError::DisallowedType(_)
            | FsError::AlreadyExists(_)) => AppError::BadRequest(rejected.to_string()),
        }
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Run a blocking storage call on the blocking thread pool.
pub async fn blocking<T, F>(op: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, FsError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))?
        .map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: FsError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_of(FsError::AccessDenied("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_of(FsError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(FsError::InvalidInput("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(FsError::TooLarge { limit: 1 }), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(FsError::DisallowedType(".exe".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(FsError::AlreadyExists("docs".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(FsError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = AppError::Internal("secret path /srv/x".into()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "An internal error occurred");
    }
}
