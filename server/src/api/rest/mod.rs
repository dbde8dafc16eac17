//! REST API module
//!
//! Thin HTTP boundary over [`RootStore`](crate::storage::RootStore): decodes
//! requests, runs the blocking filesystem call off the async runtime, and maps
//! failures to status codes.

mod error;
mod files;
mod info;
mod types;

use crate::api::AppState;
use crate::config::Config;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub use files::file_routes;
pub use info::info_routes;

/// Room for multipart boundaries and the `path` field on top of the file.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("REST listening on {}", addr);

    // Graceful shutdown: wait for SIGTERM or SIGINT
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Full application router with middleware, ready to serve.
pub fn router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(
        usize::try_from(state.config.max_upload_bytes().saturating_add(MULTIPART_OVERHEAD))
            .unwrap_or(usize::MAX),
    );

    let x_request_id = header::HeaderName::from_static("x-request-id");

    // Request ID: generate UUID, trace with it, propagate to response
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(PropagateRequestIdLayer::new(x_request_id));

    // The browser client uses the mixed-case prefix
    let mut app: Router<AppState> = Router::new()
        .nest("/api/FileSystem", file_routes())
        .nest("/api/filesystem", file_routes())
        .merge(info_routes());

    if let Some(dir) = &state.config.static_dir {
        tracing::info!("serving static assets from {}", dir.display());
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(cors_layer(&state.config))
        .layer(body_limit)
        .layer(middleware)
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    tracing::debug!("CORS allowed origins: {:?}", origins);

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([
            header::HeaderName::from_static("x-request-id"),
            header::CONTENT_DISPOSITION,
        ])
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
