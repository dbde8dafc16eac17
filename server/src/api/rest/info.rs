//! Server info route

use crate::api::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

pub fn info_routes() -> Router<AppState> {
    Router::new().route("/api/server/info", get(get_server_info))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerInfo {
    name: String,
    version: String,
    max_upload_bytes: u64,
    allowed_extensions: Vec<String>,
}

async fn get_server_info(State(state): State<AppState>) -> Json<ServerInfo> {
    let policy = state.store.policy();
    Json(ServerInfo {
        name: state.config.server_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        max_upload_bytes: policy.max_bytes,
        allowed_extensions: policy.allowed_extensions.clone(),
    })
}
