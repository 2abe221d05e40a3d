// GET handlers: banner, version, system snapshot, history, health

use axum::{extract::State, http::header, response::IntoResponse};
use bytes::Bytes;

use super::AppState;
use crate::version::{NAME, VERSION};
use crate::worker::unix_now;

pub(crate) const SERVICE_NAME: &str = "system-monitor";

const BANNER: &str = "System monitor\n\
\n\
GET /api/system   latest snapshot (CPU, memory, GPU, top processes)\n\
GET /api/history  rolling history of CPU, memory and GPU usage\n\
GET /api/health   service health\n\
GET /version      service name and version\n";

fn json_body(body: Bytes) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], body)
}

/// GET / and /index.html: plain-text list of endpoints.
pub(super) async fn index_handler() -> impl IntoResponse {
    BANNER
}

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/system: the latest published document, or the not-ready placeholder.
pub(super) async fn api_system_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.publisher.read();
    tracing::debug!(path = "/api/system", cycle = snapshot.cycle, "serving snapshot");
    json_body(snapshot.document.clone())
}

/// GET /api/history: history document published with the latest snapshot.
pub(super) async fn api_history_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.publisher.read();
    tracing::debug!(path = "/api/history", cycle = snapshot.cycle, "serving history");
    json_body(snapshot.history.clone())
}

/// GET /api/health: always ok while the server runs; `data_available` once a cycle completed.
pub(super) async fn api_health_handler(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "timestamp": unix_now(),
        "server_running": true,
        "data_available": state.publisher.read().is_ready(),
    }))
}
