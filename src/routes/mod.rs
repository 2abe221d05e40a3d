// HTTP routes: the published snapshot, history and service metadata

mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::publisher::SnapshotPublisher;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) publisher: Arc<SnapshotPublisher>,
}

pub fn app(publisher: Arc<SnapshotPublisher>) -> Router {
    let state = AppState { publisher };
    Router::new()
        .route("/", get(http::index_handler)) // GET /
        .route("/index.html", get(http::index_handler)) // GET /index.html
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/system", get(http::api_system_handler)) // GET /api/system
        .route("/api/history", get(http::api_history_handler)) // GET /api/history
        .route("/api/health", get(http::api_health_handler)) // GET /api/health
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
