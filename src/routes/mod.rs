//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One websocket endpoint carries the whole session protocol. The rest
//! is hosting plumbing: a health check and the static client bundle.

pub mod ws;

use std::path::PathBuf;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Resolve the directory holding the static client bundle.
fn public_dir() -> PathBuf {
    std::env::var("PUBLIC_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("public"))
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_files = ServeDir::new(public_dir()).append_index_html_on_directories(true);

    Router::new()
        .route("/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .fallback_service(static_files)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
