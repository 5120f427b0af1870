pub mod frames;
pub mod health;
pub mod logs;
pub mod tracking;

use std::path::Path;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use crate::middleware::request_id;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let static_dir = Path::new(&state.config().static_dir).to_path_buf();
    let max_body = state.config().max_frame_bytes;

    let index = ServeFile::new(static_dir.join("index.html"));
    let assets = ServeDir::new(&static_dir);

    Router::new()
        .merge(frames::router())
        .merge(tracking::router())
        .merge(logs::router())
        .nest("/health", health::router())
        .layer(DefaultBodyLimit::max(max_body))
        .route_service("/", index)
        .fallback_service(assets)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .with_state(state)
}
