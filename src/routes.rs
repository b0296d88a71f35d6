use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::handlers::{debug_log, health_check, recognize};
use crate::state::AppState;

pub fn create_routes(state: &AppState) -> Router<AppState> {
    let max_upload_bytes = state.config.server.max_upload_bytes;

    Router::new()
        // Health check
        .route("/", get(health_check))
        .route("/api/test", get(health_check))

        // Recognition
        .route(
            "/api/recognize",
            post(recognize).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )

        // Client-side debugging
        .route("/api/debug_log", post(debug_log))
}
