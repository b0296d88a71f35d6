pub mod config;
pub mod diagnostics;
pub mod error;
pub mod handlers;
pub mod recognition;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::Config;
pub use state::AppState;

/// Assemble the full application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes(&state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
