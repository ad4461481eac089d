//! HTTP surface of LeafLens
//!
//! - `GET /health`: liveness probe
//! - `POST /predict`: multipart upload with an `image` field, returns top-k

pub mod error;
pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorBody};
pub use state::{AppState, SharedState};

/// Build the application router
pub fn router(state: SharedState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/predict",
            post(routes::predict::predict).layer(upload_limit),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
