pub mod articles;
pub mod error;
mod extract;
pub mod health;
pub mod sync;

use axum::{
    Router,
    routing::{get, post},
};

pub use error::{ApiError, ErrorResponse};

use crate::AppState;

/// Sync, article and cleanup routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/sync-emails", get(sync::sync_emails))
        .route("/sync-articles", get(sync::sync_articles))
        .route("/articles", post(articles::create))
        .route("/articles/{id}", get(articles::get))
        .route("/cleanup-articles", post(articles::cleanup))
}

/// Liveness and health routes.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
}
