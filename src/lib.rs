//! Sync service that pulls mailbox messages and news articles into a
//! document store, with age-based retention.
//!
//! The binary in `main.rs` wires [`AppState`] and [`build_app`] into an HTTP
//! server; everything here is usable from tests without binding a socket.

pub mod config;
pub mod db;
pub mod models;
pub mod observability;
pub mod retention;
pub mod routes;
pub mod services;
pub mod sources;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::Router;
use tokio_util::task::TaskTracker;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    config::SyncConfig,
    db::{DbError, DbPool},
    retention::RetentionSweeper,
    services::Services,
    sources::{GraphMailSource, NewsApiSource, TokenCache},
};

/// Errors raised while assembling [`AppState`].
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to initialize database: {0}")]
    Database(#[from] DbError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SyncConfig>,
    pub db: Arc<DbPool>,
    pub services: Services,
    pub retention: RetentionSweeper,
    /// Background tasks (the retention worker) awaited on shutdown.
    pub task_tracker: TaskTracker,
}

impl AppState {
    /// Connect to the database, apply migrations if configured, and wire the
    /// sources and services.
    pub async fn new(config: SyncConfig) -> Result<Self, StartupError> {
        let db = DbPool::connect(&config.database).await?;
        Self::with_db(config, Arc::new(db))
    }

    /// Wire state around an existing pool.
    pub fn with_db(config: SyncConfig, db: Arc<DbPool>) -> Result<Self, StartupError> {
        // One client for every outbound call; reqwest pools connections per host.
        let http_client = config.server.http_client.build_client()?;

        tracing::debug!(
            timeout_secs = config.server.http_client.timeout_secs,
            connect_timeout_secs = config.server.http_client.connect_timeout_secs,
            "HTTP client configured"
        );

        let tokens = Arc::new(TokenCache::from_config(http_client.clone(), &config.mail));
        let mail = Arc::new(GraphMailSource::new(
            http_client.clone(),
            config.mail.clone(),
            tokens,
        ));
        let news = Arc::new(NewsApiSource::new(http_client, config.news.clone()));

        if let Err(missing) = config.mail.credentials() {
            tracing::warn!(missing = ?missing, "Mail sync is not configured");
        }
        if config.news.api_key().is_none() {
            tracing::warn!("News sync is not configured (news.api_key)");
        }

        Ok(Self {
            services: Services::new(db.clone(), mail, news),
            retention: RetentionSweeper::new(db.clone(), config.retention.periods.clone()),
            config: Arc::new(config),
            db,
            task_tracker: TaskTracker::new(),
        })
    }
}

/// Build the application router.
pub fn build_app(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;

    Router::new()
        .merge(routes::health_routes())
        .merge(routes::api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
        .with_state(state)
}
