use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use super::error::ApiError;
use crate::{AppState, services::SyncReport, sources::FetchQuery};

/// Pull the configured mailbox into `emails`.
#[tracing::instrument(name = "sync.emails", skip(state))]
pub async fn sync_emails(State(state): State<AppState>) -> Result<Json<SyncReport>, ApiError> {
    let report = state.services.sync.sync_emails().await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct SyncArticlesParams {
    pub q: Option<String>,
    pub lang: Option<String>,
}

/// Search the news source and upsert the results into `articles`.
#[tracing::instrument(name = "sync.articles", skip(state))]
pub async fn sync_articles(
    State(state): State<AppState>,
    Query(params): Query<SyncArticlesParams>,
) -> Result<Json<SyncReport>, ApiError> {
    let q = params
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Query parameter 'q' is required".to_string()))?;

    let report = state
        .services
        .sync
        .sync_articles(&FetchQuery::search(q, params.lang))
        .await?;
    Ok(Json(report))
}
