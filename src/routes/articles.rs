use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Serialize;

use super::{error::ApiError, extract::ValidJson};
use crate::{
    AppState,
    models::{Article, CreateArticle},
    retention::{Collection, SweepResult},
};

#[derive(Debug, Serialize)]
pub struct CreatedArticle {
    pub id: String,
}

/// Store a manually posted article.
#[tracing::instrument(name = "articles.create", skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<CreateArticle>,
) -> Result<(StatusCode, Json<CreatedArticle>), ApiError> {
    let input = input
        .into_new()
        .ok_or_else(|| ApiError::BadRequest("'title' and 'content' are required".to_string()))?;
    let article = state.services.articles.create(input).await?;
    Ok((StatusCode::CREATED, Json(CreatedArticle { id: article.id })))
}

/// Get an article by ID
#[tracing::instrument(name = "articles.get", skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Article>, ApiError> {
    let article = state
        .services
        .articles
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Article '{id}' not found")))?;
    Ok(Json(article))
}

/// Delete articles older than the articles retention window.
#[tracing::instrument(name = "articles.cleanup", skip(state))]
pub async fn cleanup(State(state): State<AppState>) -> Result<Json<SweepResult>, ApiError> {
    let result = state
        .retention
        .sweep_expired(Collection::Articles, Utc::now())
        .await?
        .ok_or_else(|| {
            ApiError::NotConfigured(
                "Article retention is disabled (retention.periods.articles_days = 0)".to_string(),
            )
        })?;
    Ok(Json(result))
}
