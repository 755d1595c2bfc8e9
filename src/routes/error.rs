use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{db::DbError, services::SyncError, sources::SourceError};

/// Error body: `{"error": {"type": "...", "message": "...", "code": "..."}}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, code: &str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorInfo {
                error_type: error_type.to_string(),
                message: message.into(),
                code: code.to_string(),
            },
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    /// Malformed or incomplete request.
    BadRequest(String),
    /// A setting required by this route is missing.
    NotConfigured(String),
    NotFound(String),
    Conflict(String),
    /// Token exchange failed; carries the provider's raw response.
    Auth(String),
    /// Upstream API or transport failure, with upstream detail.
    Upstream(String),
    Database(DbError),
    Internal(String),
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            err @ DbError::Conflict { .. } => ApiError::Conflict(err.to_string()),
            err => ApiError::Database(err),
        }
    }
}

impl From<SourceError> for ApiError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotConfigured(missing) => {
                ApiError::NotConfigured(format!("Missing configuration: {missing}"))
            }
            SourceError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            err @ SourceError::Auth { .. } => ApiError::Auth(err.to_string()),
            err => ApiError::Upstream(err.to_string()),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Source(err) => err.into(),
            err @ SyncError::Write { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "bad_request",
                msg,
            ),
            ApiError::NotConfigured(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "not_configured",
                msg,
            ),
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "invalid_request_error",
                "not_found",
                msg,
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "invalid_request_error", "conflict", msg),
            ApiError::Auth(msg) => {
                tracing::error!(error = %msg, "Token exchange failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "api_error", "auth_error", msg)
            }
            ApiError::Upstream(msg) => {
                tracing::error!(error = %msg, "Upstream request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "api_error",
                    "upstream_error",
                    msg,
                )
            }
            ApiError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "api_error",
                    "database_error",
                    "An internal database error occurred".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "api_error",
                    "internal_error",
                    msg,
                )
            }
        };

        (status, Json(ErrorResponse::new(error_type, code, message))).into_response()
    }
}
