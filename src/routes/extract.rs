use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use axum_valid::{Valid, ValidationRejection};
use serde::de::DeserializeOwned;
use validator::Validate;

use super::error::ApiError;

/// A validated JSON body whose rejections render in the standard error envelope.
///
/// Content-type, syntax, type and validation failures are all reported as 400.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Valid::<Json<T>>::from_request(req, state).await {
            Ok(Valid(Json(value))) => Ok(Self(value)),
            Err(ValidationRejection::Valid(errors)) => Err(ApiError::BadRequest(format!(
                "Invalid request body: {errors}"
            ))),
            Err(ValidationRejection::Inner(rejection)) => Err(rejection.into()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
