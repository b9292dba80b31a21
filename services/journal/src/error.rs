//! Custom error types for the HTTP layer

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts,
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::services::ServiceError;

/// Error returned by every handler
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing, invalid or expired credentials
    #[error("Unauthorized")]
    Unauthorized,

    /// Client error with message (validation, not found, duplicates)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Upload rejected because it is not an image
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Storage or other server-side failure
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unauthorized => ApiError::Unauthorized,
            ServiceError::UnsupportedMediaType(msg) => ApiError::UnsupportedMediaType(msg),
            ServiceError::Storage(msg) | ServiceError::Internal(msg) => {
                ApiError::InternalServerError(msg)
            }
            err @ (ServiceError::Validation(_)
            | ServiceError::NotFound(_)
            | ServiceError::DuplicateUser
            | ServiceError::InvalidCredentials) => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(format!("Invalid multipart body: {}", err))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// JSON body extractor whose rejections use the API error shape
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Query string extractor whose rejections use the API error shape
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::UnsupportedMediaType(msg) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg),
            ApiError::InternalServerError(detail) => {
                error!("Request failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Internal server error: {}", detail),
                )
            }
        };

        let body = Json(json!({
            "error": true,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ServiceError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_service_errors_map_to_statuses() {
        assert_eq!(
            status_of(ServiceError::Validation("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ServiceError::NotFound("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(ServiceError::DuplicateUser), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(ServiceError::InvalidCredentials),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(ServiceError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(ServiceError::UnsupportedMediaType("x".into())),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            status_of(ServiceError::Storage("disk full".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ServiceError::Internal("signing failed".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_bad_request_keeps_service_message() {
        let err = ApiError::from(ServiceError::DuplicateUser);
        assert!(matches!(err, ApiError::BadRequest(ref msg) if msg == "User already exists"));
    }
}
