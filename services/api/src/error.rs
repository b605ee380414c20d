//! Custom error types for the API service
//!
//! Every failure a handler can signal maps onto one variant here, and every
//! variant renders as the uniform error envelope:
//! `{ "status", "message", "errors", "data": null }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing/blank required field or malformed identifier
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),

    /// Missing or invalid credential
    #[error("{0}")]
    Unauthorized(String),

    /// Acting user is not the owner of the entity
    #[error("{0}")]
    Forbidden(String),

    /// Referenced entity absent
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Uniqueness conflict (e.g. username or email already registered)
    #[error("{0}")]
    Conflict(String),

    /// Unexpected absence of an expected read/write result
    #[error("Internal server error")]
    InternalServerError,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] common::error::DatabaseError),
}

impl ApiError {
    /// A validation failure carrying a single message
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(vec![message.into()])
    }

    /// The HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError | ApiError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (message, errors) = match self {
            ApiError::Validation(errors) => ("Validation failed".to_string(), errors),
            ApiError::Database(_) => ("Database error".to_string(), vec![]),
            other => (other.to_string(), vec![]),
        };

        let body = Json(json!({
            "status": status.as_u16(),
            "message": message,
            "errors": errors,
            "data": null,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_failure_taxonomy() {
        assert_eq!(
            ApiError::validation("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("Video").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::InternalServerError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_names_the_entity() {
        assert_eq!(ApiError::NotFound("Video").to_string(), "Video not found");
    }
}
