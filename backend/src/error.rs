//! Request-level error taxonomy and its HTTP mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{models::ErrorBody, repository::RepoError, storage::StorageError};

/// ApiError
///
/// Every handler, the `AuthUser` extractor and the credential operations fail with one
/// of these. Client-caused failures carry the message shown to the caller; `Internal`
/// carries server-side detail that is logged but never sent.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or wrong-typed required field (400).
    #[error("{0}")]
    Validation(String),

    /// Missing user/photo/comment (404).
    #[error("{0}")]
    NotFound(String),

    /// Registration with a username that is already taken (400).
    #[error("Username already exists")]
    DuplicateUsername,

    /// Missing, unknown or expired token, or a wrong password (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not entitled (403).
    #[error("Forbidden: Unauthorized access")]
    Forbidden,

    /// Unexpected storage/runtime failure (500).
    #[error("internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn not_found(resource: &str) -> Self {
        ApiError::NotFound(format!("{resource} not found"))
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::DuplicateUsername => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(detail) => {
                tracing::error!("internal error: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::DuplicateUsername => ApiError::DuplicateUsername,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Missing(path) => {
                tracing::warn!("blob missing on disk: {}", path);
                ApiError::not_found("Image file")
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}
