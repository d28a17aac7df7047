/// Domain error taxonomy and the single HTTP translation layer.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input (400).
    #[error("{0}")]
    Validation(String),

    /// Duplicate value for a unique field (400).
    #[error("{0}")]
    Conflict(String),

    /// Bad credentials or a bad/expired/mismatched token (401).
    #[error("{0}")]
    Authentication(String),

    /// Authenticated identity lacks the required role (403).
    #[error("{0}")]
    Authorization(String),

    /// Referenced entity absent (404).
    #[error("{0}")]
    NotFound(String),

    /// Missing environment-level dependency, e.g. an unseeded default role (500).
    #[error("{0}")]
    Configuration(String),

    /// Underlying persistence failure (500).
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict(msg.into())
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        ApiError::Authentication(msg.into())
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        ApiError::Authorization(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        ApiError::Configuration(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Configuration(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            // Store failures carry backend detail that does not belong on the wire.
            ApiError::Store(err) => {
                tracing::error!(error = %err, "credential store failure");
                "Internal server error".to_string()
            }
            ApiError::Configuration(msg) => {
                tracing::error!(message = %msg, "configuration error");
                msg.clone()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}
