//! Error types for the Catalog API service.
//!
//! Every error leaves as `{"success": false, "message": ...}` with the
//! status the domain error maps to; validation failures attach a field
//! list. Internals are logged, never echoed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use reelgate_core::{CoreError, FieldError};
use reelgate_sessions::SessionError;

/// API error response envelope
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Forbidden")]
    Forbidden,

    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Core(e) => StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::Session(e) => StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Core(e) => e.error_code(),
            Self::Session(e) => e.error_code(),
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Forbidden => "FORBIDDEN",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = ?self, "internal API error");
        }

        let (message, errors) = match self {
            Self::Core(CoreError::Validation(errors)) | Self::Validation(errors) => {
                ("Validation failed".to_string(), Some(errors))
            }
            // 5xx bodies carry a generic message only
            Self::Internal(_) => ("Internal server error".to_string(), None),
            Self::Core(CoreError::Database(_)) => ("Internal server error".to_string(), None),
            Self::Session(SessionError::Store(_)) => ("Internal server error".to_string(), None),
            other => (other.to_string(), None),
        };

        let body = ErrorBody {
            success: false,
            code,
            message,
            errors,
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
