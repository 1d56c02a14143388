use std::fmt::Display;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shared::{ErrorDetails, ErrorKind, ErrorResponse, FieldViolation, ValidationErrors};
use thiserror::Error;

/// Every failure a handler can report. Each variant maps to exactly one
/// error kind and status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<FieldViolation>),

    #[error("{message}")]
    BadRequest {
        message: String,
        note: Option<String>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            note: None,
        }
    }

    pub fn bad_request_with_note(message: impl Into<String>, note: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            note: Some(note.into()),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Logs `cause` and keeps only `message` for the client.
    pub fn internal(message: impl Into<String>, cause: impl Display) -> Self {
        let message = message.into();
        tracing::error!(error = %cause, "{message}");
        Self::Internal(message)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::BadRequest { .. } => ErrorKind::BadRequest,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Internal(_) => ErrorKind::InternalError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_response_body(&self) -> ErrorResponse {
        let details = match self {
            Self::Validation(violations) => Some(ErrorDetails::Fields(violations.clone())),
            Self::BadRequest {
                note: Some(note), ..
            } => Some(ErrorDetails::Note { note: note.clone() }),
            _ => None,
        };
        ErrorResponse {
            kind: self.kind(),
            message: self.to_string(),
            details,
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors.into_violations())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response_body())).into_response()
    }
}
