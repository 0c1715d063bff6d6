//! Error classification and the JSON error body shared by all handlers.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rusqlite::ErrorCode;
use serde::Serialize;
use thiserror::Error;

use crate::coach::{CoachError, OracleError, ValidationError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),

    #[error("{}", .0.body_text())]
    InvalidPath(#[from] PathRejection),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<CoachError> for ApiError {
    fn from(err: CoachError) -> Self {
        match err {
            CoachError::Validation(e) => Self::Validation(e),
            CoachError::Oracle(e) => Self::Oracle(e),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error_code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// A rendered error, optionally carrying the full error chain.
#[derive(Debug)]
pub struct ErrorResponse {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) | Self::InvalidBody(_) | Self::InvalidPath(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Oracle(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::BadRequest(_) | Self::InvalidBody(_) | Self::InvalidPath(_) => {
                "VALIDATION_ERROR"
            }
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Oracle(e) => e.code(),
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Logs the error at a level matching its class and renders it.
    /// `details` is only ever attached to server-side failures.
    pub fn into_error_response(self, expose_details: bool) -> ErrorResponse {
        let status = self.status();
        match &self {
            Self::Validation(_)
            | Self::BadRequest(_)
            | Self::InvalidBody(_)
            | Self::InvalidPath(_)
            | Self::NotFound(_)
            | Self::Conflict(_) => {
                tracing::debug!(error = %self, "rejected request");
            }
            Self::Oracle(OracleError::MissingCredential) => {
                tracing::error!("race plan requested but OPENAI_API_KEY is not configured");
            }
            Self::Oracle(e) => tracing::error!(error = %e, code = e.code(), "oracle call failed"),
            Self::Internal(e) => tracing::error!(error = ?e, "internal error"),
        }

        let details = (expose_details && status.is_server_error()).then(|| match &self {
            Self::Internal(e) => format!("{e:?}"),
            other => format!("{other:?}"),
        });

        ErrorResponse {
            status,
            body: ErrorBody {
                error_code: self.code(),
                message: self.to_string(),
                details,
            },
        }
    }
}

/// True when a write was refused by a UNIQUE, FOREIGN KEY or CHECK constraint.
pub fn is_constraint_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation
    )
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Used for extractor rejections, which are always client errors and so
/// never carry details.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_error_response(false).into_response()
    }
}
