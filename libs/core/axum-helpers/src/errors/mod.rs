pub mod codes;
pub mod handlers;
pub mod responses;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Standard error response body.
///
/// - `code`: integer code for logging/monitoring (e.g. 1007)
/// - `error`: machine-readable category (e.g. "FORBIDDEN")
/// - `reason`: operation-specific code set by domain crates
///   (e.g. "api.products.remove.accessDenied")
/// - `message`: human-readable text
/// - `details`: optional structured data (e.g. the offending field)
///
/// ```json
/// {
///   "code": 1007,
///   "error": "FORBIDDEN",
///   "reason": "api.products.remove.accessDenied",
///   "message": "Cannot delete a private product that belongs to another user"
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: i32,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// A failure already classified by a domain crate.
///
/// The category decides the HTTP status; `reason` is passed through verbatim
/// so clients can branch on the exact rule that was violated.
#[derive(Debug, Error)]
#[error("{reason}: {message}")]
pub struct DomainError {
    pub code: ErrorCode,
    pub reason: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl DomainError {
    pub fn new(code: ErrorCode, reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Application error type that can be converted to HTTP responses.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON parsing error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too Many Requests: {0}")]
    TooManyRequests(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

struct Parts {
    status: StatusCode,
    code: ErrorCode,
    reason: Option<String>,
    message: String,
    details: Option<serde_json::Value>,
}

impl Parts {
    fn simple(code: ErrorCode, message: String) -> Self {
        Self {
            status: code.status(),
            code,
            reason: None,
            message,
            details: None,
        }
    }
}

impl AppError {
    fn into_parts(self) -> Parts {
        match self {
            AppError::SerdeJson(e) => {
                tracing::error!(
                    error_code = ErrorCode::SerdeJsonError.code(),
                    "JSON error: {:?}",
                    e
                );
                Parts::simple(
                    ErrorCode::SerdeJsonError,
                    ErrorCode::SerdeJsonError.default_message().to_string(),
                )
            }
            AppError::JsonExtractorRejection(e) => Parts {
                status: e.status(),
                ..Parts::simple(ErrorCode::JsonExtraction, e.body_text())
            },
            AppError::BadRequest(msg) => Parts::simple(ErrorCode::ValidationError, msg),
            AppError::Unauthorized(msg) => Parts::simple(ErrorCode::Unauthorized, msg),
            AppError::Forbidden(msg) => Parts::simple(ErrorCode::Forbidden, msg),
            AppError::NotFound(msg) => Parts::simple(ErrorCode::NotFound, msg),
            AppError::Conflict(msg) => Parts::simple(ErrorCode::Conflict, msg),
            AppError::TooManyRequests(msg) => Parts::simple(ErrorCode::TooManyRequests, msg),
            AppError::InternalServerError(msg) => Parts::simple(ErrorCode::InternalError, msg),
            AppError::ServiceUnavailable(msg) => Parts::simple(ErrorCode::ServiceUnavailable, msg),
            AppError::Domain(e) => Parts {
                status: e.code.status(),
                code: e.code,
                reason: Some(e.reason),
                message: e.message,
                details: e.details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let parts = self.into_parts();
        let error_code = parts.code.code();
        let reason = parts.reason.as_deref().unwrap_or("-");

        if parts.status.is_server_error() {
            tracing::error!(error_code, reason, status = %parts.status, "{}", parts.message);
        } else if parts.status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(error_code, reason, "{}", parts.message);
        } else {
            tracing::info!(error_code, reason, status = %parts.status, "{}", parts.message);
        }

        let body = Json(ErrorResponse {
            code: error_code,
            error: parts.code.as_str().to_string(),
            reason: parts.reason,
            message: parts.message,
            details: parts.details,
        });

        (parts.status, body).into_response()
    }
}

/// Builds an error response without going through [`AppError`].
pub fn error_response(status: StatusCode, message: String, error_code: ErrorCode) -> Response {
    let body = Json(ErrorResponse {
        code: error_code.code(),
        error: error_code.as_str().to_string(),
        reason: None,
        message,
        details: None,
    });

    (status, body).into_response()
}
