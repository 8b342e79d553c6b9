use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, DomainError, ErrorCode};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// The product commands, named as they appear in error reasons
/// (`api.products.<command>.<reason>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum Command {
    Insert,
    MakePrivate,
    MakePublic,
    UpdateName,
    Remove,
}

pub const VALIDATION_REASON: &str = "validation-error";

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("{field} is invalid: expected {expected}")]
    Validation { field: String, expected: String },

    #[error("{}", not_logged_in_message(.command))]
    NotAuthenticated { command: Command },

    #[error("{}", access_denied_message(.command))]
    AccessDenied { command: Command },

    #[error("{}", last_public_message(.command))]
    LastPublicProduct { command: Command },

    #[error("Product {id} not found")]
    NotFound { command: Command, id: String },

    #[error("Product {id} kept changing while {command} was applied, try again")]
    Conflict { command: Command, id: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn not_logged_in_message(command: &Command) -> &'static str {
    match command {
        Command::MakePrivate => "Must be logged in to make private products.",
        _ => "Must be logged in.",
    }
}

fn access_denied_message(command: &Command) -> &'static str {
    match command {
        Command::Remove => "You don't have permission to remove this product.",
        _ => "You don't have permission to edit this product.",
    }
}

fn last_public_message(command: &Command) -> &'static str {
    match command {
        Command::Remove => "Cannot delete the last public product.",
        _ => "Cannot make the last public product private.",
    }
}

impl ProductError {
    pub fn validation(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            expected: expected.into(),
        }
    }

    /// Machine-readable reason, e.g. `api.products.remove.accessDenied`
    pub fn reason(&self) -> Option<String> {
        let (command, kind) = match self {
            Self::Validation { .. } => return Some(VALIDATION_REASON.to_string()),
            Self::NotAuthenticated { command } => (command, "notLoggedIn"),
            Self::AccessDenied { command } => (command, "accessDenied"),
            Self::LastPublicProduct { command } => (command, "lastPublicProduct"),
            Self::NotFound { command, .. } => (command, "notFound"),
            Self::Conflict { command, .. } => (command, "conflict"),
            Self::Database(_) | Self::Internal(_) => return None,
        };
        Some(format!("api.products.{command}.{kind}"))
    }

    /// Text safe to show a client; store and internal failures stay generic
    pub fn client_message(&self) -> String {
        match self {
            Self::Database(_) => ErrorCode::DatabaseError.default_message().to_string(),
            Self::Internal(_) => ErrorCode::InternalError.default_message().to_string(),
            other => other.to_string(),
        }
    }
}

pub type ProductResult<T> = Result<T, ProductError>;

/// Convert ProductError to AppError for standardized error responses
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        let reason = err.reason();
        let message = err.to_string();

        let (code, details) = match &err {
            ProductError::Validation { field, expected } => (
                ErrorCode::ValidationError,
                Some(serde_json::json!({ "field": field, "expected": expected })),
            ),
            ProductError::NotAuthenticated { .. } => (ErrorCode::Unauthorized, None),
            ProductError::AccessDenied { .. } => (ErrorCode::Forbidden, None),
            ProductError::LastPublicProduct { .. } => (ErrorCode::Conflict, None),
            ProductError::NotFound { id, .. } => (
                ErrorCode::NotFound,
                Some(serde_json::json!({ "productId": id })),
            ),
            ProductError::Conflict { id, .. } => (
                ErrorCode::Conflict,
                Some(serde_json::json!({ "productId": id })),
            ),
            ProductError::Database(msg) => {
                tracing::error!(error = %msg, "Product store failure");
                return AppError::InternalServerError(
                    ErrorCode::DatabaseError.default_message().to_string(),
                );
            }
            ProductError::Internal(msg) => return AppError::InternalServerError(msg.clone()),
        };

        let mut domain = DomainError::new(code, reason.unwrap_or_default(), message);
        if let Some(details) = details {
            domain = domain.with_details(details);
        }
        AppError::Domain(domain)
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for ProductError {
    fn from(err: mongodb::error::Error) -> Self {
        ProductError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_reason_codes() {
        let err = ProductError::AccessDenied {
            command: Command::Remove,
        };
        assert_eq!(err.reason().as_deref(), Some("api.products.remove.accessDenied"));

        let err = ProductError::NotAuthenticated {
            command: Command::MakePrivate,
        };
        assert_eq!(err.reason().as_deref(), Some("api.products.makePrivate.notLoggedIn"));

        let err = ProductError::validation("productId", "String");
        assert_eq!(err.reason().as_deref(), Some("validation-error"));

        assert!(ProductError::Database("boom".into()).reason().is_none());
    }

    #[test]
    fn test_client_message_hides_store_details() {
        let err = ProductError::Database("connection refused at 10.1.2.3:27017".into());
        assert_eq!(err.client_message(), "Database error occurred");

        let err = ProductError::AccessDenied {
            command: Command::Remove,
        };
        assert_eq!(err.client_message(), err.to_string());
    }

    #[test]
    fn test_messages_depend_on_command() {
        let remove = ProductError::LastPublicProduct {
            command: Command::Remove,
        };
        assert_eq!(remove.to_string(), "Cannot delete the last public product.");

        let make_private = ProductError::LastPublicProduct {
            command: Command::MakePrivate,
        };
        assert_eq!(
            make_private.to_string(),
            "Cannot make the last public product private."
        );

        let make_public = ProductError::NotAuthenticated {
            command: Command::MakePublic,
        };
        assert_eq!(make_public.to_string(), "Must be logged in.");
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ProductError::validation("newName", "String"), StatusCode::BAD_REQUEST),
            (
                ProductError::NotAuthenticated {
                    command: Command::MakePublic,
                },
                StatusCode::UNAUTHORIZED,
            ),
            (
                ProductError::AccessDenied {
                    command: Command::UpdateName,
                },
                StatusCode::FORBIDDEN,
            ),
            (
                ProductError::LastPublicProduct {
                    command: Command::Remove,
                },
                StatusCode::CONFLICT,
            ),
            (
                ProductError::NotFound {
                    command: Command::Remove,
                    id: "p1".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (ProductError::Database("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_command_names() {
        assert_eq!(Command::UpdateName.to_string(), "updateName");
        assert_eq!("makePublic".parse::<Command>().unwrap(), Command::MakePublic);
    }
}
