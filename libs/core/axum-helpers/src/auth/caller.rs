use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::jwt::JwtClaims;

/// The user behind a request, if any.
///
/// Reads the claims left by [`super::optional_jwt_auth_middleware`]; without
/// that layer every request is anonymous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller(pub Option<String>);

impl Caller {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self(Some(id.into()))
    }

    pub fn user_id(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller(
            parts.extensions.get::<JwtClaims>().map(|claims| claims.sub.clone()),
        ))
    }
}
