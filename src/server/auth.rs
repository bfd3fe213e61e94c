//! Caller identity.
//!
//! The daemon runs behind the web app, which authenticates the browser
//! session and forwards the user id in [`USER_HEADER`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::error::ApiError;
use crate::AssistarrError;
pub use crate::types::USER_HEADER;

/// The authenticated user. Rejects with 401 when the header is missing or blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub String);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|user| !user.is_empty())
            .map(|user| AuthUser(user.to_string()))
            .ok_or(ApiError(AssistarrError::Unauthenticated))
    }
}
