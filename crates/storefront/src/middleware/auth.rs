//! Authentication extractors.
//!
//! The bearer token from a successful OTP sign-in is kept in the session
//! under `session_keys::AUTH`. These extractors read it back.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::AuthSession;
use crate::services::current_auth;

/// Extractor that requires a signed-in customer.
///
/// Guests get a JSON 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(RequireAuth(auth): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", auth.user.name)
/// }
/// ```
pub struct RequireAuth(pub AuthSession);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        current_auth(session)
            .await?
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Sign in to continue".to_string()))
    }
}
