//! Shopper identification.
//!
//! A shopper is signed in when the session holds an API token (placed there
//! by the account login flow) or the request carries an
//! `Authorization: Bearer` header. Everyone else shops anonymously.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use secrecy::SecretString;
use tower_sessions::Session;

use crate::models::session_keys;
use crate::services::Shopper;

/// Extractor resolving the [`Shopper`] for the current request.
///
/// Never rejects; missing or unreadable credentials mean anonymous.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentShopper(shopper): CurrentShopper) -> impl IntoResponse {
///     if shopper.is_authenticated() { "welcome back" } else { "hello" }
/// }
/// ```
pub struct CurrentShopper(pub Shopper);

impl<S> FromRequestParts<S> for CurrentShopper
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>()
            && let Ok(Some(token)) = session.get::<String>(session_keys::API_TOKEN).await
            && !token.is_empty()
        {
            return Ok(Self(Shopper::Authenticated(SecretString::from(token))));
        }

        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty());

        Ok(Self(bearer.map_or(Shopper::Anonymous, |token| {
            Shopper::Authenticated(SecretString::from(token.to_owned()))
        })))
    }
}

/// Store the shopper's API token in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn set_api_token(
    session: &Session,
    token: &str,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::API_TOKEN, token).await
}

/// Remove the shopper's API token from the session.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn clear_api_token(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove_value(session_keys::API_TOKEN).await.map(|_| ())
}
