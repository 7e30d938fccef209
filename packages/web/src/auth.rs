//! Session and permission plumbing
//!
//! The session stores only the user id; every request resolves it back to a
//! full [`Authenticated`] (user + groups) through the store. Handlers that
//! need a login take [`CurrentUser`]; pages that merely adapt to login state
//! take [`MaybeUser`]. Permission checks wrap the core `can_any`/`can_all`
//! logic into coded `E-201` failures.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use onebase_core::services::{Authenticated, ServiceError};

use crate::http_error::HttpError;
use crate::render::urlencode;
use crate::state::AppState;

/// Session key holding the logged-in user id.
pub const SESSION_USER_KEY: &str = "user_id";

/// Whether a redirect target is safe: relative to this host only.
pub fn is_safe_url(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}

/// Extractor for handlers that require a logged-in user.
///
/// Rejects with a redirect to the login page carrying the original URL as
/// `next`.
pub struct CurrentUser(pub Authenticated);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|err| err.into_response())?;

        let user_id: Option<String> = session
            .get(SESSION_USER_KEY)
            .await
            .map_err(|err| {
                HttpError::with_details("Session unavailable", "E-500", err.to_string())
                    .into_response()
            })?;

        if let Some(id) = user_id {
            match state.auth.load(&id).await {
                Ok(Some(auth)) => return Ok(CurrentUser(auth)),
                Ok(None) => {}
                Err(err) => return Err(HttpError::from(err).into_response()),
            }
        }

        let next = urlencode(&parts.uri.to_string());
        Err(Redirect::to(&format!("/auth/login?next={next}")).into_response())
    }
}

/// Extractor for pages that render with or without a login.
pub struct MaybeUser(pub Option<Authenticated>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(session) = Session::from_request_parts(parts, state).await else {
            return Ok(MaybeUser(None));
        };
        let Ok(Some(id)) = session.get::<String>(SESSION_USER_KEY).await else {
            return Ok(MaybeUser(None));
        };
        match state.auth.load(&id).await {
            Ok(found) => Ok(MaybeUser(found)),
            Err(_) => Ok(MaybeUser(None)),
        }
    }
}

/// Require every listed permission (E-201 on failure).
pub fn require_all(user: &Authenticated, required: &[&str]) -> Result<(), HttpError> {
    if user.can_all(required) {
        Ok(())
    } else {
        Err(ServiceError::permission_denied(required).into())
    }
}

/// Require at least one listed permission (E-201 on failure).
pub fn require_any(user: &Authenticated, required: &[&str]) -> Result<(), HttpError> {
    if user.can_any(required) {
        Ok(())
    } else {
        Err(ServiceError::permission_denied(required).into())
    }
}

/// Development middleware: when `auth.persist_user` is configured, requests
/// without a session user are silently logged in as that email.
pub async fn persist_user(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    if let Some(email) = &state.persist_user {
        let existing: Option<String> = session.get(SESSION_USER_KEY).await.unwrap_or(None);
        if existing.is_none() {
            if let Ok(Some(auth)) = state.auth.load_by_email(email).await {
                if session
                    .insert(SESSION_USER_KEY, auth.user.id.clone())
                    .await
                    .is_ok()
                {
                    tracing::debug!(user = %auth.user.id, "persistent user logged in");
                }
            }
        }
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_urls_are_relative() {
        assert!(is_safe_url("/node/browse"));
        assert!(is_safe_url("/node/search?path=people"));
        assert!(!is_safe_url("https://evil.example.com/"));
        assert!(!is_safe_url("//evil.example.com/"));
        assert!(!is_safe_url("/\\evil"));
        assert!(!is_safe_url(""));
    }
}
