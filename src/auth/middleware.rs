use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;

use crate::auth::models::Identity;
use crate::auth::session::SESSION_COOKIE;
use crate::state::AppState;

/// The caller's identity, if the request carries a valid session.
///
/// The token is read from the `lms_session` cookie, or from an
/// `Authorization: Bearer` header for non-browser clients. Invalid or expired
/// tokens resolve to an anonymous caller; public operations never fail on them.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<Identity>);

impl CurrentUser {
    pub fn identity(&self) -> Option<&Identity> {
        self.0.as_ref()
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(parts) else {
            return Ok(CurrentUser(None));
        };

        let identity = match state.sessions.verify(&token) {
            Ok(claims) => Some(state.gate.identify(&claims.sub)),
            Err(e) => {
                tracing::debug!("Ignoring session token: {e}");
                None
            }
        };

        Ok(CurrentUser(identity))
    }
}

fn session_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    bearer.or_else(|| {
        CookieJar::from_headers(&parts.headers)
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
    })
}
