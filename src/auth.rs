pub mod gate;
pub mod middleware;
pub mod models;
pub mod oidc;
pub mod session;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::auth::gate::{AccessGate, SIGN_IN_DENIED};
use crate::auth::middleware::CurrentUser;
use crate::auth::models::Identity;
use crate::auth::oidc::IdentityProvider;
use crate::auth::session::{SessionKeys, OIDC_STATE_COOKIE, PENDING_LOGIN_TTL_SECS, SESSION_COOKIE};
use crate::error::AppError;
use crate::notify::{notify_sign_in_quietly, Notifier};
use crate::state::AppState;

/// Where a denied sign-in lands.
pub const DENIED_REDIRECT: &str = "/auth/error?error=AccessDenied";

/// Seconds the error page waits before sending the visitor home.
pub const DENIED_COUNTDOWN_SECS: u64 = 3;

#[derive(Debug, Deserialize)]
pub struct AuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by the provider when the user cancelled or the request was rejected.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthErrorResponse {
    pub error: String,
    pub redirect_to: String,
    pub redirect_after_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyRequest {
    /// Recipient override; defaults to the calling admin.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyResponse {
    pub success: bool,
    pub message_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Result of a completed provider round trip.
#[derive(Debug)]
pub enum CallbackOutcome {
    SignedIn { identity: Identity, session_token: String },
    Denied,
}

fn cookie(name: &'static str, value: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

fn provider(state: &AppState) -> Result<&dyn IdentityProvider, AppError> {
    state
        .identity_provider
        .as_deref()
        .ok_or_else(|| AppError::NotFound("Sign-in is not configured".into()))
}

/// Verify the round trip, exchange the code and decide admission.
///
/// `pending_token` is the signed `lms_oidc` cookie set by the login redirect.
pub async fn process_callback(
    provider: &dyn IdentityProvider,
    gate: &AccessGate,
    sessions: &SessionKeys,
    notifier: &dyn Notifier,
    pending_token: Option<&str>,
    query: AuthCallbackQuery,
) -> Result<CallbackOutcome, AppError> {
    if let Some(error) = query.error {
        tracing::warn!(error = %error, "Identity provider returned an error");
        return Ok(CallbackOutcome::Denied);
    }

    let pending_token =
        pending_token.ok_or_else(|| AppError::BadRequest("Sign-in session expired".into()))?;
    let pending = sessions
        .verify_pending(pending_token)
        .map_err(|_| AppError::BadRequest("Sign-in session expired".into()))?;

    if query.state.as_deref() != Some(pending.csrf_state.as_str()) {
        return Err(AppError::BadRequest("Invalid CSRF token".into()));
    }
    let code = query
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".into()))?;

    let verified = provider.exchange_code(&code, &pending.nonce).await?;

    let identity = match gate.admit(&verified.email) {
        Ok(identity) => identity,
        Err(AppError::Forbidden(_)) => return Ok(CallbackOutcome::Denied),
        Err(e) => return Err(e),
    };

    let session_token = sessions.issue(&identity.email)?;
    notify_sign_in_quietly(notifier, &identity.email, verified.name).await;

    Ok(CallbackOutcome::SignedIn {
        identity,
        session_token,
    })
}

/// `GET /api/auth/login`
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let request = provider(&state)?.authorization_request();
    let pending = state
        .sessions
        .issue_pending(&request.csrf_state, &request.nonce)?;

    let jar = jar.add(cookie(
        OIDC_STATE_COOKIE,
        pending,
        PENDING_LOGIN_TTL_SECS,
        state.secure_cookies,
    ));
    Ok((jar, Redirect::to(&request.url)))
}

/// `GET /api/auth/callback`
pub async fn callback_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<AuthCallbackQuery>,
) -> Result<(CookieJar, Redirect), AppError> {
    let pending = jar.get(OIDC_STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(removal(OIDC_STATE_COOKIE));

    let outcome = process_callback(
        provider(&state)?,
        &state.gate,
        &state.sessions,
        state.notifier.as_ref(),
        pending.as_deref(),
        query,
    )
    .await?;

    match outcome {
        CallbackOutcome::SignedIn { session_token, .. } => {
            let jar = jar.add(cookie(
                SESSION_COOKIE,
                session_token,
                state.sessions.ttl_secs(),
                state.secure_cookies,
            ));
            Ok((jar, Redirect::to("/")))
        }
        CallbackOutcome::Denied => Ok((jar, Redirect::to(DENIED_REDIRECT))),
    }
}

/// `GET /api/auth/me`
pub async fn me_handler(user: CurrentUser) -> Result<Json<Identity>, AppError> {
    user.0
        .map(Json)
        .ok_or_else(|| AppError::Auth("Not signed in".into()))
}

/// `POST /api/auth/logout`
pub async fn logout_handler(jar: CookieJar) -> (CookieJar, Json<LogoutResponse>) {
    (
        jar.remove(removal(SESSION_COOKIE)),
        Json(LogoutResponse { success: true }),
    )
}

/// `GET /auth/error`
///
/// Always the same generic payload, whatever the provider reported.
pub async fn auth_error_handler() -> (StatusCode, Json<AuthErrorResponse>) {
    (
        StatusCode::FORBIDDEN,
        Json(AuthErrorResponse {
            error: SIGN_IN_DENIED.to_string(),
            redirect_to: "/".to_string(),
            redirect_after_secs: DENIED_COUNTDOWN_SECS,
        }),
    )
}

/// `POST /api/auth/notify`
pub async fn notify_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<NotifyRequest>,
) -> Result<Json<NotifyResponse>, AppError> {
    let admin = state.gate.require_admin(user.identity())?;
    let to = request
        .email
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| admin.email().to_string());

    let message_id = state.notifier.notify_sign_in(&to, None).await?;
    tracing::info!(to = %to, message_id = %message_id, "Sign-in notification sent on demand");

    Ok(Json(NotifyResponse {
        success: true,
        message_id,
    }))
}
