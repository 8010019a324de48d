use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Cookie carrying the signed session token.
pub const SESSION_COOKIE: &str = "lms_session";
/// Cookie carrying the OIDC round-trip state between login and callback.
pub const OIDC_STATE_COOKIE: &str = "lms_oidc";

/// How long a pending OIDC login stays valid.
pub const PENDING_LOGIN_TTL_SECS: i64 = 10 * 60;

/// Claims of a session token. Only the subject is stored; the admin flag is
/// recomputed from the allow-list on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Lower-cased email address.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// CSRF state and nonce issued by `/api/auth/login`, checked by the callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingLogin {
    pub csrf_state: String,
    pub nonce: String,
    pub exp: i64,
}

/// Signs and verifies HS256 session tokens.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Issue a session token for an admitted identity.
    pub fn issue(&self, email: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: email.to_lowercase(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        self.sign(&claims)
    }

    /// Verify signature and expiry of a session token.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        self.check(token)
            .map_err(|e| AppError::Auth(format!("Invalid session: {e}")))
    }

    pub fn issue_pending(&self, csrf_state: &str, nonce: &str) -> Result<String, AppError> {
        let claims = PendingLogin {
            csrf_state: csrf_state.to_string(),
            nonce: nonce.to_string(),
            exp: (Utc::now() + Duration::seconds(PENDING_LOGIN_TTL_SECS)).timestamp(),
        };
        self.sign(&claims)
    }

    pub fn verify_pending(&self, token: &str) -> Result<PendingLogin, AppError> {
        self.check(token)
            .map_err(|e| AppError::Auth(format!("Invalid sign-in state: {e}")))
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    fn check<T: for<'de> Deserialize<'de>>(
        &self,
        token: &str,
    ) -> Result<T, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<T>(token, &self.decoding, &validation).map(|data| data.claims)
    }
}
