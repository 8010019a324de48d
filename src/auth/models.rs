use serde::{Deserialize, Serialize};

/// The identity attached to a request.
///
/// `is_admin` is derived from the admin allow-list every time an identity is
/// resolved; it is never persisted or carried inside the session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Lower-cased email address.
    pub email: String,
    pub is_admin: bool,
}

/// Proof that the caller passed the admin check.
///
/// Only [`crate::auth::gate::AccessGate::require_admin`] constructs this, so
/// every mutating operation that takes an `&Admin` is gated by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admin(Identity);

impl Admin {
    pub(crate) fn new(identity: Identity) -> Self {
        Self(identity)
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }

    pub fn identity(&self) -> &Identity {
        &self.0
    }
}

/// What the identity provider vouched for after a successful code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub email: String,
    pub name: Option<String>,
}
