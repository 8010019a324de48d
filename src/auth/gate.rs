use std::collections::HashSet;

use crate::auth::models::{Admin, Identity};
use crate::error::AppError;

/// Generic denial; deliberately says nothing about which addresses are valid.
pub const SIGN_IN_DENIED: &str = "Access denied";

/// The set of email addresses allowed to sign in and mutate content.
///
/// Parsed once from a comma-separated value; entries are trimmed and lower-cased.
#[derive(Debug, Clone, Default)]
pub struct AdminAllowList {
    emails: HashSet<String>,
}

impl AdminAllowList {
    pub fn parse(raw: &str) -> Self {
        Self {
            emails: raw
                .split(',')
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(&email.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

/// Decides sign-in admission and resolves per-request identities.
#[derive(Debug, Clone)]
pub struct AccessGate {
    allow_list: AdminAllowList,
}

impl AccessGate {
    pub fn new(allow_list: AdminAllowList) -> Self {
        Self { allow_list }
    }

    /// Sign-in admission: only allow-listed addresses may establish a session.
    pub fn admit(&self, email: &str) -> Result<Identity, AppError> {
        if self.allow_list.contains(email) {
            tracing::info!(email = %email.to_lowercase(), "Admin sign-in allowed");
            Ok(self.identify(email))
        } else {
            tracing::warn!(email = %email, "Sign-in denied");
            Err(AppError::Forbidden(SIGN_IN_DENIED.into()))
        }
    }

    /// Resolve the identity behind a verified session subject.
    pub fn identify(&self, email: &str) -> Identity {
        Identity {
            email: email.trim().to_lowercase(),
            is_admin: self.allow_list.contains(email),
        }
    }

    /// Server-side check performed by every mutating operation.
    ///
    /// No session yields `Auth` (401); a session whose address is no longer
    /// allow-listed yields `Forbidden` (403).
    pub fn require_admin(&self, caller: Option<&Identity>) -> Result<Admin, AppError> {
        let identity = caller.ok_or_else(|| AppError::Auth("Unauthorized".into()))?;
        // Re-derive instead of trusting the flag on the incoming identity.
        if self.allow_list.contains(&identity.email) {
            Ok(Admin::new(self.identify(&identity.email)))
        } else {
            Err(AppError::Forbidden("Unauthorized".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> AccessGate {
        AccessGate::new(AdminAllowList::parse(
            " Admin@Example.com ,second@example.org,, ",
        ))
    }

    #[test]
    fn test_parse_trims_and_lowercases() {
        let list = AdminAllowList::parse(" Admin@Example.com ,second@example.org,, ");
        assert_eq!(list.len(), 2);
        assert!(list.contains("admin@example.com"));
        assert!(list.contains("SECOND@EXAMPLE.ORG"));
    }

    #[test]
    fn test_empty_allow_list() {
        let list = AdminAllowList::parse("");
        assert!(list.is_empty());
        assert!(!list.contains(""));
    }

    #[test]
    fn test_admit_allow_listed_any_case() {
        let gate = gate();
        for email in ["admin@example.com", "ADMIN@EXAMPLE.COM", "Admin@example.Com"] {
            let identity = gate.admit(email).unwrap();
            assert!(identity.is_admin);
            assert_eq!(identity.email, "admin@example.com");
        }
    }

    #[test]
    fn test_admit_rejects_unknown() {
        match gate().admit("visitor@example.com") {
            Err(AppError::Forbidden(msg)) => assert_eq!(msg, SIGN_IN_DENIED),
            other => panic!("Expected Forbidden error, got: {:?}", other),
        }
    }

    #[test]
    fn test_identify_non_admin() {
        let identity = gate().identify("visitor@example.com");
        assert!(!identity.is_admin);
    }

    #[test]
    fn test_require_admin_without_session() {
        assert!(matches!(gate().require_admin(None), Err(AppError::Auth(_))));
    }

    #[test]
    fn test_require_admin_ignores_forged_flag() {
        let forged = Identity {
            email: "visitor@example.com".to_string(),
            is_admin: true,
        };
        assert!(matches!(
            gate().require_admin(Some(&forged)),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_require_admin_success() {
        let gate = gate();
        let identity = gate.identify("SECOND@example.org");
        let admin = gate.require_admin(Some(&identity)).unwrap();
        assert_eq!(admin.email(), "second@example.org");
    }
}
