use std::sync::Arc;

use crate::auth::gate::AccessGate;
use crate::auth::oidc::IdentityProvider;
use crate::auth::session::SessionKeys;
use crate::db::repository::{DocumentRepository, VideoRepository};
use crate::faq::FaqEngine;
use crate::notify::Notifier;
use crate::storage::client::MediaStore;

/// Shared handles for every request. External collaborators sit behind traits
/// so tests can swap them out.
#[derive(Clone)]
pub struct AppState {
    pub document_repo: Arc<dyn DocumentRepository>,
    pub video_repo: Arc<dyn VideoRepository>,
    pub media_store: Arc<dyn MediaStore>,
    pub notifier: Arc<dyn Notifier>,
    /// `None` when sign-in is not configured.
    pub identity_provider: Option<Arc<dyn IdentityProvider>>,
    pub gate: Arc<AccessGate>,
    pub sessions: Arc<SessionKeys>,
    pub faq: Arc<FaqEngine>,
    pub secure_cookies: bool,
    pub max_upload_bytes: usize,
}
