//! In-memory doubles shared by the unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::auth::gate::{AccessGate, AdminAllowList};
use crate::auth::models::Admin;
use crate::db::models::{Document, DocumentPatch, Video, VideoPatch};
use crate::db::repository::{DocumentRepository, VideoRepository};
use crate::error::AppError;

pub const ADMIN_EMAIL: &str = "admin@example.com";

pub fn gate() -> AccessGate {
    AccessGate::new(AdminAllowList::parse(ADMIN_EMAIL))
}

pub fn admin() -> Admin {
    let gate = gate();
    gate.require_admin(Some(&gate.identify(ADMIN_EMAIL)))
        .expect("allow-listed email")
}

#[derive(Default)]
pub struct MockDocumentRepo {
    pub documents: Mutex<Vec<Document>>,
    pub unavailable: AtomicBool,
}

impl MockDocumentRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentRepository for MockDocumentRepo {
    async fn insert(&self, doc: Document) -> Result<(), AppError> {
        self.check()?;
        self.documents.lock().unwrap().push(doc);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, AppError> {
        self.check()?;
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == id)
            .cloned())
    }

    async fn list_newest_first(&self) -> Result<Vec<Document>, AppError> {
        self.check()?;
        let mut docs = self.documents.lock().unwrap().clone();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(docs)
    }

    async fn update(&self, id: &str, patch: DocumentPatch) -> Result<Option<Document>, AppError> {
        self.check()?;
        let mut docs = self.documents.lock().unwrap();
        Ok(docs.iter_mut().find(|d| d.id == id).map(|d| {
            patch.apply(d);
            d.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        self.check()?;
        let mut docs = self.documents.lock().unwrap();
        let before = docs.len();
        docs.retain(|d| d.id != id);
        Ok(docs.len() < before)
    }
}

#[derive(Default)]
pub struct MockVideoRepo {
    pub videos: Mutex<Vec<Video>>,
    pub unavailable: AtomicBool,
}

impl MockVideoRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.videos.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl VideoRepository for MockVideoRepo {
    async fn insert(&self, video: Video) -> Result<(), AppError> {
        self.check()?;
        self.videos.lock().unwrap().push(video);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Video>, AppError> {
        self.check()?;
        Ok(self
            .videos
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.id == id)
            .cloned())
    }

    async fn list_newest_first(&self) -> Result<Vec<Video>, AppError> {
        self.check()?;
        let mut videos = self.videos.lock().unwrap().clone();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(videos)
    }

    async fn update(&self, id: &str, patch: VideoPatch) -> Result<Option<Video>, AppError> {
        self.check()?;
        let mut videos = self.videos.lock().unwrap();
        Ok(videos.iter_mut().find(|v| v.id == id).map(|v| {
            patch.apply(v);
            v.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        self.check()?;
        let mut videos = self.videos.lock().unwrap();
        let before = videos.len();
        videos.retain(|v| v.id != id);
        Ok(videos.len() < before)
    }
}
