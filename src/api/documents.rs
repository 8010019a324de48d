use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::fields::{normalize_description, required_title};
use crate::auth::middleware::CurrentUser;
use crate::auth::models::Admin;
use crate::db::models::{creation_timestamp, Document, DocumentPatch};
use crate::db::repository::DocumentRepository;
use crate::error::AppError;
use crate::state::AppState;
use crate::storage::client::MediaStore;

/// A document as returned by the API. The storage handle stays server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub external_url: String,
    pub uploaded_by: String,
    pub created_at: DateTime<Utc>,
}

impl From<Document> for DocumentResponse {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            description: doc.description,
            external_url: doc.external_url,
            uploaded_by: doc.uploaded_by,
            created_at: doc.created_at,
        }
    }
}

/// A parsed upload form.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub title: String,
    pub description: Option<String>,
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// Partial update body: only the supplied fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDocumentRequest {
    #[serde(default)]
    pub title: Option<String>,
    /// An empty string clears the description.
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// List all documents, newest first.
///
/// A database that cannot be reached yields an empty list instead of an error.
pub async fn process_list_documents(
    repo: &dyn DocumentRepository,
) -> Result<Vec<Document>, AppError> {
    match repo.list_newest_first().await {
        Ok(docs) => Ok(docs),
        Err(AppError::Unavailable(e)) => {
            tracing::warn!("Database unavailable, returning empty document list: {e}");
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

pub async fn process_get_document(
    repo: &dyn DocumentRepository,
    id: &str,
) -> Result<Document, AppError> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".into()))
}

/// Upload the file, then persist the record. Nothing is stored if the upload fails.
pub async fn process_create_document(
    repo: &dyn DocumentRepository,
    media: &dyn MediaStore,
    admin: &Admin,
    upload: DocumentUpload,
) -> Result<Document, AppError> {
    let title = required_title(&upload.title)?;
    if upload.content.is_empty() {
        return Err(AppError::BadRequest("Title and file are required".into()));
    }

    let stored = media
        .upload(&upload.file_name, &upload.content_type, upload.content)
        .await?;

    let doc = Document {
        id: uuid::Uuid::new_v4().to_string(),
        title,
        description: normalize_description(upload.description),
        external_url: stored.url,
        storage_handle: stored.handle,
        uploaded_by: admin.email().to_string(),
        created_at: creation_timestamp(),
    };

    if let Err(e) = repo.insert(doc.clone()).await {
        // The record was never created, so the uploaded file would be orphaned.
        if let Err(release_err) = media.release(&doc.storage_handle).await {
            tracing::warn!(
                handle = %doc.storage_handle,
                "Failed to release upload after insert failure: {release_err}"
            );
        }
        return Err(e);
    }

    tracing::info!(id = %doc.id, uploaded_by = %doc.uploaded_by, "Document created");
    Ok(doc)
}

pub async fn process_update_document(
    repo: &dyn DocumentRepository,
    _admin: &Admin,
    id: &str,
    request: UpdateDocumentRequest,
) -> Result<Document, AppError> {
    let patch = DocumentPatch {
        title: request.title.as_deref().map(required_title).transpose()?,
        description: request.description.map(|d| normalize_description(Some(d))),
    };

    repo.update(id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".into()))
}

/// Release the stored file, then remove the record.
///
/// A failed release is logged and does not prevent the record from being removed.
pub async fn process_delete_document(
    repo: &dyn DocumentRepository,
    media: &dyn MediaStore,
    _admin: &Admin,
    id: &str,
) -> Result<(), AppError> {
    let doc = process_get_document(repo, id).await?;

    if let Err(e) = media.release(&doc.storage_handle).await {
        tracing::warn!(
            id = %doc.id,
            handle = %doc.storage_handle,
            "Failed to release stored file, removing record anyway: {e}"
        );
    }

    if !repo.delete(id).await? {
        return Err(AppError::NotFound("Document not found".into()));
    }

    tracing::info!(id = %id, "Document deleted");
    Ok(())
}

/// Read the `title`, `description` and `file` fields of an upload form.
async fn read_upload(mut multipart: Multipart) -> Result<DocumentUpload, AppError> {
    let mut title = None;
    let mut description = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "title" => {
                title = Some(field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read title: {e}"))
                })?);
            }
            "description" => {
                description = Some(field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read description: {e}"))
                })?);
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("upload.bin").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file: {e}")))?;
                file = Some((file_name, content_type, data.to_vec()));
            }
            _ => continue,
        }
    }

    match (title, file) {
        (Some(title), Some((file_name, content_type, content)))
            if !title.trim().is_empty() && !content.is_empty() =>
        {
            Ok(DocumentUpload {
                title,
                description,
                file_name,
                content_type,
                content,
            })
        }
        _ => Err(AppError::BadRequest("Title and file are required".into())),
    }
}

/// `GET /api/documents`
pub async fn list_documents_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<DocumentResponse>>, AppError> {
    let docs = process_list_documents(state.document_repo.as_ref()).await?;
    Ok(Json(docs.into_iter().map(Into::into).collect()))
}

/// `GET /api/documents/{id}`
pub async fn get_document_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DocumentResponse>, AppError> {
    let doc = process_get_document(state.document_repo.as_ref(), &id).await?;
    Ok(Json(doc.into()))
}

/// `POST /api/documents` (multipart: `title`, `description`, `file`)
pub async fn create_document_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentResponse>), AppError> {
    // Reject before reading a potentially large body.
    let admin = state.gate.require_admin(user.identity())?;
    let upload = read_upload(multipart).await?;

    let doc = process_create_document(
        state.document_repo.as_ref(),
        state.media_store.as_ref(),
        &admin,
        upload,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(doc.into())))
}

/// `PUT /api/documents/{id}`
pub async fn update_document_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateDocumentRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    let admin = state.gate.require_admin(user.identity())?;
    let doc =
        process_update_document(state.document_repo.as_ref(), &admin, &id, request).await?;
    Ok(Json(doc.into()))
}

/// `DELETE /api/documents/{id}`
pub async fn delete_document_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let admin = state.gate.require_admin(user.identity())?;
    process_delete_document(
        state.document_repo.as_ref(),
        state.media_store.as_ref(),
        &admin,
        &id,
    )
    .await?;
    Ok(Json(DeleteResponse { success: true }))
}
