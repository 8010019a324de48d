use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::documents::DeleteResponse;
use crate::api::fields::{normalize_description, required_title};
use crate::auth::middleware::CurrentUser;
use crate::auth::models::Admin;
use crate::db::models::{creation_timestamp, Video, VideoPatch};
use crate::db::repository::VideoRepository;
use crate::error::AppError;
use crate::models::embed::{is_embed_url, to_embed_url};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub embed_url: String,
    pub uploaded_by: String,
    pub created_at: DateTime<Utc>,
}

impl From<Video> for VideoResponse {
    fn from(video: Video) -> Self {
        Self {
            id: video.id,
            title: video.title,
            description: video.description,
            embed_url: video.embed_url,
            uploaded_by: video.uploaded_by,
            created_at: video.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVideoRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Any supported YouTube link form.
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateVideoRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

fn embed_or_bad_request(raw: &str) -> Result<String, AppError> {
    let embed = to_embed_url(raw).map_err(|e| AppError::BadRequest(e.to_string()))?;
    debug_assert!(is_embed_url(&embed));
    Ok(embed)
}

/// List all videos, newest first. Soft-fails to an empty list when the
/// database cannot be reached.
pub async fn process_list_videos(repo: &dyn VideoRepository) -> Result<Vec<Video>, AppError> {
    match repo.list_newest_first().await {
        Ok(videos) => Ok(videos),
        Err(AppError::Unavailable(e)) => {
            tracing::warn!("Database unavailable, returning empty video list: {e}");
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

pub async fn process_get_video(repo: &dyn VideoRepository, id: &str) -> Result<Video, AppError> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".into()))
}

pub async fn process_create_video(
    repo: &dyn VideoRepository,
    admin: &Admin,
    request: CreateVideoRequest,
) -> Result<Video, AppError> {
    if request.title.trim().is_empty() || request.url.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Title and YouTube URL are required".into(),
        ));
    }

    let video = Video {
        id: uuid::Uuid::new_v4().to_string(),
        title: required_title(&request.title)?,
        description: normalize_description(request.description),
        embed_url: embed_or_bad_request(&request.url)?,
        uploaded_by: admin.email().to_string(),
        created_at: creation_timestamp(),
    };

    repo.insert(video.clone()).await?;

    tracing::info!(id = %video.id, embed_url = %video.embed_url, "Video created");
    Ok(video)
}

/// Apply the supplied fields. A blank URL counts as not supplied. A new URL is
/// normalized first; if that fails nothing is changed.
pub async fn process_update_video(
    repo: &dyn VideoRepository,
    _admin: &Admin,
    id: &str,
    request: UpdateVideoRequest,
) -> Result<Video, AppError> {
    let patch = VideoPatch {
        title: request.title.as_deref().map(required_title).transpose()?,
        description: request.description.map(|d| normalize_description(Some(d))),
        embed_url: request
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(embed_or_bad_request)
            .transpose()?,
    };

    repo.update(id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".into()))
}

pub async fn process_delete_video(
    repo: &dyn VideoRepository,
    _admin: &Admin,
    id: &str,
) -> Result<(), AppError> {
    if !repo.delete(id).await? {
        return Err(AppError::NotFound("Video not found".into()));
    }
    tracing::info!(id = %id, "Video deleted");
    Ok(())
}

/// `GET /api/videos`
pub async fn list_videos_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<VideoResponse>>, AppError> {
    let videos = process_list_videos(state.video_repo.as_ref()).await?;
    Ok(Json(videos.into_iter().map(Into::into).collect()))
}

/// `GET /api/videos/{id}`
pub async fn get_video_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VideoResponse>, AppError> {
    let video = process_get_video(state.video_repo.as_ref(), &id).await?;
    Ok(Json(video.into()))
}

/// `POST /api/videos`
pub async fn create_video_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreateVideoRequest>,
) -> Result<(StatusCode, Json<VideoResponse>), AppError> {
    let admin = state.gate.require_admin(user.identity())?;
    let video = process_create_video(state.video_repo.as_ref(), &admin, request).await?;
    Ok((StatusCode::CREATED, Json(video.into())))
}

/// `PUT /api/videos/{id}`
pub async fn update_video_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateVideoRequest>,
) -> Result<Json<VideoResponse>, AppError> {
    let admin = state.gate.require_admin(user.identity())?;
    let video = process_update_video(state.video_repo.as_ref(), &admin, &id, request).await?;
    Ok(Json(video.into()))
}

/// `DELETE /api/videos/{id}`
pub async fn delete_video_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let admin = state.gate.require_admin(user.identity())?;
    process_delete_video(state.video_repo.as_ref(), &admin, &id).await?;
    Ok(Json(DeleteResponse { success: true }))
}
