//! Video endpoints: CRUD plus video file upload.
//!
//! Speakers and tags are resolved and set-replaced inside the same
//! transaction as the main row write.

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::upload::{content_type_matches, read_file_field};
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use maktaba_core::models::{VideoDetail, VideoPayload};
use maktaba_core::AppError;
use maktaba_db::{resolver, with_transaction, VideoWrite};
use std::sync::Arc;
use uuid::Uuid;

async fn write_video(
    state: &AppState,
    id: Option<i64>,
    payload: VideoPayload,
) -> Result<VideoDetail, AppError> {
    let repo = state.videos.clone();
    let video = with_transaction(&state.pool, move |tx| {
        Box::pin(async move {
            let speaker_ids = resolver::resolve_speakers(tx, &payload.speakers).await?;
            let category_id = resolver::require_category(tx, payload.category_id).await?;
            let place_id = match &payload.place {
                Some(reference) => Some(resolver::resolve_place(tx, reference).await?),
                None => None,
            };
            let tag_ids = resolver::resolve_tags(tx, &payload.tags).await?;

            let write = VideoWrite {
                title: payload.title.trim(),
                description: payload.description.as_deref(),
                category_id,
                place_id,
                language: payload.language.as_deref(),
                active: payload.active,
            };

            let video = match id {
                None => repo.insert(tx, &write).await?,
                Some(id) => repo.update(tx, id, &write).await?.ok_or_else(|| {
                    AppError::NotFound(format!("Video with id {} not found", id))
                })?,
            };

            repo.replace_speakers(tx, video.id, &speaker_ids).await?;
            repo.replace_tags(tx, video.id, &tag_ids).await?;
            Ok(video)
        })
    })
    .await?;

    state
        .videos
        .get_detail(video.id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Video {} vanished after write", video.id)))
}

#[utoipa::path(
    post,
    path = "/api/v1/videos",
    tag = "videos",
    request_body = VideoPayload,
    responses(
        (status = 201, description = "Video created", body = VideoDetail),
        (status = 400, description = "Invalid payload or referenced id", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, payload), fields(operation = "create_video"))]
pub async fn create_video(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<VideoPayload>,
) -> Result<impl IntoResponse, HttpAppError> {
    let detail = write_video(&state, None, payload).await?;
    tracing::info!(video_id = detail.id, "Video created");
    Ok((StatusCode::CREATED, Json(detail)))
}

#[utoipa::path(
    put,
    path = "/api/v1/videos/{id}",
    tag = "videos",
    params(("id" = i64, Path, description = "Video ID")),
    request_body = VideoPayload,
    responses(
        (status = 200, description = "Video updated", body = VideoDetail),
        (status = 400, description = "Invalid payload or referenced id", body = ErrorResponse),
        (status = 404, description = "Video or category not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, payload), fields(video_id = %id, operation = "update_video"))]
pub async fn update_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<VideoPayload>,
) -> Result<Json<VideoDetail>, HttpAppError> {
    let detail = write_video(&state, Some(id), payload).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/{id}",
    tag = "videos",
    params(("id" = i64, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video detail", body = VideoDetail),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<VideoDetail>, HttpAppError> {
    let detail = state
        .videos
        .get_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video with id {} not found", id)))?;
    Ok(Json(detail))
}

#[utoipa::path(
    get,
    path = "/api/v1/videos",
    tag = "videos",
    responses((status = 200, description = "All videos", body = [VideoDetail]))
)]
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<VideoDetail>>, HttpAppError> {
    let details = state.videos.list_details().await?;
    Ok(Json(details))
}

#[utoipa::path(
    delete,
    path = "/api/v1/videos/{id}",
    tag = "videos",
    params(("id" = i64, Path, description = "Video ID")),
    responses(
        (status = 204, description = "Video deleted"),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(video_id = %id, operation = "delete_video"))]
pub async fn delete_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, HttpAppError> {
    let old_path = state.videos.delete(id).await?;

    if let Some(path) = old_path.filter(|p| !p.is_empty()) {
        let storage = state.storage.clone();
        tokio::spawn(async move {
            if let Err(e) = storage.delete(&path).await {
                tracing::warn!(error = %e, key = %path, "Failed to delete video file");
            }
        });
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/v1/videos/{id}/media",
    tag = "videos",
    params(("id" = i64, Path, description = "Video ID")),
    responses(
        (status = 200, description = "File stored", body = VideoDetail),
        (status = 400, description = "Invalid upload", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(video_id = %id, operation = "upload_video_file"))]
pub async fn upload_video_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<VideoDetail>, HttpAppError> {
    state
        .videos
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video with id {} not found", id)))?;

    let (data, content_type) =
        read_file_field(multipart, state.limits.max_video_size_bytes).await?;

    let declared = content_type.as_deref().unwrap_or("");
    let allowed = state
        .limits
        .video_allowed_content_types
        .iter()
        .any(|expected| content_type_matches(declared, expected));
    if !allowed {
        return Err(HttpAppError(AppError::InvalidInput(format!(
            "Unsupported video content type '{}'",
            declared
        ))));
    }

    let key = format!("videos/{}/{}.mp4", id, Uuid::new_v4());
    let size = state.storage.save(&key, data).await?;

    let old_path = state.videos.set_file(id, &key, size as i64).await?;
    tracing::info!(video_id = id, key = %key, size_bytes = size, "Video file stored");

    if let Some(path) = old_path.filter(|p| !p.is_empty() && *p != key) {
        let storage = state.storage.clone();
        tokio::spawn(async move {
            if let Err(e) = storage.delete(&path).await {
                tracing::warn!(error = %e, key = %path, "Failed to delete replaced video file");
            }
        });
    }

    let detail = state
        .videos
        .get_detail(id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Video {} vanished after upload", id)))?;
    Ok(Json(detail))
}
