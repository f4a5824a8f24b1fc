//! Media serving endpoints for books and videos.
//!
//! Thin wrappers over `crate::media::serve_file`: they gate on the record
//! (exists, active, has a stored file) and dispatch the usage-counter
//! increment without blocking the response. Error bodies on this surface are
//! plain text.

use crate::media::{self, AssetFile, MediaKind};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use std::sync::Arc;

fn range_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

#[utoipa::path(
    get,
    path = "/api/v1/books/{id}/media",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID"),
        ("Range" = Option<String>, Header, description = "Optional byte range, e.g. bytes=0-1023")
    ),
    responses(
        (status = 200, description = "Whole PDF", content_type = "application/pdf"),
        (status = 206, description = "Byte-range slice", content_type = "application/pdf"),
        (status = 400, description = "Invalid ID"),
        (status = 403, description = "Book not available"),
        (status = 404, description = "Book or file not found"),
        (status = 416, description = "Range not satisfiable")
    )
)]
#[tracing::instrument(skip(state, headers), fields(book_id = %id, operation = "serve_book_media"))]
pub async fn serve_book_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let range = range_header(&headers);

    if id <= 0 {
        return media::plain_error(StatusCode::BAD_REQUEST, "Invalid ID");
    }

    let book = match state.books.get(id).await {
        Ok(Some(book)) => book,
        Ok(None) => return media::plain_error(StatusCode::NOT_FOUND, "Book not found"),
        Err(e) => {
            tracing::error!(error = %e, book_id = id, "Failed to fetch book");
            return media::plain_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    if !book.active {
        return media::plain_error(StatusCode::FORBIDDEN, "This book is not available");
    }

    let Some(storage_key) = book.file_path.as_deref().filter(|p| !p.is_empty()) else {
        return media::plain_error(StatusCode::NOT_FOUND, "File not found");
    };

    let response = media::serve_file(
        state.storage.as_ref(),
        AssetFile {
            title: &book.title,
            storage_key,
            kind: MediaKind::BookPdf,
        },
        range.as_deref(),
    )
    .await;

    // One logical download = one increment; range continuations do not
    // count, and a failed increment never fails the response.
    if response.status().is_success() && media::should_count(MediaKind::BookPdf, range.as_deref()) {
        let repo = state.books.clone();
        tokio::spawn(async move {
            if let Err(e) = repo.increment_downloads(id).await {
                tracing::warn!(error = %e, book_id = id, "Failed to increment download counter");
            }
        });
    }

    response
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/{id}/media",
    tag = "videos",
    params(
        ("id" = i64, Path, description = "Video ID"),
        ("Range" = Option<String>, Header, description = "Optional byte range, e.g. bytes=0-")
    ),
    responses(
        (status = 200, description = "Whole video", content_type = "video/mp4"),
        (status = 206, description = "Byte-range slice", content_type = "video/mp4"),
        (status = 400, description = "Invalid ID"),
        (status = 403, description = "Video not available"),
        (status = 404, description = "Video or file not found"),
        (status = 416, description = "Range not satisfiable")
    )
)]
#[tracing::instrument(skip(state, headers), fields(video_id = %id, operation = "serve_video_media"))]
pub async fn serve_video_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let range = range_header(&headers);

    if id <= 0 {
        return media::plain_error(StatusCode::BAD_REQUEST, "Invalid ID");
    }

    let video = match state.videos.get(id).await {
        Ok(Some(video)) => video,
        Ok(None) => return media::plain_error(StatusCode::NOT_FOUND, "Video not found"),
        Err(e) => {
            tracing::error!(error = %e, video_id = id, "Failed to fetch video");
            return media::plain_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    if !video.active {
        return media::plain_error(StatusCode::FORBIDDEN, "This video is not available");
    }

    let Some(storage_key) = video.file_path.as_deref().filter(|p| !p.is_empty()) else {
        return media::plain_error(StatusCode::NOT_FOUND, "File not found");
    };

    let response = media::serve_file(
        state.storage.as_ref(),
        AssetFile {
            title: &video.title,
            storage_key,
            kind: MediaKind::VideoMp4,
        },
        range.as_deref(),
    )
    .await;

    // Players open playback with a bytes=0- probe; exactly that request
    // counts as one view.
    if response.status().is_success() && media::should_count(MediaKind::VideoMp4, range.as_deref())
    {
        let repo = state.videos.clone();
        tokio::spawn(async move {
            if let Err(e) = repo.increment_views(id).await {
                tracing::warn!(error = %e, video_id = id, "Failed to increment view counter");
            }
        });
    }

    response
}
