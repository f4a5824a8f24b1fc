//! Book endpoints: CRUD plus PDF upload.
//!
//! Create/update resolve the author/place/tag references and write the main
//! row inside one transaction, so an invalid reference mid-batch leaves
//! nothing behind.

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::upload::{content_type_matches, read_file_field};
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use maktaba_core::models::{BookDetail, BookPayload};
use maktaba_core::AppError;
use maktaba_db::{resolver, with_transaction, BookWrite, PersonRole};
use std::sync::Arc;
use uuid::Uuid;

async fn write_book(
    state: &AppState,
    id: Option<i64>,
    payload: BookPayload,
) -> Result<BookDetail, AppError> {
    let repo = state.books.clone();
    let book = with_transaction(&state.pool, move |tx| {
        Box::pin(async move {
            let author_id =
                resolver::resolve_person(tx, PersonRole::Author, &payload.author).await?;
            let category_id = resolver::require_category(tx, payload.category_id).await?;
            let place_id = match &payload.place {
                Some(reference) => Some(resolver::resolve_place(tx, reference).await?),
                None => None,
            };
            let tag_ids = resolver::resolve_tags(tx, &payload.tags).await?;

            let write = BookWrite {
                title: payload.title.trim(),
                description: payload.description.as_deref(),
                author_id,
                category_id,
                place_id,
                language: payload.language.as_deref(),
                active: payload.active,
            };

            let book = match id {
                None => repo.insert(tx, &write).await?,
                Some(id) => repo.update(tx, id, &write).await?.ok_or_else(|| {
                    AppError::NotFound(format!("Book with id {} not found", id))
                })?,
            };

            repo.replace_tags(tx, book.id, &tag_ids).await?;
            Ok(book)
        })
    })
    .await?;

    state
        .books
        .get_detail(book.id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Book {} vanished after write", book.id)))
}

#[utoipa::path(
    post,
    path = "/api/v1/books",
    tag = "books",
    request_body = BookPayload,
    responses(
        (status = 201, description = "Book created", body = BookDetail),
        (status = 400, description = "Invalid payload or referenced id", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, payload), fields(operation = "create_book"))]
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<BookPayload>,
) -> Result<impl IntoResponse, HttpAppError> {
    let detail = write_book(&state, None, payload).await?;
    tracing::info!(book_id = detail.id, "Book created");
    Ok((StatusCode::CREATED, Json(detail)))
}

#[utoipa::path(
    put,
    path = "/api/v1/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Book updated", body = BookDetail),
        (status = 400, description = "Invalid payload or referenced id", body = ErrorResponse),
        (status = 404, description = "Book or category not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, payload), fields(book_id = %id, operation = "update_book"))]
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<BookPayload>,
) -> Result<Json<BookDetail>, HttpAppError> {
    let detail = write_book(&state, Some(id), payload).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    get,
    path = "/api/v1/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book detail", body = BookDetail),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<BookDetail>, HttpAppError> {
    let detail = state
        .books
        .get_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;
    Ok(Json(detail))
}

#[utoipa::path(
    get,
    path = "/api/v1/books",
    tag = "books",
    responses((status = 200, description = "All books", body = [BookDetail]))
)]
pub async fn list_books(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BookDetail>>, HttpAppError> {
    let details = state.books.list_details().await?;
    Ok(Json(details))
}

#[utoipa::path(
    delete,
    path = "/api/v1/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(book_id = %id, operation = "delete_book"))]
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, HttpAppError> {
    let old_path = state.books.delete(id).await?;

    // Best-effort file cleanup; a failed delete never rolls back the row.
    if let Some(path) = old_path.filter(|p| !p.is_empty()) {
        let storage = state.storage.clone();
        tokio::spawn(async move {
            if let Err(e) = storage.delete(&path).await {
                tracing::warn!(error = %e, key = %path, "Failed to delete book file");
            }
        });
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/v1/books/{id}/media",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "File stored", body = BookDetail),
        (status = 400, description = "Invalid upload", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(book_id = %id, operation = "upload_book_file"))]
pub async fn upload_book_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<BookDetail>, HttpAppError> {
    state
        .books
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

    let (data, content_type) = read_file_field(multipart, state.limits.max_book_size_bytes).await?;

    let declared = content_type.as_deref().unwrap_or("");
    if !content_type_matches(declared, "application/pdf") {
        return Err(HttpAppError(AppError::InvalidInput(format!(
            "Books must be application/pdf, got '{}'",
            declared
        ))));
    }

    let key = format!("books/{}/{}.pdf", id, Uuid::new_v4());
    let size = state.storage.save(&key, data).await?;

    let old_path = state.books.set_file(id, &key, size as i64).await?;
    tracing::info!(book_id = id, key = %key, size_bytes = size, "Book file stored");

    if let Some(path) = old_path.filter(|p| !p.is_empty() && *p != key) {
        let storage = state.storage.clone();
        tokio::spawn(async move {
            if let Err(e) = storage.delete(&path).await {
                tracing::warn!(error = %e, key = %path, "Failed to delete replaced book file");
            }
        });
    }

    let detail = state
        .books
        .get_detail(id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Book {} vanished after upload", id)))?;
    Ok(Json(detail))
}
