//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use maktaba_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

/// Headroom on top of the largest allowed file for multipart framing.
const BODY_LIMIT_OVERHEAD: usize = 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>> {
    let cors = setup_cors(config)?;
    let body_limit = config.max_video_size_bytes().max(config.max_book_size_bytes())
        + BODY_LIMIT_OVERHEAD;

    let v1 = Router::new()
        .route(
            "/books",
            get(handlers::books::list_books).post(handlers::books::create_book),
        )
        .route(
            "/books/{id}",
            get(handlers::books::get_book)
                .put(handlers::books::update_book)
                .delete(handlers::books::delete_book),
        )
        .route(
            "/books/{id}/media",
            get(handlers::media_serve::serve_book_media).put(handlers::books::upload_book_file),
        )
        .route(
            "/videos",
            get(handlers::videos::list_videos).post(handlers::videos::create_video),
        )
        .route(
            "/videos/{id}",
            get(handlers::videos::get_video)
                .put(handlers::videos::update_video)
                .delete(handlers::videos::delete_video),
        )
        .route(
            "/videos/{id}/media",
            get(handlers::media_serve::serve_video_media).put(handlers::videos::upload_video_file),
        )
        .route("/stats", get(handlers::stats::get_stats));

    let api_routes = Router::new()
        .nest(crate::constants::API_PREFIX, v1)
        .route("/health", get(health_check))
        .with_state(state);

    let router = api_routes
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/docs"))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(body_limit))
        .fallback(fallback_handler);

    Ok(router)
}

fn setup_cors(config: &Config) -> Result<CorsLayer> {
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .context("Invalid CORS origin")?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers(Any)
    };
    Ok(cors)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn fallback_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}
