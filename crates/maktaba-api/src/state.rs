//! Application state shared by all handlers.

use maktaba_db::{BookRepository, StatsRepository, VideoRepository};
use maktaba_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

/// Upload limits and content-type allow lists from configuration.
#[derive(Clone, Debug)]
pub struct UploadLimits {
    pub max_book_size_bytes: usize,
    pub max_video_size_bytes: usize,
    pub video_allowed_content_types: Vec<String>,
}

pub struct AppState {
    pub pool: PgPool,
    pub books: BookRepository,
    pub videos: VideoRepository,
    pub stats: StatsRepository,
    pub storage: Arc<dyn Storage>,
    pub limits: UploadLimits,
}

impl AppState {
    pub fn new(pool: PgPool, storage: Arc<dyn Storage>, limits: UploadLimits) -> Self {
        Self {
            books: BookRepository::new(pool.clone()),
            videos: VideoRepository::new(pool.clone()),
            stats: StatsRepository::new(pool.clone()),
            pool,
            storage,
            limits,
        }
    }
}
