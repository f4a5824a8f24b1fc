//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers;
use maktaba_core::models::{
    BookDetail, BookPayload, Category, EntityRef, Person, Place, Stats, Tag, VideoDetail,
    VideoPayload,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Maktaba API",
        version = "0.1.0",
        description = "Islamic media library backend: books, videos, and range-capable media serving"
    ),
    paths(
        handlers::books::create_book,
        handlers::books::update_book,
        handlers::books::get_book,
        handlers::books::list_books,
        handlers::books::delete_book,
        handlers::books::upload_book_file,
        handlers::videos::create_video,
        handlers::videos::update_video,
        handlers::videos::get_video,
        handlers::videos::list_videos,
        handlers::videos::delete_video,
        handlers::videos::upload_video_file,
        handlers::media_serve::serve_book_media,
        handlers::media_serve::serve_video_media,
        handlers::stats::get_stats,
    ),
    components(schemas(
        BookDetail,
        BookPayload,
        VideoDetail,
        VideoPayload,
        EntityRef,
        Person,
        Place,
        Category,
        Tag,
        Stats,
        ErrorResponse,
    )),
    tags(
        (name = "books", description = "Book catalog and PDF serving"),
        (name = "videos", description = "Video catalog and streaming"),
        (name = "stats", description = "Aggregate usage counters")
    )
)]
pub struct ApiDoc;
