mod helpers;

use helpers::{
    book_downloads, create_book, create_video, eventually, seed_category, setup_test_app,
    upload_book_pdf, upload_video_mp4, video_views,
};
use serde_json::json;
use std::time::Duration;

fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

async fn book_with_file(app: &helpers::TestApp, data: Vec<u8>) -> i64 {
    let category_id = seed_category(app.pool(), "Fiqh").await;
    let detail = create_book(app.client(), category_id, "Served Book", json!({})).await;
    let book_id = detail["id"].as_i64().expect("book id");
    upload_book_pdf(app.client(), book_id, data).await;
    book_id
}

async fn video_with_file(app: &helpers::TestApp, data: Vec<u8>) -> i64 {
    let category_id = seed_category(app.pool(), "Lectures").await;
    let detail = create_video(app.client(), category_id, "Served Video", json!({})).await;
    let video_id = detail["id"].as_i64().expect("video id");
    upload_video_mp4(app.client(), video_id, data).await;
    video_id
}

#[tokio::test]
async fn test_whole_file_request_returns_exact_bytes() {
    let app = setup_test_app().await;
    let data = sample_bytes(300);
    let book_id = book_with_file(&app, data.clone()).await;

    let response = app
        .client()
        .get(&format!("/api/v1/books/{}/media", book_id))
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "application/pdf");
    assert_eq!(response.header("content-length"), "300");
    assert_eq!(response.header("accept-ranges"), "bytes");
    assert_eq!(response.header("cache-control"), "private, max-age=3600");
    let disposition = response.header("content-disposition");
    assert!(disposition.to_str().unwrap().starts_with("inline;"));
    assert_eq!(response.as_bytes().as_ref(), data.as_slice());
}

#[tokio::test]
async fn test_range_request_returns_exact_slice() {
    let app = setup_test_app().await;
    let data = sample_bytes(300);
    let book_id = book_with_file(&app, data.clone()).await;

    let response = app
        .client()
        .get(&format!("/api/v1/books/{}/media", book_id))
        .add_header("range", "bytes=10-19")
        .await;

    assert_eq!(response.status_code(), 206);
    assert_eq!(response.header("content-range"), "bytes 10-19/300");
    assert_eq!(response.header("content-length"), "10");
    assert_eq!(response.as_bytes().as_ref(), &data[10..=19]);
}

#[tokio::test]
async fn test_open_ended_range_returns_tail() {
    let app = setup_test_app().await;
    let data = sample_bytes(300);
    let book_id = book_with_file(&app, data.clone()).await;

    let response = app
        .client()
        .get(&format!("/api/v1/books/{}/media", book_id))
        .add_header("range", "bytes=250-")
        .await;

    assert_eq!(response.status_code(), 206);
    assert_eq!(response.header("content-range"), "bytes 250-299/300");
    assert_eq!(response.as_bytes().as_ref(), &data[250..]);
}

#[tokio::test]
async fn test_unsatisfiable_ranges_return_416_with_full_size() {
    let app = setup_test_app().await;
    let book_id = book_with_file(&app, sample_bytes(300)).await;
    let url = format!("/api/v1/books/{}/media", book_id);

    for range in ["bytes=300-", "bytes=50-10", "bytes=0-300", "bytes=-100", "garbage"] {
        let response = app.client().get(&url).add_header("range", range).await;
        assert_eq!(response.status_code(), 416, "range: {}", range);
        assert_eq!(
            response.header("content-range"),
            "bytes */300",
            "range: {}",
            range
        );
        assert!(response.as_bytes().is_empty(), "range: {}", range);
    }
}

#[tokio::test]
async fn test_inactive_book_is_forbidden() {
    let app = setup_test_app().await;
    let book_id = book_with_file(&app, sample_bytes(64)).await;

    sqlx::query("UPDATE books SET active = false WHERE id = $1")
        .bind(book_id)
        .execute(app.pool())
        .await
        .unwrap();

    let response = app
        .client()
        .get(&format!("/api/v1/books/{}/media", book_id))
        .await;
    assert_eq!(response.status_code(), 403);
    assert!(response
        .header("content-type")
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
}

#[tokio::test]
async fn test_missing_resources_return_plain_errors() {
    let app = setup_test_app().await;
    let category_id = seed_category(app.pool(), "Fiqh").await;

    let response = app.client().get("/api/v1/books/999999/media").await;
    assert_eq!(response.status_code(), 404);
    assert_eq!(response.text(), "Book not found");

    let response = app.client().get("/api/v1/books/0/media").await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(response.text(), "Invalid ID");

    // Book exists but has no uploaded file yet.
    let detail = create_book(app.client(), category_id, "Fileless", json!({})).await;
    let book_id = detail["id"].as_i64().expect("book id");
    let response = app
        .client()
        .get(&format!("/api/v1/books/{}/media", book_id))
        .await;
    assert_eq!(response.status_code(), 404);
    assert_eq!(response.text(), "File not found");
}

#[tokio::test]
async fn test_traversal_path_in_database_is_rejected() {
    let app = setup_test_app().await;
    let book_id = book_with_file(&app, sample_bytes(64)).await;

    sqlx::query("UPDATE books SET file_path = '../../etc/passwd' WHERE id = $1")
        .bind(book_id)
        .execute(app.pool())
        .await
        .unwrap();

    let response = app
        .client()
        .get(&format!("/api/v1/books/{}/media", book_id))
        .await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_book_download_counted_only_without_range() {
    let app = setup_test_app().await;
    let book_id = book_with_file(&app, sample_bytes(300)).await;
    let url = format!("/api/v1/books/{}/media", book_id);

    let response = app.client().get(&url).await;
    assert_eq!(response.status_code(), 200);

    let counted = eventually(|| async { book_downloads(app.pool(), book_id).await == 1 }).await;
    assert!(counted, "full download should increment the counter");

    // A mid-file range request is a resumed transfer, not a new download.
    let response = app.client().get(&url).add_header("range", "bytes=100-200").await;
    assert_eq!(response.status_code(), 206);
    let response = app.client().get(&url).add_header("range", "bytes=0-").await;
    assert_eq!(response.status_code(), 206);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(book_downloads(app.pool(), book_id).await, 1);

    let stats = app
        .client()
        .get("/api/v1/stats")
        .await
        .json::<serde_json::Value>();
    assert_eq!(stats["total_downloads"], json!(1));
    assert_eq!(stats["total_views"], json!(0));
}

#[tokio::test]
async fn test_video_view_counted_only_on_playback_start() {
    let app = setup_test_app().await;
    let video_id = video_with_file(&app, sample_bytes(4096)).await;
    let url = format!("/api/v1/videos/{}/media", video_id);

    // Players open playback with an unbounded range from zero.
    let response = app.client().get(&url).add_header("range", "bytes=0-").await;
    assert_eq!(response.status_code(), 206);

    let counted = eventually(|| async { video_views(app.pool(), video_id).await == 1 }).await;
    assert!(counted, "playback start should increment the counter");

    // Seeks and plain downloads do not count as new views.
    let response = app.client().get(&url).add_header("range", "bytes=1024-2047").await;
    assert_eq!(response.status_code(), 206);
    let response = app.client().get(&url).await;
    assert_eq!(response.status_code(), 200);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(video_views(app.pool(), video_id).await, 1);

    let total: i64 = sqlx::query_scalar("SELECT total_views FROM stats WHERE id = 1")
        .fetch_one(app.pool())
        .await
        .unwrap();
    assert_eq!(total, 1);
}

#[tokio::test]
async fn test_failed_request_is_not_counted() {
    let app = setup_test_app().await;
    let book_id = book_with_file(&app, sample_bytes(64)).await;

    sqlx::query("UPDATE books SET active = false WHERE id = $1")
        .bind(book_id)
        .execute(app.pool())
        .await
        .unwrap();

    let response = app
        .client()
        .get(&format!("/api/v1/books/{}/media", book_id))
        .await;
    assert_eq!(response.status_code(), 403);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(book_downloads(app.pool(), book_id).await, 0);
}

#[tokio::test]
async fn test_video_media_served_with_mp4_content_type() {
    let app = setup_test_app().await;
    let data = sample_bytes(2048);
    let video_id = video_with_file(&app, data.clone()).await;

    let response = app
        .client()
        .get(&format!("/api/v1/videos/{}/media", video_id))
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "video/mp4");
    assert_eq!(response.as_bytes().as_ref(), data.as_slice());
}
