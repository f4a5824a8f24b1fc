mod helpers;

use helpers::{create_video, eventually, seed_category, setup_test_app, upload_video_mp4};
use serde_json::json;

#[tokio::test]
async fn test_create_video_requires_a_speaker() {
    let app = setup_test_app().await;
    let category_id = seed_category(app.pool(), "Lectures").await;

    let response = app
        .client()
        .post("/api/v1/videos")
        .json(&json!({
            "title": "Khutbah",
            "speakers": [],
            "category_id": category_id,
        }))
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_speaker_order_is_preserved() {
    let app = setup_test_app().await;
    let category_id = seed_category(app.pool(), "Seminars").await;

    let detail = create_video(
        app.client(),
        category_id,
        "Panel Discussion",
        json!({ "speakers": ["First Speaker", "Second Speaker", "Third Speaker"] }),
    )
    .await;

    let names: Vec<&str> = detail["speakers"]
        .as_array()
        .expect("speakers array")
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["First Speaker", "Second Speaker", "Third Speaker"]);
}

#[tokio::test]
async fn test_update_reorders_and_replaces_speakers() {
    let app = setup_test_app().await;
    let category_id = seed_category(app.pool(), "Seminars").await;

    let detail = create_video(
        app.client(),
        category_id,
        "Evening Session",
        json!({ "speakers": ["Speaker A", "Speaker B"] }),
    )
    .await;
    let video_id = detail["id"].as_i64().expect("video id");
    let speaker_a = detail["speakers"][0]["id"].as_i64().expect("speaker id");
    let speaker_b = detail["speakers"][1]["id"].as_i64().expect("speaker id");

    let response = app
        .client()
        .put(&format!("/api/v1/videos/{}", video_id))
        .json(&json!({
            "title": "Evening Session",
            "speakers": [speaker_b, speaker_a],
            "category_id": category_id,
        }))
        .await;
    assert_eq!(response.status_code(), 200, "body: {}", response.text());

    let detail = response.json::<serde_json::Value>();
    let ids: Vec<i64> = detail["speakers"]
        .as_array()
        .expect("speakers array")
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![speaker_b, speaker_a]);
}

#[tokio::test]
async fn test_duplicate_speaker_refs_collapse_to_one_link() {
    let app = setup_test_app().await;
    let category_id = seed_category(app.pool(), "Lectures").await;

    let first = create_video(
        app.client(),
        category_id,
        "Part One",
        json!({ "speakers": ["Repeat Speaker"] }),
    )
    .await;
    let speaker_id = first["speakers"][0]["id"].as_i64().expect("speaker id");

    let detail = create_video(
        app.client(),
        category_id,
        "Part Two",
        json!({ "speakers": [speaker_id, speaker_id] }),
    )
    .await;
    assert_eq!(detail["speakers"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_speaker_id_rejects_whole_create() {
    let app = setup_test_app().await;
    let category_id = seed_category(app.pool(), "Lectures").await;

    let response = app
        .client()
        .post("/api/v1/videos")
        .json(&json!({
            "title": "Broken",
            "speakers": ["Fine Speaker", 999_999],
            "category_id": category_id,
        }))
        .await;
    assert_eq!(response.status_code(), 400);

    let videos: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos")
        .fetch_one(app.pool())
        .await
        .unwrap();
    assert_eq!(videos, 0);

    // The transaction rolled back, so the free-text speaker was not kept.
    let people: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM people WHERE name = 'Fine Speaker'")
            .fetch_one(app.pool())
            .await
            .unwrap();
    assert_eq!(people, 0);
}

#[tokio::test]
async fn test_delete_video_removes_stored_file() {
    let app = setup_test_app().await;
    let category_id = seed_category(app.pool(), "Lectures").await;

    let detail = create_video(app.client(), category_id, "Ephemeral", json!({})).await;
    let video_id = detail["id"].as_i64().expect("video id");

    upload_video_mp4(app.client(), video_id, vec![7u8; 2048]).await;

    let file_path: String =
        sqlx::query_scalar("SELECT file_path FROM videos WHERE id = $1")
            .bind(video_id)
            .fetch_one(app.pool())
            .await
            .unwrap();
    let on_disk = app.upload_dir.join(&file_path);
    assert!(on_disk.is_file());

    let response = app
        .client()
        .delete(&format!("/api/v1/videos/{}", video_id))
        .await;
    assert_eq!(response.status_code(), 204);

    let removed = eventually(|| {
        let on_disk = on_disk.clone();
        async move { !on_disk.exists() }
    })
    .await;
    assert!(removed, "stored file should be cleaned up after delete");
}

#[tokio::test]
async fn test_upload_rejects_wrong_content_type() {
    let app = setup_test_app().await;
    let category_id = seed_category(app.pool(), "Lectures").await;

    let detail = create_video(app.client(), category_id, "Misupload", json!({})).await;
    let video_id = detail["id"].as_i64().expect("video id");

    let part = axum_test::multipart::Part::bytes(vec![1u8; 128])
        .file_name("notes.txt")
        .mime_type("text/plain");
    let form = axum_test::multipart::MultipartForm::new().add_part("file", part);
    let response = app
        .client()
        .put(&format!("/api/v1/videos/{}/media", video_id))
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_replacing_upload_deletes_previous_file() {
    let app = setup_test_app().await;
    let category_id = seed_category(app.pool(), "Lectures").await;

    let detail = create_video(app.client(), category_id, "Re-upload", json!({})).await;
    let video_id = detail["id"].as_i64().expect("video id");

    upload_video_mp4(app.client(), video_id, vec![1u8; 512]).await;
    let old_path: String =
        sqlx::query_scalar("SELECT file_path FROM videos WHERE id = $1")
            .bind(video_id)
            .fetch_one(app.pool())
            .await
            .unwrap();
    let old_on_disk = app.upload_dir.join(&old_path);

    upload_video_mp4(app.client(), video_id, vec![2u8; 1024]).await;
    let new_path: String =
        sqlx::query_scalar("SELECT file_path FROM videos WHERE id = $1")
            .bind(video_id)
            .fetch_one(app.pool())
            .await
            .unwrap();
    assert_ne!(old_path, new_path);
    assert!(app.upload_dir.join(&new_path).is_file());

    let removed = eventually(|| {
        let old_on_disk = old_on_disk.clone();
        async move { !old_on_disk.exists() }
    })
    .await;
    assert!(removed, "previous file should be cleaned up after replacement");
}
