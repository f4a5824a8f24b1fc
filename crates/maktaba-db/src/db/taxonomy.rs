//! Read helpers for taxonomy entities, used when assembling book/video
//! detail payloads.

use maktaba_core::models::{Category, Person, Place, Tag};
use maktaba_core::AppError;
use sqlx::{PgPool, Postgres};
use std::collections::HashMap;

pub async fn get_category(pool: &PgPool, id: i64) -> Result<Option<Category>, AppError> {
    let category = sqlx::query_as::<Postgres, Category>(
        "SELECT id, name, created_at FROM categories WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(category)
}

pub async fn get_person(pool: &PgPool, id: i64) -> Result<Option<Person>, AppError> {
    let person =
        sqlx::query_as::<Postgres, Person>("SELECT id, name, created_at FROM people WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(person)
}

pub async fn get_place(pool: &PgPool, id: i64) -> Result<Option<Place>, AppError> {
    let place =
        sqlx::query_as::<Postgres, Place>("SELECT id, name, created_at FROM places WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(place)
}

/// Batch lookup to avoid N+1 in list endpoints.
pub async fn people_by_ids(
    pool: &PgPool,
    ids: &[i64],
) -> Result<HashMap<i64, Person>, AppError> {
    let rows = sqlx::query_as::<Postgres, Person>(
        "SELECT id, name, created_at FROM people WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|p| (p.id, p)).collect())
}

pub async fn categories_by_ids(
    pool: &PgPool,
    ids: &[i64],
) -> Result<HashMap<i64, Category>, AppError> {
    let rows = sqlx::query_as::<Postgres, Category>(
        "SELECT id, name, created_at FROM categories WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|c| (c.id, c)).collect())
}

pub async fn places_by_ids(pool: &PgPool, ids: &[i64]) -> Result<HashMap<i64, Place>, AppError> {
    let rows = sqlx::query_as::<Postgres, Place>(
        "SELECT id, name, created_at FROM places WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|p| (p.id, p)).collect())
}

#[derive(sqlx::FromRow)]
struct OwnedTagRow {
    owner_id: i64,
    id: i64,
    name: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

async fn tags_for_owners(
    pool: &PgPool,
    link_table: &str,
    owner_column: &str,
    owner_ids: &[i64],
) -> Result<HashMap<i64, Vec<Tag>>, AppError> {
    // link_table/owner_column come from a fixed set of call sites, never from
    // user input.
    let sql = format!(
        "SELECT l.{owner} AS owner_id, t.id, t.name, t.created_at \
         FROM {link} l JOIN tags t ON t.id = l.tag_id \
         WHERE l.{owner} = ANY($1) ORDER BY t.name",
        owner = owner_column,
        link = link_table,
    );
    let rows = sqlx::query_as::<Postgres, OwnedTagRow>(&sql)
        .bind(owner_ids)
        .fetch_all(pool)
        .await?;

    let mut map: HashMap<i64, Vec<Tag>> = HashMap::new();
    for row in rows {
        map.entry(row.owner_id).or_default().push(Tag {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        });
    }
    Ok(map)
}

pub async fn tags_for_books(
    pool: &PgPool,
    book_ids: &[i64],
) -> Result<HashMap<i64, Vec<Tag>>, AppError> {
    tags_for_owners(pool, "book_tags", "book_id", book_ids).await
}

pub async fn tags_for_videos(
    pool: &PgPool,
    video_ids: &[i64],
) -> Result<HashMap<i64, Vec<Tag>>, AppError> {
    tags_for_owners(pool, "video_tags", "video_id", video_ids).await
}

#[derive(sqlx::FromRow)]
struct OwnedPersonRow {
    owner_id: i64,
    id: i64,
    name: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

/// Speakers per video, preserving the order they were linked in.
pub async fn speakers_for_videos(
    pool: &PgPool,
    video_ids: &[i64],
) -> Result<HashMap<i64, Vec<Person>>, AppError> {
    let rows = sqlx::query_as::<Postgres, OwnedPersonRow>(
        "SELECT vs.video_id AS owner_id, p.id, p.name, p.created_at \
         FROM video_speakers vs JOIN people p ON p.id = vs.person_id \
         WHERE vs.video_id = ANY($1) ORDER BY vs.position",
    )
    .bind(video_ids)
    .fetch_all(pool)
    .await?;

    let mut map: HashMap<i64, Vec<Person>> = HashMap::new();
    for row in rows {
        map.entry(row.owner_id).or_default().push(Person {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        });
    }
    Ok(map)
}
