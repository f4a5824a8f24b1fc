//! Video repository.

use maktaba_core::models::{Video, VideoDetail};
use maktaba_core::AppError;
use sqlx::{PgPool, Postgres, Transaction};

use super::taxonomy;

/// Column values for a video insert/update after reference resolution.
#[derive(Debug)]
pub struct VideoWrite<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub category_id: i64,
    pub place_id: Option<i64>,
    pub language: Option<&'a str>,
    pub active: bool,
}

#[derive(Clone)]
pub struct VideoRepository {
    pool: PgPool,
}

impl VideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        write: &VideoWrite<'_>,
    ) -> Result<Video, AppError> {
        let video = sqlx::query_as::<Postgres, Video>(
            "INSERT INTO videos (title, description, category_id, place_id, language, active) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING *",
        )
        .bind(write.title)
        .bind(write.description)
        .bind(write.category_id)
        .bind(write.place_id)
        .bind(write.language)
        .bind(write.active)
        .fetch_one(&mut **tx)
        .await?;
        Ok(video)
    }

    pub async fn update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        write: &VideoWrite<'_>,
    ) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<Postgres, Video>(
            "UPDATE videos SET title = $2, description = $3, category_id = $4, place_id = $5, \
             language = $6, active = $7, updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(write.title)
        .bind(write.description)
        .bind(write.category_id)
        .bind(write.place_id)
        .bind(write.language)
        .bind(write.active)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(video)
    }

    /// Replace the full speaker set, preserving supplied order via the
    /// position column.
    pub async fn replace_speakers(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        video_id: i64,
        person_ids: &[i64],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM video_speakers WHERE video_id = $1")
            .bind(video_id)
            .execute(&mut **tx)
            .await?;
        for (position, person_id) in person_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO video_speakers (video_id, person_id, position) VALUES ($1, $2, $3)",
            )
            .bind(video_id)
            .bind(person_id)
            .bind(position as i32)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// Replace the full tag set.
    pub async fn replace_tags(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        video_id: i64,
        tag_ids: &[i64],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM video_tags WHERE video_id = $1")
            .bind(video_id)
            .execute(&mut **tx)
            .await?;
        for tag_id in tag_ids {
            sqlx::query("INSERT INTO video_tags (video_id, tag_id) VALUES ($1, $2)")
                .bind(video_id)
                .bind(tag_id)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }

    pub async fn get(&self, id: i64) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<Postgres, Video>("SELECT * FROM videos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(video)
    }

    pub async fn get_detail(&self, id: i64) -> Result<Option<VideoDetail>, AppError> {
        let Some(video) = self.get(id).await? else {
            return Ok(None);
        };
        Ok(Some(self.build_detail(video).await?))
    }

    pub async fn list_details(&self) -> Result<Vec<VideoDetail>, AppError> {
        let videos = sqlx::query_as::<Postgres, Video>("SELECT * FROM videos ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        if videos.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = videos.iter().map(|v| v.id).collect();
        let category_ids: Vec<i64> = videos.iter().map(|v| v.category_id).collect();
        let place_ids: Vec<i64> = videos.iter().filter_map(|v| v.place_id).collect();

        let categories = taxonomy::categories_by_ids(&self.pool, &category_ids).await?;
        let places = taxonomy::places_by_ids(&self.pool, &place_ids).await?;
        let mut speakers = taxonomy::speakers_for_videos(&self.pool, &ids).await?;
        let mut tags = taxonomy::tags_for_videos(&self.pool, &ids).await?;

        let mut details = Vec::with_capacity(videos.len());
        for video in videos {
            let category = categories.get(&video.category_id).cloned().ok_or_else(|| {
                AppError::Internal(format!(
                    "Dangling category_id {} on video {}",
                    video.category_id, video.id
                ))
            })?;
            let place = video.place_id.and_then(|id| places.get(&id).cloned());
            let video_speakers = speakers.remove(&video.id).unwrap_or_default();
            let video_tags = tags.remove(&video.id).unwrap_or_default();
            details.push(detail_from_parts(
                video,
                video_speakers,
                category,
                place,
                video_tags,
            ));
        }
        Ok(details)
    }

    async fn build_detail(&self, video: Video) -> Result<VideoDetail, AppError> {
        let category = taxonomy::get_category(&self.pool, video.category_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Dangling category_id {} on video {}",
                    video.category_id, video.id
                ))
            })?;
        let place = match video.place_id {
            Some(id) => taxonomy::get_place(&self.pool, id).await?,
            None => None,
        };
        let speakers = taxonomy::speakers_for_videos(&self.pool, &[video.id])
            .await?
            .remove(&video.id)
            .unwrap_or_default();
        let tags = taxonomy::tags_for_videos(&self.pool, &[video.id])
            .await?
            .remove(&video.id)
            .unwrap_or_default();
        Ok(detail_from_parts(video, speakers, category, place, tags))
    }

    /// Record a newly stored file, returning the previous path (if any).
    pub async fn set_file(
        &self,
        id: i64,
        file_path: &str,
        file_size: i64,
    ) -> Result<Option<String>, AppError> {
        let mut tx = self.pool.begin().await?;
        let old = sqlx::query_scalar::<Postgres, Option<String>>(
            "SELECT file_path FROM videos WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video with id {} not found", id)))?;

        sqlx::query(
            "UPDATE videos SET file_path = $2, file_size = $3, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(file_path)
        .bind(file_size)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(old)
    }

    /// Delete the row, returning its stored file path for best-effort
    /// cleanup.
    pub async fn delete(&self, id: i64) -> Result<Option<String>, AppError> {
        let old = sqlx::query_scalar::<Postgres, Option<String>>(
            "DELETE FROM videos WHERE id = $1 RETURNING file_path",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video with id {} not found", id)))?;
        Ok(old)
    }

    /// Bump the per-video and library-wide view counters.
    pub async fn increment_views(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE videos SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        sqlx::query("UPDATE stats SET total_views = total_views + 1 WHERE id = 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn detail_from_parts(
    video: Video,
    speakers: Vec<maktaba_core::models::Person>,
    category: maktaba_core::models::Category,
    place: Option<maktaba_core::models::Place>,
    tags: Vec<maktaba_core::models::Tag>,
) -> VideoDetail {
    VideoDetail {
        id: video.id,
        title: video.title,
        description: video.description,
        speakers,
        category,
        place,
        tags,
        language: video.language,
        file_size: video.file_size,
        has_file: video.file_path.as_deref().is_some_and(|p| !p.is_empty()),
        views: video.views,
        active: video.active,
        created_at: video.created_at,
        updated_at: video.updated_at,
    }
}
