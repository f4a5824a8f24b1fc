//! Library-wide aggregate counters.

use maktaba_core::models::Stats;
use maktaba_core::AppError;
use sqlx::{PgPool, Postgres};

#[derive(Clone)]
pub struct StatsRepository {
    pool: PgPool,
}

impl StatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self) -> Result<Stats, AppError> {
        let stats = sqlx::query_as::<Postgres, Stats>(
            "SELECT id, total_downloads, total_views FROM stats WHERE id = 1",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
