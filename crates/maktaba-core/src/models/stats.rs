//! Library-wide aggregate counters (single row, id = 1).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Stats {
    pub id: i32,
    pub total_downloads: i64,
    pub total_views: i64,
}
