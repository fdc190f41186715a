//! Story view records
//!
//! Each row is a durable `(viewer, story)` pair. The table's unique
//! constraint makes inserts idempotent: a second insert for the same pair is
//! reported as `ViewInsert::AlreadyExists` rather than an error.
//!
//! # Example
//!
//! ```rust,no_run
//! use story_views::views;
//! use story_core::{StoryId, UserId};
//! # async fn example(pool: &sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
//! let viewer = UserId::new("u1");
//! let story = StoryId::new("s7");
//!
//! views::insert_view(pool, &viewer, &story).await?;
//! assert!(views::has_viewed(pool, &viewer, &story).await?);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use story_core::{StoryId, UserId, ViewBackend, ViewInsert};
use tracing::debug;

use crate::error::{Result, ViewStoreError};

/// A recorded view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryView {
    pub viewer_id: UserId,
    pub story_id: StoryId,
    pub viewed_at: DateTime<Utc>,
}

/// Insert a view record for the pair
///
/// # Errors
///
/// Returns an error for any database failure other than the uniqueness
/// violation, which is reported as `ViewInsert::AlreadyExists`
pub async fn insert_view(pool: &SqlitePool, viewer: &UserId, story: &StoryId) -> Result<ViewInsert> {
    let result = sqlx::query(
        "INSERT INTO story_views (viewer_id, story_id, viewed_at) VALUES (?, ?, ?)",
    )
    .bind(viewer)
    .bind(story)
    .bind(Utc::now().timestamp_millis())
    .execute(pool)
    .await;

    match result {
        Ok(_) => {
            debug!(viewer = %viewer, story_id = %story, "View inserted");
            Ok(ViewInsert::Inserted)
        }
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            debug!(viewer = %viewer, story_id = %story, "View already recorded");
            Ok(ViewInsert::AlreadyExists)
        }
        Err(e) => Err(e.into()),
    }
}

/// Whether the viewer has a recorded view of the story
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn has_viewed(pool: &SqlitePool, viewer: &UserId, story: &StoryId) -> Result<bool> {
    let found: i64 = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM story_views WHERE viewer_id = ? AND story_id = ?)",
    )
    .bind(viewer)
    .bind(story)
    .fetch_one(pool)
    .await?;

    Ok(found != 0)
}

/// Number of distinct viewers of a story
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn view_count(pool: &SqlitePool, story: &StoryId) -> Result<u64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM story_views WHERE story_id = ?")
        .bind(story)
        .fetch_one(pool)
        .await?;

    u64::try_from(count).map_err(|_| ViewStoreError::CorruptRow(format!("count {}", count)))
}

/// Views of a story, oldest first
///
/// # Errors
///
/// Returns an error if the query fails or a row holds an invalid timestamp
pub async fn viewers_of(pool: &SqlitePool, story: &StoryId) -> Result<Vec<StoryView>> {
    let rows = sqlx::query(
        "SELECT viewer_id, story_id, viewed_at FROM story_views
         WHERE story_id = ?
         ORDER BY viewed_at, id",
    )
    .bind(story)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| -> Result<StoryView> {
            let millis: i64 = row.try_get("viewed_at")?;
            let viewed_at = Utc
                .timestamp_millis_opt(millis)
                .single()
                .ok_or_else(|| ViewStoreError::CorruptRow(format!("viewed_at {}", millis)))?;

            Ok(StoryView {
                viewer_id: row.try_get("viewer_id")?,
                story_id: row.try_get("story_id")?,
                viewed_at,
            })
        })
        .collect()
}

/// `ViewBackend` over a `SQLite` pool
#[derive(Debug, Clone)]
pub struct SqliteViewStore {
    pool: SqlitePool,
}

impl SqliteViewStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database at `database_url` and apply migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails
    pub async fn open(database_url: &str) -> Result<Self> {
        let pool = crate::create_pool(database_url).await?;
        crate::run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn has_viewed(&self, viewer: &UserId, story: &StoryId) -> Result<bool> {
        has_viewed(&self.pool, viewer, story).await
    }

    pub async fn view_count(&self, story: &StoryId) -> Result<u64> {
        view_count(&self.pool, story).await
    }

    pub async fn viewers_of(&self, story: &StoryId) -> Result<Vec<StoryView>> {
        viewers_of(&self.pool, story).await
    }
}

#[async_trait]
impl ViewBackend for SqliteViewStore {
    async fn insert_view(&self, viewer: &UserId, story: &StoryId) -> story_core::Result<ViewInsert> {
        Ok(insert_view(&self.pool, viewer, story).await?)
    }
}
