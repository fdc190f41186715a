//! Story Views
//!
//! Records "viewed" events exactly once per (viewer, story).
//!
//! Two layers enforce the dedup:
//!
//! - **`ViewGuard`**: session-scoped set of confirmed views plus the pairs
//!   currently being submitted, so double-fired activations make one attempt
//! - **Backend uniqueness**: the durable boundary across restarts and devices;
//!   a uniqueness violation is reported as `ViewInsert::AlreadyExists`
//!
//! `SqliteViewStore` is a local view-tracking backend with that constraint.
//!
//! # Example
//!
//! ```rust,no_run
//! use story_views::{create_pool, run_migrations, SqliteViewStore, ViewGuard};
//! use story_core::{StoryId, UserId};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://views.db").await?;
//! run_migrations(&pool).await?;
//!
//! let guard = ViewGuard::new(Arc::new(SqliteViewStore::new(pool)));
//! let outcome = guard
//!     .record_view(&UserId::new("u1"), &StoryId::new("s7"))
//!     .await;
//! assert!(outcome.is_confirmed());
//! # Ok(())
//! # }
//! ```

mod error;
mod guard;

// Vertical slices
pub mod views;

pub use error::{Result, ViewStoreError};
pub use guard::{ViewGuard, ViewOutcome};
pub use views::{SqliteViewStore, StoryView};

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://views.db>`)
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> std::result::Result<SqlitePool, sqlx::Error> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::debug!(url = %database_url, "View store pool created");

    Ok(pool)
}
