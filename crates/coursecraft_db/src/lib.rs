//! Course aggregate store for Coursecraft
//!
//! This crate is the storage collaborator of the content lifecycle engine.
//! Every read and write goes through a [`CourseTx`], so a caller always works
//! inside one atomic scope that it either commits or drops (rolling back).
//!
//! # Usage
//!
//! ```rust,ignore
//! use coursecraft_db::{CourseDb, Result};
//!
//! let db = CourseDb::open("~/.coursecraft/coursecraft.db").await?;
//!
//! let mut tx = db.begin("add_module").await?;
//! let module = tx.insert_module(&course_id, &input).await?;
//! tx.commit().await?;
//! ```

mod error;
mod schema;
mod tx;
mod types;

// Method implementations organized by domain
mod activity;
mod assessment;
mod course;
mod curriculum;
mod extras;

pub use error::{DbError, Result};
pub use tx::CourseTx;
pub use types::*;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// The course store.
///
/// This is the ONLY way to access the database. Do not use raw sqlx elsewhere.
#[derive(Clone)]
pub struct CourseDb {
    pool: SqlitePool,
}

impl CourseDb {
    /// Open or create a database at the given path.
    ///
    /// Creates all tables if they don't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;

        info!(path = %path.display(), "Course database opened");

        Ok(db)
    }

    /// Open an existing database (fails if not exists).
    pub async fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DbError::NotFound(format!(
                "Database not found: {}",
                path.display()
            )));
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;
        Ok(db)
    }

    /// Create an in-memory database (tests, dry runs).
    ///
    /// A memory database lives and dies with its single connection, so the
    /// pool holds exactly one and never recycles it. Callers must not hold
    /// two transactions at once.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;
        Ok(db)
    }

    /// Start an atomic scope. Dropping the returned transaction without
    /// committing rolls it back.
    pub async fn begin(&self, label: &'static str) -> Result<CourseTx> {
        CourseTx::begin(&self.pool, label).await
    }

    /// Get the underlying connection pool (escape hatch for tests and tooling).
    ///
    /// Prefer the typed transaction methods instead.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

// Timestamp utilities
impl CourseDb {
    /// Current time as milliseconds since Unix epoch.
    pub fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Convert milliseconds to DateTime.
    pub fn millis_to_datetime(millis: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(millis).unwrap_or_else(chrono::Utc::now)
    }
}
