//! Forced storage failures.
//!
//! A [`FailureTrigger`] installs a SQLite trigger that aborts the matching
//! statement, so tests can break a transaction halfway through and observe
//! the rollback.

use anyhow::Result;
use coursecraft_db::CourseDb;
use tracing::debug;

pub struct FailureTrigger {
    name: String,
}

impl FailureTrigger {
    /// Abort every statement matching `event` (e.g. `BEFORE UPDATE ON modules`)
    /// for which `condition` holds (e.g. `NEW.order_index = 3`).
    pub async fn install(db: &CourseDb, name: &str, event: &str, condition: Option<&str>) -> Result<Self> {
        let when = condition.map(|c| format!("WHEN {}", c)).unwrap_or_default();
        let sql = format!(
            "CREATE TRIGGER {name} {event} FOR EACH ROW {when} BEGIN SELECT RAISE(ABORT, 'forced failure: {name}'); END"
        );
        sqlx::query(&sql).execute(db.pool()).await?;
        debug!("Installed failure trigger: {}", name);
        Ok(Self { name: name.to_string() })
    }

    pub async fn remove(self, db: &CourseDb) -> Result<()> {
        sqlx::query(&format!("DROP TRIGGER IF EXISTS {}", self.name))
            .execute(db.pool())
            .await?;
        debug!("Removed failure trigger: {}", self.name);
        Ok(())
    }
}
