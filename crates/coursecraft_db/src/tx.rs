//! Atomic scopes over the course store.
//!
//! A [`CourseTx`] wraps one SQLite transaction. Domain methods live in the
//! per-domain modules; this file holds the lifecycle of the scope itself and
//! the table-generic primitives the cascade engine is built from.

use crate::error::{DbError, Result};
use sqlx::sqlite::{Sqlite, SqlitePool};
use sqlx::{Row, Transaction};
use std::time::Instant;
use tracing::{debug, debug_span, warn, Span};

/// One atomic unit of work against the store.
pub struct CourseTx {
    pub(crate) inner: Transaction<'static, Sqlite>,
    label: &'static str,
    started: Instant,
    span: Span,
}

impl std::fmt::Debug for CourseTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourseTx")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl CourseTx {
    pub(crate) async fn begin(pool: &SqlitePool, label: &'static str) -> Result<Self> {
        let inner = pool.begin().await?;
        let span = debug_span!("db.tx", label);
        span.in_scope(|| debug!("transaction started"));
        Ok(Self {
            inner,
            label,
            started: Instant::now(),
            span,
        })
    }

    /// Name of the operation this scope belongs to.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Make every write in this scope visible at once.
    pub async fn commit(self) -> Result<()> {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        let span = self.span.clone();
        self.inner.commit().await?;
        span.in_scope(|| debug!(elapsed_ms, "transaction committed"));
        Ok(())
    }

    /// Discard every write in this scope.
    pub async fn rollback(self) -> Result<()> {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        let span = self.span.clone();
        let label = self.label;
        match self.inner.rollback().await {
            Ok(()) => {
                span.in_scope(|| debug!(elapsed_ms, "transaction rolled back"));
                Ok(())
            }
            Err(err) => {
                warn!(label, error = %err, "rollback failed");
                Err(DbError::from(err))
            }
        }
    }

    // ========================================================================
    // Table-generic primitives
    // ========================================================================
    //
    // Table and column names are compile-time constants owned by this
    // workspace; only key values are bound.

    /// Delete every row of `table` whose `column` equals `key`.
    pub async fn delete_where(
        &mut self,
        table: &'static str,
        column: &'static str,
        key: &str,
    ) -> Result<u64> {
        let sql = format!("DELETE FROM {} WHERE {} = ?", table, column);
        let result = sqlx::query(&sql).bind(key).execute(&mut *self.inner).await?;
        Ok(result.rows_affected())
    }

    /// Null out `column` on every row of `table` that points at `key`.
    pub async fn detach_where(
        &mut self,
        table: &'static str,
        column: &'static str,
        key: &str,
    ) -> Result<u64> {
        let sql = format!("UPDATE {} SET {} = NULL WHERE {} = ?", table, column, column);
        let result = sqlx::query(&sql).bind(key).execute(&mut *self.inner).await?;
        Ok(result.rows_affected())
    }

    /// Count rows of `table` whose `column` equals `key`.
    pub async fn count_where(
        &mut self,
        table: &'static str,
        column: &'static str,
        key: &str,
    ) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) AS n FROM {} WHERE {} = ?", table, column);
        let row = sqlx::query(&sql).bind(key).fetch_one(&mut *self.inner).await?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    /// Ids of the children of `parent_id`, in presentation order.
    pub(crate) async fn child_ids(
        &mut self,
        table: &'static str,
        parent_column: &'static str,
        parent_id: &str,
    ) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT id FROM {} WHERE {} = ? ORDER BY order_index",
            table, parent_column
        );
        let rows = sqlx::query(&sql)
            .bind(parent_id)
            .fetch_all(&mut *self.inner)
            .await?;
        Ok(rows.iter().map(|row| row.get::<String, _>("id")).collect())
    }

    /// Assign contiguous indices 1..=n to the children of `parent_id`
    /// following `ordered_ids`.
    ///
    /// Indices are first moved to negative staging values so the
    /// `UNIQUE(parent, order_index)` constraint holds after every statement.
    pub(crate) async fn reorder_children(
        &mut self,
        table: &'static str,
        parent_column: &'static str,
        parent_id: &str,
        ordered_ids: &[&str],
    ) -> Result<()> {
        let stage = format!(
            "UPDATE {} SET order_index = -order_index - 1 WHERE {} = ?",
            table, parent_column
        );
        sqlx::query(&stage)
            .bind(parent_id)
            .execute(&mut *self.inner)
            .await?;

        let assign = format!(
            "UPDATE {} SET order_index = ? WHERE id = ? AND {} = ?",
            table, parent_column
        );
        for (position, id) in ordered_ids.iter().enumerate() {
            let result = sqlx::query(&assign)
                .bind(position as i64 + 1)
                .bind(*id)
                .bind(parent_id)
                .execute(&mut *self.inner)
                .await?;
            if result.rows_affected() != 1 {
                return Err(DbError::not_found(format!("{} row {}", table, id)));
            }
        }

        let leftover = format!(
            "SELECT COUNT(*) AS n FROM {} WHERE {} = ? AND order_index < 1",
            table, parent_column
        );
        let row = sqlx::query(&leftover)
            .bind(parent_id)
            .fetch_one(&mut *self.inner)
            .await?;
        if row.get::<i64, _>("n") > 0 {
            return Err(DbError::constraint(format!(
                "reorder of {} left children without a position",
                table
            )));
        }

        Ok(())
    }
}

/// Map a unique violation on an ordered insert to a retryable conflict.
pub(crate) fn ordering_conflict(err: sqlx::Error, table: &str) -> DbError {
    let is_unique = matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation());
    if is_unique {
        DbError::constraint(format!("concurrent append to {}; retry", table))
    } else {
        DbError::from(err)
    }
}
