//! Whole-database snapshots for "nothing changed" assertions.

use anyhow::Result;
use coursecraft_db::CourseDb;
use sqlx::Row;
use std::collections::BTreeMap;

/// Every row of every table, rendered with SQLite's `quote()` so values
/// compare byte for byte. Rows are kept in rowid order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSnapshot {
    tables: BTreeMap<String, Vec<String>>,
}

impl DbSnapshot {
    /// Capture the committed state. Must not be called while a transaction
    /// holds the in-memory store's only connection.
    pub async fn capture(db: &CourseDb) -> Result<Self> {
        let pool = db.pool();
        let names: Vec<String> = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(pool)
        .await?
        .iter()
        .map(|row| row.get::<String, _>("name"))
        .collect();

        let mut tables = BTreeMap::new();
        for table in names {
            let columns: Vec<String> = sqlx::query("SELECT name FROM pragma_table_info(?) ORDER BY cid")
                .bind(&table)
                .fetch_all(pool)
                .await?
                .iter()
                .map(|row| row.get::<String, _>("name"))
                .collect();

            let rendered = columns
                .iter()
                .map(|c| format!("quote(\"{}\")", c))
                .collect::<Vec<_>>()
                .join(" || '|' || ");
            let sql = format!("SELECT {} AS line FROM \"{}\" ORDER BY rowid", rendered, table);
            let rows = sqlx::query(&sql)
                .fetch_all(pool)
                .await?
                .iter()
                .map(|row| row.get::<String, _>("line"))
                .collect();

            tables.insert(table, rows);
        }

        Ok(Self { tables })
    }

    pub fn rows(&self, table: &str) -> &[String] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.rows(table).len()
    }

    /// Names of tables whose contents differ between the two snapshots.
    pub fn changed_tables(&self, other: &DbSnapshot) -> Vec<String> {
        self.tables
            .keys()
            .chain(other.tables.keys())
            .filter(|name| self.rows(name) != other.rows(name))
            .cloned()
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
