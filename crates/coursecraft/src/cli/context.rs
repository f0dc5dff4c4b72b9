//! Resolved paths and the engine handle shared by every command.

use crate::cli::error::HelpfulError;
use anyhow::Result;
use coursecraft_db::CourseDb;
use coursecraft_lifecycle::{CourseLifecycle, LifecycleConfig};
use coursecraft_logging::coursecraft_home;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CliContext {
    pub home: PathBuf,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
}

impl CliContext {
    /// Explicit paths win; everything else lives under the Coursecraft home.
    pub fn resolve(db: Option<PathBuf>, config: Option<PathBuf>) -> Self {
        let home = coursecraft_home();
        Self {
            db_path: db.unwrap_or_else(|| home.join("coursecraft.db")),
            config_path: config.unwrap_or_else(|| home.join("config.toml")),
            home,
        }
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.home.join("logs")
    }

    pub fn load_config(&self) -> Result<LifecycleConfig> {
        LifecycleConfig::load_or_default(&self.config_path).map_err(|err| {
            HelpfulError::config_invalid(&self.config_path, &err.to_string()).into()
        })
    }

    pub async fn open_db(&self) -> Result<CourseDb> {
        debug!(path = %self.db_path.display(), "Opening course store");
        CourseDb::open(&self.db_path)
            .await
            .map_err(|err| HelpfulError::database_open_failed(&self.db_path, &err.to_string()).into())
    }

    pub async fn engine(&self) -> Result<CourseLifecycle> {
        let config = self.load_config()?;
        let db = self.open_db().await?;
        Ok(CourseLifecycle::new(db, config))
    }
}
