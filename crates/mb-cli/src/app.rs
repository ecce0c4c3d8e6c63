//! Handles shared by every command: the store, the archiver and the clocks.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use tokio::sync::watch;

use mb_core::{ArchivePolicy, SystemWallClock, WallClock};
use mb_db::{Archiver, Database};

use crate::Config;

/// Archiver whose policy follows configuration reloads.
pub type LiveArchiver<C, Tz> = Archiver<watch::Receiver<ArchivePolicy>, C, Tz>;

pub struct App<C: WallClock, Tz: TimeZone> {
    pub db: Database,
    pub config: Config,
    pub archiver: LiveArchiver<C, Tz>,
    pub wall: C,
    pub tz: Tz,
    config_path: Option<PathBuf>,
    policy_tx: watch::Sender<ArchivePolicy>,
}

impl App<SystemWallClock, Local> {
    /// Loads config and opens the database, creating its directory.
    pub fn open(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load_from(config_path).context("failed to load configuration")?;
        tracing::debug!(?config, "loaded configuration");

        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create database directory")?;
        }

        let db = Database::open(&config.database_path)
            .with_context(|| format!("failed to open {}", config.database_path.display()))?;
        let mut app = Self::new(db, config, SystemWallClock, Local)?;
        app.config_path = config_path.map(Path::to_path_buf);
        Ok(app)
    }
}

impl<C: WallClock, Tz: TimeZone> App<C, Tz> {
    pub fn new(db: Database, config: Config, wall: C, tz: Tz) -> Result<Self> {
        let policy = config.policy().context("invalid day boundary in configuration")?;
        let (policy_tx, policy_rx) = watch::channel(policy);
        let archiver = Archiver::new(policy_rx, wall.clone(), tz.clone())
            .with_auto_cleanup(config.auto_cleanup);
        Ok(Self {
            db,
            config,
            archiver,
            wall,
            tz,
            config_path: None,
            policy_tx,
        })
    }

    #[must_use]
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Re-reads the configuration and applies the archive settings.
    ///
    /// The database stays open; a changed `database_path` only takes effect
    /// on the next start.
    pub fn reload(&mut self) -> Result<&Config> {
        let config = Config::load_from(self.config_path.as_deref())
            .context("failed to load configuration")?;
        let policy = config.policy().context("invalid day boundary in configuration")?;
        if config.database_path != self.config.database_path {
            tracing::warn!(
                path = %config.database_path.display(),
                "database path change ignored until restart"
            );
        }
        self.policy_tx.send_replace(policy);
        self.archiver.set_auto_cleanup(config.auto_cleanup);
        self.config = config;
        tracing::info!(
            boundary = %policy.boundary,
            retention_days = policy.retention_days,
            "configuration reloaded"
        );
        Ok(&self.config)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::app;
    use super::*;

    #[test]
    fn reload_applies_new_policy() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "boundary_hour = 11\nauto_cleanup = false\n").unwrap();

        let (app, _) = app();
        let mut app = app.with_config_path(&path);
        assert_eq!(app.archiver.today().unwrap().to_string(), "2025-06-10");

        app.reload().unwrap();
        assert_eq!(app.archiver.today().unwrap().to_string(), "2025-06-09");
        assert!(!app.archiver.auto_cleanup());
    }

    #[test]
    fn invalid_boundary_fails_construction() {
        let config = Config {
            boundary_minute: 75,
            ..Config::default()
        };
        let db = Database::open_in_memory().unwrap();
        let err = App::new(db, config, SystemWallClock, chrono::Utc).err().unwrap();
        assert!(err.to_string().contains("invalid day boundary"));
    }
}
