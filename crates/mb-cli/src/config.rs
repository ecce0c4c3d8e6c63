//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use mb_core::policy::DEFAULT_RETENTION_DAYS;
use mb_core::{ArchivePolicy, DayBoundary, PolicyError};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Local hour at which a new logical day starts.
    pub boundary_hour: u32,
    pub boundary_minute: u32,
    /// Days of history to keep. Values outside 0..=36500 disable the sweep.
    pub retention_days: i64,
    /// Run retention and orphan cleanup after each archive.
    pub auto_cleanup: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("boundary_hour", &self.boundary_hour)
            .field("boundary_minute", &self.boundary_minute)
            .field("retention_days", &self.retention_days)
            .field("auto_cleanup", &self.auto_cleanup)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("markbook.db"),
            boundary_hour: 0,
            boundary_minute: 0,
            retention_days: DEFAULT_RETENTION_DAYS,
            auto_cleanup: true,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // MB_RETENTION_DAYS, MB_BOUNDARY_HOUR, ...
        figment = figment.merge(Env::prefixed("MB_"));

        figment.extract()
    }

    /// The archive policy described by this configuration.
    pub fn policy(&self) -> Result<ArchivePolicy, PolicyError> {
        Ok(ArchivePolicy {
            boundary: DayBoundary::new(self.boundary_hour, self.boundary_minute)?,
            retention_days: self.retention_days,
        })
    }
}

/// Returns the platform-specific config directory for markbook.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("markbook"))
}

/// Returns the platform-specific data directory for markbook.
///
/// On Linux: `~/.local/share/markbook`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("markbook"))
}
