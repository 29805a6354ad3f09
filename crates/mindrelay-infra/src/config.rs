//! Configuration file loader for mindrelay.
//!
//! Reads `config.toml` (by default from the data directory, `~/.mindrelay/`
//! in production) into [`RelayConfig`] and validates it. Unlike the history
//! database, a missing or malformed file is an error: the bridge cannot run
//! without provider credentials.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use mindrelay_core::config::ConfigSource;
use mindrelay_types::config::RelayConfig;
use mindrelay_types::error::ConfigError;

use crate::sqlite::pool::database_url;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "MINDRELAY_DATA_DIR";

/// `$MINDRELAY_DATA_DIR`, else `~/.mindrelay`.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mindrelay")
}

/// `{data_dir}/config.toml`.
pub fn default_config_path() -> PathBuf {
    data_dir().join("config.toml")
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<RelayConfig, ConfigError> {
    let config: RelayConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Read, parse and validate `path`.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_config(&content)
}

/// The SQLite URL from `[database]`, or the default under the data dir.
pub fn resolve_database_url(config: &RelayConfig) -> String {
    config
        .database
        .url
        .clone()
        .unwrap_or_else(|| database_url(&data_dir()))
}

/// A config file whose current contents are swapped in atomically on
/// [`reload`](ConfigSource::reload).
pub struct FileConfigSource {
    path: PathBuf,
    current: ArcSwap<RelayConfig>,
}

impl FileConfigSource {
    /// Load `path`; fails if the file is missing or invalid.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = load_config(&path)?;
        tracing::info!(path = %path.display(), provider = %config.provider.kind, "configuration loaded");
        Ok(Self {
            path,
            current: ArcSwap::from_pointee(config),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileConfigSource {
    fn current(&self) -> Arc<RelayConfig> {
        self.current.load_full()
    }

    fn reload(&self) -> Result<(), ConfigError> {
        match load_config(&self.path) {
            Ok(config) => {
                tracing::info!(path = %self.path.display(), provider = %config.provider.kind, "configuration reloaded");
                self.current.store(Arc::new(config));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "reload failed; keeping previous configuration");
                Err(e)
            }
        }
    }
}
