//! Application state shared by every subcommand.
//!
//! Pins the core ports to their infra implementations: the TOML config
//! file, the SQLite pool and the HTTP provider gateway.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use mindrelay_core::config::ConfigSource;
use mindrelay_infra::config::{FileConfigSource, data_dir, resolve_database_url};
use mindrelay_infra::llm::HttpProviderGateway;
use mindrelay_infra::sqlite::interaction::SqliteInteractionLog;
use mindrelay_infra::sqlite::pool::DatabasePool;
use mindrelay_infra::sqlite::settings::SqliteActorSettings;

pub struct AppState {
    pub config: Arc<FileConfigSource>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
    pub gateway: HttpProviderGateway,
}

impl AppState {
    /// Load the config file, open the database and build the HTTP client.
    pub async fn init(config_path: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("creating data directory {}", data_dir.display()))?;

        let config = FileConfigSource::open(config_path)
            .with_context(|| format!("loading {}", config_path.display()))?;

        let db_url = resolve_database_url(&config.current());
        let db_pool = DatabasePool::new(&db_url)
            .await
            .with_context(|| format!("opening database {db_url}"))?;

        let gateway = HttpProviderGateway::new()?;

        Ok(Self {
            config: Arc::new(config),
            data_dir,
            db_pool,
            gateway,
        })
    }

    pub fn interaction_log(&self) -> SqliteInteractionLog {
        SqliteInteractionLog::new(self.db_pool.clone())
    }

    pub fn actor_settings(&self) -> SqliteActorSettings {
        SqliteActorSettings::new(self.db_pool.clone())
    }
}
