//! SQLite storage for the relay: one file, two tables.
//!
//! `interaction_log` gets one append per model round-trip and is read back
//! newest-first by `mrelay history` through the `(actor_id, id DESC)` index.
//! `actor_settings` holds the per-actor enable flag; it is written by the
//! `/gpt on|off` path and `mrelay toggle`, and read on cache misses.
//!
//! Writes go through a single connection so inserts and upserts never
//! contend for the SQLite write lock; reads use a small read-only pool.
//! The file runs in WAL mode so a history read never blocks an insert.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Handles to `mindrelay.db`.
///
/// - `reader`: read-only, up to 4 connections; history pages and flag lookups.
/// - `writer`: exactly one connection; interaction inserts and flag upserts.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open or create the relay database and bring both tables up to date.
    ///
    /// The read-only pool is opened after migrations so its connections
    /// never see a half-created schema.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let relay_db = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .create_if_missing(true);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(relay_db.clone())
            .await?;

        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(relay_db.read_only(true))
            .await?;

        tracing::debug!(url = database_url, "database pool ready");
        Ok(Self { reader, writer })
    }

    /// Flush and close both pools; called once when the host stops.
    pub async fn close(&self) {
        self.reader.close().await;
        self.writer.close().await;
    }
}

/// `sqlite://{data_dir}/mindrelay.db`.
pub fn database_url(data_dir: &Path) -> String {
    format!("sqlite://{}", data_dir.join("mindrelay.db").display())
}
