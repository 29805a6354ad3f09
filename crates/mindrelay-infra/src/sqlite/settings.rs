//! SQLite implementation of the per-actor enable flag.

use chrono::Utc;
use mindrelay_core::repository::settings::ActorSettingsRepository;
use mindrelay_types::actor::ActorId;
use mindrelay_types::error::RepositoryError;

use super::pool::DatabasePool;

#[derive(Clone)]
pub struct SqliteActorSettings {
    pool: DatabasePool,
}

impl SqliteActorSettings {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl ActorSettingsRepository for SqliteActorSettings {
    async fn is_enabled(&self, actor: &ActorId) -> Result<Option<bool>, RepositoryError> {
        let row: Option<(bool,)> =
            sqlx::query_as("SELECT enabled FROM actor_settings WHERE actor_id = ?")
                .bind(actor.to_string())
                .fetch_optional(&self.pool.reader)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(row.map(|(enabled,)| enabled))
    }

    async fn set_enabled(&self, actor: &ActorId, enabled: bool) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO actor_settings (actor_id, enabled, updated_at)
               VALUES (?, ?, ?)
               ON CONFLICT (actor_id) DO UPDATE SET enabled = excluded.enabled, updated_at = excluded.updated_at"#,
        )
        .bind(actor.to_string())
        .bind(enabled)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::database_url;

    async fn settings() -> SqliteActorSettings {
        let dir = tempfile::tempdir().unwrap();
        let url = database_url(dir.path());
        std::mem::forget(dir);
        SqliteActorSettings::new(DatabasePool::new(&url).await.unwrap())
    }

    #[tokio::test]
    async fn test_unset_actor_reads_none() {
        let settings = settings().await;
        assert_eq!(settings.is_enabled(&ActorId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_toggles_flag() {
        let settings = settings().await;
        let bob = ActorId::new();

        settings.set_enabled(&bob, true).await.unwrap();
        assert_eq!(settings.is_enabled(&bob).await.unwrap(), Some(true));

        settings.set_enabled(&bob, false).await.unwrap();
        assert_eq!(settings.is_enabled(&bob).await.unwrap(), Some(false));

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM actor_settings")
            .fetch_one(&settings.pool.reader)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }
}
