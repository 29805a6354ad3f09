//! SQLite interaction log.
//!
//! Implements `InteractionLog` from `mindrelay-core`. Rows are append-only;
//! timestamps are stored as RFC 3339 text.

use chrono::{DateTime, Utc};
use mindrelay_core::repository::interaction::InteractionLog;
use mindrelay_types::actor::ActorId;
use mindrelay_types::error::RepositoryError;
use mindrelay_types::interaction::Interaction;
use sqlx::Row;

use super::pool::DatabasePool;

#[derive(Clone)]
pub struct SqliteInteractionLog {
    pool: DatabasePool,
}

impl SqliteInteractionLog {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct InteractionRow {
    actor_id: String,
    request: String,
    response: String,
    created_at: String,
}

impl InteractionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            actor_id: row.try_get("actor_id")?,
            request: row.try_get("request")?,
            response: row.try_get("response")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_interaction(self) -> Result<Interaction, RepositoryError> {
        let actor = self
            .actor_id
            .parse::<ActorId>()
            .map_err(|e| RepositoryError::Query(format!("invalid actor_id: {e}")))?;
        let timestamp = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))?;
        Ok(Interaction {
            actor,
            request: self.request,
            response: self.response,
            timestamp,
        })
    }
}

impl InteractionLog for SqliteInteractionLog {
    async fn save_interaction(
        &self,
        actor: &ActorId,
        request: &str,
        response: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO interaction_log (actor_id, request, response, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(actor.to_string())
        .bind(request)
        .bind(response)
        .bind(timestamp.to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(())
    }

    async fn recent_interactions(
        &self,
        actor: &ActorId,
        limit: u32,
    ) -> Result<Vec<Interaction>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT actor_id, request, response, created_at FROM interaction_log \
             WHERE actor_id = ? ORDER BY id DESC LIMIT ?",
        )
        .bind(actor.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                InteractionRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_interaction()
            })
            .collect()
    }
}
