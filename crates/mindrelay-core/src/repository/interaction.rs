//! Interaction log port.
//!
//! Every completed model round-trip is appended here. Writes are
//! best-effort: the orchestrator logs a failure and carries on.

use chrono::{DateTime, Utc};
use mindrelay_types::actor::ActorId;
use mindrelay_types::error::RepositoryError;
use mindrelay_types::interaction::Interaction;

/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait InteractionLog: Send + Sync {
    fn save_interaction(
        &self,
        actor: &ActorId,
        request: &str,
        response: &str,
        timestamp: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Most recent interactions first.
    fn recent_interactions(
        &self,
        actor: &ActorId,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<Interaction>, RepositoryError>> + Send;
}
