//! Per-actor enable flag port.

use mindrelay_types::actor::ActorId;
use mindrelay_types::error::RepositoryError;

pub trait ActorSettingsRepository: Send + Sync {
    /// `None` when the actor has never toggled the assistant.
    fn is_enabled(
        &self,
        actor: &ActorId,
    ) -> impl std::future::Future<Output = Result<Option<bool>, RepositoryError>> + Send;

    /// Insert or update the flag.
    fn set_enabled(
        &self,
        actor: &ActorId,
        enabled: bool,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
