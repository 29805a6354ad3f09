//! Read-through cache of the per-actor enable flag.
//!
//! The flag is consulted on every chat message, so lookups hit a `DashMap`
//! first and only fall back to the repository on a miss. Writes update the
//! cache before the repository; a failed write is reported to the caller
//! but the cached value stays.

use dashmap::DashMap;
use mindrelay_types::actor::ActorId;
use mindrelay_types::error::RepositoryError;

use crate::repository::settings::ActorSettingsRepository;

pub struct ToggleCache<S: ActorSettingsRepository> {
    repo: S,
    cache: DashMap<ActorId, bool>,
}

impl<S: ActorSettingsRepository> ToggleCache<S> {
    pub fn new(repo: S) -> Self {
        Self {
            repo,
            cache: DashMap::new(),
        }
    }

    /// Whether the assistant is enabled for `actor`. Unknown actors are
    /// disabled; a repository error counts as disabled and is not cached.
    pub async fn is_enabled(&self, actor: &ActorId) -> bool {
        if let Some(enabled) = self.cache.get(actor).map(|r| *r) {
            return enabled;
        }
        match self.repo.is_enabled(actor).await {
            Ok(stored) => {
                let enabled = stored.unwrap_or(false);
                self.cache.insert(*actor, enabled);
                enabled
            }
            Err(e) => {
                tracing::warn!(actor = %actor, error = %e, "could not read enable flag");
                false
            }
        }
    }

    pub async fn set_enabled(&self, actor: &ActorId, enabled: bool) -> Result<(), RepositoryError> {
        self.cache.insert(*actor, enabled);
        self.repo.set_enabled(actor, enabled).await
    }

    /// Forget the cached flag (logout).
    pub fn evict(&self, actor: &ActorId) {
        self.cache.remove(actor);
    }

    pub fn repository(&self) -> &S {
        &self.repo
    }
}
