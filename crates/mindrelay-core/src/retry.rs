//! In-flight retry counters keyed by (actor, original request text).

use dashmap::DashMap;
use mindrelay_types::actor::ActorId;

/// Failed classifications allowed per request before giving up.
pub const MAX_ATTEMPTS: u32 = 3;

/// What to do after a failure was counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Ask the model to correct itself; carries the new attempt count.
    Retry(u32),
    /// Ceiling reached; the entry has been removed.
    Exhausted,
}

#[derive(Debug, Default)]
pub struct RetryTable {
    attempts: DashMap<(ActorId, String), u32>,
}

impl RetryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one failed classification for the request.
    ///
    /// The counter never exceeds `MAX_ATTEMPTS`: the increment that reaches
    /// it removes the entry and reports `Exhausted`.
    pub fn record_failure(&self, actor: ActorId, request: &str) -> RetryDecision {
        let key = (actor, request.to_string());
        let count = {
            let mut entry = self.attempts.entry(key.clone()).or_insert(0);
            *entry = (*entry + 1).min(MAX_ATTEMPTS);
            *entry
        };
        if count >= MAX_ATTEMPTS {
            self.attempts.remove(&key);
            RetryDecision::Exhausted
        } else {
            RetryDecision::Retry(count)
        }
    }

    /// Drop the entry after a success or an abandoned request.
    pub fn clear(&self, actor: ActorId, request: &str) {
        self.attempts.remove(&(actor, request.to_string()));
    }

    pub fn attempts(&self, actor: ActorId, request: &str) -> u32 {
        self.attempts
            .get(&(actor, request.to_string()))
            .map(|r| *r)
            .unwrap_or(0)
    }

    /// Drop every entry belonging to `actor` (logout).
    pub fn evict_actor(&self, actor: &ActorId) {
        self.attempts.retain(|(owner, _), _| owner != actor);
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    pub fn clear_all(&self) {
        self.attempts.clear();
    }
}
