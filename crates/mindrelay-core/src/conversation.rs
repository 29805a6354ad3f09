//! Bounded per-actor conversation history.
//!
//! `ConversationStore` keeps the last `HISTORY_LIMIT` turns of every actor
//! in a `DashMap`. All reads return cloned values -- never hold a `DashMap`
//! guard across await.

use std::collections::VecDeque;

use dashmap::DashMap;
use mindrelay_types::actor::ActorId;
use mindrelay_types::llm::Message;

/// Maximum turns kept per actor; the oldest is evicted first.
pub const HISTORY_LIMIT: usize = 20;

#[derive(Debug, Default)]
pub struct ConversationStore {
    histories: DashMap<ActorId, VecDeque<Message>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn, evicting the oldest turns beyond the limit.
    pub fn append(&self, actor: ActorId, message: Message) {
        let mut history = self.histories.entry(actor).or_default();
        history.push_back(message);
        while history.len() > HISTORY_LIMIT {
            history.pop_front();
        }
    }

    /// Cloned copy of the actor's history, oldest first.
    pub fn history(&self, actor: &ActorId) -> Vec<Message> {
        self.histories
            .get(actor)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The last `n` turns, oldest first.
    pub fn tail(&self, actor: &ActorId, n: usize) -> Vec<Message> {
        self.histories
            .get(actor)
            .map(|h| {
                let skip = h.len().saturating_sub(n);
                h.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self, actor: &ActorId) -> usize {
        self.histories.get(actor).map(|h| h.len()).unwrap_or(0)
    }

    /// Drop the actor's history (logout).
    pub fn evict(&self, actor: &ActorId) {
        self.histories.remove(actor);
    }

    pub fn clear(&self) {
        self.histories.clear();
    }
}
