//! Durable record of a completed model round-trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actor::ActorId;

/// One request/response pair written to the interaction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub actor: ActorId,
    pub request: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}
