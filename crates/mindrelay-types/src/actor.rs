//! Actor identity and observable state.
//!
//! An actor is a connected player/session that can trigger requests. Its
//! identity is a stable UUID assigned by the host; the bridge never creates
//! actors, it only refers to them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable unique identifier of an actor, as assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub Uuid);

impl ActorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ActorId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// A point in a named world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }

    /// Euclidean distance to `other`. Positions in different worlds are
    /// infinitely far apart.
    pub fn distance(&self, other: &Position) -> f64 {
        if self.world != other.world {
            return f64::INFINITY;
        }
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Block coordinates (floored), as shown to players.
    pub fn block(&self) -> (i64, i64, i64) {
        (
            self.x.floor() as i64,
            self.y.floor() as i64,
            self.z.floor() as i64,
        )
    }
}

/// Observable actor attributes captured immediately before and shortly
/// after a command dispatch.
///
/// Used to infer whether a dispatch the host did not acknowledge actually
/// had an effect on the requesting actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub health: f64,
    pub position: Position,
    pub gamemode: String,
    pub experience_level: u32,
}

impl StateSnapshot {
    /// Maximum position delta (in blocks) that still counts as "no movement".
    pub const POSITION_THRESHOLD: f64 = 1.0;

    /// Whether `after` differs from `self` in a way that shows the command
    /// did something.
    pub fn changed_meaningfully(&self, after: &StateSnapshot) -> bool {
        self.health != after.health
            || self.position.distance(&after.position) > Self::POSITION_THRESHOLD
            || self.gamemode != after.gamemode
            || self.experience_level != after.experience_level
    }
}
