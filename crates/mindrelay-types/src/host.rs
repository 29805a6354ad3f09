//! Records read from, and signals exchanged with, the game host.
//!
//! The host (server runtime, plugin registry, command dispatcher) is an
//! external collaborator. These are the plain-data views the bridge needs
//! to build model context and to observe command outcomes.

use serde::{Deserialize, Serialize};

use crate::actor::{ActorId, Position};

/// Server-wide vitals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerVitals {
    pub name: String,
    /// Short game version (e.g. "1.20.4").
    pub version: String,
    /// Full server implementation version string.
    pub full_version: String,
    pub motd: String,
    pub max_players: u32,
    pub online_players: u32,
    /// Ticks per second over the last minute; 20.0 is nominal.
    pub tps: f64,
    pub used_memory_mb: u64,
    pub max_memory_mb: u64,
    /// Whether the server authenticates accounts online.
    pub online_mode: bool,
    pub port: u16,
}

/// A sub-command a plugin registers with the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginCommand {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub usage: Option<String>,
    pub permission: Option<String>,
}

/// One entry of the installed-plugin inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub enabled: bool,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub commands: Vec<PluginCommand>,
}

/// An item stack held by an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub kind: String,
    pub amount: u32,
}

/// Play statistics. Missing values render as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayStatistics {
    pub play_minutes: u64,
    pub deaths: u64,
    pub mob_kills: u64,
}

/// Live attributes of the requesting actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorProfile {
    pub id: ActorId,
    pub name: String,
    pub health: f64,
    pub max_health: f64,
    /// Hunger/stamina analogue, 0..=20.
    pub food_level: u32,
    pub experience_level: u32,
    pub gamemode: String,
    pub operator: bool,
    pub flying: bool,
    pub ping_ms: u32,
    pub position: Position,
    pub world_environment: String,
    pub biome: String,
    pub main_hand: Option<ItemStack>,
    pub armor: Vec<String>,
    pub statistics: PlayStatistics,
}

/// Key vitals of a connected actor for the roster section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSummary {
    pub id: ActorId,
    pub name: String,
    pub health: f64,
    pub gamemode: String,
    pub position: Position,
    pub ping_ms: u32,
}

/// An active world/zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldInfo {
    pub name: String,
    pub environment: String,
    /// Time of day in ticks, 0..24000.
    pub time: u64,
    pub storm: bool,
    pub player_count: u32,
}

impl WorldInfo {
    /// Last tick of daylight.
    pub const DUSK: u64 = 12_000;

    pub fn is_day(&self) -> bool {
        self.time % 24_000 <= Self::DUSK
    }
}

/// Who a command is dispatched as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "actor", rename_all = "snake_case")]
pub enum Executor {
    /// The privileged server console.
    Console,
    /// The actor's own permission set.
    Actor(ActorId),
}

/// What the host tells us right after a dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    /// The dispatcher's own acceptance signal.
    pub accepted: bool,
    /// An explicit failure reported by the command handler, when the host
    /// is able to surface one.
    pub reported_error: Option<String>,
}

impl DispatchReport {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            reported_error: None,
        }
    }

    pub fn rejected() -> Self {
        Self {
            accepted: false,
            reported_error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reported_error: Some(error.into()),
        }
    }
}

/// A transient on-screen or chat notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    Chat { text: String },
    Title { title: String, subtitle: String },
    ActionBar { text: String },
}
