//! Context snapshot sent to the model with every request.
//!
//! Sections, in order: server vitals, plugin inventory, the requesting
//! actor, the online roster, worlds, and the learned-command ledger. The
//! text is rebuilt on every request; only the plugin inventory is cached,
//! and only as a fallback for when the host cannot list plugins.

use std::fmt::Write as _;
use std::sync::Arc;

use arc_swap::ArcSwap;
use mindrelay_types::actor::ActorId;
use mindrelay_types::error::HostError;
use mindrelay_types::host::{ActorProfile, ActorSummary, PluginInfo, ServerVitals, WorldInfo};

use crate::host::main_thread::MainThreadHandle;
use crate::ledger::CommandFeedbackLedger;

/// Name used in the prompt when the actor's profile is unavailable.
const UNKNOWN_ACTOR: &str = "Player";

/// The rendered context plus the actor's display name for the prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSnapshot {
    pub actor_name: String,
    pub text: String,
}

/// Everything read from the host in one main-thread job.
struct HostState {
    vitals: ServerVitals,
    plugins: Result<Vec<PluginInfo>, HostError>,
    profile: Option<ActorProfile>,
    roster: Vec<ActorSummary>,
    worlds: Vec<WorldInfo>,
}

pub struct ContextSnapshotBuilder {
    host: MainThreadHandle,
    ledger: Arc<CommandFeedbackLedger>,
    plugins: ArcSwap<Vec<PluginInfo>>,
}

impl ContextSnapshotBuilder {
    pub fn new(host: MainThreadHandle, ledger: Arc<CommandFeedbackLedger>) -> Self {
        Self {
            host,
            ledger,
            plugins: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Gather host state on the main thread and render it.
    ///
    /// Fails only when the main thread is unreachable.
    pub async fn build(&self, actor: ActorId) -> Result<ContextSnapshot, HostError> {
        let state = self
            .host
            .call(move |host| HostState {
                vitals: host.vitals(),
                plugins: host.plugins(),
                profile: host.profile(&actor),
                roster: host.roster(),
                worlds: host.worlds(),
            })
            .await?;

        let plugins = self.refresh_plugins(state.plugins);
        let actor_name = state
            .profile
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| UNKNOWN_ACTOR.to_string());

        let sections = [
            render_vitals(&state.vitals),
            render_plugins(&plugins),
            render_actor(state.profile.as_ref()),
            render_roster(&state.roster),
            render_worlds(&state.worlds),
            self.ledger.render(),
        ];

        Ok(ContextSnapshot {
            actor_name,
            text: sections.join("\n"),
        })
    }

    fn refresh_plugins(&self, fresh: Result<Vec<PluginInfo>, HostError>) -> Arc<Vec<PluginInfo>> {
        match fresh {
            Ok(list) => {
                let list = Arc::new(list);
                self.plugins.store(Arc::clone(&list));
                list
            }
            Err(e) => {
                tracing::warn!(error = %e, "plugin inventory refresh failed; using cached list");
                self.plugins.load_full()
            }
        }
    }
}

pub fn render_vitals(v: &ServerVitals) -> String {
    format!(
        "=== SERVER ===\n\
         Name: {}\n\
         Version: {}\n\
         Full version: {}\n\
         MOTD: {}\n\
         Max players: {}\n\
         Online: {}\n\
         TPS: {:.2}\n\
         Memory: {}MB / {}MB\n\
         Online mode: {}\n\
         Port: {}\n",
        v.name,
        v.version,
        v.full_version,
        v.motd,
        v.max_players,
        v.online_players,
        v.tps,
        v.used_memory_mb,
        v.max_memory_mb,
        v.online_mode,
        v.port
    )
}

pub fn render_plugins(plugins: &[PluginInfo]) -> String {
    let mut out = format!("=== PLUGINS ({}) ===\n", plugins.len());
    out.push_str(
        "Only the plugins listed here are installed. Treat any plugin or plugin command \
         not listed here as NOT installed and do not use it.\n",
    );
    for p in plugins {
        let status = if p.enabled { "[ON]" } else { "[OFF]" };
        let _ = write!(out, "{status} {} v{}", p.name, p.version);
        if !p.authors.is_empty() {
            let _ = write!(out, " by {}", p.authors.join(", "));
        }
        out.push('\n');
        for cmd in &p.commands {
            let _ = write!(out, "  /{}", cmd.name);
            if !cmd.aliases.is_empty() {
                let _ = write!(out, " (aliases: {})", cmd.aliases.join(", "));
            }
            if let Some(usage) = &cmd.usage {
                let _ = write!(out, " usage: {usage}");
            }
            if let Some(permission) = &cmd.permission {
                let _ = write!(out, " permission: {permission}");
            }
            out.push('\n');
        }
    }
    out
}

pub fn render_actor(profile: Option<&ActorProfile>) -> String {
    let Some(p) = profile else {
        return format!("=== CURRENT PLAYER: {UNKNOWN_ACTOR} ===\nNo live data available.\n");
    };
    let (x, y, z) = p.position.block();
    let main_hand = p
        .main_hand
        .as_ref()
        .map(|item| format!("{} x{}", item.kind, item.amount))
        .unwrap_or_else(|| "AIR x0".to_string());
    let armor = if p.armor.is_empty() {
        "None".to_string()
    } else {
        p.armor.join(", ")
    };

    format!(
        "=== CURRENT PLAYER: {name} ===\n\
         UUID: {id}\n\
         Health: {health}/{max_health}\n\
         Food: {food}/20\n\
         XP level: {level}\n\
         Gamemode: {gamemode}\n\
         Op: {op}\n\
         Flying: {flying}\n\
         Ping: {ping}ms\n\
         \n\
         === LOCATION ===\n\
         World: {world} ({env})\n\
         Coordinates: X={x}, Y={y}, Z={z}\n\
         Biome: {biome}\n\
         \n\
         === INVENTORY ===\n\
         Main hand: {main_hand}\n\
         Armor: {armor}\n\
         \n\
         === STATISTICS ===\n\
         Time played: {minutes} minutes\n\
         Deaths: {deaths}\n\
         Mobs killed: {kills}\n",
        name = p.name,
        id = p.id,
        health = p.health as i64,
        max_health = p.max_health as i64,
        food = p.food_level,
        level = p.experience_level,
        gamemode = p.gamemode,
        op = p.operator,
        flying = p.flying,
        ping = p.ping_ms,
        world = p.position.world,
        env = p.world_environment,
        biome = p.biome,
        minutes = p.statistics.play_minutes,
        deaths = p.statistics.deaths,
        kills = p.statistics.mob_kills,
    )
}

pub fn render_roster(roster: &[ActorSummary]) -> String {
    if roster.is_empty() {
        return "=== NO PLAYERS ONLINE ===\n".to_string();
    }
    let mut out = format!("=== ALL ONLINE PLAYERS ({}) ===\n", roster.len());
    for a in roster {
        let (x, y, z) = a.position.block();
        let _ = writeln!(
            out,
            "{}: Health={} | {} | {} {},{},{} | Ping={}ms",
            a.name, a.health as i64, a.gamemode, a.position.world, x, y, z, a.ping_ms
        );
    }
    out
}

pub fn render_worlds(worlds: &[WorldInfo]) -> String {
    let mut out = format!("=== WORLDS ({}) ===\n", worlds.len());
    for w in worlds {
        let _ = writeln!(
            out,
            "{}: {} | {} | {} | Players: {}",
            w.name,
            w.environment,
            if w.is_day() { "DAY" } else { "NIGHT" },
            if w.storm { "STORM" } else { "CLEAR" },
            w.player_count
        );
    }
    out
}
