//! Console reference host: a small simulated game server.
//!
//! The world understands a handful of vanilla-like commands (`gamemode`,
//! `tp`, `effect`, `xp`, `kill`, `give`, `time`, `weather`, `say`). Like a
//! real server, failures are only written to the server log; the dispatch
//! report just says the command was not accepted. Every log line goes
//! through the [`LogTap`], which is what the keyword probe listens to.
//!
//! Everyone who joins the console world is an operator.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use console::style;
use mindrelay_core::host::GameHost;
use mindrelay_core::host::probe::LogTap;
use mindrelay_types::actor::{ActorId, Position, StateSnapshot};
use mindrelay_types::error::HostError;
use mindrelay_types::host::{
    ActorProfile, ActorSummary, DispatchReport, Executor, ItemStack, Notice, PlayStatistics,
    PluginCommand, PluginInfo, ServerVitals, WorldInfo,
};
use uuid::Uuid;

pub const GAME_VERSION: &str = "1.20.4";
const MAX_HEALTH: f64 = 20.0;
const MAX_FOOD: u32 = 20;
const MAX_PLAYERS: u32 = 20;

const UNKNOWN_COMMAND: &str = "Unknown or incomplete command, see below for error";
const NO_PLAYER: &str = "No player was found";

const ITEMS: &[&str] = &[
    "arrow",
    "bow",
    "bread",
    "cooked_beef",
    "diamond",
    "diamond_axe",
    "diamond_pickaxe",
    "diamond_sword",
    "elytra",
    "ender_pearl",
    "golden_apple",
    "gold_ingot",
    "iron_ingot",
    "oak_log",
    "stone",
    "torch",
];

const EFFECTS: &[&str] = &[
    "fire_resistance",
    "glowing",
    "haste",
    "instant_health",
    "invisibility",
    "jump_boost",
    "levitation",
    "night_vision",
    "regeneration",
    "resistance",
    "saturation",
    "slowness",
    "speed",
    "strength",
    "water_breathing",
];

/// Offline-mode style identity: the same name always maps to the same id.
pub fn actor_id(name: &str) -> ActorId {
    ActorId(Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        format!("OfflinePlayer:{name}").as_bytes(),
    ))
}

fn spawn_point() -> Position {
    Position::new("world", 0.5, 64.0, 0.5)
}

#[derive(Debug, Clone)]
struct SimActor {
    id: ActorId,
    name: String,
    online: bool,
    joined: Instant,
    health: f64,
    food: u32,
    level: u32,
    points: u32,
    gamemode: String,
    position: Position,
    effects: Vec<String>,
    inventory: Vec<ItemStack>,
    deaths: u64,
}

impl SimActor {
    fn new(name: &str) -> Self {
        Self {
            id: actor_id(name),
            name: name.to_string(),
            online: true,
            joined: Instant::now(),
            health: MAX_HEALTH,
            food: MAX_FOOD,
            level: 0,
            points: 0,
            gamemode: "SURVIVAL".to_string(),
            position: spawn_point(),
            effects: Vec::new(),
            inventory: Vec::new(),
            deaths: 0,
        }
    }

    fn respawn(&mut self) {
        self.health = MAX_HEALTH;
        self.food = MAX_FOOD;
        self.position = spawn_point();
        self.effects.clear();
        self.deaths += 1;
    }
}

#[derive(Debug)]
pub struct WorldState {
    actors: Vec<SimActor>,
    time: u64,
    storm: bool,
}

impl Default for WorldState {
    fn default() -> Self {
        Self {
            actors: Vec::new(),
            time: 1000,
            storm: false,
        }
    }
}

/// World state shared between the host (main thread) and the console
/// reader, which handles joins and quits.
#[derive(Debug, Clone, Default)]
pub struct SharedWorld(Arc<Mutex<WorldState>>);

impl SharedWorld {
    fn lock(&self) -> MutexGuard<'_, WorldState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bring `name` online, creating the actor on first join.
    pub fn join(&self, name: &str) -> ActorId {
        let mut world = self.lock();
        if let Some(actor) = world.actors.iter_mut().find(|a| a.name == name) {
            actor.online = true;
            actor.joined = Instant::now();
            return actor.id;
        }
        let actor = SimActor::new(name);
        let id = actor.id;
        world.actors.push(actor);
        id
    }

    /// Take `name` offline. Returns its id if it was online.
    pub fn quit(&self, name: &str) -> Option<ActorId> {
        let mut world = self.lock();
        let actor = world
            .actors
            .iter_mut()
            .find(|a| a.online && a.name.eq_ignore_ascii_case(name))?;
        actor.online = false;
        Some(actor.id)
    }

    /// Id and canonical name of an online actor.
    pub fn online(&self, name: &str) -> Option<(ActorId, String)> {
        self.lock()
            .actors
            .iter()
            .find(|a| a.online && a.name.eq_ignore_ascii_case(name))
            .map(|a| (a.id, a.name.clone()))
    }

    pub fn online_names(&self) -> Vec<String> {
        self.lock()
            .actors
            .iter()
            .filter(|a| a.online)
            .map(|a| a.name.clone())
            .collect()
    }

    fn name_of(&self, id: &ActorId) -> String {
        self.lock()
            .actors
            .iter()
            .find(|a| a.id == *id)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

type CommandResult = Result<String, String>;

impl WorldState {
    fn online(&self) -> impl Iterator<Item = (usize, &SimActor)> {
        self.actors.iter().enumerate().filter(|(_, a)| a.online)
    }

    fn get(&self, id: &ActorId) -> Option<&SimActor> {
        self.actors.iter().find(|a| a.id == *id && a.online)
    }

    fn executor_index(&self, executor: Executor) -> Option<usize> {
        match executor {
            Executor::Console => None,
            Executor::Actor(id) => self.online().find(|(_, a)| a.id == id).map(|(i, _)| i),
        }
    }

    /// Resolve a player argument; `None` means "the executor".
    fn targets(&self, executor: Executor, token: Option<&str>) -> Result<Vec<usize>, String> {
        let found: Vec<usize> = match token {
            None | Some("@s") => self.executor_index(executor).into_iter().collect(),
            Some("@a") => self.online().map(|(i, _)| i).collect(),
            Some("@p") | Some("@r") => self
                .executor_index(executor)
                .or_else(|| self.online().map(|(i, _)| i).next())
                .into_iter()
                .collect(),
            Some(name) => self
                .online()
                .filter(|(_, a)| a.name.eq_ignore_ascii_case(name))
                .map(|(i, _)| i)
                .collect(),
        };
        if found.is_empty() {
            Err(NO_PLAYER.to_string())
        } else {
            Ok(found)
        }
    }

    fn names(&self, indices: &[usize]) -> String {
        match indices {
            [one] => self.actors[*one].name.clone(),
            many => format!("{} players", many.len()),
        }
    }

    /// Run one command line. `Ok` and `Err` both carry the log line.
    fn execute(&mut self, executor: Executor, line: &str) -> CommandResult {
        let mut tokens = line.split_whitespace();
        let Some(head) = tokens.next() else {
            return Err(UNKNOWN_COMMAND.to_string());
        };
        let args: Vec<&str> = tokens.collect();
        let name = head.strip_prefix("minecraft:").unwrap_or(head).to_lowercase();
        match name.as_str() {
            "gamemode" => self.gamemode(executor, &args),
            "tp" | "teleport" => self.teleport(executor, &args),
            "effect" => self.effect(executor, &args),
            "xp" | "experience" => self.experience(executor, &args),
            "kill" => self.kill(executor, &args),
            "give" => self.give(executor, &args),
            "time" => self.set_time(&args),
            "weather" => self.weather(&args),
            "say" => self.say(executor, &args),
            _ => Err(UNKNOWN_COMMAND.to_string()),
        }
    }

    fn gamemode(&mut self, executor: Executor, args: &[&str]) -> CommandResult {
        let Some(mode) = args.first() else {
            return Err("Incorrect argument for command: /gamemode <mode> [target]".to_string());
        };
        let (mode, label) = match mode.to_lowercase().as_str() {
            "survival" | "s" | "0" => ("SURVIVAL", "Survival Mode"),
            "creative" | "c" | "1" => ("CREATIVE", "Creative Mode"),
            "adventure" | "a" | "2" => ("ADVENTURE", "Adventure Mode"),
            "spectator" | "sp" | "3" => ("SPECTATOR", "Spectator Mode"),
            other => return Err(format!("Invalid game mode: {other}")),
        };
        let targets = self.targets(executor, args.get(1).copied())?;
        for &i in &targets {
            self.actors[i].gamemode = mode.to_string();
        }
        Ok(format!("Set {}'s game mode to {label}", self.names(&targets)))
    }

    fn teleport(&mut self, executor: Executor, args: &[&str]) -> CommandResult {
        let (targets, rest) = match args.len() {
            1 | 3 => (self.targets(executor, None)?, args),
            2 | 4 => (self.targets(executor, Some(args[0]))?, &args[1..]),
            _ => {
                return Err(
                    "Incorrect argument for command: /tp [target] <destination|x y z>".to_string(),
                );
            }
        };
        let destination = match rest {
            [player] => {
                let to = self.targets(executor, Some(*player))?;
                Some(self.actors[to[0]].position.clone())
            }
            _ => None,
        };
        for &i in &targets {
            let position = match (&destination, rest) {
                (Some(position), _) => position.clone(),
                (None, [x, y, z]) => {
                    let base = &self.actors[i].position;
                    Position::new(
                        base.world.clone(),
                        coordinate(x, base.x)?,
                        coordinate(y, base.y)?,
                        coordinate(z, base.z)?,
                    )
                }
                _ => return Err(UNKNOWN_COMMAND.to_string()),
            };
            self.actors[i].position = position;
        }
        let first = &self.actors[targets[0]].position;
        Ok(format!(
            "Teleported {} to {:.1}, {:.1}, {:.1}",
            self.names(&targets),
            first.x,
            first.y,
            first.z
        ))
    }

    fn effect(&mut self, executor: Executor, args: &[&str]) -> CommandResult {
        match args {
            ["clear", rest @ ..] => {
                let targets = self.targets(executor, rest.first().copied())?;
                for &i in &targets {
                    self.actors[i].effects.clear();
                }
                Ok(format!("Removed every effect from {}", self.names(&targets)))
            }
            ["give", target, effect, rest @ ..] => {
                let effect = effect.strip_prefix("minecraft:").unwrap_or(*effect).to_lowercase();
                if !EFFECTS.contains(&effect.as_str()) {
                    return Err(format!("Unknown effect: minecraft:{effect}"));
                }
                // Duration is accepted for syntax only; effects are instant here.
                if let Some(seconds) = rest.first() {
                    integer(seconds)?;
                }
                let amplifier = rest.get(1).map(|a| integer(a)).transpose()?.unwrap_or(0);
                let targets = self.targets(executor, Some(*target))?;
                for &i in &targets {
                    let actor = &mut self.actors[i];
                    match effect.as_str() {
                        "instant_health" => {
                            actor.health =
                                (actor.health + 4.0 * f64::from(amplifier + 1)).min(MAX_HEALTH);
                        }
                        "regeneration" => actor.health = MAX_HEALTH,
                        "saturation" => actor.food = MAX_FOOD,
                        _ => {}
                    }
                    if !actor.effects.contains(&effect) {
                        actor.effects.push(effect.clone());
                    }
                }
                Ok(format!(
                    "Applied effect {} to {}",
                    display_name(&effect),
                    self.names(&targets)
                ))
            }
            _ => Err(
                "Incorrect argument for command: /effect <give|clear> <target> [effect]".to_string(),
            ),
        }
    }

    fn experience(&mut self, executor: Executor, args: &[&str]) -> CommandResult {
        let [op @ ("add" | "set"), target, amount, rest @ ..] = args else {
            return Err(
                "Incorrect argument for command: /xp <add|set> <target> <amount> [levels|points]"
                    .to_string(),
            );
        };
        let amount = integer(amount)?;
        let levels = match rest.first().copied() {
            None | Some("points") => false,
            Some("levels") => true,
            Some(other) => return Err(format!("Expected 'levels' or 'points', got '{other}'")),
        };
        let targets = self.targets(executor, Some(*target))?;
        for &i in &targets {
            let actor = &mut self.actors[i];
            let slot = if levels {
                &mut actor.level
            } else {
                &mut actor.points
            };
            *slot = if *op == "add" { *slot + amount } else { amount };
        }
        let unit = if levels { "experience levels" } else { "experience points" };
        Ok(match *op {
            "add" => format!("Gave {amount} {unit} to {}", self.names(&targets)),
            _ => format!("Set {amount} {unit} on {}", self.names(&targets)),
        })
    }

    fn kill(&mut self, executor: Executor, args: &[&str]) -> CommandResult {
        let targets = self.targets(executor, args.first().copied())?;
        for &i in &targets {
            self.actors[i].respawn();
        }
        Ok(format!("Killed {}", self.names(&targets)))
    }

    fn give(&mut self, executor: Executor, args: &[&str]) -> CommandResult {
        let [target, item, rest @ ..] = args else {
            return Err("Incorrect argument for command: /give <target> <item> [count]".to_string());
        };
        let item = item.strip_prefix("minecraft:").unwrap_or(*item).to_lowercase();
        if !ITEMS.contains(&item.as_str()) {
            return Err(format!("Unknown item 'minecraft:{item}'"));
        }
        let count = rest.first().map(|c| integer(c)).transpose()?.unwrap_or(1);
        if count == 0 {
            return Err("Invalid count: must be at least 1".to_string());
        }
        let targets = self.targets(executor, Some(*target))?;
        for &i in &targets {
            let inventory = &mut self.actors[i].inventory;
            match inventory.iter_mut().find(|s| s.kind == item) {
                Some(stack) => stack.amount += count,
                None => inventory.push(ItemStack {
                    kind: item.clone(),
                    amount: count,
                }),
            }
        }
        Ok(format!(
            "Gave {count} [{}] to {}",
            display_name(&item),
            self.names(&targets)
        ))
    }

    fn set_time(&mut self, args: &[&str]) -> CommandResult {
        match args {
            ["set", value] => {
                self.time = match *value {
                    "day" => 1000,
                    "noon" => 6000,
                    "night" => 13000,
                    "midnight" => 18000,
                    n => u64::from(integer(n)?),
                } % 24_000;
                Ok(format!("Set the time to {}", self.time))
            }
            ["add", value] => {
                self.time = (self.time + u64::from(integer(value)?)) % 24_000;
                Ok(format!("Set the time to {}", self.time))
            }
            ["query", "daytime"] => Ok(format!("The time is {}", self.time)),
            _ => Err("Incorrect argument for command: /time <set|add|query> <value>".to_string()),
        }
    }

    fn weather(&mut self, args: &[&str]) -> CommandResult {
        let (storm, label) = match args.first().copied() {
            Some("clear") => (false, "clear"),
            Some("rain") => (true, "rain"),
            Some("thunder") => (true, "rain & thunder"),
            Some(other) => return Err(format!("Invalid weather type: {other}")),
            None => return Err("Incorrect argument for command: /weather <clear|rain|thunder>".to_string()),
        };
        if let Some(duration) = args.get(1) {
            integer(duration)?;
        }
        self.storm = storm;
        Ok(format!("Set the weather to {label}"))
    }

    fn say(&self, executor: Executor, args: &[&str]) -> CommandResult {
        if args.is_empty() {
            return Err("Incorrect argument for command: /say <message>".to_string());
        }
        let speaker = self
            .executor_index(executor)
            .map_or_else(|| "Server".to_string(), |i| self.actors[i].name.clone());
        Ok(format!("[{speaker}] {}", args.join(" ")))
    }
}

fn integer(token: &str) -> Result<u32, String> {
    token
        .parse()
        .map_err(|_| format!("Invalid integer '{token}'"))
}

/// `12.5`, `~` or `~-3` (relative to `base`).
fn coordinate(token: &str, base: f64) -> Result<f64, String> {
    let parse = |s: &str| {
        s.parse::<f64>()
            .map_err(|_| format!("Expected a coordinate, got '{token}'"))
    };
    match token.strip_prefix('~') {
        Some("") => Ok(base),
        Some(offset) => Ok(base + parse(offset)?),
        None => parse(token),
    }
}

/// `diamond_sword` -> `Diamond Sword`.
fn display_name(id: &str) -> String {
    id.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// The [`GameHost`] side of the console world. Owned by the main thread.
pub struct ConsoleHost {
    world: SharedWorld,
    tap: LogTap,
    started: Instant,
}

impl ConsoleHost {
    pub fn new(world: SharedWorld, tap: LogTap) -> Self {
        Self {
            world,
            tap,
            started: Instant::now(),
        }
    }

    fn log(&self, line: &str) {
        eprintln!("{} {line}", style("[server]").dim());
        self.tap.emit(line);
    }
}

impl GameHost for ConsoleHost {
    fn vitals(&self) -> ServerVitals {
        let online = self.world.lock().online().count() as u32;
        ServerVitals {
            name: "MindRelay Console".to_string(),
            version: GAME_VERSION.to_string(),
            full_version: format!(
                "mrelay {} (MC: {GAME_VERSION})",
                env!("CARGO_PKG_VERSION")
            ),
            motd: "A simulated server for mindrelay".to_string(),
            max_players: MAX_PLAYERS,
            online_players: online,
            tps: 20.0,
            used_memory_mb: 256 + 16 * u64::from(online),
            max_memory_mb: 2048,
            online_mode: false,
            port: 25565,
        }
    }

    fn plugins(&self) -> Result<Vec<PluginInfo>, HostError> {
        Ok(vec![PluginInfo {
            name: "MindRelay".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            enabled: true,
            authors: Vec::new(),
            commands: vec![PluginCommand {
                name: "gpt".to_string(),
                aliases: Vec::new(),
                usage: Some("/gpt <on|off|reload>".to_string()),
                permission: Some(mindrelay_core::host::ADMIN_PERMISSION.to_string()),
            }],
        }])
    }

    fn profile(&self, actor: &ActorId) -> Option<ActorProfile> {
        let world = self.world.lock();
        let a = world.get(actor)?;
        Some(ActorProfile {
            id: a.id,
            name: a.name.clone(),
            health: a.health,
            max_health: MAX_HEALTH,
            food_level: a.food,
            experience_level: a.level,
            gamemode: a.gamemode.clone(),
            operator: true,
            flying: a.gamemode == "CREATIVE" && a.position.y > 80.0,
            ping_ms: 0,
            position: a.position.clone(),
            world_environment: "NORMAL".to_string(),
            biome: "PLAINS".to_string(),
            main_hand: a.inventory.first().cloned(),
            armor: Vec::new(),
            statistics: PlayStatistics {
                play_minutes: a.joined.elapsed().as_secs() / 60,
                deaths: a.deaths,
                mob_kills: 0,
            },
        })
    }

    fn roster(&self) -> Vec<ActorSummary> {
        self.world
            .lock()
            .online()
            .map(|(_, a)| ActorSummary {
                id: a.id,
                name: a.name.clone(),
                health: a.health,
                gamemode: a.gamemode.clone(),
                position: a.position.clone(),
                ping_ms: 0,
            })
            .collect()
    }

    fn worlds(&self) -> Vec<WorldInfo> {
        let world = self.world.lock();
        let players = world.online().count() as u32;
        let uptime_ticks = self.started.elapsed().as_secs() * 20;
        vec![
            WorldInfo {
                name: "world".to_string(),
                environment: "NORMAL".to_string(),
                time: world.time,
                storm: world.storm,
                player_count: players,
            },
            WorldInfo {
                name: "world_nether".to_string(),
                environment: "NETHER".to_string(),
                time: uptime_ticks % 24_000,
                storm: false,
                player_count: 0,
            },
        ]
    }

    fn snapshot(&self, actor: &ActorId) -> Option<StateSnapshot> {
        let world = self.world.lock();
        let a = world.get(actor)?;
        Some(StateSnapshot {
            health: a.health,
            position: a.position.clone(),
            gamemode: a.gamemode.clone(),
            experience_level: a.level,
        })
    }

    fn is_online(&self, actor: &ActorId) -> bool {
        self.world.lock().get(actor).is_some()
    }

    fn has_permission(&self, actor: &ActorId, _permission: &str) -> bool {
        self.is_online(actor)
    }

    fn dispatch(&mut self, executor: Executor, command: &str) -> Result<DispatchReport, HostError> {
        let result = self.world.lock().execute(executor, command);
        tracing::debug!(?executor, command, ok = result.is_ok(), "console world dispatch");
        match result {
            Ok(line) => {
                self.log(&line);
                Ok(DispatchReport::accepted())
            }
            Err(line) => {
                self.log(&line);
                Ok(DispatchReport::rejected())
            }
        }
    }

    fn send_message(&mut self, actor: &ActorId, text: &str) {
        let name = self.world.name_of(actor);
        println!("{} {text}", style(format!("[to {name}]")).magenta());
    }

    fn send_notice(&mut self, actor: &ActorId, notice: &Notice) {
        let name = self.world.name_of(actor);
        let to = style(format!("[to {name}]")).magenta();
        match notice {
            Notice::Chat { text } => println!("{to} {text}"),
            Notice::Title { title, subtitle } => {
                println!("{to} {} {title} / {subtitle}", style("title").cyan());
            }
            Notice::ActionBar { text } => println!("{to} {} {text}", style("actionbar").cyan()),
        }
    }
}
