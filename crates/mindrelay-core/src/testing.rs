//! In-memory doubles shared by the unit tests in this crate.

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use mindrelay_types::actor::{ActorId, Position, StateSnapshot};
use mindrelay_types::config::RelayConfig;
use mindrelay_types::error::{HostError, RepositoryError};
use mindrelay_types::host::{
    ActorProfile, ActorSummary, DispatchReport, Executor, Notice, PlayStatistics, PluginInfo,
    ServerVitals, WorldInfo,
};
use mindrelay_types::interaction::Interaction;
use mindrelay_types::llm::{LlmError, Message, ProviderConfig, ProviderKind};
use tokio_util::sync::CancellationToken;

use crate::config::StaticConfigSource;
use crate::host::GameHost;
use crate::host::main_thread::MainThread;
use crate::host::policy::ConsoleEscalation;
use crate::host::probe::{KeywordLogProbe, LogTap};
use crate::llm::box_gateway::BoxProviderGateway;
use crate::llm::gateway::ProviderGateway;
use crate::orchestrator::{OrchestratorDeps, RequestOrchestrator};
use crate::repository::interaction::InteractionLog;
use crate::repository::settings::ActorSettingsRepository;

// ---------------------------------------------------------------------------
// Game host
// ---------------------------------------------------------------------------

/// How the fake dispatcher reacts to commands starting with a prefix.
#[derive(Debug, Clone)]
pub enum FakeBehavior {
    /// Print `line` to the server log and report nothing back.
    LogAndReject(String),
    Reject,
    /// Reject, but hurt every actor by the given amount.
    RejectButDamage(f64),
    ReportError(String),
    Panic,
    /// Accept, then drop every actor's connection.
    Disconnect,
}

#[derive(Debug, Clone)]
pub struct FakeActor {
    pub id: ActorId,
    pub name: String,
    pub health: f64,
    pub gamemode: String,
    pub position: Position,
    pub experience_level: u32,
    pub online: bool,
}

#[derive(Debug, Default)]
pub struct FakeWorld {
    pub actors: Vec<FakeActor>,
    pub plugins: Vec<PluginInfo>,
    pub plugins_broken: bool,
    pub rules: Vec<(String, FakeBehavior)>,
    pub permissions: HashSet<(ActorId, String)>,
    pub dispatched: Vec<(Executor, String)>,
    pub messages: Vec<(ActorId, String)>,
    pub notices: Vec<(ActorId, Notice)>,
}

impl FakeWorld {
    fn actor(&self, id: &ActorId) -> Option<&FakeActor> {
        self.actors.iter().find(|a| a.id == *id && a.online)
    }

    pub fn messages_to(&self, id: ActorId) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|(to, _)| *to == id)
            .map(|(_, text)| text.as_str())
            .collect()
    }

    pub fn notices_to(&self, id: ActorId) -> Vec<&Notice> {
        self.notices
            .iter()
            .filter(|(to, _)| *to == id)
            .map(|(_, notice)| notice)
            .collect()
    }

    pub fn set_online(&mut self, id: ActorId, online: bool) {
        for actor in self.actors.iter_mut().filter(|a| a.id == id) {
            actor.online = online;
        }
    }

    pub fn grant(&mut self, id: ActorId, permission: &str) {
        self.permissions.insert((id, permission.to_string()));
    }
}

pub type SharedWorld = Arc<Mutex<FakeWorld>>;

pub struct FakeHost {
    world: SharedWorld,
    tap: LogTap,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            world: Arc::new(Mutex::new(FakeWorld::default())),
            tap: LogTap::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeWorld> {
        self.world.lock().unwrap()
    }

    pub fn add_actor(&mut self, name: &str) -> ActorId {
        let id = ActorId::new();
        self.lock().actors.push(FakeActor {
            id,
            name: name.to_string(),
            health: 20.0,
            gamemode: "SURVIVAL".to_string(),
            position: Position::new("world", 10.5, 64.0, -3.2),
            experience_level: 5,
            online: true,
        });
        id
    }

    pub fn set_plugins(&mut self, plugins: Vec<PluginInfo>) {
        self.lock().plugins = plugins;
    }

    pub fn on_command(&mut self, prefix: &str, behavior: FakeBehavior) {
        self.lock().rules.push((prefix.to_string(), behavior));
    }

    pub fn world(&self) -> SharedWorld {
        Arc::clone(&self.world)
    }

    pub fn log_tap(&self) -> LogTap {
        self.tap.clone()
    }
}

impl GameHost for FakeHost {
    fn vitals(&self) -> ServerVitals {
        let online = self.lock().actors.iter().filter(|a| a.online).count() as u32;
        ServerVitals {
            name: "Fake".to_string(),
            version: "1.21".to_string(),
            full_version: "fake-1.21".to_string(),
            motd: "A test server".to_string(),
            max_players: 20,
            online_players: online,
            tps: 20.0,
            used_memory_mb: 512,
            max_memory_mb: 1024,
            online_mode: false,
            port: 25565,
        }
    }

    fn plugins(&self) -> Result<Vec<PluginInfo>, HostError> {
        let world = self.lock();
        if world.plugins_broken {
            return Err(HostError::Dispatch("plugin registry unavailable".to_string()));
        }
        Ok(world.plugins.clone())
    }

    fn profile(&self, actor: &ActorId) -> Option<ActorProfile> {
        let world = self.lock();
        let a = world.actor(actor)?;
        Some(ActorProfile {
            id: a.id,
            name: a.name.clone(),
            health: a.health,
            max_health: 20.0,
            food_level: 20,
            experience_level: a.experience_level,
            gamemode: a.gamemode.clone(),
            operator: true,
            flying: false,
            ping_ms: 3,
            position: a.position.clone(),
            world_environment: "NORMAL".to_string(),
            biome: "PLAINS".to_string(),
            main_hand: None,
            armor: Vec::new(),
            statistics: PlayStatistics::default(),
        })
    }

    fn roster(&self) -> Vec<ActorSummary> {
        self.lock()
            .actors
            .iter()
            .filter(|a| a.online)
            .map(|a| ActorSummary {
                id: a.id,
                name: a.name.clone(),
                health: a.health,
                gamemode: a.gamemode.clone(),
                position: a.position.clone(),
                ping_ms: 3,
            })
            .collect()
    }

    fn worlds(&self) -> Vec<WorldInfo> {
        let players = self.lock().actors.iter().filter(|a| a.online).count() as u32;
        vec![WorldInfo {
            name: "world".to_string(),
            environment: "NORMAL".to_string(),
            time: 1000,
            storm: false,
            player_count: players,
        }]
    }

    fn snapshot(&self, actor: &ActorId) -> Option<StateSnapshot> {
        let world = self.lock();
        let a = world.actor(actor)?;
        Some(StateSnapshot {
            health: a.health,
            position: a.position.clone(),
            gamemode: a.gamemode.clone(),
            experience_level: a.experience_level,
        })
    }

    fn is_online(&self, actor: &ActorId) -> bool {
        self.lock().actor(actor).is_some()
    }

    fn has_permission(&self, actor: &ActorId, permission: &str) -> bool {
        self.lock()
            .permissions
            .contains(&(*actor, permission.to_string()))
    }

    fn dispatch(&mut self, executor: Executor, command: &str) -> Result<DispatchReport, HostError> {
        let behavior = {
            let mut world = self.lock();
            world.dispatched.push((executor, command.to_string()));
            world
                .rules
                .iter()
                .find(|(prefix, _)| command.starts_with(prefix.as_str()))
                .map(|(_, b)| b.clone())
        };
        match behavior {
            None => Ok(DispatchReport::accepted()),
            Some(FakeBehavior::LogAndReject(line)) => {
                self.tap.emit(line);
                Ok(DispatchReport::rejected())
            }
            Some(FakeBehavior::Reject) => Ok(DispatchReport::rejected()),
            Some(FakeBehavior::RejectButDamage(amount)) => {
                for actor in self.lock().actors.iter_mut() {
                    actor.health -= amount;
                }
                Ok(DispatchReport::rejected())
            }
            Some(FakeBehavior::ReportError(error)) => Ok(DispatchReport::failed(error)),
            Some(FakeBehavior::Panic) => panic!("fake dispatcher crashed on '{command}'"),
            Some(FakeBehavior::Disconnect) => {
                for actor in self.lock().actors.iter_mut() {
                    actor.online = false;
                }
                Ok(DispatchReport::accepted())
            }
        }
    }

    fn send_message(&mut self, actor: &ActorId, text: &str) {
        self.lock().messages.push((*actor, text.to_string()));
    }

    fn send_notice(&mut self, actor: &ActorId, notice: &Notice) {
        self.lock().notices.push((*actor, notice.clone()));
    }
}

// ---------------------------------------------------------------------------
// Provider gateway
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub provider: ProviderKind,
    pub system_prompt: String,
    pub tail: Vec<Message>,
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Result<String, LlmError>>,
    calls: Vec<RecordedCall>,
}

/// Replays queued replies in order; answers `MSG: ok` once the queue is
/// empty.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    script: Arc<Mutex<Script>>,
}

impl ScriptedGateway {
    pub fn push_reply(&self, reply: &str) {
        self.script
            .lock()
            .unwrap()
            .replies
            .push_back(Ok(reply.to_string()));
    }

    pub fn push_error(&self, error: LlmError) {
        self.script.lock().unwrap().replies.push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.script.lock().unwrap().calls.clone()
    }
}

impl ProviderGateway for ScriptedGateway {
    fn send(
        &self,
        config: &ProviderConfig,
        system_prompt: &str,
        tail: &[Message],
    ) -> impl Future<Output = Result<String, LlmError>> + Send {
        let mut script = self.script.lock().unwrap();
        script.calls.push(RecordedCall {
            provider: config.provider,
            system_prompt: system_prompt.to_string(),
            tail: tail.to_vec(),
        });
        let reply = script
            .replies
            .pop_front()
            .unwrap_or_else(|| Ok("MSG: ok".to_string()));
        std::future::ready(reply)
    }
}

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct InMemoryInteractionLog {
    entries: Arc<Mutex<Vec<Interaction>>>,
}

impl InMemoryInteractionLog {
    pub fn entries(&self) -> Vec<Interaction> {
        self.entries.lock().unwrap().clone()
    }
}

impl InteractionLog for InMemoryInteractionLog {
    async fn save_interaction(
        &self,
        actor: &ActorId,
        request: &str,
        response: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.entries.lock().unwrap().push(Interaction {
            actor: *actor,
            request: request.to_string(),
            response: response.to_string(),
            timestamp,
        });
        Ok(())
    }

    async fn recent_interactions(
        &self,
        actor: &ActorId,
        limit: u32,
    ) -> Result<Vec<Interaction>, RepositoryError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|i| i.actor == *actor)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[derive(Clone, Default)]
pub struct InMemorySettings {
    flags: Arc<Mutex<HashMap<ActorId, bool>>>,
    reads: Arc<AtomicUsize>,
    failing: bool,
}

impl InMemorySettings {
    /// Every call fails with a query error.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn insert(&self, actor: ActorId, enabled: bool) {
        self.flags.lock().unwrap().insert(actor, enabled);
    }

    pub fn stored(&self, actor: &ActorId) -> Option<bool> {
        self.flags.lock().unwrap().get(actor).copied()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl ActorSettingsRepository for InMemorySettings {
    async fn is_enabled(&self, actor: &ActorId) -> Result<Option<bool>, RepositoryError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(RepositoryError::Query("database is locked".to_string()));
        }
        Ok(self.stored(actor))
    }

    async fn set_enabled(&self, actor: &ActorId, enabled: bool) -> Result<(), RepositoryError> {
        if self.failing {
            return Err(RepositoryError::Query("database is locked".to_string()));
        }
        self.insert(*actor, enabled);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// A running main thread, a fake host with one actor ("Bob"), and an
/// orchestrator talking to a scripted gateway.
pub struct Harness {
    pub orchestrator: Arc<RequestOrchestrator<InMemoryInteractionLog>>,
    pub gateway: ScriptedGateway,
    pub config: Arc<StaticConfigSource>,
    pub log: InMemoryInteractionLog,
    pub world: SharedWorld,
    pub bob: ActorId,
    cancel: CancellationToken,
}

pub fn test_config() -> RelayConfig {
    let mut config = RelayConfig::default();
    config.provider.kind = "ollama".to_string();
    config.provider.model = "llama3".to_string();
    config.supervisor.settle_delay_ms = 5;
    config
}

impl Harness {
    pub fn new() -> Self {
        Self::with_host(|_| {})
    }

    pub fn with_host(configure: impl FnOnce(&mut FakeHost)) -> Self {
        let mut host = FakeHost::new();
        let bob = host.add_actor("Bob");
        configure(&mut host);
        let world = host.world();
        let probe = Arc::new(KeywordLogProbe::new(host.log_tap()));

        let (main, handle) = MainThread::new(Box::new(host));
        let cancel = CancellationToken::new();
        tokio::spawn(main.run(cancel.clone()));

        let gateway = ScriptedGateway::default();
        let config = Arc::new(StaticConfigSource::new(test_config()));
        let log = InMemoryInteractionLog::default();
        let orchestrator = RequestOrchestrator::new(OrchestratorDeps {
            gateway: BoxProviderGateway::new(gateway.clone()),
            config: config.clone(),
            host: handle,
            probe,
            policy: Arc::new(ConsoleEscalation),
            log: log.clone(),
        });

        Self {
            orchestrator,
            gateway,
            config,
            log,
            world,
            bob,
            cancel,
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
