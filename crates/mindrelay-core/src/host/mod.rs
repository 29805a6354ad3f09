//! Game host port and the main-thread hand-off.
//!
//! The host owns the world. Everything that reads live world state or
//! mutates it (command dispatch, message delivery) runs on the host's
//! single main control path; async tasks reach it through
//! [`MainThreadHandle::call`](main_thread::MainThreadHandle::call).

pub mod main_thread;
pub mod policy;
pub mod probe;

use mindrelay_types::actor::{ActorId, StateSnapshot};
use mindrelay_types::error::HostError;
use mindrelay_types::host::{
    ActorProfile, ActorSummary, DispatchReport, Executor, Notice, PluginInfo, ServerVitals,
    WorldInfo,
};

/// Permission required for `/gpt on|off`.
pub const ADMIN_PERMISSION: &str = "mindrelay.admin";
/// Additional permission required for `/gpt reload`.
pub const RELOAD_PERMISSION: &str = "mindrelay.admin.reload";

/// The game host as seen from its main control path.
///
/// Object-safe and synchronous: implementations are only ever touched by
/// the job loop in [`main_thread::MainThread`].
pub trait GameHost: Send {
    fn vitals(&self) -> ServerVitals;

    /// Installed plugins. May fail while the registry is being rebuilt.
    fn plugins(&self) -> Result<Vec<PluginInfo>, HostError>;

    /// Live attributes of an online actor.
    fn profile(&self, actor: &ActorId) -> Option<ActorProfile>;

    /// Every connected actor.
    fn roster(&self) -> Vec<ActorSummary>;

    fn worlds(&self) -> Vec<WorldInfo>;

    /// Observable attributes used for before/after comparison.
    fn snapshot(&self, actor: &ActorId) -> Option<StateSnapshot>;

    fn is_online(&self, actor: &ActorId) -> bool;

    fn has_permission(&self, actor: &ActorId, permission: &str) -> bool;

    /// Run a command line (no leading slash) as `executor`.
    ///
    /// `Err` means the dispatcher itself blew up; a command that ran and
    /// failed is reported through the returned [`DispatchReport`].
    fn dispatch(&mut self, executor: Executor, command: &str) -> Result<DispatchReport, HostError>;

    /// Deliver one chat line to an actor.
    fn send_message(&mut self, actor: &ActorId, text: &str);

    /// Show a chat line, title or action-bar text to an actor.
    fn send_notice(&mut self, actor: &ActorId, notice: &Notice);
}
