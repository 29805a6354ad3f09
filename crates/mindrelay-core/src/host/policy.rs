//! Who a model-issued command runs as.
//!
//! The requesting actor is treated as the server owner: by default every
//! command is dispatched from the console, whatever that actor's own
//! permissions are. Swapping the policy tightens this without touching the
//! supervisor.

use mindrelay_types::actor::ActorId;
use mindrelay_types::host::Executor;

pub trait AuthorizationPolicy: Send + Sync {
    fn executor_for(&self, requester: ActorId, command: &str) -> Executor;
}

/// Run everything as the console.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleEscalation;

impl AuthorizationPolicy for ConsoleEscalation {
    fn executor_for(&self, _requester: ActorId, _command: &str) -> Executor {
        Executor::Console
    }
}

/// Run everything with the requester's own permissions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequesterPermissions;

impl AuthorizationPolicy for RequesterPermissions {
    fn executor_for(&self, requester: ActorId, _command: &str) -> Executor {
        Executor::Actor(requester)
    }
}
