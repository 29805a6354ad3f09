//! Command execution with outcome observation.
//!
//! One dispatch is a short state machine:
//!
//! 1. On the main thread: pick the executor, arm the outcome probe, take
//!    the "before" snapshot, dispatch.
//! 2. Wait for the settle delay so deferred log output and side effects
//!    land.
//! 3. Finish the probe, take the "after" snapshot, classify.
//!
//! Classification, first match wins:
//!
//! - the host reported an explicit error → `Failed(error)`
//! - the probe captured a failure line → `Failed(line)`
//! - the dispatcher did not accept the command and the actor's state did
//!   not change → `Failed("Command not executed")`
//! - otherwise → `Succeeded`
//!
//! Every classified outcome is recorded in the ledger. Retry bookkeeping is
//! left to the orchestrator, which owns the model round-trip.

use std::sync::Arc;
use std::time::Duration;

use mindrelay_types::actor::{ActorId, StateSnapshot};
use mindrelay_types::error::HostError;
use mindrelay_types::host::DispatchReport;

use crate::host::main_thread::MainThreadHandle;
use crate::host::policy::AuthorizationPolicy;
use crate::host::probe::{MAX_DETAIL_CHARS, OutcomeProbe};
use crate::ledger::CommandFeedbackLedger;

/// Failure detail when nothing but the missing effect points to a problem.
pub const NOT_EXECUTED: &str = "Command not executed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed(String),
    /// The actor left (or the host shut down) before classification.
    Abandoned,
}

/// Classify a dispatch from its observations.
pub fn classify(
    report: &DispatchReport,
    captured: Option<String>,
    before: Option<&StateSnapshot>,
    after: Option<&StateSnapshot>,
) -> Outcome {
    if let Some(error) = &report.reported_error {
        return Outcome::Failed(error.chars().take(MAX_DETAIL_CHARS).collect());
    }
    if let Some(line) = captured {
        return Outcome::Failed(line);
    }
    let changed = match (before, after) {
        (Some(before), Some(after)) => before.changed_meaningfully(after),
        _ => false,
    };
    if !report.accepted && !changed {
        return Outcome::Failed(NOT_EXECUTED.to_string());
    }
    Outcome::Succeeded
}

fn host_failure(error: HostError) -> Outcome {
    match error {
        HostError::MainThreadGone => Outcome::Abandoned,
        other => Outcome::Failed(other.to_string()),
    }
}

pub struct CommandExecutionSupervisor {
    host: MainThreadHandle,
    probe: Arc<dyn OutcomeProbe>,
    policy: Arc<dyn AuthorizationPolicy>,
    ledger: Arc<CommandFeedbackLedger>,
}

impl CommandExecutionSupervisor {
    pub fn new(
        host: MainThreadHandle,
        probe: Arc<dyn OutcomeProbe>,
        policy: Arc<dyn AuthorizationPolicy>,
        ledger: Arc<CommandFeedbackLedger>,
    ) -> Self {
        Self {
            host,
            probe,
            policy,
            ledger,
        }
    }

    /// Dispatch `command` for `actor`, classify it, and record the result.
    pub async fn execute(&self, actor: ActorId, command: &str, settle_delay: Duration) -> Outcome {
        let outcome = self.observe(actor, command, settle_delay).await;
        match &outcome {
            Outcome::Succeeded => {
                tracing::info!(actor = %actor, command, "command succeeded");
                self.ledger.record_success(command);
            }
            Outcome::Failed(detail) => {
                tracing::warn!(actor = %actor, command, detail = %detail, "command failed");
                self.ledger.record_failure(command, detail);
            }
            Outcome::Abandoned => {
                tracing::debug!(actor = %actor, command, "command outcome abandoned");
            }
        }
        outcome
    }

    async fn observe(&self, actor: ActorId, command: &str, settle_delay: Duration) -> Outcome {
        let probe = Arc::clone(&self.probe);
        let policy = Arc::clone(&self.policy);
        let line = command.to_string();

        let dispatched = self
            .host
            .call(move |host| {
                let executor = policy.executor_for(actor, &line);
                let armed = probe.arm();
                let before = host.snapshot(&actor);
                let report = host.dispatch(executor, &line);
                (armed, before, report)
            })
            .await;

        let (armed, before, report) = match dispatched {
            Ok(parts) => parts,
            Err(e) => return host_failure(e),
        };
        let report = match report {
            Ok(report) => report,
            Err(e) => return host_failure(e),
        };

        tokio::time::sleep(settle_delay).await;
        let captured = armed.finish();

        let after = self
            .host
            .call(move |host| host.is_online(&actor).then(|| host.snapshot(&actor)))
            .await;
        let after = match after {
            Ok(Some(after)) => after,
            Ok(None) => return Outcome::Abandoned,
            Err(e) => return host_failure(e),
        };

        classify(&report, captured, before.as_ref(), after.as_ref())
    }
}
