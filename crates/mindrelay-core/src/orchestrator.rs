//! Request orchestration: the per-trigger pipeline and its retry loop.
//!
//! One request runs as one task:
//!
//! ```text
//! context snapshot + history ──> provider call ──> parse ──> execute in order
//!        ^                                                        │
//!        └──────── failure context (attempts 1 and 2) ────────────┘
//! ```
//!
//! Failed commands from one reply are counted individually against the
//! retry ceiling but reported back to the model together in a single
//! follow-up round-trip. Delayed commands run in their own tracked tasks
//! and re-enter the loop on failure.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mindrelay_types::actor::ActorId;
use mindrelay_types::directive::Directive;
use mindrelay_types::error::{HostError, RelayError};
use mindrelay_types::llm::Message;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use crate::abbreviation;
use crate::config::{ConfigSource, provider_config};
use crate::context::ContextSnapshotBuilder;
use crate::conversation::ConversationStore;
use crate::delivery::{EXHAUSTED_MESSAGE, ai_lines, pipeline_error};
use crate::host::main_thread::MainThreadHandle;
use crate::host::policy::AuthorizationPolicy;
use crate::host::probe::OutcomeProbe;
use crate::ledger::CommandFeedbackLedger;
use crate::llm::box_gateway::BoxProviderGateway;
use crate::llm::gateway::CONVERSATION_TAIL;
use crate::parser;
use crate::prompt::{PROMPT_VERSION, SystemPromptBuilder, retry_request};
use crate::repository::interaction::InteractionLog;
use crate::retry::{RetryDecision, RetryTable};
use crate::supervisor::{CommandExecutionSupervisor, Outcome};

#[derive(Debug, Clone, PartialEq, Eq)]
struct CommandFailure {
    command: String,
    detail: String,
}

fn error_context(failures: &[CommandFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("Error: {} | Command: /{}", f.detail, f.command))
        .collect::<Vec<_>>()
        .join("\n")
}

/// How a round of directives ended.
#[derive(Debug)]
enum RoundEnd {
    Done,
    Retry(String),
    Exhausted,
    Abandoned,
}

/// Collaborators the orchestrator is assembled from.
pub struct OrchestratorDeps<L: InteractionLog> {
    pub gateway: BoxProviderGateway,
    pub config: Arc<dyn ConfigSource>,
    pub host: MainThreadHandle,
    pub probe: Arc<dyn OutcomeProbe>,
    pub policy: Arc<dyn AuthorizationPolicy>,
    pub log: L,
}

pub struct RequestOrchestrator<L: InteractionLog> {
    gateway: BoxProviderGateway,
    config: Arc<dyn ConfigSource>,
    host: MainThreadHandle,
    context: ContextSnapshotBuilder,
    conversations: ConversationStore,
    retries: RetryTable,
    ledger: Arc<CommandFeedbackLedger>,
    supervisor: CommandExecutionSupervisor,
    log: L,
    tasks: TaskTracker,
    cancel: CancellationToken,
}

impl<L: InteractionLog + 'static> RequestOrchestrator<L> {
    pub fn new(deps: OrchestratorDeps<L>) -> Arc<Self> {
        let ledger = Arc::new(CommandFeedbackLedger::new());
        Arc::new(Self {
            context: ContextSnapshotBuilder::new(deps.host.clone(), Arc::clone(&ledger)),
            supervisor: CommandExecutionSupervisor::new(
                deps.host.clone(),
                deps.probe,
                deps.policy,
                Arc::clone(&ledger),
            ),
            gateway: deps.gateway,
            config: deps.config,
            host: deps.host,
            conversations: ConversationStore::new(),
            retries: RetryTable::new(),
            ledger,
            log: deps.log,
            tasks: TaskTracker::new(),
            cancel: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &Arc<dyn ConfigSource> {
        &self.config
    }

    pub fn host(&self) -> &MainThreadHandle {
        &self.host
    }

    pub fn ledger(&self) -> &CommandFeedbackLedger {
        &self.ledger
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    pub fn retries(&self) -> &RetryTable {
        &self.retries
    }

    pub fn interaction_log(&self) -> &L {
        &self.log
    }

    /// Run the pipeline for `request` on a tracked background task.
    pub fn submit(self: &Arc<Self>, actor: ActorId, request: String) {
        let this = Arc::clone(self);
        let cancel = self.cancel.clone();
        self.tasks.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(actor = %actor, "request cancelled by shutdown");
                }
                _ = this.process(actor, request, None) => {}
            }
        });
    }

    /// The full pipeline for one request, including self-correction
    /// round-trips. Never returns an error: failures end up as one chat
    /// line to the actor.
    pub async fn process(self: Arc<Self>, actor: ActorId, request: String, error_context: Option<String>) {
        let mut error_context = error_context;
        loop {
            let directives = match self
                .round_trip(actor, &request, error_context.as_deref())
                .await
            {
                Ok(directives) => directives,
                Err(e) => {
                    tracing::error!(actor = %actor, error = %e, "request pipeline failed");
                    self.retries.clear(actor, &request);
                    if let Err(e) = self.tell(actor, vec![pipeline_error(&e)]).await {
                        tracing::warn!(actor = %actor, error = %e, "could not report pipeline error");
                    }
                    return;
                }
            };

            match self.run_directives(actor, &request, directives).await {
                RoundEnd::Retry(context) => error_context = Some(context),
                RoundEnd::Done | RoundEnd::Exhausted | RoundEnd::Abandoned => return,
            }
        }
    }

    /// Build context, call the provider, record the exchange, parse.
    async fn round_trip(
        &self,
        actor: ActorId,
        request: &str,
        error_context: Option<&str>,
    ) -> Result<Vec<Directive>, RelayError> {
        let config = self.config.current();
        let provider = provider_config(&config)?;
        let snapshot = self.context.build(actor).await?;

        let mut user_turn = if config.features.abbreviations {
            abbreviation::expand(request)
        } else {
            request.to_string()
        };
        if let Some(context) = error_context {
            user_turn = retry_request(&user_turn, context);
        }
        self.conversations.append(actor, Message::user(user_turn));

        let system_prompt = SystemPromptBuilder::new(config.features.clone())
            .build(&snapshot.actor_name, &snapshot.text);
        let tail = self.conversations.tail(&actor, CONVERSATION_TAIL);

        let span = tracing::info_span!(
            "gen_ai.chat",
            gen_ai.system = %provider.provider,
            gen_ai.request.model = %provider.model,
            gen_ai.request.max_tokens = provider.max_tokens,
            gen_ai.request.temperature = provider.temperature,
            prompt.version = PROMPT_VERSION,
            actor = %actor,
            retry = error_context.is_some(),
        );
        let response = self
            .gateway
            .send(&provider, &system_prompt, &tail)
            .instrument(span)
            .await?;

        self.conversations
            .append(actor, Message::assistant(response.clone()));

        if let Err(e) = self
            .log
            .save_interaction(&actor, request, &response, Utc::now())
            .await
        {
            tracing::warn!(actor = %actor, error = %e, "could not persist interaction");
        }

        Ok(parser::parse(&response))
    }

    fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.config.current().supervisor.settle_delay_ms)
    }

    /// Deliver messages and run commands in reply order.
    async fn run_directives(
        self: &Arc<Self>,
        actor: ActorId,
        request: &str,
        directives: Vec<Directive>,
    ) -> RoundEnd {
        let mut failures = Vec::new();
        for directive in directives {
            match directive {
                Directive::Message { text } => {
                    if let Err(e) = self.tell(actor, ai_lines(&text)).await {
                        tracing::warn!(actor = %actor, error = %e, "could not deliver message");
                        self.retries.clear(actor, request);
                        return RoundEnd::Abandoned;
                    }
                }
                Directive::ImmediateCommand { command } => {
                    if command.is_empty() {
                        continue;
                    }
                    match self
                        .supervisor
                        .execute(actor, &command, self.settle_delay())
                        .await
                    {
                        Outcome::Succeeded => {}
                        Outcome::Failed(detail) => failures.push(CommandFailure { command, detail }),
                        Outcome::Abandoned => {
                            self.retries.clear(actor, request);
                            return RoundEnd::Abandoned;
                        }
                    }
                }
                Directive::DelayedCommand {
                    command,
                    delay_secs,
                } => {
                    if command.is_empty() {
                        continue;
                    }
                    self.schedule_delayed(actor, request.to_string(), command, delay_secs);
                }
            }
        }
        self.judge(actor, request, &failures).await
    }

    /// Apply the retry ceiling to this round's failures.
    async fn judge(&self, actor: ActorId, request: &str, failures: &[CommandFailure]) -> RoundEnd {
        if failures.is_empty() {
            self.retries.clear(actor, request);
            return RoundEnd::Done;
        }
        for failure in failures {
            match self.retries.record_failure(actor, request) {
                RetryDecision::Retry(attempt) => {
                    tracing::info!(
                        actor = %actor,
                        attempt,
                        command = %failure.command,
                        "asking model to correct failed command"
                    );
                }
                RetryDecision::Exhausted => {
                    tracing::warn!(actor = %actor, request, "giving up after repeated failures");
                    if let Err(e) = self.tell(actor, ai_lines(EXHAUSTED_MESSAGE)).await {
                        tracing::warn!(actor = %actor, error = %e, "could not deliver terminal message");
                    }
                    return RoundEnd::Exhausted;
                }
            }
        }
        RoundEnd::Retry(error_context(failures))
    }

    fn schedule_delayed(self: &Arc<Self>, actor: ActorId, request: String, command: String, delay_secs: u64) {
        tracing::debug!(actor = %actor, command = %command, delay_secs, "scheduling delayed command");
        let this = Arc::clone(self);
        let cancel = self.cancel.clone();
        self.tasks.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = this.fire_delayed(actor, request, command, delay_secs) => {}
            }
        });
    }

    async fn fire_delayed(self: Arc<Self>, actor: ActorId, request: String, command: String, delay_secs: u64) {
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;

        let online = self
            .host
            .call(move |host| host.is_online(&actor))
            .await
            .unwrap_or(false);
        if !online {
            tracing::debug!(actor = %actor, command = %command, "actor gone; dropping delayed command");
            return;
        }

        // A success only lands in the ledger; the request's retry counter
        // still belongs to whichever round is running.
        let failure = match self
            .supervisor
            .execute(actor, &command, self.settle_delay())
            .await
        {
            Outcome::Succeeded | Outcome::Abandoned => return,
            Outcome::Failed(detail) => CommandFailure { command, detail },
        };

        if let RoundEnd::Retry(context) = self.judge(actor, &request, &[failure]).await {
            self.process(actor, request, Some(context)).await;
        }
    }

    async fn tell(&self, actor: ActorId, lines: Vec<String>) -> Result<(), HostError> {
        self.host
            .call(move |host| {
                for line in &lines {
                    host.send_message(&actor, line);
                }
            })
            .await
    }

    /// Forget the actor's history and pending retry counters.
    pub fn on_actor_quit(&self, actor: &ActorId) {
        self.conversations.evict(actor);
        self.retries.evict_actor(actor);
    }

    /// Wait until every in-flight task (including delayed commands) is done.
    pub async fn wait_idle(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// Cancel in-flight work, abandon pending delayed commands, and drop
    /// all in-memory state.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tasks.close();
        self.tasks.wait().await;
        self.conversations.clear();
        self.retries.clear_all();
        self.ledger.clear();
        tracing::info!("orchestrator shut down");
    }
}
