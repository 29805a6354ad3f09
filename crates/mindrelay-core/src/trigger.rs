//! Inbound chat handling.

use std::sync::Arc;

use mindrelay_types::actor::ActorId;
use mindrelay_types::config::FeedbackMessage;
use mindrelay_types::host::Notice;

use crate::delivery::feedback_notice;
use crate::orchestrator::RequestOrchestrator;
use crate::repository::interaction::InteractionLog;
use crate::repository::settings::ActorSettingsRepository;
use crate::toggle::ToggleCache;

/// What happened to one chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The assistant is off for this actor.
    Disabled,
    /// The message does not start with the marker.
    NotTriggered,
    EmptyRequest,
    Submitted(String),
}

/// The request text after `marker`, matched case-insensitively.
pub fn strip_marker<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let text = text.trim_start();
    let head = text.get(..marker.len())?;
    head.eq_ignore_ascii_case(marker)
        .then(|| text[marker.len()..].trim())
}

pub struct ChatTrigger<L: InteractionLog, S: ActorSettingsRepository> {
    orchestrator: Arc<RequestOrchestrator<L>>,
    toggles: Arc<ToggleCache<S>>,
}

impl<L, S> ChatTrigger<L, S>
where
    L: InteractionLog + 'static,
    S: ActorSettingsRepository,
{
    pub fn new(orchestrator: Arc<RequestOrchestrator<L>>, toggles: Arc<ToggleCache<S>>) -> Self {
        Self {
            orchestrator,
            toggles,
        }
    }

    pub fn orchestrator(&self) -> &Arc<RequestOrchestrator<L>> {
        &self.orchestrator
    }

    /// Route one chat message. Accepted requests run in the background.
    pub async fn on_chat(&self, actor: ActorId, text: &str) -> TriggerOutcome {
        if !self.toggles.is_enabled(&actor).await {
            return TriggerOutcome::Disabled;
        }
        let config = self.orchestrator.config().current();
        let marker = config.trigger.marker.as_str();
        let Some(request) = strip_marker(text, marker) else {
            return TriggerOutcome::NotTriggered;
        };

        if request.is_empty() {
            self.notify(
                actor,
                Some(Notice::Chat {
                    text: format!("&c[MindRelay] Add a request after the marker '{marker}'"),
                }),
            );
            return TriggerOutcome::EmptyRequest;
        }

        tracing::info!(actor = %actor, request, "chat request accepted");
        self.notify(actor, feedback_notice(&config, FeedbackMessage::RequestSent));
        self.orchestrator.submit(actor, request.to_string());
        TriggerOutcome::Submitted(request.to_string())
    }

    /// Drop everything held in memory for an actor that disconnected.
    pub fn on_actor_quit(&self, actor: &ActorId) {
        self.orchestrator.on_actor_quit(actor);
        self.toggles.evict(actor);
    }

    fn notify(&self, actor: ActorId, notice: Option<Notice>) {
        let Some(notice) = notice else { return };
        if let Err(e) = self
            .orchestrator
            .host()
            .post(move |host| host.send_notice(&actor, &notice))
        {
            tracing::warn!(actor = %actor, error = %e, "could not queue notice");
        }
    }
}
