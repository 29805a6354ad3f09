//! The `/gpt <on|off|reload>` command.

use std::sync::Arc;

use mindrelay_types::actor::ActorId;
use mindrelay_types::config::FeedbackMessage;
use mindrelay_types::host::Notice;

use crate::config::ConfigSource;
use crate::delivery::feedback_notice;
use crate::host::main_thread::MainThreadHandle;
use crate::host::{ADMIN_PERMISSION, RELOAD_PERMISSION};
use crate::repository::settings::ActorSettingsRepository;
use crate::toggle::ToggleCache;

pub const SUBCOMMANDS: [&str; 3] = ["on", "off", "reload"];

const PLAYERS_ONLY: &str = "&cOnly players can use this command.";
const USAGE: &str = "&e[MindRelay] Usage: /gpt <on|off|reload>";

fn chat(text: impl Into<String>) -> Notice {
    Notice::Chat { text: text.into() }
}

pub struct AdminCommand<S: ActorSettingsRepository> {
    host: MainThreadHandle,
    config: Arc<dyn ConfigSource>,
    toggles: Arc<ToggleCache<S>>,
}

impl<S: ActorSettingsRepository> AdminCommand<S> {
    pub fn new(
        host: MainThreadHandle,
        config: Arc<dyn ConfigSource>,
        toggles: Arc<ToggleCache<S>>,
    ) -> Self {
        Self {
            host,
            config,
            toggles,
        }
    }

    /// Run the command and deliver the replies to the sender.
    ///
    /// `sender` is `None` for the console. The replies are also returned so
    /// a console caller can print them.
    pub async fn handle(&self, sender: Option<ActorId>, args: &[&str]) -> Vec<Notice> {
        let notices = match sender {
            None => vec![chat(PLAYERS_ONLY)],
            Some(actor) => self.handle_actor(actor, args).await,
        };
        if let Some(actor) = sender {
            let replies = notices.clone();
            if let Err(e) = self.host.post(move |host| {
                for notice in &replies {
                    host.send_notice(&actor, notice);
                }
            }) {
                tracing::warn!(actor = %actor, error = %e, "could not deliver command reply");
            }
        }
        notices
    }

    async fn handle_actor(&self, actor: ActorId, args: &[&str]) -> Vec<Notice> {
        if !self.permitted(actor, ADMIN_PERMISSION).await {
            return self.feedback(FeedbackMessage::NoPermission);
        }
        let sub = args.first().map(|s| s.to_lowercase());
        match sub.as_deref() {
            Some("on") => self.toggle(actor, true).await,
            Some("off") => self.toggle(actor, false).await,
            Some("reload") => {
                if !self.permitted(actor, RELOAD_PERMISSION).await {
                    return self.feedback(FeedbackMessage::NoPermission);
                }
                match self.config.reload() {
                    Ok(()) => {
                        tracing::info!(actor = %actor, "configuration reloaded");
                        self.feedback(FeedbackMessage::ReloadSuccess)
                    }
                    Err(e) => {
                        tracing::error!(actor = %actor, error = %e, "configuration reload failed");
                        vec![chat(format!("&c[MindRelay] Reload failed: {e}"))]
                    }
                }
            }
            _ => vec![chat(USAGE)],
        }
    }

    async fn toggle(&self, actor: ActorId, enabled: bool) -> Vec<Notice> {
        if let Err(e) = self.toggles.set_enabled(&actor, enabled).await {
            tracing::warn!(actor = %actor, enabled, error = %e, "could not persist enable flag");
        }
        self.feedback(if enabled {
            FeedbackMessage::GptEnabled
        } else {
            FeedbackMessage::GptDisabled
        })
    }

    async fn permitted(&self, actor: ActorId, permission: &'static str) -> bool {
        self.host
            .call(move |host| host.has_permission(&actor, permission))
            .await
            .unwrap_or(false)
    }

    fn feedback(&self, message: FeedbackMessage) -> Vec<Notice> {
        feedback_notice(&self.config.current(), message)
            .into_iter()
            .collect()
    }
}

/// Sub-commands starting with the partial first argument.
pub fn complete(args: &[&str]) -> Vec<&'static str> {
    match args {
        [] => SUBCOMMANDS.to_vec(),
        [partial] => {
            let partial = partial.to_lowercase();
            SUBCOMMANDS
                .iter()
                .copied()
                .filter(|s| s.starts_with(&partial))
                .collect()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticConfigSource;
    use crate::host::main_thread::MainThread;
    use crate::testing::{FakeHost, InMemorySettings, SharedWorld, test_config};
    use mindrelay_types::error::ConfigError;
    use tokio_util::sync::CancellationToken;

    struct BrokenSource(StaticConfigSource);

    impl ConfigSource for BrokenSource {
        fn current(&self) -> Arc<mindrelay_types::config::RelayConfig> {
            self.0.current()
        }

        fn reload(&self) -> Result<(), ConfigError> {
            Err(ConfigError::Parse("expected `=` at line 3".to_string()))
        }
    }

    struct Rig {
        admin: AdminCommand<InMemorySettings>,
        settings: InMemorySettings,
        world: SharedWorld,
        bob: ActorId,
        cancel: CancellationToken,
    }

    fn rig(permissions: &[&str], config: Arc<dyn ConfigSource>) -> Rig {
        let mut host = FakeHost::new();
        let bob = host.add_actor("Bob");
        let world = host.world();
        for p in permissions {
            world.lock().unwrap().grant(bob, p);
        }
        let (main, handle) = MainThread::new(Box::new(host));
        let cancel = CancellationToken::new();
        tokio::spawn(main.run(cancel.clone()));
        let settings = InMemorySettings::default();
        let admin = AdminCommand::new(
            handle,
            config,
            Arc::new(ToggleCache::new(settings.clone())),
        );
        Rig {
            admin,
            settings,
            world,
            bob,
            cancel,
        }
    }

    fn static_config() -> Arc<dyn ConfigSource> {
        Arc::new(StaticConfigSource::new(test_config()))
    }

    fn text(notices: &[Notice]) -> Vec<String> {
        notices
            .iter()
            .map(|n| match n {
                Notice::Chat { text } | Notice::ActionBar { text } => text.clone(),
                Notice::Title { title, .. } => title.clone(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_console_sender_is_refused() {
        let rig = rig(&[], static_config());
        let notices = rig.admin.handle(None, &["on"]).await;
        assert_eq!(text(&notices), vec![PLAYERS_ONLY]);
        rig.cancel.cancel();
    }

    #[tokio::test]
    async fn test_on_and_off_persist_flag() {
        let rig = rig(&[ADMIN_PERMISSION], static_config());
        let on = rig.admin.handle(Some(rig.bob), &["on"]).await;
        assert_eq!(text(&on), vec![FeedbackMessage::GptEnabled.default_text()]);
        assert_eq!(rig.settings.stored(&rig.bob), Some(true));

        let off = rig.admin.handle(Some(rig.bob), &["OFF"]).await;
        assert_eq!(text(&off), vec![FeedbackMessage::GptDisabled.default_text()]);
        assert_eq!(rig.settings.stored(&rig.bob), Some(false));

        // Replies are delivered to the sender as well.
        rig.admin.host.call(|_| ()).await.unwrap();
        assert_eq!(rig.world.lock().unwrap().notices_to(rig.bob).len(), 2);
        rig.cancel.cancel();
    }

    #[tokio::test]
    async fn test_missing_permission() {
        let rig = rig(&[], static_config());
        let notices = rig.admin.handle(Some(rig.bob), &["on"]).await;
        assert_eq!(text(&notices), vec![FeedbackMessage::NoPermission.default_text()]);
        assert_eq!(rig.settings.stored(&rig.bob), None);
        rig.cancel.cancel();
    }

    #[tokio::test]
    async fn test_reload_needs_its_own_permission() {
        let rig = rig(&[ADMIN_PERMISSION], static_config());
        let denied = rig.admin.handle(Some(rig.bob), &["reload"]).await;
        assert_eq!(text(&denied), vec![FeedbackMessage::NoPermission.default_text()]);
        rig.cancel.cancel();

        let rig = rig_with_reload(static_config());
        let ok = rig.admin.handle(Some(rig.bob), &["reload"]).await;
        assert_eq!(text(&ok), vec![FeedbackMessage::ReloadSuccess.default_text()]);
        rig.cancel.cancel();
    }

    fn rig_with_reload(config: Arc<dyn ConfigSource>) -> Rig {
        rig(&[ADMIN_PERMISSION, RELOAD_PERMISSION], config)
    }

    #[tokio::test]
    async fn test_reload_failure_is_reported() {
        let rig = rig_with_reload(Arc::new(BrokenSource(StaticConfigSource::new(test_config()))));
        let notices = rig.admin.handle(Some(rig.bob), &["reload"]).await;
        let lines = text(&notices);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("&c[MindRelay] Reload failed:"));
        rig.cancel.cancel();
    }

    #[tokio::test]
    async fn test_unknown_subcommand_prints_usage() {
        let rig = rig(&[ADMIN_PERMISSION], static_config());
        assert_eq!(text(&rig.admin.handle(Some(rig.bob), &[]).await), vec![USAGE]);
        assert_eq!(text(&rig.admin.handle(Some(rig.bob), &["maybe"]).await), vec![USAGE]);
        rig.cancel.cancel();
    }

    #[test]
    fn test_complete() {
        assert_eq!(complete(&[]), vec!["on", "off", "reload"]);
        assert_eq!(complete(&["o"]), vec!["on", "off"]);
        assert_eq!(complete(&["R"]), vec!["reload"]);
        assert!(complete(&["x"]).is_empty());
        assert!(complete(&["on", "x"]).is_empty());
    }
}
