//! `mrelay run`: the console reference host.
//!
//! Reads stdin line by line and feeds the simulated world. The host runs
//! its main-thread job loop on its own task; chat and admin commands go
//! through the same trigger and admin handlers a plugin host would use.

use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;
use mindrelay_core::admin::AdminCommand;
use mindrelay_core::config::ConfigSource;
use mindrelay_core::host::main_thread::{MainThread, MainThreadHandle};
use mindrelay_core::host::policy::ConsoleEscalation;
use mindrelay_core::host::probe::{KeywordLogProbe, LogTap};
use mindrelay_core::llm::box_gateway::BoxProviderGateway;
use mindrelay_core::orchestrator::{OrchestratorDeps, RequestOrchestrator};
use mindrelay_core::toggle::ToggleCache;
use mindrelay_core::trigger::{ChatTrigger, TriggerOutcome};
use mindrelay_infra::sqlite::interaction::SqliteInteractionLog;
use mindrelay_infra::sqlite::settings::SqliteActorSettings;
use mindrelay_types::host::{Executor, Notice};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::state::AppState;
use crate::world::{ConsoleHost, SharedWorld};

/// One line of console input.
#[derive(Debug, PartialEq, Eq)]
pub enum ConsoleLine<'a> {
    Blank,
    Help,
    /// `+name`
    Join(&'a str),
    /// `-name`
    Quit(&'a str),
    /// `/cmd` from the console, or `name: /cmd` from an actor. No slash.
    Command {
        sender: Option<&'a str>,
        command: &'a str,
    },
    /// `name: text`
    Chat { sender: &'a str, text: &'a str },
    Unrecognized,
}

fn actor_name(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty() && !s.contains(char::is_whitespace)).then_some(s)
}

pub fn parse_line(line: &str) -> ConsoleLine<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ConsoleLine::Blank;
    }
    if line == "?" || line.eq_ignore_ascii_case("help") {
        return ConsoleLine::Help;
    }
    if let Some(rest) = line.strip_prefix('+') {
        return actor_name(rest).map_or(ConsoleLine::Unrecognized, ConsoleLine::Join);
    }
    if let Some(rest) = line.strip_prefix('-') {
        return actor_name(rest).map_or(ConsoleLine::Unrecognized, ConsoleLine::Quit);
    }
    if let Some(command) = line.strip_prefix('/') {
        return ConsoleLine::Command {
            sender: None,
            command: command.trim(),
        };
    }
    let Some((name, text)) = line.split_once(':') else {
        return ConsoleLine::Unrecognized;
    };
    let Some(sender) = actor_name(name) else {
        return ConsoleLine::Unrecognized;
    };
    let text = text.trim();
    match text.strip_prefix('/') {
        Some(command) => ConsoleLine::Command {
            sender: Some(sender),
            command: command.trim(),
        },
        None => ConsoleLine::Chat { sender, text },
    }
}

struct Session {
    world: SharedWorld,
    host: MainThreadHandle,
    trigger: ChatTrigger<SqliteInteractionLog, SqliteActorSettings>,
    admin: AdminCommand<SqliteActorSettings>,
}

impl Session {
    async fn handle(&self, line: &str) {
        match parse_line(line) {
            ConsoleLine::Blank => {}
            ConsoleLine::Help => print_help(),
            ConsoleLine::Join(name) => {
                self.world.join(name);
                println!("{}", style(format!("{name} joined the game")).yellow());
            }
            ConsoleLine::Quit(name) => match self.world.quit(name) {
                Some(id) => {
                    self.trigger.on_actor_quit(&id);
                    println!("{}", style(format!("{name} left the game")).yellow());
                }
                None => not_online(name),
            },
            ConsoleLine::Command { sender, command } => self.command(sender, command).await,
            ConsoleLine::Chat { sender, text } => self.chat(sender, text).await,
            ConsoleLine::Unrecognized => {
                println!("{}", style("Unrecognized input; type ? for help").dim());
            }
        }
    }

    async fn chat(&self, sender: &str, text: &str) {
        let Some((id, name)) = self.world.online(sender) else {
            return not_online(sender);
        };
        println!("<{}> {text}", style(&name).bold());
        match self.trigger.on_chat(id, text).await {
            TriggerOutcome::Disabled => tracing::debug!(actor = %name, "relay disabled for actor"),
            TriggerOutcome::NotTriggered => {}
            TriggerOutcome::EmptyRequest => tracing::debug!(actor = %name, "empty request"),
            TriggerOutcome::Submitted(request) => {
                tracing::debug!(actor = %name, request = %request, "request submitted");
            }
        }
    }

    async fn command(&self, sender: Option<&str>, command: &str) {
        let actor = match sender {
            None => None,
            Some(name) => match self.world.online(name) {
                Some((id, _)) => Some(id),
                None => return not_online(name),
            },
        };

        let mut words = command.split_whitespace();
        if words.next().is_some_and(|head| head.eq_ignore_ascii_case("gpt")) {
            let args: Vec<&str> = words.collect();
            let replies = self.admin.handle(actor, &args).await;
            // Actors get their replies through the host; the console prints them.
            if actor.is_none() {
                for notice in &replies {
                    print_console_notice(notice);
                }
            }
            return;
        }

        let executor = actor.map_or(Executor::Console, Executor::Actor);
        let line = command.to_string();
        match self.host.call(move |host| host.dispatch(executor, &line)).await {
            Ok(Ok(report)) => tracing::debug!(command, accepted = report.accepted, "console dispatch"),
            Ok(Err(e)) | Err(e) => eprintln!("{} {e}", style("dispatch failed:").red()),
        }
    }
}

fn not_online(name: &str) {
    println!(
        "{}",
        style(format!("{name} is not online (join with +{name})")).dim()
    );
}

fn print_console_notice(notice: &Notice) {
    match notice {
        Notice::Chat { text } | Notice::ActionBar { text } => println!("{text}"),
        Notice::Title { title, subtitle } => println!("{title} / {subtitle}"),
    }
}

fn print_help() {
    println!();
    println!("  {}", style("Console input:").bold());
    println!("  {}  chat from an online actor", style("name: text").cyan());
    println!("  {}  /gpt on|off|reload as that actor", style("name: /gpt on").cyan());
    println!("  {}  run a server command as that actor", style("name: /cmd").cyan());
    println!("  {}  run a server command from the console", style("/cmd").cyan());
    println!("  {}  actor joins", style("+name").cyan());
    println!("  {}  actor quits", style("-name").cyan());
    println!("  {}", style("Ctrl+D to finish pending requests and exit, Ctrl+C to stop now").dim());
    println!();
}

fn print_banner(state: &AppState, world: &SharedWorld) {
    let config = state.config.current();
    println!();
    println!(
        "  {} MindRelay console host v{}",
        style("⚡").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "  {} {} ({})",
        style("Provider:").bold(),
        style(&config.provider.kind).cyan(),
        config.provider.model
    );
    println!(
        "  {} {}",
        style("Marker:").bold(),
        style(&config.trigger.marker).cyan()
    );
    let online = world.online_names();
    if !online.is_empty() {
        println!("  {} {}", style("Online:").bold(), online.join(", "));
    }
    println!("  {}", style("Type ? for help").dim());
    println!();
}

/// Run the console host until stdin closes or Ctrl+C.
///
/// On end of input, requests already started (delayed commands included)
/// are allowed to finish; Ctrl+C abandons them.
pub async fn run(state: &AppState, actors: &[String]) -> Result<()> {
    let world = SharedWorld::default();
    for name in actors {
        world.join(name);
    }

    let tap = LogTap::new();
    let (main_thread, handle) =
        MainThread::new(Box::new(ConsoleHost::new(world.clone(), tap.clone())));
    let host_cancel = CancellationToken::new();
    let main_task = tokio::spawn(main_thread.run(host_cancel.clone()));

    let config: Arc<dyn ConfigSource> = state.config.clone();
    let toggles = Arc::new(ToggleCache::new(state.actor_settings()));
    let orchestrator = RequestOrchestrator::new(OrchestratorDeps {
        gateway: BoxProviderGateway::new(state.gateway.clone()),
        config: Arc::clone(&config),
        host: handle.clone(),
        probe: Arc::new(KeywordLogProbe::new(tap)),
        policy: Arc::new(ConsoleEscalation),
        log: state.interaction_log(),
    });

    let session = Session {
        world: world.clone(),
        host: handle.clone(),
        trigger: ChatTrigger::new(Arc::clone(&orchestrator), Arc::clone(&toggles)),
        admin: AdminCommand::new(handle, config, toggles),
    };

    print_banner(state, &world);
    tracing::info!(actors = actors.len(), "console host started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let interrupted = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break true,
            line = lines.next_line() => match line.context("reading stdin")? {
                Some(line) => session.handle(&line).await,
                None => break false,
            },
        }
    };

    if !interrupted {
        orchestrator.wait_idle().await;
    }
    orchestrator.shutdown().await;
    host_cancel.cancel();
    main_task.await.context("main thread task")?;
    state.db_pool.close().await;
    tracing::info!(interrupted, "console host stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_and_actor_commands() {
        assert_eq!(
            parse_line("Bob: gpt, heal me"),
            ConsoleLine::Chat {
                sender: "Bob",
                text: "gpt, heal me"
            }
        );
        assert_eq!(
            parse_line("  Bob:/gpt on "),
            ConsoleLine::Command {
                sender: Some("Bob"),
                command: "gpt on"
            }
        );
        assert_eq!(
            parse_line("Bob: what time is it: noon?"),
            ConsoleLine::Chat {
                sender: "Bob",
                text: "what time is it: noon?"
            }
        );
    }

    #[test]
    fn test_parse_console_commands_and_membership() {
        assert_eq!(
            parse_line("/time set night"),
            ConsoleLine::Command {
                sender: None,
                command: "time set night"
            }
        );
        assert_eq!(parse_line("+Alice"), ConsoleLine::Join("Alice"));
        assert_eq!(parse_line("- Alice"), ConsoleLine::Quit("Alice"));
        assert_eq!(parse_line("?"), ConsoleLine::Help);
        assert_eq!(parse_line("   "), ConsoleLine::Blank);
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert_eq!(parse_line("hello there"), ConsoleLine::Unrecognized);
        assert_eq!(parse_line("Bob Smith: hi"), ConsoleLine::Unrecognized);
        assert_eq!(parse_line(": hi"), ConsoleLine::Unrecognized);
        assert_eq!(parse_line("+"), ConsoleLine::Unrecognized);
    }
}
