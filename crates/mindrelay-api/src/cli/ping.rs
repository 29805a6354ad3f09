//! `mrelay ping`: one minimal round-trip to the configured provider.

use std::time::Instant;

use anyhow::Result;
use console::style;
use mindrelay_core::config::{ConfigSource, provider_config};
use mindrelay_core::llm::gateway::ProviderGateway;
use mindrelay_types::llm::Message;

use crate::state::AppState;

const PING_PROMPT: &str = "You are a connectivity check. Reply with the single word: pong";

pub async fn ping(state: &AppState, json: bool) -> Result<()> {
    let config = provider_config(&state.config.current())?;
    let started = Instant::now();
    let result = state
        .gateway
        .send(&config, PING_PROMPT, &[Message::user("ping")])
        .await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if json {
        let body = match &result {
            Ok(reply) => serde_json::json!({
                "provider": config.provider.to_string(),
                "model": config.model,
                "ok": true,
                "elapsed_ms": elapsed_ms,
                "reply": reply,
            }),
            Err(e) => serde_json::json!({
                "provider": config.provider.to_string(),
                "model": config.model,
                "ok": false,
                "elapsed_ms": elapsed_ms,
                "error": e.to_string(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!();
        match &result {
            Ok(reply) => {
                println!(
                    "  {} {} ({}) answered in {elapsed_ms} ms",
                    style("✓").green(),
                    style(config.provider).cyan(),
                    config.model
                );
                println!("  {}", style(reply.trim()).dim());
            }
            Err(e) => {
                println!(
                    "  {} {} ({}): {e}",
                    style("✗").red(),
                    style(config.provider).cyan(),
                    config.model
                );
            }
        }
        println!();
    }

    result?;
    Ok(())
}
