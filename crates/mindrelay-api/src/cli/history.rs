//! `mrelay history <actor>`: recent interactions from the log.

use anyhow::Result;
use console::style;
use mindrelay_core::repository::interaction::InteractionLog;

use crate::state::AppState;
use crate::world::actor_id;

pub async fn history(state: &AppState, actor: &str, limit: u32, json: bool) -> Result<()> {
    let interactions = state
        .interaction_log()
        .recent_interactions(&actor_id(actor), limit)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&interactions)?);
        return Ok(());
    }

    println!();
    if interactions.is_empty() {
        println!("  No interactions recorded for {}.", style(actor).cyan());
        println!();
        return Ok(());
    }

    println!(
        "  {} most recent interactions for {}",
        interactions.len(),
        style(actor).cyan().bold()
    );
    for interaction in &interactions {
        println!();
        println!(
            "  {} {}",
            style(interaction.timestamp.format("%Y-%m-%d %H:%M:%S")).dim(),
            style(&interaction.request).bold()
        );
        for line in interaction.response.lines() {
            println!("    {}", style(line).yellow());
        }
    }
    println!();
    Ok(())
}
