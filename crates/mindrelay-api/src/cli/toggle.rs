//! `mrelay toggle <actor> <on|off>`.

use anyhow::Result;
use console::style;
use mindrelay_core::repository::settings::ActorSettingsRepository;

use crate::state::AppState;
use crate::world::actor_id;

use super::Switch;

/// Persist the enable flag for `actor`. Takes effect the next time a
/// running host reads the flag (on rejoin, or for actors it never cached).
pub async fn toggle(state: &AppState, actor: &str, switch: Switch, json: bool) -> Result<()> {
    let id = actor_id(actor);
    let enabled = switch.enabled();
    state.actor_settings().set_enabled(&id, enabled).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"actor": actor, "actor_id": id.to_string(), "enabled": enabled})
        );
    } else {
        let label = if enabled {
            style("enabled").green().bold()
        } else {
            style("disabled").red().bold()
        };
        println!();
        println!("  MindRelay {label} for {}", style(actor).cyan());
        println!("  {}", style(format!("id {id}")).dim());
        println!();
    }
    Ok(())
}
