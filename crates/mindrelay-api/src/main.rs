//! MindRelay CLI entry point.
//!
//! Binary name: `mrelay`
//!
//! Parses CLI arguments, initializes tracing and application state, then
//! dispatches to the console host or one of the operational subcommands.

mod cli;
mod state;
mod world;

use std::process::ExitCode;

use clap::Parser;
use clap_complete::generate;
use console::style;
use mindrelay_infra::config::default_config_path;
use mindrelay_observe::tracing_setup::{default_directive, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(default_directive(cli.verbose, cli.quiet), cli.otel) {
        eprintln!("failed to initialize tracing: {e}");
    }

    let result = dispatch(cli).await;
    shutdown_tracing();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", style("error:").red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "mrelay", &mut std::io::stdout());
        return Ok(());
    }

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let state = AppState::init(&config_path).await?;
    tracing::debug!(
        config = %config_path.display(),
        data_dir = %state.data_dir.display(),
        "application state ready"
    );

    match cli.command {
        Commands::Run { actors } => cli::run::run(&state, &actors).await,
        Commands::Toggle { actor, state: switch } => {
            cli::toggle::toggle(&state, &actor, switch, cli.json).await
        }
        Commands::History { actor, limit } => {
            cli::history::history(&state, &actor, limit, cli.json).await
        }
        Commands::Ping => cli::ping::ping(&state, cli.json).await,
        Commands::Completions { .. } => unreachable!("handled above"),
    }
}
