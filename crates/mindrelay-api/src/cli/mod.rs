//! CLI command definitions for the `mrelay` binary.

pub mod history;
pub mod ping;
pub mod run;
pub mod toggle;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Relay in-game chat requests to an LLM and run the commands it answers with.
#[derive(Parser)]
#[command(name = "mrelay", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config.toml (defaults to the data directory).
    #[arg(long, global = true, env = "MINDRELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for info, -vv for debug, -vvv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the console reference host.
    ///
    /// Each stdin line `name: text` is chat from `name`; `name: /gpt on`
    /// runs the admin command as `name`; `/cmd` runs a server command from
    /// the console; `+name` and `-name` join and quit actors.
    Run {
        /// Actors online at startup.
        #[arg(long = "actor", value_name = "NAME")]
        actors: Vec<String>,
    },

    /// Set the persisted enable flag for an actor.
    Toggle {
        /// Actor name as used in the console world.
        actor: String,
        state: Switch,
    },

    /// Show recent interactions of an actor.
    History {
        /// Actor name as used in the console world.
        actor: String,

        /// Maximum number of interactions to show.
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    /// Send a minimal request to the configured provider.
    Ping,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn enabled(self) -> bool {
        self == Switch::On
    }
}
