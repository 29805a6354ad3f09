use thiserror::Error;

use crate::actor::ActorId;
use crate::llm::LlmError;

/// Errors raised while talking to the game host.
#[derive(Debug, Clone, Error)]
pub enum HostError {
    /// The main-thread executor has shut down.
    #[error("host main thread is no longer running")]
    MainThreadGone,

    /// A job submitted to the main thread panicked.
    #[error("host job panicked: {0}")]
    JobPanicked(String),

    #[error("actor {0} is not online")]
    ActorOffline(ActorId),

    /// The dispatcher itself failed (as opposed to the command reporting an error).
    #[error("dispatch failed: {0}")]
    Dispatch(String),
}

/// Errors from repository operations (used by trait definitions in mindrelay-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,
}

/// Errors from loading or validating `config.toml`.
///
/// All of these are fatal at startup. On reload they are reported and the
/// previous configuration stays in effect.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file '{path}': {reason}")]
    Io { path: String, reason: String },

    #[error("invalid config file: {0}")]
    Parse(String),

    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("provider '{0}' requires an api_key")]
    MissingApiKey(String),

    #[error("provider '{0}' requires a base_url")]
    MissingBaseUrl(String),

    #[error("unknown message kind '{kind}' for message '{key}'")]
    UnknownMessageKind { key: String, kind: String },
}

/// Pipeline-level failure, caught at the orchestrator boundary and shown
/// to the actor as a single chat line.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
