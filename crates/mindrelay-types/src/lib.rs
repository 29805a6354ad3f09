//! Shared domain types for mindrelay.
//!
//! Actors and their observable state, parsed directives, LLM provider
//! types, command feedback entries, host inventory records, configuration
//! and the error types shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror, secrecy.

pub mod actor;
pub mod config;
pub mod directive;
pub mod error;
pub mod feedback;
pub mod host;
pub mod interaction;
pub mod llm;
