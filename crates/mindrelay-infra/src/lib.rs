//! Infrastructure layer for mindrelay.
//!
//! Contains implementations of the ports defined in `mindrelay-core`:
//! the HTTP provider gateway (OpenAI-compatible, Anthropic and Gemini wire
//! shapes), SQLite storage for the interaction log and per-actor enable
//! flags, and the TOML configuration file source.

pub mod config;
pub mod llm;
pub mod sqlite;
