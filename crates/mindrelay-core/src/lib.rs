//! Request orchestration and port definitions for mindrelay.
//!
//! This crate defines the "ports" (gateway, repository, host and config
//! traits) that the infrastructure layer implements, and every piece of
//! state-machine logic between a chat trigger and a dispatched command. It
//! depends only on `mindrelay-types` -- never on `mindrelay-infra` or any
//! network/database crate.

pub mod abbreviation;
pub mod admin;
pub mod config;
pub mod context;
pub mod conversation;
pub mod delivery;
pub mod host;
pub mod ledger;
pub mod llm;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod repository;
pub mod retry;
pub mod supervisor;
pub mod toggle;
pub mod trigger;

#[cfg(test)]
pub(crate) mod testing;
