//! LLM gateway abstractions for mindrelay.
//!
//! - `ProviderGateway`: RPITIT trait for concrete wire-protocol backends
//! - `BoxProviderGateway`: Object-safe wrapper for dynamic dispatch

pub mod box_gateway;
pub mod gateway;
