//! ProviderGateway trait definition.
//!
//! One stateless call per request: build the provider-specific wire body,
//! post it, and decode the reply into plain text.

use mindrelay_types::llm::{LlmError, Message, ProviderConfig};

/// Number of history turns sent with every request.
pub const CONVERSATION_TAIL: usize = 10;

/// Trait for provider wire-protocol backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). The caller
/// passes the already-trimmed conversation tail; the system prompt is
/// placed in whatever slot the wire format offers.
///
/// Implementations live in mindrelay-infra (`HttpProviderGateway`).
/// No automatic retry happens at this layer.
pub trait ProviderGateway: Send + Sync {
    fn send(
        &self,
        config: &ProviderConfig,
        system_prompt: &str,
        tail: &[Message],
    ) -> impl std::future::Future<Output = Result<String, LlmError>> + Send;
}
