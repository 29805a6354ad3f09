//! BoxProviderGateway -- object-safe dynamic dispatch wrapper for ProviderGateway.
//!
//! 1. Define an object-safe `ProviderGatewayDyn` trait with boxed futures
//! 2. Blanket-impl `ProviderGatewayDyn` for all `T: ProviderGateway`
//! 3. `BoxProviderGateway` wraps `Box<dyn ProviderGatewayDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use mindrelay_types::llm::{LlmError, Message, ProviderConfig};

use super::gateway::ProviderGateway;

/// Object-safe version of [`ProviderGateway`] with boxed futures.
pub trait ProviderGatewayDyn: Send + Sync {
    fn send_boxed<'a>(
        &'a self,
        config: &'a ProviderConfig,
        system_prompt: &'a str,
        tail: &'a [Message],
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>>;
}

impl<T: ProviderGateway> ProviderGatewayDyn for T {
    fn send_boxed<'a>(
        &'a self,
        config: &'a ProviderConfig,
        system_prompt: &'a str,
        tail: &'a [Message],
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        Box::pin(self.send(config, system_prompt, tail))
    }
}

/// Type-erased gateway so the orchestrator can be built without naming
/// the concrete HTTP client (or a scripted test double).
pub struct BoxProviderGateway {
    inner: Box<dyn ProviderGatewayDyn + Send + Sync>,
}

impl BoxProviderGateway {
    pub fn new<T: ProviderGateway + 'static>(gateway: T) -> Self {
        Self {
            inner: Box::new(gateway),
        }
    }

    pub async fn send(
        &self,
        config: &ProviderConfig,
        system_prompt: &str,
        tail: &[Message],
    ) -> Result<String, LlmError> {
        self.inner.send_boxed(config, system_prompt, tail).await
    }
}
