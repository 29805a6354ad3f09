//! HTTP implementation of the provider gateway.
//!
//! One [`HttpProviderGateway`] serves every provider: the wire shape is
//! picked per call from `ProviderConfig::provider`, so a config reload can
//! switch providers without rebuilding the client.

pub mod anthropic;
pub mod gemini;
pub mod openai_compat;

use std::time::Duration;

use mindrelay_core::llm::gateway::ProviderGateway;
use mindrelay_types::llm::{LlmError, Message, ProviderConfig, WireFormat};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
pub const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Provider gateway over a shared `reqwest` client.
///
/// Holds no credentials; the key arrives with every call inside the
/// `ProviderConfig`.
#[derive(Clone)]
pub struct HttpProviderGateway {
    client: reqwest::Client,
}

impl HttpProviderGateway {
    pub fn new() -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .build()
            .map_err(|e| LlmError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn post(
        &self,
        config: &ProviderConfig,
        system_prompt: &str,
        tail: &[Message],
    ) -> Result<String, LlmError> {
        let wire = config.provider.wire_format();
        let request = match wire {
            WireFormat::OpenAiChat => {
                openai_compat::request(&self.client, config, system_prompt, tail)?
            }
            WireFormat::AnthropicMessages => {
                anthropic::request(&self.client, config, system_prompt, tail)?
            }
            WireFormat::GeminiGenerateContent => {
                gemini::request(&self.client, config, system_prompt, tail)?
            }
        };

        let response = request.send().await.map_err(network_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                provider = %config.provider,
                status = status.as_u16(),
                body = %truncate(&body, 300),
                "provider returned an error status"
            );
            return Err(LlmError::Provider {
                provider: config.provider.to_string(),
                status: status.as_u16(),
            });
        }

        let raw = response.text().await.map_err(network_error)?;
        if raw.trim().is_empty() {
            return Err(LlmError::Parse("empty response body".to_string()));
        }
        match wire {
            WireFormat::OpenAiChat => openai_compat::extract_text(&raw),
            WireFormat::AnthropicMessages => anthropic::extract_text(&raw),
            WireFormat::GeminiGenerateContent => gemini::extract_text(&raw),
        }
    }
}

impl ProviderGateway for HttpProviderGateway {
    async fn send(
        &self,
        config: &ProviderConfig,
        system_prompt: &str,
        tail: &[Message],
    ) -> Result<String, LlmError> {
        let started = std::time::Instant::now();
        let result = self.post(config, system_prompt, tail).await;
        match &result {
            Ok(text) => tracing::debug!(
                provider = %config.provider,
                elapsed_ms = started.elapsed().as_millis() as u64,
                chars = text.len(),
                "provider call completed"
            ),
            Err(e) => tracing::warn!(
                provider = %config.provider,
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %e,
                "provider call failed"
            ),
        }
        result
    }
}

fn network_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Network(format!("request timed out: {e}"))
    } else if e.is_connect() {
        LlmError::Network(format!("connection failed: {e}"))
    } else {
        LlmError::Network(e.to_string())
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
