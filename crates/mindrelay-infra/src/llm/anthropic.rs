//! Anthropic Messages API wire shape.
//!
//! The system prompt goes into the dedicated `system` field; the key is
//! sent as `x-api-key` together with a pinned `anthropic-version`.

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use mindrelay_types::llm::{LlmError, Message, MessageRole, ProviderConfig};

/// The Anthropic API version header value.
pub const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
pub(crate) struct AnthropicRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub temperature: f64,
    pub system: &'a str,
    pub messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnthropicMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

pub(crate) fn body<'a>(
    config: &'a ProviderConfig,
    system_prompt: &'a str,
    tail: &'a [Message],
) -> AnthropicRequest<'a> {
    // The conversation must open with a user turn; a trimmed tail can
    // start on an assistant reply.
    let start = tail
        .iter()
        .position(|m| m.role == MessageRole::User)
        .unwrap_or(tail.len());
    AnthropicRequest {
        model: &config.model,
        max_tokens: config.max_tokens,
        temperature: config.temperature,
        system: system_prompt,
        messages: tail[start..]
            .iter()
            .map(|m| AnthropicMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect(),
    }
}

pub(crate) fn request(
    client: &reqwest::Client,
    config: &ProviderConfig,
    system_prompt: &str,
    tail: &[Message],
) -> Result<reqwest::RequestBuilder, LlmError> {
    Ok(client
        .post(config.endpoint()?)
        .header("x-api-key", config.api_key.expose_secret())
        .header("anthropic-version", API_VERSION)
        .json(&body(config, system_prompt, tail)))
}

/// The first text block of `content`.
pub(crate) fn extract_text(raw: &str) -> Result<String, LlmError> {
    let response: AnthropicResponse =
        serde_json::from_str(raw).map_err(|e| LlmError::Parse(e.to_string()))?;
    response
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .ok_or_else(|| LlmError::Parse("missing content[0].text".to_string()))
}
