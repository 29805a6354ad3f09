//! LLM request/response types for mindrelay.
//!
//! These types model the provider-agnostic side of a model call:
//! conversation turns, the provider selection, the per-call provider
//! configuration, and the error taxonomy of the gateway.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a turn in a conversation history.
///
/// The system prompt is never stored as a turn; each wire format injects it
/// into its own slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// The JSON request/response shape a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// `POST /chat/completions` with a `messages` array and a leading system turn.
    OpenAiChat,
    /// Anthropic Messages API with a dedicated `system` field.
    AnthropicMessages,
    /// Gemini `generateContent` with the model in the URL path.
    GeminiGenerateContent,
}

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    Groq,
    Ollama,
    #[serde(rename = "openrouter")]
    OpenRouter,
    Gemini,
    /// Any OpenAI-compatible endpoint reachable through `base_url`.
    Custom,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 7] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Groq,
        ProviderKind::Ollama,
        ProviderKind::OpenRouter,
        ProviderKind::Gemini,
        ProviderKind::Custom,
    ];

    pub fn wire_format(self) -> WireFormat {
        match self {
            ProviderKind::Anthropic => WireFormat::AnthropicMessages,
            ProviderKind::Gemini => WireFormat::GeminiGenerateContent,
            ProviderKind::OpenAi
            | ProviderKind::Groq
            | ProviderKind::Ollama
            | ProviderKind::OpenRouter
            | ProviderKind::Custom => WireFormat::OpenAiChat,
        }
    }

    /// Endpoint used when no `base_url` override is configured.
    ///
    /// For Gemini this is the API root; the model path is appended per call.
    pub fn default_endpoint(self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("https://api.openai.com/v1/chat/completions"),
            ProviderKind::Anthropic => Some("https://api.anthropic.com/v1/messages"),
            ProviderKind::Groq => Some("https://api.groq.com/openai/v1/chat/completions"),
            ProviderKind::Ollama => Some("http://localhost:11434/v1/chat/completions"),
            ProviderKind::OpenRouter => Some("https://openrouter.ai/api/v1/chat/completions"),
            ProviderKind::Gemini => Some("https://generativelanguage.googleapis.com/v1beta"),
            ProviderKind::Custom => None,
        }
    }

    /// Local/offline providers run without credentials.
    pub fn requires_api_key(self) -> bool {
        !matches!(self, ProviderKind::Ollama)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Anthropic => write!(f, "anthropic"),
            ProviderKind::Groq => write!(f, "groq"),
            ProviderKind::Ollama => write!(f, "ollama"),
            ProviderKind::OpenRouter => write!(f, "openrouter"),
            ProviderKind::Gemini => write!(f, "gemini"),
            ProviderKind::Custom => write!(f, "custom"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "groq" => Ok(ProviderKind::Groq),
            "ollama" => Ok(ProviderKind::Ollama),
            "openrouter" => Ok(ProviderKind::OpenRouter),
            "gemini" => Ok(ProviderKind::Gemini),
            "custom" => Ok(ProviderKind::Custom),
            other => Err(format!("invalid provider: '{other}'")),
        }
    }
}

/// Provider settings for exactly one model call.
///
/// Built fresh from the current configuration on every call so a reload
/// takes effect on the next request. Does not implement `Clone`; the API
/// key is only exposed when a wire request is assembled.
#[derive(Debug)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    pub api_key: SecretString,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub base_url: Option<String>,
    /// `HTTP-Referer` value sent to OpenRouter.
    pub referer: Option<String>,
}

impl ProviderConfig {
    /// The URL the request is posted to, before any provider-specific
    /// path or query decoration.
    pub fn endpoint(&self) -> Result<String, LlmError> {
        match (&self.base_url, self.provider.default_endpoint()) {
            (Some(url), _) => Ok(url.trim_end_matches('/').to_string()),
            (None, Some(url)) => Ok(url.to_string()),
            (None, None) => Err(LlmError::Configuration(format!(
                "provider '{}' requires a base_url",
                self.provider
            ))),
        }
    }
}

/// Errors from the provider gateway.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LlmError {
    /// Connect/read timeout, DNS or connection failure.
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered with a non-2xx status.
    #[error("provider {provider} returned HTTP {status}")]
    Provider { provider: String, status: u16 },

    /// Empty body, invalid JSON, or the text field is missing.
    #[error("could not parse provider response: {0}")]
    Parse(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: ProviderKind, base_url: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            provider,
            api_key: SecretString::from("sk-test"),
            model: "gpt-4".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            base_url: base_url.map(str::to_string),
            referer: None,
        }
    }

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::User, MessageRole::Assistant] {
            let parsed: MessageRole = role.to_string().parse().unwrap();
            assert_eq!(role, parsed);
        }
        assert!("system".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_provider_kind_roundtrip() {
        for kind in ProviderKind::ALL {
            let parsed: ProviderKind = kind.to_string().parse().unwrap();
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn test_provider_kind_parse_is_case_insensitive() {
        assert_eq!("OPENROUTER".parse::<ProviderKind>(), Ok(ProviderKind::OpenRouter));
        assert!("bedrock".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_provider_kind_serde() {
        let json = serde_json::to_string(&ProviderKind::OpenAi).unwrap();
        assert_eq!(json, "\"openai\"");
        let parsed: ProviderKind = serde_json::from_str("\"openrouter\"").unwrap();
        assert_eq!(parsed, ProviderKind::OpenRouter);
    }

    #[test]
    fn test_wire_formats() {
        assert_eq!(ProviderKind::Groq.wire_format(), WireFormat::OpenAiChat);
        assert_eq!(ProviderKind::Ollama.wire_format(), WireFormat::OpenAiChat);
        assert_eq!(ProviderKind::Custom.wire_format(), WireFormat::OpenAiChat);
        assert_eq!(ProviderKind::Anthropic.wire_format(), WireFormat::AnthropicMessages);
        assert_eq!(ProviderKind::Gemini.wire_format(), WireFormat::GeminiGenerateContent);
    }

    #[test]
    fn test_only_ollama_runs_without_key() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.requires_api_key(), kind != ProviderKind::Ollama);
        }
    }

    #[test]
    fn test_endpoint_override_wins() {
        let cfg = config(ProviderKind::OpenAi, Some("http://proxy.local/v1/chat/completions/"));
        assert_eq!(cfg.endpoint().unwrap(), "http://proxy.local/v1/chat/completions");
    }

    #[test]
    fn test_endpoint_defaults() {
        let cfg = config(ProviderKind::Groq, None);
        assert_eq!(
            cfg.endpoint().unwrap(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn test_custom_without_base_url_is_configuration_error() {
        let cfg = config(ProviderKind::Custom, None);
        assert!(matches!(cfg.endpoint(), Err(LlmError::Configuration(_))));
    }

    #[test]
    fn test_provider_error_display() {
        let err = LlmError::Provider {
            provider: "anthropic".to_string(),
            status: 529,
        };
        assert!(err.to_string().contains("anthropic"));
        assert!(err.to_string().contains("529"));
    }

    #[test]
    fn test_provider_config_debug_redacts_key() {
        let cfg = config(ProviderKind::OpenAi, None);
        assert!(!format!("{cfg:?}").contains("sk-test"));
    }
}
