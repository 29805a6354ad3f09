//! Configuration types for mindrelay.
//!
//! `RelayConfig` represents the top-level `config.toml`. Every section has
//! defaults so a file containing only `[provider]` credentials is enough.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::host::Notice;
use crate::llm::ProviderKind;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub provider: ProviderSection,

    #[serde(default)]
    pub trigger: TriggerSection,

    #[serde(default)]
    pub database: DatabaseSection,

    #[serde(default)]
    pub supervisor: SupervisorSection,

    #[serde(default)]
    pub features: FeatureFlags,

    /// Overrides for local feedback messages, keyed by message name
    /// (`request-sent`, `gpt-enabled`, ...).
    #[serde(default)]
    pub messages: HashMap<String, MessageTemplate>,
}

impl RelayConfig {
    /// Check the fields whose absence makes the bridge unusable.
    pub fn validate(&self) -> Result<ProviderKind, ConfigError> {
        let kind = self.provider.kind()?;
        if kind.requires_api_key() && self.provider.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey(kind.to_string()));
        }
        if kind == ProviderKind::Custom && self.provider.base_url.is_none() {
            return Err(ConfigError::MissingBaseUrl(kind.to_string()));
        }
        for (key, template) in &self.messages {
            template.kind(key)?;
        }
        Ok(kind)
    }

    /// The configured override for `message`, if any.
    pub fn message(&self, message: FeedbackMessage) -> Option<&MessageTemplate> {
        self.messages.get(message.key())
    }
}

/// `[provider]`: which LLM to call and how.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderSection {
    /// Provider name, case-insensitive (`openai`, `anthropic`, `groq`,
    /// `ollama`, `openrouter`, `gemini`, `custom`).
    #[serde(default = "default_provider_kind")]
    pub kind: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Full endpoint URL (API root for Gemini). Required for `custom`.
    #[serde(default)]
    pub base_url: Option<String>,

    /// `HTTP-Referer` sent to OpenRouter.
    #[serde(default)]
    pub referer: Option<String>,
}

impl ProviderSection {
    pub fn kind(&self) -> Result<ProviderKind, ConfigError> {
        self.kind
            .parse()
            .map_err(|_| ConfigError::UnknownProvider(self.kind.clone()))
    }
}

// Hand-written so the key never reaches a log line.
impl fmt::Debug for ProviderSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSection")
            .field("kind", &self.kind)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("base_url", &self.base_url)
            .field("referer", &self.referer)
            .finish()
    }
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
            api_key: String::new(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            base_url: None,
            referer: None,
        }
    }
}

fn default_provider_kind() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_temperature() -> f64 {
    0.7
}

/// `[trigger]`: how chat messages are recognised as requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerSection {
    #[serde(default = "default_marker")]
    pub marker: String,
}

impl Default for TriggerSection {
    fn default() -> Self {
        Self {
            marker: default_marker(),
        }
    }
}

fn default_marker() -> String {
    "gpt,".to_string()
}

/// `[database]`: where the interaction log and enable flags live.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSection {
    /// SQLite URL. Defaults to `mindrelay.db` under the data directory.
    #[serde(default)]
    pub url: Option<String>,
}

/// `[supervisor]`: command outcome observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorSection {
    /// Pause after dispatch before the outcome is classified.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for SupervisorSection {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

fn default_settle_delay_ms() -> u64 {
    250
}

/// `[features]`: optional prompt sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Annotate known abbreviations in the request.
    #[serde(default = "default_true")]
    pub abbreviations: bool,

    /// Tell the model to only use commands from the plugin inventory.
    #[serde(default = "default_true")]
    pub plugin_awareness: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            abbreviations: true,
            plugin_awareness: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Local feedback messages that can be overridden in `[messages.<key>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackMessage {
    RequestSent,
    GptEnabled,
    GptDisabled,
    ReloadSuccess,
    NoPermission,
}

impl FeedbackMessage {
    pub fn key(self) -> &'static str {
        match self {
            FeedbackMessage::RequestSent => "request-sent",
            FeedbackMessage::GptEnabled => "gpt-enabled",
            FeedbackMessage::GptDisabled => "gpt-disabled",
            FeedbackMessage::ReloadSuccess => "reload-success",
            FeedbackMessage::NoPermission => "no-permission",
        }
    }

    /// Chat text used when no override is configured.
    pub fn default_text(self) -> &'static str {
        match self {
            FeedbackMessage::RequestSent => "&a[MindRelay] Request sent to the assistant...",
            FeedbackMessage::GptEnabled => "&a[MindRelay] Assistant enabled!",
            FeedbackMessage::GptDisabled => "&c[MindRelay] Assistant disabled!",
            FeedbackMessage::ReloadSuccess => "&a[MindRelay] Configuration reloaded.",
            FeedbackMessage::NoPermission => "&cYou do not have permission to use this command.",
        }
    }
}

/// How an overridden message is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Chat,
    Title,
    ActionBar,
}

/// One `[messages.<key>]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplate {
    /// `chat`, `title` or `actionbar`, case-insensitive.
    #[serde(default = "default_message_kind", rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
}

fn default_message_kind() -> String {
    "chat".to_string()
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

impl MessageTemplate {
    pub fn kind(&self, key: &str) -> Result<MessageKind, ConfigError> {
        match self.kind.to_lowercase().as_str() {
            "chat" => Ok(MessageKind::Chat),
            "title" => Ok(MessageKind::Title),
            "actionbar" => Ok(MessageKind::ActionBar),
            other => Err(ConfigError::UnknownMessageKind {
                key: key.to_string(),
                kind: other.to_string(),
            }),
        }
    }

    /// The notice to show, or `None` when the relevant fields are blank.
    pub fn to_notice(&self, key: &str) -> Option<Notice> {
        match self.kind(key).ok()? {
            MessageKind::Chat => non_blank(&self.content).map(|text| Notice::Chat {
                text: text.to_string(),
            }),
            MessageKind::ActionBar => non_blank(&self.content).map(|text| Notice::ActionBar {
                text: text.to_string(),
            }),
            MessageKind::Title => {
                if non_blank(&self.title).is_none() && non_blank(&self.subtitle).is_none() {
                    return None;
                }
                Some(Notice::Title {
                    title: self.title.clone().unwrap_or_default(),
                    subtitle: self.subtitle.clone().unwrap_or_default(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_config_deserialize_with_defaults() {
        let config: RelayConfig = toml::from_str("").unwrap();
        assert_eq!(config.provider.kind, "openai");
        assert_eq!(config.provider.model, "gpt-4");
        assert_eq!(config.provider.max_tokens, 500);
        assert!((config.provider.temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.trigger.marker, "gpt,");
        assert_eq!(config.supervisor.settle_delay_ms, 250);
        assert!(config.features.abbreviations);
        assert!(config.features.plugin_awareness);
        assert!(config.messages.is_empty());
    }

    #[test]
    fn test_relay_config_deserialize_with_values() {
        let toml_str = r#"
[provider]
kind = "OpenRouter"
api_key = "sk-or-123"
model = "meta-llama/llama-3-70b"
referer = "https://example.net"

[trigger]
marker = "ai:"

[features]
abbreviations = false

[messages.request-sent]
type = "actionbar"
content = "&eThinking..."
"#;
        let config: RelayConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.validate().unwrap(), ProviderKind::OpenRouter);
        assert_eq!(config.trigger.marker, "ai:");
        assert!(!config.features.abbreviations);
        assert!(config.features.plugin_awareness);

        let template = config.message(FeedbackMessage::RequestSent).unwrap();
        assert_eq!(
            template.to_notice("request-sent"),
            Some(Notice::ActionBar {
                text: "&eThinking...".to_string()
            })
        );
    }

    #[test]
    fn test_validate_rejects_unknown_provider() {
        let mut config = RelayConfig::default();
        config.provider.kind = "bedrock".to_string();
        config.provider.api_key = "k".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownProvider(kind)) if kind == "bedrock"
        ));
    }

    #[test]
    fn test_validate_requires_key_except_ollama() {
        let mut config = RelayConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingApiKey(_))
        ));

        config.provider.kind = "ollama".to_string();
        assert_eq!(config.validate().unwrap(), ProviderKind::Ollama);
    }

    #[test]
    fn test_validate_custom_needs_base_url() {
        let mut config = RelayConfig::default();
        config.provider.kind = "custom".to_string();
        config.provider.api_key = "k".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingBaseUrl(_))
        ));

        config.provider.base_url = Some("http://llm.lan/v1/chat/completions".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_message_kind() {
        let toml_str = r#"
[provider]
kind = "ollama"

[messages.gpt-enabled]
type = "bossbar"
content = "on"
"#;
        let config: RelayConfig = toml::from_str(toml_str).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownMessageKind { .. })
        ));
    }

    #[test]
    fn test_blank_templates_produce_no_notice() {
        let template = MessageTemplate {
            kind: "title".to_string(),
            content: None,
            title: Some("  ".to_string()),
            subtitle: None,
        };
        assert_eq!(template.to_notice("gpt-enabled"), None);

        let chat = MessageTemplate {
            kind: "CHAT".to_string(),
            content: Some(String::new()),
            title: None,
            subtitle: None,
        };
        assert_eq!(chat.to_notice("gpt-enabled"), None);
    }

    #[test]
    fn test_title_template_keeps_missing_half_empty() {
        let template = MessageTemplate {
            kind: "title".to_string(),
            content: None,
            title: Some("&aOn".to_string()),
            subtitle: None,
        };
        assert_eq!(
            template.to_notice("gpt-enabled"),
            Some(Notice::Title {
                title: "&aOn".to_string(),
                subtitle: String::new(),
            })
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let mut config = RelayConfig::default();
        config.provider.api_key = "sk-very-secret".to_string();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
