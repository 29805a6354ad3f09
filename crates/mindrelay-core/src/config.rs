//! Configuration port.
//!
//! The orchestrator never caches provider settings: every model call asks
//! the source for the current config, so a reload applies to the next
//! request.

use std::sync::Arc;

use arc_swap::ArcSwap;
use mindrelay_types::config::RelayConfig;
use mindrelay_types::error::ConfigError;
use mindrelay_types::llm::ProviderConfig;
use secrecy::SecretString;

pub trait ConfigSource: Send + Sync {
    /// The configuration in effect right now.
    fn current(&self) -> Arc<RelayConfig>;

    /// Re-read the backing store. On error the current config is kept.
    fn reload(&self) -> Result<(), ConfigError>;
}

/// Derive the per-call provider settings from `config`.
pub fn provider_config(config: &RelayConfig) -> Result<ProviderConfig, ConfigError> {
    let provider = config.validate()?;
    let section = &config.provider;
    Ok(ProviderConfig {
        provider,
        api_key: SecretString::from(section.api_key.clone()),
        model: section.model.clone(),
        max_tokens: section.max_tokens,
        temperature: section.temperature,
        base_url: section.base_url.clone(),
        referer: section.referer.clone(),
    })
}

/// In-memory source; `reload` is a no-op and `replace` swaps the config.
pub struct StaticConfigSource {
    current: ArcSwap<RelayConfig>,
}

impl StaticConfigSource {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            current: ArcSwap::from_pointee(config),
        }
    }

    pub fn replace(&self, config: RelayConfig) {
        self.current.store(Arc::new(config));
    }
}

impl ConfigSource for StaticConfigSource {
    fn current(&self) -> Arc<RelayConfig> {
        self.current.load_full()
    }

    fn reload(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindrelay_types::llm::ProviderKind;
    use secrecy::ExposeSecret;

    #[test]
    fn test_provider_config_from_relay_config() {
        let mut config = RelayConfig::default();
        config.provider.kind = "Anthropic".to_string();
        config.provider.api_key = "sk-ant".to_string();
        config.provider.model = "claude-3-haiku".to_string();

        let provider = provider_config(&config).unwrap();
        assert_eq!(provider.provider, ProviderKind::Anthropic);
        assert_eq!(provider.api_key.expose_secret(), "sk-ant");
        assert_eq!(provider.model, "claude-3-haiku");
        assert_eq!(provider.max_tokens, 500);
    }

    #[test]
    fn test_provider_config_rejects_invalid() {
        let config = RelayConfig::default();
        assert!(matches!(
            provider_config(&config),
            Err(ConfigError::MissingApiKey(_))
        ));
    }

    #[test]
    fn test_static_source_replace_is_visible() {
        let source = StaticConfigSource::new(RelayConfig::default());
        assert_eq!(source.current().trigger.marker, "gpt,");

        let mut updated = RelayConfig::default();
        updated.trigger.marker = "ai,".to_string();
        source.replace(updated);
        assert_eq!(source.current().trigger.marker, "ai,");
        assert!(source.reload().is_ok());
    }
}
