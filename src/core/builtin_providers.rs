//! Built-in provider configuration
//!
//! The provider table is embedded from `builtin_providers.toml` at build time
//! and drives setup validation, default model selection, and which wire
//! protocol a backend speaks.

use serde::{Deserialize, Serialize};

pub const LOCAL_PROVIDER_ID: &str = "ollama";
pub const CLOUD_AGGREGATOR_ID: &str = "openrouter";
pub const AUTO_PROVIDER_ID: &str = "auto";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    Ollama,
    #[default]
    OpenAi,
    Anthropic,
    Auto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinProvider {
    pub id: String,
    pub display_name: String,
    pub base_url: String,
    #[serde(default)]
    pub mode: ProviderMode,
    #[serde(default)]
    pub default_model: String,
    #[serde(default)]
    pub requires_key: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct BuiltinProvidersConfig {
    providers: Vec<BuiltinProvider>,
}

impl BuiltinProvider {
    /// Check if this provider uses Anthropic-style authentication
    pub fn is_anthropic_mode(&self) -> bool {
        self.mode == ProviderMode::Anthropic
    }

    pub fn is_local(&self) -> bool {
        self.mode == ProviderMode::Ollama
    }
}

/// Load built-in providers from the embedded configuration
pub fn load_builtin_providers() -> Vec<BuiltinProvider> {
    const CONFIG_CONTENT: &str = include_str!("../builtin_providers.toml");

    let config: BuiltinProvidersConfig =
        toml::from_str(CONFIG_CONTENT).expect("Failed to parse builtin_providers.toml");

    config.providers
}

/// Find a built-in provider by ID (case-insensitive)
pub fn find_builtin_provider(id: &str) -> Option<BuiltinProvider> {
    load_builtin_providers()
        .into_iter()
        .find(|p| p.id.eq_ignore_ascii_case(id))
}

/// Default model for a provider, or an empty string when it has none.
pub fn default_model_for(provider: &str) -> String {
    find_builtin_provider(provider)
        .map(|p| p.default_model)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_builtin_providers() {
        let providers = load_builtin_providers();
        let provider_ids: Vec<&str> = providers.iter().map(|p| p.id.as_str()).collect();
        assert!(provider_ids.contains(&LOCAL_PROVIDER_ID));
        assert!(provider_ids.contains(&CLOUD_AGGREGATOR_ID));
        assert!(provider_ids.contains(&AUTO_PROVIDER_ID));
        assert!(provider_ids.contains(&"anthropic"));
    }

    #[test]
    fn test_find_builtin_provider() {
        let provider = find_builtin_provider("OpenRouter").expect("case-insensitive lookup");
        assert_eq!(provider.id, "openrouter");
        assert!(provider.requires_key);

        assert!(find_builtin_provider("nonexistent").is_none());
    }

    #[test]
    fn test_provider_modes() {
        assert!(find_builtin_provider("anthropic").unwrap().is_anthropic_mode());
        assert!(find_builtin_provider("ollama").unwrap().is_local());
        assert_eq!(
            find_builtin_provider("auto").unwrap().mode,
            ProviderMode::Auto
        );
        assert_eq!(
            find_builtin_provider("openai").unwrap().mode,
            ProviderMode::OpenAi
        );
    }

    #[test]
    fn test_remote_providers_have_https_endpoints() {
        for provider in load_builtin_providers() {
            assert!(!provider.id.is_empty());
            assert!(!provider.display_name.is_empty());
            if matches!(provider.mode, ProviderMode::OpenAi | ProviderMode::Anthropic) {
                assert!(provider.base_url.starts_with("https://"));
                assert!(provider.requires_key);
            }
        }
    }

    #[test]
    fn default_models_follow_the_table() {
        assert_eq!(default_model_for("ollama"), "deepseek-r1:1.5b");
        assert_eq!(default_model_for("openai"), "gpt-4o");
        assert_eq!(default_model_for("missing"), "");
    }
}
