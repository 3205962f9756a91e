use std::collections::HashMap;
use std::sync::Arc;

use crate::core::backends::{OllamaClient, OpenAiCompatClient};
use crate::core::builtin_providers::{load_builtin_providers, ProviderMode, LOCAL_PROVIDER_ID};
use crate::core::completion::CompletionClient;
use crate::core::config::Config;

/// Completion clients keyed by provider id.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    clients: HashMap<String, Arc<dyn CompletionClient>>,
}

impl ClientRegistry {
    /// One client per built-in provider, honouring base URL overrides.
    pub fn from_config(config: &Config, http: reqwest::Client) -> Self {
        let mut registry = Self::default();
        for provider in load_builtin_providers() {
            let base_url = config.base_url_for(&provider.id);
            let client: Arc<dyn CompletionClient> = match provider.mode {
                ProviderMode::Auto => continue,
                ProviderMode::Ollama => Arc::new(OllamaClient::new(http.clone(), base_url)),
                ProviderMode::OpenAi | ProviderMode::Anthropic => Arc::new(
                    OpenAiCompatClient::new(http.clone(), provider.id.clone(), base_url),
                ),
            };
            registry.insert(&provider.id, client);
        }
        registry
    }

    pub fn insert(&mut self, provider: &str, client: Arc<dyn CompletionClient>) {
        self.clients.insert(provider.to_lowercase(), client);
    }

    pub fn with(mut self, provider: &str, client: Arc<dyn CompletionClient>) -> Self {
        self.insert(provider, client);
        self
    }

    pub fn get(&self, provider: &str) -> Option<Arc<dyn CompletionClient>> {
        self.clients.get(&provider.to_lowercase()).cloned()
    }

    pub fn local(&self) -> Option<Arc<dyn CompletionClient>> {
        self.get(LOCAL_PROVIDER_ID)
    }
}
