//! Provider routing.
//!
//! [`decide_route`] is the pure policy: given the chat's provider/model and
//! what is known about the local daemon and the conversation, pick where the
//! next turn goes. [`Router`] gathers those signals (liveness probe, intent
//! classification) and [`complete_with_fallback`] walks a cloud route's
//! candidate list.

mod classify;
mod fallback;


use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use crate::core::backends::OllamaClient;
use crate::core::builtin_providers::{
    default_model_for, AUTO_PROVIDER_ID, CLOUD_AGGREGATOR_ID, LOCAL_PROVIDER_ID,
};
use crate::core::chat::ChatConfig;
use crate::core::completion::CompletionClient;
use crate::core::config::RoutingConfig;
use crate::core::message::Message;

pub use classify::{classification_request, parse_intent};
pub use fallback::{complete_with_fallback, FallbackSuccess, RouteEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Coding,
    General,
}

/// What the router knows when it decides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingSignals {
    pub local_available: bool,
    pub intent: Option<Intent>,
    /// Messages in the conversation, including the pending user message.
    pub message_count: usize,
    /// Classification was attempted and failed.
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub provider: String,
    pub model: String,
    /// Alternates tried in order after `model` fails.
    pub fallbacks: Vec<String>,
}

impl Route {
    pub fn direct(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            fallbacks: Vec::new(),
        }
    }

    /// The primary model followed by its fallbacks.
    pub fn candidates(&self) -> Vec<String> {
        std::iter::once(self.model.clone())
            .chain(self.fallbacks.iter().cloned())
            .collect()
    }

    pub fn is_local(&self) -> bool {
        self.provider == LOCAL_PROVIDER_ID
    }
}

/// Checkpoints fall on the 2nd user message and every 4th after it.
pub fn is_checkpoint(user_messages: usize) -> bool {
    user_messages >= 2 && (user_messages - 2) % 4 == 0
}

fn cloud_route(model: &str, settings: &RoutingConfig) -> Route {
    let mut fallbacks: Vec<String> = Vec::new();
    for candidate in &settings.fallback_models {
        if candidate != model && !fallbacks.contains(candidate) {
            fallbacks.push(candidate.clone());
        }
    }
    Route {
        provider: CLOUD_AGGREGATOR_ID.to_string(),
        model: model.to_string(),
        fallbacks,
    }
}

pub fn decide_route(selector: &ChatConfig, signals: &RoutingSignals, settings: &RoutingConfig) -> Route {
    if selector.provider != AUTO_PROVIDER_ID {
        let model = if selector.model.is_empty() {
            default_model_for(&selector.provider)
        } else {
            selector.model.clone()
        };
        return Route::direct(selector.provider.clone(), model);
    }

    if signals.degraded {
        return cloud_route(&settings.general_model, settings);
    }
    if signals.intent == Some(Intent::Coding) {
        return cloud_route(&settings.coding_model, settings);
    }
    if signals.local_available && signals.message_count <= settings.early_session_limit {
        return Route::direct(LOCAL_PROVIDER_ID, settings.local_model());
    }
    cloud_route(&settings.general_model, settings)
}

/// Liveness check for the local daemon.
#[async_trait]
pub trait LocalProbe: Send + Sync {
    async fn is_available(&self, timeout: Duration) -> bool;
}

#[async_trait]
impl LocalProbe for OllamaClient {
    async fn is_available(&self, timeout: Duration) -> bool {
        self.probe(timeout).await
    }
}

/// Signal gathering for `auto` chats. Cloning shares the per-chat intent cache.
#[derive(Clone)]
pub struct Router {
    settings: RoutingConfig,
    probe: Arc<dyn LocalProbe>,
    classifier: Arc<dyn CompletionClient>,
    intents: Arc<Mutex<HashMap<String, Intent>>>,
}

impl Router {
    pub fn new(
        settings: RoutingConfig,
        probe: Arc<dyn LocalProbe>,
        classifier: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            settings,
            probe,
            classifier,
            intents: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn cached_intent(&self, chat_id: &str) -> Option<Intent> {
        self.intents
            .lock()
            .ok()
            .and_then(|intents| intents.get(chat_id).copied())
    }

    fn remember_intent(&self, chat_id: &str, intent: Intent) {
        if let Ok(mut intents) = self.intents.lock() {
            intents.insert(chat_id.to_string(), intent);
        }
    }

    pub fn forget(&self, chat_id: &str) {
        if let Ok(mut intents) = self.intents.lock() {
            intents.remove(chat_id);
        }
    }

    /// Drop every cached intent.
    pub fn clear(&self) {
        if let Ok(mut intents) = self.intents.lock() {
            intents.clear();
        }
    }

    /// Decide where the next turn of `chat_id` goes. `history` already holds
    /// the pending user message.
    pub async fn resolve(&self, chat_id: &str, selector: &ChatConfig, history: &[Message]) -> Route {
        if selector.provider != AUTO_PROVIDER_ID {
            return decide_route(selector, &RoutingSignals::default(), &self.settings);
        }

        let local_available = self.probe.is_available(self.settings.probe_timeout()).await;
        let user_messages = history.iter().filter(|m| m.is_user()).count();
        let mut signals = RoutingSignals {
            local_available,
            intent: self.cached_intent(chat_id),
            message_count: history.len(),
            degraded: false,
        };

        if local_available && is_checkpoint(user_messages) {
            match self.classify(history).await {
                Some(intent) => {
                    self.remember_intent(chat_id, intent);
                    signals.intent = Some(intent);
                }
                None => signals.degraded = true,
            }
        }

        let route = decide_route(selector, &signals, &self.settings);
        debug!(
            chat_id,
            local_available,
            intent = ?signals.intent,
            degraded = signals.degraded,
            provider = %route.provider,
            model = %route.model,
            "Resolved auto route"
        );
        route
    }

    async fn classify(&self, history: &[Message]) -> Option<Intent> {
        let request = classification_request(&self.settings.local_model(), history);
        let cancel = tokio_util::sync::CancellationToken::new();
        let call = self.classifier.complete(request, cancel);
        match tokio::time::timeout(self.settings.classify_timeout(), call).await {
            Ok(Ok(completion)) => parse_intent(&completion.content),
            Ok(Err(err)) => {
                debug!(error = %err, "Intent classification failed");
                None
            }
            Err(_) => {
                debug!("Intent classification timed out");
                None
            }
        }
    }
}
