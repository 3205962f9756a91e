use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::core::message::Message;

pub const DEFAULT_CHAT_TITLE: &str = "New Chat";

/// Per-chat provider/model override. When absent the session-wide defaults
/// apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConfig {
    pub provider: String,
    pub model: String,
}

/// Partial update applied by `update_chat_config`; unset fields keep their
/// current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatConfigPatch {
    pub provider: Option<String>,
    pub model: Option<String>,
}

impl ChatConfigPatch {
    pub fn model(model: impl Into<String>) -> Self {
        Self {
            provider: None,
            model: Some(model.into()),
        }
    }

    pub fn provider(provider: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            model: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ChatConfig>,
}

impl Chat {
    pub fn new(id: impl Into<String>, config: Option<ChatConfig>) -> Self {
        Self {
            id: id.into(),
            title: DEFAULT_CHAT_TITLE.to_string(),
            messages: Vec::new(),
            config,
        }
    }

    pub fn apply_config_patch(&mut self, patch: ChatConfigPatch, fallback: &ChatConfig) {
        let base = self.config.clone().unwrap_or_else(|| fallback.clone());
        self.config = Some(ChatConfig {
            provider: patch.provider.unwrap_or(base.provider),
            model: patch.model.unwrap_or(base.model),
        });
    }
}

/// Derive a chat id from the current time in microseconds, bumping past any
/// id already in use so two chats created in the same tick stay distinct.
pub fn generate_chat_id(is_taken: impl Fn(&str) -> bool) -> String {
    let mut stamp = Utc::now().timestamp_micros();
    loop {
        let candidate = stamp.to_string();
        if !is_taken(&candidate) {
            return candidate;
        }
        stamp += 1;
    }
}
