use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::builtin_providers::{default_model_for, CLOUD_AGGREGATOR_ID, LOCAL_PROVIDER_ID};
use crate::core::chat::{Chat, ChatConfig, ChatConfigPatch};
use crate::core::message::Message;
use crate::core::session::error::StoreError;

/// Credential baked in at build time for the cloud aggregator, used when the
/// user has not stored one.
pub(crate) const BUNDLED_OPENROUTER_KEY: Option<&str> = option_env!("SPLITCHAT_OPENROUTER_KEY");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Single,
    Split,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pane {
    #[default]
    Primary,
    Secondary,
}

impl Pane {
    pub fn as_str(self) -> &'static str {
        match self {
            Pane::Primary => "primary",
            Pane::Secondary => "secondary",
        }
    }

    pub fn other(self) -> Pane {
        match self {
            Pane::Primary => Pane::Secondary,
            Pane::Secondary => Pane::Primary,
        }
    }
}

/// The pair of chats that was open side by side before the split collapsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPair {
    pub primary_chat_id: String,
    pub secondary_chat_id: String,
}

impl SplitPair {
    pub fn contains(&self, chat_id: &str) -> bool {
        self.primary_chat_id == chat_id || self.secondary_chat_id == chat_id
    }
}

/// Everything the client persists between launches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    pub has_completed_setup: bool,
    pub provider: String,
    pub model: String,
    pub api_keys: HashMap<String, String>,
    pub chats: Vec<Chat>,
    pub current_chat_id: Option<String>,
    pub layout: Layout,
    pub active_pane: Pane,
    pub primary_chat_id: Option<String>,
    pub secondary_chat_id: Option<String>,
    pub last_split_state: Option<SplitPair>,
    pub sidebar_open: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            has_completed_setup: false,
            provider: LOCAL_PROVIDER_ID.to_string(),
            model: String::new(),
            api_keys: HashMap::new(),
            chats: Vec::new(),
            current_chat_id: None,
            layout: Layout::Single,
            active_pane: Pane::Primary,
            primary_chat_id: None,
            secondary_chat_id: None,
            last_split_state: None,
            sidebar_open: true,
        }
    }
}

impl SessionState {
    pub fn chat(&self, chat_id: &str) -> Option<&Chat> {
        self.chats.iter().find(|chat| chat.id == chat_id)
    }

    pub fn contains_chat(&self, chat_id: &str) -> bool {
        self.chat(chat_id).is_some()
    }

    pub(crate) fn chat_mut(&mut self, chat_id: &str) -> Result<&mut Chat, StoreError> {
        self.chats
            .iter_mut()
            .find(|chat| chat.id == chat_id)
            .ok_or_else(|| StoreError::ChatNotFound(chat_id.to_string()))
    }

    pub(crate) fn require_chat(&self, chat_id: &str) -> Result<(), StoreError> {
        if self.contains_chat(chat_id) {
            Ok(())
        } else {
            Err(StoreError::ChatNotFound(chat_id.to_string()))
        }
    }

    pub fn pane_chat_id(&self, pane: Pane) -> Option<&str> {
        match pane {
            Pane::Primary => self.primary_chat_id.as_deref(),
            Pane::Secondary => self.secondary_chat_id.as_deref(),
        }
    }

    pub fn pane_of(&self, chat_id: &str) -> Option<Pane> {
        if self.primary_chat_id.as_deref() == Some(chat_id) {
            Some(Pane::Primary)
        } else if self.secondary_chat_id.as_deref() == Some(chat_id) {
            Some(Pane::Secondary)
        } else {
            None
        }
    }

    pub fn is_split(&self) -> bool {
        self.layout == Layout::Split
    }

    /// Global provider/model defaults, with the provider's built-in model
    /// filling in when none was chosen.
    pub fn default_config(&self) -> ChatConfig {
        let model = if self.model.is_empty() {
            default_model_for(&self.provider)
        } else {
            self.model.clone()
        };
        ChatConfig {
            provider: self.provider.clone(),
            model,
        }
    }

    /// The chat's own override, or the global defaults when it has none.
    pub fn effective_config(&self, chat_id: Option<&str>) -> ChatConfig {
        chat_id
            .and_then(|id| self.chat(id))
            .and_then(|chat| chat.config.clone())
            .unwrap_or_else(|| self.default_config())
    }

    pub fn add_chat(&mut self, chat: Chat) -> Result<(), StoreError> {
        self.insert_chat(chat.clone())?;
        self.current_chat_id = Some(chat.id.clone());
        self.primary_chat_id = Some(chat.id);
        self.active_pane = Pane::Primary;
        Ok(())
    }

    /// Store a chat without touching pane assignment.
    pub(crate) fn insert_chat(&mut self, chat: Chat) -> Result<(), StoreError> {
        if self.contains_chat(&chat.id) {
            return Err(StoreError::DuplicateChat(chat.id));
        }
        self.chats.insert(0, chat);
        Ok(())
    }

    pub fn add_message(&mut self, chat_id: &str, message: Message) -> Result<(), StoreError> {
        self.chat_mut(chat_id)?.messages.push(message);
        Ok(())
    }

    pub fn edit_message(
        &mut self,
        chat_id: &str,
        index: usize,
        content: impl Into<String>,
    ) -> Result<(), StoreError> {
        let chat = self.chat_mut(chat_id)?;
        let len = chat.messages.len();
        let message = chat
            .messages
            .get_mut(index)
            .ok_or_else(|| StoreError::InvalidIndex {
                chat_id: chat_id.to_string(),
                index,
                len,
            })?;
        message.content = content.into();
        Ok(())
    }

    /// Check that message `index` exists and was written by the user.
    pub fn require_user_message(&self, chat_id: &str, index: usize) -> Result<(), StoreError> {
        let chat = self
            .chat(chat_id)
            .ok_or_else(|| StoreError::ChatNotFound(chat_id.to_string()))?;
        match chat.messages.get(index) {
            Some(message) if message.is_user() => Ok(()),
            Some(_) => Err(StoreError::NotUserMessage {
                chat_id: chat_id.to_string(),
                index,
            }),
            None => Err(StoreError::InvalidIndex {
                chat_id: chat_id.to_string(),
                index,
                len: chat.messages.len(),
            }),
        }
    }

    /// Keep messages `0..=index`, dropping everything after.
    pub fn delete_messages_after(&mut self, chat_id: &str, index: usize) -> Result<(), StoreError> {
        let chat = self.chat_mut(chat_id)?;
        let len = chat.messages.len();
        if index >= len {
            return Err(StoreError::InvalidIndex {
                chat_id: chat_id.to_string(),
                index,
                len,
            });
        }
        chat.messages.truncate(index + 1);
        Ok(())
    }

    pub fn update_chat_title(
        &mut self,
        chat_id: &str,
        title: impl Into<String>,
    ) -> Result<(), StoreError> {
        self.chat_mut(chat_id)?.title = title.into();
        Ok(())
    }

    pub fn update_chat_config(
        &mut self,
        chat_id: &str,
        patch: ChatConfigPatch,
    ) -> Result<(), StoreError> {
        let fallback = self.default_config();
        self.chat_mut(chat_id)?.apply_config_patch(patch, &fallback);
        Ok(())
    }

    pub fn delete_chat(&mut self, chat_id: &str) -> Result<(), StoreError> {
        self.require_chat(chat_id)?;
        self.chats.retain(|chat| chat.id != chat_id);

        if self
            .last_split_state
            .as_ref()
            .is_some_and(|pair| pair.contains(chat_id))
        {
            self.last_split_state = None;
        }

        if self.current_chat_id.as_deref() == Some(chat_id) {
            self.current_chat_id = None;
        }

        let was_primary = self.primary_chat_id.as_deref() == Some(chat_id);
        let was_secondary = self.secondary_chat_id.as_deref() == Some(chat_id);

        if self.is_split() && (was_primary || was_secondary) {
            // The survivor takes over a single-pane layout.
            let survivor = if was_primary {
                self.secondary_chat_id.take()
            } else {
                self.secondary_chat_id = None;
                self.primary_chat_id.clone()
            };
            self.primary_chat_id = survivor.clone();
            self.layout = Layout::Single;
            self.active_pane = Pane::Primary;
            self.current_chat_id = survivor;
            self.last_split_state = None;
        } else if was_primary {
            self.primary_chat_id = None;
        }

        Ok(())
    }

    /// Stored credential, then the bundled aggregator key, then empty.
    pub fn api_key(&self, provider: &str) -> String {
        if let Some(key) = self.api_keys.get(provider).filter(|key| !key.is_empty()) {
            return key.clone();
        }
        if provider == CLOUD_AGGREGATOR_ID {
            if let Some(key) = BUNDLED_OPENROUTER_KEY {
                return key.to_string();
            }
        }
        String::new()
    }

    pub fn set_provider(&mut self, provider: impl Into<String>) {
        self.provider = provider.into();
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn set_api_key(&mut self, provider: impl Into<String>, key: impl Into<String>) {
        self.api_keys.insert(provider.into(), key.into());
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    pub fn reset(&mut self) {
        *self = SessionState::default();
    }
}
