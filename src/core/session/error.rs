use std::error::Error as StdError;
use std::fmt;

use crate::core::session::state::Pane;

/// Rejections returned by session transitions. A rejected action leaves the
/// state untouched; callers decide whether to surface or swallow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No chat with this id exists.
    ChatNotFound(String),

    /// The message index is outside the chat's transcript.
    InvalidIndex {
        chat_id: String,
        index: usize,
        len: usize,
    },

    /// Only user messages can be edited and answered again.
    NotUserMessage { chat_id: String, index: usize },

    /// A chat with this id is already stored.
    DuplicateChat(String),

    /// The assignment would show the same chat in both panes.
    DuplicatePane(String),

    /// The transition only applies while the split view is open.
    NotSplit,

    /// The pane has no chat assigned.
    EmptyPane(Pane),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::ChatNotFound(id) => write!(f, "chat not found: {id}"),
            StoreError::InvalidIndex {
                chat_id,
                index,
                len,
            } => write!(
                f,
                "message index {index} is out of range for chat {chat_id} ({len} messages)"
            ),
            StoreError::NotUserMessage { chat_id, index } => {
                write!(f, "message {index} of chat {chat_id} is not a user message")
            }
            StoreError::DuplicateChat(id) => write!(f, "chat id already exists: {id}"),
            StoreError::DuplicatePane(id) => {
                write!(f, "chat {id} is already open in the other pane")
            }
            StoreError::NotSplit => write!(f, "split view is not open"),
            StoreError::EmptyPane(pane) => write!(f, "{} pane has no chat", pane.as_str()),
        }
    }
}

impl StdError for StoreError {}

/// Validation failures for the first-run provider setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    UnknownProvider(String),
    MissingApiKey(String),
    MissingModel(String),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::UnknownProvider(id) => write!(f, "unknown provider: {id}"),
            SetupError::MissingApiKey(id) => {
                write!(f, "provider '{id}' requires an API key")
            }
            SetupError::MissingModel(id) => {
                write!(f, "provider '{id}' requires a model to be selected")
            }
        }
    }
}

impl StdError for SetupError {}
