//! Streaming completion boundary.
//!
//! A [`CompletionClient`] turns a model, an optional system prompt and a
//! message window into a stream of [`StreamEvent`]s, then returns the
//! accumulated [`Completion`]. Cancellation is cooperative through a
//! [`CancellationToken`] and always surfaces as [`CompletionError::Cancelled`].

use async_trait::async_trait;
use std::fmt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::ChatMessage;
use crate::core::message::Message;

/// Messages sent as conversation context on each turn.
pub const CONTEXT_WINDOW: usize = 20;

/// The trailing [`CONTEXT_WINDOW`] messages of a history.
pub fn context_window(messages: &[Message]) -> &[Message] {
    let start = messages.len().saturating_sub(CONTEXT_WINDOW);
    &messages[start..]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: Option<String>,
    pub messages: Vec<Message>,
    pub api_key: String,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            system: None,
            messages,
            api_key: String::new(),
        }
    }

    pub fn with_system(mut self, system: Option<String>) -> Self {
        self.system = system.filter(|prompt| !prompt.is_empty());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Wire messages: the system prompt first, then the window in order.
    pub fn api_messages(&self) -> Vec<ChatMessage> {
        let mut out = Vec::with_capacity(self.messages.len() + 1);
        if let Some(system) = &self.system {
            out.push(ChatMessage::new("system", system.clone()));
        }
        out.extend(
            self.messages
                .iter()
                .map(|message| ChatMessage::new(message.role.as_str(), message.content.clone())),
        );
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Token(String),
    Reasoning(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub thinking: Option<String>,
}

impl Completion {
    /// Fold one stream event into the accumulated result.
    pub fn push(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::Token(text) => self.content.push_str(text),
            StreamEvent::Reasoning(text) => {
                self.thinking.get_or_insert_with(String::new).push_str(text)
            }
        }
    }
}

#[derive(Debug)]
pub enum CompletionError {
    /// The caller's token fired before the stream finished.
    Cancelled,
    /// Non-success HTTP status; `body` is the formatted response body.
    Http { status: u16, body: String },
    /// An error payload arrived inside an otherwise successful stream.
    Api(String),
    Transport(String),
    Malformed(String),
    MissingApiKey { provider: String },
    /// No backend is registered for the routed provider.
    NoBackend { provider: String },
}

impl CompletionError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CompletionError::Cancelled)
    }
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionError::Cancelled => write!(f, "Request cancelled"),
            CompletionError::Http { status, body } => write!(f, "HTTP {status}: {body}"),
            CompletionError::Api(message) => write!(f, "{message}"),
            CompletionError::Transport(message) => write!(f, "Network error: {message}"),
            CompletionError::Malformed(message) => write!(f, "Malformed response: {message}"),
            CompletionError::MissingApiKey { provider } => {
                write!(f, "No API key configured for {provider}")
            }
            CompletionError::NoBackend { provider } => {
                write!(f, "No backend available for provider {provider}")
            }
        }
    }
}

impl std::error::Error for CompletionError {}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        CompletionError::Transport(err.to_string())
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Provider id this client talks to.
    fn provider(&self) -> &str;

    /// Stream one completion. Events are sent in arrival order; the returned
    /// [`Completion`] holds everything that was streamed.
    async fn stream_completion(
        &self,
        request: CompletionRequest,
        events: mpsc::UnboundedSender<StreamEvent>,
        cancel: CancellationToken,
    ) -> Result<Completion, CompletionError>;

    /// Run a completion without observing the stream.
    async fn complete(
        &self,
        request: CompletionRequest,
        cancel: CancellationToken,
    ) -> Result<Completion, CompletionError> {
        let (tx, _rx) = mpsc::unbounded_channel();
        self.stream_completion(request, tx, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_window_keeps_the_most_recent_messages() {
        let history: Vec<Message> = (0..50).map(|i| Message::user(format!("m{i}"))).collect();
        let window = context_window(&history);
        assert_eq!(window.len(), CONTEXT_WINDOW);
        assert_eq!(window[0].content, "m30");
        assert_eq!(window[CONTEXT_WINDOW - 1].content, "m49");

        let short = vec![Message::user("only")];
        assert_eq!(context_window(&short).len(), 1);
    }

    #[test]
    fn system_prompt_leads_the_wire_messages() {
        let request = CompletionRequest::new(
            "m",
            vec![Message::user("hi"), Message::assistant("hello")],
        )
        .with_system(Some("Use $x$".into()));

        let wire = request.api_messages();
        assert_eq!(wire.len(), 3);
        assert_eq!(wire[0], ChatMessage::new("system", "Use $x$"));
        assert_eq!(wire[1], ChatMessage::new("user", "hi"));
        assert_eq!(wire[2], ChatMessage::new("assistant", "hello"));
    }

    #[test]
    fn empty_system_prompt_is_dropped() {
        let request = CompletionRequest::new("m", vec![Message::user("hi")]).with_system(Some(String::new()));
        assert_eq!(request.api_messages().len(), 1);
    }

    #[test]
    fn completion_accumulates_tokens_and_reasoning() {
        let mut completion = Completion::default();
        completion.push(&StreamEvent::Reasoning("think ".into()));
        completion.push(&StreamEvent::Token("Hel".into()));
        completion.push(&StreamEvent::Reasoning("more".into()));
        completion.push(&StreamEvent::Token("lo".into()));
        assert_eq!(completion.content, "Hello");
        assert_eq!(completion.thinking.as_deref(), Some("think more"));
    }
}
