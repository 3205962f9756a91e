use tokio_util::sync::CancellationToken;

pub const STATUS_UNDERSTANDING: &str = "Understanding your message...";
pub const STATUS_THINKING: &str = "Thinking...";
pub const STATUS_CONNECTING: &str = "Connecting to AI...";
pub const STATUS_REASONING: &str = "Reasoning...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Request issued, nothing streamed yet.
    Sending,
    Streaming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TurnKind {
    Send,
    Regenerate,
}

/// Transient, never-persisted state of one pane's in-flight turn.
#[derive(Debug, Default)]
pub struct PaneActivity {
    pub phase: Phase,
    pub content: String,
    pub thinking: String,
    pub status: String,
    /// Provider and model currently answering.
    pub provider: Option<String>,
    pub model: Option<String>,
    pub(crate) chat_id: Option<String>,
    pub(crate) turn_id: u64,
    pub(crate) kind: Option<TurnKind>,
    pub(crate) cancel: Option<CancellationToken>,
}

impl PaneActivity {
    pub fn is_busy(&self) -> bool {
        self.cancel.is_some()
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.chat_id.as_deref()
    }

    pub(crate) fn begin(&mut self, turn_id: u64, chat_id: String, kind: TurnKind) -> CancellationToken {
        let cancel = CancellationToken::new();
        *self = PaneActivity {
            phase: Phase::Sending,
            status: STATUS_UNDERSTANDING.to_string(),
            chat_id: Some(chat_id),
            turn_id,
            kind: Some(kind),
            cancel: Some(cancel.clone()),
            ..PaneActivity::default()
        };
        cancel
    }

    /// Whether an event tagged `turn_id` still belongs to this pane.
    pub(crate) fn accepts(&self, turn_id: u64) -> bool {
        self.turn_id == turn_id
            && self
                .cancel
                .as_ref()
                .is_some_and(|token| !token.is_cancelled())
    }

    pub(crate) fn restart_attempt(&mut self, model: String) {
        self.content.clear();
        self.thinking.clear();
        self.phase = Phase::Sending;
        self.model = Some(model);
    }

    /// Cancel anything in flight and return to idle.
    pub(crate) fn cancel(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        self.finish();
    }

    /// Drop transient output; the turn id is kept so late events stay stale.
    pub(crate) fn finish(&mut self) {
        let turn_id = self.turn_id;
        *self = PaneActivity {
            turn_id,
            ..PaneActivity::default()
        };
    }
}
