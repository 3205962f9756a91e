//! Turn orchestration.
//!
//! The [`Orchestrator`] owns the session store and is its only writer. Each
//! pane runs at most one turn at a time as a spawned task; tasks report back
//! over a channel as [`OrchestratorEvent`]s tagged with the pane and turn id,
//! and [`Orchestrator::handle_event`] applies them on the caller's loop.
//! Events from a stopped or superseded turn are dropped.

mod pane;
mod title;
mod turn;


use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::backends::{ClientRegistry, OllamaClient};
use crate::core::builtin_providers::{load_builtin_providers, LOCAL_PROVIDER_ID};
use crate::core::chat::{generate_chat_id, Chat};
use crate::core::completion::{context_window, CompletionError, StreamEvent};
use crate::core::config::Config;
use crate::core::message::Message;
use crate::core::router::{FallbackSuccess, Router};
use crate::core::session::{Pane, SessionAction, SessionState, SessionStore, StoreError};

pub use pane::{Phase, PaneActivity};
pub use title::{clean_title, title_prompt, TITLE_TRIGGER_MESSAGES};
pub use turn::TurnEvent;

use pane::{TurnKind, STATUS_CONNECTING, STATUS_REASONING, STATUS_THINKING};
use title::{spawn_title, TitleJob};
use turn::{spawn_turn, TurnContext};

#[derive(Debug)]
pub enum OrchestratorEvent {
    Turn {
        pane: Pane,
        turn_id: u64,
        event: TurnEvent,
    },
    Title {
        chat_id: String,
        title: Option<String>,
    },
}

/// What an applied event changed, for front ends that render incrementally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Routed {
        pane: Pane,
        provider: String,
        model: String,
    },
    Attempt {
        pane: Pane,
        model: String,
        attempt: usize,
    },
    Token { pane: Pane, text: String },
    Reasoning { pane: Pane, text: String },
    /// An assistant message was committed. `failed` marks a synthesized error reply.
    Committed {
        pane: Pane,
        chat_id: String,
        failed: bool,
    },
    Stopped { pane: Pane },
    Titled { chat_id: String, title: String },
    TitleSkipped { chat_id: String },
}

pub struct Orchestrator {
    store: SessionStore,
    config: Config,
    clients: ClientRegistry,
    router: Router,
    primary: PaneActivity,
    secondary: PaneActivity,
    next_turn_id: u64,
    pending_titles: usize,
    events_tx: mpsc::UnboundedSender<OrchestratorEvent>,
    events_rx: mpsc::UnboundedReceiver<OrchestratorEvent>,
}

impl Orchestrator {
    pub fn new(store: SessionStore, config: Config, clients: ClientRegistry, router: Router) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            store,
            config,
            clients,
            router,
            primary: PaneActivity::default(),
            secondary: PaneActivity::default(),
            next_turn_id: 0,
            pending_titles: 0,
            events_tx,
            events_rx,
        }
    }

    /// Wire up the built-in HTTP backends described by `config`.
    pub fn from_config(store: SessionStore, config: Config) -> Self {
        let http = reqwest::Client::new();
        let clients = ClientRegistry::from_config(&config, http.clone());
        let local = Arc::new(OllamaClient::new(http, config.base_url_for(LOCAL_PROVIDER_ID)));
        let router = Router::new(config.routing.clone(), local.clone(), local);
        Self::new(store, config, clients, router)
    }

    pub fn state(&self) -> &SessionState {
        self.store.state()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pane(&self, pane: Pane) -> &PaneActivity {
        match pane {
            Pane::Primary => &self.primary,
            Pane::Secondary => &self.secondary,
        }
    }

    fn pane_mut(&mut self, pane: Pane) -> &mut PaneActivity {
        match pane {
            Pane::Primary => &mut self.primary,
            Pane::Secondary => &mut self.secondary,
        }
    }

    /// True while a turn or a title request is still outstanding.
    pub fn has_pending_work(&self) -> bool {
        self.primary.is_busy() || self.secondary.is_busy() || self.pending_titles > 0
    }

    /// Apply a store action. Panes working on a deleted chat are stopped and
    /// a reset stops everything.
    pub fn dispatch(&mut self, action: SessionAction) -> Result<(), StoreError> {
        match &action {
            SessionAction::DeleteChat(chat_id) => {
                for pane in [Pane::Primary, Pane::Secondary] {
                    if self.pane(pane).chat_id() == Some(chat_id.as_str()) {
                        self.stop(pane);
                    }
                }
                self.router.forget(chat_id);
            }
            SessionAction::Reset => {
                self.stop(Pane::Primary);
                self.stop(Pane::Secondary);
                self.router.clear();
            }
            _ => {}
        }
        self.store.dispatch(action)
    }

    /// Start a turn in `pane` with a new user message. A turn already
    /// running in the pane is cancelled first. Returns the new turn id.
    pub fn send_message(&mut self, pane: Pane, text: &str) -> Result<u64, StoreError> {
        if self.pane(pane).is_busy() {
            self.stop(pane);
        }

        let existing = self.state().pane_chat_id(pane).map(str::to_string);
        let chat_id = match existing {
            Some(chat_id) => chat_id,
            None if pane == Pane::Primary => self.new_chat()?,
            None => return Err(StoreError::EmptyPane(pane)),
        };

        self.store.dispatch(SessionAction::AddMessage {
            chat_id: chat_id.clone(),
            message: Message::user(text),
        })?;
        Ok(self.start_turn(pane, chat_id, TurnKind::Send))
    }

    /// Replace user message `index` of the pane's chat, drop everything after
    /// it, and answer again from that point.
    pub fn regenerate_from(&mut self, pane: Pane, index: usize, content: &str) -> Result<u64, StoreError> {
        let chat_id = self
            .state()
            .pane_chat_id(pane)
            .map(str::to_string)
            .ok_or(StoreError::EmptyPane(pane))?;
        // A rejected edit must leave the running turn alone.
        self.state().require_user_message(&chat_id, index)?;
        if self.pane(pane).is_busy() {
            self.stop(pane);
        }

        self.store.update(|state| {
            state.edit_message(&chat_id, index, content.to_string())?;
            state.delete_messages_after(&chat_id, index)
        })?;
        Ok(self.start_turn(pane, chat_id, TurnKind::Regenerate))
    }

    /// Cancel the pane's turn. Partial output is discarded.
    pub fn stop(&mut self, pane: Pane) {
        let activity = self.pane_mut(pane);
        if activity.is_busy() {
            debug!(pane = pane.as_str(), turn_id = activity.turn_id, "Stopping turn");
        }
        activity.cancel();
    }

    /// Create an empty chat with the current defaults and show it in the primary pane.
    pub fn new_chat(&mut self) -> Result<String, StoreError> {
        let state = self.state();
        let chat_id = generate_chat_id(|candidate| state.contains_chat(candidate));
        let chat = Chat::new(chat_id.clone(), Some(state.effective_config(None)));
        self.store.dispatch(SessionAction::AddChat(chat))?;
        Ok(chat_id)
    }

    fn api_keys(&self) -> HashMap<String, String> {
        load_builtin_providers()
            .into_iter()
            .map(|provider| {
                let key = self.state().api_key(&provider.id);
                (provider.id, key)
            })
            .collect()
    }

    fn start_turn(&mut self, pane: Pane, chat_id: String, kind: TurnKind) -> u64 {
        self.next_turn_id += 1;
        let turn_id = self.next_turn_id;

        let history = self
            .state()
            .chat(&chat_id)
            .map(|chat| chat.messages.clone())
            .unwrap_or_default();
        let window = context_window(&history).to_vec();
        let selector = self.state().effective_config(Some(&chat_id));
        let api_keys = self.api_keys();
        let cancel = self.pane_mut(pane).begin(turn_id, chat_id.clone(), kind);

        debug!(
            pane = pane.as_str(),
            turn_id,
            chat_id = %chat_id,
            provider = %selector.provider,
            window = window.len(),
            "Starting turn"
        );

        let ctx = TurnContext {
            pane,
            turn_id,
            chat_id,
            selector,
            history,
            window,
            system: self.config.system_prompt(),
            api_keys,
            router: self.router.clone(),
            clients: self.clients.clone(),
            cancel,
        };
        spawn_turn(ctx, self.events_tx.clone());
        turn_id
    }

    pub async fn next_event(&mut self) -> Option<OrchestratorEvent> {
        self.events_rx.recv().await
    }

    /// Apply events until no turn or title request is outstanding.
    pub async fn settle(&mut self) -> Vec<Applied> {
        let mut applied = Vec::new();
        while self.has_pending_work() {
            let Some(event) = self.next_event().await else {
                break;
            };
            applied.extend(self.handle_event(event));
        }
        applied
    }

    /// Apply one event. Returns `None` when the event was stale.
    pub fn handle_event(&mut self, event: OrchestratorEvent) -> Option<Applied> {
        match event {
            OrchestratorEvent::Turn {
                pane,
                turn_id,
                event,
            } => {
                if !self.pane(pane).accepts(turn_id) {
                    debug!(pane = pane.as_str(), turn_id, "Dropping stale turn event");
                    return None;
                }
                Some(self.apply_turn_event(pane, event))
            }
            OrchestratorEvent::Title { chat_id, title } => {
                self.pending_titles = self.pending_titles.saturating_sub(1);
                let Some(title) = title else {
                    return Some(Applied::TitleSkipped { chat_id });
                };
                if let Err(err) = self.store.dispatch(SessionAction::UpdateChatTitle {
                    chat_id: chat_id.clone(),
                    title: title.clone(),
                }) {
                    warn!(chat_id = %chat_id, error = %err, "Could not apply generated title");
                    return Some(Applied::TitleSkipped { chat_id });
                }
                Some(Applied::Titled { chat_id, title })
            }
        }
    }

    fn apply_turn_event(&mut self, pane: Pane, event: TurnEvent) -> Applied {
        let activity = self.pane_mut(pane);
        match event {
            TurnEvent::Routed(route) => {
                activity.status = if route.is_local() {
                    STATUS_THINKING
                } else {
                    STATUS_CONNECTING
                }
                .to_string();
                activity.provider = Some(route.provider.clone());
                activity.model = Some(route.model.clone());
                Applied::Routed {
                    pane,
                    provider: route.provider,
                    model: route.model,
                }
            }
            TurnEvent::Attempt { model, attempt } => {
                activity.restart_attempt(model.clone());
                if attempt > 1 {
                    activity.status = format!("Trying {model}...");
                }
                Applied::Attempt {
                    pane,
                    model,
                    attempt,
                }
            }
            TurnEvent::Stream(StreamEvent::Token(text)) => {
                activity.phase = Phase::Streaming;
                activity.status.clear();
                activity.content.push_str(&text);
                Applied::Token { pane, text }
            }
            TurnEvent::Stream(StreamEvent::Reasoning(text)) => {
                activity.phase = Phase::Streaming;
                activity.status = STATUS_REASONING.to_string();
                activity.thinking.push_str(&text);
                Applied::Reasoning { pane, text }
            }
            TurnEvent::Finished(result) => self.finish_turn(pane, result),
        }
    }

    fn finish_turn(&mut self, pane: Pane, result: Result<FallbackSuccess, CompletionError>) -> Applied {
        let activity = self.pane_mut(pane);
        let chat_id = activity.chat_id.clone().unwrap_or_default();
        let provider = activity.provider.clone();
        let kind = activity.kind;
        activity.finish();

        let (message, failed, winner) = match result {
            Ok(success) => {
                debug!(
                    pane = pane.as_str(),
                    chat_id = %chat_id,
                    model = %success.model,
                    attempts = success.attempts,
                    "Turn completed"
                );
                let message = Message::assistant(success.completion.content)
                    .with_thinking(success.completion.thinking)
                    .with_model(success.model.clone());
                (message, false, Some(success.model))
            }
            Err(err) if err.is_cancelled() => return Applied::Stopped { pane },
            Err(err) => {
                warn!(pane = pane.as_str(), chat_id = %chat_id, error = %err, "Turn failed");
                (Message::assistant(format!("Error: {err}")), true, None)
            }
        };

        if let Err(err) = self.store.dispatch(SessionAction::AddMessage {
            chat_id: chat_id.clone(),
            message,
        }) {
            warn!(chat_id = %chat_id, error = %err, "Dropping reply for missing chat");
            return Applied::Stopped { pane };
        }

        if let (Some(model), Some(provider), Some(TurnKind::Send)) = (winner, provider, kind) {
            self.maybe_generate_title(&chat_id, &provider, model);
        }

        Applied::Committed {
            pane,
            chat_id,
            failed,
        }
    }

    fn maybe_generate_title(&mut self, chat_id: &str, provider: &str, model: String) {
        let Some(chat) = self.state().chat(chat_id) else {
            return;
        };
        if chat.messages.len() != TITLE_TRIGGER_MESSAGES {
            return;
        }
        let Some(client) = self.clients.get(provider) else {
            return;
        };

        let job = TitleJob {
            chat_id: chat_id.to_string(),
            client,
            model,
            api_key: self.state().api_key(provider),
            messages: chat.messages.clone(),
            timeout: self.config.routing.title_timeout(),
        };
        self.pending_titles += 1;
        spawn_title(job, self.events_tx.clone());
    }
}
