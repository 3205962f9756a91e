//! Scripted completion clients for async tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;

use crate::core::completion::{
    Completion, CompletionClient, CompletionError, CompletionRequest, StreamEvent,
};
use crate::core::router::LocalProbe;

/// How one scripted call behaves.
pub enum Script {
    /// Stream these events, then complete.
    Reply(Vec<StreamEvent>),
    /// Stream these events, then fail with a transport error.
    FailAfter(Vec<StreamEvent>, String),
    /// Fail immediately with an HTTP status.
    Http(u16),
    /// Stream these events, then wait until `release` fires or the call is cancelled.
    Gate(Vec<StreamEvent>, Arc<Notify>),
    /// Never finish on its own.
    Hang,
}

impl Script {
    pub fn text(text: &str) -> Self {
        Script::Reply(vec![StreamEvent::Token(text.to_string())])
    }

    pub fn fail(message: &str) -> Self {
        Script::FailAfter(Vec::new(), message.to_string())
    }
}

/// Plays back [`Script`]s in call order and records every request.
pub struct ScriptedClient {
    provider: String,
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn new(provider: &str, scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            provider: provider.to_string(),
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn models(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.model).collect()
    }
}

fn play(events: &mpsc::UnboundedSender<StreamEvent>, scripted: Vec<StreamEvent>, completion: &mut Completion) {
    for event in scripted {
        completion.push(&event);
        let _ = events.send(event);
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    fn provider(&self) -> &str {
        &self.provider
    }

    async fn stream_completion(
        &self,
        request: CompletionRequest,
        events: mpsc::UnboundedSender<StreamEvent>,
        cancel: CancellationToken,
    ) -> Result<Completion, CompletionError> {
        self.requests.lock().unwrap().push(request);
        let script = self.scripts.lock().unwrap().pop_front();
        let mut completion = Completion::default();

        match script.unwrap_or(Script::Reply(Vec::new())) {
            Script::Reply(scripted) => {
                play(&events, scripted, &mut completion);
                Ok(completion)
            }
            Script::FailAfter(scripted, message) => {
                play(&events, scripted, &mut completion);
                Err(CompletionError::Transport(message))
            }
            Script::Http(status) => Err(CompletionError::Http {
                status,
                body: format!("API Error:\n```\nstatus {status}\n```"),
            }),
            Script::Gate(scripted, release) => {
                play(&events, scripted, &mut completion);
                tokio::select! {
                    _ = cancel.cancelled() => Err(CompletionError::Cancelled),
                    _ = release.notified() => Ok(completion),
                }
            }
            Script::Hang => {
                cancel.cancelled().await;
                Err(CompletionError::Cancelled)
            }
        }
    }
}

/// Probe with a fixed answer that counts how often it was asked.
pub struct FixedProbe {
    available: bool,
    calls: AtomicUsize,
}

impl FixedProbe {
    pub fn new(available: bool) -> Arc<Self> {
        Arc::new(Self {
            available,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalProbe for FixedProbe {
    async fn is_available(&self, _timeout: Duration) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.available
    }
}
