use async_trait::async_trait;
use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::models::{fetch_local_models, FetchError};
use crate::api::{OllamaChatChunk, OllamaChatRequest, OllamaModel, OllamaPullProgress, OllamaPullRequest};
use crate::core::backends::errors::{format_api_error, http_error};
use crate::core::backends::LineBuffer;
use crate::core::builtin_providers::LOCAL_PROVIDER_ID;
use crate::core::completion::{
    Completion, CompletionClient, CompletionError, CompletionRequest, StreamEvent,
};
use crate::utils::url::construct_api_url;

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

/// Client for a local Ollama daemon.
#[derive(Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
}

/// Routes inline `<think>` sections of streamed content to reasoning.
///
/// Reasoning models served without native thinking support emit their
/// chain of thought wrapped in tags; a tag may be split across chunks.
#[derive(Default)]
struct ThinkTagSplitter {
    in_think: bool,
    pending: String,
}

fn partial_tag_len(text: &str, tag: &str) -> usize {
    (1..tag.len())
        .rev()
        .find(|&n| text.ends_with(&tag[..n]))
        .unwrap_or(0)
}

impl ThinkTagSplitter {
    fn feed(&mut self, chunk: &str) -> Vec<StreamEvent> {
        let mut text = std::mem::take(&mut self.pending);
        text.push_str(chunk);
        let mut out = Vec::new();

        loop {
            let tag = if self.in_think { THINK_CLOSE } else { THINK_OPEN };
            if let Some(pos) = text.find(tag) {
                self.emit(&text[..pos], &mut out);
                text = text[pos + tag.len()..].to_string();
                self.in_think = !self.in_think;
                continue;
            }
            let split = text.len() - partial_tag_len(&text, tag);
            self.emit(&text[..split], &mut out);
            self.pending = text[split..].to_string();
            return out;
        }
    }

    fn finish(&mut self) -> Vec<StreamEvent> {
        let rest = std::mem::take(&mut self.pending);
        let mut out = Vec::new();
        self.emit(&rest, &mut out);
        out
    }

    fn emit(&self, text: &str, out: &mut Vec<StreamEvent>) {
        if text.is_empty() {
            return;
        }
        out.push(if self.in_think {
            StreamEvent::Reasoning(text.to_string())
        } else {
            StreamEvent::Token(text.to_string())
        });
    }
}

struct NdjsonState {
    splitter: ThinkTagSplitter,
    completion: Completion,
}

impl NdjsonState {
    fn new() -> Self {
        Self {
            splitter: ThinkTagSplitter::default(),
            completion: Completion::default(),
        }
    }

    fn forward(&mut self, produced: Vec<StreamEvent>, events: &mpsc::UnboundedSender<StreamEvent>) {
        for event in produced {
            self.completion.push(&event);
            let _ = events.send(event);
        }
    }

    /// Feed one NDJSON line; returns true once the daemon reports `done`.
    fn handle_line(
        &mut self,
        line: &str,
        events: &mpsc::UnboundedSender<StreamEvent>,
    ) -> Result<bool, CompletionError> {
        if line.is_empty() {
            return Ok(false);
        }
        let chunk: OllamaChatChunk = serde_json::from_str(line)
            .map_err(|err| CompletionError::Malformed(format!("{err}: {line}")))?;
        if let Some(error) = chunk.error {
            return Err(CompletionError::Api(format_api_error(&error)));
        }

        if let Some(message) = chunk.message {
            if let Some(thinking) = message.thinking.filter(|text| !text.is_empty()) {
                self.forward(vec![StreamEvent::Reasoning(thinking)], events);
            }
            if !message.content.is_empty() {
                let produced = self.splitter.feed(&message.content);
                self.forward(produced, events);
            }
        }

        if chunk.done {
            let produced = self.splitter.finish();
            self.forward(produced, events);
        }
        Ok(chunk.done)
    }

    fn into_completion(mut self, events: &mpsc::UnboundedSender<StreamEvent>) -> Completion {
        let produced = self.splitter.finish();
        self.forward(produced, events);
        self.completion
    }
}

impl OllamaClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /` with a deadline; any failure counts as "not running".
    pub async fn probe(&self, timeout: Duration) -> bool {
        let request = self
            .http
            .get(construct_api_url(&self.base_url, ""))
            .timeout(timeout)
            .send();
        match tokio::time::timeout(timeout, request).await {
            Ok(Ok(response)) => response.status().is_success(),
            Ok(Err(err)) => {
                debug!(error = %err, "Local daemon probe failed");
                false
            }
            Err(_) => {
                debug!(timeout_ms = timeout.as_millis() as u64, "Local daemon probe timed out");
                false
            }
        }
    }

    pub async fn list_models(&self) -> Result<Vec<OllamaModel>, FetchError> {
        fetch_local_models(&self.http, &self.base_url).await
    }

    /// Pull a model, reporting each progress line as it arrives.
    pub async fn pull_model(
        &self,
        model: &str,
        mut on_progress: impl FnMut(&OllamaPullProgress),
    ) -> Result<(), CompletionError> {
        let response = self
            .http
            .post(construct_api_url(&self.base_url, "api/pull"))
            .json(&OllamaPullRequest {
                model: model.to_string(),
                stream: true,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }

        let mut stream = response.bytes_stream();
        let mut lines = LineBuffer::default();
        let mut handle = |line: &str| -> Result<(), CompletionError> {
            if line.is_empty() {
                return Ok(());
            }
            let progress: OllamaPullProgress = serde_json::from_str(line)
                .map_err(|err| CompletionError::Malformed(format!("{err}: {line}")))?;
            if let Some(error) = &progress.error {
                return Err(CompletionError::Api(format_api_error(error)));
            }
            on_progress(&progress);
            Ok(())
        };

        while let Some(chunk) = stream.next().await {
            lines.push(&chunk?);
            while let Some(line) = lines.next_line() {
                handle(&line)?;
            }
        }
        if let Some(line) = lines.finish() {
            handle(&line)?;
        }
        Ok(())
    }

    async fn run_stream(
        &self,
        request: CompletionRequest,
        events: mpsc::UnboundedSender<StreamEvent>,
        cancel: &CancellationToken,
    ) -> Result<Completion, CompletionError> {
        let body = OllamaChatRequest {
            model: request.model.clone(),
            messages: request.api_messages(),
            stream: true,
        };
        let response = self
            .http
            .post(construct_api_url(&self.base_url, "api/chat"))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }

        let mut stream = response.bytes_stream();
        let mut lines = LineBuffer::default();
        let mut state = NdjsonState::new();

        while let Some(chunk) = stream.next().await {
            if cancel.is_cancelled() {
                return Err(CompletionError::Cancelled);
            }
            lines.push(&chunk?);
            while let Some(line) = lines.next_line() {
                if state.handle_line(&line, &events)? {
                    return Ok(state.into_completion(&events));
                }
            }
        }

        if let Some(line) = lines.finish() {
            state.handle_line(&line, &events)?;
        }
        Ok(state.into_completion(&events))
    }
}

#[async_trait]
impl CompletionClient for OllamaClient {
    fn provider(&self) -> &str {
        LOCAL_PROVIDER_ID
    }

    async fn stream_completion(
        &self,
        request: CompletionRequest,
        events: mpsc::UnboundedSender<StreamEvent>,
        cancel: CancellationToken,
    ) -> Result<Completion, CompletionError> {
        debug!(model = %request.model, "Starting local completion");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CompletionError::Cancelled),
            result = self.run_stream(request, events, &cancel) => result,
        }
    }
}
