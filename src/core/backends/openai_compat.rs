use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::models::{fetch_models, FetchError};
use crate::api::{ChatRequest, ChatResponse, ModelInfo};
use crate::core::backends::errors::{http_error, stream_error};
use crate::core::backends::LineBuffer;
use crate::core::builtin_providers::find_builtin_provider;
use crate::core::completion::{
    Completion, CompletionClient, CompletionError, CompletionRequest, StreamEvent,
};
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

const APP_TITLE: &str = "splitchat";

/// Client for `/chat/completions` SSE providers (OpenRouter, OpenAI,
/// Anthropic's compatibility endpoint, and anything else speaking that shape).
#[derive(Clone)]
pub struct OpenAiCompatClient {
    http: reqwest::Client,
    provider: String,
    base_url: String,
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// Result of feeding one SSE line.
#[derive(Debug, PartialEq, Eq)]
enum SseLine {
    Continue,
    Done,
}

fn handle_sse_line(
    line: &str,
    events: &mpsc::UnboundedSender<StreamEvent>,
    completion: &mut Completion,
) -> Result<SseLine, CompletionError> {
    let Some(payload) = extract_data_payload(line) else {
        return Ok(SseLine::Continue);
    };
    if payload == "[DONE]" {
        return Ok(SseLine::Done);
    }
    if payload.trim().is_empty() {
        return Ok(SseLine::Continue);
    }

    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|err| CompletionError::Malformed(format!("{err}: {payload}")))?;
    if let Some(message) = stream_error(&value) {
        return Err(CompletionError::Api(message));
    }

    let response: ChatResponse = serde_json::from_value(value)
        .map_err(|err| CompletionError::Malformed(err.to_string()))?;
    let Some(choice) = response.choices.into_iter().next() else {
        return Ok(SseLine::Continue);
    };

    for event in [
        choice.delta.reasoning.map(StreamEvent::Reasoning),
        choice.delta.content.map(StreamEvent::Token),
    ]
    .into_iter()
    .flatten()
    {
        if matches!(&event, StreamEvent::Token(text) | StreamEvent::Reasoning(text) if text.is_empty())
        {
            continue;
        }
        completion.push(&event);
        let _ = events.send(event);
    }
    Ok(SseLine::Continue)
}

impl OpenAiCompatClient {
    pub fn new(http: reqwest::Client, provider: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            provider: provider.into(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_models(&self, api_key: &str) -> Result<Vec<ModelInfo>, FetchError> {
        fetch_models(&self.http, &self.base_url, api_key, &self.provider).await
    }

    fn requires_key(&self) -> bool {
        find_builtin_provider(&self.provider)
            .map(|provider| provider.requires_key)
            .unwrap_or(false)
    }

    async fn run_stream(
        &self,
        request: CompletionRequest,
        events: mpsc::UnboundedSender<StreamEvent>,
        cancel: &CancellationToken,
    ) -> Result<Completion, CompletionError> {
        let body = ChatRequest {
            model: request.model.clone(),
            messages: request.api_messages(),
            stream: true,
        };

        let http_request = self
            .http
            .post(construct_api_url(&self.base_url, "chat/completions"))
            .header("Content-Type", "application/json")
            .header("X-Title", APP_TITLE);
        let http_request = add_auth_headers(http_request, &self.provider, &request.api_key);

        let response = http_request.json(&body).send().await?;
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }

        let mut stream = response.bytes_stream();
        let mut lines = LineBuffer::default();
        let mut completion = Completion::default();

        while let Some(chunk) = stream.next().await {
            if cancel.is_cancelled() {
                return Err(CompletionError::Cancelled);
            }
            lines.push(&chunk?);
            while let Some(line) = lines.next_line() {
                if handle_sse_line(&line, &events, &mut completion)? == SseLine::Done {
                    return Ok(completion);
                }
            }
        }

        if let Some(line) = lines.finish() {
            handle_sse_line(&line, &events, &mut completion)?;
        }
        debug!(provider = %self.provider, "Stream closed without [DONE]");
        Ok(completion)
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompatClient {
    fn provider(&self) -> &str {
        &self.provider
    }

    async fn stream_completion(
        &self,
        request: CompletionRequest,
        events: mpsc::UnboundedSender<StreamEvent>,
        cancel: CancellationToken,
    ) -> Result<Completion, CompletionError> {
        if request.api_key.is_empty() && self.requires_key() {
            return Err(CompletionError::MissingApiKey {
                provider: self.provider.clone(),
            });
        }

        debug!(provider = %self.provider, model = %request.model, "Starting SSE completion");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CompletionError::Cancelled),
            result = self.run_stream(request, events, &cancel) => result,
        }
    }
}
