use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::completion::{CompletionClient, CompletionRequest};
use crate::core::message::{strip_think_blocks, Message};
use crate::core::orchestrator::OrchestratorEvent;

/// Chats are titled when they first reach this many messages.
pub const TITLE_TRIGGER_MESSAGES: usize = 4;
const TITLE_MAX_CHARS: usize = 50;
const TITLE_SOURCE_CHARS: usize = 100;

const TITLE_PROMPT: &str = "Based on this conversation, generate a very short title (max 5 words). Only respond with the title, nothing else:\n\n";

pub fn title_prompt(messages: &[Message]) -> String {
    let transcript = messages
        .iter()
        .map(|message| {
            let clipped: String = message.content.chars().take(TITLE_SOURCE_CHARS).collect();
            format!("{}: {}", message.role.as_str(), clipped)
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("{TITLE_PROMPT}{transcript}")
}

/// Turn a raw model answer into a chat title, or `None` if nothing usable is left.
pub fn clean_title(raw: &str) -> Option<String> {
    let stripped = strip_think_blocks(raw);
    let mut title = stripped.trim();
    if let Some(rest) = title
        .get(..6)
        .filter(|prefix| prefix.eq_ignore_ascii_case("title:"))
        .map(|_| &title[6..])
    {
        title = rest.trim();
    }
    let title = title
        .trim_matches(|c| c == '"' || c == '\'' || c == '*')
        .trim();
    let title: String = title.chars().take(TITLE_MAX_CHARS).collect();
    let title = title.trim_end().to_string();
    (!title.is_empty()).then_some(title)
}

pub(crate) struct TitleJob {
    pub chat_id: String,
    pub client: Arc<dyn CompletionClient>,
    pub model: String,
    pub api_key: String,
    pub messages: Vec<Message>,
    pub timeout: Duration,
}

/// Fire-and-forget title request. Always reports back, with `None` on failure.
pub(crate) fn spawn_title(job: TitleJob, tx: mpsc::UnboundedSender<OrchestratorEvent>) {
    tokio::spawn(async move {
        let TitleJob {
            chat_id,
            client,
            model,
            api_key,
            messages,
            timeout,
        } = job;

        let request = CompletionRequest::new(model, vec![Message::user(title_prompt(&messages))])
            .with_api_key(api_key);
        let call = client.complete(request, CancellationToken::new());

        let title = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(completion)) => {
                let title = clean_title(&completion.content);
                debug!(chat_id = %chat_id, title = ?title, "Generated chat title");
                title
            }
            Ok(Err(err)) => {
                warn!(chat_id = %chat_id, error = %err, "Title generation failed");
                None
            }
            Err(_) => {
                warn!(chat_id = %chat_id, "Title generation timed out");
                None
            }
        };
        let _ = tx.send(OrchestratorEvent::Title { chat_id, title });
    });
}
