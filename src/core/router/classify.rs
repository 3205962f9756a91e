use crate::core::completion::CompletionRequest;
use crate::core::message::{strip_think_blocks, Message};
use crate::core::router::Intent;

/// Messages shown to the classifier.
const CLASSIFY_WINDOW: usize = 4;
const CLASSIFY_CLIP: usize = 500;

const CLASSIFY_PROMPT: &str = "Classify the latest user request in this conversation. \
Answer with exactly one word: CODING if it asks to write, debug, review or explain program code, \
otherwise GENERAL.";

fn clip(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Build the one-word classification call over the pending exchange.
pub fn classification_request(model: &str, history: &[Message]) -> CompletionRequest {
    let start = history.len().saturating_sub(CLASSIFY_WINDOW);
    let transcript = history[start..]
        .iter()
        .map(|message| format!("{}: {}", message.role.as_str(), clip(&message.content, CLASSIFY_CLIP)))
        .collect::<Vec<_>>()
        .join("\n");

    CompletionRequest::new(model, vec![Message::user(transcript)])
        .with_system(Some(CLASSIFY_PROMPT.to_string()))
}

/// Read the label out of the classifier's answer. Reasoning blocks are
/// ignored; anything without a label counts as a failed classification.
pub fn parse_intent(answer: &str) -> Option<Intent> {
    let answer = strip_think_blocks(answer).to_uppercase();
    if answer.contains("CODING") {
        Some(Intent::Coding)
    } else if answer.contains("GENERAL") {
        Some(Intent::General)
    } else {
        None
    }
}
