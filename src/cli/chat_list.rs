//! Chat listing and transcript output

use std::error::Error;

use crate::core::chat::Chat;
use crate::core::message::Role;
use crate::core::session::{Layout, Pane, SessionState};

pub fn list_chats(state: &SessionState) {
    if state.chats.is_empty() {
        println!("No chats yet. Start one with 'splitchat say <message>'.");
        return;
    }

    println!("💬 Chats");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for chat in &state.chats {
        println!("{}", chat_line(state, chat));
    }
    println!();
    println!("{}", describe_layout(state));
}

/// `*` marks the current chat; `L`/`R` mark the pane showing it.
pub fn chat_line(state: &SessionState, chat: &Chat) -> String {
    let current = if state.current_chat_id.as_deref() == Some(chat.id.as_str()) {
        '*'
    } else {
        ' '
    };
    let pane = match state.pane_of(&chat.id) {
        Some(Pane::Primary) => 'L',
        Some(Pane::Secondary) => 'R',
        None => ' ',
    };
    let target = chat
        .config
        .as_ref()
        .map(|config| format!("{}/{}", config.provider, config.model))
        .unwrap_or_else(|| "default".to_string());
    format!(
        "{current}{pane} {}  {}  ({} messages, {target})",
        chat.id,
        chat.title,
        chat.messages.len()
    )
}

pub fn describe_layout(state: &SessionState) -> String {
    let title = |chat_id: Option<&str>| {
        chat_id
            .and_then(|id| state.chat(id))
            .map(|chat| format!("\"{}\" ({})", chat.title, chat.id))
            .unwrap_or_else(|| "(empty)".to_string())
    };

    match state.layout {
        Layout::Single => format!("Layout: single, showing {}", title(state.primary_chat_id.as_deref())),
        Layout::Split => format!(
            "Layout: split, left {} | right {}, active {}",
            title(state.primary_chat_id.as_deref()),
            title(state.secondary_chat_id.as_deref()),
            state.active_pane.as_str()
        ),
    }
}

pub fn show_chat(state: &SessionState, chat_id: &str) -> Result<(), Box<dyn Error>> {
    let Some(chat) = state.chat(chat_id) else {
        return Err(format!("Chat not found: {chat_id}").into());
    };

    println!("💬 {}", chat.title);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (index, message) in chat.messages.iter().enumerate() {
        let speaker = match (message.role, message.model.as_deref()) {
            (Role::User, _) => "You".to_string(),
            (Role::System, _) => "System".to_string(),
            (Role::Assistant, Some(model)) => format!("Assistant ({model})"),
            (Role::Assistant, None) => "Assistant".to_string(),
        };
        println!("[{index}] {speaker}:");
        println!("{}", message.content);
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chat::ChatConfig;
    use crate::core::message::Message;

    fn split_state() -> SessionState {
        let mut state = SessionState::default();
        let mut left = Chat::new("c1", None);
        left.title = "Left".into();
        left.messages.push(Message::user("hi"));
        let mut right = Chat::new(
            "c2",
            Some(ChatConfig {
                provider: "openrouter".into(),
                model: "m".into(),
            }),
        );
        right.title = "Right".into();
        state.chats = vec![right, left, Chat::new("c3", None)];
        state.primary_chat_id = Some("c1".into());
        state.secondary_chat_id = Some("c2".into());
        state.current_chat_id = Some("c2".into());
        state.active_pane = Pane::Secondary;
        state.layout = Layout::Split;
        state
    }

    #[test]
    fn chat_lines_mark_panes_and_selection() {
        let state = split_state();
        assert_eq!(
            chat_line(&state, &state.chats[0]),
            "*R c2  Right  (0 messages, openrouter/m)"
        );
        assert_eq!(
            chat_line(&state, &state.chats[1]),
            " L c1  Left  (1 messages, default)"
        );
        assert!(chat_line(&state, &state.chats[2]).starts_with("   c3"));
    }

    #[test]
    fn layout_description_names_both_panes() {
        let state = split_state();
        assert_eq!(
            describe_layout(&state),
            "Layout: split, left \"Left\" (c1) | right \"Right\" (c2), active secondary"
        );
        assert_eq!(
            describe_layout(&SessionState::default()),
            "Layout: single, showing (empty)"
        );
    }

    #[test]
    fn unknown_chat_is_an_error() {
        assert!(show_chat(&split_state(), "missing").is_err());
    }
}
