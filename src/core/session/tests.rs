use super::*;
use crate::core::chat::{Chat, ChatConfig, ChatConfigPatch};
use crate::core::message::Message;

fn state_with_chats(ids: &[&str]) -> SessionState {
    let mut state = SessionState::default();
    // add_chat prepends, so insert in reverse to keep `ids` order in the list
    for id in ids.iter().rev() {
        state.add_chat(Chat::new(*id, None)).expect("unique id");
    }
    state
}

fn split_of(primary: &str, secondary: &str, ids: &[&str]) -> SessionState {
    let mut state = state_with_chats(ids);
    state.select_chat(primary).expect("select primary");
    state.enable_split_view(secondary).expect("open split");
    state
}

fn assert_pane_invariants(state: &SessionState) {
    if let (Some(primary), Some(secondary)) = (&state.primary_chat_id, &state.secondary_chat_id) {
        assert_ne!(primary, secondary, "chat duplicated across panes");
    }
    assert_eq!(
        state.is_split(),
        state.secondary_chat_id.is_some(),
        "split layout must track the secondary pane"
    );
}

#[test]
fn add_chat_prepends_and_focuses_primary() {
    let mut state = state_with_chats(&["a"]);
    state.active_pane = Pane::Secondary;
    state.add_chat(Chat::new("b", None)).unwrap();

    assert_eq!(state.chats[0].id, "b");
    assert_eq!(state.current_chat_id.as_deref(), Some("b"));
    assert_eq!(state.primary_chat_id.as_deref(), Some("b"));
    assert_eq!(state.active_pane, Pane::Primary);
}

#[test]
fn add_chat_rejects_duplicate_ids() {
    let mut state = state_with_chats(&["a"]);
    assert_eq!(
        state.add_chat(Chat::new("a", None)),
        Err(StoreError::DuplicateChat("a".into()))
    );
    assert_eq!(state.chats.len(), 1);
}

#[test]
fn message_actions_report_unknown_chats_and_indices() {
    let mut state = state_with_chats(&["a"]);
    assert_eq!(
        state.add_message("zzz", Message::user("hi")),
        Err(StoreError::ChatNotFound("zzz".into()))
    );

    state.add_message("a", Message::user("hi")).unwrap();
    let before = state.clone();
    assert!(matches!(
        state.edit_message("a", 3, "x"),
        Err(StoreError::InvalidIndex { index: 3, len: 1, .. })
    ));
    assert!(matches!(
        state.delete_messages_after("a", 1),
        Err(StoreError::InvalidIndex { .. })
    ));
    assert_eq!(state, before);
}

#[test]
fn other_pane_is_the_opposite_side() {
    assert_eq!(Pane::Primary.other(), Pane::Secondary);
    assert_eq!(Pane::Secondary.other(), Pane::Primary);
    assert_eq!(Pane::Primary.other().other(), Pane::Primary);
}

#[test]
fn require_user_message_checks_index_and_role() {
    let mut state = state_with_chats(&["a"]);
    state.add_message("a", Message::user("q")).unwrap();
    state.add_message("a", Message::assistant("r")).unwrap();

    assert_eq!(state.require_user_message("a", 0), Ok(()));
    assert_eq!(
        state.require_user_message("a", 1),
        Err(StoreError::NotUserMessage {
            chat_id: "a".into(),
            index: 1
        })
    );
    assert_eq!(
        state.require_user_message("a", 2),
        Err(StoreError::InvalidIndex {
            chat_id: "a".into(),
            index: 2,
            len: 2
        })
    );
    assert_eq!(
        state.require_user_message("zzz", 0),
        Err(StoreError::ChatNotFound("zzz".into()))
    );
}

#[test]
fn delete_messages_after_keeps_index_inclusive() {
    let mut state = state_with_chats(&["a"]);
    for i in 0..6 {
        state.add_message("a", Message::user(format!("m{i}"))).unwrap();
    }
    state.delete_messages_after("a", 2).unwrap();
    let contents: Vec<_> = state
        .chat("a")
        .unwrap()
        .messages
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(contents, vec!["m0", "m1", "m2"]);
}

#[test]
fn title_and_config_updates_merge() {
    let mut state = state_with_chats(&["a"]);
    state.set_provider("ollama");
    state.set_model("llama3");

    state.update_chat_title("a", "Rust lifetimes").unwrap();
    state
        .update_chat_config("a", ChatConfigPatch::provider("openrouter"))
        .unwrap();

    let chat = state.chat("a").unwrap();
    assert_eq!(chat.title, "Rust lifetimes");
    assert_eq!(
        chat.config,
        Some(ChatConfig {
            provider: "openrouter".into(),
            model: "llama3".into(),
        })
    );
    assert_eq!(state.effective_config(Some("a")).provider, "openrouter");
    assert_eq!(state.effective_config(None).provider, "ollama");
}

#[test]
fn api_key_prefers_stored_value() {
    let mut state = SessionState::default();
    assert_eq!(state.api_key("openai"), "");
    state.set_api_key("openai", "sk-test");
    assert_eq!(state.api_key("openai"), "sk-test");
}

#[test]
fn enable_split_rejects_self_split() {
    let mut state = state_with_chats(&["a", "b"]);
    state.select_chat("a").unwrap();
    assert_eq!(
        state.enable_split_view("a"),
        Err(StoreError::DuplicatePane("a".into()))
    );
    assert_eq!(state.layout, Layout::Single);

    state.enable_split_view("b").unwrap();
    assert_eq!(state.layout, Layout::Split);
    assert_eq!(state.secondary_chat_id.as_deref(), Some("b"));
    assert_eq!(state.active_pane, Pane::Secondary);
    assert_eq!(state.current_chat_id.as_deref(), Some("b"));
    assert_eq!(
        state.last_split_state,
        Some(SplitPair {
            primary_chat_id: "a".into(),
            secondary_chat_id: "b".into(),
        })
    );
}

#[test]
fn pane_assignments_never_duplicate_a_chat() {
    let ids = ["a", "b", "c", "d"];
    let mut state = state_with_chats(&ids);
    state.select_chat("a").unwrap();

    // Every combination of split/assign calls, accepted or not, must keep
    // the panes distinct.
    for first in ids {
        for second in ids {
            let _ = state.enable_split_view(first);
            assert_pane_invariants(&state);
            let _ = state.set_pane_chat(Pane::Primary, second);
            assert_pane_invariants(&state);
            let _ = state.set_pane_chat(Pane::Secondary, first);
            assert_pane_invariants(&state);
        }
    }
}

#[test]
fn set_pane_chat_rejects_cross_pane_duplicate() {
    let mut state = split_of("a", "b", &["a", "b", "c"]);
    assert_eq!(
        state.set_pane_chat(Pane::Primary, "b"),
        Err(StoreError::DuplicatePane("b".into()))
    );
    state.set_pane_chat(Pane::Primary, "c").unwrap();
    assert_eq!(state.primary_chat_id.as_deref(), Some("c"));
    assert_eq!(state.active_pane, Pane::Primary);
    assert_eq!(state.current_chat_id.as_deref(), Some("c"));
}

#[test]
fn close_split_reverts_to_primary() {
    let mut state = split_of("a", "b", &["a", "b"]);
    state.close_split_view().unwrap();
    assert_eq!(state.layout, Layout::Single);
    assert_eq!(state.secondary_chat_id, None);
    assert_eq!(state.current_chat_id.as_deref(), Some("a"));
    assert_eq!(state.close_split_view(), Err(StoreError::NotSplit));
}

#[test]
fn set_active_pane_tracks_current_chat() {
    let mut state = split_of("a", "b", &["a", "b"]);
    state.set_active_pane(Pane::Primary).unwrap();
    assert_eq!(state.current_chat_id.as_deref(), Some("a"));
    state.set_active_pane(Pane::Secondary).unwrap();
    assert_eq!(state.current_chat_id.as_deref(), Some("b"));

    state.close_split_view().unwrap();
    assert_eq!(state.set_active_pane(Pane::Secondary), Err(StoreError::NotSplit));
}

#[test]
fn maximize_pane_promotes_and_remembers_pair() {
    let mut state = split_of("a", "b", &["a", "b"]);
    state.maximize_pane(Pane::Secondary).unwrap();

    assert_eq!(state.layout, Layout::Single);
    assert_eq!(state.primary_chat_id.as_deref(), Some("b"));
    assert_eq!(state.secondary_chat_id, None);
    assert_eq!(state.current_chat_id.as_deref(), Some("b"));
    assert_eq!(state.active_pane, Pane::Primary);

    // Re-selecting the former primary restores the original pairing.
    state.select_chat("a").unwrap();
    assert_eq!(state.layout, Layout::Split);
    assert_eq!(state.primary_chat_id.as_deref(), Some("a"));
    assert_eq!(state.secondary_chat_id.as_deref(), Some("b"));
    assert_eq!(state.active_pane, Pane::Primary);
}

#[test]
fn selecting_open_pane_only_refocuses() {
    let mut state = split_of("a", "b", &["a", "b"]);
    state.select_chat("a").unwrap();
    assert_eq!(state.layout, Layout::Split);
    assert_eq!(state.active_pane, Pane::Primary);
    assert_eq!(state.current_chat_id.as_deref(), Some("a"));
}

#[test]
fn split_restore_round_trip() {
    let mut state = split_of("a", "b", &["a", "b", "c"]);

    state.select_chat("c").unwrap();
    assert_eq!(state.layout, Layout::Single);
    assert_eq!(state.primary_chat_id.as_deref(), Some("c"));
    assert_eq!(
        state.last_split_state,
        Some(SplitPair {
            primary_chat_id: "a".into(),
            secondary_chat_id: "b".into(),
        })
    );

    state.select_chat("a").unwrap();
    assert_eq!(state.layout, Layout::Split);
    assert_eq!(state.primary_chat_id.as_deref(), Some("a"));
    assert_eq!(state.secondary_chat_id.as_deref(), Some("b"));
    assert_eq!(state.active_pane, Pane::Primary);
}

#[test]
fn restoring_through_secondary_focuses_secondary() {
    let mut state = split_of("a", "b", &["a", "b", "c"]);
    state.select_chat("c").unwrap();
    state.select_chat("b").unwrap();
    assert_eq!(state.layout, Layout::Split);
    assert_eq!(state.active_pane, Pane::Secondary);
    assert_eq!(state.current_chat_id.as_deref(), Some("b"));
}

#[test]
fn stale_split_state_is_discarded() {
    let mut state = split_of("a", "b", &["a", "b", "c"]);
    state.select_chat("c").unwrap();
    state.delete_chat("b").unwrap();

    state.select_chat("a").unwrap();
    assert_eq!(state.layout, Layout::Single);
    assert_eq!(state.primary_chat_id.as_deref(), Some("a"));
    assert_eq!(state.current_chat_id.as_deref(), Some("a"));
    assert_eq!(state.last_split_state, None);
}

#[test]
fn dangling_snapshot_loaded_from_disk_is_cleared_on_use() {
    let mut state = state_with_chats(&["a", "c"]);
    state.last_split_state = Some(SplitPair {
        primary_chat_id: "a".into(),
        secondary_chat_id: "gone".into(),
    });

    state.select_chat("a").unwrap();
    assert_eq!(state.layout, Layout::Single);
    assert_eq!(state.last_split_state, None);
}

#[test]
fn deleting_secondary_collapses_split() {
    let mut state = split_of("a", "b", &["a", "b"]);
    state.delete_chat("b").unwrap();
    assert_eq!(state.layout, Layout::Single);
    assert_eq!(state.secondary_chat_id, None);
    assert_eq!(state.primary_chat_id.as_deref(), Some("a"));
    assert_eq!(state.current_chat_id.as_deref(), Some("a"));
    assert_eq!(state.last_split_state, None);
}

#[test]
fn deleting_primary_promotes_secondary() {
    let mut state = split_of("a", "b", &["a", "b"]);
    state.delete_chat("a").unwrap();
    assert_eq!(state.layout, Layout::Single);
    assert_eq!(state.primary_chat_id.as_deref(), Some("b"));
    assert_eq!(state.secondary_chat_id, None);
    assert_eq!(state.active_pane, Pane::Primary);
    assert_pane_invariants(&state);
}

#[test]
fn deleting_unrelated_chat_keeps_layout() {
    let mut state = split_of("a", "b", &["a", "b", "c"]);
    state.delete_chat("c").unwrap();
    assert_eq!(state.layout, Layout::Split);
    assert!(state.last_split_state.is_some());
    assert_eq!(
        state.delete_chat("c"),
        Err(StoreError::ChatNotFound("c".into()))
    );
}

#[test]
fn drop_targets_map_to_pane_transitions() {
    let mut state = state_with_chats(&["a", "b", "c"]);
    state.select_chat("a").unwrap();

    assert!(state.can_drag_to_split("b"));
    assert!(!state.can_drag_to_split("a"));

    state.handle_drop(DropTarget::RightPane, "b").unwrap();
    assert_eq!(state.layout, Layout::Split);
    assert!(!state.can_drag_to_split("b"));

    state.handle_drop(DropTarget::LeftPane, "c").unwrap();
    assert_eq!(state.primary_chat_id.as_deref(), Some("c"));

    // Dropping a chat that is not the secondary onto the list does nothing.
    state.handle_drop(DropTarget::ChatList, "c").unwrap();
    assert_eq!(state.layout, Layout::Split);

    state.handle_drop(DropTarget::ChatList, "b").unwrap();
    assert_eq!(state.layout, Layout::Single);
    assert_eq!(state.current_chat_id.as_deref(), Some("c"));
}

#[test]
fn reduce_leaves_original_untouched() {
    let state = state_with_chats(&["a"]);
    let (next, result) = state.reduce(SessionAction::AddMessage {
        chat_id: "a".into(),
        message: Message::user("hello"),
    });
    assert!(result.is_ok());
    assert!(state.chat("a").unwrap().messages.is_empty());
    assert_eq!(next.chat("a").unwrap().messages.len(), 1);
}

#[test]
fn reset_restores_defaults() {
    let mut state = split_of("a", "b", &["a", "b"]);
    state.set_api_key("openai", "sk");
    state.apply(SessionAction::Reset).unwrap();
    assert_eq!(state, SessionState::default());
}
