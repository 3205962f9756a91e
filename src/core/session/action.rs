use crate::core::chat::{Chat, ChatConfigPatch};
use crate::core::message::Message;
use crate::core::session::error::StoreError;
use crate::core::session::panes::DropTarget;
use crate::core::session::state::{Pane, SessionState};

/// Every mutation a front end can request from the session store.
#[derive(Debug, Clone)]
pub enum SessionAction {
    AddChat(Chat),
    AddMessage {
        chat_id: String,
        message: Message,
    },
    EditMessage {
        chat_id: String,
        index: usize,
        content: String,
    },
    DeleteMessagesAfter {
        chat_id: String,
        index: usize,
    },
    UpdateChatTitle {
        chat_id: String,
        title: String,
    },
    UpdateChatConfig {
        chat_id: String,
        patch: ChatConfigPatch,
    },
    DeleteChat(String),
    EnableSplitView(String),
    CloseSplitView,
    MaximizePane(Pane),
    SetPaneChat {
        pane: Pane,
        chat_id: String,
    },
    SetActivePane(Pane),
    SelectChat(String),
    Drop {
        target: DropTarget,
        chat_id: String,
    },
    SetProvider(String),
    SetModel(String),
    SetApiKey {
        provider: String,
        key: String,
    },
    CompleteSetup,
    ToggleSidebar,
    Reset,
}

impl SessionState {
    pub fn apply(&mut self, action: SessionAction) -> Result<(), StoreError> {
        match action {
            SessionAction::AddChat(chat) => self.add_chat(chat),
            SessionAction::AddMessage { chat_id, message } => self.add_message(&chat_id, message),
            SessionAction::EditMessage {
                chat_id,
                index,
                content,
            } => self.edit_message(&chat_id, index, content),
            SessionAction::DeleteMessagesAfter { chat_id, index } => {
                self.delete_messages_after(&chat_id, index)
            }
            SessionAction::UpdateChatTitle { chat_id, title } => {
                self.update_chat_title(&chat_id, title)
            }
            SessionAction::UpdateChatConfig { chat_id, patch } => {
                self.update_chat_config(&chat_id, patch)
            }
            SessionAction::DeleteChat(chat_id) => self.delete_chat(&chat_id),
            SessionAction::EnableSplitView(chat_id) => self.enable_split_view(&chat_id),
            SessionAction::CloseSplitView => self.close_split_view(),
            SessionAction::MaximizePane(pane) => self.maximize_pane(pane),
            SessionAction::SetPaneChat { pane, chat_id } => self.set_pane_chat(pane, &chat_id),
            SessionAction::SetActivePane(pane) => self.set_active_pane(pane),
            SessionAction::SelectChat(chat_id) => self.select_chat(&chat_id),
            SessionAction::Drop { target, chat_id } => self.handle_drop(target, &chat_id),
            SessionAction::SetProvider(provider) => {
                self.set_provider(provider);
                Ok(())
            }
            SessionAction::SetModel(model) => {
                self.set_model(model);
                Ok(())
            }
            SessionAction::SetApiKey { provider, key } => {
                self.set_api_key(provider, key);
                Ok(())
            }
            SessionAction::CompleteSetup => {
                self.has_completed_setup = true;
                Ok(())
            }
            SessionAction::ToggleSidebar => {
                self.toggle_sidebar();
                Ok(())
            }
            SessionAction::Reset => {
                self.reset();
                Ok(())
            }
        }
    }

    /// Apply `action` to a copy of the state, leaving `self` untouched.
    pub fn reduce(&self, action: SessionAction) -> (SessionState, Result<(), StoreError>) {
        let mut next = self.clone();
        let result = next.apply(action);
        (next, result)
    }
}
