//! Split-view layout transitions.
//!
//! The layout is a two-state machine (`single`, `split`) with a focused pane
//! sub-state. Every transition keeps the two panes showing different chats
//! and keeps `layout == Split` exactly when a secondary chat is assigned.

use crate::core::session::error::StoreError;
use crate::core::session::state::{Layout, Pane, SessionState, SplitPair};

/// Where a dragged chat was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// Left half of the conversation area.
    LeftPane,
    /// Right half of the conversation area.
    RightPane,
    /// Back onto the chat list.
    ChatList,
}

impl SessionState {
    pub fn enable_split_view(&mut self, chat_id: &str) -> Result<(), StoreError> {
        self.require_chat(chat_id)?;
        let primary = self
            .primary_chat_id
            .clone()
            .ok_or(StoreError::EmptyPane(Pane::Primary))?;
        if primary == chat_id {
            return Err(StoreError::DuplicatePane(chat_id.to_string()));
        }

        self.layout = Layout::Split;
        self.secondary_chat_id = Some(chat_id.to_string());
        self.active_pane = Pane::Secondary;
        self.current_chat_id = Some(chat_id.to_string());
        self.last_split_state = Some(SplitPair {
            primary_chat_id: primary,
            secondary_chat_id: chat_id.to_string(),
        });
        Ok(())
    }

    pub fn close_split_view(&mut self) -> Result<(), StoreError> {
        if !self.is_split() {
            return Err(StoreError::NotSplit);
        }
        self.layout = Layout::Single;
        self.secondary_chat_id = None;
        self.active_pane = Pane::Primary;
        self.current_chat_id = self.primary_chat_id.clone();
        Ok(())
    }

    /// Collapse to single view keeping `pane`'s chat, remembering the pair so
    /// re-selecting either chat can bring the split back.
    pub fn maximize_pane(&mut self, pane: Pane) -> Result<(), StoreError> {
        if !self.is_split() {
            return Err(StoreError::NotSplit);
        }
        let kept = self
            .pane_chat_id(pane)
            .map(str::to_owned)
            .ok_or(StoreError::EmptyPane(pane))?;

        self.last_split_state = self.current_pair();
        self.layout = Layout::Single;
        self.primary_chat_id = Some(kept.clone());
        self.secondary_chat_id = None;
        self.current_chat_id = Some(kept);
        self.active_pane = Pane::Primary;
        Ok(())
    }

    pub fn set_pane_chat(&mut self, pane: Pane, chat_id: &str) -> Result<(), StoreError> {
        self.require_chat(chat_id)?;
        if self.pane_chat_id(pane.other()) == Some(chat_id) {
            return Err(StoreError::DuplicatePane(chat_id.to_string()));
        }

        match pane {
            Pane::Primary => self.primary_chat_id = Some(chat_id.to_string()),
            Pane::Secondary if !self.is_split() => return self.enable_split_view(chat_id),
            Pane::Secondary => self.secondary_chat_id = Some(chat_id.to_string()),
        }
        self.current_chat_id = Some(chat_id.to_string());
        self.active_pane = pane;
        Ok(())
    }

    pub fn set_active_pane(&mut self, pane: Pane) -> Result<(), StoreError> {
        if pane == Pane::Secondary && !self.is_split() {
            return Err(StoreError::NotSplit);
        }
        self.active_pane = pane;
        self.current_chat_id = self.pane_chat_id(pane).map(str::to_owned);
        Ok(())
    }

    /// Sidebar navigation. Refocuses an open pane, collapses the split when a
    /// third chat is picked, and restores a remembered split when one of its
    /// members is picked from single view.
    pub fn select_chat(&mut self, chat_id: &str) -> Result<(), StoreError> {
        self.require_chat(chat_id)?;

        if self.is_split() {
            if let Some(pane) = self.pane_of(chat_id) {
                self.active_pane = pane;
                self.current_chat_id = Some(chat_id.to_string());
                return Ok(());
            }

            if let Some(pair) = self.current_pair() {
                self.last_split_state = Some(pair);
            }
            self.layout = Layout::Single;
            self.secondary_chat_id = None;
            self.switch_single(chat_id);
            return Ok(());
        }

        if let Some(pair) = self.last_split_state.clone() {
            let valid = self.contains_chat(&pair.primary_chat_id)
                && self.contains_chat(&pair.secondary_chat_id);
            if !valid {
                self.last_split_state = None;
            } else if pair.contains(chat_id) {
                self.active_pane = if pair.primary_chat_id == chat_id {
                    Pane::Primary
                } else {
                    Pane::Secondary
                };
                self.layout = Layout::Split;
                self.primary_chat_id = Some(pair.primary_chat_id);
                self.secondary_chat_id = Some(pair.secondary_chat_id);
                self.current_chat_id = Some(chat_id.to_string());
                return Ok(());
            }
        }

        self.switch_single(chat_id);
        Ok(())
    }

    /// Chats already shown in a pane cannot be dragged into the split.
    pub fn can_drag_to_split(&self, chat_id: &str) -> bool {
        self.pane_of(chat_id).is_none()
    }

    pub fn handle_drop(&mut self, target: DropTarget, chat_id: &str) -> Result<(), StoreError> {
        match target {
            DropTarget::LeftPane => self.set_pane_chat(Pane::Primary, chat_id),
            DropTarget::RightPane => self.enable_split_view(chat_id),
            DropTarget::ChatList => {
                if self.secondary_chat_id.as_deref() == Some(chat_id) {
                    self.close_split_view()
                } else {
                    Ok(())
                }
            }
        }
    }

    fn current_pair(&self) -> Option<SplitPair> {
        match (&self.primary_chat_id, &self.secondary_chat_id) {
            (Some(primary), Some(secondary)) => Some(SplitPair {
                primary_chat_id: primary.clone(),
                secondary_chat_id: secondary.clone(),
            }),
            _ => None,
        }
    }

    fn switch_single(&mut self, chat_id: &str) {
        self.primary_chat_id = Some(chat_id.to_string());
        self.current_chat_id = Some(chat_id.to_string());
        self.active_pane = Pane::Primary;
    }
}
