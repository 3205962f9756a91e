//! Persisted chat session: the chat list, pane layout, provider defaults and
//! credentials, plus the transitions that keep them consistent.

pub mod action;
pub mod error;
pub mod panes;
pub mod setup;
pub mod state;
pub mod store;

#[cfg(test)]
mod tests;

pub use action::SessionAction;
pub use error::{SetupError, StoreError};
pub use panes::DropTarget;
pub use setup::SetupChoice;
pub use state::{Layout, Pane, SessionState, SplitPair};
pub use store::{PersistError, SessionStore};
