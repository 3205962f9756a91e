//! Splitchat is the core of a split-view chat client for local and hosted LLMs.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core::session`] holds the persisted chat list and the pane layout, and
//!   applies every change through validated transitions.
//! - [`core::router`] picks a provider and model per turn, including the
//!   `auto` mode that prefers a local daemon and falls back across free
//!   hosted models.
//! - [`core::backends`] implements streaming completion clients for Ollama
//!   and OpenAI-compatible endpoints.
//! - [`core::orchestrator`] runs one turn per pane, streams partial output,
//!   commits replies, and titles new chats.
//! - [`api`] defines the wire payloads shared by the backends.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod utils;
