pub mod backends;
pub mod builtin_providers;
pub mod chat;
pub mod completion;
pub mod config;
pub mod message;
pub mod orchestrator;
pub mod router;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;
