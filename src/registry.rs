//! Conversation registry
//!
//! The chat history as a value, mutated only through a pure reducer.

mod action;
mod effect;
pub mod history;
mod reduce;
pub mod title;

#[cfg(test)]
mod proptests;

pub use action::Action;
pub use effect::Effect;
pub use history::{Chat, ChatHistory, ChatId, ChatMessage, Role};
pub use reduce::{reduce, ReduceContext, ReduceError, Reduction};
