//! Effects produced by the reducer

use super::history::{ChatId, ChatMessage};

/// Side effects to run after a reduction, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Write the whole history to the store
    PersistHistory,

    /// Push a fresh snapshot to connected browsers
    NotifyClients,

    /// Ask the generator for a reply to `prompt`
    RequestReply {
        chat_id: ChatId,
        /// Messages that preceded the prompt, oldest first
        context: Vec<ChatMessage>,
        prompt: String,
    },
}

impl Effect {
    /// Persist then notify; every mutating action ends with this pair
    pub fn persist_and_notify() -> [Effect; 2] {
        [Effect::PersistHistory, Effect::NotifyClients]
    }
}
