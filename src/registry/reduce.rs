//! Pure reducer over the chat history
//!
//! Given the same history, context and action it always produces the same
//! result. Ids for new chats come in through [`ReduceContext`], never from
//! inside the reducer.

use super::history::{Chat, ChatHistory, ChatId, ChatMessage};
use super::title::derive_title;
use super::{Action, Effect};
use crate::reply::CONTEXT_TURNS;
use thiserror::Error;
use uuid::Uuid;

/// Inputs the reducer may need but must not generate itself
#[derive(Debug, Clone, Copy)]
pub struct ReduceContext {
    /// Id to use if the action creates a chat
    pub fresh_id: ChatId,
}

impl ReduceContext {
    pub fn new(fresh_id: ChatId) -> Self {
        Self { fresh_id }
    }

    pub fn random() -> Self {
        Self::new(Uuid::new_v4())
    }
}

/// Outcome of a reduction
#[derive(Debug)]
pub struct Reduction {
    pub history: ChatHistory,
    pub effects: Vec<Effect>,
}

impl Reduction {
    pub fn new(history: ChatHistory) -> Self {
        Self {
            history,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    #[cfg(test)]
    pub fn is_noop(&self) -> bool {
        self.effects.is_empty()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReduceError {
    #[error("Chat not found: {0}")]
    UnknownChat(ChatId),
    #[error("Message is empty")]
    EmptyMessage,
}

pub fn reduce(
    history: &ChatHistory,
    context: &ReduceContext,
    action: Action,
) -> Result<Reduction, ReduceError> {
    match action {
        Action::NewChat => {
            let mut next = history.clone();
            insert_new_chat(&mut next, context.fresh_id);
            Ok(Reduction::new(next).with_effects(Effect::persist_and_notify()))
        }

        Action::DeleteChat { id } => {
            if !history.contains(id) {
                return Ok(Reduction::new(history.clone()));
            }
            let mut next = history.clone();
            next.remove(id);
            if next.is_empty() {
                insert_new_chat(&mut next, context.fresh_id);
            } else if next.current_chat == Some(id) || !next.is_consistent() {
                next.current_chat = next.chats.first().map(|c| c.id);
            }
            Ok(Reduction::new(next).with_effects(Effect::persist_and_notify()))
        }

        Action::SelectChat { id } => {
            if !history.contains(id) {
                return Err(ReduceError::UnknownChat(id));
            }
            if history.current_chat == Some(id) {
                return Ok(Reduction::new(history.clone()));
            }
            let mut next = history.clone();
            next.current_chat = Some(id);
            Ok(Reduction::new(next).with_effects(Effect::persist_and_notify()))
        }

        Action::UserMessage { chat_id, text } => {
            if text.trim().is_empty() {
                return Err(ReduceError::EmptyMessage);
            }
            let mut next = history.clone();
            let chat = next
                .get_mut(chat_id)
                .ok_or(ReduceError::UnknownChat(chat_id))?;

            let reply_context = chat.trailing_messages(CONTEXT_TURNS).to_vec();
            chat.messages.push(ChatMessage::user(text.clone()));

            // Titles are derived once, right after the first user message
            if chat.user_message_count() == 1 {
                chat.name = derive_title(&text);
            }

            Ok(Reduction::new(next)
                .with_effects(Effect::persist_and_notify())
                .with_effect(Effect::RequestReply {
                    chat_id,
                    context: reply_context,
                    prompt: text,
                }))
        }

        Action::AssistantReply { chat_id, text } => {
            let mut next = history.clone();
            let chat = next
                .get_mut(chat_id)
                .ok_or(ReduceError::UnknownChat(chat_id))?;
            chat.messages.push(ChatMessage::assistant(text));
            Ok(Reduction::new(next).with_effects(Effect::persist_and_notify()))
        }

        Action::EnsureChat => {
            let has_valid_selection = history.current().is_some();
            if has_valid_selection {
                return Ok(Reduction::new(history.clone()));
            }
            let mut next = history.clone();
            insert_new_chat(&mut next, context.fresh_id);
            Ok(Reduction::new(next).with_effects(Effect::persist_and_notify()))
        }
    }
}

fn insert_new_chat(history: &mut ChatHistory, id: ChatId) {
    history.chats.push(Chat::new(id));
    history.current_chat = Some(id);
}
