//! Actions that mutate the chat history

use super::history::ChatId;

/// Everything the UI can ask the registry to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Start a fresh chat and select it
    NewChat,
    /// Remove a chat; unknown ids are ignored
    DeleteChat { id: ChatId },
    /// Point the current selection at an existing chat
    SelectChat { id: ChatId },
    /// Record what the user typed
    UserMessage { chat_id: ChatId, text: String },
    /// Record the generated reply
    AssistantReply { chat_id: ChatId, text: String },
    /// Repair an empty registry or a missing/dangling selection
    EnsureChat,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::NewChat => "new_chat",
            Action::DeleteChat { .. } => "delete_chat",
            Action::SelectChat { .. } => "select_chat",
            Action::UserMessage { .. } => "user_message",
            Action::AssistantReply { .. } => "assistant_reply",
            Action::EnsureChat => "ensure_chat",
        }
    }
}
