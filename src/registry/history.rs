//! Chat history types
//!
//! These are also the on-disk document shape, so field names follow the
//! persisted JSON (`chats`, `current_chat`, `name`).

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Title given to every chat before its first user message
pub const DEFAULT_CHAT_NAME: &str = "👻 TeenBuddy 🤖- Your 24/7 Support Pal";

pub type ChatId = Uuid;

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single turn in a chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A named, append-only thread of messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    /// Stored as the map key on disk
    #[serde(skip)]
    pub id: ChatId,
    pub name: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl Chat {
    pub fn new(id: ChatId) -> Self {
        Self {
            id,
            name: DEFAULT_CHAT_NAME.to_string(),
            messages: Vec::new(),
        }
    }

    pub fn user_message_count(&self) -> usize {
        self.messages.iter().filter(|m| m.role == Role::User).count()
    }

    /// The last `n` messages, oldest first
    pub fn trailing_messages(&self, n: usize) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }
}

/// Every chat plus the current selection
///
/// Chats keep insertion order, which is also their order in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistory {
    #[serde(default, with = "ordered_chats")]
    pub chats: Vec<Chat>,
    #[serde(default)]
    pub current_chat: Option<ChatId>,
}

impl ChatHistory {
    pub fn get(&self, id: ChatId) -> Option<&Chat> {
        self.chats.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: ChatId) -> Option<&mut Chat> {
        self.chats.iter_mut().find(|c| c.id == id)
    }

    pub fn contains(&self, id: ChatId) -> bool {
        self.get(id).is_some()
    }

    pub fn current(&self) -> Option<&Chat> {
        self.current_chat.and_then(|id| self.get(id))
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    /// True when the selection points at an existing chat, or there are no
    /// chats and no selection.
    pub fn is_consistent(&self) -> bool {
        match self.current_chat {
            Some(id) => self.contains(id),
            None => self.chats.is_empty(),
        }
    }

    pub(crate) fn remove(&mut self, id: ChatId) -> Option<Chat> {
        let index = self.chats.iter().position(|c| c.id == id)?;
        Some(self.chats.remove(index))
    }
}

/// Serializes `Vec<Chat>` as a JSON object keyed by chat id, keeping order.
mod ordered_chats {
    use super::{Chat, ChatId, Deserializer, MapAccess, SerializeMap, Serializer, Visitor};
    use std::fmt;

    pub fn serialize<S: Serializer>(chats: &[Chat], serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(chats.len()))?;
        for chat in chats {
            map.serialize_entry(&chat.id, chat)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Chat>, D::Error> {
        deserializer.deserialize_map(ChatsVisitor)
    }

    struct ChatsVisitor;

    impl<'de> Visitor<'de> for ChatsVisitor {
        type Value = Vec<Chat>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of chat id to chat")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut chats: Vec<Chat> = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((id, mut chat)) = access.next_entry::<ChatId, Chat>()? {
                chat.id = id;
                // Later duplicates win, as with any JSON object
                if let Some(existing) = chats.iter_mut().find(|c| c.id == id) {
                    *existing = chat;
                } else {
                    chats.push(chat);
                }
            }
            Ok(chats)
        }
    }
}
