//! API request and response types

use crate::registry::ChatMessage;
use crate::runtime::ChatView;
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

/// Response for a completed exchange
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub reply: ChatMessage,
    /// `None` if the chat was deleted while the reply was generated
    pub chat: Option<ChatView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Static help panel shown next to the chat
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub title: &'static str,
    pub features: Vec<&'static str>,
    pub helplines: Vec<Helpline>,
    pub contact_email: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Helpline {
    pub name: &'static str,
    pub number: &'static str,
}

impl InfoResponse {
    pub fn teenbuddy() -> Self {
        Self {
            title: "TeenBuddy - Your AI Friend",
            features: vec![
                "Remembers past conversations",
                "Context-aware responses",
                "Teen-friendly and empathetic",
            ],
            helplines: vec![
                Helpline {
                    name: "ChildHelp (IN)",
                    number: "1098",
                },
                Helpline {
                    name: "Helpline Number (IN)",
                    number: "112",
                },
                Helpline {
                    name: "Depression helpline number India",
                    number: "1800-599-0019",
                },
            ],
            contact_email: "jeet.github.tm@gmail.com",
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
