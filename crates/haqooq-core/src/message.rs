use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::citation::{self, AnswerParts};

/// Per-session message sequence number. The first message of a session is 1.
pub type MessageId = u64;

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Assistant,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::User => write!(f, "user"),
            Origin::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single entry of the chat transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub origin: Origin,
    pub text: String,
    pub created_at: DateTime<Local>,
}

impl Message {
    /// Create a user message
    pub fn user(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            origin: Origin::User,
            text: text.into(),
            created_at: Local::now(),
        }
    }

    /// Create an assistant message
    pub fn assistant(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            origin: Origin::Assistant,
            text: text.into(),
            created_at: Local::now(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.origin == Origin::User
    }

    pub fn is_assistant(&self) -> bool {
        self.origin == Origin::Assistant
    }

    /// Split the text into answer body and citation.
    ///
    /// User text is never split; it is returned whole as the body.
    pub fn parts(&self) -> AnswerParts<'_> {
        match self.origin {
            Origin::Assistant => citation::extract(&self.text),
            Origin::User => AnswerParts {
                body: self.text.as_str(),
                citation: None,
            },
        }
    }

    /// Timestamp as shown next to the message, e.g. `14:05`
    pub fn time_label(&self) -> String {
        self.created_at.format("%H:%M").to_string()
    }
}
