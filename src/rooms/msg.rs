use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult};

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Sender {
    #[serde(default)]
    pub id: String,
}

/// Webhook body posted by the chat platform.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct InboundMessage {
    #[serde(default)]
    pub message: String,
    /// `userbase:room`, or a bare room key.
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub sender: Sender,
}

impl InboundMessage {
    pub fn new(
        message: impl Into<String>,
        context: impl Into<String>,
        sender_id: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            context: context.into(),
            sender: Sender { id: sender_id.into() },
        }
    }

    /// Splits the context into `(userbase, room)`.
    pub fn scope(&self) -> AppResult<(&str, &str)> {
        self.context
            .split_once(':')
            .filter(|(userbase, room)| !userbase.is_empty() && !room.is_empty())
            .ok_or_else(|| AppError::MissingScope(self.context.clone()))
    }
}

/// Payload posted to a room's webhook.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
    pub format: String,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: "text".to_owned(),
        }
    }
}
