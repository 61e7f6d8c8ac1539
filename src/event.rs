use teloxide::types::{ChatId, Message, Recipient, Update, UpdateKind, UserId};

use crate::command::Command;

/// What the state machine sees of an inbound message, independent of how it arrived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncomingEvent {
    pub user_id: UserId,
    pub chat_id: ChatId,
    pub kind: EventKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    Command(Command),
    Text(String),
    Photo { file_id: String },
    Other,
}

impl IncomingEvent {
    /// Returns `None` for messages without a sender (channel posts).
    pub fn from_message(message: &Message, bot_username: &str) -> Option<Self> {
        let user = message.from.as_ref()?;

        let kind = if let Some(text) = message.text() {
            match Command::parse_text(text, bot_username) {
                Some(command) => EventKind::Command(command),
                None => EventKind::Text(text.to_string()),
            }
        } else if let Some(sizes) = message.photo() {
            // sizes are ordered from smallest to largest
            match sizes.last() {
                Some(largest) => EventKind::Photo {
                    file_id: largest.file.id.0.clone(),
                },
                None => EventKind::Other,
            }
        } else {
            EventKind::Other
        };

        Some(Self {
            user_id: user.id,
            chat_id: message.chat.id,
            kind,
        })
    }

    /// Only plain messages are handled; edits, callbacks and the rest yield `None`.
    pub fn from_update(update: &Update, bot_username: &str) -> Option<Self> {
        match &update.kind {
            UpdateKind::Message(message) => Self::from_message(message, bot_username),
            _ => None,
        }
    }

    pub fn reply_to(&self) -> Recipient {
        Recipient::Id(self.chat_id)
    }
}
