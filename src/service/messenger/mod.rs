mod notifier;
mod telegram;

pub use notifier::ChannelNotifier;
pub use telegram::TelegramMessenger;

use std::path::Path;

use async_trait::async_trait;
use teloxide::types::{KeyboardMarkup, MessageId, ParseMode, Recipient};

#[derive(Debug, thiserror::Error)]
pub enum MessengerError {
    #[error("Request failed: {0}")]
    Request(#[from] teloxide::RequestError),
    #[error("Download failed: {0}")]
    Download(#[from] teloxide::DownloadError),
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// A text message plus the optional presentation bits the bot uses.
#[derive(Clone, Debug, Default)]
pub struct Outgoing {
    pub text: String,
    pub parse_mode: Option<ParseMode>,
    pub keyboard: Option<KeyboardMarkup>,
}

impl Outgoing {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: Some(ParseMode::Html),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: KeyboardMarkup) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Outbound delivery channel. Transport retries and rate limits live behind it.
#[async_trait]
pub trait Messenger: Send + Sync + 'static {
    async fn send_text(&self, to: Recipient, message: Outgoing) -> Result<MessageId, MessengerError>;

    async fn send_photo(
        &self,
        to: Recipient,
        path: &Path,
        caption: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<MessageId, MessengerError>;

    async fn delete_message(&self, to: Recipient, message_id: MessageId) -> Result<(), MessengerError>;

    async fn download_photo(&self, file_id: &str) -> Result<Vec<u8>, MessengerError>;
}
