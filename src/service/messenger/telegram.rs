use std::path::Path;

use async_trait::async_trait;
use teloxide::{
    adaptors::Throttle,
    net::Download,
    payloads::{SendMessageSetters, SendPhotoSetters},
    prelude::Requester,
    types::{FileId, InputFile, MessageId, ParseMode, Recipient, ReplyMarkup},
    Bot,
};

use super::{Messenger, MessengerError, Outgoing};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Throttle<Bot>,
}

impl TelegramMessenger {
    pub fn new(bot: Throttle<Bot>) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, to: Recipient, message: Outgoing) -> Result<MessageId, MessengerError> {
        let mut request = self.bot.send_message(to, message.text);
        if let Some(parse_mode) = message.parse_mode {
            request = request.parse_mode(parse_mode);
        }
        if let Some(keyboard) = message.keyboard {
            request = request.reply_markup(ReplyMarkup::Keyboard(keyboard));
        }
        let sent = request.await?;
        Ok(sent.id)
    }

    async fn send_photo(
        &self,
        to: Recipient,
        path: &Path,
        caption: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<MessageId, MessengerError> {
        let mut request = self.bot.send_photo(to, InputFile::file(path)).caption(caption);
        if let Some(parse_mode) = parse_mode {
            request = request.parse_mode(parse_mode);
        }
        let sent = request.await?;
        Ok(sent.id)
    }

    async fn delete_message(&self, to: Recipient, message_id: MessageId) -> Result<(), MessengerError> {
        self.bot.delete_message(to, message_id).await?;
        Ok(())
    }

    async fn download_photo(&self, file_id: &str) -> Result<Vec<u8>, MessengerError> {
        let file = self.bot.get_file(FileId(file_id.to_string())).await?;
        let mut buf = Vec::new();
        self.bot.inner().download_file(&file.path, &mut buf).await?;
        debug!("Downloaded photo {} ({} bytes)", file_id, buf.len());
        Ok(buf)
    }
}
