use std::sync::Arc;

use teloxide::types::Recipient;

use super::{Messenger, Outgoing};

/// Result of a best-effort side notification. Callers are free to ignore it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent,
    Skipped,
    Failed,
}

/// Side notifications (announcement channel, activation notices) whose failures
/// are logged and never reach the primary response path.
#[derive(Clone)]
pub struct ChannelNotifier {
    messenger: Arc<dyn Messenger>,
    channel: Option<Recipient>,
}

impl ChannelNotifier {
    pub fn new(messenger: Arc<dyn Messenger>, channel: Option<Recipient>) -> Self {
        Self { messenger, channel }
    }

    pub async fn notify_channel(&self, text: &str) -> NotifyOutcome {
        let Some(channel) = self.channel.clone() else {
            return NotifyOutcome::Skipped;
        };
        match self.messenger.send_text(channel.clone(), Outgoing::text(text)).await {
            Ok(_) => NotifyOutcome::Sent,
            Err(e) => {
                error!("Failed to notify channel {:?}: {}", channel, e);
                NotifyOutcome::Failed
            }
        }
    }

    pub async fn notify_user(&self, to: Recipient, text: &str) -> NotifyOutcome {
        match self.messenger.send_text(to.clone(), Outgoing::text(text)).await {
            Ok(_) => NotifyOutcome::Sent,
            Err(e) => {
                warn!("Failed to notify {:?}: {}", to, e);
                NotifyOutcome::Failed
            }
        }
    }
}
