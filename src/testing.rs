//! Fakes of the outbound collaborators and a ready-made `AppState` for unit tests.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use teloxide::types::{ChatId, MessageId, ParseMode, Recipient, UserId};

use crate::{
    config::AppConfig,
    service::{Analyzer, AnalyzerError, Messenger, MessengerError, Outgoing},
    state::AppState,
    storage::TursoClient,
};

pub const ADMIN: UserId = UserId(1000);
pub const CHANNEL: ChatId = ChatId(-100);
pub const ANSWER: &str = "Borscht, about 250 kcal. Protein 8 g, fat 12 g, carbs 25 g.";

#[derive(Clone, Debug)]
pub enum Sent {
    Text {
        to: Recipient,
        text: String,
        has_keyboard: bool,
    },
    Photo {
        to: Recipient,
        path: PathBuf,
        caption: String,
    },
    Deleted {
        to: Recipient,
        message_id: MessageId,
    },
}

fn chat_of(recipient: &Recipient) -> Option<ChatId> {
    match recipient {
        Recipient::Id(chat_id) => Some(*chat_id),
        _ => None,
    }
}

#[derive(Default)]
pub struct FakeMessenger {
    sent: Mutex<Vec<Sent>>,
    failing: Mutex<HashSet<ChatId>>,
    next_id: AtomicI32,
    photo: Mutex<Vec<u8>>,
    fail_downloads: AtomicBool,
    fail_photos: AtomicBool,
}

impl FakeMessenger {
    /// Every delivery to `chat_id` fails from now on.
    pub fn fail_for(&self, chat_id: ChatId) {
        self.failing.lock().unwrap().insert(chat_id);
    }

    pub fn fail_downloads(&self) {
        self.fail_downloads.store(true, Ordering::SeqCst);
    }

    /// Photo uploads fail, plain texts still go through.
    pub fn fail_photos(&self) {
        self.fail_photos.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Texts and photo captions delivered to one chat, in order.
    pub fn texts_to(&self, chat_id: ChatId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Text { to, text, .. } if chat_of(&to) == Some(chat_id) => Some(text),
                Sent::Photo { to, caption, .. } if chat_of(&to) == Some(chat_id) => Some(caption),
                _ => None,
            })
            .collect()
    }

    pub fn last_text_to(&self, chat_id: ChatId) -> Option<String> {
        self.texts_to(chat_id).pop()
    }

    pub fn deleted_count(&self) -> usize {
        self.sent()
            .iter()
            .filter(|sent| matches!(sent, Sent::Deleted { .. }))
            .count()
    }

    fn check(&self, to: &Recipient) -> Result<(), MessengerError> {
        match chat_of(to) {
            Some(chat_id) if self.failing.lock().unwrap().contains(&chat_id) => {
                Err(MessengerError::Delivery(format!("chat {} is unreachable", chat_id)))
            }
            _ => Ok(()),
        }
    }

    fn next_message_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn send_text(&self, to: Recipient, message: Outgoing) -> Result<MessageId, MessengerError> {
        self.check(&to)?;
        self.sent.lock().unwrap().push(Sent::Text {
            to,
            text: message.text,
            has_keyboard: message.keyboard.is_some(),
        });
        Ok(self.next_message_id())
    }

    async fn send_photo(
        &self,
        to: Recipient,
        path: &Path,
        caption: &str,
        _parse_mode: Option<ParseMode>,
    ) -> Result<MessageId, MessengerError> {
        self.check(&to)?;
        if self.fail_photos.load(Ordering::SeqCst) {
            return Err(MessengerError::Delivery("upload failed".to_string()));
        }
        self.sent.lock().unwrap().push(Sent::Photo {
            to,
            path: path.to_path_buf(),
            caption: caption.to_string(),
        });
        Ok(self.next_message_id())
    }

    async fn delete_message(&self, to: Recipient, message_id: MessageId) -> Result<(), MessengerError> {
        self.sent.lock().unwrap().push(Sent::Deleted { to, message_id });
        Ok(())
    }

    async fn download_photo(&self, _file_id: &str) -> Result<Vec<u8>, MessengerError> {
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(MessengerError::Delivery("download failed".to_string()));
        }
        Ok(self.photo.lock().unwrap().clone())
    }
}

/// Answers with a fixed text, or fails when built with [`FakeAnalyzer::failing`].
pub struct FakeAnalyzer {
    answer: Option<String>,
    calls: AtomicUsize,
}

impl FakeAnalyzer {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Analyzer for FakeAnalyzer {
    async fn analyze(&self, _image: &[u8]) -> Result<String, AnalyzerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone().ok_or(AnalyzerError::EmptyResponse)
    }
}

pub async fn create_test_state() -> (AppState, Arc<FakeMessenger>, Arc<FakeAnalyzer>) {
    create_test_state_with(FakeAnalyzer::answering(ANSWER)).await
}

pub async fn create_test_state_with(analyzer: FakeAnalyzer) -> (AppState, Arc<FakeMessenger>, Arc<FakeAnalyzer>) {
    let client = TursoClient::in_memory().await.unwrap();
    create_test_state_on(client, analyzer).await
}

/// Fake collaborators, an announcement channel and no broadcast pacing over the given store.
/// Keeping a clone of `client` lets a test tamper with the database underneath the state.
pub async fn create_test_state_on(
    client: TursoClient,
    analyzer: FakeAnalyzer,
) -> (AppState, Arc<FakeMessenger>, Arc<FakeAnalyzer>) {
    let env: HashMap<&str, String> = HashMap::from([
        ("BOT_TOKEN", "123:test".to_string()),
        ("OPENAI_API_KEY", "sk-test".to_string()),
        ("ADMIN_ID", ADMIN.0.to_string()),
        ("CHANNEL_ID", CHANNEL.0.to_string()),
        ("BROADCAST_PACING_MS", "0".to_string()),
        ("ASSETS_DIR", "does-not-exist".to_string()),
    ]);
    let config = AppConfig::from_lookup(|key| env.get(key).cloned()).unwrap();

    let messenger = Arc::new(FakeMessenger::default());
    let analyzer = Arc::new(analyzer);
    let state = AppState::new(
        &config,
        client,
        messenger.clone(),
        analyzer.clone(),
        "platewise_bot".to_string(),
    )
    .await
    .unwrap();

    (state, messenger, analyzer)
}
