pub mod admin;
pub mod broadcast;
pub mod dialogue;
pub mod messenger;
pub mod quota;
pub mod user;
pub mod vision;

pub use admin::{ActivationOutcome, AdminAuthority, AdminCapability, AdminError};
pub use broadcast::{BroadcastEngine, BroadcastError};
pub use dialogue::{model::DialogState, DialogueStore};
pub use messenger::{ChannelNotifier, Messenger, MessengerError, Outgoing, TelegramMessenger};
pub use quota::{QuotaDecision, QuotaGate};
pub use user::UserStore;
pub use vision::{Analyzer, AnalyzerError, OpenAiAnalyzer};
