use crate::config::ConfigError;
use crate::service::{AdminError, AnalyzerError, BroadcastError, MessengerError};
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Messenger error: {0}")]
    Messenger(#[from] MessengerError),

    #[error("Analyzer error: {0}")]
    Analyzer(#[from] AnalyzerError),

    #[error("Broadcast error: {0}")]
    Broadcast(#[from] BroadcastError),

    #[error("Admin error: {0}")]
    Admin(#[from] AdminError),

    #[error(transparent)]
    Other(anyhow::Error),
}

impl From<anyhow::Error> for BotError {
    fn from(error: anyhow::Error) -> Self {
        BotError::Other(error)
    }
}

pub type HandlerResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub type BotResult<T> = Result<T, BotError>;
