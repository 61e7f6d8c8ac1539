use std::sync::Arc;

use teloxide::adaptors::throttle::Limits;
use teloxide::adaptors::Throttle;
use teloxide::dptree;
use teloxide::prelude::*;
use teloxide::Bot;

use crate::command::setup_commands;
use crate::config::{AppConfig, RunMode};
use crate::error::BotResult;
use crate::handler::get_handler;
use crate::service::{OpenAiAnalyzer, TelegramMessenger};
use crate::state::AppState;
use crate::storage::TursoClient;
use crate::webhook;

pub struct BotService {
    bot: Throttle<Bot>,
    config: AppConfig,
}

impl BotService {
    pub fn new(config: AppConfig) -> BotResult<Self> {
        let client = teloxide::net::default_reqwest_settings()
            .pool_idle_timeout(std::time::Duration::from_secs(60))
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        let bot = Bot::with_client(config.telegram.0.clone(), client).throttle(Limits::default());

        Ok(Self { bot, config })
    }

    pub async fn start(self) -> BotResult<()> {
        info!("Testing connection to Telegram API...");
        let me = match self.bot.get_me().await {
            Ok(me) => me,
            Err(e) => {
                error!("Failed to connect to Telegram API: {:?}", e);
                return Err(anyhow::anyhow!("Failed to connect to Telegram API: {}", e).into());
            }
        };
        let bot_username = me.username().to_string();
        info!("Connected as @{}", bot_username);

        if let Err(e) = setup_commands(&self.bot, ChatId::from(self.config.admin.telegram_user_id)).await {
            error!("Failed to register bot commands: {}", e);
        }

        info!("Initializing AppState...");
        let client = TursoClient::open(&self.config.storage).await?;
        let messenger = Arc::new(TelegramMessenger::new(self.bot.clone()));
        let analyzer = Arc::new(OpenAiAnalyzer::new(self.config.analyzer.clone())?);
        let state = AppState::new(&self.config, client, messenger, analyzer, bot_username).await?;
        info!("AppState initialized");

        match self.config.server.mode {
            RunMode::Polling => {
                info!("Starting in polling mode");
                Dispatcher::builder(self.bot, get_handler())
                    .dependencies(dptree::deps![state])
                    .error_handler(LoggingErrorHandler::with_custom_text(
                        "An error has occurred in the dispatcher",
                    ))
                    .enable_ctrlc_handler()
                    .build()
                    .dispatch()
                    .await;
            }
            RunMode::Webhook => {
                info!("Starting in webhook mode");
                webhook::serve(state, self.config.server.webhook_addr).await?;
            }
        }

        info!("Bot stopped");
        Ok(())
    }
}
