use std::{path::PathBuf, sync::Arc};

use crate::{
    config::AppConfig,
    error::BotResult,
    service::{
        AdminAuthority, Analyzer, BroadcastEngine, ChannelNotifier, DialogueStore, Messenger, QuotaGate, UserStore,
    },
    storage::TursoClient,
};

/// Everything a handler needs, cloned into every dispatch.
#[derive(Clone)]
pub struct AppState {
    pub users: UserStore,
    pub dialogues: DialogueStore,
    pub quota: QuotaGate,
    pub broadcast: BroadcastEngine,
    pub admin: AdminAuthority,
    pub notifier: ChannelNotifier,
    pub messenger: Arc<dyn Messenger>,
    pub analyzer: Arc<dyn Analyzer>,
    pub assets_dir: PathBuf,
    pub bot_username: String,
}

impl AppState {
    pub async fn new(
        config: &AppConfig,
        client: TursoClient,
        messenger: Arc<dyn Messenger>,
        analyzer: Arc<dyn Analyzer>,
        bot_username: String,
    ) -> BotResult<Self> {
        let users = UserStore::new(client, config.quota).await?;
        let notifier = ChannelNotifier::new(Arc::clone(&messenger), config.admin.channel.clone());

        Ok(Self {
            dialogues: DialogueStore::new(),
            quota: QuotaGate::new(users.clone()),
            broadcast: BroadcastEngine::new(
                users.clone(),
                Arc::clone(&messenger),
                notifier.clone(),
                config.broadcast,
            ),
            admin: AdminAuthority::new(config.admin.telegram_user_id, users.clone()),
            users,
            notifier,
            messenger,
            analyzer,
            assets_dir: config.assets.dir.clone(),
            bot_username,
        })
    }
}
