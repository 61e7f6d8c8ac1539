use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use teloxide::types::{ChatId, Recipient, UserId};
use tokio::{sync::Mutex, task::JoinSet};
use uuid::Uuid;

use super::{
    messenger::{ChannelNotifier, Messenger, Outgoing},
    user::UserStore,
};
use crate::{config::BroadcastConfig, storage::StorageError};

#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    #[error("Broadcast text is empty")]
    EmptyText,
    #[error("Failed to load recipients: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BroadcastReport {
    pub success: usize,
    pub failure: usize,
}

impl BroadcastReport {
    pub fn total(&self) -> usize {
        self.success + self.failure
    }
}

/// One fan-out run. The counters are only meaningful once every worker has finished.
struct BroadcastJob {
    id: Uuid,
    text: String,
    queue: Mutex<VecDeque<UserId>>,
    success: AtomicUsize,
    failure: AtomicUsize,
}

impl BroadcastJob {
    fn new(text: &str, targets: Vec<UserId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.to_string(),
            queue: Mutex::new(targets.into()),
            success: AtomicUsize::new(0),
            failure: AtomicUsize::new(0),
        }
    }

    async fn next_target(&self) -> Option<UserId> {
        self.queue.lock().await.pop_front()
    }

    fn report(&self) -> BroadcastReport {
        BroadcastReport {
            success: self.success.load(Ordering::SeqCst),
            failure: self.failure.load(Ordering::SeqCst),
        }
    }
}

#[derive(Clone)]
pub struct BroadcastEngine {
    users: UserStore,
    messenger: Arc<dyn Messenger>,
    notifier: ChannelNotifier,
    config: BroadcastConfig,
}

impl BroadcastEngine {
    pub fn new(
        users: UserStore,
        messenger: Arc<dyn Messenger>,
        notifier: ChannelNotifier,
        config: BroadcastConfig,
    ) -> Self {
        Self {
            users,
            messenger,
            notifier,
            config,
        }
    }

    /// Sends `text` to every known user. Per-recipient failures are counted and
    /// never abort the run; the channel summary is best effort.
    pub async fn run(&self, text: &str) -> Result<BroadcastReport, BroadcastError> {
        if text.trim().is_empty() {
            return Err(BroadcastError::EmptyText);
        }

        // snapshot once, users registering mid-run are not included
        let targets = self.users.list_ids().await?;
        let job = Arc::new(BroadcastJob::new(text, targets));
        let concurrency = self.config.concurrency.max(1);
        info!("Broadcast {} started with {} workers", job.id, concurrency);

        let mut workers = JoinSet::new();
        for i in 0..concurrency {
            let job = Arc::clone(&job);
            let messenger = Arc::clone(&self.messenger);
            let pacing = self.config.pacing;
            workers.spawn(async move {
                while let Some(user_id) = job.next_target().await {
                    deliver(&job, messenger.as_ref(), user_id, i).await;
                    if !pacing.is_zero() {
                        tokio::time::sleep(pacing).await;
                    }
                }
            });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("Broadcast {} worker crashed: {}", job.id, e);
            }
        }

        let report = job.report();
        info!(
            "Broadcast {} finished. Sent: {}, failed: {}",
            job.id, report.success, report.failure
        );

        self.notifier
            .notify_channel(&format!("📢 New broadcast: {}", job.text))
            .await;

        Ok(report)
    }
}

async fn deliver(job: &BroadcastJob, messenger: &dyn Messenger, user_id: UserId, worker: usize) {
    let to = Recipient::Id(ChatId::from(user_id));
    match messenger.send_text(to, Outgoing::text(job.text.as_str())).await {
        Ok(_) => {
            job.success.fetch_add(1, Ordering::SeqCst);
        }
        Err(e) => {
            warn!("Broadcast {} worker {}: failed to deliver to {}: {}", job.id, worker, user_id, e);
            job.failure.fetch_add(1, Ordering::SeqCst);
        }
    }
}
