use std::sync::Arc;

use dashmap::DashMap;
use teloxide::types::UserId;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::user::UserStore;
use crate::storage::StorageError;

/// Outcome of a quota check for the gated action.
#[derive(Debug)]
pub enum QuotaDecision {
    Allowed(QuotaPermit),
    Denied { uses_left: i64 },
}

/// Held while the gated action runs. Only [`QuotaGate::commit`] consumes a use,
/// dropping the permit leaves the quota untouched.
#[derive(Debug)]
pub struct QuotaPermit {
    user_id: UserId,
    uses_left: i64,
    _lock: UserLock,
}

type LockMap = Arc<DashMap<UserId, Arc<Mutex<()>>>>;

/// A held per-user lock. Releasing the last one also removes the user's entry.
#[derive(Debug)]
struct UserLock {
    locks: LockMap,
    user_id: UserId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UserLock {
    fn drop(&mut self) {
        drop(self.guard.take());
        // waiters hold their own clone of the mutex, so the count exceeds one while anyone queues
        self.locks.remove_if(&self.user_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[derive(Clone)]
pub struct QuotaGate {
    users: UserStore,
    locks: LockMap,
}

impl QuotaGate {
    pub fn new(users: UserStore) -> Self {
        Self {
            users,
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Waits for any in-flight gated action of the same user, then checks the quota.
    /// The read and the later decrement happen under one per-user lock, so two
    /// concurrent photos from one user cannot both pass on the last use.
    pub async fn try_consume(&self, user_id: UserId) -> Result<QuotaDecision, StorageError> {
        let lock = self.locks.entry(user_id).or_default().clone();
        let lock = UserLock {
            locks: Arc::clone(&self.locks),
            user_id,
            guard: Some(lock.lock_owned().await),
        };

        let uses_left = self.users.get_uses_left(user_id).await?;
        if uses_left <= 0 {
            info!("User {} has no uses left", user_id);
            return Ok(QuotaDecision::Denied { uses_left });
        }

        Ok(QuotaDecision::Allowed(QuotaPermit {
            user_id,
            uses_left,
            _lock: lock,
        }))
    }

    /// Consumes one use after the gated action succeeded. Returns the remaining uses.
    pub async fn commit(&self, permit: QuotaPermit) -> Result<i64, StorageError> {
        if !self.users.decrement_use(permit.user_id).await? {
            // ensure_user always runs before the gate, a missing row means the store is inconsistent
            error!("Quota decrement for user {} matched no account", permit.user_id);
            return Ok(0);
        }
        let remaining = permit.uses_left - 1;
        info!("User {} consumed a use, {} left", permit.user_id, remaining);
        Ok(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::QuotaConfig, storage::TursoClient};
    use std::time::Duration;

    async fn create_gate() -> (QuotaGate, UserStore) {
        let client = TursoClient::in_memory().await.unwrap();
        let users = UserStore::new(client, QuotaConfig::default()).await.unwrap();
        (QuotaGate::new(users.clone()), users)
    }

    async fn consume(gate: &QuotaGate, user: UserId) -> bool {
        match gate.try_consume(user).await.unwrap() {
            QuotaDecision::Allowed(permit) => {
                gate.commit(permit).await.unwrap();
                true
            }
            QuotaDecision::Denied { .. } => false,
        }
    }

    #[tokio::test]
    async fn test_quota_is_monotonic() {
        let (gate, users) = create_gate().await;
        let user = UserId(1);
        users.ensure_user(user).await.unwrap();

        for n in 1..=4 {
            assert!(consume(&gate, user).await);
            assert_eq!(users.get_uses_left(user).await.unwrap(), 10 - n);
        }
    }

    #[tokio::test]
    async fn test_dropped_permit_does_not_consume() {
        let (gate, users) = create_gate().await;
        let user = UserId(1);
        users.ensure_user(user).await.unwrap();

        match gate.try_consume(user).await.unwrap() {
            QuotaDecision::Allowed(permit) => drop(permit),
            QuotaDecision::Denied { .. } => panic!("expected allowed"),
        }

        assert_eq!(users.get_uses_left(user).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_last_use_then_denied() {
        let (gate, users) = create_gate().await;
        let user = UserId(1);
        users.ensure_user(user).await.unwrap();
        for _ in 0..9 {
            users.decrement_use(user).await.unwrap();
        }
        assert_eq!(users.get_uses_left(user).await.unwrap(), 1);

        assert!(consume(&gate, user).await);
        assert!(matches!(
            gate.try_consume(user).await.unwrap(),
            QuotaDecision::Denied { uses_left: 0 }
        ));
        assert_eq!(users.get_uses_left(user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_user_is_denied() {
        let (gate, users) = create_gate().await;

        assert!(matches!(
            gate.try_consume(UserId(9)).await.unwrap(),
            QuotaDecision::Denied { uses_left: 0 }
        ));
        assert!(users.list_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_requests_cannot_overspend() {
        let (gate, users) = create_gate().await;
        let user = UserId(1);
        users.ensure_user(user).await.unwrap();
        for _ in 0..9 {
            users.decrement_use(user).await.unwrap();
        }

        let mut handles = vec![];
        for _ in 0..5 {
            let gate = gate.clone();
            handles.push(tokio::spawn(async move {
                match gate.try_consume(user).await.unwrap() {
                    QuotaDecision::Allowed(permit) => {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        gate.commit(permit).await.unwrap();
                        true
                    }
                    QuotaDecision::Denied { .. } => false,
                }
            }));
        }

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }

        assert_eq!(allowed, 1);
        assert_eq!(users.get_uses_left(user).await.unwrap(), 0);
        assert!(gate.locks.is_empty());
    }

    #[tokio::test]
    async fn test_locks_are_released_per_user() {
        let (gate, users) = create_gate().await;
        let user = UserId(1);
        users.ensure_user(user).await.unwrap();

        let QuotaDecision::Allowed(permit) = gate.try_consume(user).await.unwrap() else {
            panic!("expected allowed");
        };
        assert_eq!(gate.locks.len(), 1);
        gate.commit(permit).await.unwrap();
        assert!(gate.locks.is_empty());

        gate.try_consume(UserId(9)).await.unwrap();
        assert!(gate.locks.is_empty());
    }
}
