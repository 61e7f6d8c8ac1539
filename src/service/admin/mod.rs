use teloxide::types::UserId;

use super::user::{UserAccount, UserStats, UserStore};
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("Access denied")]
    Unauthorized,
    #[error("Invalid user id: {0:?}")]
    InvalidUserId(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Proof that the caller passed the admin check. Privileged operations require it.
#[derive(Debug)]
pub struct AdminCapability {
    admin_id: UserId,
}

impl AdminCapability {
    pub fn admin_id(&self) -> UserId {
        self.admin_id
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivationOutcome {
    Activated(UserId),
    NotFound(UserId),
}

#[derive(Clone)]
pub struct AdminAuthority {
    admin_id: UserId,
    users: UserStore,
}

impl AdminAuthority {
    pub fn new(admin_id: UserId, users: UserStore) -> Self {
        Self { admin_id, users }
    }

    pub fn is_admin(&self, user_id: UserId) -> bool {
        user_id == self.admin_id
    }

    pub fn authorize(&self, caller: UserId) -> Result<AdminCapability, AdminError> {
        if !self.is_admin(caller) {
            info!("User {} was denied a privileged command", caller);
            return Err(AdminError::Unauthorized);
        }
        Ok(AdminCapability { admin_id: caller })
    }

    pub async fn stats(&self, _cap: &AdminCapability) -> Result<UserStats, AdminError> {
        Ok(self.users.stats().await?)
    }

    pub async fn recent_users(&self, _cap: &AdminCapability, limit: u32) -> Result<Vec<UserAccount>, AdminError> {
        Ok(self.users.list_recent(limit).await?)
    }

    pub async fn find_user(&self, _cap: &AdminCapability, raw_id: &str) -> Result<Option<UserAccount>, AdminError> {
        let user_id = parse_user_id(raw_id)?;
        Ok(self.users.find(user_id).await?)
    }

    /// Grants the unlimited quota. Activating twice is harmless.
    pub async fn activate(&self, cap: &AdminCapability, raw_id: &str) -> Result<ActivationOutcome, AdminError> {
        let user_id = parse_user_id(raw_id)?;
        if self.users.activate_subscription(user_id).await? {
            info!("Admin {} activated a subscription for {}", cap.admin_id(), user_id);
            Ok(ActivationOutcome::Activated(user_id))
        } else {
            warn!("Admin {} tried to activate unknown user {}", cap.admin_id(), user_id);
            Ok(ActivationOutcome::NotFound(user_id))
        }
    }
}

pub fn parse_user_id(raw: &str) -> Result<UserId, AdminError> {
    raw.trim()
        .parse::<u64>()
        .map(UserId)
        .map_err(|_| AdminError::InvalidUserId(raw.to_string()))
}
