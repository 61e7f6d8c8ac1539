mod model;

pub use model::{UserAccount, UserStats};

use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{params, Row};
use teloxide::types::UserId;

use crate::{
    config::QuotaConfig,
    storage::{StorageError, TursoClient},
};

#[derive(Clone)]
pub struct UserStore {
    client: TursoClient,
    quota: QuotaConfig,
}

impl UserStore {
    pub async fn new(client: TursoClient, quota: QuotaConfig) -> Result<Self, StorageError> {
        info!("Initializing UserStore...");
        let store = Self { client, quota };
        store.migrate().await?;
        info!("UserStore initialized");
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StorageError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY,
                uses_left INTEGER NOT NULL DEFAULT {},
                last_active TEXT NOT NULL
            )",
            self.quota.free_uses_limit
        );
        self.client.get_connection().execute(&sql, ()).await?;
        Ok(())
    }

    pub fn quota(&self) -> QuotaConfig {
        self.quota
    }

    /// Creates the account with the free quota if absent and refreshes `last_active`.
    /// Never touches `uses_left` of an existing account.
    pub async fn ensure_user(&self, user_id: UserId) -> Result<(), StorageError> {
        self.ensure_user_at(user_id, Utc::now()).await
    }

    pub(crate) async fn ensure_user_at(&self, user_id: UserId, at: DateTime<Utc>) -> Result<(), StorageError> {
        self.client
            .get_connection()
            .execute(
                "INSERT INTO users (user_id, uses_left, last_active) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET last_active = excluded.last_active",
                params![to_db_id(user_id), self.quota.free_uses_limit, format_timestamp(at)],
            )
            .await?;
        debug!("User {} ensured", user_id);
        Ok(())
    }

    /// Unknown users have no access, so they report zero uses.
    pub async fn get_uses_left(&self, user_id: UserId) -> Result<i64, StorageError> {
        Ok(self.find(user_id).await?.map(|account| account.uses_left).unwrap_or(0))
    }

    pub async fn find(&self, user_id: UserId) -> Result<Option<UserAccount>, StorageError> {
        let mut rows = self
            .client
            .get_connection()
            .query(
                "SELECT user_id, uses_left, last_active FROM users WHERE user_id = ?1 LIMIT 1",
                [to_db_id(user_id)],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(read_account(&row)?)),
            None => Ok(None),
        }
    }

    /// Returns `false` when no row was updated.
    pub async fn decrement_use(&self, user_id: UserId) -> Result<bool, StorageError> {
        let affected = self
            .client
            .get_connection()
            .execute(
                "UPDATE users SET uses_left = uses_left - 1 WHERE user_id = ?1",
                [to_db_id(user_id)],
            )
            .await?;
        Ok(affected > 0)
    }

    /// Returns `false` when the user does not exist.
    pub async fn activate_subscription(&self, user_id: UserId) -> Result<bool, StorageError> {
        let affected = self
            .client
            .get_connection()
            .execute(
                "UPDATE users SET uses_left = ?1 WHERE user_id = ?2",
                params![self.quota.unlimited_uses, to_db_id(user_id)],
            )
            .await?;
        Ok(affected > 0)
    }

    pub async fn list_recent(&self, limit: u32) -> Result<Vec<UserAccount>, StorageError> {
        let mut rows = self
            .client
            .get_connection()
            .query(
                "SELECT user_id, uses_left, last_active FROM users ORDER BY last_active DESC LIMIT ?1",
                [i64::from(limit)],
            )
            .await?;

        let mut accounts = Vec::new();
        while let Some(row) = rows.next().await? {
            accounts.push(read_account(&row)?);
        }
        Ok(accounts)
    }

    pub async fn list_ids(&self) -> Result<Vec<UserId>, StorageError> {
        let mut rows = self
            .client
            .get_connection()
            .query("SELECT user_id FROM users ORDER BY user_id", ())
            .await?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            ids.push(from_db_id(row.get::<i64>(0)?)?);
        }
        Ok(ids)
    }

    pub async fn stats(&self) -> Result<UserStats, StorageError> {
        let mut rows = self
            .client
            .get_connection()
            .query(
                "SELECT COUNT(*),
                        COALESCE(SUM(uses_left), 0),
                        COALESCE(SUM(CASE WHEN uses_left <> ?1 THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN uses_left < ?1 THEN 1 ELSE 0 END), 0)
                 FROM users",
                [self.quota.free_uses_limit],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(UserStats::default());
        };

        Ok(UserStats {
            total_users: row.get::<i64>(0)?.max(0) as u64,
            total_uses_left: row.get::<i64>(1)?,
            subscribers: row.get::<i64>(2)?.max(0) as u64,
            active_users: row.get::<i64>(3)?.max(0) as u64,
        })
    }
}

fn to_db_id(user_id: UserId) -> i64 {
    user_id.0 as i64
}

fn from_db_id(raw: i64) -> Result<UserId, StorageError> {
    u64::try_from(raw)
        .map(UserId)
        .map_err(|_| StorageError::InvalidRow(format!("negative user_id {}", raw)))
}

fn read_account(row: &Row) -> Result<UserAccount, StorageError> {
    Ok(UserAccount {
        id: from_db_id(row.get::<i64>(0)?)?,
        uses_left: row.get::<i64>(1)?,
        last_active: row.get::<String>(2)?,
    })
}

// Fixed precision keeps lexical order equal to chronological order.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
