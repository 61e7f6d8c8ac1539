use teloxide::types::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: UserId,
    pub uses_left: i64,
    /// RFC 3339 timestamp of the last observed interaction.
    pub last_active: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    pub total_users: u64,
    pub total_uses_left: i64,
    /// Accounts that left the untouched free tier: any usage history or an activated subscription.
    pub subscribers: u64,
    /// Accounts with at least one consumed use below the free limit.
    pub active_users: u64,
}
