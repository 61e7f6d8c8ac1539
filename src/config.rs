use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use teloxide::types::{ChatId, Recipient, UserId};

const DEFAULT_ADMIN_ID: u64 = 1082828397;
const DEFAULT_FREE_USES_LIMIT: i64 = 10;
const DEFAULT_UNLIMITED_USES: i64 = 999;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing {0}")]
    Missing(&'static str),
    #[error("Invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub admin: AdminConfig,
    pub storage: StorageConfig,
    pub quota: QuotaConfig,
    pub analyzer: AnalyzerConfig,
    pub broadcast: BroadcastConfig,
    pub assets: AssetsConfig,
    pub server: ServerConfig,
}

#[derive(Clone, Debug)]
pub struct TelegramConfig(pub String);

#[derive(Clone, Debug)]
pub struct AdminConfig {
    pub telegram_user_id: UserId,
    /// Announcement channel for side notifications, disabled when unset.
    pub channel: Option<Recipient>,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub database_url: String,
    pub database_token: Option<String>,
}

impl StorageConfig {
    pub fn is_remote(&self) -> bool {
        self.database_url.starts_with("libsql://") || self.database_url.starts_with("https://")
    }
}

#[derive(Clone, Copy, Debug)]
pub struct QuotaConfig {
    pub free_uses_limit: i64,
    /// Stored in `uses_left` to mark an activated subscription.
    pub unlimited_uses: i64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            free_uses_limit: DEFAULT_FREE_USES_LIMIT,
            unlimited_uses: DEFAULT_UNLIMITED_USES,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AnalyzerConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

#[derive(Clone, Copy, Debug)]
pub struct BroadcastConfig {
    pub concurrency: usize,
    pub pacing: Duration,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            pacing: Duration::from_millis(50),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AssetsConfig {
    pub dir: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    Polling,
    Webhook,
}

impl FromStr for RunMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "polling" => Ok(RunMode::Polling),
            "webhook" => Ok(RunMode::Webhook),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub mode: RunMode,
    pub webhook_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        info!("Building AppConfig...");
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let storage = StorageConfig {
            database_url: get("DATABASE_URL").unwrap_or_else(|| "users.db".to_string()),
            database_token: get("DATABASE_TOKEN"),
        };
        if storage.is_remote() && storage.database_token.is_none() {
            return Err(ConfigError::Missing("DATABASE_TOKEN"));
        }

        let channel = get("CHANNEL_ID").map(|raw| parse_channel(&raw)).transpose()?;
        if channel.is_none() {
            warn!("CHANNEL_ID is not set, channel notifications are disabled");
        }

        let quota = QuotaConfig {
            free_uses_limit: parse_or(&get, "FREE_USES_LIMIT", DEFAULT_FREE_USES_LIMIT)?,
            unlimited_uses: parse_or(&get, "UNLIMITED_USES", DEFAULT_UNLIMITED_USES)?,
        };
        if quota.unlimited_uses <= quota.free_uses_limit {
            return Err(ConfigError::Invalid {
                key: "UNLIMITED_USES",
                value: quota.unlimited_uses.to_string(),
            });
        }

        let concurrency: usize = parse_or(&get, "BROADCAST_CONCURRENCY", 4)?;
        if concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "BROADCAST_CONCURRENCY",
                value: "0".to_string(),
            });
        }

        let config = AppConfig {
            telegram: TelegramConfig(require("BOT_TOKEN")?),
            admin: AdminConfig {
                telegram_user_id: UserId(parse_or(&get, "ADMIN_ID", DEFAULT_ADMIN_ID)?),
                channel,
            },
            storage,
            quota,
            analyzer: AnalyzerConfig {
                api_key: require("OPENAI_API_KEY")?,
                base_url: get("OPENAI_BASE_URL")
                    .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                model: get("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
                max_tokens: parse_or(&get, "ANALYSIS_MAX_TOKENS", 500)?,
                timeout: Duration::from_secs(parse_or(&get, "ANALYSIS_TIMEOUT_SECS", 60)?),
            },
            broadcast: BroadcastConfig {
                concurrency,
                pacing: Duration::from_millis(parse_or(&get, "BROADCAST_PACING_MS", 50)?),
            },
            assets: AssetsConfig {
                dir: PathBuf::from(get("ASSETS_DIR").unwrap_or_else(|| "img".to_string())),
            },
            server: ServerConfig {
                mode: parse_or(&get, "RUN_MODE", RunMode::Polling)?,
                webhook_addr: parse_or(&get, "WEBHOOK_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            },
        };
        info!("AppConfig built");

        Ok(config)
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value.parse::<T>().map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn parse_channel(raw: &str) -> Result<Recipient, ConfigError> {
    if let Ok(id) = raw.parse::<i64>() {
        return Ok(Recipient::Id(ChatId(id)));
    }
    if raw.starts_with('@') && raw.len() > 1 {
        return Ok(Recipient::ChannelUsername(raw.to_string()));
    }
    Err(ConfigError::Invalid {
        key: "CHANNEL_ID",
        value: raw.to_string(),
    })
}
