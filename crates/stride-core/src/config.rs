use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::StrideError;

/// Top-level Stride configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub dialogue: DialogueConfig,
}

/// Telegram bot config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token. May also come from the TELEGRAM_BOT_TOKEN env var.
    #[serde(default)]
    pub bot_token: String,
    /// Server-side long-poll timeout in seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

/// Storage config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Account-linking HTTP endpoint config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_bind")]
    pub bind: String,
    /// Bearer token required on mutating requests. `None` allows all —
    /// only sensible behind the web application's own auth.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: default_api_bind(),
            api_key: None,
        }
    }
}

/// Goal-creation dialogue config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Seconds of inactivity before an open dialogue is auto-cancelled.
    /// 0 disables expiry.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

// --- Default value functions ---

fn default_true() -> bool {
    true
}
fn default_poll_timeout() -> u64 {
    30
}
fn default_db_path() -> String {
    "~/.stride/stride.db".to_string()
}
fn default_api_bind() -> String {
    "127.0.0.1:8060".to_string()
}
fn default_idle_timeout() -> u64 {
    600
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file, falling back to defaults when the
/// file does not exist. The bot token may be overridden by the
/// TELEGRAM_BOT_TOKEN environment variable either way.
pub fn load(path: &str) -> Result<Config, StrideError> {
    let path = Path::new(path);

    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)?;
        toml::from_str::<Config>(&content)
            .map_err(|e| StrideError::Config(format!("failed to parse {}: {e}", path.display())))?
    } else {
        info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        Config::default()
    };

    if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
        if !token.is_empty() {
            config.telegram.bot_token = token;
        }
    }

    Ok(config)
}
