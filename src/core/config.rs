use super::router::{RawPhraseRule, ReplyTemplates};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

pub const TOKEN_ENV_VAR: &str = "TELEGRAM_BOT_TOKEN";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct TelegramConfig {
    pub token: Option<String>,
    pub base_url: String,
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        TelegramConfig {
            token: None,
            base_url: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CbrProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProvidersConfig {
    pub cbr: Option<CbrProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            cbr: Some(CbrProviderConfig {
                base_url: "https://www.cbr-xml-daily.ru".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct MessagesConfig {
    pub welcome: String,
    pub keyboard: Vec<Vec<String>>,
    #[serde(flatten)]
    pub replies: ReplyTemplates,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        MessagesConfig {
            welcome: "Hi! This is the ruble exchange rate bot.".to_string(),
            keyboard: vec![
                vec![
                    "Доллар США [RUB/USD]".to_string(),
                    "Евро [RUB/EUR]".to_string(),
                ],
                vec![
                    "Китайский Юань [RUB/CNY]".to_string(),
                    "Гонконгский доллар [RUB/HKD]".to_string(),
                ],
            ],
            replies: ReplyTemplates::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub providers: ProvidersConfig,
    pub cache_ttl_secs: u64,
    pub http_timeout_secs: u64,
    pub phrases: Option<Vec<RawPhraseRule>>,
    pub messages: MessagesConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            telegram: TelegramConfig::default(),
            providers: ProvidersConfig::default(),
            cache_ttl_secs: 300,
            http_timeout_secs: 10,
            phrases: None,
            messages: MessagesConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or built-in defaults if there is none.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("ru", "rublebot", "rublebot")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn cbr_base_url(&self) -> &str {
        self.providers
            .cbr
            .as_ref()
            .map_or("https://www.cbr-xml-daily.ru", |p| &p.base_url)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Picks the bot token, preferring `env_token` over the config file.
    pub fn bot_token(&self, env_token: Option<String>) -> Result<String> {
        env_token
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.telegram.token.clone())
            .filter(|t| !t.trim().is_empty())
            .with_context(|| {
                format!("No bot token: set {TOKEN_ENV_VAR} or telegram.token in the config file")
            })
    }
}
