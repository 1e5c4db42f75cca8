//! The two entry points a chat transport calls into.

use crate::core::config::{AppConfig, MessagesConfig};
use crate::core::router::{MessageRouter, PhraseTable};
use crate::core::{CurrencyCode, CurrencyRateProvider};
use crate::providers::{CachingRateProvider, CbrRateProvider};
use anyhow::{Context, Result, bail};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Greeting sent when a conversation starts, with one quick-reply button per currency.
#[derive(Debug, Clone, PartialEq)]
pub struct Welcome {
    pub text: String,
    pub keyboard: Vec<Vec<String>>,
}

pub struct Bot {
    router: MessageRouter,
    welcome: Welcome,
}

impl Bot {
    /// Checks that every keyboard button routes to a currency and that
    /// each currency has exactly one button.
    pub fn new(router: MessageRouter, welcome: Welcome) -> Result<Self> {
        let mut seen = HashSet::new();
        for label in welcome.keyboard.iter().flatten() {
            let Some(code) = router.resolve(label) else {
                bail!("Keyboard button {label:?} does not match any phrase rule");
            };
            if !seen.insert(code) {
                bail!("More than one keyboard button resolves to {code}");
            }
        }
        if let Some(missing) = CurrencyCode::ALL.iter().find(|c| !seen.contains(*c)) {
            bail!("No keyboard button resolves to {missing}");
        }

        Ok(Self { router, welcome })
    }

    /// Wires the bot to the CBR feed as configured.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let upstream = CbrRateProvider::new(config.cbr_base_url(), config.http_timeout())
            .context("Failed to create HTTP client")?;
        let provider: Arc<dyn CurrencyRateProvider> =
            Arc::new(CachingRateProvider::new(upstream, config.cache_ttl()));
        Self::with_provider(config, provider)
    }

    pub fn with_provider(
        config: &AppConfig,
        provider: Arc<dyn CurrencyRateProvider>,
    ) -> Result<Self> {
        let table = match &config.phrases {
            Some(raw) => PhraseTable::from_raw(raw).context("Invalid phrase table")?,
            None => PhraseTable::default(),
        };
        info!(
            rules = table.rules().len(),
            ttl_secs = config.cache_ttl_secs,
            "Bot configured"
        );

        let MessagesConfig {
            welcome,
            keyboard,
            replies,
        } = config.messages.clone();
        let router = MessageRouter::new(table, provider, replies);
        Self::new(
            router,
            Welcome {
                text: welcome,
                keyboard,
            },
        )
    }

    pub fn on_start(&self) -> Welcome {
        self.welcome.clone()
    }

    pub async fn on_message(&self, text: &str) -> String {
        self.router.route(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::FetchError;
    use crate::core::router::RawPhraseRule;
    use async_trait::async_trait;

    struct StaticProvider;

    #[async_trait]
    impl CurrencyRateProvider for StaticProvider {
        async fn get_rate(&self, _code: CurrencyCode) -> Result<f64, FetchError> {
            Ok(12.5)
        }
    }

    fn bot(config: &AppConfig) -> Result<Bot> {
        Bot::with_provider(config, Arc::new(StaticProvider))
    }

    #[tokio::test]
    async fn test_default_bot() {
        let bot = bot(&AppConfig::default()).unwrap();

        let welcome = bot.on_start();
        assert_eq!(welcome.text, "Hi! This is the ruble exchange rate bot.");
        assert_eq!(welcome.keyboard.iter().flatten().count(), 4);

        // Every button routes to a rate reply
        for label in welcome.keyboard.iter().flatten() {
            assert!(bot.on_message(label).await.starts_with("cost of 1 "));
        }
        assert_eq!(
            bot.on_message("Хочу купить Доллар США [RUB/USD]").await,
            "cost of 1 USD = 12.5 ₽"
        );
    }

    #[test]
    fn test_unknown_currency_in_phrases_is_fatal() {
        let mut config = AppConfig::default();
        config.phrases = Some(vec![RawPhraseRule {
            pattern: "RUB/JPY".to_string(),
            currency: "JPY".to_string(),
        }]);

        let err = bot(&config).err().unwrap();
        assert_eq!(err.to_string(), "Invalid phrase table");
        assert_eq!(err.root_cause().to_string(), "unknown currency code: JPY");
    }

    #[test]
    fn test_unroutable_button_is_rejected() {
        let mut config = AppConfig::default();
        config.messages.keyboard[0][0] = "Доллар США".to_string();

        let err = bot(&config).err().unwrap();
        assert!(err.to_string().contains("does not match any phrase rule"));
    }

    #[test]
    fn test_keyboard_must_cover_every_currency() {
        let mut config = AppConfig::default();
        config.messages.keyboard[1].pop();

        let err = bot(&config).err().unwrap();
        assert_eq!(err.to_string(), "No keyboard button resolves to HKD");

        let mut config = AppConfig::default();
        config.messages.keyboard[1][1] = "USD again [RUB/USD]".to_string();
        let err = bot(&config).err().unwrap();
        assert_eq!(err.to_string(), "More than one keyboard button resolves to USD");
    }
}
