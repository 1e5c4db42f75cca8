//! Maps free-text messages to a currency and a reply

use super::currency::{CurrencyCode, CurrencyRateProvider};
use super::error::UnknownCurrencyCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Pairs a phrase fragment with the currency it asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseRule {
    pub pattern: String,
    pub code: CurrencyCode,
}

impl PhraseRule {
    pub fn new(pattern: impl Into<String>, code: CurrencyCode) -> Self {
        Self {
            pattern: pattern.into(),
            code,
        }
    }
}

/// Phrase rule as written in configuration, before code validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawPhraseRule {
    pub pattern: String,
    pub currency: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PhraseTableError {
    #[error(transparent)]
    UnknownCurrency(#[from] UnknownCurrencyCode),
    #[error("phrase rule #{0} has an empty pattern")]
    EmptyPattern(usize),
}

/// Ordered phrase rules; the first matching rule wins.
#[derive(Debug, Clone)]
pub struct PhraseTable {
    rules: Vec<PhraseRule>,
}

impl PhraseTable {
    pub fn new(rules: Vec<PhraseRule>) -> Self {
        Self { rules }
    }

    /// Builds the table from configured rules, rejecting unknown codes.
    pub fn from_raw(raw: &[RawPhraseRule]) -> Result<Self, PhraseTableError> {
        let rules = raw
            .iter()
            .enumerate()
            .map(|(i, rule)| {
                if rule.pattern.is_empty() {
                    return Err(PhraseTableError::EmptyPattern(i));
                }
                let code = rule.currency.parse::<CurrencyCode>()?;
                Ok(PhraseRule::new(rule.pattern.clone(), code))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[PhraseRule] {
        &self.rules
    }

    pub fn resolve(&self, text: &str) -> Option<&PhraseRule> {
        self.rules.iter().find(|rule| text.contains(&rule.pattern))
    }
}

impl Default for PhraseTable {
    fn default() -> Self {
        Self::new(
            CurrencyCode::ALL
                .iter()
                .map(|code| PhraseRule::new(format!("RUB/{code}"), *code))
                .collect(),
        )
    }
}

/// Reply texts. `{code}`, `{value}` and `{symbol}` are substituted.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ReplyTemplates {
    pub rate: String,
    pub base_symbol: String,
    pub unavailable: String,
    pub fallback: String,
}

impl Default for ReplyTemplates {
    fn default() -> Self {
        Self {
            rate: "cost of 1 {code} = {value} {symbol}".to_string(),
            base_symbol: "₽".to_string(),
            unavailable: "The {code} rate is temporarily unavailable, please try again later"
                .to_string(),
            fallback: "I don't understand what you want".to_string(),
        }
    }
}

impl ReplyTemplates {
    fn render_rate(&self, code: CurrencyCode, value: f64) -> String {
        self.rate
            .replace("{code}", code.as_str())
            .replace("{value}", &value.to_string())
            .replace("{symbol}", &self.base_symbol)
    }

    fn render_unavailable(&self, code: CurrencyCode) -> String {
        self.unavailable.replace("{code}", code.as_str())
    }
}

pub struct MessageRouter {
    table: PhraseTable,
    provider: Arc<dyn CurrencyRateProvider>,
    replies: ReplyTemplates,
}

impl MessageRouter {
    pub fn new(
        table: PhraseTable,
        provider: Arc<dyn CurrencyRateProvider>,
        replies: ReplyTemplates,
    ) -> Self {
        Self {
            table,
            provider,
            replies,
        }
    }

    pub fn resolve(&self, text: &str) -> Option<CurrencyCode> {
        self.table.resolve(text).map(|rule| rule.code)
    }

    /// Produces the reply for one inbound message.
    ///
    /// Fetch failures turn into the "unavailable" reply; they never escape.
    pub async fn route(&self, text: &str) -> String {
        let Some(code) = self.resolve(text) else {
            debug!("No phrase rule matched message");
            return self.replies.fallback.clone();
        };

        debug!("Message resolved to {}", code);
        match self.provider.get_rate(code).await {
            Ok(value) => self.replies.render_rate(code, value),
            Err(e) => {
                warn!(error = %e, stage = %e.stage, "Rate lookup failed");
                self.replies.render_unavailable(code)
            }
        }
    }
}
