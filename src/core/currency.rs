//! Currency codes and the rate provider abstraction

use super::error::{FetchError, UnknownCurrencyCode};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Foreign currencies quoted against the ruble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CurrencyCode {
    Usd,
    Eur,
    Cny,
    Hkd,
}

impl CurrencyCode {
    pub const ALL: [CurrencyCode; 4] = [
        CurrencyCode::Usd,
        CurrencyCode::Eur,
        CurrencyCode::Cny,
        CurrencyCode::Hkd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencyCode::Usd => "USD",
            CurrencyCode::Eur => "EUR",
            CurrencyCode::Cny => "CNY",
            CurrencyCode::Hkd => "HKD",
        }
    }

    /// Position of the code in [`CurrencyCode::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = UnknownCurrencyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "USD" => Ok(CurrencyCode::Usd),
            "EUR" => Ok(CurrencyCode::Eur),
            "CNY" => Ok(CurrencyCode::Cny),
            "HKD" => Ok(CurrencyCode::Hkd),
            other => Err(UnknownCurrencyCode(other.to_string())),
        }
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = UnknownCurrencyCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.as_str().to_string()
    }
}

/// Source of ruble exchange rates.
///
/// Returns the price of one unit of `code` in rubles.
#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    async fn get_rate(&self, code: CurrencyCode) -> Result<f64, FetchError>;
}
