use crate::core::currency::{CurrencyCode, CurrencyRateProvider};
use crate::core::error::{FetchError, FetchStage};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, instrument};

const DAILY_RATES_PATH: &str = "/daily_json.js";

/// Fetches ruble rates from the CBR daily JSON feed. Does no caching of its own.
pub struct CbrRateProvider {
    base_url: String,
    client: reqwest::Client,
}

impl CbrRateProvider {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("rublebot/0.1")
            .timeout(timeout)
            .build()?;
        Ok(CbrRateProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CbrDailyResponse {
    #[serde(rename = "Valute")]
    valute: Map<String, Value>,
}

fn extract_rate(body: &str, code: CurrencyCode) -> Result<f64, FetchError> {
    let data: CbrDailyResponse = serde_json::from_str(body).map_err(|e| {
        FetchError::new(
            code,
            FetchStage::Parse,
            format!("Failed to parse JSON response: {e}"),
        )
    })?;

    let value = data
        .valute
        .get(code.as_str())
        .ok_or_else(|| {
            FetchError::new(
                code,
                FetchStage::MissingField,
                format!("No Valute.{code} entry in response"),
            )
        })?
        .get("Value")
        .ok_or_else(|| {
            FetchError::new(
                code,
                FetchStage::MissingField,
                format!("No Valute.{code}.Value in response"),
            )
        })?;

    match value.as_f64() {
        Some(rate) if rate.is_finite() && rate > 0.0 => Ok(rate),
        _ => Err(FetchError::new(
            code,
            FetchStage::Parse,
            format!("Valute.{code}.Value is not a positive number: {value}"),
        )),
    }
}

#[async_trait]
impl CurrencyRateProvider for CbrRateProvider {
    #[instrument(name = "CbrRateFetch", skip(self), fields(code = %code))]
    async fn get_rate(&self, code: CurrencyCode) -> Result<f64, FetchError> {
        let url = format!("{}{}", self.base_url, DAILY_RATES_PATH);
        debug!("Requesting currency rate from {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            let reason = if e.is_timeout() { "Request timed out" } else { "Request error" };
            FetchError::new(code, FetchStage::Network, format!("{reason}: {e}"))
        })?;

        if !response.status().is_success() {
            return Err(FetchError::new(
                code,
                FetchStage::HttpStatus,
                format!("HTTP error: {}", response.status()),
            ));
        }

        let text = response.text().await.map_err(|e| {
            FetchError::new(
                code,
                FetchStage::Network,
                format!("Failed to read response body: {e}"),
            )
        })?;

        let rate = extract_rate(&text, code)?;
        debug!(rate, "Received CBR rate");
        Ok(rate)
    }
}
