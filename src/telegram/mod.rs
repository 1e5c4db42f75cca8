//! Minimal Telegram Bot API client: long polling and text replies.

pub mod runner;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;

pub use runner::run_polling;

/// Client-side timeout for a long poll of `poll_timeout_secs`, with headroom for the reply.
pub fn long_poll_request_timeout(poll_timeout_secs: u64) -> Duration {
    Duration::from_secs(poll_timeout_secs.saturating_add(10))
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Serialize)]
struct GetUpdates {
    offset: i64,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KeyboardButton {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub resize_keyboard: bool,
}

impl ReplyKeyboardMarkup {
    pub fn from_labels(rows: &[Vec<String>]) -> Self {
        Self {
            keyboard: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|text| KeyboardButton { text: text.clone() })
                        .collect()
                })
                .collect(),
            resize_keyboard: true,
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a ReplyKeyboardMarkup>,
}

pub struct TelegramClient {
    api_url: String,
    client: reqwest::Client,
}

impl TelegramClient {
    /// `timeout` bounds each request and must exceed the long-poll timeout.
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("rublebot/0.1")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            api_url: format!("{}/bot{}", base_url.trim_end_matches('/'), token),
            client,
        })
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        // Keep the token out of logs
        debug!("Calling Telegram method {}", method);
        let url = format!("{}/{}", self.api_url, method);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| anyhow!("Request error calling {}: {}", method, e.without_url()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read {method} response"))?;
        let data: ApiResponse<T> = serde_json::from_str(&text).with_context(|| {
            format!("Failed to parse {method} response (HTTP {status})")
        })?;

        if !data.ok {
            return Err(anyhow!(
                "Telegram {} failed: {}",
                method,
                data.description.as_deref().unwrap_or("no description")
            ));
        }
        data.result
            .ok_or_else(|| anyhow!("Telegram {} returned no result", method))
    }

    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: timeout_secs,
                allowed_updates: ["message"],
            },
        )
        .await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&ReplyKeyboardMarkup>,
    ) -> Result<()> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                &SendMessage {
                    chat_id,
                    text,
                    reply_markup: keyboard,
                },
            )
            .await?;
        Ok(())
    }
}
