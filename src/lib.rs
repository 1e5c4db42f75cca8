pub mod bot;
pub mod cli;
pub mod core;
pub mod providers;
pub mod telegram;

use crate::bot::Bot;
use crate::cli::ui;
use crate::core::config::{AppConfig, TOKEN_ENV_VAR};
use anyhow::{Context, Result};
use tracing::{debug, info};

pub enum AppCommand {
    Serve,
    Ask(String),
    Rates,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("rublebot starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        cbr = config.cbr_base_url(),
        ttl_secs = config.cache_ttl_secs,
        http_timeout_secs = config.http_timeout_secs,
        "Loaded config"
    );

    match command {
        AppCommand::Serve => serve(&config).await,
        AppCommand::Ask(text) => {
            let bot = Bot::from_config(&config)?;
            let reply = bot.on_message(&text).await;
            println!("{}", ui::style_text(&reply, ui::StyleType::Reply));
            Ok(())
        }
        AppCommand::Rates => {
            let provider =
                providers::CbrRateProvider::new(config.cbr_base_url(), config.http_timeout())?;
            let rates = cli::rates::fetch_all_rates(&provider).await?;
            println!(
                "{}",
                cli::rates::display_rates_table(&rates, &config.messages.replies.base_symbol)
            );
            Ok(())
        }
    }
}

async fn serve(config: &AppConfig) -> Result<()> {
    let token = config.bot_token(std::env::var(TOKEN_ENV_VAR).ok())?;
    let bot = Bot::from_config(config)?;

    let poll_timeout_secs = config.telegram.poll_timeout_secs;
    // Request timeout has to outlive the long poll
    let client = telegram::TelegramClient::new(
        &config.telegram.base_url,
        &token,
        telegram::long_poll_request_timeout(poll_timeout_secs),
    )
    .context("Failed to create Telegram client")?;

    telegram::run_polling(&client, &bot, poll_timeout_secs).await
}
