use super::{ReplyKeyboardMarkup, TelegramClient, Update};
use crate::bot::Bot;
use anyhow::Result;
use futures::future::join_all;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const RETRY_DELAY: Duration = Duration::from_secs(2);

fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or_default();
    command == "/start" || command.starts_with("/start@")
}

/// Answers a single update. Updates without a text message are ignored.
pub async fn handle_update(client: &TelegramClient, bot: &Bot, update: &Update) -> Result<()> {
    let Some(message) = &update.message else {
        return Ok(());
    };
    let Some(text) = message.text.as_deref() else {
        debug!(update_id = update.update_id, "Ignoring non-text message");
        return Ok(());
    };

    if is_start_command(text) {
        let welcome = bot.on_start();
        let keyboard = ReplyKeyboardMarkup::from_labels(&welcome.keyboard);
        client
            .send_message(message.chat.id, &welcome.text, Some(&keyboard))
            .await
    } else {
        let reply = bot.on_message(text).await;
        client.send_message(message.chat.id, &reply, None).await
    }
}

/// Offset that acknowledges every update in `updates`.
fn next_offset(current: i64, updates: &[Update]) -> i64 {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .map_or(current, |next| next.max(current))
}

/// Runs one long poll and answers the batch, returning the offset for the next poll.
///
/// A failed `getUpdates` is logged and retried after `retry_delay` with the same
/// offset. Updates whose reply could not be sent are still acknowledged.
pub async fn poll_once(
    client: &TelegramClient,
    bot: &Bot,
    offset: i64,
    poll_timeout_secs: u64,
    retry_delay: Duration,
) -> i64 {
    let updates = match client.get_updates(offset, poll_timeout_secs).await {
        Ok(updates) => updates,
        Err(e) => {
            warn!(error = %e, "Polling failed, retrying");
            tokio::time::sleep(retry_delay).await;
            return offset;
        }
    };

    debug!(count = updates.len(), "Received updates");
    let results = join_all(updates.iter().map(|u| handle_update(client, bot, u))).await;
    for (update, result) in updates.iter().zip(results) {
        if let Err(e) = result {
            error!(update_id = update.update_id, error = %e, "Failed to answer update");
        }
    }
    next_offset(offset, &updates)
}

/// Polls for updates until `shutdown` completes.
pub async fn run_until<F>(client: &TelegramClient, bot: &Bot, poll_timeout_secs: u64, shutdown: F)
where
    F: Future<Output = ()>,
{
    info!("Bot is polling for updates");
    tokio::pin!(shutdown);
    let mut offset = 0;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutting down");
                return;
            }
            next = poll_once(client, bot, offset, poll_timeout_secs, RETRY_DELAY) => {
                offset = next;
            }
        }
    }
}

/// Polls for updates until Ctrl-C. Failures of single updates are logged and skipped.
pub async fn run_polling(client: &TelegramClient, bot: &Bot, poll_timeout_secs: u64) -> Result<()> {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            // Without a signal handler the bot runs until killed
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    run_until(client, bot, poll_timeout_secs, ctrl_c).await;
    Ok(())
}
