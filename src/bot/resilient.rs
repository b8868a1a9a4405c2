//! Retrying wrappers for Telegram API operations.
//!
//! Outbound sends can fail on transient network errors; these helpers retry
//! with exponential backoff and jitter before giving up. Extraction itself
//! is never retried — only delivery to Telegram.

use crate::config::{
    TELEGRAM_API_INITIAL_BACKOFF_MS, TELEGRAM_API_MAX_BACKOFF_MS, TELEGRAM_API_MAX_RETRIES,
};
use anyhow::{anyhow, Result};
use std::path::Path;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile, Message, ParseMode};
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::warn;

/// Retry a Telegram API operation with exponential backoff and jitter.
async fn retry_telegram_operation<F, Fut, T>(operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let retry_strategy = ExponentialBackoff::from_millis(TELEGRAM_API_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(TELEGRAM_API_MAX_BACKOFF_MS))
        .map(jitter)
        .take(TELEGRAM_API_MAX_RETRIES);

    Retry::spawn(retry_strategy, operation).await.map_err(|e| {
        warn!(
            "Telegram API operation failed after {} attempts: {}",
            TELEGRAM_API_MAX_RETRIES, e
        );
        e
    })
}

/// Send a text message with automatic retry on transient failures.
///
/// # Errors
///
/// Returns an error once all retries are exhausted.
pub async fn send_text(
    bot: &Bot,
    chat_id: ChatId,
    text: impl Into<String>,
    parse_mode: Option<ParseMode>,
) -> Result<Message> {
    let text = text.into();
    retry_telegram_operation(|| async {
        let mut req = bot.send_message(chat_id, text.clone());
        if let Some(pm) = parse_mode {
            req = req.parse_mode(pm);
        }
        req.await
            .map_err(|e| anyhow!("Telegram send error: {e}"))
    })
    .await
}

/// Send a local file as a video attachment with automatic retry.
///
/// # Errors
///
/// Returns an error once all retries are exhausted.
pub async fn send_video(
    bot: &Bot,
    chat_id: ChatId,
    file: &Path,
    caption: &str,
) -> Result<Message> {
    let file = file.to_path_buf();
    let caption = caption.to_string();
    retry_telegram_operation(|| async {
        bot.send_video(chat_id, InputFile::file(file.clone()))
            .caption(caption.clone())
            .await
            .map_err(|e| anyhow!("Telegram video send error: {e}"))
    })
    .await
}
