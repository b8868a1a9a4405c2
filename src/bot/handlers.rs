//! Command and link handlers.
//!
//! `/start` and `/help` answer with static capability texts; any other text
//! message is treated as a candidate link and handed to the relay. The
//! relay talks to Telegram through [`TelegramReplier`], which wraps the
//! retrying send helpers.

use crate::bot::relay::{self, Replier};
use crate::bot::resilient;
use crate::config::Settings;
use crate::download::ytdlp::YtDlpExtractor;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};
use teloxide::utils::command::BotCommands;

/// Commands understood by the bot.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Поддерживаемые команды:")]
pub enum Command {
    /// Show the welcome message.
    #[command(description = "Начать работу.")]
    Start,
    /// Show usage help.
    #[command(description = "Показать помощь.")]
    Help,
}

/// Static welcome message sent for `/start`.
pub const WELCOME_TEXT: &str = "🎥 <b>Video Downloader Bot</b>\n\n\
Привет! Я могу скачивать видео с различных платформ:\n\
• YouTube\n\
• Twitter/X\n\
• Instagram\n\
• TikTok\n\
• И многих других!\n\n\
Просто отправь мне ссылку на видео, и я скачаю его для тебя.\n\n\
<b>Ограничения:</b>\n\
• Максимальный размер файла: 50 MB\n\
• Только публичные видео";

/// Static help message sent for `/help`.
pub const HELP_TEXT: &str = "🔧 <b>Помощь</b>\n\n\
<b>Поддерживаемые платформы:</b>\n\
• YouTube (youtube.com, youtu.be)\n\
• Twitter/X (twitter.com, x.com)\n\
• Instagram (instagram.com)\n\
• TikTok (tiktok.com)\n\
• Reddit (reddit.com)\n\
• Vimeo (vimeo.com)\n\
• И многие другие!\n\n\
<b>Как использовать:</b>\n\
1. Отправь мне ссылку на видео\n\
2. Жди, пока я скачаю видео\n\
3. Получай готовый файл!\n\n\
<b>Команды:</b>\n\
/start — Начать работу\n\
/help — Показать эту помощь\n\n\
<b>Ограничения:</b>\n\
• Размер файла: до 50 MB\n\
• Только публичные видео";

/// Handle `/start`: send the static welcome message.
///
/// # Errors
///
/// Returns an error if the reply cannot be delivered.
pub async fn start(bot: Bot, msg: Message) -> Result<()> {
    resilient::send_text(&bot, msg.chat.id, WELCOME_TEXT, Some(ParseMode::Html)).await?;
    Ok(())
}

/// Handle `/help`: send the static help message.
///
/// # Errors
///
/// Returns an error if the reply cannot be delivered.
pub async fn help(bot: Bot, msg: Message) -> Result<()> {
    resilient::send_text(&bot, msg.chat.id, HELP_TEXT, Some(ParseMode::Html)).await?;
    Ok(())
}

/// Handle a plain text message as a candidate video link.
///
/// # Errors
///
/// Returns an error if a reply cannot be delivered.
pub async fn handle_link(
    bot: Bot,
    msg: Message,
    settings: Arc<Settings>,
    extractor: Arc<YtDlpExtractor>,
) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let replier = TelegramReplier {
        bot: &bot,
        chat_id: msg.chat.id,
    };
    relay::handle_request(settings.as_ref(), extractor.as_ref(), &replier, text).await
}

/// [`Replier`] implementation backed by the live Telegram bot.
struct TelegramReplier<'a> {
    bot: &'a Bot,
    chat_id: ChatId,
}

#[async_trait]
impl Replier for TelegramReplier<'_> {
    async fn send_text(&self, text: &str) -> Result<()> {
        resilient::send_text(self.bot, self.chat_id, text, Some(ParseMode::Html))
            .await
            .map(|_| ())
    }

    async fn send_video(&self, file: &Path, caption: &str) -> Result<()> {
        resilient::send_video(self.bot, self.chat_id, file, caption)
            .await
            .map(|_| ())
    }
}
