//! Transport-agnostic request relay.
//!
//! One inbound link runs through a fixed sequence: validate, acknowledge,
//! probe, download into a scoped workspace, enforce the size ceiling, send
//! the video, release the workspace. The messaging side is reached only
//! through the narrow [`Replier`] seam, so the whole flow is exercised in
//! tests without a live bot.

use crate::config::Settings;
use crate::download::workspace::RequestWorkspace;
use crate::download::{Extractor, MediaMetadata};
use crate::error::ExtractError;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use tracing::{error, info, warn};

/// Reply sent when the inbound text is not a link.
pub const INVALID_LINK_TEXT: &str = "Пожалуйста, отправь корректную ссылку на видео.";
/// Acknowledgement sent before extraction starts.
pub const DOWNLOADING_TEXT: &str = "Скачиваю видео, подожди немного...";
/// Reply for private source videos.
pub const PRIVATE_VIDEO_TEXT: &str =
    "Это приватное видео. Я могу скачивать только публичные видео.";
/// Reply for unavailable or removed source videos.
pub const UNAVAILABLE_TEXT: &str = "Видео недоступно или было удалено.";
/// Reply for platforms the extractor cannot handle.
pub const UNSUPPORTED_TEXT: &str = "Эта платформа пока не поддерживается.";
/// Reply when extraction exceeds its time budget.
pub const TIMEOUT_TEXT: &str =
    "Не удалось скачать видео за отведённое время. Попробуйте позже.";
/// Reply when extraction reported success but left no file behind.
pub const ARTIFACT_MISSING_TEXT: &str = "Ошибка: не удалось скачать видео.";

/// Outbound capabilities the relay needs from the messaging platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Replier: Send + Sync {
    /// Send a plain status or error reply.
    async fn send_text(&self, text: &str) -> Result<()>;
    /// Send a local file as a video attachment with a caption.
    async fn send_video(&self, file: &Path, caption: &str) -> Result<()>;
}

/// Reply for an artifact over the size ceiling.
#[must_use]
pub fn too_large_text(limit_mb: u64) -> String {
    format!("Видео слишком большое (больше {limit_mb} MB). Попробуйте другое видео.")
}

/// Generic extraction-failure reply carrying the raw diagnostic.
#[must_use]
pub fn extraction_failed_text(detail: &str) -> String {
    format!("Ошибка при скачивании: {}", html_escape::encode_text(detail))
}

/// Reply when the video was produced but could not be delivered.
#[must_use]
pub fn send_failed_text(detail: &str) -> String {
    format!(
        "Не удалось отправить видео: {}",
        html_escape::encode_text(detail)
    )
}

/// Caption for a relayed video, referencing the source URL.
#[must_use]
pub fn caption_for(url: &str, title: Option<&str>) -> String {
    match title {
        Some(title) => format!("{title}\nСкачано с: {url}"),
        None => format!("Скачано с: {url}"),
    }
}

/// Map a classified extraction failure to its user-visible reply.
#[must_use]
pub fn reply_for(error: &ExtractError) -> String {
    match error {
        ExtractError::PrivateContent => PRIVATE_VIDEO_TEXT.to_string(),
        ExtractError::Unavailable => UNAVAILABLE_TEXT.to_string(),
        ExtractError::Unsupported => UNSUPPORTED_TEXT.to_string(),
        ExtractError::Timeout { .. } => TIMEOUT_TEXT.to_string(),
        ExtractError::ArtifactMissing => ARTIFACT_MISSING_TEXT.to_string(),
        ExtractError::Other(detail) => extraction_failed_text(detail),
    }
}

fn is_link(text: &str) -> bool {
    text.starts_with("http://") || text.starts_with("https://")
}

/// Handle one inbound text message end to end.
///
/// Per-request failures are terminal for that request only: they are
/// reported to the user and never escalate. The returned error covers
/// only the messaging transport itself.
///
/// # Errors
///
/// Returns an error when a reply cannot be delivered at all.
pub async fn handle_request<E, R>(
    settings: &Settings,
    extractor: &E,
    replier: &R,
    text: &str,
) -> Result<()>
where
    E: Extractor + ?Sized,
    R: Replier + ?Sized,
{
    let url = text.trim();
    if !is_link(url) {
        replier.send_text(INVALID_LINK_TEXT).await?;
        return Ok(());
    }

    replier.send_text(DOWNLOADING_TEXT).await?;

    let meta = match extractor.probe(url).await {
        Ok(meta) => meta,
        Err(err) => {
            warn!(%url, error = %err, "metadata probe failed");
            replier.send_text(&reply_for(&err)).await?;
            return Ok(());
        }
    };

    if let Some(estimate) = meta.estimated_size() {
        if estimate > settings.max_file_size_bytes() {
            info!(%url, estimate, "estimated size over the ceiling, skipping download");
            replier
                .send_text(&too_large_text(settings.max_file_size_mb))
                .await?;
            return Ok(());
        }
    }

    let workspace = match RequestWorkspace::create(Path::new(&settings.download_dir)) {
        Ok(workspace) => workspace,
        Err(err) => {
            error!(error = %err, "failed to create request workspace");
            replier.send_text(ARTIFACT_MISSING_TEXT).await?;
            return Ok(());
        }
    };

    // Workspace removal runs on every exit path below, including send
    // failures, when `workspace` drops.
    fetch_and_send(settings, extractor, replier, url, &meta, workspace.path()).await
}

async fn fetch_and_send<E, R>(
    settings: &Settings,
    extractor: &E,
    replier: &R,
    url: &str,
    meta: &MediaMetadata,
    dest: &Path,
) -> Result<()>
where
    E: Extractor + ?Sized,
    R: Replier + ?Sized,
{
    let outcome = match extractor.extract(url, dest).await {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(%url, error = %err, "extraction failed");
            replier.send_text(&reply_for(&err)).await?;
            return Ok(());
        }
    };

    if outcome.size_bytes > settings.max_file_size_bytes() {
        info!(
            %url,
            size = outcome.size_bytes,
            "artifact over the size ceiling, rejecting"
        );
        if let Err(err) = tokio::fs::remove_file(&outcome.file_path).await {
            warn!(path = %outcome.file_path.display(), error = %err, "failed to delete oversized artifact");
        }
        replier
            .send_text(&too_large_text(settings.max_file_size_mb))
            .await?;
        return Ok(());
    }

    let caption = caption_for(url, meta.title.as_deref());
    if let Err(err) = replier.send_video(&outcome.file_path, &caption).await {
        error!(%url, error = %err, "failed to send video");
        replier.send_text(&send_failed_text(&err.to_string())).await?;
    } else {
        info!(%url, size = outcome.size_bytes, "video relayed");
    }

    Ok(())
}
