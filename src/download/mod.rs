//! Media extraction boundary.
//!
//! The bot never talks to source platforms itself; everything goes through
//! the [`Extractor`] trait, implemented for the yt-dlp binary in
//! [`ytdlp::YtDlpExtractor`]. Transient artifacts live in per-request
//! [`workspace::RequestWorkspace`] directories.

/// Per-request scoped download directories.
pub mod workspace;
/// yt-dlp backed extractor.
pub mod ytdlp;

use crate::error::ExtractError;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Source metadata reported by the extractor without downloading.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaMetadata {
    /// Human-readable title of the source video.
    #[serde(default)]
    pub title: Option<String>,
    /// Duration in seconds, when the platform reports one.
    #[serde(default, rename = "duration")]
    pub duration_secs: Option<f64>,
    /// Exact size of the selected format, in bytes, when known.
    #[serde(default)]
    pub filesize: Option<u64>,
    /// Approximate size of the selected format, in bytes, when known.
    #[serde(default)]
    pub filesize_approx: Option<u64>,
}

impl MediaMetadata {
    /// Best available size estimate, preferring the exact figure.
    #[must_use]
    pub const fn estimated_size(&self) -> Option<u64> {
        match self.filesize {
            Some(size) => Some(size),
            None => self.filesize_approx,
        }
    }
}

/// A materialized download, owned by exactly one request.
///
/// The backing file lives inside that request's workspace and never
/// outlives the request's reply.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    /// Path of the produced media file.
    pub file_path: PathBuf,
    /// Size of the produced file, in bytes.
    pub size_bytes: u64,
    /// Originating URL.
    pub url: String,
}

/// External collaborator resolving a URL to a local media file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Fetch source metadata without downloading anything.
    async fn probe(&self, url: &str) -> Result<MediaMetadata, ExtractError>;

    /// Download the media behind `url` into `dest`.
    ///
    /// A single URL never expands to a batch: playlist expansion is
    /// disabled by every implementation.
    async fn extract(&self, url: &str, dest: &Path) -> Result<DownloadOutcome, ExtractError>;
}
