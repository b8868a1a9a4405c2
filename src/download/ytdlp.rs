//! yt-dlp backed extractor.
//!
//! Runs the yt-dlp binary as a child process: a metadata probe (`-J`) before
//! downloading, then the download itself with the configured format policy.
//! Diagnostics on stderr are classified into [`ExtractError`] variants here
//! and nowhere else.

use crate::config::Settings;
use crate::download::{DownloadOutcome, Extractor, MediaMetadata};
use crate::error::ExtractError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Patterns marking a private source video.
const PRIVATE_PATTERNS: &[&str] = &["Private video", "This video is private"];

/// Patterns marking an unavailable or removed source video.
const UNAVAILABLE_PATTERNS: &[&str] = &[
    "Video unavailable",
    "This video has been removed",
    "no longer available",
];

/// Patterns marking a platform the extractor cannot handle.
const UNSUPPORTED_PATTERNS: &[&str] = &["not supported", "Unsupported URL"];

/// Extractor implementation spawning the yt-dlp binary.
pub struct YtDlpExtractor {
    bin: String,
    format_policy: String,
    timeout: Duration,
}

impl YtDlpExtractor {
    /// Build an extractor from the process settings.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            bin: settings.ytdlp_bin.clone(),
            format_policy: settings.format_policy.clone(),
            timeout: settings.extraction_timeout(),
        }
    }

    /// Run yt-dlp with `args` under the extraction time budget.
    ///
    /// The child is killed if the budget expires or the future is dropped.
    async fn run(&self, args: &[String]) -> Result<Output, ExtractError> {
        debug!(bin = %self.bin, ?args, "running yt-dlp");
        let child = Command::new(&self.bin)
            .args(args)
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true)
            .output();

        match timeout(self.timeout, child).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(ExtractError::Other(format!(
                "failed to run {}: {e}",
                self.bin
            ))),
            Err(_) => Err(ExtractError::Timeout {
                secs: self.timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    async fn probe(&self, url: &str) -> Result<MediaMetadata, ExtractError> {
        let output = self.run(&build_probe_args(url)).await?;
        if !output.status.success() {
            return Err(classify_failure(&String::from_utf8_lossy(&output.stderr)));
        }
        serde_json::from_slice(&output.stdout)
            .map_err(|e| ExtractError::Other(format!("unreadable yt-dlp metadata: {e}")))
    }

    async fn extract(&self, url: &str, dest: &Path) -> Result<DownloadOutcome, ExtractError> {
        let output = self
            .run(&build_extract_args(url, dest, &self.format_policy))
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(%url, stderr = %stderr.trim(), "yt-dlp exited with failure");
            return Err(classify_failure(&stderr));
        }

        // The last printed line is the final path after any remux/move.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let file_path = stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(PathBuf::from)
            .ok_or(ExtractError::ArtifactMissing)?;

        let meta = tokio::fs::metadata(&file_path)
            .await
            .map_err(|_| ExtractError::ArtifactMissing)?;

        Ok(DownloadOutcome {
            file_path,
            size_bytes: meta.len(),
            url: url.to_string(),
        })
    }
}

/// Arguments for the metadata probe.
fn build_probe_args(url: &str) -> Vec<String> {
    ["-J", "--no-playlist", "--no-warnings", "--", url]
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Arguments for the download run.
///
/// `--print after_move:filepath` makes yt-dlp report the final artifact
/// path on stdout; `--` guards against link text being parsed as options.
fn build_extract_args(url: &str, dest: &Path, format_policy: &str) -> Vec<String> {
    let template = dest.join("%(title)s.%(ext)s");
    vec![
        "--no-playlist".to_string(),
        "--no-warnings".to_string(),
        "--no-progress".to_string(),
        "-f".to_string(),
        format_policy.to_string(),
        "-o".to_string(),
        template.to_string_lossy().into_owned(),
        "--no-simulate".to_string(),
        "--print".to_string(),
        "after_move:filepath".to_string(),
        "--".to_string(),
        url.to_string(),
    ]
}

/// Classify yt-dlp diagnostics into a tagged error, once.
///
/// Precedence follows the most specific condition first; anything
/// unrecognized keeps its raw text for the generic user reply.
fn classify_failure(stderr: &str) -> ExtractError {
    if PRIVATE_PATTERNS.iter().any(|p| stderr.contains(p)) {
        return ExtractError::PrivateContent;
    }
    if UNAVAILABLE_PATTERNS.iter().any(|p| stderr.contains(p)) {
        return ExtractError::Unavailable;
    }
    if UNSUPPORTED_PATTERNS.iter().any(|p| stderr.contains(p)) {
        return ExtractError::Unsupported;
    }
    ExtractError::Other(last_diagnostic_line(stderr))
}

/// Last non-empty stderr line, the most specific diagnostic yt-dlp prints.
fn last_diagnostic_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("yt-dlp failed without diagnostics")
        .to_string()
}
