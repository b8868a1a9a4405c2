//! Configuration and settings management.
//!
//! Loads settings from environment variables (and an optional `config/default`
//! file) and defines process-wide constants.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Default maximum accepted artifact size, in mebibytes.
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 50;

/// Default root directory for transient downloads.
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

/// Default wall-clock budget for a single extraction, in seconds.
pub const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 600;

/// Maximum retry attempts for Telegram API operations.
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;
/// Initial backoff delay for Telegram API retries, in milliseconds.
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Maximum backoff delay for Telegram API retries, in milliseconds.
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4_000;

/// Application settings loaded once at startup.
///
/// Immutable after construction; handlers receive it behind an `Arc`.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token.
    pub telegram_token: String,

    /// Maximum accepted artifact size, in mebibytes.
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Root directory for per-request download workspaces.
    #[serde(default = "default_download_dir")]
    pub download_dir: String,

    /// Path or name of the yt-dlp binary.
    #[serde(default = "default_ytdlp_bin")]
    pub ytdlp_bin: String,

    /// yt-dlp format selection policy.
    ///
    /// Prefers an output under the size ceiling, then a widely playable
    /// container, then whatever is available.
    #[serde(default = "default_format_policy")]
    pub format_policy: String,

    /// Wall-clock budget for a single extraction, in seconds.
    #[serde(default = "default_extraction_timeout_secs")]
    pub extraction_timeout_secs: u64,
}

const fn default_max_file_size_mb() -> u64 {
    DEFAULT_MAX_FILE_SIZE_MB
}

fn default_download_dir() -> String {
    DEFAULT_DOWNLOAD_DIR.to_string()
}

fn default_ytdlp_bin() -> String {
    "yt-dlp".to_string()
}

fn default_format_policy() -> String {
    "best[filesize<50M]/best[ext=mp4]/best".to_string()
}

const fn default_extraction_timeout_secs() -> u64 {
    DEFAULT_EXTRACTION_TIMEOUT_SECS
}

impl Settings {
    /// Create new settings by loading from environment and files.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or `TELEGRAM_TOKEN` is absent.
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            // Optional defaults file, not checked into git
            .add_source(File::with_name("config/default").required(false))
            // Environment variables win; empty values count as unset
            .add_source(Environment::default().ignore_empty(true).try_parsing(true))
            .build()?;

        s.try_deserialize()
    }

    /// Size ceiling in bytes.
    #[must_use]
    pub const fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Wall-clock budget for a single extraction.
    #[must_use]
    pub const fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_defaults() -> Settings {
        Settings {
            telegram_token: "dummy".to_string(),
            max_file_size_mb: default_max_file_size_mb(),
            download_dir: default_download_dir(),
            ytdlp_bin: default_ytdlp_bin(),
            format_policy: default_format_policy(),
            extraction_timeout_secs: default_extraction_timeout_secs(),
        }
    }

    #[test]
    fn test_size_ceiling_in_bytes() {
        let settings = settings_with_defaults();
        assert_eq!(settings.max_file_size_bytes(), 50 * 1024 * 1024);
    }

    #[test]
    fn test_extraction_timeout() {
        let mut settings = settings_with_defaults();
        settings.extraction_timeout_secs = 30;
        assert_eq!(settings.extraction_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_default_format_policy_prefers_ceiling() {
        let settings = settings_with_defaults();
        assert!(settings.format_policy.starts_with("best[filesize<50M]"));
        assert!(settings.format_policy.contains("best[ext=mp4]"));
    }
}
