#![deny(missing_docs)]
//! Clipfetch — a Telegram video-fetch-and-relay bot.
//!
//! Accepts a link from a user, downloads the media through yt-dlp,
//! enforces a file-size ceiling, and sends the video back.

/// Telegram bot wiring and request handling.
pub mod bot;
/// Configuration management.
pub mod config;
/// Media extraction boundary (yt-dlp) and transient storage.
pub mod download;
/// Error taxonomy for the extraction boundary.
pub mod error;
