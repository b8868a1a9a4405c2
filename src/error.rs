//! Error taxonomy for the extraction boundary.
//!
//! Failures raised by the external extractor are classified exactly once,
//! at the adapter that observes its diagnostics; the rest of the code
//! matches on the variants and never re-parses free text.

use thiserror::Error;

/// Errors produced while resolving a link to a local media file.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The source video is private and cannot be fetched.
    #[error("the source video is private")]
    PrivateContent,
    /// The source video is unavailable or has been removed.
    #[error("the source video is unavailable or removed")]
    Unavailable,
    /// The source platform is not supported by the extractor.
    #[error("the source platform is not supported")]
    Unsupported,
    /// The extraction did not finish within its wall-clock budget.
    #[error("extraction timed out after {secs}s")]
    Timeout {
        /// Budget that was exceeded, in seconds.
        secs: u64,
    },
    /// The extractor reported success but no file was produced.
    #[error("extraction produced no file")]
    ArtifactMissing,
    /// Any other extractor failure, with its raw diagnostic text.
    #[error("{0}")]
    Other(String),
}
