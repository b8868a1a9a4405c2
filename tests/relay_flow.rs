//! End-to-end tests of the request relay with mocked collaborators.
//!
//! No live Telegram connection or network access: the extractor writes
//! real files into the request workspace and the replier records what the
//! user would have received.

use anyhow::Result;
use async_trait::async_trait;
use clipfetch::bot::relay::{
    self, Replier, ARTIFACT_MISSING_TEXT, DOWNLOADING_TEXT, INVALID_LINK_TEXT, PRIVATE_VIDEO_TEXT,
    TIMEOUT_TEXT, UNAVAILABLE_TEXT, UNSUPPORTED_TEXT,
};
use clipfetch::config::Settings;
use clipfetch::download::{DownloadOutcome, Extractor, MediaMetadata};
use clipfetch::error::ExtractError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

const URL: &str = "https://example.com/watch?v=abc";

fn settings_for(root: &Path) -> Settings {
    Settings {
        telegram_token: "dummy".to_string(),
        max_file_size_mb: 50,
        download_dir: root.to_string_lossy().into_owned(),
        ytdlp_bin: "yt-dlp".to_string(),
        format_policy: "best[filesize<50M]/best[ext=mp4]/best".to_string(),
        extraction_timeout_secs: 5,
    }
}

/// What the fake extractor should do when asked to download.
#[derive(Clone, Copy)]
enum ExtractBehavior {
    /// Write a file of the given size into the workspace.
    Produce {
        file_name: &'static str,
        size_bytes: u64,
    },
    /// Fail with a classified error.
    PrivateContent,
    Unavailable,
    Unsupported,
    Timeout,
    /// Fail with an unclassified error carrying raw detail.
    OtherDetail(&'static str),
}

struct FakeExtractor {
    behavior: ExtractBehavior,
    probe_calls: AtomicUsize,
    extract_calls: AtomicUsize,
    produced: Mutex<Vec<PathBuf>>,
}

impl FakeExtractor {
    fn new(behavior: ExtractBehavior) -> Self {
        Self {
            behavior,
            probe_calls: AtomicUsize::new(0),
            extract_calls: AtomicUsize::new(0),
            produced: Mutex::new(Vec::new()),
        }
    }

    fn produced_paths(&self) -> Vec<PathBuf> {
        self.produced.lock().expect("produced lock").clone()
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    async fn probe(&self, _url: &str) -> Result<MediaMetadata, ExtractError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        Ok(MediaMetadata {
            title: Some("Same Title".to_string()),
            ..MediaMetadata::default()
        })
    }

    async fn extract(&self, url: &str, dest: &Path) -> Result<DownloadOutcome, ExtractError> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            ExtractBehavior::Produce {
                file_name,
                size_bytes,
            } => {
                let file_path = dest.join(file_name);
                let file = std::fs::File::create(&file_path)
                    .map_err(|e| ExtractError::Other(e.to_string()))?;
                file.set_len(size_bytes)
                    .map_err(|e| ExtractError::Other(e.to_string()))?;
                self.produced
                    .lock()
                    .expect("produced lock")
                    .push(file_path.clone());
                Ok(DownloadOutcome {
                    file_path,
                    size_bytes,
                    url: url.to_string(),
                })
            }
            ExtractBehavior::PrivateContent => Err(ExtractError::PrivateContent),
            ExtractBehavior::Unavailable => Err(ExtractError::Unavailable),
            ExtractBehavior::Unsupported => Err(ExtractError::Unsupported),
            ExtractBehavior::Timeout => Err(ExtractError::Timeout { secs: 5 }),
            ExtractBehavior::OtherDetail(detail) => {
                Err(ExtractError::Other(detail.to_string()))
            }
        }
    }
}

#[derive(Default)]
struct RecordingReplier {
    texts: Mutex<Vec<String>>,
    /// (path, caption, file existed when the send happened)
    videos: Mutex<Vec<(PathBuf, String, bool)>>,
}

impl RecordingReplier {
    fn texts(&self) -> Vec<String> {
        self.texts.lock().expect("texts lock").clone()
    }

    fn videos(&self) -> Vec<(PathBuf, String, bool)> {
        self.videos.lock().expect("videos lock").clone()
    }
}

#[async_trait]
impl Replier for RecordingReplier {
    async fn send_text(&self, text: &str) -> Result<()> {
        self.texts.lock().expect("texts lock").push(text.to_string());
        Ok(())
    }

    async fn send_video(&self, file: &Path, caption: &str) -> Result<()> {
        self.videos.lock().expect("videos lock").push((
            file.to_path_buf(),
            caption.to_string(),
            file.exists(),
        ));
        Ok(())
    }
}

fn entries_under(root: &Path) -> usize {
    std::fs::read_dir(root).map(Iterator::count).unwrap_or(0)
}

#[tokio::test]
async fn non_link_gets_validation_reply_and_extractor_is_never_invoked() {
    let root = tempfile::tempdir().expect("tempdir");
    let settings = settings_for(root.path());
    let extractor = FakeExtractor::new(ExtractBehavior::Unsupported);
    let replier = RecordingReplier::default();

    relay::handle_request(&settings, &extractor, &replier, "not a link")
        .await
        .expect("handled");

    assert_eq!(replier.texts(), vec![INVALID_LINK_TEXT.to_string()]);
    assert!(replier.videos().is_empty());
    assert_eq!(extractor.probe_calls.load(Ordering::SeqCst), 0);
    assert_eq!(extractor.extract_calls.load(Ordering::SeqCst), 0);
    assert_eq!(entries_under(root.path()), 0);
}

#[tokio::test]
async fn small_artifact_is_relayed_and_cleaned_up() {
    let root = tempfile::tempdir().expect("tempdir");
    let settings = settings_for(root.path());
    let extractor = FakeExtractor::new(ExtractBehavior::Produce {
        file_name: "clip.mp4",
        size_bytes: 10 * 1024 * 1024,
    });
    let replier = RecordingReplier::default();

    relay::handle_request(&settings, &extractor, &replier, URL)
        .await
        .expect("handled");

    // Exactly one acknowledgement, then exactly one attachment.
    assert_eq!(replier.texts(), vec![DOWNLOADING_TEXT.to_string()]);
    let videos = replier.videos();
    assert_eq!(videos.len(), 1);
    let (path, caption, existed_at_send) = &videos[0];
    assert!(caption.contains(URL));
    assert!(existed_at_send);

    // The artifact and its workspace are gone after the request.
    assert!(!path.exists());
    assert_eq!(entries_under(root.path()), 0);
}

#[tokio::test]
async fn oversized_artifact_is_rejected_and_deleted() {
    let root = tempfile::tempdir().expect("tempdir");
    let settings = settings_for(root.path());
    let extractor = FakeExtractor::new(ExtractBehavior::Produce {
        file_name: "big.mp4",
        size_bytes: 60 * 1024 * 1024,
    });
    let replier = RecordingReplier::default();

    relay::handle_request(&settings, &extractor, &replier, URL)
        .await
        .expect("handled");

    assert_eq!(
        replier.texts(),
        vec![DOWNLOADING_TEXT.to_string(), relay::too_large_text(50)]
    );
    assert!(replier.videos().is_empty());

    let produced = extractor.produced_paths();
    assert_eq!(produced.len(), 1);
    assert!(!produced[0].exists());
    assert_eq!(entries_under(root.path()), 0);
}

#[tokio::test]
async fn classified_failures_get_tailored_replies() {
    let cases = [
        (ExtractBehavior::PrivateContent, PRIVATE_VIDEO_TEXT),
        (ExtractBehavior::Unavailable, UNAVAILABLE_TEXT),
        (ExtractBehavior::Unsupported, UNSUPPORTED_TEXT),
        (ExtractBehavior::Timeout, TIMEOUT_TEXT),
    ];

    for (behavior, expected) in cases {
        let root = tempfile::tempdir().expect("tempdir");
        let settings = settings_for(root.path());
        let extractor = FakeExtractor::new(behavior);
        let replier = RecordingReplier::default();

        relay::handle_request(&settings, &extractor, &replier, URL)
            .await
            .expect("handled");

        assert_eq!(
            replier.texts(),
            vec![DOWNLOADING_TEXT.to_string(), expected.to_string()]
        );
        assert!(replier.videos().is_empty());
        assert_eq!(entries_under(root.path()), 0);
    }
}

#[tokio::test]
async fn unclassified_failure_reply_includes_raw_detail() {
    let root = tempfile::tempdir().expect("tempdir");
    let settings = settings_for(root.path());
    let extractor = FakeExtractor::new(ExtractBehavior::OtherDetail("ERROR: HTTP Error 500"));
    let replier = RecordingReplier::default();

    relay::handle_request(&settings, &extractor, &replier, URL)
        .await
        .expect("handled");

    let texts = replier.texts();
    assert_eq!(texts.len(), 2);
    assert!(texts[1].contains("ERROR: HTTP Error 500"));
    assert_eq!(entries_under(root.path()), 0);
}

#[tokio::test]
async fn missing_artifact_gets_generic_failure() {
    struct VanishingExtractor;

    #[async_trait]
    impl Extractor for VanishingExtractor {
        async fn probe(&self, _url: &str) -> Result<MediaMetadata, ExtractError> {
            Ok(MediaMetadata::default())
        }

        async fn extract(
            &self,
            _url: &str,
            _dest: &Path,
        ) -> Result<DownloadOutcome, ExtractError> {
            // Reports success upstream but leaves nothing behind; the
            // adapter surfaces that as a missing artifact.
            Err(ExtractError::ArtifactMissing)
        }
    }

    let root = tempfile::tempdir().expect("tempdir");
    let settings = settings_for(root.path());
    let replier = RecordingReplier::default();

    relay::handle_request(&settings, &VanishingExtractor, &replier, URL)
        .await
        .expect("handled");

    assert_eq!(
        replier.texts(),
        vec![DOWNLOADING_TEXT.to_string(), ARTIFACT_MISSING_TEXT.to_string()]
    );
    assert!(replier.videos().is_empty());
}

#[tokio::test]
async fn concurrent_same_title_requests_do_not_collide() {
    let root = tempfile::tempdir().expect("tempdir");
    let settings = settings_for(root.path());
    let behavior = ExtractBehavior::Produce {
        file_name: "Same Title.mp4",
        size_bytes: 1024,
    };
    let extractor_a = FakeExtractor::new(behavior);
    let extractor_b = FakeExtractor::new(behavior);
    let replier_a = RecordingReplier::default();
    let replier_b = RecordingReplier::default();

    let (res_a, res_b) = tokio::join!(
        relay::handle_request(&settings, &extractor_a, &replier_a, URL),
        relay::handle_request(&settings, &extractor_b, &replier_b, URL),
    );
    res_a.expect("request a handled");
    res_b.expect("request b handled");

    let videos_a = replier_a.videos();
    let videos_b = replier_b.videos();
    assert_eq!(videos_a.len(), 1);
    assert_eq!(videos_b.len(), 1);

    // Same file name, but distinct per-request workspaces.
    assert_ne!(videos_a[0].0, videos_b[0].0);
    assert!(videos_a[0].2, "request a saw its own artifact");
    assert!(videos_b[0].2, "request b saw its own artifact");

    assert!(!videos_a[0].0.exists());
    assert!(!videos_b[0].0.exists());
    assert_eq!(entries_under(root.path()), 0);
}
