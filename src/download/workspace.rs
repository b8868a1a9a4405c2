//! Per-request scoped download directories.
//!
//! Every in-flight request gets its own UUID-named subdirectory under the
//! download root, so concurrent requests for same-titled videos can never
//! collide on a path. The directory is removed when the workspace is
//! dropped, on every exit path of the request.

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// A uniquely named directory holding one request's transient artifacts.
///
/// Removal is tied to `Drop`, which makes release follow the request
/// scope regardless of how the request ends.
#[derive(Debug)]
pub struct RequestWorkspace {
    path: PathBuf,
}

impl RequestWorkspace {
    /// Create a fresh workspace directory under `root`.
    ///
    /// The root itself is created first when absent.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub fn create(root: &Path) -> io::Result<Self> {
        let path = root.join(Uuid::new_v4().simple().to_string());
        std::fs::create_dir_all(&path)?;
        debug!(path = %path.display(), "created request workspace");
        Ok(Self { path })
    }

    /// Directory that downloads for this request should land in.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RequestWorkspace {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed request workspace"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove request workspace"
            ),
        }
    }
}

/// Remove leftover request directories from previous runs.
///
/// Crashes can strand partial downloads; this runs once at startup and
/// clears every subdirectory of `root` while leaving the root itself and
/// any foreign files in place. Returns the number of directories removed.
///
/// # Errors
///
/// Returns an I/O error if `root` cannot be read.
pub fn sweep_stale(root: &Path) -> io::Result<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            match std::fs::remove_dir_all(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => warn!(
                    path = %entry.path().display(),
                    error = %e,
                    "failed to remove stale workspace"
                ),
            }
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_removed_on_drop() {
        let root = tempfile::tempdir().expect("tempdir");
        let kept_path;
        {
            let workspace = RequestWorkspace::create(root.path()).expect("create workspace");
            kept_path = workspace.path().to_path_buf();
            assert!(kept_path.is_dir());
            std::fs::write(kept_path.join("video.mp4"), b"data").expect("write artifact");
        }
        assert!(!kept_path.exists());
        assert!(root.path().is_dir());
    }

    #[test]
    fn test_workspaces_are_unique() {
        let root = tempfile::tempdir().expect("tempdir");
        let a = RequestWorkspace::create(root.path()).expect("workspace a");
        let b = RequestWorkspace::create(root.path()).expect("workspace b");
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_sweep_removes_directories_keeps_files() {
        let root = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(root.path().join("stale-1")).expect("mkdir");
        std::fs::create_dir(root.path().join("stale-2")).expect("mkdir");
        std::fs::write(root.path().join("stale-1").join("part.mp4"), b"x").expect("write");
        std::fs::write(root.path().join("notes.txt"), b"keep me").expect("write");

        let removed = sweep_stale(root.path()).expect("sweep");

        assert_eq!(removed, 2);
        assert!(!root.path().join("stale-1").exists());
        assert!(!root.path().join("stale-2").exists());
        assert!(root.path().join("notes.txt").exists());
    }
}
