//! Locally materialized audio artifacts.
//!
//! An [`Artifact`] is the handle for one resolved track: the audio file on
//! disk plus a display name. Exactly one component owns it at any time (the
//! group queue while pending, the call session while streaming) and the
//! underlying file is deleted exactly once through [`Artifact::release`].
//! Artifacts created with [`Artifact::in_scratch_dir`] also remove their
//! private download directory on release.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use uuid::Uuid;

use crate::utils::display_name_for_path;

/// A locally materialized, playable audio file derived from a user request.
///
/// Not `Clone`: ownership moves between the queue and the call session, and
/// the file is reclaimed when the owner releases it. Dropping an unreleased
/// artifact releases it.
#[derive(Debug)]
pub struct Artifact {
    id: Uuid,
    path: PathBuf,
    display_name: String,
    scratch_dir: Option<PathBuf>,
    released: AtomicBool,
}

impl Artifact {
    /// Wraps a resolved file, deriving the display name from its file name.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display_name = display_name_for_path(&path);
        Self::with_display_name(path, display_name)
    }

    /// Wraps a resolved file with an explicit display name.
    pub fn with_display_name(path: impl Into<PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            display_name: display_name.into(),
            scratch_dir: None,
            released: AtomicBool::new(false),
        }
    }

    /// Wraps a file that lives in a directory owned by this artifact alone.
    ///
    /// Release removes the whole directory along with the file.
    pub fn in_scratch_dir(path: impl Into<PathBuf>, scratch_dir: impl Into<PathBuf>) -> Self {
        let mut artifact = Self::new(path);
        artifact.scratch_dir = Some(scratch_dir.into());
        artifact
    }

    /// Unique identity of this artifact.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Local file path of the audio source.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Human-facing name (sanitized file name).
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Whether the underlying file has already been reclaimed.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Reclaims the underlying file.
    ///
    /// Idempotent: only the first call touches the filesystem. Deletion is
    /// best-effort; failures are logged and never propagated.
    ///
    /// Returns `true` if this call performed the release.
    pub fn release(&self) -> bool {
        if self
            .released
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                log::debug!("[Artifact] Released {}", self.path.display());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("[Artifact] {} already gone", self.path.display());
            }
            Err(e) => {
                log::warn!(
                    "[Artifact] Failed to delete {}: {}",
                    self.path.display(),
                    e
                );
            }
        }

        if let Some(dir) = &self.scratch_dir {
            match std::fs::remove_dir_all(dir) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    log::warn!("[Artifact] Failed to remove {}: {}", dir.display(), e);
                }
            }
        }
        true
    }

    /// Serializable summary for status and event payloads.
    #[must_use]
    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            id: self.id.to_string(),
            display_name: self.display_name.clone(),
        }
    }
}

impl Drop for Artifact {
    fn drop(&mut self) {
        self.release();
    }
}

/// Read-only view of an artifact for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSummary {
    pub id: String,
    pub display_name: String,
}
