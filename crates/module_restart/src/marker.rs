//! Restart marker file housekeeping.
//!
//! Right before a hard restart the scheduler writes `<MarkerPath>/<RegionID>`
//! containing the process id. An external supervisor that finds the file
//! after the process exits knows the exit was a requested restart rather than
//! a crash. The file is removed again on normal region startup and when a
//! countdown is aborted.
//!
//! Every operation is best-effort: I/O failures are logged and swallowed.

use region_event_system::RegionId;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerFile {
    path: PathBuf,
}

impl MarkerFile {
    pub fn new(directory: &Path, region_id: RegionId) -> Self {
        Self {
            path: directory.join(region_id.to_string()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the current process id. Returns whether the write succeeded.
    pub async fn create(&self) -> bool {
        let pid = std::process::id().to_string();
        match tokio::fs::write(&self.path, pid.as_bytes()).await {
            Ok(()) => {
                debug!("📌 Restart marker written: {}", self.path.display());
                true
            }
            Err(e) => {
                warn!("⚠️ Could not write restart marker {}: {}", self.path.display(), e);
                false
            }
        }
    }

    /// Removes the marker. Returns whether a file was removed.
    pub async fn delete(&self) -> bool {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!("🧹 Restart marker removed: {}", self.path.display());
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!("⚠️ Could not remove restart marker {}: {}", self.path.display(), e);
                false
            }
        }
    }

    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Reads the pid recorded in the marker, if any.
    pub async fn read_pid(&self) -> Option<u32> {
        let content = tokio::fs::read_to_string(&self.path).await.ok()?;
        content.trim().parse().ok()
    }
}
