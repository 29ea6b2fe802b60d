use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Per-run scratch directory for cover images.
///
/// The directory and everything left in it are removed when the value is
/// dropped, including on early returns.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Create a fresh `video2mp3-<uuid>` directory under `root`
    pub fn create_in(root: &Path) -> Result<Self> {
        let path = root.join(format!("video2mp3-{}", Uuid::new_v4()));
        fs::create_dir_all(&path)
            .with_context(|| format!("failed to create temp directory {path:?}"))?;
        debug!("Created scratch directory: {:?}", path);
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            warn!("Failed to remove scratch directory {:?}: {}", self.path, e);
        }
    }
}
