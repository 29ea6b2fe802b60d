use anyhow::{Context, Result};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::ffmpeg::FFmpegEngine;
use crate::job::WorkItem;
use crate::progress::{ItemOutcome, ProgressEvent, ProgressSender};
use crate::queue::WorkQueue;

/// Everything a worker needs to turn a work item into an MP3
#[derive(Debug, Clone)]
pub struct ConversionContext {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub scratch_dir: PathBuf,
    pub screenshot_time: f64,
    pub engine: FFmpegEngine,
}

/// Temporary cover image, removed when dropped
struct CoverArtifact {
    path: PathBuf,
}

impl CoverArtifact {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CoverArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove cover image {:?}: {}", self.path, e),
        }
    }
}

/// One member of the conversion pool
pub struct Worker {
    id: usize,
    context: Arc<ConversionContext>,
    progress: ProgressSender,
}

impl Worker {
    pub fn new(id: usize, context: Arc<ConversionContext>, progress: ProgressSender) -> Self {
        Self {
            id,
            context,
            progress,
        }
    }

    /// Drain the queue until it is closed and empty; returns the number of items handled
    pub async fn run(self, queue: WorkQueue) -> usize {
        let mut handled = 0;
        while let Some(item) = queue.next().await {
            let outcome = match self.convert(&item).await {
                Ok(mp3) => {
                    debug!("Worker {} converted {:?} -> {:?}", self.id, item.relative_path(), mp3);
                    ItemOutcome::Converted
                }
                Err(e) => ItemOutcome::Failed(format!("{e:#}")),
            };

            let event = ProgressEvent {
                item: item.relative_path().to_path_buf(),
                outcome,
            };
            if self.progress.send(event).is_err() {
                warn!("Progress display is gone; worker {} keeps converting", self.id);
            }
            handled += 1;
        }
        debug!("Worker {} finished after {} items", self.id, handled);
        handled
    }

    /// Extract the cover, then encode the MP3 with it embedded.
    /// The cover image is removed on every path out of this function.
    pub async fn convert(&self, item: &WorkItem) -> Result<PathBuf> {
        let ctx = &self.context;
        let source = item.source_path(&ctx.input_root);
        let output_dir = item.output_dir(&ctx.output_root);
        tokio::fs::create_dir_all(&output_dir)
            .await
            .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;

        let mp3 = item.output_path(&ctx.output_root);
        let cover = CoverArtifact::new(ctx.scratch_dir.join(item.cover_file_name()));

        ctx.engine
            .extract_cover(&source, ctx.screenshot_time, cover.path())
            .await?;
        ctx.engine
            .mux_mp3(&source, cover.path(), &item.title(), &mp3)
            .await?;

        Ok(mp3)
    }
}
