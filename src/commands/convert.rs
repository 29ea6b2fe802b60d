use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::config::{Config, ConvertOptions};
use crate::discovery::Discoverer;
use crate::ffmpeg::FFmpegEngine;
use crate::progress::{spawn_aggregator, ConversionSummary, ProgressOutput, ProgressTracker};
use crate::queue::{QueueSender, WorkQueue};
use crate::scratch::ScratchDir;
use crate::worker::{ConversionContext, Worker};

/// Command to convert every video below the input directory to MP3
pub struct ConvertCommand {
    options: ConvertOptions,
    config: Config,
}

impl ConvertCommand {
    pub fn new(options: ConvertOptions, config: Config) -> Self {
        Self { options, config }
    }

    pub async fn execute(&self) -> Result<ConversionSummary> {
        self.options.validate()?;

        let input_root = &self.options.input_dir;
        if !input_root.exists() {
            return Err(anyhow!("Input directory does not exist: {}", input_root.display()));
        }
        if !input_root.is_dir() {
            return Err(anyhow!("Path is not a directory: {}", input_root.display()));
        }

        let output_root = &self.options.output_dir;
        tokio::fs::create_dir_all(output_root)
            .await
            .with_context(|| format!("failed to create output directory {output_root:?}"))?;

        let scratch = ScratchDir::create_in(&self.config.scratch_root)?;
        let discoverer = Discoverer::new(input_root.clone(), &self.options.excludes)?;

        let total = discoverer.count()?;
        info!("🔎 Found {} video files in {:?}", total, input_root);

        let output = if self.options.quiet {
            ProgressOutput::Hidden
        } else {
            ProgressOutput::Terminal
        };
        let tracker = ProgressTracker::new(total, self.config.progress_width, output)?;
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let aggregator = spawn_aggregator(tracker, progress_rx);

        let context = Arc::new(ConversionContext {
            input_root: input_root.clone(),
            output_root: output_root.clone(),
            scratch_dir: scratch.path().to_path_buf(),
            screenshot_time: self.options.screenshot_time,
            engine: FFmpegEngine::new(self.config.ffmpeg_bin.clone()),
        });

        let (sender, queue) = WorkQueue::new();
        let workers: Vec<_> = (0..self.config.workers.max(1))
            .map(|id| {
                let worker = Worker::new(id, context.clone(), progress_tx.clone());
                tokio::spawn(worker.run(queue.clone()))
            })
            .collect();
        // Only the workers hold progress senders now
        drop(progress_tx);
        drop(queue);

        let producer = tokio::task::spawn_blocking(move || feed_queue(&discoverer, &sender));

        // Join everything before acting on a panic so nothing outlives the scratch dir
        let (handled, worker_panic) = join_workers(workers).await;
        let traversal = producer.await;
        let summary = aggregator.await;
        debug!("Workers handled {} items", handled);

        if let Some(e) = worker_panic {
            return Err(anyhow::Error::new(e).context("conversion worker panicked"));
        }
        let traversal = traversal.context("directory walker panicked")?;
        let summary = summary.context("progress display panicked")?;

        if let Some(path) = &self.options.summary_json {
            if let Err(e) = write_summary(path, &summary).await {
                warn!("{:#}", e);
            }
        }

        drop(scratch);

        match traversal {
            Ok(fed) => {
                info!(
                    "✅ Done. {} of {} files converted, {} failed.",
                    summary.succeeded,
                    fed,
                    summary.failed.len()
                );
                Ok(summary)
            }
            Err(e) => {
                warn!("Directory walk stopped early after queueing {} files", summary.attempted);
                Err(e)
            }
        }
    }
}

/// Push every discovered item onto the queue; stops at the first traversal error.
/// The queue closes when `sender` is dropped by the caller.
pub fn feed_queue(discoverer: &Discoverer, sender: &QueueSender) -> Result<usize> {
    let mut fed = 0;
    for item in discoverer.iter() {
        let item = item.context("failed to traverse directory")?;
        if sender.send(item).is_err() {
            break;
        }
        fed += 1;
    }
    Ok(fed)
}

/// Await every worker, even after one has panicked; returns the items handled
/// and the first panic seen
async fn join_workers(workers: Vec<JoinHandle<usize>>) -> (usize, Option<JoinError>) {
    let mut handled = 0;
    let mut first_panic = None;
    for worker in workers {
        match worker.await {
            Ok(count) => handled += count,
            Err(e) => {
                first_panic.get_or_insert(e);
            }
        }
    }
    (handled, first_panic)
}

async fn write_summary(path: &Path, summary: &ConversionSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("failed to write summary to {path:?}"))
}
