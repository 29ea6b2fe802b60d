//! Progress tracking for a conversion run.
//!
//! Workers never touch the counter directly. Each finished item is sent as a
//! [`ProgressEvent`] to a single aggregator task that owns the
//! [`ProgressTracker`], so increments are applied one at a time and the
//! rendered line always matches a real completion count.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

/// Result of attempting one work item
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Converted,
    Failed(String),
}

/// Sent by a worker once per attempted item
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub item: PathBuf,
    pub outcome: ItemOutcome,
}

pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;

/// Where the progress line is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressOutput {
    /// Overwritten line on stdout
    Terminal,
    /// No bar; failures are logged as warnings instead
    Hidden,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FailedConversion {
    pub path: PathBuf,
    pub error: String,
}

/// Final tally of a run
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ConversionSummary {
    pub total: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: Vec<FailedConversion>,
}

/// Render `[=====>    ] 12.5% (1/8)`.
///
/// A zero total draws an empty bar at 0.0% without dividing.
pub fn render_progress_line(completed: usize, total: usize, width: usize) -> String {
    let (percentage, filled) = if total == 0 {
        (0.0, 0)
    } else {
        (
            completed as f64 * 100.0 / total as f64,
            width * completed / total,
        )
    };

    let mut line = String::with_capacity(width + 32);
    line.push('[');
    for i in 0..width {
        line.push(match i.cmp(&filled) {
            std::cmp::Ordering::Less => '=',
            std::cmp::Ordering::Equal => '>',
            std::cmp::Ordering::Greater => ' ',
        });
    }
    line.push_str(&format!("] {percentage:.1}% ({completed}/{total})"));
    line
}

/// Operator-facing line for one failed item
pub fn failure_message(item: &Path, error: &str) -> String {
    format!("Conversion failed for {}: {}", item.display(), error)
}

/// Completion counter plus its textual rendering
pub struct ProgressTracker {
    total: usize,
    completed: usize,
    width: usize,
    bar: Option<ProgressBar>,
    summary: ConversionSummary,
}

impl ProgressTracker {
    pub fn new(total: usize, width: usize, output: ProgressOutput) -> Result<Self> {
        let bar = match output {
            ProgressOutput::Terminal => {
                let bar =
                    ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stdout());
                bar.set_style(ProgressStyle::with_template("{msg}")?);
                Some(bar)
            }
            ProgressOutput::Hidden => None,
        };

        let tracker = Self {
            total,
            completed: 0,
            width,
            bar,
            summary: ConversionSummary::default(),
        };
        tracker.draw();
        Ok(tracker)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn line(&self) -> String {
        render_progress_line(self.completed, self.total, self.width)
    }

    /// Count one attempted item, successful or not, and redraw
    pub fn record_completion(&mut self, event: ProgressEvent) {
        self.completed += 1;
        if self.completed > self.total {
            // More files appeared after the counting pass
            self.total = self.completed;
        }

        match event.outcome {
            ItemOutcome::Converted => self.summary.succeeded += 1,
            ItemOutcome::Failed(error) => {
                self.report(&failure_message(&event.item, &error));
                self.summary.failed.push(FailedConversion {
                    path: event.item,
                    error,
                });
            }
        }

        self.draw();
    }

    /// Leave the final line on screen and return the tally
    pub fn finish(mut self) -> ConversionSummary {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
            println!("{}", self.line());
        }
        self.summary.total = self.total;
        self.summary.attempted = self.completed;
        self.summary
    }

    fn draw(&self) {
        if let Some(bar) = &self.bar {
            bar.set_length(self.total as u64);
            bar.set_position(self.completed as u64);
            bar.set_message(self.line());
        }
    }

    fn report(&self, message: &str) {
        match &self.bar {
            Some(bar) if !bar.is_hidden() => bar.println(message),
            Some(_) => println!("{message}"),
            None => warn!("{}", message),
        }
    }
}

/// Start the task that owns `tracker` and applies events until every sender is gone
pub fn spawn_aggregator(
    mut tracker: ProgressTracker,
    mut events: mpsc::UnboundedReceiver<ProgressEvent>,
) -> JoinHandle<ConversionSummary> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            tracker.record_completion(event);
        }
        tracker.finish()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converted(name: &str) -> ProgressEvent {
        ProgressEvent {
            item: PathBuf::from(name),
            outcome: ItemOutcome::Converted,
        }
    }

    #[test]
    fn test_render_empty_and_full() {
        assert_eq!(
            render_progress_line(0, 4, 8),
            "[>       ] 0.0% (0/4)"
        );
        assert_eq!(
            render_progress_line(4, 4, 8),
            "[========] 100.0% (4/4)"
        );
    }

    #[test]
    fn test_render_partial() {
        assert_eq!(
            render_progress_line(1, 3, 40),
            format!("[{}>{}] 33.3% (1/3)", "=".repeat(13), " ".repeat(26))
        );
    }

    #[test]
    fn test_render_zero_total() {
        assert_eq!(
            render_progress_line(0, 0, 4),
            "[>   ] 0.0% (0/0)"
        );
    }

    #[test]
    fn test_default_width_line_is_fixed_length() {
        for completed in 0..=7 {
            let line = render_progress_line(completed, 7, 40);
            let bar_end = line.find(']').unwrap();
            assert_eq!(bar_end, 41);
        }
    }

    #[test]
    fn test_failure_message_shows_plain_path() {
        assert_eq!(
            failure_message(Path::new("sub/a clip.mp4"), "failed to extract cover"),
            "Conversion failed for sub/a clip.mp4: failed to extract cover"
        );
    }

    #[test]
    fn test_tracker_counts_successes_and_failures() {
        let mut tracker = ProgressTracker::new(3, 40, ProgressOutput::Hidden).unwrap();
        tracker.record_completion(converted("a.mp4"));
        tracker.record_completion(ProgressEvent {
            item: PathBuf::from("b.mp4"),
            outcome: ItemOutcome::Failed("failed to extract cover".to_string()),
        });
        tracker.record_completion(converted("c.mp4"));

        assert_eq!(tracker.completed(), 3);
        assert!(tracker.line().ends_with("100.0% (3/3)"));

        let summary = tracker.finish();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(
            summary.failed,
            vec![FailedConversion {
                path: PathBuf::from("b.mp4"),
                error: "failed to extract cover".to_string(),
            }]
        );
    }

    #[test]
    fn test_completed_never_exceeds_total() {
        let mut tracker = ProgressTracker::new(1, 10, ProgressOutput::Hidden).unwrap();
        tracker.record_completion(converted("a.mp4"));
        tracker.record_completion(converted("late.mp4"));
        assert_eq!(tracker.completed(), 2);
        assert_eq!(tracker.total(), 2);
        assert!(tracker.line().ends_with("100.0% (2/2)"));
    }

    #[tokio::test]
    async fn test_aggregator_applies_events_from_many_senders() {
        let tracker = ProgressTracker::new(20, 40, ProgressOutput::Hidden).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let aggregator = spawn_aggregator(tracker, rx);

        let mut handles = Vec::new();
        for worker in 0..4 {
            let tx = tx.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..5 {
                    tx.send(converted(&format!("{worker}-{i}.mp4"))).unwrap();
                    tokio::task::yield_now().await;
                }
            }));
        }
        drop(tx);
        for handle in handles {
            handle.await.unwrap();
        }

        let summary = aggregator.await.unwrap();
        assert_eq!(summary.attempted, 20);
        assert_eq!(summary.succeeded, 20);
        assert_eq!(summary.total, 20);
    }

    #[test]
    fn test_summary_serializes() {
        let summary = ConversionSummary {
            total: 1,
            attempted: 1,
            succeeded: 0,
            failed: vec![FailedConversion {
                path: PathBuf::from("a.mp4"),
                error: "boom".to_string(),
            }],
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["failed"][0]["path"], "a.mp4");
        assert_eq!(json["attempted"], 1);
    }
}
