use anyhow::{anyhow, Result};
use std::env;
use std::path::PathBuf;

/// Number of concurrent conversion workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Width of the progress bar in characters.
pub const DEFAULT_PROGRESS_WIDTH: usize = 40;

/// Output directory used when none is given on the command line.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Cover screenshot position in seconds.
pub const DEFAULT_SCREENSHOT_TIME: f64 = 1.0;

/// Configuration for FFmpeg and application behavior
#[derive(Debug, Clone)]
pub struct Config {
    pub ffmpeg_bin: PathBuf,
    pub workers: usize,
    pub progress_width: usize,
    pub scratch_root: PathBuf,
}

impl Config {
    /// Load configuration from environment variables with defaults.
    /// The FFmpeg binary comes from the command line (`--ffmpeg` / `FFMPEG_BIN`).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ffmpeg_bin: defaults.ffmpeg_bin,
            workers: env::var("WORKERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.workers),
            progress_width: env::var("PROGRESS_WIDTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.progress_width),
            scratch_root: env::var_os("VIDEO2MP3_TMPDIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_root),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            workers: DEFAULT_WORKERS,
            progress_width: DEFAULT_PROGRESS_WIDTH,
            scratch_root: env::temp_dir(),
        }
    }
}

/// Options for one conversion run, taken from the command line.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub screenshot_time: f64,
    pub excludes: Vec<String>,
    pub quiet: bool,
    pub summary_json: Option<PathBuf>,
}

impl ConvertOptions {
    pub fn new(input_dir: PathBuf, output_dir: Option<PathBuf>, screenshot_time: f64) -> Self {
        Self {
            input_dir,
            output_dir: output_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            screenshot_time,
            excludes: Vec::new(),
            quiet: false,
            summary_json: None,
        }
    }

    /// Reject options that must stop the run before any worker starts.
    pub fn validate(&self) -> Result<()> {
        if !self.screenshot_time.is_finite() || self.screenshot_time < 0.0 {
            return Err(anyhow!(
                "Screenshot time must be a non-negative number of seconds, got {}",
                self.screenshot_time
            ));
        }
        Ok(())
    }
}
