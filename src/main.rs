//! # video2mp3 - Video to MP3 batch converter
//!
//! Walks a directory tree for video files (.mp4, .avi, .mov, .mkv) and uses
//! FFmpeg to turn each one into an MP3 with a still frame embedded as the
//! front cover. The output tree mirrors the input tree.
//!
//! ## Usage
//!
//! ```bash
//! # Convert everything below the current directory into ./output
//! video2mp3
//!
//! # Pick directories and take the cover 3.5 seconds in
//! video2mp3 -d /path/to/videos -o /path/to/mp3 -t 3.5
//! ```
//!
//! FFmpeg is looked up on `PATH` unless `FFMPEG_BIN` points at a binary.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use video2mp3::commands::convert::ConvertCommand;
use video2mp3::config::{Config, ConvertOptions, DEFAULT_SCREENSHOT_TIME};

/// video2mp3 - Convert video to MP3 with cover image
#[derive(Parser)]
#[command(
    name = "video2mp3",
    about = "Convert video to MP3 with cover image",
    long_about = "Extracts the audio of every .mp4, .avi, .mov and .mkv file below the input directory as MP3, with a video frame embedded as the cover.",
    version
)]
struct Cli {
    /// Input directory path
    #[arg(long, short = 'd', default_value = ".")]
    input_dir: PathBuf,
    /// Output directory path (defaults to ./output)
    #[arg(long, short = 'o')]
    output_dir: Option<PathBuf>,
    /// Screenshot time in seconds (e.g., 3.5)
    #[arg(long, short = 't', default_value_t = DEFAULT_SCREENSHOT_TIME, allow_negative_numbers = true)]
    time: f64,
    /// Skip files whose path relative to the input directory matches this glob
    #[arg(long, short = 'e')]
    exclude: Vec<String>,
    /// Do not draw the progress bar
    #[arg(long, short = 'q')]
    quiet: bool,
    /// Write a JSON summary of the run to this file
    #[arg(long)]
    summary_json: Option<PathBuf>,
    /// FFmpeg binary to run
    #[arg(long, env = "FFMPEG_BIN")]
    ffmpeg: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; stderr keeps the progress line on stdout intact
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "video2mp3=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let ffmpeg = cli.ffmpeg;
    let mut options = ConvertOptions::new(cli.input_dir, cli.output_dir, cli.time);
    options.excludes = cli.exclude;
    options.quiet = cli.quiet;
    options.summary_json = cli.summary_json;

    if !options.quiet {
        println!(
            "video2mp3 v{} - Convert video to MP3 with cover image",
            env!("CARGO_PKG_VERSION")
        );
        println!(
            "Input: {}\nOutput: {}\n",
            options.input_dir.display(),
            options.output_dir.display()
        );
    }

    let mut config = Config::from_env();
    if let Some(ffmpeg) = ffmpeg {
        config.ffmpeg_bin = ffmpeg;
    }
    info!(
        "Starting conversion with {} workers using {:?}",
        config.workers, config.ffmpeg_bin
    );

    if let Err(e) = ConvertCommand::new(options, config).execute().await {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
