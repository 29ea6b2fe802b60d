use anyhow::{anyhow, Context, Result};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Width in pixels of the extracted cover; height keeps the aspect ratio
pub const COVER_WIDTH: u32 = 1024;

/// FFmpeg wrapper for the two invocations a conversion needs
#[derive(Debug, Clone)]
pub struct FFmpegEngine {
    program: PathBuf,
}

impl FFmpegEngine {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }

    /// Grab one frame at `at_seconds` as a high-quality JPEG
    pub async fn extract_cover(&self, source: &Path, at_seconds: f64, cover: &Path) -> Result<()> {
        self.execute(cover_args(source, at_seconds, cover))
            .await
            .context("failed to extract cover")
    }

    /// Encode the source's audio as MP3 and embed `cover` as the front cover
    pub async fn mux_mp3(&self, source: &Path, cover: &Path, title: &str, mp3: &Path) -> Result<()> {
        self.execute(mux_args(source, cover, title, mp3))
            .await
            .context("failed to convert to MP3")
    }

    /// Run FFmpeg to completion; only the exit status is interpreted
    async fn execute(&self, args: Vec<OsString>) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!("Executing FFmpeg command: {:?}", cmd);

        let output = cmd
            .output()
            .await
            .with_context(|| format!("could not run {}", self.program.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .unwrap_or("no error output");
            return Err(anyhow!("FFmpeg exited with {}: {reason}", output.status));
        }

        Ok(())
    }
}

fn push_all(args: &mut Vec<OsString>, items: &[&str]) {
    args.extend(items.iter().map(OsString::from));
}

/// Arguments for single-frame cover extraction
pub fn cover_args(source: &Path, at_seconds: f64, cover: &Path) -> Vec<OsString> {
    let mut args = Vec::new();
    push_all(&mut args, &["-ss", &format!("{at_seconds:.6}"), "-i"]);
    args.push(source.as_os_str().to_owned());
    push_all(
        &mut args,
        &[
            "-vframes",
            "1",
            "-vf",
            &format!("scale={COVER_WIDTH}:-1"),
            // Highest JPEG quality (1-31, lower is better)
            "-q:v",
            "1",
            "-qmin",
            "1",
            "-qmax",
            "1",
            "-y",
        ],
    );
    args.push(cover.as_os_str().to_owned());
    args
}

/// Arguments for MP3 encoding with the cover as an attached picture
pub fn mux_args(source: &Path, cover: &Path, title: &str, mp3: &Path) -> Vec<OsString> {
    let mut args = vec![OsString::from("-i"), source.as_os_str().to_owned()];
    args.push(OsString::from("-i"));
    args.push(cover.as_os_str().to_owned());
    push_all(
        &mut args,
        &[
            "-map",
            "0:a",
            "-map",
            "1",
            "-c:a",
            "libmp3lame",
            "-q:a",
            "0",
            "-id3v2_version",
            "3",
            "-metadata:s:v",
            "title=Album cover",
            "-metadata:s:v",
            "comment=Cover (front)",
            "-disposition:v:0",
            "attached_pic",
            "-metadata",
        ],
    );
    let mut title_tag = OsString::from("title=");
    title_tag.push(OsStr::new(title));
    args.push(title_tag);
    args.push(OsString::from("-y"));
    args.push(mp3.as_os_str().to_owned());
    args
}
