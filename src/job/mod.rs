use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Suffix of the temporary cover image written for each work item
const COVER_SUFFIX: &str = ".cover.jpg";

/// Bytes of the stem kept in a cover file name
const COVER_STEM_MAX: usize = 64;

/// One discovered video file, relative to the input root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    relative_path: PathBuf,
}

impl WorkItem {
    pub fn new(relative_path: PathBuf) -> Self {
        Self { relative_path }
    }

    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// Absolute (or root-joined) path of the source video
    pub fn source_path(&self, input_root: &Path) -> PathBuf {
        input_root.join(&self.relative_path)
    }

    /// Directory the MP3 lands in, mirroring the item's relative directory
    pub fn output_dir(&self, output_root: &Path) -> PathBuf {
        match self.relative_path.parent() {
            Some(parent) => output_root.join(parent),
            None => output_root.to_path_buf(),
        }
    }

    /// Final MP3 path: `<output>/<relative dir>/<stem>.mp3`
    pub fn output_path(&self, output_root: &Path) -> PathBuf {
        self.output_dir(output_root)
            .join(format!("{}.mp3", self.title()))
    }

    /// File name without its extension; also used as the MP3 title tag
    pub fn title(&self) -> String {
        self.relative_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Scratch file name for this item's cover image.
    ///
    /// The name is a short prefix of the stem plus a UUID v5 of the whole
    /// relative path: same-named files in different subdirectories get
    /// distinct covers, and the length stays bounded however deep the
    /// source sits.
    pub fn cover_file_name(&self) -> String {
        let key = Uuid::new_v5(
            &Uuid::NAMESPACE_URL,
            self.relative_path.as_os_str().as_encoded_bytes(),
        );
        format!(
            "{}-{}{COVER_SUFFIX}",
            truncate_on_char_boundary(&self.title(), COVER_STEM_MAX),
            key.simple()
        )
    }
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a char
fn truncate_on_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
