use anyhow::{anyhow, Context, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::trace;
use walkdir::WalkDir;

use crate::job::WorkItem;

/// Video file extensions that are picked up for conversion
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv"];

/// Check whether a path has one of the recognized video extensions (case-insensitive)
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
}

/// Walks an input root and yields the video files below it
#[derive(Debug, Clone)]
pub struct Discoverer {
    root: PathBuf,
    excludes: Vec<Pattern>,
}

impl Discoverer {
    /// Create a discoverer for `root`, skipping relative paths matching any of `excludes`
    pub fn new(root: PathBuf, excludes: &[String]) -> Result<Self> {
        let excludes = excludes
            .iter()
            .map(|p| Pattern::new(p).map_err(|e| anyhow!("Invalid exclude pattern '{p}': {e}")))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { root, excludes })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walk the tree. Entries are visited in file name order, so two
    /// walks over an unchanged tree produce the same sequence.
    pub fn iter(&self) -> impl Iterator<Item = Result<WorkItem>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(Err(anyhow::Error::new(e).context(format!(
                            "Failed to traverse directory {}",
                            self.root.display()
                        ))))
                    }
                };

                if !entry.file_type().is_file() || !is_video_file(entry.path()) {
                    return None;
                }

                let relative = match entry.path().strip_prefix(&self.root) {
                    Ok(relative) => relative.to_path_buf(),
                    Err(_) => {
                        return Some(Err(anyhow!(
                            "Unable to create relative path for: {}",
                            entry.path().display()
                        )))
                    }
                };

                if self.is_excluded(&relative) {
                    trace!("Excluded by pattern: {:?}", relative);
                    return None;
                }

                Some(Ok(WorkItem::new(relative)))
            })
    }

    /// Count the matching files; the first traversal error aborts the count
    pub fn count(&self) -> Result<usize> {
        let mut total = 0;
        for item in self.iter() {
            item.context("Failed to count files")?;
            total += 1;
        }
        Ok(total)
    }

    fn is_excluded(&self, relative: &Path) -> bool {
        self.excludes.iter().any(|p| p.matches_path(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn collect(discoverer: &Discoverer) -> Vec<PathBuf> {
        discoverer
            .iter()
            .map(|item| item.unwrap().relative_path().to_path_buf())
            .collect()
    }

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file(Path::new("a.mp4")));
        assert!(is_video_file(Path::new("a.MOV")));
        assert!(is_video_file(Path::new("dir/a.Mkv")));
        assert!(is_video_file(Path::new("a.avi")));
        assert!(!is_video_file(Path::new("a.webm")));
        assert!(!is_video_file(Path::new("notes.txt")));
        assert!(!is_video_file(Path::new("mp4")));
    }

    #[test]
    fn test_only_recognized_extensions_are_yielded() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("sub/deeper")).unwrap();
        fs::write(root.join("clip1.mp4"), "").unwrap();
        fs::write(root.join("clip2.avi"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();
        fs::write(root.join("sub/a.MOV"), "").unwrap();
        fs::write(root.join("sub/deeper/b.mkv"), "").unwrap();
        fs::write(root.join("sub/deeper/c.srt"), "").unwrap();
        // a directory with a video-like name is not a file
        fs::create_dir_all(root.join("folder.mp4")).unwrap();

        let discoverer = Discoverer::new(root.to_path_buf(), &[]).unwrap();
        let found = collect(&discoverer);

        assert_eq!(
            found,
            vec![
                PathBuf::from("clip1.mp4"),
                PathBuf::from("clip2.avi"),
                PathBuf::from("sub/a.MOV"),
                PathBuf::from("sub/deeper/b.mkv"),
            ]
        );
        assert_eq!(discoverer.count().unwrap(), found.len());
    }

    #[test]
    fn test_two_walks_agree() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["z.mp4", "a.mkv", "m.avi"] {
            fs::write(temp_dir.path().join(name), "").unwrap();
        }

        let discoverer = Discoverer::new(temp_dir.path().to_path_buf(), &[]).unwrap();
        assert_eq!(collect(&discoverer), collect(&discoverer));
    }

    #[test]
    fn test_exclude_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("extras")).unwrap();
        fs::write(root.join("keep.mp4"), "").unwrap();
        fs::write(root.join("extras/trailer.mp4"), "").unwrap();
        fs::write(root.join("sample.mkv"), "").unwrap();

        let discoverer = Discoverer::new(
            root.to_path_buf(),
            &["extras/*".to_string(), "sample.*".to_string()],
        )
        .unwrap();

        assert_eq!(collect(&discoverer), vec![PathBuf::from("keep.mp4")]);
        assert_eq!(discoverer.count().unwrap(), 1);
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let result = Discoverer::new(PathBuf::from("."), &["[".to_string()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let discoverer = Discoverer::new(PathBuf::from("/nonexistent/path"), &[]).unwrap();
        assert!(discoverer.count().is_err());
        assert!(discoverer.iter().next().unwrap().is_err());
    }

    #[test]
    fn test_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let discoverer = Discoverer::new(temp_dir.path().to_path_buf(), &[]).unwrap();
        assert_eq!(discoverer.count().unwrap(), 0);
    }
}
