use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Video extensions accepted into a batch, compared case-insensitively
pub const SUPPORTED_EXTENSIONS: [&str; 8] = ["mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v"];

pub fn is_supported_video<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Expand files and folders into the ordered list of videos to process.
///
/// Folders are walked recursively in file-name order and unsupported files
/// in them are dropped silently. Explicitly named files that are missing or
/// unsupported are skipped with a warning. The first occurrence of a
/// duplicate wins.
pub fn collect_videos<P: AsRef<Path>>(paths: &[P]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut videos = Vec::new();

    let mut accept = |path: PathBuf, videos: &mut Vec<PathBuf>| {
        if seen.insert(path.clone()) {
            videos.push(path);
        }
    };

    for path in paths {
        let path = path.as_ref();

        if path.is_dir() {
            debug!("Scanning folder: {}", path.display());
            for entry in WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if entry.file_type().is_file() && is_supported_video(entry.path()) {
                    accept(entry.into_path(), &mut videos);
                }
            }
        } else if path.is_file() {
            if is_supported_video(path) {
                accept(path.to_path_buf(), &mut videos);
            } else {
                warn!("Skipping unsupported file: {}", path.display());
            }
        } else {
            warn!("Skipping missing path: {}", path.display());
        }
    }

    videos
}
