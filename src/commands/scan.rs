use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::media::is_media_file;

/// Collect the media files to process.
///
/// A file path is returned as is. A directory is scanned for files with a
/// known media extension, descending into sub-directories only when
/// `recursive` is set. The result is sorted by path.
pub fn collect_media_files(root: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(anyhow!("Path does not exist: {:?}", root));
    }

    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    info!("🔎 Scanning directory: {:?}", root);

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut media_files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            let keep = is_media_file(path);
            if !keep {
                debug!("Skipping non-media file: {:?}", path);
            }
            keep
        })
        .collect();

    media_files.sort();

    info!("Found {} media file(s)", media_files.len());
    Ok(media_files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_scan_top_level_only() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("b.mkv"));
        touch(&root.join("a.MP4"));
        touch(&root.join("notes.txt"));
        touch(&root.join("Season 01/Show.S01E01.mkv"));

        let files = collect_media_files(root, false).unwrap();
        assert_eq!(files, vec![root.join("a.MP4"), root.join("b.mkv")]);
    }

    #[test]
    fn test_scan_recursive() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("movie.avi"));
        touch(&root.join("Season 01/Show.S01E01.mkv"));
        touch(&root.join("Season 01/Show.S01E01.srt"));

        let files = collect_media_files(root, true).unwrap();
        assert_eq!(
            files,
            vec![root.join("Season 01/Show.S01E01.mkv"), root.join("movie.avi")]
        );
    }

    #[test]
    fn test_single_file_is_returned_as_is() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("clip.txt");
        touch(&file);

        assert_eq!(collect_media_files(&file, false).unwrap(), vec![file]);
    }

    #[test]
    fn test_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        assert!(collect_media_files(temp_dir.path(), true).unwrap().is_empty());
    }

    #[test]
    fn test_nonexistent_path() {
        assert!(collect_media_files(Path::new("/nonexistent/path"), false).is_err());
    }
}
