//! Dataset traversal
//!
//! A dataset root holds one directory per category and the videos of each
//! category directly inside it. Hidden entries are skipped at both levels.

use signaug_core::{AugmentConfig, CategoryTree, Error, Result, VideoAsset};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Builds the category tree for `config.input_root`.
///
/// A missing or non-directory root is an error. Unreadable categories and
/// files outside any category are logged and skipped.
pub fn discover(config: &AugmentConfig) -> Result<CategoryTree> {
    let root = config.input_root.as_path();
    if !root.is_dir() {
        return Err(Error::SourceNotFound(root.to_path_buf()));
    }

    let mut tree = CategoryTree::new();

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if is_hidden(&path) {
            continue;
        }
        if !path.is_dir() {
            tracing::warn!(path = %path.display(), "ignoring file outside of a category");
            continue;
        }

        let category = entry.file_name().to_string_lossy().into_owned();
        tree.add_category(category.clone());

        for video in WalkDir::new(&path).min_depth(1).max_depth(1) {
            let video = match video {
                Ok(video) => video,
                Err(e) => {
                    tracing::warn!(category = %category, "skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let video_path = video.path();
            if is_hidden(video_path) || !video_path.is_file() {
                continue;
            }
            let extension = video_path.extension().and_then(|ext| ext.to_str());
            if !config.accepts_extension(extension) {
                tracing::debug!(path = %video_path.display(), "extension not accepted");
                continue;
            }
            tree.insert(VideoAsset::with_category(video_path, category.clone()));
        }
    }

    Ok(tree)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}
