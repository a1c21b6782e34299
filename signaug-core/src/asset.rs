//! Asset data structures for signaug datasets

use crate::TransformSpec;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A source video found in a dataset category directory
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VideoAsset {
    /// Location of the video file
    pub path: PathBuf,
    /// Category label, taken from the parent directory name
    pub category: String,
    /// File name without its extension
    pub base_name: String,
    /// Input container extension, if the file has one
    pub extension: Option<String>,
}

impl VideoAsset {
    /// Creates an asset for `path`, labelling it with its parent directory
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let category = path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::with_category(path, category)
    }

    /// Creates an asset with an explicit category label
    pub fn with_category(path: impl Into<PathBuf>, category: impl Into<String>) -> Self {
        let path = path.into();
        let base_name = path
            .file_stem()
            .or_else(|| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned());

        Self {
            path,
            category: category.into(),
            base_name,
            extension,
        }
    }

    /// Returns the file name as shown in logs
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.base_name.clone())
    }
}

/// An output video produced from one source by one transform
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AugmentedAsset {
    /// Where the output was written
    pub path: PathBuf,
    /// The video it was derived from
    pub source: PathBuf,
    /// The transform that was applied
    pub transform: TransformSpec,
    /// Number of frames written
    pub frames: u64,
    /// Output frame width in pixels
    pub width: u32,
    /// Output frame height in pixels
    pub height: u32,
}

/// Videos of a dataset grouped by category label
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    categories: BTreeMap<String, Vec<VideoAsset>>,
}

impl CategoryTree {
    /// Creates an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a category, even if it ends up without videos
    pub fn add_category(&mut self, label: impl Into<String>) {
        self.categories.entry(label.into()).or_default();
    }

    /// Adds a video under its category, keeping each category sorted by path
    pub fn insert(&mut self, asset: VideoAsset) {
        let videos = self.categories.entry(asset.category.clone()).or_default();
        let index = videos.partition_point(|v| v.path < asset.path);
        videos.insert(index, asset);
    }

    /// Category labels in sorted order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Videos of one category
    pub fn videos(&self, category: &str) -> &[VideoAsset] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All videos, category by category
    pub fn iter(&self) -> impl Iterator<Item = &VideoAsset> {
        self.categories.values().flatten()
    }

    /// Number of categories
    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    /// Total number of videos
    pub fn video_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_from_path() {
        let asset = VideoAsset::from_path("dataset/Abajo/word-abajo-001.mp4");
        assert_eq!(asset.category, "Abajo");
        assert_eq!(asset.base_name, "word-abajo-001");
        assert_eq!(asset.extension.as_deref(), Some("mp4"));
        assert_eq!(asset.file_name(), "word-abajo-001.mp4");
    }

    #[test]
    fn test_asset_without_extension() {
        let asset = VideoAsset::from_path("dataset/Arriba/capture");
        assert_eq!(asset.base_name, "capture");
        assert_eq!(asset.extension, None);
    }

    #[test]
    fn test_tree_orders_categories_and_videos() {
        let mut tree = CategoryTree::new();
        tree.insert(VideoAsset::from_path("root/B/v2.mp4"));
        tree.insert(VideoAsset::from_path("root/B/v1.mp4"));
        tree.insert(VideoAsset::from_path("root/A/v9.mp4"));
        tree.add_category("C");

        assert_eq!(tree.categories().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert_eq!(tree.category_count(), 3);
        assert_eq!(tree.video_count(), 3);

        let names: Vec<_> = tree.videos("B").iter().map(|v| v.base_name.as_str()).collect();
        assert_eq!(names, vec!["v1", "v2"]);
        assert!(tree.videos("C").is_empty());
        assert!(tree.videos("missing").is_empty());

        let all: Vec<_> = tree.iter().map(|v| v.file_name()).collect();
        assert_eq!(all, vec!["v9.mp4", "v1.mp4", "v2.mp4"]);
    }
}
