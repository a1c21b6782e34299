//! Augmentation run configuration

use crate::{Error, Result, TransformSpec};
use std::path::PathBuf;
use std::time::Duration;

/// Frame rate every augmented video is encoded at
pub const DEFAULT_FPS: u32 = 10;

/// Everything a batch run needs, passed explicitly to the driver
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct AugmentConfig {
    /// Dataset root; one subdirectory per category
    pub input_root: PathBuf,
    /// Root of the mirrored output tree
    pub output_root: PathBuf,
    /// Transforms applied to every source video
    pub transforms: Vec<TransformSpec>,
    /// Output frame rate, independent of the source frame rate
    pub fps: u32,
    /// Create every output category directory before processing
    pub mirror: bool,
    /// Also copy each source video into the output tree
    pub copy_originals: bool,
    /// Accepted input extensions (case-insensitive); empty accepts any file
    pub extensions: Vec<String>,
    /// Number of units processed concurrently
    pub workers: usize,
    /// Per-unit wall time limit in seconds
    pub unit_timeout_secs: Option<u64>,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from("dataset"),
            output_root: PathBuf::from("augmented"),
            transforms: TransformSpec::default_set(),
            fps: DEFAULT_FPS,
            mirror: true,
            copy_originals: false,
            extensions: Vec::new(),
            workers: 1,
            unit_timeout_secs: None,
        }
    }
}

impl AugmentConfig {
    /// Creates a configuration with default settings for the given roots
    pub fn new(input_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
            ..Self::default()
        }
    }

    /// Replaces the transform list
    pub fn with_transforms(mut self, transforms: Vec<TransformSpec>) -> Self {
        self.transforms = transforms;
        self
    }

    /// Sets the number of concurrent units
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Per-unit deadline, if any
    pub fn unit_timeout(&self) -> Option<Duration> {
        self.unit_timeout_secs.map(Duration::from_secs)
    }

    /// Returns true if `extension` passes the input filter
    pub fn accepts_extension(&self, extension: Option<&str>) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        match extension {
            Some(ext) => self
                .extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext)),
            None => false,
        }
    }

    /// Checks the configuration before a run
    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(Error::Config("fps must be at least 1".into()));
        }
        if self.workers == 0 {
            return Err(Error::Config("workers must be at least 1".into()));
        }
        if self.transforms.is_empty() {
            return Err(Error::Config("no transforms configured".into()));
        }
        if self.unit_timeout_secs == Some(0) {
            return Err(Error::Config("unit timeout must be at least 1 second".into()));
        }
        if self.input_root == self.output_root {
            return Err(Error::Config(format!(
                "output root must differ from input root ({})",
                self.input_root.display()
            )));
        }
        for spec in &self.transforms {
            spec.validate()?;
        }
        Ok(())
    }

    /// Loads a configuration from a JSON file; missing fields take defaults
    #[cfg(feature = "serde")]
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Parses a configuration from JSON text
    #[cfg(feature = "serde")]
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }
}
