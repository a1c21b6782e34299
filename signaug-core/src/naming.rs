//! Output file naming
//!
//! Every output name has the form
//! `<category>_<base>_<label>_<run-id>_<seq>.<ext>`, where `run-id` is the UTC
//! start time of the run to the millisecond followed by the process id, and
//! `seq` is a counter shared by every name issued during the run. The counter alone keeps names unique within a run; the run
//! id keeps reruns from reusing names of earlier runs.

use crate::{TransformSpec, VideoAsset};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Container extension of every augmented output
pub const OUTPUT_EXTENSION: &str = "avi";

/// Label used for plain copies of source videos
const ORIGINAL_LABEL: &str = "original";

/// Issues collision-free output names for one run
#[derive(Debug)]
pub struct NamingPolicy {
    run_id: String,
    extension: String,
    counter: AtomicU64,
}

impl NamingPolicy {
    /// Creates a policy whose run id is the current UTC time and process id,
    /// e.g. `20261019T120000123-4242`
    pub fn new() -> Self {
        let run_id = format!(
            "{}-{}",
            chrono::Utc::now().format("%Y%m%dT%H%M%S%3f"),
            std::process::id()
        );
        Self::with_run_id(run_id)
    }

    /// Creates a policy with a fixed run id
    pub fn with_run_id(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            extension: OUTPUT_EXTENSION.to_string(),
            counter: AtomicU64::new(1),
        }
    }

    /// Overrides the output container extension
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Returns a fresh file name for `transform` applied to `asset`
    pub fn name(&self, asset: &VideoAsset, transform: &TransformSpec) -> String {
        self.compose(
            &asset.category,
            &asset.base_name,
            &transform.label(),
            &self.extension,
        )
    }

    /// Returns a fresh file name for a verbatim copy of `asset`.
    ///
    /// The copy keeps the source extension; sources without one get the
    /// output extension.
    pub fn original_name(&self, asset: &VideoAsset) -> String {
        let extension = asset.extension.as_deref().unwrap_or(&self.extension);
        self.compose(&asset.category, &asset.base_name, ORIGINAL_LABEL, extension)
    }

    /// Returns a path in `dir` for `transform` applied to `asset` that does not
    /// exist yet. Existing files are never reused.
    pub fn output_path(&self, dir: &Path, asset: &VideoAsset, transform: &TransformSpec) -> PathBuf {
        loop {
            let candidate = dir.join(self.name(asset, transform));
            if !candidate.exists() {
                return candidate;
            }
        }
    }

    /// Like [`output_path`](Self::output_path), for a verbatim copy
    pub fn original_path(&self, dir: &Path, asset: &VideoAsset) -> PathBuf {
        loop {
            let candidate = dir.join(self.original_name(asset));
            if !candidate.exists() {
                return candidate;
            }
        }
    }

    fn compose(&self, category: &str, base: &str, label: &str, extension: &str) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut name = String::new();
        if !category.is_empty() {
            name.push_str(category);
            name.push('_');
        }
        name.push_str(&format!("{}_{}_{}_{:04}", base, label, self.run_id, seq));
        if !extension.is_empty() {
            name.push('.');
            name.push_str(extension);
        }
        name
    }
}

impl Default for NamingPolicy {
    fn default() -> Self {
        Self::new()
    }
}
