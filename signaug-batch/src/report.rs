//! Run summaries

use signaug_core::{AugmentedAsset, Error, ErrorKind};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A unit (or original copy) that did not produce an output
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitFailure {
    pub source: PathBuf,
    /// Transform label, or `original` for a failed copy
    pub transform: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl UnitFailure {
    pub fn new(source: impl Into<PathBuf>, transform: impl Into<String>, error: &Error) -> Self {
        Self {
            source: source.into(),
            transform: transform.into(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Outcome of one batch run
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunSummary {
    pub run_id: String,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outputs: Vec<AugmentedAsset>,
    pub failures: Vec<UnitFailure>,
    pub originals_copied: usize,
    pub copy_failures: Vec<UnitFailure>,
    pub elapsed_secs: f64,
}

impl RunSummary {
    pub(crate) fn record_success(&mut self, asset: AugmentedAsset) {
        self.attempted += 1;
        self.succeeded += 1;
        self.outputs.push(asset);
    }

    pub(crate) fn record_failure(&mut self, failure: UnitFailure) {
        self.attempted += 1;
        self.failed += 1;
        self.failures.push(failure);
    }

    /// Number of failed units per error kind
    pub fn failures_by_kind(&self) -> BTreeMap<ErrorKind, usize> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry(failure.kind).or_insert(0) += 1;
        }
        counts
    }

    /// True when every unit and every requested copy succeeded
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.copy_failures.is_empty()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run {}", self.run_id)?;
        writeln!(
            f,
            "  Units: {} attempted, {} succeeded, {} failed",
            self.attempted, self.succeeded, self.failed
        )?;
        if self.originals_copied > 0 || !self.copy_failures.is_empty() {
            writeln!(
                f,
                "  Originals: {} copied, {} failed",
                self.originals_copied,
                self.copy_failures.len()
            )?;
        }
        for (kind, count) in self.failures_by_kind() {
            writeln!(f, "  {kind}: {count}")?;
        }
        for failure in self.failures.iter().chain(&self.copy_failures) {
            writeln!(
                f,
                "  FAILED {} [{}] {}: {}",
                failure.source.display(),
                failure.transform,
                failure.kind,
                failure.message
            )?;
        }
        write!(f, "  Elapsed: {:.1}s", self.elapsed_secs)
    }
}
