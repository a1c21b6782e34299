//! signaug Core Library
//!
//! This library provides the data model shared by every signaug crate: the
//! video assets found in a dataset tree, the augmentation transforms that can
//! be applied to them, the output naming policy and the run configuration.

pub mod asset;
pub mod config;
pub mod naming;
pub mod transform_spec;

pub use asset::{AugmentedAsset, CategoryTree, VideoAsset};
pub use config::AugmentConfig;
pub use naming::NamingPolicy;
pub use transform_spec::TransformSpec;

use std::fmt;
use std::path::PathBuf;

/// Result type for signaug-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for signaug operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Failed to decode {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("Failed to encode {}: {reason}", .path.display())]
    Encode { path: PathBuf, reason: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Timed out after {secs:.1}s while processing {}", .path.display())]
    Timeout { path: PathBuf, secs: f64 },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn decode(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn encode(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::Encode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Classifies the error for run reports.
    ///
    /// Timeouts count as decode failures. Bare IO errors are reported as
    /// encode failures unless the file was missing.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceNotFound(_) => ErrorKind::SourceNotFound,
            Self::Decode { .. } | Self::Timeout { .. } => ErrorKind::DecodeFailure,
            Self::Encode { .. } => ErrorKind::EncodeFailure,
            Self::InvalidParameter(_) | Self::Config(_) => ErrorKind::InvalidParameter,
            Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound => ErrorKind::SourceNotFound,
            Self::Io(_) => ErrorKind::EncodeFailure,
        }
    }
}

/// Failure classes reported per unit in a run summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    SourceNotFound,
    DecodeFailure,
    EncodeFailure,
    InvalidParameter,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SourceNotFound => "SourceNotFound",
            Self::DecodeFailure => "DecodeFailure",
            Self::EncodeFailure => "EncodeFailure",
            Self::InvalidParameter => "InvalidParameter",
        };
        f.write_str(name)
    }
}
