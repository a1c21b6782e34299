//! signaug Batch Library
//!
//! Everything that works on a dataset tree rather than a single video:
//! discovering categories and videos, running augmentation units over the
//! whole tree (sequentially or on a worker pool), summarizing the run, and
//! renaming the videos of a category directory.

pub mod discover;
pub mod driver;
pub mod progress_tracker;
pub mod rename;
pub mod report;

pub use discover::discover;
pub use driver::{BatchDriver, Unit};
pub use progress_tracker::ProgressTracker;
pub use rename::rename;
pub use report::{RunSummary, UnitFailure};
