//! signaug Transform Library
//!
//! Per-frame augmentation operations (mirror, rotation, translation, resize
//! and box blur) and the lift that applies them to every frame of a video.
//! Operations are pure: each takes a frame and returns a new one.

pub mod ops;
pub mod video;

pub use ops::FrameOp;
pub use video::{augment_video, augment_video_chain, LiftOptions, VideoStats};
