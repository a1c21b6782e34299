//! Video stream inspection

use crate::{FrameSource, Result, VideoReader};
use std::fmt;
use std::path::Path;

/// Geometry and timing of a video stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Source frame rate as (numerator, denominator)
    pub frame_rate: (u32, u32),
    pub duration_ms: u64,
    /// Frame count stored in the container, 0 if unknown
    pub frame_count_hint: u64,
    /// Frames actually decoded, when counting was requested
    pub decoded_frames: Option<u64>,
}

impl VideoInfo {
    /// Frame rate in frames per second, 0.0 if unknown
    pub fn fps(&self) -> f64 {
        let (num, den) = self.frame_rate;
        if den == 0 {
            0.0
        } else {
            num as f64 / den as f64
        }
    }
}

impl fmt::Display for VideoInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Resolution: {}x{}", self.width, self.height)?;
        writeln!(
            f,
            "Frame rate: {}/{} ({:.2} fps)",
            self.frame_rate.0,
            self.frame_rate.1,
            self.fps()
        )?;
        write!(
            f,
            "Duration: {} ms ({:.2} seconds)",
            self.duration_ms,
            self.duration_ms as f64 / 1000.0
        )?;
        if self.frame_count_hint > 0 {
            write!(f, "\nFrames (container): {}", self.frame_count_hint)?;
        }
        if let Some(frames) = self.decoded_frames {
            write!(f, "\nFrames (decoded): {}", frames)?;
        }
        Ok(())
    }
}

/// Reads the stream parameters of `path`; with `count_frames` every frame is
/// decoded and counted as well.
pub fn probe(path: impl AsRef<Path>, count_frames: bool) -> Result<VideoInfo> {
    let mut reader = VideoReader::open(path)?;

    let decoded_frames = if count_frames {
        let mut frames = 0u64;
        for frame in reader.frames() {
            frame?;
            frames += 1;
        }
        Some(frames)
    } else {
        None
    };

    Ok(VideoInfo {
        width: reader.width(),
        height: reader.height(),
        frame_rate: reader.frame_rate(),
        duration_ms: reader.duration_ms(),
        frame_count_hint: reader.frame_count_hint(),
        decoded_frames,
    })
}
