//! FFmpeg-backed implementation of the codec boundary

use crate::{Codec, Result, VideoReader, VideoWriter};
use std::path::Path;

/// Decodes anything FFmpeg can open and encodes Motion-JPEG AVI files
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegCodec;

impl FfmpegCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for FfmpegCodec {
    type Source = VideoReader;
    type Sink = VideoWriter;

    fn open(&self, path: &Path) -> Result<VideoReader> {
        VideoReader::open(path)
    }

    fn create(&self, path: &Path, width: u32, height: u32, fps: u32) -> Result<VideoWriter> {
        VideoWriter::create(path, width, height, fps)
    }

    fn output_extension(&self) -> &str {
        "avi"
    }
}
