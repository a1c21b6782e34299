//! signaug Codec Library
//!
//! This library is the boundary between the augmentation pipeline and video
//! files. The pipeline only needs two capabilities: pull the next decoded
//! frame (or learn that the stream ended) and append a frame to an output
//! stream. Both are expressed as traits so the pipeline can run against any
//! implementation; the `ffmpeg` feature provides the production one.

#[cfg(feature = "ffmpeg")]
pub mod ffmpeg_codec;
#[cfg(feature = "ffmpeg")]
pub mod probe;
#[cfg(feature = "ffmpeg")]
pub mod video_reader;
#[cfg(feature = "ffmpeg")]
pub mod video_writer;

#[cfg(feature = "ffmpeg")]
pub use ffmpeg_codec::FfmpegCodec;
#[cfg(feature = "ffmpeg")]
pub use probe::{probe, VideoInfo};
#[cfg(feature = "ffmpeg")]
pub use video_reader::VideoReader;
#[cfg(feature = "ffmpeg")]
pub use video_writer::VideoWriter;

use image::RgbImage;
use std::path::Path;

/// Result type for signaug-codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for signaug-codec operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "ffmpeg")]
    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),

    #[error("Invalid video file")]
    InvalidVideo,

    #[error("No video stream found")]
    NoVideoStream,

    #[error("Encoder not available: {0}")]
    EncoderNotFound(&'static str),

    #[error("Frame size {got_width}x{got_height} does not match stream size {width}x{height}")]
    FrameSize {
        width: u32,
        height: u32,
        got_width: u32,
        got_height: u32,
    },

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}

/// A decoded video, read one frame at a time
pub trait FrameSource {
    /// Frame width in pixels
    fn width(&self) -> u32;

    /// Frame height in pixels
    fn height(&self) -> u32;

    /// Decodes the next frame. `Ok(None)` marks the end of the stream.
    fn read_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Returns the remaining frames as an iterator
    fn frames(&mut self) -> Frames<'_, Self>
    where
        Self: Sized,
    {
        Frames {
            source: self,
            finished: false,
        }
    }
}

/// An encoded output stream
pub trait FrameSink {
    /// Appends one frame. Every frame must have the size the sink was created with.
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Flushes and closes the stream, returning the number of frames written
    fn finish(self) -> Result<u64>
    where
        Self: Sized;
}

/// Opens sources and creates sinks
pub trait Codec: Send + Sync {
    type Source: FrameSource;
    type Sink: FrameSink;

    /// Opens an existing video for decoding
    fn open(&self, path: &Path) -> Result<Self::Source>;

    /// Creates a new video at `path` encoded at a fixed `fps`
    fn create(&self, path: &Path, width: u32, height: u32, fps: u32) -> Result<Self::Sink>;

    /// Extension of the container `create` writes
    fn output_extension(&self) -> &str;
}

/// Lazy, finite sequence of decoded frames.
///
/// Ends after the end of stream or after the first error; it cannot be
/// restarted.
pub struct Frames<'a, S: FrameSource> {
    source: &'a mut S,
    finished: bool,
}

impl<S: FrameSource> Iterator for Frames<'_, S> {
    type Item = Result<RgbImage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.source.read_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Checks that `frame` has the size a stream expects
pub fn check_frame_size(frame: &RgbImage, width: u32, height: u32) -> Result<()> {
    if frame.width() != width || frame.height() != height {
        return Err(Error::FrameSize {
            width,
            height,
            got_width: frame.width(),
            got_height: frame.height(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    struct Countdown {
        left: u32,
        fail_at: Option<u32>,
    }

    impl FrameSource for Countdown {
        fn width(&self) -> u32 {
            2
        }

        fn height(&self) -> u32 {
            2
        }

        fn read_frame(&mut self) -> Result<Option<RgbImage>> {
            if Some(self.left) == self.fail_at {
                return Err(Error::InvalidVideo);
            }
            if self.left == 0 {
                return Ok(None);
            }
            self.left -= 1;
            Ok(Some(RgbImage::from_pixel(2, 2, Rgb([self.left as u8, 0, 0]))))
        }
    }

    #[test]
    fn test_frames_stop_at_end_of_stream() {
        let mut source = Countdown {
            left: 3,
            fail_at: None,
        };
        let frames: Vec<_> = source.frames().collect::<Result<_>>().unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].get_pixel(0, 0), &Rgb([2, 0, 0]));
        assert_eq!(frames[2].get_pixel(1, 1), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_frames_stop_after_error() {
        let mut source = Countdown {
            left: 5,
            fail_at: Some(3),
        };
        let mut frames = source.frames();
        assert!(frames.next().unwrap().is_ok());
        assert!(frames.next().unwrap().is_ok());
        assert!(matches!(frames.next(), Some(Err(Error::InvalidVideo))));
        assert!(frames.next().is_none());
    }

    #[test]
    fn test_check_frame_size() {
        let frame = RgbImage::new(4, 3);
        assert!(check_frame_size(&frame, 4, 3).is_ok());
        let err = check_frame_size(&frame, 3, 4).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Frame size 4x3 does not match stream size 3x4"
        );
    }
}
