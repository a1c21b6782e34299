//! Video reading and frame extraction using FFmpeg

use crate::{Error, FrameSource, Result};
use ffmpeg_next as ffmpeg;
use image::RgbImage;
use std::path::Path;
use std::sync::OnceLock;

static FFMPEG_INIT: OnceLock<std::result::Result<(), ffmpeg::Error>> = OnceLock::new();

/// Initialize FFmpeg (runs once per process; later calls return the first outcome)
pub(crate) fn init_ffmpeg() -> Result<()> {
    let outcome = *FFMPEG_INIT.get_or_init(|| {
        let outcome = ffmpeg::init();
        if outcome.is_ok() {
            ffmpeg::util::log::set_level(ffmpeg::util::log::Level::Error);
        }
        outcome
    });
    Ok(outcome?)
}

/// Video reader that decodes frames one at a time as RGB images
pub struct VideoReader {
    input: ffmpeg::format::context::Input,
    video_stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: Option<ffmpeg::software::scaling::Context>,
    width: u32,
    height: u32,
    frame_rate: (u32, u32),
    duration_ms: u64,
    frame_count_hint: u64,
    eof_sent: bool,
}

impl VideoReader {
    /// Opens a video file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        init_ffmpeg()?;

        let path = path.as_ref();
        let input = ffmpeg::format::input(&path)?;

        // Find the video stream
        let video_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or(Error::NoVideoStream)?;

        let video_stream_index = video_stream.index();
        let rate = video_stream.rate();
        let frame_rate = (rate.numerator().max(0) as u32, rate.denominator().max(0) as u32);
        let frame_count_hint = video_stream.frames().max(0) as u64;

        let duration = video_stream.duration();
        let time_base = video_stream.time_base();
        let duration_ms = if duration > 0 {
            (duration as f64 * f64::from(time_base) * 1000.0) as u64
        } else {
            // Fallback to container duration
            (input.duration().max(0) as f64 / f64::from(ffmpeg::ffi::AV_TIME_BASE) * 1000.0) as u64
        };

        // Create decoder
        let context = ffmpeg::codec::context::Context::from_parameters(video_stream.parameters())?;
        let decoder = context.decoder().video()?;

        let width = decoder.width();
        let height = decoder.height();
        if width == 0 || height == 0 {
            return Err(Error::InvalidVideo);
        }

        Ok(Self {
            input,
            video_stream_index,
            decoder,
            scaler: None,
            width,
            height,
            frame_rate,
            duration_ms,
            frame_count_hint,
            eof_sent: false,
        })
    }

    /// Gets the frame rate as a rational number (numerator, denominator)
    pub fn frame_rate(&self) -> (u32, u32) {
        self.frame_rate
    }

    /// Gets the total duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Frame count stored in the container, 0 if unknown
    pub fn frame_count_hint(&self) -> u64 {
        self.frame_count_hint
    }

    /// Converts a decoded frame into an RGB image of the stream size
    fn convert(&mut self, decoded: &ffmpeg::frame::Video) -> Result<RgbImage> {
        let stale = self.scaler.as_ref().map_or(true, |scaler| {
            let input = scaler.input();
            input.format != decoded.format()
                || input.width != decoded.width()
                || input.height != decoded.height()
        });
        if stale {
            self.scaler = Some(ffmpeg::software::scaling::Context::get(
                decoded.format(),
                decoded.width(),
                decoded.height(),
                ffmpeg::format::Pixel::RGB24,
                self.width,
                self.height,
                ffmpeg::software::scaling::Flags::BILINEAR,
            )?);
        }

        let mut rgb_frame = ffmpeg::frame::Video::empty();
        if let Some(ref mut scaler) = self.scaler {
            scaler.run(decoded, &mut rgb_frame)?;
        }

        // Copy rows out of the frame, skipping the stride padding
        let stride = rgb_frame.stride(0);
        let data = rgb_frame.data(0);
        let row_bytes = self.width as usize * 3;
        let mut pixels = Vec::with_capacity(row_bytes * self.height as usize);
        for y in 0..self.height as usize {
            let start = y * stride;
            let row = data
                .get(start..start + row_bytes)
                .ok_or_else(|| Error::InvalidFrame(format!("row {y} out of bounds")))?;
            pixels.extend_from_slice(row);
        }

        RgbImage::from_raw(self.width, self.height, pixels).ok_or(Error::InvalidVideo)
    }
}

impl FrameSource for VideoReader {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        let mut decoded = ffmpeg::frame::Video::empty();
        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                return self.convert(&decoded).map(Some);
            }
            if self.eof_sent {
                return Ok(None);
            }

            // Feed the next packet of our stream, or flush at the end of input
            match self.input.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() == self.video_stream_index {
                        self.decoder.send_packet(&packet)?;
                    }
                }
                None => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
            }
        }
    }
}
