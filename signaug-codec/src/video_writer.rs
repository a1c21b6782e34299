//! Motion-JPEG video encoding using FFmpeg
//!
//! Every augmented video is written the same way regardless of its source:
//! Motion-JPEG frames in the container picked from the output file extension
//! (AVI for the names the pipeline generates), at a fixed frame rate.
//!
//! The flow per frame:
//!   1. RGB pixels -> ffmpeg `frame::Video` (RGB24)
//!   2. swscale RGB24 -> YUVJ444P (full range, no chroma subsampling so any
//!      frame size encodes, down to 1x1)
//!   3. MJPEG encoder -> packets, interleaved into the container

use crate::video_reader::init_ffmpeg;
use crate::{check_frame_size, Error, FrameSink, Result};
use ffmpeg_next as ffmpeg;
use image::RgbImage;
use std::path::Path;

const ENCODER_PIXEL_FORMAT: ffmpeg::format::Pixel = ffmpeg::format::Pixel::YUVJ444P;

// qscale 3 expressed in lambda units (FF_QP2LAMBDA = 118)
const GLOBAL_QUALITY: &str = "354";

/// Writes RGB frames into a new Motion-JPEG video file
pub struct VideoWriter {
    output: ffmpeg::format::context::Output,
    encoder: ffmpeg::encoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    stream_index: usize,
    encoder_time_base: ffmpeg::Rational,
    stream_time_base: ffmpeg::Rational,
    width: u32,
    height: u32,
    next_pts: i64,
    frames_written: u64,
}

impl VideoWriter {
    /// Creates the output file and writes the container header
    pub fn create(path: impl AsRef<Path>, width: u32, height: u32, fps: u32) -> Result<Self> {
        init_ffmpeg()?;

        if width == 0 || height == 0 {
            return Err(Error::InvalidFrame(format!(
                "cannot encode {width}x{height} frames"
            )));
        }
        if fps == 0 {
            return Err(Error::InvalidFrame("frame rate must be positive".into()));
        }

        let path = path.as_ref();
        let mut output = ffmpeg::format::output(&path)?;
        let global_header = output
            .format()
            .flags()
            .contains(ffmpeg::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg::encoder::find(ffmpeg::codec::Id::MJPEG)
            .ok_or(Error::EncoderNotFound("mjpeg"))?;

        // ── Configure the encoder ──
        let context = ffmpeg::codec::context::Context::from_parameters(
            ffmpeg::codec::Parameters::new(),
        )?;
        let mut video = context.encoder().video()?;

        let time_base = ffmpeg::Rational(1, fps as i32);
        video.set_width(width);
        video.set_height(height);
        video.set_format(ENCODER_PIXEL_FORMAT);
        video.set_time_base(time_base);
        video.set_frame_rate(Some(ffmpeg::Rational(fps as i32, 1)));
        if global_header {
            video.set_flags(ffmpeg::codec::Flags::GLOBAL_HEADER);
        }

        let mut opts = ffmpeg::Dictionary::new();
        opts.set("flags", "+qscale");
        opts.set("global_quality", GLOBAL_QUALITY);

        let encoder = video.open_as_with(codec, opts)?;

        // ── Add the stream and write the header ──
        let stream_index = {
            let mut stream = output.add_stream(codec)?;
            stream.set_time_base(time_base);
            stream.set_parameters(&encoder);
            stream.index()
        };
        output.write_header()?;

        // The muxer may pick its own time base while writing the header
        let stream_time_base = output
            .stream(stream_index)
            .ok_or(Error::InvalidVideo)?
            .time_base();

        let scaler = ffmpeg::software::scaling::Context::get(
            ffmpeg::format::Pixel::RGB24,
            width,
            height,
            ENCODER_PIXEL_FORMAT,
            width,
            height,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )?;

        tracing::debug!(
            path = %path.display(),
            width,
            height,
            fps,
            "opened mjpeg writer"
        );

        Ok(Self {
            output,
            encoder,
            scaler,
            stream_index,
            encoder_time_base: time_base,
            stream_time_base,
            width,
            height,
            next_pts: 0,
            frames_written: 0,
        })
    }

    /// Number of frames accepted so far
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Moves every packet the encoder has ready into the container
    fn write_packets(&mut self) -> Result<()> {
        let mut packet = ffmpeg::Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, self.stream_time_base);
            packet.write_interleaved(&mut self.output)?;
        }
        Ok(())
    }
}

impl FrameSink for VideoWriter {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        check_frame_size(frame, self.width, self.height)?;

        let mut rgb_frame =
            ffmpeg::frame::Video::new(ffmpeg::format::Pixel::RGB24, self.width, self.height);

        // Copy RGB pixels into the frame (respecting stride)
        {
            let stride = rgb_frame.stride(0);
            let dst = rgb_frame.data_mut(0);
            let src = frame.as_raw();
            let row_bytes = self.width as usize * 3;
            for y in 0..self.height as usize {
                let src_off = y * row_bytes;
                let dst_off = y * stride;
                dst[dst_off..dst_off + row_bytes]
                    .copy_from_slice(&src[src_off..src_off + row_bytes]);
            }
        }

        let mut yuv_frame = ffmpeg::frame::Video::empty();
        self.scaler.run(&rgb_frame, &mut yuv_frame)?;
        yuv_frame.set_pts(Some(self.next_pts));
        self.next_pts += 1;

        self.encoder.send_frame(&yuv_frame)?;
        self.write_packets()?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(mut self) -> Result<u64> {
        self.encoder.send_eof()?;
        self.write_packets()?;
        self.output.write_trailer()?;
        Ok(self.frames_written)
    }
}
