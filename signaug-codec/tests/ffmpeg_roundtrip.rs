//! Encode/decode tests against the FFmpeg codec

#![cfg(feature = "ffmpeg")]

use image::{Rgb, RgbImage};
use signaug_codec::{
    probe, Codec, Error, FfmpegCodec, FrameSink, FrameSource, VideoReader, VideoWriter,
};

fn gradient(width: u32, height: u32, shade: u8) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, shade])
    })
}

#[test]
fn test_write_then_read_preserves_frame_count_and_size() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.avi");

    let mut writer = VideoWriter::create(&path, 64, 48, 10).unwrap();
    for i in 0..30u8 {
        writer.write_frame(&gradient(64, 48, i * 8)).unwrap();
    }
    assert_eq!(writer.finish().unwrap(), 30);

    let mut reader = VideoReader::open(&path).unwrap();
    assert_eq!((reader.width(), reader.height()), (64, 48));
    let (num, den) = reader.frame_rate();
    assert!(den > 0 && (num as f64 / den as f64 - 10.0).abs() < 0.01);

    let frames: Vec<_> = reader.frames().collect::<Result<_, _>>().unwrap();
    assert_eq!(frames.len(), 30);
    assert!(frames.iter().all(|f| f.dimensions() == (64, 48)));

    // Motion-JPEG is lossy; the gradient must survive approximately.
    let pixel = frames[0].get_pixel(63, 47);
    assert!(pixel[0] > 200 && pixel[1] > 200, "{pixel:?}");
}

#[test]
fn test_odd_and_small_frames_encode() {
    let dir = tempfile::tempdir().unwrap();
    let codec = FfmpegCodec::new();

    for (width, height) in [(2, 2), (33, 17)] {
        let path = dir.path().join(format!("small_{width}x{height}.{}", codec.output_extension()));
        let mut sink = codec.create(&path, width, height, 10).unwrap();
        for _ in 0..3 {
            sink.write_frame(&RgbImage::from_pixel(width, height, Rgb([200, 10, 10])))
                .unwrap();
        }
        assert_eq!(sink.finish().unwrap(), 3);

        let mut source = codec.open(&path).unwrap();
        assert_eq!((source.width(), source.height()), (width, height));
        assert_eq!(source.frames().count(), 3);
    }
}

#[test]
fn test_wrong_frame_size_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = VideoWriter::create(dir.path().join("bad.avi"), 16, 16, 10).unwrap();
    let err = writer.write_frame(&RgbImage::new(8, 8)).unwrap_err();
    assert!(matches!(err, Error::FrameSize { .. }));
    assert_eq!(writer.frames_written(), 0);
}

#[test]
fn test_garbage_file_does_not_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.mp4");
    std::fs::write(&path, b"this is not a video container").unwrap();
    assert!(VideoReader::open(&path).is_err());
}

#[test]
fn test_missing_file_does_not_open() {
    let dir = tempfile::tempdir().unwrap();
    assert!(VideoReader::open(dir.path().join("absent.mp4")).is_err());
}

#[test]
fn test_probe_reports_geometry_and_counts_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("probe.avi");

    let mut writer = VideoWriter::create(&path, 20, 10, 10).unwrap();
    for i in 0..12u8 {
        writer.write_frame(&gradient(20, 10, i)).unwrap();
    }
    writer.finish().unwrap();

    let info = probe(&path, false).unwrap();
    assert_eq!((info.width, info.height), (20, 10));
    assert!((info.fps() - 10.0).abs() < 0.01);
    assert_eq!(info.decoded_frames, None);

    let info = probe(&path, true).unwrap();
    assert_eq!(info.decoded_frames, Some(12));
    assert!(info.to_string().contains("Resolution: 20x10"));
}
