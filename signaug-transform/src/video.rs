//! Lifting frame operations over whole videos
//!
//! A unit decodes its source frame by frame, applies one or more operations
//! to every frame and streams the result into a new file. The decoder and
//! encoder live only as long as the unit; whenever a unit fails after its
//! output file was created, that file is removed.

use crate::FrameOp;
use signaug_codec::{Codec, FrameSink, FrameSource};
use signaug_core::config::DEFAULT_FPS;
use signaug_core::{Error, Result, TransformSpec};
use std::path::Path;
use std::time::{Duration, Instant};

/// Settings shared by every unit of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiftOptions {
    /// Output frame rate
    pub fps: u32,
    /// Wall time limit for one unit
    pub timeout: Option<Duration>,
}

impl Default for LiftOptions {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            timeout: None,
        }
    }
}

/// Length and geometry of a written video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoStats {
    pub frames: u64,
    pub width: u32,
    pub height: u32,
}

/// Why streaming frames from a source into a sink stopped early
#[derive(Debug)]
pub enum StreamError {
    Decode(signaug_codec::Error),
    Encode(signaug_codec::Error),
    Timeout(Duration),
}

/// Applies `spec` to every frame of `input` and writes the result to `output`
pub fn augment_video<C: Codec>(
    codec: &C,
    input: &Path,
    output: &Path,
    spec: &TransformSpec,
    options: &LiftOptions,
) -> Result<VideoStats> {
    augment_video_chain(codec, input, output, std::slice::from_ref(spec), options)
}

/// Applies `specs` in order to every frame of `input` in a single pass
pub fn augment_video_chain<C: Codec>(
    codec: &C,
    input: &Path,
    output: &Path,
    specs: &[TransformSpec],
    options: &LiftOptions,
) -> Result<VideoStats> {
    let started = Instant::now();

    if specs.is_empty() {
        return Err(Error::InvalidParameter("no transform to apply".into()));
    }
    for spec in specs {
        spec.validate()?;
    }
    if !input.is_file() {
        return Err(Error::SourceNotFound(input.to_path_buf()));
    }
    if is_same_file(input, output) {
        return Err(Error::InvalidParameter(format!(
            "output {} would overwrite its own source",
            output.display()
        )));
    }

    let mut source = codec.open(input).map_err(|e| Error::decode(input, e))?;
    let (in_width, in_height) = (source.width(), source.height());

    // Bind each operation to the frame size produced by the previous one
    let mut ops = Vec::with_capacity(specs.len());
    let (mut width, mut height) = (in_width, in_height);
    for spec in specs {
        let op = FrameOp::for_stream(spec, width, height)?;
        (width, height) = op.output_dimensions(width, height);
        ops.push(op);
    }

    tracing::debug!(
        input = %input.display(),
        in_width,
        in_height,
        width,
        height,
        "starting unit"
    );

    let mut sink = match codec.create(output, width, height, options.fps) {
        Ok(sink) => sink,
        Err(e) => {
            discard_partial(output);
            return Err(Error::encode(output, e));
        }
    };

    let deadline = options.timeout.map(|limit| (started, limit));
    let written = match transform_frames(&mut source, &mut sink, &ops, deadline) {
        Ok(written) => written,
        Err(e) => {
            drop(sink);
            discard_partial(output);
            return Err(match e {
                StreamError::Decode(e) => Error::decode(input, e),
                StreamError::Encode(e) => Error::encode(output, e),
                StreamError::Timeout(limit) => Error::Timeout {
                    path: input.to_path_buf(),
                    secs: limit.as_secs_f64(),
                },
            });
        }
    };

    let frames = match sink.finish() {
        Ok(frames) => frames,
        Err(e) => {
            discard_partial(output);
            return Err(Error::encode(output, e));
        }
    };
    if frames != written {
        discard_partial(output);
        return Err(Error::encode(
            output,
            format!("encoder reported {frames} frames, {written} were written"),
        ));
    }

    Ok(VideoStats {
        frames,
        width,
        height,
    })
}

/// Streams every frame of `source` through `ops` into `sink`.
///
/// Returns the number of frames written. `deadline` is the unit start time and
/// its limit; it is checked before each frame.
pub fn transform_frames<S: FrameSource, K: FrameSink>(
    source: &mut S,
    sink: &mut K,
    ops: &[FrameOp],
    deadline: Option<(Instant, Duration)>,
) -> std::result::Result<u64, StreamError> {
    let mut written = 0u64;

    for frame in source.frames() {
        if let Some((started, limit)) = deadline {
            if started.elapsed() > limit {
                return Err(StreamError::Timeout(limit));
            }
        }

        let mut frame = frame.map_err(StreamError::Decode)?;
        for op in ops {
            frame = op.apply(&frame);
        }
        sink.write_frame(&frame).map_err(StreamError::Encode)?;
        written += 1;
    }

    Ok(written)
}

/// True when `output` names the existing file `input`, through any path spelling
fn is_same_file(input: &Path, output: &Path) -> bool {
    let Ok(input) = input.canonicalize() else {
        return false;
    };
    if let Ok(output) = output.canonicalize() {
        return input == output;
    }
    match (output.parent(), output.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            parent
                .canonicalize()
                .map(|parent| parent.join(name) == input)
                .unwrap_or(false)
        }
        _ => false,
    }
}

fn discard_partial(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), "could not remove partial output: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use signaug_core::ErrorKind;
    use std::fs;
    use std::path::PathBuf;

    /// Test videos are text files: "<width> <height> <frames> [<fail-at>]"
    struct TextCodec;

    struct TextSource {
        width: u32,
        height: u32,
        remaining: u32,
        fail_at: Option<u32>,
        index: u32,
        delay: Duration,
    }

    struct TextSink {
        path: PathBuf,
        width: u32,
        height: u32,
        frames: Vec<RgbImage>,
    }

    impl FrameSource for TextSource {
        fn width(&self) -> u32 {
            self.width
        }

        fn height(&self) -> u32 {
            self.height
        }

        fn read_frame(&mut self) -> signaug_codec::Result<Option<RgbImage>> {
            if Some(self.index) == self.fail_at {
                return Err(signaug_codec::Error::InvalidVideo);
            }
            if self.remaining == 0 {
                return Ok(None);
            }
            std::thread::sleep(self.delay);
            self.remaining -= 1;
            self.index += 1;
            Ok(Some(RgbImage::from_fn(self.width, self.height, |x, _| {
                Rgb([x as u8 * 10, self.index as u8, 0])
            })))
        }
    }

    impl FrameSink for TextSink {
        fn write_frame(&mut self, frame: &RgbImage) -> signaug_codec::Result<()> {
            signaug_codec::check_frame_size(frame, self.width, self.height)?;
            self.frames.push(frame.clone());
            Ok(())
        }

        fn finish(self) -> signaug_codec::Result<u64> {
            let first = self.frames.first().map(|f| f.get_pixel(0, 0)[0]).unwrap_or(0);
            fs::write(
                &self.path,
                format!("{} {} {} {}", self.width, self.height, self.frames.len(), first),
            )?;
            Ok(self.frames.len() as u64)
        }
    }

    impl Codec for TextCodec {
        type Source = TextSource;
        type Sink = TextSink;

        fn open(&self, path: &Path) -> signaug_codec::Result<TextSource> {
            let text = fs::read_to_string(path)?;
            let fields: Vec<u32> = text
                .split_whitespace()
                .map(|f| f.parse().map_err(|_| signaug_codec::Error::InvalidVideo))
                .collect::<signaug_codec::Result<_>>()?;
            match fields.as_slice() {
                [width, height, frames, rest @ ..] => Ok(TextSource {
                    width: *width,
                    height: *height,
                    remaining: *frames,
                    fail_at: rest.first().copied(),
                    index: 0,
                    delay: Duration::from_millis(if rest.len() > 1 { rest[1] as u64 } else { 0 }),
                }),
                _ => Err(signaug_codec::Error::InvalidVideo),
            }
        }

        fn create(
            &self,
            path: &Path,
            width: u32,
            height: u32,
            _fps: u32,
        ) -> signaug_codec::Result<TextSink> {
            // Like a real muxer, the file exists as soon as the stream is opened
            fs::write(path, b"")?;
            Ok(TextSink {
                path: path.to_path_buf(),
                width,
                height,
                frames: Vec::new(),
            })
        }

        fn output_extension(&self) -> &str {
            "txt"
        }
    }

    fn video(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_frame_count_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let input = video(dir.path(), "v1.mp4", "8 6 30");

        for spec in TransformSpec::default_set() {
            let output = dir.path().join(format!("{}.txt", spec.label()));
            let stats =
                augment_video(&TextCodec, &input, &output, &spec, &LiftOptions::default()).unwrap();
            assert_eq!(stats.frames, 30, "{spec}");
            let written = fs::read_to_string(&output).unwrap();
            assert!(written.contains(" 30 "), "{spec}: {written}");
        }
    }

    #[test]
    fn test_resize_changes_output_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let input = video(dir.path(), "v1.mp4", "100 100 3");
        let output = dir.path().join("small.txt");

        let spec = TransformSpec::Resize {
            scale_percent: -0.99,
        };
        let stats = augment_video(&TextCodec, &input, &output, &spec, &LiftOptions::default())
            .unwrap();
        assert_eq!((stats.width, stats.height, stats.frames), (1, 1, 3));
    }

    #[test]
    fn test_chain_applies_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let input = video(dir.path(), "v1.mp4", "4 2 1");
        let output = dir.path().join("chain.txt");

        // Columns start as 0, 10, 20, 30
        let specs = [
            TransformSpec::Translate {
                shift_x: 1,
                shift_y: 0,
            },
            TransformSpec::Flip,
        ];
        let stats =
            augment_video_chain(&TextCodec, &input, &output, &specs, &LiftOptions::default())
                .unwrap();
        assert_eq!((stats.width, stats.height, stats.frames), (4, 2, 1));
        // Shifted to [black, 0, 10, 20], then mirrored
        assert_eq!(fs::read_to_string(&output).unwrap(), "4 2 1 20");
    }

    #[test]
    fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.txt");
        let err = augment_video(
            &TextCodec,
            &dir.path().join("absent.mp4"),
            &output,
            &TransformSpec::Flip,
            &LiftOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceNotFound);
        assert!(!output.exists());
    }

    #[test]
    fn test_undecodable_source_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = video(dir.path(), "notes.mp4", "not a video");
        let output = dir.path().join("out.txt");

        let err = augment_video(&TextCodec, &input, &output, &TransformSpec::Flip, &LiftOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
        assert!(!output.exists());
    }

    #[test]
    fn test_decode_failure_partway_removes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = video(dir.path(), "broken.mp4", "8 8 30 12");
        let output = dir.path().join("out.txt");

        let err = augment_video(&TextCodec, &input, &output, &TransformSpec::Flip, &LiftOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
        assert!(!output.exists());
    }

    #[test]
    fn test_output_equal_to_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = video(dir.path(), "v1.mp4", "8 8 30 12");
        let spelled_differently = dir.path().join(".").join("v1.mp4");

        for output in [&input, &spelled_differently] {
            let err = augment_video(&TextCodec, &input, output, &TransformSpec::Flip, &LiftOptions::default())
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidParameter);
            assert_eq!(fs::read_to_string(&input).unwrap(), "8 8 30 12");
        }
    }

    #[test]
    fn test_unwritable_output_is_encode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = video(dir.path(), "v1.mp4", "8 8 3");
        let output = dir.path().join("missing-dir").join("out.txt");

        let err = augment_video(&TextCodec, &input, &output, &TransformSpec::Flip, &LiftOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EncodeFailure);
    }

    #[test]
    fn test_invalid_parameter_is_reported_before_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let input = video(dir.path(), "v1.mp4", "8 8 3");
        let output = dir.path().join("out.txt");

        let err = augment_video(
            &TextCodec,
            &input,
            &output,
            &TransformSpec::Blur { kernel_size: 2 },
            &LiftOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert!(!output.exists());
    }

    #[test]
    fn test_timeout_is_a_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        // 20 frames, never failing, 20ms per frame
        let input = video(dir.path(), "slow.mp4", "4 4 20 999 20");
        let output = dir.path().join("out.txt");

        let options = LiftOptions {
            timeout: Some(Duration::from_millis(50)),
            ..LiftOptions::default()
        };
        let err = augment_video(&TextCodec, &input, &output, &TransformSpec::Flip, &options)
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
        assert!(!output.exists());
    }
}
