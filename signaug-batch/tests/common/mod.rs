use image::{Rgb, RgbImage};
use signaug_codec::{Codec, Error, FrameSink, FrameSource, Result};
use std::fs;
use std::path::{Path, PathBuf};

const MAGIC: &str = "FAKEVIDEO";

/// Codec over tiny text files: `FAKEVIDEO <width> <height> <frames>`.
///
/// Outputs use the same format, so they can be read back.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeCodec;

pub struct FakeSource {
    width: u32,
    height: u32,
    remaining: u32,
}

pub struct FakeSink {
    path: PathBuf,
    width: u32,
    height: u32,
    frames: u64,
}

impl FrameSource for FakeSource {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(RgbImage::from_pixel(
            self.width,
            self.height,
            Rgb([120, 60, 30]),
        )))
    }
}

impl FrameSink for FakeSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        signaug_codec::check_frame_size(frame, self.width, self.height)?;
        self.frames += 1;
        Ok(())
    }

    fn finish(self) -> Result<u64> {
        fs::write(
            &self.path,
            format!("{MAGIC} {} {} {}", self.width, self.height, self.frames),
        )?;
        Ok(self.frames)
    }
}

impl Codec for FakeCodec {
    type Source = FakeSource;
    type Sink = FakeSink;

    fn open(&self, path: &Path) -> Result<FakeSource> {
        let (width, height, frames) = read_header(path)?;
        Ok(FakeSource {
            width,
            height,
            remaining: frames,
        })
    }

    fn create(&self, path: &Path, width: u32, height: u32, _fps: u32) -> Result<FakeSink> {
        fs::write(path, b"")?;
        Ok(FakeSink {
            path: path.to_path_buf(),
            width,
            height,
            frames: 0,
        })
    }

    fn output_extension(&self) -> &str {
        "avi"
    }
}

/// Parses a fake video file into `(width, height, frames)`
pub fn read_header(path: &Path) -> Result<(u32, u32, u32)> {
    let text = fs::read_to_string(path).map_err(|_| Error::InvalidVideo)?;
    let mut fields = text.split_whitespace();
    if fields.next() != Some(MAGIC) {
        return Err(Error::InvalidVideo);
    }
    let mut next = || -> Result<u32> {
        fields
            .next()
            .and_then(|f| f.parse().ok())
            .ok_or(Error::InvalidVideo)
    };
    Ok((next()?, next()?, next()?))
}

/// Writes a fake source video
pub fn write_video(path: &Path, width: u32, height: u32, frames: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, format!("{MAGIC} {width} {height} {frames}")).unwrap();
}

/// Sorted file names of `dir`
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
