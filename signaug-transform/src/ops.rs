//! Per-frame augmentation operations
//!
//! All operations take an RGB frame and return a new one. Geometry-preserving
//! operations fill any area they expose with black.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use signaug_core::{Result, TransformSpec};

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// A transform bound to the frame size of one video stream
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOp {
    Flip,
    Rotate { degrees: f64 },
    Translate { shift_x: i32, shift_y: i32 },
    Resize { width: u32, height: u32 },
    Blur { kernel_size: u32 },
}

impl FrameOp {
    /// Validates `spec` for frames of `width` x `height` and binds it
    pub fn for_stream(spec: &TransformSpec, width: u32, height: u32) -> Result<Self> {
        let (out_width, out_height) = spec.output_dimensions(width, height)?;
        Ok(match *spec {
            TransformSpec::Flip => Self::Flip,
            TransformSpec::Rotate { degrees } => Self::Rotate { degrees },
            TransformSpec::Translate { shift_x, shift_y } => Self::Translate { shift_x, shift_y },
            TransformSpec::Resize { .. } => Self::Resize {
                width: out_width,
                height: out_height,
            },
            TransformSpec::Blur { kernel_size } => Self::Blur { kernel_size },
        })
    }

    /// Size of the frames this operation produces from `width` x `height` input
    pub fn output_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        match *self {
            Self::Resize { width, height } => (width, height),
            _ => (width, height),
        }
    }

    /// Applies the operation to one frame
    pub fn apply(&self, frame: &RgbImage) -> RgbImage {
        match *self {
            Self::Flip => flip_horizontal(frame),
            Self::Rotate { degrees } => rotate(frame, degrees),
            Self::Translate { shift_x, shift_y } => translate(frame, shift_x, shift_y),
            Self::Resize { width, height } => resize(frame, width, height),
            Self::Blur { kernel_size } => box_blur(frame, kernel_size),
        }
    }
}

/// Mirrors the frame around its vertical axis
pub fn flip_horizontal(frame: &RgbImage) -> RgbImage {
    imageops::flip_horizontal(frame)
}

/// Rotates the frame about its center, keeping the canvas size.
///
/// Positive angles turn the content counter-clockwise. Samples are
/// interpolated bilinearly; corners that leave the source become black.
pub fn rotate(frame: &RgbImage, degrees: f64) -> RgbImage {
    if degrees % 360.0 == 0.0 {
        return frame.clone();
    }

    let (width, height) = frame.dimensions();
    let (sin, cos) = degrees.to_radians().sin_cos();
    let cx = (width as f64 - 1.0) / 2.0;
    let cy = (height as f64 - 1.0) / 2.0;

    // Inverse mapping: for every output pixel find where it came from
    RgbImage::from_fn(width, height, |x, y| {
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;
        let src_x = cos * dx - sin * dy + cx;
        let src_y = sin * dx + cos * dy + cy;
        sample_bilinear(frame, src_x, src_y)
    })
}

/// Shifts the frame by whole pixels; positive values move content right / down
pub fn translate(frame: &RgbImage, shift_x: i32, shift_y: i32) -> RgbImage {
    let (width, height) = frame.dimensions();
    let mut shifted = RgbImage::from_pixel(width, height, BLACK);

    for y in 0..height {
        let src_y = y as i64 - shift_y as i64;
        if src_y < 0 || src_y >= height as i64 {
            continue;
        }
        for x in 0..width {
            let src_x = x as i64 - shift_x as i64;
            if src_x < 0 || src_x >= width as i64 {
                continue;
            }
            shifted.put_pixel(x, y, *frame.get_pixel(src_x as u32, src_y as u32));
        }
    }

    shifted
}

/// Scales the frame to exactly `width` x `height`
pub fn resize(frame: &RgbImage, width: u32, height: u32) -> RgbImage {
    if frame.dimensions() == (width, height) {
        return frame.clone();
    }
    imageops::resize(frame, width, height, FilterType::Triangle)
}

/// Replaces every pixel by the unweighted mean of its `kernel_size` square
/// neighborhood. Pixels beyond the border repeat the edge pixel.
pub fn box_blur(frame: &RgbImage, kernel_size: u32) -> RgbImage {
    if kernel_size <= 1 {
        return frame.clone();
    }

    let (width, height) = frame.dimensions();
    let (w, h) = (width as usize, height as usize);
    let radius = (kernel_size / 2) as i64;
    let src = frame.as_raw();

    let clamp_x = |x: i64| x.clamp(0, w as i64 - 1) as usize;
    let clamp_y = |y: i64| y.clamp(0, h as i64 - 1) as usize;

    // Horizontal pass: per-channel sums over the row window
    let mut row_sums = vec![0u64; w * h * 3];
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 3];
            for offset in -radius..=radius {
                let sx = clamp_x(x as i64 + offset);
                let idx = (y * w + sx) * 3;
                for (c, total) in acc.iter_mut().enumerate() {
                    *total += src[idx + c] as u64;
                }
            }
            let out = (y * w + x) * 3;
            row_sums[out..out + 3].copy_from_slice(&acc);
        }
    }

    // Vertical pass over the row sums, then a single rounded division
    let area = kernel_size as u64 * kernel_size as u64;
    let mut blurred = vec![0u8; w * h * 3];
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 3];
            for offset in -radius..=radius {
                let sy = clamp_y(y as i64 + offset);
                let idx = (sy * w + x) * 3;
                for (c, total) in acc.iter_mut().enumerate() {
                    *total += row_sums[idx + c];
                }
            }
            let out = (y * w + x) * 3;
            for (c, total) in acc.iter().enumerate() {
                blurred[out + c] = ((total + area / 2) / area) as u8;
            }
        }
    }

    RgbImage::from_raw(width, height, blurred).unwrap_or_else(|| frame.clone())
}

fn sample_bilinear(frame: &RgbImage, x: f64, y: f64) -> Rgb<u8> {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let taps = [
        (0, 0, (1.0 - fx) * (1.0 - fy)),
        (1, 0, fx * (1.0 - fy)),
        (0, 1, (1.0 - fx) * fy),
        (1, 1, fx * fy),
    ];

    let mut acc = [0.0f64; 3];
    for (ox, oy, weight) in taps {
        if weight == 0.0 {
            continue;
        }
        if let Some(pixel) = pixel_at(frame, x0 + ox, y0 + oy) {
            for (c, total) in acc.iter_mut().enumerate() {
                *total += weight * pixel[c] as f64;
            }
        }
    }

    Rgb(acc.map(|v| v.round().clamp(0.0, 255.0) as u8))
}

fn pixel_at(frame: &RgbImage, x: i64, y: i64) -> Option<&Rgb<u8>> {
    if x < 0 || y < 0 || x >= frame.width() as i64 || y >= frame.height() as i64 {
        return None;
    }
    Some(frame.get_pixel(x as u32, y as u32))
}
