//! Augmentation transform descriptions

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Largest output frame side a transform may produce
pub const MAX_FRAME_SIDE: u32 = 16384;

/// A named per-frame operation together with its parameters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "op", rename_all = "lowercase")
)]
pub enum TransformSpec {
    /// Horizontal mirror
    Flip,
    /// Rotation about the frame center; positive is counter-clockwise
    Rotate { degrees: f64 },
    /// Shift in pixels; positive moves content right / down
    Translate { shift_x: i32, shift_y: i32 },
    /// Scale both sides by `1 + scale_percent`
    Resize { scale_percent: f64 },
    /// Box blur with an odd square kernel
    Blur { kernel_size: u32 },
}

impl TransformSpec {
    /// Returns the operation name without parameters
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Flip => "flip",
            Self::Rotate { .. } => "rotate",
            Self::Translate { .. } => "translate",
            Self::Resize { .. } => "resize",
            Self::Blur { .. } => "blur",
        }
    }

    /// Returns the tag with its parameters in a filename-safe form,
    /// e.g. `rotate-13` or `translate+20-5`
    pub fn label(&self) -> String {
        match self {
            Self::Flip => "flip".to_string(),
            Self::Rotate { degrees } => format!("rotate{:+}", degrees),
            Self::Translate { shift_x, shift_y } => {
                format!("translate{:+}{:+}", shift_x, shift_y)
            }
            Self::Resize { scale_percent } => format!("resize{:+}", scale_percent),
            Self::Blur { kernel_size } => format!("blur{}", kernel_size),
        }
    }

    /// Checks the parameters independently of any frame size
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Flip | Self::Translate { .. } => Ok(()),
            Self::Rotate { degrees } => {
                if degrees.is_finite() {
                    Ok(())
                } else {
                    Err(Error::InvalidParameter(format!(
                        "rotation degrees must be finite (got {degrees})"
                    )))
                }
            }
            Self::Resize { scale_percent } => {
                if scale_percent.is_finite() && scale_percent > -1.0 {
                    Ok(())
                } else {
                    Err(Error::InvalidParameter(format!(
                        "resize scale must be a finite value above -1.0 (got {scale_percent})"
                    )))
                }
            }
            Self::Blur { kernel_size } => {
                if kernel_size % 2 == 1 {
                    Ok(())
                } else {
                    Err(Error::InvalidParameter(format!(
                        "blur kernel size must be odd and positive (got {kernel_size})"
                    )))
                }
            }
        }
    }

    /// Computes the output frame size for an input of `width` x `height`
    pub fn output_dimensions(&self, width: u32, height: u32) -> Result<(u32, u32)> {
        self.validate()?;
        match *self {
            Self::Resize { scale_percent } => {
                let factor = 1.0 + scale_percent;
                let new_width = (width as f64 * factor).round();
                let new_height = (height as f64 * factor).round();
                if new_width < 1.0 || new_height < 1.0 {
                    return Err(Error::InvalidParameter(format!(
                        "resize by {scale_percent} turns {width}x{height} into an empty frame"
                    )));
                }
                if new_width > MAX_FRAME_SIDE as f64 || new_height > MAX_FRAME_SIDE as f64 {
                    return Err(Error::InvalidParameter(format!(
                        "resize by {scale_percent} turns {width}x{height} into \
                         {new_width}x{new_height}, above the {MAX_FRAME_SIDE} pixel limit per side"
                    )));
                }
                Ok((new_width as u32, new_height as u32))
            }
            _ => Ok((width, height)),
        }
    }

    /// The transform set used when nothing else is configured
    pub fn default_set() -> Vec<Self> {
        vec![
            Self::Flip,
            Self::Rotate { degrees: 10.0 },
            Self::Rotate { degrees: -13.0 },
            Self::Translate {
                shift_x: 25,
                shift_y: 0,
            },
            Self::Translate {
                shift_x: -25,
                shift_y: 0,
            },
            Self::Resize {
                scale_percent: -0.2,
            },
            Self::Blur { kernel_size: 5 },
        ]
    }
}

impl fmt::Display for TransformSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flip => write!(f, "flip"),
            Self::Rotate { degrees } => write!(f, "rotate:{}", degrees),
            Self::Translate { shift_x, shift_y } => {
                write!(f, "translate:{},{}", shift_x, shift_y)
            }
            Self::Resize { scale_percent } => write!(f, "resize:{}", scale_percent),
            Self::Blur { kernel_size } => write!(f, "blur:{}", kernel_size),
        }
    }
}

/// Parses `flip`, `rotate:<deg>`, `translate:<dx>,<dy>`, `resize:<fraction>`
/// and `blur:<k>`. Parsed specs are validated.
impl FromStr for TransformSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (name, args) = match s.split_once(':') {
            Some((name, args)) => (name.trim(), Some(args.trim())),
            None => (s, None),
        };

        let spec = match (name.to_ascii_lowercase().as_str(), args) {
            ("flip", None) => Self::Flip,
            ("rotate", Some(args)) => Self::Rotate {
                degrees: parse_number(name, args)?,
            },
            ("translate", Some(args)) => {
                let (x, y) = args.split_once(',').ok_or_else(|| {
                    Error::InvalidParameter(format!(
                        "translate expects '<dx>,<dy>' (got '{args}')"
                    ))
                })?;
                Self::Translate {
                    shift_x: parse_number(name, x)?,
                    shift_y: parse_number(name, y)?,
                }
            }
            ("resize", Some(args)) => Self::Resize {
                scale_percent: parse_number(name, args)?,
            },
            ("blur", Some(args)) => Self::Blur {
                kernel_size: parse_number(name, args)?,
            },
            ("flip", Some(_)) => {
                return Err(Error::InvalidParameter("flip takes no parameters".into()))
            }
            ("rotate" | "translate" | "resize" | "blur", None) => {
                return Err(Error::InvalidParameter(format!(
                    "{name} requires parameters, e.g. '{name}:<value>'"
                )))
            }
            _ => {
                return Err(Error::InvalidParameter(format!(
                    "unknown transform '{name}'"
                )))
            }
        };

        spec.validate()?;
        Ok(spec)
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        Error::InvalidParameter(format!("invalid {name} parameter '{}'", value.trim()))
    })
}
