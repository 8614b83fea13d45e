//! RGBA color values, hex parsing and per-pixel blending.
//!
//! Colors appear in configuration as hex strings (`#RGB`, `#RRGGBB` or
//! `#RRGGBBAA`) and are carried through the pipeline as straight (non
//! premultiplied) RGBA8.

use std::fmt;
use std::str::FromStr;

use image::{ImageBuffer, Rgba, Rgba32FImage, RgbaImage};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PipelineError;

/// Straight-alpha RGBA8 color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// White color.
    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Black color.
    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    pub const fn transparent() -> Self {
        Self::with_alpha(0, 0, 0, 0)
    }

    /// Same color, fully opaque.
    pub const fn opaque(self) -> Self {
        Self { a: 255, ..self }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::white()
    }
}

impl From<Rgba<u8>> for Color {
    fn from(px: Rgba<u8>) -> Self {
        Self::with_alpha(px[0], px[1], px[2], px[3])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex_color(s)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_hex_color(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse a hex color string.
///
/// # Examples
///
/// ```
/// use kirinuki::color::{parse_hex_color, Color};
///
/// assert_eq!(parse_hex_color("#FFF").unwrap(), Color::white());
/// assert_eq!(parse_hex_color("#ff000080").unwrap(), Color::with_alpha(255, 0, 0, 128));
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Color, PipelineError> {
    let digits = hex
        .trim()
        .strip_prefix('#')
        .ok_or_else(|| PipelineError::invalid_param("color", "color must start with '#'"))?;

    if !digits.is_ascii() {
        return Err(PipelineError::invalid_param("color", "invalid hex digit"));
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| PipelineError::invalid_param("color", "invalid hex digit"))
    };

    match digits.len() {
        3 => {
            // #RGB: each digit doubled, 0xF -> 0xFF
            Ok(Color::new(
                channel(0..1)? * 17,
                channel(1..2)? * 17,
                channel(2..3)? * 17,
            ))
        }
        6 => Ok(Color::new(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        8 => Ok(Color::with_alpha(
            channel(0..2)?,
            channel(2..4)?,
            channel(4..6)?,
            channel(6..8)?,
        )),
        n => Err(PipelineError::invalid_param(
            "color",
            format!("color must be #RGB, #RRGGBB or #RRGGBBAA, got {} digits", n),
        )),
    }
}

/// Composite `foreground` over an opaque `background` color, returning an
/// opaque pixel.
///
/// Uses the "over" operator with straight alpha. Fully opaque pixels pass
/// through unchanged.
pub fn flatten_over(foreground: Rgba<u8>, background: Color) -> Rgba<u8> {
    let alpha = foreground[3];
    if alpha == 255 {
        return foreground;
    }

    let fg_alpha = alpha as f32 / 255.0;
    let blend_channel = |fg: u8, bg: u8| -> u8 {
        (fg as f32 * fg_alpha + bg as f32 * (1.0 - fg_alpha))
            .round()
            .clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background.r),
        blend_channel(foreground[1], background.g),
        blend_channel(foreground[2], background.b),
        255,
    ])
}

/// Multiply-blend a layer of `color` with coverage `coverage` (0.0 to 1.0)
/// onto an opaque backdrop pixel. Alpha is left untouched.
pub fn multiply_over(backdrop: Rgba<u8>, color: Color, coverage: f32) -> Rgba<u8> {
    let t = coverage.clamp(0.0, 1.0) * (color.a as f32 / 255.0);
    if t <= 0.0 {
        return backdrop;
    }

    let blend_channel = |cb: u8, cs: u8| -> u8 {
        let cb = cb as f32;
        (cb * (1.0 - t) + cb * (cs as f32 / 255.0) * t)
            .round()
            .clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(backdrop[0], color.r),
        blend_channel(backdrop[1], color.g),
        blend_channel(backdrop[2], color.b),
        backdrop[3],
    ])
}

/// Whether every pixel is fully opaque
pub fn is_opaque(raster: &RgbaImage) -> bool {
    raster.pixels().all(|px| px[3] == u8::MAX)
}

/// Convert to premultiplied RGBA in 0.0..=1.0, for resampling that must not
/// pull color out of transparent pixels
pub fn premultiply(raster: &RgbaImage) -> Rgba32FImage {
    let (w, h) = raster.dimensions();
    ImageBuffer::from_fn(w, h, |x, y| {
        let px = raster.get_pixel(x, y);
        let a = px[3] as f32 / 255.0;
        Rgba([
            px[0] as f32 / 255.0 * a,
            px[1] as f32 / 255.0 * a,
            px[2] as f32 / 255.0 * a,
            a,
        ])
    })
}

/// Inverse of [`premultiply`]. Fully transparent pixels become `(0, 0, 0, 0)`.
pub fn unpremultiply(raster: &Rgba32FImage) -> RgbaImage {
    let to_u8 = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    let (w, h) = raster.dimensions();
    RgbaImage::from_fn(w, h, |x, y| {
        let px = raster.get_pixel(x, y);
        let a = px[3];
        if a <= f32::EPSILON {
            return Rgba([0, 0, 0, 0]);
        }
        Rgba([to_u8(px[0] / a), to_u8(px[1] / a), to_u8(px[2] / a), to_u8(a)])
    })
}
