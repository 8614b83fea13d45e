//! Shape masking.
//!
//! A circle mask keeps pixels whose center lies within `min(w, h) / 2` of the
//! raster center and paints everything else with the fill color. Rectangle is
//! the identity.

use std::fmt;
use std::str::FromStr;

use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::PipelineError;

/// Output shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeMask {
    #[default]
    #[serde(alias = "rect")]
    Rectangle,
    #[serde(alias = "round")]
    Circle,
}

impl ShapeMask {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeMask::Rectangle => "rectangle",
            ShapeMask::Circle => "circle",
        }
    }

    /// Output dimensions after [`trim_to_shape`]
    pub fn output_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        match self {
            ShapeMask::Rectangle => (width, height),
            ShapeMask::Circle => {
                let side = width.min(height);
                (side, side)
            }
        }
    }
}

impl fmt::Display for ShapeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeMask {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rectangle" | "rect" => Ok(ShapeMask::Rectangle),
            "circle" | "round" => Ok(ShapeMask::Circle),
            other => Err(PipelineError::invalid_param(
                "shape",
                format!("unknown shape: {}", other),
            )),
        }
    }
}

/// Center-trim a raster to the bounding box of its shape.
///
/// Circles are cut from the centered `min(w, h)` square; rectangles pass
/// through untouched.
pub fn trim_to_shape(raster: RgbaImage, shape: ShapeMask) -> RgbaImage {
    let (w, h) = raster.dimensions();
    let (tw, th) = shape.output_dimensions(w, h);
    if (tw, th) == (w, h) {
        return raster;
    }
    imageops::crop_imm(&raster, (w - tw) / 2, (h - th) / 2, tw, th).to_image()
}

/// Apply `shape` to `raster`, painting excluded pixels with `fill`.
///
/// Dimensions are preserved, and masking an already masked raster with the
/// same shape and fill is a no-op.
pub fn mask(mut raster: RgbaImage, shape: ShapeMask, fill: Color) -> RgbaImage {
    if shape == ShapeMask::Rectangle {
        return raster;
    }

    let (w, h) = raster.dimensions();
    let cx = w as f64 / 2.0;
    let cy = h as f64 / 2.0;
    let radius = w.min(h) as f64 / 2.0;
    let radius_sq = radius * radius;
    let fill = fill.to_rgba();

    for (x, y, px) in raster.enumerate_pixels_mut() {
        let dx = x as f64 + 0.5 - cx;
        let dy = y as f64 + 0.5 - cy;
        if dx * dx + dy * dy > radius_sq {
            *px = fill;
        }
    }

    raster
}
