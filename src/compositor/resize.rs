//! Output resizing to explicit target dimensions

use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::color::{is_opaque, premultiply, unpremultiply};
use crate::error::{PipelineError, PipelineResult};

/// Exact output size; aspect ratio is not preserved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResizeSpec {
    pub width: u32,
    pub height: u32,
}

impl ResizeSpec {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.width == 0 {
            return Err(PipelineError::invalid_dimension("resize.width", 0.0));
        }
        if self.height == 0 {
            return Err(PipelineError::invalid_dimension("resize.height", 0.0));
        }
        Ok(())
    }
}

/// Resample `raster` to exactly `spec.width` x `spec.height` with a bilinear
/// (triangle) filter. Transparent rasters are resampled premultiplied.
pub fn resize(raster: RgbaImage, spec: &ResizeSpec) -> PipelineResult<RgbaImage> {
    spec.validate()?;
    if raster.dimensions() == (spec.width, spec.height) {
        return Ok(raster);
    }

    let (from_w, from_h) = raster.dimensions();
    let out = if is_opaque(&raster) {
        imageops::resize(&raster, spec.width, spec.height, FilterType::Triangle)
    } else {
        let resized = imageops::resize(
            &premultiply(&raster),
            spec.width,
            spec.height,
            FilterType::Triangle,
        );
        unpremultiply(&resized)
    };

    tracing::debug!(
        from_width = from_w,
        from_height = from_h,
        width = spec.width,
        height = spec.height,
        "Resized raster"
    );

    Ok(out)
}
