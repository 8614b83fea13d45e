//! Crop geometry
//!
//! Turns aspect-ratio, lock and dimension-edit requests into a concrete
//! [`CropRectangle`] in source-pixel space:
//! - Dimension edits with optional aspect-ratio lock ([`resolve`])
//! - Re-deriving a rectangle when the constraint changes ([`reconstrain`])
//! - Largest centered rectangle for a constraint ([`default_crop`])
//! - Carrying a crop over to an image of a different size ([`scale_crop`])
//!
//! Rectangles are always axis-aligned in the pre-rotation source frame. Rotation
//! is a separate stage and is never baked into the rectangle.

pub mod aspect;

pub use aspect::AspectRatio;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Crop rectangle in source-pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropRectangle {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRectangle {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole `width` x `height` image
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// Center point in source coordinates
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Whether the rectangle is non-empty and lies entirely inside the bounds
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        !self.is_empty() && self.right() <= width as u64 && self.bottom() <= height as u64
    }

    /// Check the rectangle against source bounds after an unlocked edit
    pub fn validate_within(&self, width: u32, height: u32) -> PipelineResult<()> {
        if self.is_empty() {
            return Err(PipelineError::DegenerateCrop {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
            });
        }
        if !self.fits_within(width, height) {
            return Err(PipelineError::invalid_param(
                "crop",
                format!(
                    "{}x{} at ({}, {}) exceeds source bounds {}x{}",
                    self.width, self.height, self.x, self.y, width, height
                ),
            ));
        }
        Ok(())
    }

    /// Intersection with a `width` x `height` image, `None` when nothing remains
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<CropRectangle> {
        let x = self.x.min(width);
        let y = self.y.min(height);
        let right = self.right().min(width as u64) as u32;
        let bottom = self.bottom().min(height as u64) as u32;

        let clamped = CropRectangle::new(x, y, right - x, bottom - y);
        (!clamped.is_empty()).then_some(clamped)
    }
}

/// Which side of the crop box a user edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Width,
    Height,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Width => "width",
            Dimension::Height => "height",
        }
    }
}

/// A single width or height edit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionEdit {
    pub dimension: Dimension,
    pub new_value: f64,
}

impl DimensionEdit {
    pub fn width(new_value: f64) -> Self {
        Self {
            dimension: Dimension::Width,
            new_value,
        }
    }

    pub fn height(new_value: f64) -> Self {
        Self {
            dimension: Dimension::Height,
            new_value,
        }
    }
}

/// Convert a requested length to whole pixels, rejecting anything that is not
/// a finite positive value
fn to_pixels(dimension: Dimension, value: f64) -> PipelineResult<u32> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PipelineError::invalid_dimension(dimension.as_str(), value));
    }
    let rounded = value.round();
    if rounded < 1.0 || rounded > u32::MAX as f64 {
        return Err(PipelineError::invalid_dimension(dimension.as_str(), value));
    }
    Ok(rounded as u32)
}

/// Apply a width/height edit to `current`.
///
/// With `lock_enabled` and a constraint, the counterpart dimension is
/// recomputed (`height = round(width / ratio)`, `width = round(height * ratio)`).
/// Otherwise only the edited side changes. The origin never moves, so the
/// caller must re-validate against source bounds afterwards
/// ([`CropRectangle::validate_within`]).
///
/// On error `current` is left untouched; the function never clamps.
pub fn resolve(
    current: &CropRectangle,
    constraint: Option<AspectRatio>,
    edit: DimensionEdit,
    lock_enabled: bool,
) -> PipelineResult<CropRectangle> {
    let value = to_pixels(edit.dimension, edit.new_value)?;
    let mut next = *current;

    match (edit.dimension, constraint.filter(|_| lock_enabled)) {
        (Dimension::Width, Some(ratio)) => {
            let height = value as f64 / ratio.value();
            next.width = value;
            next.height = to_pixels(Dimension::Height, height)?;
        }
        (Dimension::Height, Some(ratio)) => {
            let width = value as f64 * ratio.value();
            next.height = value;
            next.width = to_pixels(Dimension::Width, width)?;
        }
        (Dimension::Width, None) => next.width = value,
        (Dimension::Height, None) => next.height = value,
    }

    tracing::debug!(
        dimension = edit.dimension.as_str(),
        value = value,
        locked = lock_enabled && constraint.is_some(),
        width = next.width,
        height = next.height,
        "Resolved crop dimension edit"
    );

    Ok(next)
}

/// Largest `width` x `height` box with the given ratio that fits inside
/// `max_width` x `max_height`. One side always equals its bound.
fn inscribed_size(max_width: u32, max_height: u32, ratio: AspectRatio) -> (u32, u32) {
    let r = ratio.value();
    let width_from_height = (max_height as f64 * r).round();

    if width_from_height <= max_width as f64 {
        // Height is the binding side
        (width_from_height.max(1.0) as u32, max_height)
    } else {
        let height_from_width = (max_width as f64 / r).round().min(max_height as f64);
        (max_width, height_from_width.max(1.0) as u32)
    }
}

/// Re-derive a rectangle for a new constraint without a dimension edit.
///
/// The shorter side is kept whenever the recomputed side still fits inside the
/// current box; otherwise the longer side is kept. Either way the result is the
/// largest rectangle of the new ratio inside the current box, centered on it.
/// A `None` constraint leaves the rectangle unchanged.
pub fn reconstrain(
    current: &CropRectangle,
    constraint: Option<AspectRatio>,
) -> PipelineResult<CropRectangle> {
    if current.is_empty() {
        return Err(PipelineError::DegenerateCrop {
            x: current.x,
            y: current.y,
            width: current.width,
            height: current.height,
        });
    }

    let Some(ratio) = constraint else {
        return Ok(*current);
    };

    let (width, height) = inscribed_size(current.width, current.height, ratio);
    let x = current.x + (current.width - width) / 2;
    let y = current.y + (current.height - height) / 2;

    Ok(CropRectangle::new(x, y, width, height))
}

/// Largest rectangle satisfying `constraint`, centered in a source image.
pub fn default_crop(
    source_width: u32,
    source_height: u32,
    constraint: Option<AspectRatio>,
) -> PipelineResult<CropRectangle> {
    if source_width == 0 || source_height == 0 {
        return Err(PipelineError::EmptySource {
            width: source_width,
            height: source_height,
        });
    }
    reconstrain(&CropRectangle::full(source_width, source_height), constraint)
}

/// Carry a crop drawn on a reference image over to a target image.
///
/// Position and size are scaled independently along each axis by the ratio of
/// the images' natural pixel dimensions, then clamped to the target bounds.
pub fn scale_crop(
    crop: &CropRectangle,
    reference: (u32, u32),
    target: (u32, u32),
) -> PipelineResult<CropRectangle> {
    let (ref_w, ref_h) = reference;
    let (target_w, target_h) = target;

    if ref_w == 0 || ref_h == 0 {
        return Err(PipelineError::EmptySource {
            width: ref_w,
            height: ref_h,
        });
    }
    if target_w == 0 || target_h == 0 {
        return Err(PipelineError::EmptySource {
            width: target_w,
            height: target_h,
        });
    }

    let sx = target_w as f64 / ref_w as f64;
    let sy = target_h as f64 / ref_h as f64;

    let scaled = CropRectangle::new(
        (crop.x as f64 * sx).round() as u32,
        (crop.y as f64 * sy).round() as u32,
        ((crop.width as f64 * sx).round() as u32).max(1),
        ((crop.height as f64 * sy).round() as u32).max(1),
    );

    scaled
        .clamp_to(target_w, target_h)
        .ok_or(PipelineError::DegenerateCrop {
            x: scaled.x,
            y: scaled.y,
            width: scaled.width,
            height: scaled.height,
        })
}
