//! Transform compositing: samples the source through the crop window with
//! rotation, flip and zoom applied about the crop center.
//!
//! The forward mapping from source to output is
//!
//! ```text
//! out = T(output_center) · F(flip) · R(rotation) · Z(zoom) · T(-crop_center) · src
//! ```
//!
//! so flips mirror the already-rotated content. Sampling walks the inverse of
//! that mapping for every output pixel center.

use image::{imageops, Rgba, RgbaImage};
use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{PipelineError, PipelineResult};
use crate::geometry::CropRectangle;
use crate::pipeline::SourceImage;

/// Smallest zoom offered by the interactive zoom control
pub const ZOOM_MIN: f64 = 0.5;
/// Largest zoom offered by the interactive zoom control
pub const ZOOM_MAX: f64 = 3.0;

/// Rotation, flip and zoom applied to the crop window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    /// Clockwise rotation in degrees, normalized to [0, 360)
    #[serde(alias = "rotation")]
    pub rotation_degrees: f64,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    /// Magnification; > 1 samples a smaller source region
    pub zoom: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            rotation_degrees: 0.0,
            flip_horizontal: false,
            flip_vertical: false,
            zoom: 1.0,
        }
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self::default()
    }

    /// Transform with only a rotation, normalized mod 360
    pub fn rotated(degrees: f64) -> Self {
        Self::default().rotate_by(degrees)
    }

    /// Compose a rotation delta: `new = old + delta`, normalized mod 360
    pub fn rotate_by(mut self, delta_degrees: f64) -> Self {
        self.rotation_degrees = normalize_degrees(self.rotation_degrees + delta_degrees);
        self
    }

    /// Toggle the horizontal scale sign
    pub fn flip_horizontally(mut self) -> Self {
        self.flip_horizontal = !self.flip_horizontal;
        self
    }

    /// Toggle the vertical scale sign
    pub fn flip_vertically(mut self) -> Self {
        self.flip_vertical = !self.flip_vertical;
        self
    }

    /// Set zoom from the interactive control, clamped to its range
    pub fn zoom_to(mut self, zoom: f64) -> Self {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(ZOOM_MIN, ZOOM_MAX);
        }
        self
    }

    /// Horizontal scale sign (-1 when flipped)
    pub fn scale_x(&self) -> f64 {
        if self.flip_horizontal {
            -1.0
        } else {
            1.0
        }
    }

    /// Vertical scale sign (-1 when flipped)
    pub fn scale_y(&self) -> f64 {
        if self.flip_vertical {
            -1.0
        } else {
            1.0
        }
    }

    pub fn is_identity(&self) -> bool {
        normalize_degrees(self.rotation_degrees) == 0.0
            && !self.flip_horizontal
            && !self.flip_vertical
            && self.zoom == 1.0
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if !self.rotation_degrees.is_finite() {
            return Err(PipelineError::invalid_param(
                "rotation",
                "rotation must be finite",
            ));
        }
        if !self.zoom.is_finite() || self.zoom <= 0.0 {
            return Err(PipelineError::invalid_param(
                "zoom",
                format!("zoom must be positive and finite, got {}", self.zoom),
            ));
        }
        Ok(())
    }

    /// Inverse mapping: output pixel space to source pixel space
    fn sampling_affine(&self, crop: &CropRectangle) -> Affine {
        let (cx, cy) = crop.center();
        let (sin, cos) = exact_sin_cos(self.rotation_degrees);
        // R(-θ); flips are their own inverse
        let unrotate = Affine::new([cos, -sin, sin, cos, 0.0, 0.0]);

        Affine::translate(Vec2::new(cx, cy))
            * Affine::scale(1.0 / self.zoom)
            * unrotate
            * Affine::scale_non_uniform(self.scale_x(), self.scale_y())
            * Affine::translate(Vec2::new(
                -(crop.width as f64) / 2.0,
                -(crop.height as f64) / 2.0,
            ))
    }
}

/// Normalize any finite angle into [0, 360)
pub fn normalize_degrees(degrees: f64) -> f64 {
    let d = degrees.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}

/// sin/cos with exact values at quarter turns, so 90° steps stay pixel exact
fn exact_sin_cos(degrees: f64) -> (f64, f64) {
    let d = normalize_degrees(degrees);
    if d == 0.0 {
        (0.0, 1.0)
    } else if d == 90.0 {
        (1.0, 0.0)
    } else if d == 180.0 {
        (0.0, -1.0)
    } else if d == 270.0 {
        (-1.0, 0.0)
    } else {
        d.to_radians().sin_cos()
    }
}

/// Sample the crop window of `source` through `transform`.
///
/// The result is always `crop.width` x `crop.height` (after clamping the crop to
/// the source). Output pixels whose sample point falls outside the source are
/// set to `fill`.
pub fn apply(
    source: &SourceImage,
    crop: &CropRectangle,
    transform: &Transform,
    fill: Color,
) -> PipelineResult<RgbaImage> {
    let (src_w, src_h) = source.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(PipelineError::EmptySource {
            width: src_w,
            height: src_h,
        });
    }
    transform.validate()?;

    let window = crop
        .clamp_to(src_w, src_h)
        .ok_or(PipelineError::DegenerateCrop {
            x: crop.x,
            y: crop.y,
            width: crop.width,
            height: crop.height,
        })?;

    if transform.is_identity() {
        return Ok(
            imageops::crop_imm(source.pixels(), window.x, window.y, window.width, window.height)
                .to_image(),
        );
    }

    let inverse = transform.sampling_affine(&window);
    let pixels = source.pixels();
    let fill = fill.to_rgba();

    let out = RgbaImage::from_fn(window.width, window.height, |x, y| {
        let p = inverse * Point::new(x as f64 + 0.5, y as f64 + 0.5);
        sample_bilinear(pixels, p.x, p.y).unwrap_or(fill)
    });

    tracing::debug!(
        rotation = transform.rotation_degrees,
        flip_h = transform.flip_horizontal,
        flip_v = transform.flip_vertical,
        zoom = transform.zoom,
        width = window.width,
        height = window.height,
        "Composited transformed crop window"
    );

    Ok(out)
}

/// Size of the canvas that holds a `width` x `height` raster rotated by
/// `degrees`: `|w·cos| + |h·sin|` by `|w·sin| + |h·cos|`, rounded up.
pub fn rotated_bounds(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    let (sin, cos) = exact_sin_cos(degrees);
    let (w, h) = (width as f64, height as f64);
    // Tolerance keeps float noise from adding a pixel
    let side = |v: f64| (v - 1e-6).ceil().max(1.0) as u32;
    (
        side((w * cos).abs() + (h * sin).abs()),
        side((w * sin).abs() + (h * cos).abs()),
    )
}

/// Rotate the whole raster clockwise by `degrees` onto a canvas enlarged to
/// the rotated bounding box, centered. Canvas corners not covered by the
/// source are set to `fill`. Quarter turns are pixel exact.
pub fn rotate_expanded(source: &RgbaImage, degrees: f64, fill: Color) -> PipelineResult<RgbaImage> {
    let (src_w, src_h) = source.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(PipelineError::EmptySource {
            width: src_w,
            height: src_h,
        });
    }
    if !degrees.is_finite() {
        return Err(PipelineError::invalid_param(
            "rotation",
            "rotation must be finite",
        ));
    }

    let (out_w, out_h) = rotated_bounds(src_w, src_h, degrees);
    let (sin, cos) = exact_sin_cos(degrees);
    let inverse = Affine::translate(Vec2::new(src_w as f64 / 2.0, src_h as f64 / 2.0))
        * Affine::new([cos, -sin, sin, cos, 0.0, 0.0])
        * Affine::translate(Vec2::new(-(out_w as f64) / 2.0, -(out_h as f64) / 2.0));
    let fill = fill.to_rgba();

    let out = RgbaImage::from_fn(out_w, out_h, |x, y| {
        let p = inverse * Point::new(x as f64 + 0.5, y as f64 + 0.5);
        sample_bilinear(source, p.x, p.y).unwrap_or(fill)
    });

    tracing::debug!(
        rotation = degrees,
        source_width = src_w,
        source_height = src_h,
        width = out_w,
        height = out_h,
        "Rotated raster onto expanded canvas"
    );

    Ok(out)
}

/// Bilinear sample at a continuous source position (pixel centers sit at
/// `i + 0.5`). Returns `None` outside the source bounds.
fn sample_bilinear(src: &RgbaImage, sx: f64, sy: f64) -> Option<Rgba<u8>> {
    let (w, h) = (src.width() as f64, src.height() as f64);
    if !(sx >= 0.0 && sy >= 0.0 && sx < w && sy < h) {
        return None;
    }

    let fx = sx - 0.5;
    let fy = sy - 0.5;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = fx - x0;
    let ty = fy - y0;

    let clamp_x = |v: f64| v.clamp(0.0, w - 1.0) as u32;
    let clamp_y = |v: f64| v.clamp(0.0, h - 1.0) as u32;
    let (x0i, x1i) = (clamp_x(x0), clamp_x(x0 + 1.0));
    let (y0i, y1i) = (clamp_y(y0), clamp_y(y0 + 1.0));

    if tx == 0.0 && ty == 0.0 {
        return Some(*src.get_pixel(x0i, y0i));
    }

    let p00 = src.get_pixel(x0i, y0i);
    let p10 = src.get_pixel(x1i, y0i);
    let p01 = src.get_pixel(x0i, y1i);
    let p11 = src.get_pixel(x1i, y1i);

    let mut out = [0u8; 4];
    for (c, slot) in out.iter_mut().enumerate() {
        let top = p00[c] as f64 * (1.0 - tx) + p10[c] as f64 * tx;
        let bottom = p01[c] as f64 * (1.0 - tx) + p11[c] as f64 * tx;
        *slot = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
    }
    Some(Rgba(out))
}
