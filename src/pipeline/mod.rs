//! End-to-end compositing pipeline
//!
//! ```text
//! SourceImage ─▶ transform (crop/rotate/flip/zoom) ─▶ shape mask ─▶ filters ─▶ resize ─▶ encoder
//! ```
//!
//! [`rotate_image`] is the standalone whole-image variant: the full source
//! rotated onto a canvas that fits its rotated bounds, then encoded.
//!
//! Each invocation owns its intermediate rasters and keeps no state between
//! calls, so any number of invocations may run concurrently.

pub mod metrics;
pub mod source;

use std::time::Instant;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::compositor::{self, normalize_degrees, ResizeSpec, ShapeMask, Transform};
use crate::encoder::{self, EncodedImage, OutputSpec};
use crate::error::{PipelineError, PipelineResult};
use crate::filters::{FilterDescriptor, FilterSettings, FilterStack};
use crate::geometry::CropRectangle;

pub use metrics::{PipelineMetrics, StageKind};
pub use source::{SourceImage, SourceLimits};

/// Largest output side processed without explicit opt-in
pub const DEFAULT_MAX_OUTPUT_DIMENSION: u32 = 4096;

/// Everything one invocation needs besides the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub crop: CropRectangle,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub shape: ShapeMask,
    /// Applied in canonical order regardless of list order
    #[serde(default)]
    pub filters: Vec<FilterDescriptor>,
    /// Resample the final raster to exact dimensions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize: Option<ResizeSpec>,
    #[serde(default)]
    pub output: OutputSpec,
}

impl PipelineRequest {
    pub fn new(crop: CropRectangle) -> Self {
        Self {
            crop,
            transform: Transform::default(),
            shape: ShapeMask::default(),
            filters: Vec::new(),
            resize: None,
            output: OutputSpec::default(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_shape(mut self, shape: ShapeMask) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_filters(mut self, filters: Vec<FilterDescriptor>) -> Self {
        self.filters = filters;
        self
    }

    /// Replace the filter list with the effective filters of `settings`
    pub fn with_filter_settings(mut self, settings: &FilterSettings) -> Self {
        self.filters = settings
            .to_ops()
            .iter()
            .filter(|op| !op.is_noop())
            .map(FilterDescriptor::from)
            .collect();
        self
    }

    pub fn with_resize(mut self, width: u32, height: u32) -> Self {
        self.resize = Some(ResizeSpec::new(width, height));
        self
    }

    pub fn with_output(mut self, output: OutputSpec) -> Self {
        self.output = output;
        self
    }
}

/// Resource guard rails for a single invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub max_output_dimension: u32,
    /// Process outputs above `max_output_dimension` anyway
    pub allow_large_output: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_output_dimension: DEFAULT_MAX_OUTPUT_DIMENSION,
            allow_large_output: false,
        }
    }
}

impl PipelineOptions {
    pub fn check_output(&self, width: u32, height: u32) -> PipelineResult<()> {
        if !self.allow_large_output
            && (width > self.max_output_dimension || height > self.max_output_dimension)
        {
            return Err(PipelineError::OutputTooLarge {
                width,
                height,
                max_dimension: self.max_output_dimension,
            });
        }
        Ok(())
    }
}

/// Encoded output plus what it took to produce it
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub encoded: EncodedImage,
    pub metrics: PipelineMetrics,
}

/// Composite, mask and filter without encoding.
///
/// The returned raster is `crop.width` x `crop.height` for rectangles and the
/// centered `min(w, h)` square for circles.
pub fn render(
    source: &SourceImage,
    request: &PipelineRequest,
    options: &PipelineOptions,
) -> PipelineResult<RgbaImage> {
    let stack = FilterStack::from_descriptors(&request.filters)?;
    render_with_stack(source, request, &stack, options)
}

fn render_with_stack(
    source: &SourceImage,
    request: &PipelineRequest,
    stack: &FilterStack,
    options: &PipelineOptions,
) -> PipelineResult<RgbaImage> {
    let (src_w, src_h) = source.dimensions();
    if let Some(window) = request.crop.clamp_to(src_w, src_h) {
        let (w, h) = request.shape.output_dimensions(window.width, window.height);
        options.check_output(w, h)?;
    }
    if let Some(resize) = &request.resize {
        resize.validate()?;
        options.check_output(resize.width, resize.height)?;
    }

    let fill = request.output.fill_color();
    let raster = compositor::apply_transform(source, &request.crop, &request.transform, fill)?;
    let raster = compositor::trim_to_shape(raster, request.shape);
    let raster = compositor::mask(raster, request.shape, fill);
    let raster = stack.apply(raster);
    match &request.resize {
        Some(resize) => compositor::resize(raster, resize),
        None => Ok(raster),
    }
}

/// Run the full pipeline and encode the result
pub fn process(
    source: &SourceImage,
    request: &PipelineRequest,
    options: &PipelineOptions,
) -> PipelineResult<ProcessedImage> {
    let start = Instant::now();

    // Validate filters before any pixel work
    let stack = FilterStack::from_descriptors(&request.filters)?;
    let raster = render_with_stack(source, request, &stack, options)?;
    let encoded = encoder::encode(&raster, &request.output)?;

    let transform = &request.transform;
    let (src_w, src_h) = source.dimensions();
    let metrics = PipelineMetrics::builder()
        .source_size(source.byte_len())
        .output_size(encoded.len())
        .source_dimensions(src_w, src_h)
        .output_dimensions(encoded.width, encoded.height)
        .output_format(request.output.format)
        .stage(StageKind::Crop)
        .stage_if(normalize_degrees(transform.rotation_degrees) != 0.0, StageKind::Rotate)
        .stage_if(
            transform.flip_horizontal || transform.flip_vertical,
            StageKind::Flip,
        )
        .stage_if(transform.zoom != 1.0, StageKind::Zoom)
        .stage_if(request.shape != ShapeMask::Rectangle, StageKind::ShapeMask)
        .stage_if(!stack.is_empty(), StageKind::Filters)
        .stage_if(request.resize.is_some(), StageKind::Resize)
        .stage(StageKind::Encode)
        .filter_count(stack.ops().len())
        .processing_time(start.elapsed())
        .build();

    tracing::info!(
        source_width = src_w,
        source_height = src_h,
        output_width = encoded.width,
        output_height = encoded.height,
        format = encoded.format.as_str(),
        bytes = encoded.len(),
        stages = ?metrics.stage_labels(),
        elapsed_ms = metrics.processing_time.as_millis() as u64,
        "Processed image"
    );

    Ok(ProcessedImage { encoded, metrics })
}

/// Rotate the whole source clockwise by `degrees` onto a canvas enlarged to
/// the rotated bounding box and encode it.
///
/// Uncovered canvas corners take `output`'s fill color. The canvas is held
/// to the same output ceiling as [`process`].
pub fn rotate_image(
    source: &SourceImage,
    degrees: f64,
    output: &OutputSpec,
    options: &PipelineOptions,
) -> PipelineResult<ProcessedImage> {
    let start = Instant::now();
    let (src_w, src_h) = source.dimensions();
    if degrees.is_finite() && src_w > 0 && src_h > 0 {
        let (w, h) = compositor::rotated_bounds(src_w, src_h, degrees);
        options.check_output(w, h)?;
    }

    let raster = compositor::rotate_expanded(source.pixels(), degrees, output.fill_color())?;
    let encoded = encoder::encode(&raster, output)?;

    let metrics = PipelineMetrics::builder()
        .source_size(source.byte_len())
        .output_size(encoded.len())
        .source_dimensions(src_w, src_h)
        .output_dimensions(encoded.width, encoded.height)
        .output_format(output.format)
        .stage_if(normalize_degrees(degrees) != 0.0, StageKind::Rotate)
        .stage(StageKind::Encode)
        .processing_time(start.elapsed())
        .build();

    tracing::info!(
        rotation = degrees,
        source_width = src_w,
        source_height = src_h,
        output_width = encoded.width,
        output_height = encoded.height,
        format = encoded.format.as_str(),
        bytes = encoded.len(),
        "Rotated image"
    );

    Ok(ProcessedImage { encoded, metrics })
}
