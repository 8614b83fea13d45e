//! Raster encoding
//!
//! - PNG: lossless, quality ignored, alpha kept
//! - JPEG / WebP: lossy, quality clamped to [0.1, 1.0], alpha flattened
//!   against the background color first
//!
//! Encoders sit behind the object-safe [`ImageEncoder`] trait and are picked
//! by [`EncoderFactory`].

pub mod output;

use std::io::Cursor;

use image::{ColorType, ImageEncoder as _, RgbaImage};

use crate::color::{flatten_over, Color};
use crate::error::{PipelineError, PipelineResult};

pub use output::{EncodedImage, OutputFormat, OutputSpec, MAX_QUALITY, MIN_LOSSY_QUALITY};

/// Trait for image encoders
pub trait ImageEncoder: Send + Sync {
    /// The output format this encoder produces
    fn format(&self) -> OutputFormat;

    /// Encode `raster` according to `spec`
    fn encode(&self, raster: &RgbaImage, spec: &OutputSpec) -> PipelineResult<EncodedImage>;

    /// Whether alpha survives encoding
    fn supports_transparency(&self) -> bool {
        self.format().supports_transparency()
    }
}

/// JPEG encoder using the image crate
pub struct JpegEncoder;

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }

    fn encode(&self, raster: &RgbaImage, spec: &OutputSpec) -> PipelineResult<EncodedImage> {
        use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;

        let (width, height) = ensure_non_empty(raster, OutputFormat::Jpeg)?;
        let rgb = flatten_to_rgb(raster, spec.background_color);
        let quality = (spec.lossy_quality() * 100.0).round().clamp(1.0, 100.0) as u8;

        let mut output = Cursor::new(Vec::new());
        ImageJpegEncoder::new_with_quality(&mut output, quality)
            .write_image(&rgb, width, height, ColorType::Rgb8)
            .map_err(|e| PipelineError::encoding("jpeg", e.to_string()))?;

        Ok(EncodedImage::new(
            output.into_inner(),
            OutputFormat::Jpeg,
            width,
            height,
        ))
    }
}

/// PNG encoder using the image crate
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }

    fn encode(&self, raster: &RgbaImage, _spec: &OutputSpec) -> PipelineResult<EncodedImage> {
        use image::codecs::png::PngEncoder as ImagePngEncoder;

        let (width, height) = ensure_non_empty(raster, OutputFormat::Png)?;

        let mut output = Cursor::new(Vec::new());
        ImagePngEncoder::new(&mut output)
            .write_image(raster.as_raw(), width, height, ColorType::Rgba8)
            .map_err(|e| PipelineError::encoding("png", e.to_string()))?;

        Ok(EncodedImage::new(
            output.into_inner(),
            OutputFormat::Png,
            width,
            height,
        ))
    }
}

/// Largest side libwebp accepts
pub const WEBP_MAX_DIMENSION: u32 = 16383;

/// Lossy WebP encoder using libwebp through the `webp` crate
///
/// The image crate only writes lossless WebP, which cannot honor a quality
/// setting.
pub struct WebPEncoder;

impl ImageEncoder for WebPEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::WebP
    }

    fn encode(&self, raster: &RgbaImage, spec: &OutputSpec) -> PipelineResult<EncodedImage> {
        let (width, height) = ensure_non_empty(raster, OutputFormat::WebP)?;
        if width > WEBP_MAX_DIMENSION || height > WEBP_MAX_DIMENSION {
            return Err(PipelineError::encoding(
                "webp",
                format!(
                    "{}x{} exceeds the WebP limit of {} pixels per side",
                    width, height, WEBP_MAX_DIMENSION
                ),
            ));
        }
        let rgb = flatten_to_rgb(raster, spec.background_color);

        let memory = webp::Encoder::from_rgb(&rgb, width, height)
            .encode_simple(false, spec.lossy_quality() * 100.0)
            .map_err(|e| PipelineError::encoding("webp", format!("{:?}", e)))?;
        if memory.is_empty() {
            return Err(PipelineError::encoding("webp", "encoder produced no output"));
        }

        Ok(EncodedImage::new(
            memory.to_vec(),
            OutputFormat::WebP,
            width,
            height,
        ))
    }
}

/// Factory for creating encoders based on output format
pub struct EncoderFactory;

impl EncoderFactory {
    pub fn create(format: OutputFormat) -> Box<dyn ImageEncoder> {
        match format {
            OutputFormat::Png => Box::new(PngEncoder),
            OutputFormat::Jpeg => Box::new(JpegEncoder),
            OutputFormat::WebP => Box::new(WebPEncoder),
        }
    }
}

/// Encode `raster` with the encoder for `spec.format`
pub fn encode(raster: &RgbaImage, spec: &OutputSpec) -> PipelineResult<EncodedImage> {
    let encoded = EncoderFactory::create(spec.format).encode(raster, spec)?;

    tracing::debug!(
        format = spec.format.as_str(),
        quality = spec.lossy_quality(),
        width = encoded.width,
        height = encoded.height,
        bytes = encoded.len(),
        "Encoded image"
    );

    Ok(encoded)
}

fn ensure_non_empty(raster: &RgbaImage, format: OutputFormat) -> PipelineResult<(u32, u32)> {
    let (width, height) = raster.dimensions();
    if width == 0 || height == 0 {
        return Err(PipelineError::encoding(
            format.as_str(),
            format!("cannot encode a {}x{} raster", width, height),
        ));
    }
    Ok((width, height))
}

/// Flatten alpha against `background` and drop the alpha channel
fn flatten_to_rgb(raster: &RgbaImage, background: Color) -> Vec<u8> {
    let background = background.opaque();
    let mut rgb = Vec::with_capacity(raster.as_raw().len() / 4 * 3);
    for px in raster.pixels() {
        let flat = flatten_over(*px, background);
        rgb.extend_from_slice(&flat.0[..3]);
    }
    rgb
}
