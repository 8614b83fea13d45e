//! Source image loading and validation
//!
//! Provides:
//! - File size and type checks before decoding
//! - Image bomb protection (dimension validation from the header)
//! - Decoding to a straight-alpha RGBA8 raster

use std::io::Cursor;
use std::path::Path;

use image::io::Reader as ImageReader;
use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// MIME types accepted by default
pub const DEFAULT_ACCEPTED_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Limits applied to incoming source images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceLimits {
    /// Maximum encoded file size in bytes
    pub max_file_size: usize,
    /// Maximum decoded width
    pub max_source_width: u32,
    /// Maximum decoded height
    pub max_source_height: u32,
    /// Maximum decoded pixel count (width * height)
    pub max_source_pixels: u64,
    /// Accepted MIME types
    pub accepted_types: Vec<String>,
}

impl Default for SourceLimits {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10MB
            max_source_width: 10000,
            max_source_height: 10000,
            max_source_pixels: 100_000_000, // 100 megapixels
            accepted_types: DEFAULT_ACCEPTED_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SourceLimits {
    pub fn validate_file_size(&self, size: usize) -> PipelineResult<()> {
        if size > self.max_file_size {
            return Err(PipelineError::FileTooLarge {
                size,
                max_size: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Reject formats whose MIME type is not accepted
    pub fn validate_format(&self, format: ImageFormat) -> PipelineResult<()> {
        let mime = mime_type(format);
        if self.accepted_types.iter().any(|t| t.eq_ignore_ascii_case(mime)) {
            Ok(())
        } else {
            Err(PipelineError::unsupported_format(mime))
        }
    }

    /// Validate decoded dimensions against the limits
    pub fn validate_dimensions(&self, width: u32, height: u32) -> PipelineResult<()> {
        let pixels = width as u64 * height as u64;
        if width > self.max_source_width
            || height > self.max_source_height
            || pixels > self.max_source_pixels
        {
            return Err(PipelineError::source_too_large(
                width,
                height,
                self.max_source_pixels,
            ));
        }
        Ok(())
    }
}

/// MIME type for a decoded container format
pub fn mime_type(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Avif => "image/avif",
        ImageFormat::Ico => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// Decoded source raster
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pixels: RgbaImage,
    format: Option<ImageFormat>,
    byte_len: usize,
}

impl SourceImage {
    /// Wrap an already decoded raster
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self {
            pixels,
            format: None,
            byte_len: 0,
        }
    }

    /// Validate and decode encoded image bytes
    pub fn decode(data: &[u8], limits: &SourceLimits) -> PipelineResult<Self> {
        limits.validate_file_size(data.len())?;

        let format = image::guess_format(data)
            .map_err(|_| PipelineError::unsupported_format("unknown"))?;
        limits.validate_format(format)?;

        // Check the header before allocating the full raster
        let (width, height) = ImageReader::with_format(Cursor::new(data), format)
            .into_dimensions()
            .map_err(|e| PipelineError::decode_failed(e.to_string()))?;
        limits.validate_dimensions(width, height)?;

        let decoded = ImageReader::with_format(Cursor::new(data), format)
            .decode()
            .map_err(|e| PipelineError::decode_failed(e.to_string()))?;

        tracing::debug!(
            format = mime_type(format),
            width = width,
            height = height,
            bytes = data.len(),
            "Decoded source image"
        );

        Ok(Self {
            pixels: decoded.to_rgba8(),
            format: Some(format),
            byte_len: data.len(),
        })
    }

    /// Read and decode an image file
    pub fn open(path: impl AsRef<Path>, limits: &SourceLimits) -> PipelineResult<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)
            .map_err(|e| PipelineError::decode_failed(format!("{}: {}", path.display(), e)))?;
        limits.validate_file_size(metadata.len() as usize)?;

        let data = std::fs::read(path)
            .map_err(|e| PipelineError::decode_failed(format!("{}: {}", path.display(), e)))?;
        Self::decode(&data, limits)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_pixels(self) -> RgbaImage {
        self.pixels
    }

    /// Container format the image was decoded from, if any
    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    /// Size of the encoded input in bytes (0 when constructed from pixels)
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }
}
