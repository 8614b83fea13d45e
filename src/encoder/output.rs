//! Output format and encoding options

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::PipelineError;

/// Lowest quality lossy encoders will accept
pub const MIN_LOSSY_QUALITY: f32 = 0.1;
/// Highest quality
pub const MAX_QUALITY: f32 = 1.0;

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    #[default]
    #[serde(alias = "jpg")]
    Jpeg,
    #[serde(alias = "WebP")]
    WebP,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::WebP => "webp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Whether the encoded output keeps an alpha channel
    pub fn supports_transparency(&self) -> bool {
        matches!(self, Self::Png)
    }

    pub fn is_lossy(&self) -> bool {
        matches!(self, Self::Jpeg | Self::WebP)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "png" | "image/png" => Ok(OutputFormat::Png),
            "jpeg" | "jpg" | "image/jpeg" => Ok(OutputFormat::Jpeg),
            "webp" | "image/webp" => Ok(OutputFormat::WebP),
            _ => Err(PipelineError::invalid_param(
                "format",
                format!("unknown format: {}", s),
            )),
        }
    }
}

fn default_quality() -> f32 {
    0.8
}

/// How the final raster is encoded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    #[serde(default)]
    pub format: OutputFormat,
    /// 0.0..=1.0, ignored for PNG
    #[serde(default = "default_quality")]
    pub quality: f32,
    /// Flattening color for lossy formats and fill for uncovered pixels
    #[serde(default, alias = "backgroundColor")]
    pub background_color: Color,
    /// Keep uncovered pixels transparent when the format allows it
    #[serde(default, alias = "preserveAlpha")]
    pub preserve_alpha: bool,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            quality: default_quality(),
            background_color: Color::white(),
            preserve_alpha: false,
        }
    }
}

impl OutputSpec {
    pub fn new(format: OutputFormat, quality: f32) -> Self {
        Self {
            format,
            quality,
            ..Self::default()
        }
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_preserve_alpha(mut self, preserve: bool) -> Self {
        self.preserve_alpha = preserve;
        self
    }

    /// Quality as handed to a lossy codec, clamped to [0.1, 1.0]
    pub fn lossy_quality(&self) -> f32 {
        if self.quality.is_nan() {
            return MAX_QUALITY;
        }
        self.quality.clamp(MIN_LOSSY_QUALITY, MAX_QUALITY)
    }

    /// Color for pixels with no source coverage (out-of-bounds samples and
    /// masked-out regions)
    pub fn fill_color(&self) -> Color {
        if self.preserve_alpha && self.format.supports_transparency() {
            Color::transparent()
        } else {
            self.background_color.opaque()
        }
    }
}

/// Encoded output buffer
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: OutputFormat,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn new(data: Vec<u8>, format: OutputFormat, width: u32, height: u32) -> Self {
        Self {
            data,
            format,
            mime_type: format.mime_type(),
            width,
            height,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }
}
