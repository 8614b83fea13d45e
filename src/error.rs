//! Pipeline error types
//!
//! Every stage reports failures synchronously through [`PipelineError`]. There is
//! no partial output: a stage either returns a complete raster or an error.

use thiserror::Error;

/// Errors that can occur while resolving geometry, compositing, filtering or encoding
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    // === Geometry ===
    /// A requested crop dimension is zero, negative or not finite
    #[error("Invalid dimension for {dimension}: {value}")]
    InvalidDimension { dimension: String, value: f64 },

    // === Compositing ===
    /// The source raster has zero width or height
    #[error("Source image is empty ({width}x{height})")]
    EmptySource { width: u32, height: u32 },
    /// The crop rectangle has no area once clamped to the source
    #[error("Crop rectangle {width}x{height} at ({x}, {y}) is degenerate")]
    DegenerateCrop {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    // === Filters ===
    /// A filter descriptor names a kind this pipeline does not implement
    #[error("Unsupported filter kind: {kind}")]
    UnsupportedFilterKind { kind: String },

    // === Encoding ===
    /// The codec could not produce output
    #[error("Failed to encode to {format}: {message}")]
    EncodingError { format: String, message: String },

    // === Source validation ===
    /// Source bytes could not be decoded
    #[error("Failed to decode image: {message}")]
    DecodeFailed { message: String },
    /// Source format is not one of the accepted types
    #[error("Unsupported image format: {format}")]
    UnsupportedFormat { format: String },
    /// Source file exceeds the configured size limit
    #[error("File size {size} bytes exceeds maximum {max_size} bytes")]
    FileTooLarge { size: usize, max_size: usize },
    /// Decoded source dimensions exceed the configured limits
    #[error("Image dimensions {width}x{height} ({pixels} pixels) exceed limit of {max_pixels} pixels")]
    SourceTooLarge {
        width: u32,
        height: u32,
        pixels: u64,
        max_pixels: u64,
    },
    /// Output raster exceeds the dimension ceiling and the caller did not opt in
    #[error("Output {width}x{height} exceeds the {max_dimension}px ceiling")]
    OutputTooLarge {
        width: u32,
        height: u32,
        max_dimension: u32,
    },

    // === Parameters ===
    /// A parameter is outside its documented range or malformed
    #[error("Invalid parameter '{param}': {message}")]
    InvalidParameter { param: String, message: String },
}

/// Stable, machine-readable error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidDimension,
    EmptySource,
    DegenerateCrop,
    UnsupportedFilterKind,
    EncodingError,
    DecodeFailed,
    UnsupportedFormat,
    FileTooLarge,
    SourceTooLarge,
    OutputTooLarge,
    InvalidParameter,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidDimension => "invalid_dimension",
            ErrorKind::EmptySource => "empty_source",
            ErrorKind::DegenerateCrop => "degenerate_crop",
            ErrorKind::UnsupportedFilterKind => "unsupported_filter_kind",
            ErrorKind::EncodingError => "encoding_error",
            ErrorKind::DecodeFailed => "decode_failed",
            ErrorKind::UnsupportedFormat => "unsupported_format",
            ErrorKind::FileTooLarge => "file_too_large",
            ErrorKind::SourceTooLarge => "source_too_large",
            ErrorKind::OutputTooLarge => "output_too_large",
            ErrorKind::InvalidParameter => "invalid_parameter",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PipelineError {
    /// Category of this error, used in batch reports and log fields
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InvalidDimension { .. } => ErrorKind::InvalidDimension,
            PipelineError::EmptySource { .. } => ErrorKind::EmptySource,
            PipelineError::DegenerateCrop { .. } => ErrorKind::DegenerateCrop,
            PipelineError::UnsupportedFilterKind { .. } => ErrorKind::UnsupportedFilterKind,
            PipelineError::EncodingError { .. } => ErrorKind::EncodingError,
            PipelineError::DecodeFailed { .. } => ErrorKind::DecodeFailed,
            PipelineError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            PipelineError::FileTooLarge { .. } => ErrorKind::FileTooLarge,
            PipelineError::SourceTooLarge { .. } => ErrorKind::SourceTooLarge,
            PipelineError::OutputTooLarge { .. } => ErrorKind::OutputTooLarge,
            PipelineError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
        }
    }

    /// Whether the error was caused by caller-supplied parameters (as opposed to
    /// the source data or the codec)
    pub fn is_parameter_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidDimension
                | ErrorKind::DegenerateCrop
                | ErrorKind::UnsupportedFilterKind
                | ErrorKind::OutputTooLarge
                | ErrorKind::InvalidParameter
        )
    }

    /// Helper constructors for common error patterns
    pub fn invalid_dimension(dimension: impl Into<String>, value: f64) -> Self {
        PipelineError::InvalidDimension {
            dimension: dimension.into(),
            value,
        }
    }

    pub fn unsupported_filter(kind: impl Into<String>) -> Self {
        PipelineError::UnsupportedFilterKind { kind: kind.into() }
    }

    pub fn encoding(format: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::EncodingError {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn decode_failed(message: impl Into<String>) -> Self {
        PipelineError::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn unsupported_format(format: impl Into<String>) -> Self {
        PipelineError::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn invalid_param(param: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    pub fn source_too_large(width: u32, height: u32, max_pixels: u64) -> Self {
        PipelineError::SourceTooLarge {
            width,
            height,
            pixels: width as u64 * height as u64,
            max_pixels,
        }
    }
}

/// Convenience result type used across the crate
pub type PipelineResult<T> = Result<T, PipelineError>;
