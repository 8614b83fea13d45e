// Kirinuki image crop pipeline library
//
// Geometry -> transform compositor -> shape mask -> filter stack -> encoder,
// plus the batch, session and configuration layers around it.

pub mod batch;
pub mod color;
pub mod compositor;
pub mod config;
pub mod encoder;
pub mod error;
pub mod filters;
pub mod geometry;
pub mod logging;
pub mod pipeline;
pub mod session;

pub use error::{ErrorKind, PipelineError, PipelineResult};
pub use pipeline::{
    process, render, rotate_image, PipelineOptions, PipelineRequest, ProcessedImage, SourceImage,
};
