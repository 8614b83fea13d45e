//! Compositing stages
//!
//! - [`transform`]: crop window sampling with rotation, flip and zoom, and
//!   whole-raster rotation onto an expanded canvas
//! - [`mask`]: rectangle/circle shape clipping against a fill color
//! - [`resize`]: final resampling to explicit output dimensions
//!
//! Every stage is a pure function from (raster, parameters) to a new raster.

pub mod mask;
pub mod resize;
pub mod transform;

pub use mask::{mask, trim_to_shape, ShapeMask};
pub use resize::{resize, ResizeSpec};
pub use transform::{
    apply as apply_transform, normalize_degrees, rotate_expanded, rotated_bounds, Transform, ZOOM_MAX,
    ZOOM_MIN,
};
