//! Per-image edit sessions
//!
//! Each loaded image owns one [`EditState`] record (crop, constraint,
//! transform, shape, filters) plus a bounded undo/redo [`History`] of it.
//! Every mutation goes through [`EditSession::update`]; the state map is the
//! only place edits live.

pub mod history;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::compositor::{ShapeMask, Transform};
use crate::encoder::OutputSpec;
use crate::error::{PipelineError, PipelineResult};
use crate::filters::FilterSettings;
use crate::geometry::{self, AspectRatio, CropRectangle, DimensionEdit};
use crate::pipeline::PipelineRequest;

pub use history::{History, DEFAULT_HISTORY_LIMIT};

/// Identifier of an image within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(Uuid);

impl ImageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything a user has set for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditState {
    pub crop: CropRectangle,
    pub aspect_ratio: Option<AspectRatio>,
    /// Whether dimension edits keep `aspect_ratio`
    pub lock_aspect: bool,
    pub transform: Transform,
    pub shape: ShapeMask,
    pub filters: FilterSettings,
}

impl EditState {
    /// Full-image crop, no constraint, identity transform and filters
    pub fn initial(width: u32, height: u32) -> Self {
        Self {
            crop: CropRectangle::full(width, height),
            aspect_ratio: None,
            lock_aspect: true,
            transform: Transform::default(),
            shape: ShapeMask::default(),
            filters: FilterSettings::default(),
        }
    }

    /// Pipeline request for this state
    pub fn to_request(&self, output: OutputSpec) -> PipelineRequest {
        PipelineRequest::new(self.crop)
            .with_transform(self.transform)
            .with_shape(self.shape)
            .with_filter_settings(&self.filters)
            .with_output(output)
    }
}

/// A single mutation of an [`EditState`]
#[derive(Debug, Clone, PartialEq)]
pub enum EditAction {
    SetCrop(CropRectangle),
    EditDimension(DimensionEdit),
    SetAspectRatio(Option<AspectRatio>),
    SetAspectLock(bool),
    /// Rotate by a delta in degrees
    Rotate(f64),
    FlipHorizontal,
    FlipVertical,
    Zoom(f64),
    SetShape(ShapeMask),
    SetFilters(FilterSettings),
    /// Back to [`EditState::initial`]; undoable like any other edit
    Reset,
}

impl EditAction {
    pub fn name(&self) -> &'static str {
        match self {
            EditAction::SetCrop(_) => "set_crop",
            EditAction::EditDimension(_) => "edit_dimension",
            EditAction::SetAspectRatio(_) => "set_aspect_ratio",
            EditAction::SetAspectLock(_) => "set_aspect_lock",
            EditAction::Rotate(_) => "rotate",
            EditAction::FlipHorizontal => "flip_horizontal",
            EditAction::FlipVertical => "flip_vertical",
            EditAction::Zoom(_) => "zoom",
            EditAction::SetShape(_) => "set_shape",
            EditAction::SetFilters(_) => "set_filters",
            EditAction::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone)]
struct ImageEntry {
    name: String,
    dimensions: (u32, u32),
    history: History<EditState>,
}

impl ImageEntry {
    fn apply(&self, action: &EditAction) -> PipelineResult<EditState> {
        let (width, height) = self.dimensions;
        let mut next = self.history.current().clone();

        match action {
            EditAction::SetCrop(crop) => {
                crop.validate_within(width, height)?;
                next.crop = *crop;
            }
            EditAction::EditDimension(edit) => {
                let crop = geometry::resolve(&next.crop, next.aspect_ratio, *edit, next.lock_aspect)?;
                crop.validate_within(width, height)?;
                next.crop = crop;
            }
            EditAction::SetAspectRatio(ratio) => {
                next.crop = geometry::reconstrain(&next.crop, *ratio)?;
                next.aspect_ratio = *ratio;
            }
            EditAction::SetAspectLock(locked) => next.lock_aspect = *locked,
            EditAction::Rotate(delta) => {
                if !delta.is_finite() {
                    return Err(PipelineError::invalid_param("rotation", "rotation must be finite"));
                }
                next.transform = next.transform.rotate_by(*delta);
            }
            EditAction::FlipHorizontal => next.transform = next.transform.flip_horizontally(),
            EditAction::FlipVertical => next.transform = next.transform.flip_vertically(),
            EditAction::Zoom(zoom) => {
                if !zoom.is_finite() || *zoom <= 0.0 {
                    return Err(PipelineError::invalid_param(
                        "zoom",
                        format!("zoom must be positive and finite, got {}", zoom),
                    ));
                }
                next.transform = next.transform.zoom_to(*zoom);
            }
            EditAction::SetShape(shape) => next.shape = *shape,
            EditAction::SetFilters(filters) => {
                // Reject out-of-range values before they reach history
                crate::filters::FilterStack::from_settings(filters)?;
                next.filters = filters.clone();
            }
            EditAction::Reset => next = EditState::initial(width, height),
        }

        Ok(next)
    }
}

/// All images being edited, keyed by id
#[derive(Debug, Clone)]
pub struct EditSession {
    images: HashMap<ImageId, ImageEntry>,
    order: Vec<ImageId>,
    history_limit: usize,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl EditSession {
    pub fn new(history_limit: usize) -> Self {
        Self {
            images: HashMap::new(),
            order: Vec::new(),
            history_limit,
        }
    }

    /// Register an image by its natural dimensions
    pub fn add_image(&mut self, name: impl Into<String>, width: u32, height: u32) -> PipelineResult<ImageId> {
        if width == 0 || height == 0 {
            return Err(PipelineError::EmptySource { width, height });
        }
        let id = ImageId::new();
        self.images.insert(
            id,
            ImageEntry {
                name: name.into(),
                dimensions: (width, height),
                history: History::new(EditState::initial(width, height), self.history_limit),
            },
        );
        self.order.push(id);
        Ok(id)
    }

    pub fn remove_image(&mut self, id: ImageId) -> bool {
        self.order.retain(|other| *other != id);
        self.images.remove(&id).is_some()
    }

    /// Image ids in insertion order
    pub fn image_ids(&self) -> &[ImageId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn name(&self, id: ImageId) -> Option<&str> {
        self.images.get(&id).map(|e| e.name.as_str())
    }

    pub fn dimensions(&self, id: ImageId) -> Option<(u32, u32)> {
        self.images.get(&id).map(|e| e.dimensions)
    }

    pub fn state(&self, id: ImageId) -> Option<&EditState> {
        self.images.get(&id).map(|e| e.history.current())
    }

    /// Apply one edit. On error the state and history are unchanged.
    pub fn update(&mut self, id: ImageId, action: EditAction) -> PipelineResult<&EditState> {
        let entry = self.images.get_mut(&id).ok_or_else(|| unknown_image(id))?;
        let next = entry.apply(&action)?;
        entry.history.push(next);

        tracing::debug!(
            image = %id,
            action = action.name(),
            history = entry.history.len(),
            "Updated edit state"
        );

        Ok(entry.history.current())
    }

    pub fn undo(&mut self, id: ImageId) -> PipelineResult<Option<&EditState>> {
        let entry = self.images.get_mut(&id).ok_or_else(|| unknown_image(id))?;
        Ok(entry.history.undo())
    }

    pub fn redo(&mut self, id: ImageId) -> PipelineResult<Option<&EditState>> {
        let entry = self.images.get_mut(&id).ok_or_else(|| unknown_image(id))?;
        Ok(entry.history.redo())
    }

    pub fn can_undo(&self, id: ImageId) -> bool {
        self.images.get(&id).map_or(false, |e| e.history.can_undo())
    }

    pub fn can_redo(&self, id: ImageId) -> bool {
        self.images.get(&id).map_or(false, |e| e.history.can_redo())
    }

    /// Carry the crop of `from` over to every other image, scaled by the
    /// natural-pixel ratio and clamped. Returns the number of images updated.
    pub fn apply_crop_to_all(&mut self, from: ImageId) -> PipelineResult<usize> {
        let (crop, reference) = {
            let entry = self.images.get(&from).ok_or_else(|| unknown_image(from))?;
            (entry.history.current().crop, entry.dimensions)
        };

        let targets: Vec<ImageId> = self.order.iter().copied().filter(|id| *id != from).collect();
        for id in &targets {
            let dimensions = self.images.get(id).map(|e| e.dimensions).ok_or_else(|| unknown_image(*id))?;
            let scaled = geometry::scale_crop(&crop, reference, dimensions)?;
            self.update(*id, EditAction::SetCrop(scaled))?;
        }

        tracing::info!(
            source = %from,
            images = targets.len(),
            "Applied crop to all images"
        );

        Ok(targets.len())
    }

    pub fn request(&self, id: ImageId, output: OutputSpec) -> PipelineResult<PipelineRequest> {
        self.state(id)
            .map(|state| state.to_request(output))
            .ok_or_else(|| unknown_image(id))
    }
}

fn unknown_image(id: ImageId) -> PipelineError {
    PipelineError::invalid_param("image", format!("unknown image id {}", id))
}
