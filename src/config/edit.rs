// Default edit applied to every input of a job

use serde::{Deserialize, Serialize};

use crate::batch::{BatchJob, CropPlan};
use crate::compositor::{ResizeSpec, ShapeMask, Transform};
use crate::encoder::OutputSpec;
use crate::error::PipelineResult;
use crate::filters::{FilterDescriptor, FilterStack};
use crate::geometry::aspect::parse_constraint;
use crate::geometry::CropRectangle;

/// Natural size of the image a crop was drawn on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditConfig {
    /// Used to derive a centered crop when `crop` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropRectangle>,
    /// Needed to scale `crop` onto images of other sizes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferenceSize>,
    #[serde(default)]
    pub shape: ShapeMask,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub filters: Vec<FilterDescriptor>,
    /// Exact output size applied after filters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize: Option<ResizeSpec>,
}

impl EditConfig {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ratio) = &self.aspect_ratio {
            parse_constraint(ratio).map_err(|e| format!("edit.aspect_ratio: {}", e))?;
        }
        if let Some(crop) = &self.crop {
            if crop.is_empty() {
                return Err(format!(
                    "edit.crop must have a positive size, got {}x{}",
                    crop.width, crop.height
                ));
            }
        }
        if let Some(reference) = &self.reference {
            if reference.width == 0 || reference.height == 0 {
                return Err("edit.reference dimensions must be greater than 0".to_string());
            }
            if let Some(crop) = &self.crop {
                if !crop.fits_within(reference.width, reference.height) {
                    return Err(format!(
                        "edit.crop exceeds reference size {}x{}",
                        reference.width, reference.height
                    ));
                }
            }
        }
        self.transform
            .validate()
            .map_err(|e| format!("edit.transform: {}", e))?;
        FilterStack::from_descriptors(&self.filters).map_err(|e| format!("edit.filters: {}", e))?;
        if let Some(resize) = &self.resize {
            resize.validate().map_err(|e| format!("edit.resize: {}", e))?;
        }
        Ok(())
    }

    /// How each input's crop is chosen.
    ///
    /// With `apply_to_all` and a reference size the crop is scaled per image;
    /// otherwise an explicit crop is used as is, and without one the largest
    /// centered rectangle of `aspect_ratio` is taken.
    pub fn crop_plan(&self, apply_to_all: bool) -> PipelineResult<CropPlan> {
        let ratio = match &self.aspect_ratio {
            Some(s) => parse_constraint(s)?,
            None => None,
        };

        Ok(match (self.crop, self.reference, apply_to_all) {
            (Some(crop), Some(reference), true) => CropPlan::Scaled {
                crop,
                reference: (reference.width, reference.height),
            },
            (Some(crop), _, _) => CropPlan::Fixed(crop),
            (None, _, _) => CropPlan::Centered(ratio),
        })
    }

    pub fn to_job(&self, output: OutputSpec, apply_to_all: bool) -> PipelineResult<BatchJob> {
        Ok(BatchJob {
            crop: self.crop_plan(apply_to_all)?,
            transform: self.transform,
            shape: self.shape,
            filters: self.filters.clone(),
            resize: self.resize,
            output,
        })
    }
}
