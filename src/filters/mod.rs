//! Filter stack
//!
//! Filters run in a fixed order regardless of how they were supplied:
//!
//! ```text
//! brightness → contrast → saturation → blur → grayscale → sepia → hueRotate
//!   → duotone → vignette → sharpen → noise
//! ```
//!
//! Runs of consecutive point filters are folded into one [`ColorMatrix`] pass.
//! Filters at their no-op value are dropped before anything runs, so a stack
//! of no-ops returns its input unchanged.

pub mod matrix;
pub mod settings;
pub mod spatial;

use std::fmt;
use std::str::FromStr;

use image::RgbaImage;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PipelineError, PipelineResult};

pub use matrix::ColorMatrix;
pub use settings::{
    AdvancedFilterSettings, DuotoneSettings, FilterSettings, NoiseSettings, VignetteSettings,
};

/// Recognized filter kinds, in canonical application order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKind {
    Brightness,
    Contrast,
    Saturation,
    Blur,
    Grayscale,
    Sepia,
    HueRotate,
    Duotone,
    Vignette,
    Sharpen,
    Noise,
}

impl FilterKind {
    pub const ALL: [FilterKind; 11] = [
        FilterKind::Brightness,
        FilterKind::Contrast,
        FilterKind::Saturation,
        FilterKind::Blur,
        FilterKind::Grayscale,
        FilterKind::Sepia,
        FilterKind::HueRotate,
        FilterKind::Duotone,
        FilterKind::Vignette,
        FilterKind::Sharpen,
        FilterKind::Noise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::Brightness => "brightness",
            FilterKind::Contrast => "contrast",
            FilterKind::Saturation => "saturation",
            FilterKind::Blur => "blur",
            FilterKind::Grayscale => "grayscale",
            FilterKind::Sepia => "sepia",
            FilterKind::HueRotate => "hueRotate",
            FilterKind::Duotone => "duotone",
            FilterKind::Vignette => "vignette",
            FilterKind::Sharpen => "sharpen",
            FilterKind::Noise => "noise",
        }
    }

    /// Position in the canonical order
    pub fn order(&self) -> usize {
        *self as usize
    }

    /// Whether the filter is a per-pixel color transform
    pub fn is_point_filter(&self) -> bool {
        matches!(
            self,
            FilterKind::Brightness
                | FilterKind::Contrast
                | FilterKind::Saturation
                | FilterKind::Grayscale
                | FilterKind::Sepia
                | FilterKind::HueRotate
        )
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "brightness" => Ok(FilterKind::Brightness),
            "contrast" => Ok(FilterKind::Contrast),
            "saturation" | "saturate" => Ok(FilterKind::Saturation),
            "blur" => Ok(FilterKind::Blur),
            "grayscale" | "greyscale" => Ok(FilterKind::Grayscale),
            "sepia" => Ok(FilterKind::Sepia),
            "huerotate" | "hue" => Ok(FilterKind::HueRotate),
            "duotone" => Ok(FilterKind::Duotone),
            "vignette" => Ok(FilterKind::Vignette),
            "sharpen" => Ok(FilterKind::Sharpen),
            "noise" => Ok(FilterKind::Noise),
            _ => Err(PipelineError::unsupported_filter(s)),
        }
    }
}

/// A validated filter with its parameters
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Brightness(f32),
    Contrast(f32),
    Saturation(f32),
    Blur(f32),
    Grayscale(f32),
    Sepia(f32),
    HueRotate(f32),
    Duotone(DuotoneSettings),
    Vignette(VignetteSettings),
    Sharpen(f32),
    Noise(NoiseSettings),
}

fn check_range(kind: FilterKind, value: f32, min: f32, max: f32) -> PipelineResult<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(PipelineError::invalid_param(
            kind.as_str(),
            format!("value {} outside {}..={}", value, min, max),
        ));
    }
    Ok(())
}

impl FilterOp {
    pub fn kind(&self) -> FilterKind {
        match self {
            FilterOp::Brightness(_) => FilterKind::Brightness,
            FilterOp::Contrast(_) => FilterKind::Contrast,
            FilterOp::Saturation(_) => FilterKind::Saturation,
            FilterOp::Blur(_) => FilterKind::Blur,
            FilterOp::Grayscale(_) => FilterKind::Grayscale,
            FilterOp::Sepia(_) => FilterKind::Sepia,
            FilterOp::HueRotate(_) => FilterKind::HueRotate,
            FilterOp::Duotone(_) => FilterKind::Duotone,
            FilterOp::Vignette(_) => FilterKind::Vignette,
            FilterOp::Sharpen(_) => FilterKind::Sharpen,
            FilterOp::Noise(_) => FilterKind::Noise,
        }
    }

    /// True when the filter would leave every pixel unchanged
    pub fn is_noop(&self) -> bool {
        match self {
            FilterOp::Brightness(v) | FilterOp::Contrast(v) | FilterOp::Saturation(v) => {
                *v == 100.0
            }
            FilterOp::Blur(v) | FilterOp::Grayscale(v) | FilterOp::Sepia(v) | FilterOp::Sharpen(v) => {
                *v == 0.0
            }
            FilterOp::HueRotate(deg) => deg.rem_euclid(360.0) == 0.0,
            FilterOp::Duotone(d) => !d.enabled || d.intensity == 0.0,
            FilterOp::Vignette(v) => v.intensity == 0.0,
            FilterOp::Noise(n) => n.amount == 0.0,
        }
    }

    pub fn validate(&self) -> PipelineResult<()> {
        let kind = self.kind();
        match self {
            FilterOp::Brightness(v) | FilterOp::Contrast(v) | FilterOp::Saturation(v) => {
                check_range(kind, *v, 0.0, 200.0)
            }
            FilterOp::Blur(v) => check_range(kind, *v, 0.0, 10.0),
            FilterOp::Grayscale(v) | FilterOp::Sepia(v) | FilterOp::Sharpen(v) => {
                check_range(kind, *v, 0.0, 100.0)
            }
            FilterOp::HueRotate(v) => check_range(kind, *v, 0.0, 360.0),
            FilterOp::Duotone(d) => check_range(kind, d.intensity, 0.0, 100.0),
            FilterOp::Vignette(v) => check_range(kind, v.intensity, 0.0, 100.0),
            FilterOp::Noise(n) => check_range(kind, n.amount, 0.0, 100.0),
        }
    }

    /// Color matrix for point filters, `None` for spatial ones
    pub fn color_matrix(&self) -> Option<ColorMatrix> {
        match self {
            FilterOp::Brightness(v) => Some(ColorMatrix::brightness(*v)),
            FilterOp::Contrast(v) => Some(ColorMatrix::contrast(*v)),
            FilterOp::Saturation(v) => Some(ColorMatrix::saturation(*v)),
            FilterOp::Grayscale(v) => Some(ColorMatrix::grayscale(*v)),
            FilterOp::Sepia(v) => Some(ColorMatrix::sepia(*v)),
            FilterOp::HueRotate(v) => Some(ColorMatrix::hue_rotate(*v)),
            _ => None,
        }
    }
}

/// Filter as supplied by a caller: a kind name plus free-form parameters.
///
/// Scalar filters accept either a bare number or `{value: n}`; structured
/// filters take their settings object (a bare number sets the intensity or
/// amount).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDescriptor {
    pub kind: String,
    #[serde(default)]
    pub params: Value,
}

impl FilterDescriptor {
    pub fn new(kind: impl Into<String>, params: Value) -> Self {
        Self {
            kind: kind.into(),
            params,
        }
    }

    /// Parse and validate into a typed operation
    pub fn to_op(&self) -> PipelineResult<FilterOp> {
        let kind: FilterKind = self.kind.parse()?;
        let op = match kind {
            FilterKind::Brightness => FilterOp::Brightness(self.scalar(kind)?),
            FilterKind::Contrast => FilterOp::Contrast(self.scalar(kind)?),
            FilterKind::Saturation => FilterOp::Saturation(self.scalar(kind)?),
            FilterKind::Blur => FilterOp::Blur(self.scalar(kind)?),
            FilterKind::Grayscale => FilterOp::Grayscale(self.scalar(kind)?),
            FilterKind::Sepia => FilterOp::Sepia(self.scalar(kind)?),
            FilterKind::HueRotate => FilterOp::HueRotate(self.scalar(kind)?),
            FilterKind::Sharpen => FilterOp::Sharpen(self.scalar(kind)?),
            FilterKind::Duotone => {
                let mut settings: DuotoneSettings = self.structured(kind, "intensity")?;
                // A bare duotone descriptor means "on"
                if self.params.is_number() {
                    settings.enabled = true;
                }
                FilterOp::Duotone(settings)
            }
            FilterKind::Vignette => FilterOp::Vignette(self.structured(kind, "intensity")?),
            FilterKind::Noise => FilterOp::Noise(self.structured(kind, "amount")?),
        };
        op.validate()?;
        Ok(op)
    }

    fn scalar(&self, kind: FilterKind) -> PipelineResult<f32> {
        let value = match &self.params {
            Value::Number(n) => n.as_f64(),
            Value::Object(map) => ["value", "amount", "intensity", "degrees"]
                .iter()
                .find_map(|key| map.get(*key))
                .and_then(Value::as_f64),
            _ => None,
        };
        value.map(|v| v as f32).ok_or_else(|| {
            PipelineError::invalid_param(kind.as_str(), "expected a number or {value: n}")
        })
    }

    fn structured<T: DeserializeOwned>(&self, kind: FilterKind, scalar_key: &str) -> PipelineResult<T> {
        let params = match &self.params {
            Value::Number(n) => {
                let mut map = serde_json::Map::new();
                map.insert(scalar_key.to_string(), Value::Number(n.clone()));
                Value::Object(map)
            }
            Value::Null => Value::Object(serde_json::Map::new()),
            other => other.clone(),
        };
        serde_json::from_value(params)
            .map_err(|e| PipelineError::invalid_param(kind.as_str(), e.to_string()))
    }
}

impl From<&FilterOp> for FilterDescriptor {
    fn from(op: &FilterOp) -> Self {
        let params = match op {
            FilterOp::Brightness(v)
            | FilterOp::Contrast(v)
            | FilterOp::Saturation(v)
            | FilterOp::Blur(v)
            | FilterOp::Grayscale(v)
            | FilterOp::Sepia(v)
            | FilterOp::HueRotate(v)
            | FilterOp::Sharpen(v) => serde_json::json!({ "value": v }),
            FilterOp::Duotone(d) => serde_json::to_value(d).unwrap_or(Value::Null),
            FilterOp::Vignette(v) => serde_json::to_value(v).unwrap_or(Value::Null),
            FilterOp::Noise(n) => serde_json::to_value(n).unwrap_or(Value::Null),
        };
        FilterDescriptor::new(op.kind().as_str(), params)
    }
}

/// Ordered, validated set of effective filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterStack {
    ops: Vec<FilterOp>,
}

impl FilterStack {
    /// Build from typed operations. Later entries of the same kind replace
    /// earlier ones; no-ops are dropped.
    pub fn from_ops(ops: impl IntoIterator<Item = FilterOp>) -> PipelineResult<Self> {
        let mut slots: [Option<FilterOp>; 11] = Default::default();
        for op in ops {
            op.validate()?;
            let order = op.kind().order();
            slots[order] = Some(op);
        }
        Ok(Self {
            ops: slots
                .into_iter()
                .flatten()
                .filter(|op| !op.is_noop())
                .collect(),
        })
    }

    /// Build from caller descriptors; unknown kinds fail the whole stack
    pub fn from_descriptors(descriptors: &[FilterDescriptor]) -> PipelineResult<Self> {
        let ops = descriptors
            .iter()
            .map(FilterDescriptor::to_op)
            .collect::<PipelineResult<Vec<_>>>()?;
        Self::from_ops(ops)
    }

    pub fn from_settings(settings: &FilterSettings) -> PipelineResult<Self> {
        Self::from_ops(settings.to_ops())
    }

    /// Effective operations in canonical order
    pub fn ops(&self) -> &[FilterOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Kinds that will actually run
    pub fn kinds(&self) -> Vec<FilterKind> {
        self.ops.iter().map(FilterOp::kind).collect()
    }

    /// Run the stack over `raster`. Dimensions are preserved.
    pub fn apply(&self, mut raster: RgbaImage) -> RgbaImage {
        if self.ops.is_empty() {
            return raster;
        }

        let mut pending: Option<ColorMatrix> = None;

        for op in &self.ops {
            if let Some(m) = op.color_matrix() {
                pending = Some(match pending {
                    Some(acc) => acc.then(&m),
                    None => m,
                });
                continue;
            }

            if let Some(m) = pending.take() {
                m.apply(&mut raster);
            }

            match op {
                FilterOp::Blur(radius) => raster = spatial::blur(&raster, *radius),
                FilterOp::Duotone(settings) => spatial::duotone(&mut raster, settings),
                FilterOp::Vignette(settings) => spatial::vignette(&mut raster, settings),
                FilterOp::Sharpen(amount) => spatial::sharpen(&mut raster, *amount),
                FilterOp::Noise(settings) => spatial::noise(&mut raster, settings),
                _ => {}
            }
        }

        if let Some(m) = pending {
            m.apply(&mut raster);
        }

        tracing::debug!(
            filters = ?self.kinds(),
            width = raster.width(),
            height = raster.height(),
            "Applied filter stack"
        );

        raster
    }
}

/// Validate `filters` and apply them to `raster` in canonical order
pub fn apply_all(raster: RgbaImage, filters: &[FilterDescriptor]) -> PipelineResult<RgbaImage> {
    let stack = FilterStack::from_descriptors(filters)?;
    Ok(stack.apply(raster))
}
