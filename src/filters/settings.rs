//! Filter settings as edited by a user.
//!
//! [`FilterSettings`] holds the four basic adjustments; the optional
//! [`AdvancedFilterSettings`] extension carries the effects. Defaults are the
//! no-op value of every filter.

use serde::{Deserialize, Serialize};

use crate::color::Color;

use super::FilterOp;

fn default_percent() -> f32 {
    100.0
}

fn default_duotone_intensity() -> f32 {
    50.0
}

fn default_true() -> bool {
    true
}

/// Basic adjustments: brightness/contrast/saturation in percent (100 = no-op)
/// and blur radius in pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    #[serde(default = "default_percent")]
    pub brightness: f32,
    #[serde(default = "default_percent")]
    pub contrast: f32,
    #[serde(default = "default_percent")]
    pub saturation: f32,
    #[serde(default)]
    pub blur: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advanced: Option<AdvancedFilterSettings>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            blur: 0.0,
            advanced: None,
        }
    }
}

impl FilterSettings {
    /// Expand into one operation per filter, including no-op ones
    pub fn to_ops(&self) -> Vec<FilterOp> {
        let mut ops = vec![
            FilterOp::Brightness(self.brightness),
            FilterOp::Contrast(self.contrast),
            FilterOp::Saturation(self.saturation),
            FilterOp::Blur(self.blur),
        ];
        if let Some(advanced) = &self.advanced {
            ops.extend(advanced.to_ops());
        }
        ops
    }

    pub fn is_noop(&self) -> bool {
        self.to_ops().iter().all(FilterOp::is_noop)
    }
}

/// Effect filters layered on top of the basic adjustments
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedFilterSettings {
    /// 0..=100
    pub grayscale: f32,
    /// 0..=100
    pub sepia: f32,
    /// Degrees, 0..=360
    #[serde(alias = "hue", alias = "hueRotate")]
    pub hue_rotate: f32,
    pub vignette: VignetteSettings,
    pub duotone: DuotoneSettings,
    /// 0..=100
    pub sharpen: f32,
    pub noise: NoiseSettings,
}

impl AdvancedFilterSettings {
    pub fn to_ops(&self) -> Vec<FilterOp> {
        vec![
            FilterOp::Grayscale(self.grayscale),
            FilterOp::Sepia(self.sepia),
            FilterOp::HueRotate(self.hue_rotate),
            FilterOp::Duotone(self.duotone.clone()),
            FilterOp::Vignette(self.vignette.clone()),
            FilterOp::Sharpen(self.sharpen),
            FilterOp::Noise(self.noise.clone()),
        ]
    }
}

/// Radial darkening toward the corners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VignetteSettings {
    /// 0..=100, 0 is off
    #[serde(default)]
    pub intensity: f32,
    #[serde(default = "Color::black")]
    pub color: Color,
}

impl Default for VignetteSettings {
    fn default() -> Self {
        Self {
            intensity: 0.0,
            color: Color::black(),
        }
    }
}

/// Two-color gradient map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuotoneSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "Color::white", alias = "colorLight")]
    pub color_light: Color,
    #[serde(default = "Color::black", alias = "colorDark")]
    pub color_dark: Color,
    /// 0..=100 blend toward the mapped colors
    #[serde(default = "default_duotone_intensity")]
    pub intensity: f32,
}

impl Default for DuotoneSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            color_light: Color::white(),
            color_dark: Color::black(),
            intensity: default_duotone_intensity(),
        }
    }
}

/// Additive random grain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseSettings {
    /// 0..=100, 0 is off
    #[serde(default)]
    pub amount: f32,
    /// One draw shared across R, G and B
    #[serde(default = "default_true")]
    pub monochrome: bool,
    /// Fixed seed for reproducible grain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            amount: 0.0,
            monochrome: true,
            seed: None,
        }
    }
}
