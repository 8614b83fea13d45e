//! Aspect-ratio constraints and presets.
//!
//! Accepted spellings: `free`, `1:1`, `4:3`, `16:9`, `3:2`, `3:4`, `9:16`,
//! `golden` (also `golden-ratio`), any `<w>:<h>` pair and plain floats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Golden ratio, offered as a preset alongside the usual photo ratios
pub const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;

/// A positive, finite `width / height` ratio
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct AspectRatio(f64);

impl AspectRatio {
    pub fn new(ratio: f64) -> Result<Self, PipelineError> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(PipelineError::invalid_param(
                "aspect_ratio",
                format!("ratio must be positive and finite, got {}", ratio),
            ));
        }
        Ok(Self(ratio))
    }

    /// Ratio from a `width:height` pair
    pub fn from_pair(width: f64, height: f64) -> Result<Self, PipelineError> {
        if !height.is_finite() || height <= 0.0 {
            return Err(PipelineError::invalid_param(
                "aspect_ratio",
                "height term must be positive",
            ));
        }
        Self::new(width / height)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn square() -> Self {
        Self(1.0)
    }
}

impl TryFrom<f64> for AspectRatio {
    type Error = PipelineError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AspectRatio> for f64 {
    fn from(ratio: AspectRatio) -> Self {
        ratio.0
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

impl FromStr for AspectRatio {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "golden" | "golden-ratio" => return Self::new(GOLDEN_RATIO),
            "square" => return Ok(Self::square()),
            _ => {}
        }

        if let Some((w, h)) = s.split_once(':') {
            let parse = |term: &str| {
                term.trim().parse::<f64>().map_err(|_| {
                    PipelineError::invalid_param("aspect_ratio", format!("invalid term: {}", term))
                })
            };
            return Self::from_pair(parse(w)?, parse(h)?);
        }

        let ratio = s.parse::<f64>().map_err(|_| {
            PipelineError::invalid_param("aspect_ratio", format!("unknown aspect ratio: {}", s))
        })?;
        Self::new(ratio)
    }
}

/// Parse a constraint where `free` (or an empty string) means no constraint
pub fn parse_constraint(s: &str) -> Result<Option<AspectRatio>, PipelineError> {
    match s.trim().to_lowercase().as_str() {
        "" | "free" | "none" => Ok(None),
        other => other.parse().map(Some),
    }
}
