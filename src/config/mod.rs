// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::encoder::OutputSpec;
use crate::pipeline::{PipelineOptions, SourceLimits, DEFAULT_MAX_OUTPUT_DIMENSION};

pub mod edit;

pub use edit::{EditConfig, ReferenceSize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub output: OutputSpec,
    #[serde(default)]
    pub edit: EditConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; RUST_LOG takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_max_output_dimension() -> u32 {
    DEFAULT_MAX_OUTPUT_DIMENSION
}

/// Source validation and output size limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(flatten)]
    pub source: SourceLimits,
    /// Largest output side processed without opt-in (4096)
    #[serde(default = "default_max_output_dimension")]
    pub max_output_dimension: u32,
    #[serde(default)]
    pub allow_large_output: bool,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            source: SourceLimits::default(),
            max_output_dimension: default_max_output_dimension(),
            allow_large_output: false,
        }
    }
}

impl LimitsConfig {
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            max_output_dimension: self.max_output_dimension,
            allow_large_output: self.allow_large_output,
        }
    }
}

fn default_max_images() -> usize {
    50
}

fn default_workers() -> usize {
    4
}

fn default_file_prefix() -> String {
    "cropped".to_string()
}

/// Batch orchestration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum images per batch
    #[serde(default = "default_max_images")]
    pub max_images: usize,
    /// Worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Prefix for generated output file names
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_images: default_max_images(),
            workers: default_workers(),
            file_prefix: default_file_prefix(),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(format!(
                "Invalid logging level '{}', expected one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }

        let source = &self.limits.source;
        if source.max_file_size == 0 {
            return Err("limits.max_file_size must be greater than 0".to_string());
        }
        if source.max_source_width == 0 || source.max_source_height == 0 {
            return Err("limits.max_source_width and max_source_height must be greater than 0".to_string());
        }
        if source.max_source_pixels == 0 {
            return Err("limits.max_source_pixels must be greater than 0".to_string());
        }
        if source.accepted_types.is_empty() {
            return Err("limits.accepted_types cannot be empty".to_string());
        }
        if let Some(bad) = source
            .accepted_types
            .iter()
            .find(|t| !t.to_lowercase().starts_with("image/"))
        {
            return Err(format!("limits.accepted_types entry '{}' is not an image MIME type", bad));
        }
        if self.limits.max_output_dimension == 0 {
            return Err("limits.max_output_dimension must be greater than 0".to_string());
        }

        if self.batch.max_images == 0 {
            return Err("batch.max_images must be at least 1".to_string());
        }
        if self.batch.workers == 0 {
            return Err("batch.workers must be at least 1".to_string());
        }
        if self.batch.file_prefix.trim().is_empty() {
            return Err("batch.file_prefix cannot be empty".to_string());
        }

        let quality = self.output.quality;
        if !quality.is_finite() || !(0.0..=1.0).contains(&quality) {
            return Err(format!("output.quality must be between 0.0 and 1.0, got {}", quality));
        }

        self.edit.validate()
    }
}
