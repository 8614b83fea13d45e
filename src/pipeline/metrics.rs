//! Per-invocation pipeline metrics
//!
//! Records what one `process` call did: dimensions in and out, encoded size,
//! the stages that actually ran and how long it took.

use std::time::Duration;

use serde::Serialize;

use crate::encoder::OutputFormat;

/// Pipeline stage that did work in an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Crop,
    Rotate,
    Flip,
    Zoom,
    ShapeMask,
    Filters,
    Resize,
    Encode,
}

impl StageKind {
    /// Label used in log fields
    pub fn as_label(&self) -> &'static str {
        match self {
            StageKind::Crop => "crop",
            StageKind::Rotate => "rotate",
            StageKind::Flip => "flip",
            StageKind::Zoom => "zoom",
            StageKind::ShapeMask => "shape_mask",
            StageKind::Filters => "filters",
            StageKind::Resize => "resize",
            StageKind::Encode => "encode",
        }
    }
}

/// Metrics for a single pipeline invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineMetrics {
    /// Encoded input size in bytes (0 for in-memory sources)
    pub source_size: usize,
    /// Encoded output size in bytes
    pub output_size: usize,
    pub source_dimensions: (u32, u32),
    pub output_dimensions: (u32, u32),
    pub output_format: OutputFormat,
    pub processing_time: Duration,
    /// Stages that did work, in execution order
    pub stages: Vec<StageKind>,
    /// Number of effective filters
    pub filter_count: usize,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self {
            source_size: 0,
            output_size: 0,
            source_dimensions: (0, 0),
            output_dimensions: (0, 0),
            output_format: OutputFormat::Png,
            processing_time: Duration::ZERO,
            stages: Vec::new(),
            filter_count: 0,
        }
    }
}

impl PipelineMetrics {
    pub fn builder() -> PipelineMetricsBuilder {
        PipelineMetricsBuilder::default()
    }

    /// Output pixels relative to source pixels
    pub fn area_ratio(&self) -> f64 {
        let source = self.source_dimensions.0 as u64 * self.source_dimensions.1 as u64;
        let output = self.output_dimensions.0 as u64 * self.output_dimensions.1 as u64;
        if source == 0 {
            0.0
        } else {
            output as f64 / source as f64
        }
    }

    /// Output bytes per output pixel
    pub fn bytes_per_pixel(&self) -> f64 {
        let pixels = self.output_dimensions.0 as u64 * self.output_dimensions.1 as u64;
        if pixels == 0 {
            0.0
        } else {
            self.output_size as f64 / pixels as f64
        }
    }

    pub fn ran(&self, stage: StageKind) -> bool {
        self.stages.contains(&stage)
    }

    pub fn stage_labels(&self) -> Vec<&'static str> {
        self.stages.iter().map(StageKind::as_label).collect()
    }
}

/// Builder for PipelineMetrics
#[derive(Debug, Clone, Default)]
pub struct PipelineMetricsBuilder {
    source_size: usize,
    output_size: usize,
    source_dimensions: (u32, u32),
    output_dimensions: (u32, u32),
    output_format: Option<OutputFormat>,
    processing_time: Duration,
    stages: Vec<StageKind>,
    filter_count: usize,
}

impl PipelineMetricsBuilder {
    pub fn source_size(mut self, size: usize) -> Self {
        self.source_size = size;
        self
    }

    pub fn output_size(mut self, size: usize) -> Self {
        self.output_size = size;
        self
    }

    pub fn source_dimensions(mut self, width: u32, height: u32) -> Self {
        self.source_dimensions = (width, height);
        self
    }

    pub fn output_dimensions(mut self, width: u32, height: u32) -> Self {
        self.output_dimensions = (width, height);
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn processing_time(mut self, time: Duration) -> Self {
        self.processing_time = time;
        self
    }

    /// Record a stage that did work
    pub fn stage(mut self, stage: StageKind) -> Self {
        self.stages.push(stage);
        self
    }

    /// Record `stage` only when `ran` is true
    pub fn stage_if(self, ran: bool, stage: StageKind) -> Self {
        if ran {
            self.stage(stage)
        } else {
            self
        }
    }

    pub fn filter_count(mut self, count: usize) -> Self {
        self.filter_count = count;
        self
    }

    pub fn build(self) -> PipelineMetrics {
        PipelineMetrics {
            source_size: self.source_size,
            output_size: self.output_size,
            source_dimensions: self.source_dimensions,
            output_dimensions: self.output_dimensions,
            output_format: self.output_format.unwrap_or_default(),
            processing_time: self.processing_time,
            stages: self.stages,
            filter_count: self.filter_count,
        }
    }
}
