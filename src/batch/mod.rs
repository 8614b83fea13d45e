//! Batch processing
//!
//! Applies one edit to N images as N independent pipeline invocations on a
//! bounded rayon pool. A failing image never aborts its siblings; every
//! outcome is collected into a [`BatchReport`] in input order.

pub mod naming;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::compositor::{ResizeSpec, ShapeMask, Transform};
use crate::config::BatchConfig;
use crate::encoder::OutputSpec;
use crate::error::{ErrorKind, PipelineError, PipelineResult};
use crate::filters::{FilterDescriptor, FilterStack};
use crate::geometry::{self, AspectRatio, CropRectangle};
use crate::pipeline::{self, PipelineOptions, PipelineRequest, ProcessedImage, SourceImage, SourceLimits};

pub use naming::{batch_filenames, unique_filename, unique_filename_at};

/// Where a batch item's pixels come from
#[derive(Debug, Clone)]
pub enum BatchSource {
    /// Image file on disk, read inside the worker
    File(PathBuf),
    /// Encoded bytes already in memory
    Memory { name: String, data: Vec<u8> },
    /// Decoded raster
    Raster { name: String, image: SourceImage },
}

impl BatchSource {
    /// Display name used for reports and output file names
    pub fn name(&self) -> String {
        match self {
            BatchSource::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            BatchSource::Memory { name, .. } | BatchSource::Raster { name, .. } => name.clone(),
        }
    }

    fn load(&self, limits: &SourceLimits) -> PipelineResult<SourceImage> {
        match self {
            BatchSource::File(path) => SourceImage::open(path, limits),
            BatchSource::Memory { data, .. } => SourceImage::decode(data, limits),
            BatchSource::Raster { image, .. } => {
                let (w, h) = image.dimensions();
                limits.validate_dimensions(w, h)?;
                Ok(image.clone())
            }
        }
    }
}

/// How each image's crop rectangle is derived
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropPlan {
    /// Largest centered rectangle of the ratio; the whole image when `None`
    Centered(Option<AspectRatio>),
    /// The same rectangle on every image
    Fixed(CropRectangle),
    /// A crop drawn on a reference image, scaled by natural-pixel ratio
    Scaled {
        crop: CropRectangle,
        reference: (u32, u32),
    },
}

impl CropPlan {
    pub fn resolve(&self, width: u32, height: u32) -> PipelineResult<CropRectangle> {
        match self {
            CropPlan::Centered(ratio) => geometry::default_crop(width, height, *ratio),
            CropPlan::Fixed(crop) => Ok(*crop),
            CropPlan::Scaled { crop, reference } => {
                geometry::scale_crop(crop, *reference, (width, height))
            }
        }
    }
}

/// The edit applied to every image in a batch
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub crop: CropPlan,
    pub transform: Transform,
    pub shape: ShapeMask,
    pub filters: Vec<FilterDescriptor>,
    pub resize: Option<ResizeSpec>,
    pub output: OutputSpec,
}

impl BatchJob {
    pub fn new(crop: CropPlan) -> Self {
        Self {
            crop,
            transform: Transform::default(),
            shape: ShapeMask::default(),
            filters: Vec::new(),
            resize: None,
            output: OutputSpec::default(),
        }
    }

    fn request_for(&self, source: &SourceImage) -> PipelineResult<PipelineRequest> {
        let (w, h) = source.dimensions();
        let crop = self.crop.resolve(w, h)?;
        let mut request = PipelineRequest::new(crop)
            .with_transform(self.transform)
            .with_shape(self.shape)
            .with_filters(self.filters.clone())
            .with_output(self.output);
        request.resize = self.resize;
        Ok(request)
    }
}

/// Outcome for one input
#[derive(Debug, Clone)]
pub struct BatchItemResult {
    /// Position in the input list
    pub index: usize,
    pub name: String,
    /// Output file name assigned to this item
    pub file_name: String,
    pub outcome: Result<ProcessedImage, PipelineError>,
}

impl BatchItemResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.outcome.as_ref().err().map(PipelineError::kind)
    }
}

/// Partial-success report, items in input order
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub items: Vec<BatchItemResult>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    pub fn successes(&self) -> impl Iterator<Item = (&BatchItemResult, &ProcessedImage)> {
        self.items
            .iter()
            .filter_map(|item| item.outcome.as_ref().ok().map(|p| (item, p)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&BatchItemResult, &PipelineError)> {
        self.items
            .iter()
            .filter_map(|item| item.outcome.as_ref().err().map(|e| (item, e)))
    }
}

/// Runs batches on a dedicated worker pool
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    config: BatchConfig,
    limits: SourceLimits,
    options: PipelineOptions,
}

impl BatchProcessor {
    pub fn new(config: BatchConfig, limits: SourceLimits, options: PipelineOptions) -> Self {
        Self {
            config,
            limits,
            options,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Process every source with `job`.
    ///
    /// Only batch-level problems (too many inputs, invalid filters, pool
    /// setup) fail the call; per-image failures land in the report.
    pub fn run(&self, sources: &[BatchSource], job: &BatchJob) -> PipelineResult<BatchReport> {
        if sources.len() > self.config.max_images {
            return Err(PipelineError::invalid_param(
                "batch",
                format!(
                    "{} images exceeds the limit of {}",
                    sources.len(),
                    self.config.max_images
                ),
            ));
        }
        // Same filters for every item; reject them once
        FilterStack::from_descriptors(&job.filters)?;

        let start = Instant::now();
        let names: Vec<String> = sources.iter().map(BatchSource::name).collect();
        let file_names = batch_filenames(
            &names,
            &self.config.file_prefix,
            job.output.format.extension(),
            chrono::Utc::now().timestamp_millis(),
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers.max(1))
            .thread_name(|i| format!("kirinuki-worker-{}", i))
            .build()
            .map_err(|e| PipelineError::invalid_param("workers", e.to_string()))?;

        tracing::info!(
            images = sources.len(),
            workers = self.config.workers.max(1),
            format = job.output.format.as_str(),
            "Starting batch"
        );

        let items: Vec<BatchItemResult> = pool.install(|| {
            sources
                .par_iter()
                .zip(names.par_iter().zip(file_names.par_iter()))
                .enumerate()
                .map(|(index, (source, (name, file_name)))| {
                    let outcome = self.process_one(source, job);
                    if let Err(ref e) = outcome {
                        tracing::warn!(
                            index = index,
                            image = %name,
                            kind = e.kind().as_str(),
                            error = %e,
                            "Batch item failed"
                        );
                    }
                    BatchItemResult {
                        index,
                        name: name.clone(),
                        file_name: file_name.clone(),
                        outcome,
                    }
                })
                .collect()
        });

        let report = BatchReport {
            items,
            elapsed: start.elapsed(),
        };

        tracing::info!(
            total = report.total(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Batch finished"
        );

        Ok(report)
    }

    fn process_one(&self, source: &BatchSource, job: &BatchJob) -> PipelineResult<ProcessedImage> {
        let image = source.load(&self.limits)?;
        let request = job.request_for(&image)?;
        pipeline::process(&image, &request, &self.options)
    }
}
