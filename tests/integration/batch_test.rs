//! Batch processing over files on disk

use std::path::PathBuf;

use kirinuki::batch::{BatchJob, BatchProcessor, BatchSource, CropPlan};
use kirinuki::compositor::ShapeMask;
use kirinuki::config::BatchConfig;
use kirinuki::encoder::{OutputFormat, OutputSpec, WEBP_MAX_DIMENSION};
use kirinuki::error::ErrorKind;
use kirinuki::filters::FilterDescriptor;
use kirinuki::geometry::{AspectRatio, CropRectangle};
use kirinuki::pipeline::{SourceImage, SourceLimits};
use kirinuki::PipelineOptions;
use image::{Rgba, RgbaImage};
use serde_json::json;
use tempfile::TempDir;

use super::fixtures;

fn write_inputs(dir: &TempDir, sizes: &[(&str, u32, u32)]) -> Vec<BatchSource> {
    sizes
        .iter()
        .map(|(name, w, h)| {
            let path = dir.path().join(name);
            std::fs::write(&path, fixtures::png_bytes(*w, *h)).unwrap();
            BatchSource::File(path)
        })
        .collect()
}

fn processor(workers: usize) -> BatchProcessor {
    BatchProcessor::new(
        BatchConfig {
            workers,
            ..Default::default()
        },
        SourceLimits::default(),
        PipelineOptions::default(),
    )
}

#[test]
fn test_scaled_crop_across_differently_sized_files() {
    let dir = TempDir::new().unwrap();
    let sources = write_inputs(
        &dir,
        &[("large.png", 1000, 800), ("half.png", 500, 400), ("wide.png", 2000, 800)],
    );
    let mut job = BatchJob::new(CropPlan::Scaled {
        crop: CropRectangle::new(100, 50, 400, 300),
        reference: (1000, 800),
    });
    job.output = OutputSpec::new(OutputFormat::Jpeg, 0.8);

    let report = processor(3).run(&sources, &job).unwrap();
    assert!(report.all_succeeded());

    let sizes: Vec<(u32, u32)> = report
        .successes()
        .map(|(_, processed)| (processed.encoded.width, processed.encoded.height))
        .collect();
    assert_eq!(sizes, vec![(400, 300), (200, 150), (800, 300)]);

    for (item, processed) in report.successes() {
        assert!(item.file_name.ends_with(".jpg"));
        assert_eq!(processed.encoded.mime_type, "image/jpeg");
    }
}

#[test]
fn test_one_bad_file_does_not_abort_the_rest() {
    let dir = TempDir::new().unwrap();
    let mut sources = write_inputs(&dir, &[("one.png", 64, 48), ("three.png", 32, 32)]);

    let garbage = dir.path().join("two.png");
    std::fs::write(&garbage, b"not really a png").unwrap();
    sources.insert(1, BatchSource::File(garbage));
    sources.push(BatchSource::File(PathBuf::from("/nonexistent/four.png")));

    let job = BatchJob::new(CropPlan::Centered(Some(AspectRatio::square())));
    let report = processor(2).run(&sources, &job).unwrap();

    assert_eq!(report.total(), 4);
    assert_eq!(report.succeeded(), 2);
    let names: Vec<&str> = report.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["one.png", "two.png", "three.png", "four.png"]);
    assert_eq!(report.items[1].error_kind(), Some(ErrorKind::UnsupportedFormat));
    assert_eq!(report.items[3].error_kind(), Some(ErrorKind::DecodeFailed));
    assert_eq!(report.items[0].outcome.as_ref().unwrap().encoded.width, 48);
}

#[test]
fn test_invalid_filters_reject_whole_batch() {
    let dir = TempDir::new().unwrap();
    let sources = write_inputs(&dir, &[("a.png", 10, 10)]);
    let mut job = BatchJob::new(CropPlan::Centered(None));
    job.filters = vec![FilterDescriptor::new("sepia", json!(400))];

    let err = processor(1).run(&sources, &job).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
}

#[test]
fn test_duplicate_names_get_distinct_outputs() {
    let dir = TempDir::new().unwrap();
    let first = write_inputs(&dir, &[("same.png", 20, 20)]);
    let sources = vec![first[0].clone(), first[0].clone(), first[0].clone()];

    let mut job = BatchJob::new(CropPlan::Centered(None));
    job.shape = ShapeMask::Circle;
    let report = processor(2).run(&sources, &job).unwrap();

    let mut names: Vec<&str> = report.items.iter().map(|i| i.file_name.as_str()).collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 3);
}

#[test]
fn test_empty_batch_is_an_empty_report() {
    let job = BatchJob::new(CropPlan::Centered(None));
    let report = processor(1).run(&[], &job).unwrap();
    assert_eq!(report.total(), 0);
    assert!(report.all_succeeded());
}

#[test]
fn test_codec_rejection_stays_within_its_item() {
    let wide = RgbaImage::from_pixel(WEBP_MAX_DIMENSION + 1, 2, Rgba([40, 80, 120, 255]));
    let sources = vec![
        BatchSource::Raster {
            name: "small.png".to_string(),
            image: SourceImage::from_rgba(fixtures::pattern(24, 16)),
        },
        BatchSource::Raster {
            name: "panorama.png".to_string(),
            image: SourceImage::from_rgba(wide),
        },
    ];
    let processor = BatchProcessor::new(
        BatchConfig {
            workers: 2,
            ..Default::default()
        },
        SourceLimits {
            max_source_width: 20_000,
            ..Default::default()
        },
        PipelineOptions {
            allow_large_output: true,
            ..Default::default()
        },
    );
    let mut job = BatchJob::new(CropPlan::Centered(None));
    job.output = OutputSpec::new(OutputFormat::WebP, 0.8);

    let report = processor.run(&sources, &job).unwrap();
    assert_eq!(report.total(), 2);
    assert!(report.items[0].is_success());
    assert_eq!(report.items[1].error_kind(), Some(ErrorKind::EncodingError));
}
