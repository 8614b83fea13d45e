//! End-to-end pipeline tests
//!
//! Encoded bytes in, encoded bytes out: decode → composite → mask → filter →
//! encode, then decode the result again and compare pixels.

use image::{ImageFormat, Rgba, RgbaImage};
use kirinuki::compositor::{ShapeMask, Transform};
use kirinuki::encoder::{OutputFormat, OutputSpec};
use kirinuki::error::{ErrorKind, PipelineError};
use kirinuki::filters::FilterDescriptor;
use kirinuki::geometry::CropRectangle;
use kirinuki::pipeline::{SourceLimits, StageKind};
use kirinuki::{process, render, rotate_image, PipelineOptions, PipelineRequest, SourceImage};
use serde_json::json;

use super::fixtures;

fn decoded_source() -> SourceImage {
    SourceImage::decode(&fixtures::png_bytes(1000, 800), &SourceLimits::default()).unwrap()
}

fn decode_output(data: &[u8]) -> RgbaImage {
    image::load_from_memory(data).unwrap().to_rgba8()
}

#[test]
fn test_rectangle_crop_without_transform_is_pixel_exact() {
    let source = decoded_source();
    let request = PipelineRequest::new(CropRectangle::new(100, 50, 400, 300))
        .with_output(OutputSpec::new(OutputFormat::Png, 1.0));

    let processed = process(&source, &request, &PipelineOptions::default()).unwrap();
    assert_eq!(processed.encoded.mime_type, "image/png");
    assert_eq!((processed.encoded.width, processed.encoded.height), (400, 300));

    let output = decode_output(&processed.encoded.data);
    assert_eq!(output.dimensions(), (400, 300));
    for (x, y, px) in output.enumerate_pixels() {
        assert_eq!(px, source.pixels().get_pixel(x + 100, y + 50), "at ({}, {})", x, y);
    }
}

#[test]
fn test_circle_crop_is_square_with_background_corners() {
    let source = decoded_source();
    let request = PipelineRequest::new(CropRectangle::new(100, 50, 400, 300))
        .with_shape(ShapeMask::Circle)
        .with_output(OutputSpec::new(OutputFormat::Png, 1.0));

    let processed = process(&source, &request, &PipelineOptions::default()).unwrap();
    let output = decode_output(&processed.encoded.data);
    assert_eq!(output.dimensions(), (300, 300));

    let white = Rgba([255, 255, 255, 255]);
    for (x, y) in [(0, 0), (299, 0), (0, 299), (299, 299)] {
        assert_eq!(*output.get_pixel(x, y), white);
    }
    // Trimmed square starts 50px into the 400px-wide crop
    assert_eq!(output.get_pixel(150, 150), source.pixels().get_pixel(300, 200));
    assert!(processed.metrics.ran(StageKind::ShapeMask));
}

#[test]
fn test_circle_keeps_transparency_when_asked() {
    let source = decoded_source();
    let request = PipelineRequest::new(CropRectangle::new(0, 0, 200, 200))
        .with_shape(ShapeMask::Circle)
        .with_output(OutputSpec::new(OutputFormat::Png, 1.0).with_preserve_alpha(true));

    let raster = render(&source, &request, &PipelineOptions::default()).unwrap();
    assert_eq!(raster.get_pixel(0, 0)[3], 0);
    assert_eq!(raster.get_pixel(100, 100)[3], 255);
}

#[test]
fn test_brightness_on_uniform_gray() {
    let gray = RgbaImage::from_pixel(64, 64, Rgba([128, 128, 128, 255]));
    let source = SourceImage::from_rgba(gray);
    let request = PipelineRequest::new(CropRectangle::full(64, 64))
        .with_filters(vec![FilterDescriptor::new("brightness", json!(150))])
        .with_output(OutputSpec::new(OutputFormat::Png, 1.0));

    let processed = process(&source, &request, &PipelineOptions::default()).unwrap();
    let output = decode_output(&processed.encoded.data);
    for px in output.pixels() {
        for c in 0..3 {
            assert!((px[c] as i32 - 192).abs() <= 2);
        }
    }
    assert_eq!(processed.metrics.filter_count, 1);
}

#[test]
fn test_quarter_turn_keeps_crop_dimensions() {
    let source = decoded_source();
    let request = PipelineRequest::new(CropRectangle::new(200, 200, 300, 100))
        .with_transform(Transform::rotated(90.0));

    let raster = render(&source, &request, &PipelineOptions::default()).unwrap();
    assert_eq!(raster.dimensions(), (300, 100));
    // Every sample lands inside the source, so no fill shows
    assert!(raster.pixels().all(|px| *px != Rgba([255, 255, 255, 255])));
}

#[test]
fn test_half_turn_maps_corners() {
    let source = decoded_source();
    let request = PipelineRequest::new(CropRectangle::new(200, 200, 300, 100))
        .with_transform(Transform::rotated(180.0));

    let raster = render(&source, &request, &PipelineOptions::default()).unwrap();
    assert_eq!(raster.get_pixel(0, 0), source.pixels().get_pixel(499, 299));
    assert_eq!(raster.get_pixel(299, 99), source.pixels().get_pixel(200, 200));
}

#[test]
fn test_lossy_formats_decode_to_requested_size() {
    let source = decoded_source();
    for format in [OutputFormat::Jpeg, OutputFormat::WebP] {
        let request = PipelineRequest::new(CropRectangle::new(10, 20, 123, 77))
            .with_transform(Transform::identity().flip_horizontally())
            .with_output(OutputSpec::new(format, 0.6));
        let processed = process(&source, &request, &PipelineOptions::default()).unwrap();
        assert_eq!(processed.encoded.mime_type, format.mime_type());
        assert_eq!(decode_output(&processed.encoded.data).dimensions(), (123, 77));
        assert!(processed.metrics.ran(StageKind::Flip));
    }
}

#[test]
fn test_unknown_filter_fails_before_encoding() {
    let source = decoded_source();
    let request = PipelineRequest::new(CropRectangle::new(0, 0, 10, 10))
        .with_filters(vec![FilterDescriptor::new("emboss", json!(1))]);
    let err = process(&source, &request, &PipelineOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFilterKind);
}

#[test]
fn test_output_ceiling_requires_opt_in() {
    let wide = SourceImage::from_rgba(RgbaImage::from_pixel(5000, 2, Rgba([1, 2, 3, 255])));
    let request = PipelineRequest::new(CropRectangle::full(5000, 2));

    let err = render(&wide, &request, &PipelineOptions::default()).unwrap_err();
    assert_eq!(
        err,
        PipelineError::OutputTooLarge {
            width: 5000,
            height: 2,
            max_dimension: 4096
        }
    );

    let options = PipelineOptions {
        allow_large_output: true,
        ..Default::default()
    };
    assert_eq!(render(&wide, &request, &options).unwrap().dimensions(), (5000, 2));
}

#[test]
fn test_crop_outside_source_is_degenerate() {
    let source = decoded_source();
    let request = PipelineRequest::new(CropRectangle::new(1000, 0, 10, 10));
    let err = render(&source, &request, &PipelineOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DegenerateCrop);
}

#[test]
fn test_source_limits_are_enforced() {
    let bytes = fixtures::png_bytes(300, 200);

    let small_files = SourceLimits {
        max_file_size: 16,
        ..Default::default()
    };
    let err = SourceImage::decode(&bytes, &small_files).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileTooLarge);

    let narrow = SourceLimits {
        max_source_width: 100,
        ..Default::default()
    };
    let err = SourceImage::decode(&bytes, &narrow).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SourceTooLarge);

    let jpeg_only = SourceLimits {
        accepted_types: vec!["image/jpeg".to_string()],
        ..Default::default()
    };
    let err = SourceImage::decode(&bytes, &jpeg_only).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);

    let err = SourceImage::decode(b"definitely not an image", &SourceLimits::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
}

#[test]
fn test_decodes_every_accepted_input_format() {
    let raster = fixtures::pattern(40, 30);
    for format in [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Gif, ImageFormat::WebP] {
        let bytes = fixtures::encode_as(&raster, format);
        let source = SourceImage::decode(&bytes, &SourceLimits::default()).unwrap();
        assert_eq!(source.dimensions(), (40, 30), "{:?}", format);
        assert_eq!(source.format(), Some(format));
    }
}

#[test]
fn test_resize_after_circle_crop() {
    let source = decoded_source();
    let request = PipelineRequest::new(CropRectangle::new(100, 50, 400, 300))
        .with_shape(ShapeMask::Circle)
        .with_resize(150, 150)
        .with_output(OutputSpec::new(OutputFormat::Png, 1.0).with_preserve_alpha(true));

    let processed = process(&source, &request, &PipelineOptions::default()).unwrap();
    let output = decode_output(&processed.encoded.data);
    assert_eq!(output.dimensions(), (150, 150));
    assert_eq!(output.get_pixel(0, 0)[3], 0);
    assert_eq!(output.get_pixel(75, 75)[3], 255);
    assert!(processed.metrics.ran(StageKind::Resize));
}

#[test]
fn test_rotate_whole_image_onto_expanded_canvas() {
    let raster = fixtures::pattern(60, 40);
    let source = SourceImage::from_rgba(raster.clone());
    let output = OutputSpec::new(OutputFormat::Png, 1.0);

    let processed = rotate_image(&source, 270.0, &output, &PipelineOptions::default()).unwrap();
    let turned = decode_output(&processed.encoded.data);
    assert_eq!(turned.dimensions(), (40, 60));
    // Counter-clockwise quarter turn: source top-right lands at top-left
    assert_eq!(turned.get_pixel(0, 0), raster.get_pixel(59, 0));
    assert_eq!(turned.get_pixel(39, 59), raster.get_pixel(0, 39));

    let processed = rotate_image(&source, 45.0, &output, &PipelineOptions::default()).unwrap();
    let tilted = decode_output(&processed.encoded.data);
    // (60 + 40) / √2 ≈ 70.7
    assert_eq!(tilted.dimensions(), (71, 71));
    assert_eq!(*tilted.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
}
