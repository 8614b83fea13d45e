// Encoder tests

use image::{Rgba, RgbaImage};
use kirinuki::color::Color;
use kirinuki::encoder::{encode, EncoderFactory, OutputFormat, OutputSpec, WEBP_MAX_DIMENSION};
use kirinuki::error::{ErrorKind, PipelineError};
use rstest::rstest;

fn translucent(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| {
        Rgba([(x * 7) as u8, (y * 11) as u8, 90, ((x + y) * 9) as u8])
    })
}

#[test]
fn test_png_round_trip_is_lossless() {
    let raster = translucent(23, 19);
    let encoded = encode(&raster, &OutputSpec::new(OutputFormat::Png, 0.2)).unwrap();
    assert_eq!(encoded.mime_type, "image/png");

    let decoded = image::load_from_memory(&encoded.data).unwrap().to_rgba8();
    assert_eq!(decoded, raster);
}

#[test]
fn test_jpeg_flattens_against_background() {
    let clear = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 0]));
    let spec = OutputSpec::new(OutputFormat::Jpeg, 1.0).with_background(Color::new(255, 0, 0));
    let encoded = encode(&clear, &spec).unwrap();

    let decoded = image::load_from_memory(&encoded.data).unwrap().to_rgb8();
    let px = decoded.get_pixel(8, 8);
    assert!(px[0] > 240 && px[1] < 20 && px[2] < 20, "{:?}", px);
}

#[test]
fn test_webp_produces_riff_container() {
    let encoded = encode(&translucent(10, 10), &OutputSpec::new(OutputFormat::WebP, 0.8)).unwrap();
    assert_eq!(&encoded.data[0..4], b"RIFF");
    assert_eq!(&encoded.data[8..12], b"WEBP");
    assert_eq!((encoded.width, encoded.height), (10, 10));
}

#[test]
fn test_webp_over_codec_limit_is_an_encoding_error() {
    let wide = RgbaImage::from_pixel(WEBP_MAX_DIMENSION + 1, 1, Rgba([9, 9, 9, 255]));
    let err = encode(&wide, &OutputSpec::new(OutputFormat::WebP, 0.8)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EncodingError);
    assert!(err.to_string().contains("16383"), "{}", err);

    let tall = RgbaImage::from_pixel(1, WEBP_MAX_DIMENSION + 1, Rgba([9, 9, 9, 255]));
    assert!(encode(&tall, &OutputSpec::new(OutputFormat::WebP, 0.8)).is_err());
}

#[test]
fn test_webp_at_codec_limit_encodes() {
    let edge = RgbaImage::from_pixel(WEBP_MAX_DIMENSION, 1, Rgba([9, 9, 9, 255]));
    let encoded = encode(&edge, &OutputSpec::new(OutputFormat::WebP, 0.5)).unwrap();
    assert_eq!(encoded.width, WEBP_MAX_DIMENSION);
}

#[test]
fn test_default_output_is_jpeg_at_0_8() {
    let spec = OutputSpec::default();
    assert_eq!(spec.format, OutputFormat::Jpeg);
    assert_eq!(spec.quality, 0.8);
    assert_eq!(spec.background_color, Color::white());
    assert!(!spec.preserve_alpha);

    let parsed: OutputSpec = serde_json::from_str("{}").unwrap();
    assert_eq!(parsed, spec);
}

#[rstest]
#[case(OutputFormat::Png)]
#[case(OutputFormat::Jpeg)]
#[case(OutputFormat::WebP)]
fn test_zero_dimension_raster_fails(#[case] format: OutputFormat) {
    let err = encode(&RgbaImage::new(0, 5), &OutputSpec::new(format, 0.9)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EncodingError);
    assert!(matches!(err, PipelineError::EncodingError { .. }));
}

#[rstest]
#[case(-3.0, 0.1)]
#[case(0.0, 0.1)]
#[case(0.55, 0.55)]
#[case(7.0, 1.0)]
fn test_lossy_quality_clamp(#[case] quality: f32, #[case] expected: f32) {
    let spec = OutputSpec::new(OutputFormat::Jpeg, quality);
    assert_eq!(spec.lossy_quality(), expected);
}

#[test]
fn test_lower_quality_is_smaller() {
    let raster = RgbaImage::from_fn(64, 64, |x, y| {
        Rgba([(x * 4) as u8, (y * 4) as u8, ((x * y) % 256) as u8, 255])
    });
    let high = encode(&raster, &OutputSpec::new(OutputFormat::Jpeg, 1.0)).unwrap();
    let low = encode(&raster, &OutputSpec::new(OutputFormat::Jpeg, 0.1)).unwrap();
    assert!(low.len() < high.len());
}

#[rstest]
#[case(OutputFormat::Png, true)]
#[case(OutputFormat::Jpeg, false)]
#[case(OutputFormat::WebP, false)]
fn test_factory_transparency(#[case] format: OutputFormat, #[case] transparent: bool) {
    let encoder = EncoderFactory::create(format);
    assert_eq!(encoder.format(), format);
    assert_eq!(encoder.supports_transparency(), transparent);
}

#[test]
fn test_fill_color_depends_on_alpha_support() {
    let png = OutputSpec::new(OutputFormat::Png, 1.0).with_preserve_alpha(true);
    assert_eq!(png.fill_color(), Color::transparent());

    let jpeg = OutputSpec::new(OutputFormat::Jpeg, 1.0)
        .with_preserve_alpha(true)
        .with_background(Color::new(1, 2, 3));
    assert_eq!(jpeg.fill_color(), Color::new(1, 2, 3));
}

#[rstest]
#[case("png", OutputFormat::Png)]
#[case("JPG", OutputFormat::Jpeg)]
#[case("jpeg", OutputFormat::Jpeg)]
#[case("webp", OutputFormat::WebP)]
fn test_format_parsing(#[case] name: &str, #[case] expected: OutputFormat) {
    assert_eq!(name.parse::<OutputFormat>().unwrap(), expected);
}
