// Configuration module unit tests

use std::io::Write;

use kirinuki::batch::CropPlan;
use kirinuki::color::Color;
use kirinuki::compositor::ShapeMask;
use kirinuki::config::*;
use kirinuki::encoder::OutputFormat;
use kirinuki::geometry::CropRectangle;

const FULL_CONFIG: &str = r##"
logging:
  level: debug
  json: true
limits:
  max_file_size: 5242880
  max_source_width: 8000
  max_source_height: 6000
  accepted_types: ["image/png", "image/jpeg"]
  max_output_dimension: 2048
batch:
  max_images: 10
  workers: 2
  file_prefix: thumb
output:
  format: jpeg
  quality: 0.75
  backgroundColor: "#fafafa"
edit:
  aspect_ratio: "16:9"
  shape: rectangle
  transform:
    rotation: 180
  filters:
    - kind: contrast
      params: 120
    - kind: hueRotate
      params: { degrees: 45 }
"##;

#[test]
fn test_can_deserialize_full_config() {
    let config = Config::from_yaml_with_env(FULL_CONFIG).expect("Failed to parse config");

    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
    assert_eq!(config.limits.source.max_file_size, 5 * 1024 * 1024);
    assert_eq!(config.limits.source.accepted_types.len(), 2);
    assert_eq!(config.limits.max_output_dimension, 2048);
    assert_eq!(config.batch.file_prefix, "thumb");
    assert_eq!(config.output.format, OutputFormat::Jpeg);
    assert_eq!(config.output.background_color, Color::new(0xfa, 0xfa, 0xfa));
    assert_eq!(config.edit.transform.rotation_degrees, 180.0);
    assert_eq!(config.edit.filters.len(), 2);

    assert!(config.validate().is_ok());
}

#[test]
fn test_can_load_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FULL_CONFIG.as_bytes()).unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.batch.max_images, 10);
}

#[test]
fn test_missing_file_is_error() {
    let err = Config::from_file("/nonexistent/kirinuki.yaml").unwrap_err();
    assert!(err.contains("Failed to read config file"));
}

#[test]
fn test_malformed_yaml_is_error() {
    assert!(Config::from_yaml_with_env("batch: [unclosed").is_err());
}

#[test]
fn test_env_var_in_nested_field() {
    std::env::set_var("KIRINUKI_CFG_TEST_FORMAT", "webp");
    let config =
        Config::from_yaml_with_env("output:\n  format: ${KIRINUKI_CFG_TEST_FORMAT}\n").unwrap();
    assert_eq!(config.output.format, OutputFormat::WebP);
}

#[test]
fn test_unknown_filter_fails_validation() {
    let yaml = r#"
edit:
  filters:
    - kind: emboss
      params: 3
"#;
    let config = Config::from_yaml_with_env(yaml).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.contains("emboss"), "{}", err);
}

#[test]
fn test_non_image_mime_type_fails_validation() {
    let yaml = "limits:\n  accepted_types: [\"text/plain\"]\n";
    let config = Config::from_yaml_with_env(yaml).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_bad_aspect_ratio_fails_validation() {
    let config = Config::from_yaml_with_env("edit:\n  aspect_ratio: \"wide\"\n").unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_crop_outside_reference_fails_validation() {
    let yaml = r#"
edit:
  crop: { x: 900, y: 0, width: 200, height: 100 }
  reference: { width: 1000, height: 800 }
"#;
    let config = Config::from_yaml_with_env(yaml).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_crop_plan_selection() {
    let mut edit = EditConfig {
        aspect_ratio: Some("1:1".to_string()),
        ..Default::default()
    };
    assert!(matches!(edit.crop_plan(false).unwrap(), CropPlan::Centered(Some(_))));

    let crop = CropRectangle::new(10, 10, 50, 50);
    edit.crop = Some(crop);
    assert_eq!(edit.crop_plan(true).unwrap(), CropPlan::Fixed(crop));

    edit.reference = Some(ReferenceSize {
        width: 100,
        height: 100,
    });
    assert_eq!(
        edit.crop_plan(true).unwrap(),
        CropPlan::Scaled {
            crop,
            reference: (100, 100)
        }
    );
    assert_eq!(edit.crop_plan(false).unwrap(), CropPlan::Fixed(crop));
}

#[test]
fn test_job_carries_edit_settings() {
    let edit = EditConfig {
        shape: ShapeMask::Circle,
        ..Default::default()
    };
    let config = Config::default();
    let job = edit.to_job(config.output, false).unwrap();
    assert_eq!(job.shape, ShapeMask::Circle);
    assert_eq!(job.output, config.output);
    assert!(matches!(job.crop, CropPlan::Centered(None)));
}
