// Error type tests

use kirinuki::error::{ErrorKind, PipelineError};
use rstest::rstest;

#[rstest]
#[case(PipelineError::invalid_dimension("width", 0.0), ErrorKind::InvalidDimension, "invalid_dimension")]
#[case(PipelineError::EmptySource { width: 0, height: 3 }, ErrorKind::EmptySource, "empty_source")]
#[case(
    PipelineError::DegenerateCrop { x: 1, y: 2, width: 0, height: 4 },
    ErrorKind::DegenerateCrop,
    "degenerate_crop"
)]
#[case(PipelineError::unsupported_filter("emboss"), ErrorKind::UnsupportedFilterKind, "unsupported_filter_kind")]
#[case(PipelineError::encoding("png", "boom"), ErrorKind::EncodingError, "encoding_error")]
#[case(PipelineError::decode_failed("truncated"), ErrorKind::DecodeFailed, "decode_failed")]
#[case(PipelineError::unsupported_format("image/tiff"), ErrorKind::UnsupportedFormat, "unsupported_format")]
#[case(PipelineError::FileTooLarge { size: 2, max_size: 1 }, ErrorKind::FileTooLarge, "file_too_large")]
#[case(PipelineError::source_too_large(20000, 20000, 100), ErrorKind::SourceTooLarge, "source_too_large")]
#[case(
    PipelineError::OutputTooLarge { width: 5000, height: 10, max_dimension: 4096 },
    ErrorKind::OutputTooLarge,
    "output_too_large"
)]
#[case(PipelineError::invalid_param("zoom", "negative"), ErrorKind::InvalidParameter, "invalid_parameter")]
fn test_error_kinds(#[case] err: PipelineError, #[case] kind: ErrorKind, #[case] label: &str) {
    assert_eq!(err.kind(), kind);
    assert_eq!(kind.as_str(), label);
    assert_eq!(kind.to_string(), label);
}

#[test]
fn test_messages_carry_context() {
    let err = PipelineError::unsupported_filter("emboss");
    assert_eq!(err.to_string(), "Unsupported filter kind: emboss");

    let err = PipelineError::OutputTooLarge {
        width: 5000,
        height: 300,
        max_dimension: 4096,
    };
    assert_eq!(err.to_string(), "Output 5000x300 exceeds the 4096px ceiling");

    let err = PipelineError::source_too_large(20000, 10000, 100_000_000);
    assert!(err.to_string().contains("200000000 pixels"));
}

#[test]
fn test_parameter_errors_are_distinguished() {
    assert!(PipelineError::invalid_dimension("height", -1.0).is_parameter_error());
    assert!(PipelineError::unsupported_filter("x").is_parameter_error());
    assert!(!PipelineError::decode_failed("bad header").is_parameter_error());
    assert!(!PipelineError::encoding("jpeg", "io").is_parameter_error());
}

#[test]
fn test_errors_convert_into_anyhow() {
    fn fails() -> anyhow::Result<()> {
        Err(PipelineError::unsupported_format("image/bmp"))?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert!(err.to_string().contains("image/bmp"));
    assert!(err.downcast_ref::<PipelineError>().is_some());
}
