//! Tests for error types including source chaining and message formatting

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::path::Path;

    use setlyze::AnalysisError;
    use setlyze::io::error::{WithPath, computation_error, invalid_parameter, invalid_source};

    // Tests error source chaining works correctly
    // Verified by breaking source chain
    #[test]
    fn test_error_source_chain() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = AnalysisError::FileSystem {
            path: "/tmp/report.json".into(),
            operation: "write report",
            source: io_error,
        };
        assert!(error.source().is_some());
        assert_eq!(
            error.to_string(),
            "File system error during write report on '/tmp/report.json': file not found"
        );
    }

    // Tests the path helper wraps I/O errors
    #[test]
    fn test_with_path() {
        let result: std::io::Result<()> = Err(std::io::Error::other("disk full"));
        let err = result
            .with_path(Path::new("out/summary.json"), "write report")
            .expect_err("error kept");
        assert!(matches!(
            err,
            AnalysisError::FileSystem {
                operation: "write report",
                ..
            }
        ));
        assert!(err.to_string().contains("out/summary.json"));
    }

    // Tests parameter errors name the parameter, value and reason
    #[test]
    fn test_invalid_parameter_message() {
        let err = invalid_parameter("repeats", &0, &"must be between 1 and 100000");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'repeats' = '0': must be between 1 and 100000"
        );
    }

    // Tests the remaining helpers and plain variants
    #[test]
    fn test_helper_messages() {
        assert_eq!(
            computation_error("shapiro-wilk", &"identical values").to_string(),
            "Computation error in shapiro-wilk: identical values"
        );
        assert_eq!(
            invalid_source(&"no plates").to_string(),
            "Invalid source data: no plates"
        );
        assert_eq!(
            AnalysisError::InvalidSpot { number: 26 }.to_string(),
            "Spot number 26 is not on the plate (expected 1 to 25)"
        );
        assert_eq!(
            AnalysisError::EmptySelection {
                reason: "no species selected".to_string()
            }
            .to_string(),
            "Empty selection: no species selected"
        );
    }

    // Tests JSON errors convert through the question mark operator
    #[test]
    fn test_serialization_conversion() {
        fn parse() -> setlyze::Result<serde_json::Value> {
            Ok(serde_json::from_str("{not json")?)
        }
        assert!(matches!(parse(), Err(AnalysisError::Serialization(_))));
    }
}
