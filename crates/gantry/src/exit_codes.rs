//! Exit codes for the CLI
//!
//! One constant per code the error enums can actually produce, so the
//! ladder stays in sync with `exit_code()` on each error type.

#![allow(dead_code)]

/// Success
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// Unknown framework or builder
pub const CONFIG_ERROR: i32 = 2;

/// Unsupported runtime version or invalid pattern
pub const VERSION_ERROR: i32 = 4;

/// Build produced no usable output
pub const OUTPUT_ERROR: i32 = 5;

/// IO error
pub const IO_ERROR: i32 = 7;

/// Trace entrypoint missing after a build
pub const TRACE_ERROR: i32 = 13;

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_builders::BuilderError;
    use gantry_frameworks::FrameworkError;

    #[test]
    fn test_codes_match_error_mapping() {
        let unknown = FrameworkError::UnknownFramework {
            slug: "nope".to_string(),
        };
        assert_eq!(unknown.exit_code(), CONFIG_ERROR);

        let missing = BuilderError::MissingBuildOutput {
            path: "build/index.js".to_string(),
            message: "no server bundle".to_string(),
        };
        assert_eq!(missing.exit_code(), OUTPUT_ERROR);

        let no_builder = BuilderError::UnknownBuilder {
            slug: "nope".to_string(),
        };
        assert_eq!(no_builder.exit_code(), CONFIG_ERROR);
    }
}
