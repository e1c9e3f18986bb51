//! Error types for builders

use thiserror::Error;

use gantry_build_utils::BuildUtilsError;

/// Result type for builder operations
pub type Result<T> = std::result::Result<T, BuilderError>;

/// Builder errors
#[derive(Error, Debug)]
pub enum BuilderError {
    /// A shared build-utils operation failed
    #[error(transparent)]
    BuildUtils(#[from] BuildUtilsError),

    /// The framework build completed but left no usable output
    #[error("Build produced no output at {path}: {message}")]
    MissingBuildOutput { path: String, message: String },

    /// No builder is registered for the requested framework
    #[error("No builder available for framework: {slug}")]
    UnknownBuilder { slug: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {message}")]
    Context { context: String, message: String },
}

impl BuilderError {
    pub fn context(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Get exit code for CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BuildUtils(e) => e.exit_code(),
            Self::MissingBuildOutput { .. } => 5,
            Self::UnknownBuilder { .. } => 2,
            Self::Io(_) => 7,
            Self::Context { .. } => 1,
        }
    }
}
