//! Error types for the framework registry

use thiserror::Error;

/// Result type for framework operations
pub type Result<T> = std::result::Result<T, FrameworkError>;

/// Framework registry errors
#[derive(Error, Debug)]
pub enum FrameworkError {
    /// A descriptor referenced by slug does not exist
    #[error("Unknown framework slug: {slug}")]
    UnknownFramework { slug: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {message}")]
    Context { context: String, message: String },
}

impl FrameworkError {
    /// Get exit code for CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnknownFramework { .. } => 2,
            Self::Io(_) => 7,
            Self::Context { .. } => 1,
        }
    }
}
