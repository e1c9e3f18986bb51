//! Error types for build utilities

use std::path::PathBuf;
use thiserror::Error;

/// Result type for build utility operations
pub type Result<T> = std::result::Result<T, BuildUtilsError>;

/// Build utility errors
#[derive(Error, Debug)]
pub enum BuildUtilsError {
    /// The project declared a Node.js version range no supported runtime satisfies
    #[error(
        "Found `engines` in `package.json` with an unsupported Node.js version range: {declared}\n\
         Please use one of the following supported ranges: {valid_ranges:?}"
    )]
    UnsupportedNodeVersion {
        declared: String,
        valid_ranges: Vec<String>,
    },

    /// Command execution failed
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// Entrypoint for tracing does not exist
    #[error("Trace entrypoint not found at {}", path.display())]
    EntrypointNotFound { path: PathBuf },

    /// Invalid glob pattern
    #[error("Invalid glob pattern '{pattern}': {message}")]
    InvalidGlobPattern { pattern: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {message}")]
    Context { context: String, message: String },
}

impl BuildUtilsError {
    /// Create a context error
    pub fn context(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Get exit code for CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnsupportedNodeVersion { .. } => 4,
            Self::CommandFailed { exit_code, .. } => exit_code.unwrap_or(1),
            Self::EntrypointNotFound { .. } => 13,
            Self::InvalidGlobPattern { .. } => 4,
            Self::Io(_) => 7,
            Self::Context { .. } => 1,
        }
    }
}
