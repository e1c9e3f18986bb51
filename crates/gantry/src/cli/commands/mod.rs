//! CLI commands

mod build;
mod detect;
mod frameworks;

pub use build::BuildCommand;
pub use detect::DetectCommand;
pub use frameworks::FrameworksCommand;
