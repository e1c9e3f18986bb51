//! Gantry Builders - framework build adapters
//!
//! A builder takes a project snapshot, runs the framework's native build
//! inside an isolated work directory, and normalizes whatever the build
//! produced into the platform's deployable primitives: static files,
//! serverless functions, and edge functions, plus an ordered route list.
//!
//! Builders never interpret project code. Anything that needs to know
//! what the project's own config evaluates to is answered by structural
//! inspection of the source text.

pub mod builder;
pub mod error;
pub mod module_format;
pub mod output;
pub mod remix;
pub mod saber;
pub mod static_routes;
pub mod static_site;

pub use builder::{builder_for_slug, Builder, BuilderConfig, BuilderContext};
pub use error::{BuilderError, Result};
pub use module_format::{detect_module_format, ModuleFormat};
pub use output::{BuildResult, EdgeFunction, Output, ServerlessFunction, StaticFile};
pub use remix::RemixBuilder;
pub use saber::SaberBuilder;
pub use static_site::StaticSiteBuilder;
