//! Gantry Frameworks - the framework registry and detector
//!
//! An ordered catalog of framework descriptors: how to recognize each
//! framework from a project tree, which commands build it, where its
//! output lands, and which routing rules the platform should apply by
//! default. The catalog is pure data plus small resolver functions; the
//! only I/O is reading files already present on disk.
//!
//! Table order encodes human-curated priority: a framework layered on
//! top of another (e.g. a meta-framework bundling a base library) must
//! appear before its base so detection picks the more specific entry.
//! The fallback "Other" descriptor matches everything and is always last.

pub mod descriptor;
pub mod detection;
pub mod error;
pub mod output_dir;
pub mod registry;
pub mod routes;

pub use descriptor::{CommandSetting, FrameworkDescriptor, OutputDir};
pub use detection::{detect_framework, DetectionRule, FileCheck};
pub use error::{FrameworkError, Result};
pub use output_dir::resolve_output_dir;
pub use registry::{builtin_frameworks, framework_by_slug};
pub use routes::RouteRule;
