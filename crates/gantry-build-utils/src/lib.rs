//! Gantry Build Utils - primitives shared by all framework builders
//!
//! This crate owns the pieces every builder needs but no builder should
//! reimplement: reading framework config files regardless of format,
//! selecting a supported Node.js runtime, materializing input file sets,
//! detecting the project's package manager, spawning build processes, and
//! tracing the module closure of a server entrypoint.
//!
//! Nothing in here knows about any particular framework.

pub mod config_file;
pub mod error;
pub mod fs;
pub mod node_version;
pub mod spawn;
pub mod trace;

pub use config_file::read_config_file;
pub use error::{BuildUtilsError, Result};
pub use fs::{
    download, env_for_package_manager, glob, scan_parent_dirs, FileBlob, FileRef, PackageJson,
    PackageManager, ProjectScan,
};
pub use node_version::{RuntimeTable, RuntimeVersion};
pub use spawn::{exec_command, run_default_install, run_package_json_script, SpawnOptions};
pub use trace::{ModuleTracer, Trace, TraceConditions, TraceWarning, TraceWarningCode, Tracer};
