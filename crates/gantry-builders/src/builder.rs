//! The builder contract
//!
//! Every framework adapter implements [`Builder`]: given a materialized
//! project snapshot and per-project settings, produce a [`BuildResult`].
//! Builders run the framework's own toolchain; they are async because the
//! bulk of their time is spent waiting on child processes.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use gantry_build_utils::FileBlob;

use crate::error::{BuilderError, Result};
use crate::output::BuildResult;
use crate::remix::RemixBuilder;
use crate::saber::SaberBuilder;
use crate::static_site::StaticSiteBuilder;

/// Per-project settings a user may override
#[derive(Debug, Clone, Default)]
pub struct BuilderConfig {
    /// Explicit install command; `Some("")` means skip installing
    pub install_command: Option<String>,
    /// Explicit build command, run verbatim through the shell
    pub build_command: Option<String>,
    /// Output directory override
    pub output_directory: Option<String>,
    /// Extra environment for spawned commands
    pub env: HashMap<String, String>,
}

/// Everything a builder needs for one build
#[derive(Debug)]
pub struct BuilderContext {
    /// Isolated directory the build runs in
    pub work_path: PathBuf,
    /// Relative path of the entry manifest (usually `package.json`)
    pub entrypoint: String,
    /// Project snapshot to materialize before building
    pub files: BTreeMap<String, FileBlob>,
    pub config: BuilderConfig,
}

impl BuilderContext {
    pub fn new(work_path: impl Into<PathBuf>, entrypoint: impl Into<String>) -> Self {
        Self {
            work_path: work_path.into(),
            entrypoint: entrypoint.into(),
            files: BTreeMap::new(),
            config: BuilderConfig::default(),
        }
    }

    /// The directory containing the entry manifest
    pub fn entry_dir(&self) -> PathBuf {
        match Path::new(&self.entrypoint).parent() {
            Some(parent) if parent != Path::new("") => self.work_path.join(parent),
            _ => self.work_path.clone(),
        }
    }
}

/// A framework build adapter
#[async_trait]
pub trait Builder: Send + Sync {
    /// The framework slug this builder handles
    fn slug(&self) -> &'static str;

    /// Run the build and normalize its output
    async fn build(&self, ctx: &BuilderContext) -> Result<BuildResult>;
}

/// Select the builder for a detected framework. Frameworks without a
/// dedicated adapter fall back to the static-site builder.
pub fn builder_for_slug(slug: Option<&str>) -> Result<Box<dyn Builder>> {
    match slug {
        Some("remix") => Ok(Box::new(RemixBuilder::new())),
        Some("saber") => Ok(Box::new(SaberBuilder::new())),
        None => Ok(Box::new(StaticSiteBuilder::new())),
        Some(other) => {
            if gantry_frameworks::framework_by_slug(other).is_ok() {
                Ok(Box::new(StaticSiteBuilder::new()))
            } else {
                Err(BuilderError::UnknownBuilder {
                    slug: other.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_dir_for_root_manifest() {
        let ctx = BuilderContext::new("/tmp/work", "package.json");
        assert_eq!(ctx.entry_dir(), PathBuf::from("/tmp/work"));
    }

    #[test]
    fn test_entry_dir_for_nested_manifest() {
        let ctx = BuilderContext::new("/tmp/work", "apps/web/package.json");
        assert_eq!(ctx.entry_dir(), PathBuf::from("/tmp/work/apps/web"));
    }

    #[test]
    fn test_builder_selection() {
        assert_eq!(builder_for_slug(Some("remix")).unwrap().slug(), "remix");
        assert_eq!(builder_for_slug(Some("saber")).unwrap().slug(), "saber");
        assert_eq!(builder_for_slug(None).unwrap().slug(), "static");
        assert_eq!(builder_for_slug(Some("jekyll")).unwrap().slug(), "static");
        assert!(builder_for_slug(Some("no-such")).is_err());
    }
}
