//! Saber build adapter
//!
//! Saber emits a fully static site into `public`, so the adapter is
//! install, build, collect. The only Saber-specific piece is the route
//! list: generated assets under `/_saber/` are content-hashed and get an
//! immutable cache header, and misses land on the generated 404 page.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use tracing::instrument;

use gantry_build_utils::{
    download, env_for_package_manager, exec_command, glob, run_default_install,
    run_package_json_script, scan_parent_dirs, PackageJson, SpawnOptions,
};
use gantry_frameworks::RouteRule;

use crate::builder::{Builder, BuilderContext};
use crate::error::{BuilderError, Result};
use crate::output::{BuildResult, Output, StaticFile};

pub struct SaberBuilder;

impl SaberBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SaberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Builder for SaberBuilder {
    fn slug(&self) -> &'static str {
        "saber"
    }

    #[instrument(skip(self, ctx), fields(work_path = %ctx.work_path.display()))]
    async fn build(&self, ctx: &BuilderContext) -> Result<BuildResult> {
        if !ctx.files.is_empty() {
            download(&ctx.files, &ctx.work_path)?;
        }
        let entry_dir = ctx.entry_dir();
        let pkg = PackageJson::load(&entry_dir).unwrap_or_default();
        let opts = spawn_options(ctx, &entry_dir);

        match ctx.config.install_command.as_deref() {
            Some(cmd) if cmd.trim().is_empty() => {}
            Some(cmd) => exec_command(cmd, &opts).await?,
            None => run_default_install(&entry_dir, &opts).await?,
        }

        match ctx.config.build_command.as_deref() {
            Some(cmd) if !cmd.trim().is_empty() => exec_command(cmd, &opts).await?,
            _ if pkg.has_script("build") => {
                run_package_json_script(&entry_dir, "build", &opts).await?
            }
            _ => exec_command("npx saber build", &opts).await?,
        }

        let output_dir = ctx
            .config
            .output_directory
            .clone()
            .unwrap_or_else(|| "public".to_string());
        let public = entry_dir.join(&output_dir);
        if !public.is_dir() {
            return Err(BuilderError::MissingBuildOutput {
                path: output_dir,
                message: "saber build did not produce an output directory".to_string(),
            });
        }

        let mut output = BTreeMap::new();
        for (rel, file_ref) in glob("**", &public)? {
            output.insert(rel, Output::Static(StaticFile::new(file_ref)));
        }

        Ok(BuildResult {
            routes: saber_routes(),
            output,
        })
    }
}

fn spawn_options(ctx: &BuilderContext, entry_dir: &Path) -> SpawnOptions {
    let mut base: HashMap<String, String> = std::env::vars().collect();
    base.extend(ctx.config.env.clone());
    let scan = scan_parent_dirs(entry_dir);
    let mut env = env_for_package_manager(&scan, &base);
    env.entry("NODE_ENV".to_string())
        .or_insert_with(|| "production".to_string());
    SpawnOptions {
        cwd: entry_dir.to_path_buf(),
        env,
    }
}

fn saber_routes() -> Vec<RouteRule> {
    vec![
        RouteRule::src("/_saber/.*").with_header("cache-control", "max-age=31536000, immutable"),
        RouteRule::filesystem(),
        RouteRule::src(".*").with_status(404).with_dest("404.html"),
    ]
}
