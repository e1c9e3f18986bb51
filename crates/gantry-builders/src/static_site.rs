//! Fallback static-site adapter
//!
//! Used for frameworks without a dedicated adapter and for projects with
//! no recognized framework at all. Runs the configured commands when
//! present, then serves whatever the output directory holds.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, instrument};

use gantry_build_utils::{
    download, env_for_package_manager, exec_command, glob, run_default_install,
    run_package_json_script, scan_parent_dirs, PackageJson, SpawnOptions,
};
use gantry_frameworks::RouteRule;

use crate::builder::{Builder, BuilderContext};
use crate::error::Result;
use crate::output::{BuildResult, Output, StaticFile};

pub struct StaticSiteBuilder;

impl StaticSiteBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StaticSiteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Builder for StaticSiteBuilder {
    fn slug(&self) -> &'static str {
        "static"
    }

    #[instrument(skip(self, ctx), fields(work_path = %ctx.work_path.display()))]
    async fn build(&self, ctx: &BuilderContext) -> Result<BuildResult> {
        if !ctx.files.is_empty() {
            download(&ctx.files, &ctx.work_path)?;
        }
        let entry_dir = ctx.entry_dir();
        let pkg = PackageJson::load(&entry_dir);

        // A project without a manifest is plain files; nothing to run.
        if pkg.is_some() || ctx.config.build_command.is_some() {
            let opts = spawn_options(ctx, &entry_dir);

            match ctx.config.install_command.as_deref() {
                Some(cmd) if cmd.trim().is_empty() => {}
                Some(cmd) => exec_command(cmd, &opts).await?,
                None if pkg.is_some() => run_default_install(&entry_dir, &opts).await?,
                None => {}
            }

            match ctx.config.build_command.as_deref() {
                Some(cmd) if !cmd.trim().is_empty() => exec_command(cmd, &opts).await?,
                _ if pkg.as_ref().is_some_and(|p| p.has_script("build")) => {
                    run_package_json_script(&entry_dir, "build", &opts).await?
                }
                _ => debug!("no build command, serving files as-is"),
            }
        }

        let serve_dir = resolve_serve_dir(ctx, &entry_dir);
        let mut output = BTreeMap::new();
        for (rel, file_ref) in glob("**", &serve_dir)? {
            output.insert(rel, Output::Static(StaticFile::new(file_ref)));
        }

        Ok(BuildResult {
            routes: vec![RouteRule::filesystem(), RouteRule::src("/(.*)").with_status(404)],
            output,
        })
    }
}

/// The directory to serve: the explicit override, else `public` when it
/// exists, else the project root itself.
fn resolve_serve_dir(ctx: &BuilderContext, entry_dir: &Path) -> std::path::PathBuf {
    if let Some(dir) = &ctx.config.output_directory {
        return entry_dir.join(dir);
    }
    let public = entry_dir.join("public");
    if public.is_dir() {
        public
    } else {
        entry_dir.to_path_buf()
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
