//! Remix build adapter
//!
//! Runs `remix build` against a patched `remix.config.js` that pins the
//! settings the platform depends on, then splits the result into a server
//! function, optional edge function, and the static asset set.
//!
//! The user's config file is moved aside and restored when the build
//! finishes, whether it succeeded or not. The patched replacement spreads
//! the original config so user settings survive except for the pinned
//! keys.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use gantry_build_utils::{
    download, env_for_package_manager, exec_command, glob, run_default_install,
    run_package_json_script, scan_parent_dirs, FileRef, ModuleTracer, PackageJson, RuntimeTable,
    SpawnOptions, TraceConditions, TraceWarningCode, Tracer,
};
use gantry_frameworks::{routes::immutable_asset_rule, RouteRule};

use crate::builder::{Builder, BuilderContext};
use crate::error::{BuilderError, Result};
use crate::module_format::{detect_module_format, ModuleFormat};
use crate::output::{BuildResult, EdgeFunction, Output, ServerlessFunction, StaticFile};
use crate::static_routes::scan_route_modules;

const CONFIG_FILE: &str = "remix.config.js";
const CONFIG_ASIDE: &str = "remix.config.original.js";
const SERVER_BUILD_PATH: &str = "build/index.js";
const SERVER_HANDLER: &str = "build/index.mjs";

/// The package whose absence the tracer reports as a missing adapter
const LEGACY_ADAPTER_PACKAGE: &str = "@remix-run/gantry";

/// Bundled stand-in for projects that predate the adapter package
const ADAPTER_SHIM: &str = "export { createRequestHandler } from \"@remix-run/server-runtime\";\n";
const ADAPTER_SHIM_PATH: &str = "build/gantry-adapter-shim.mjs";

pub struct RemixBuilder;

impl RemixBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RemixBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Builder for RemixBuilder {
    fn slug(&self) -> &'static str {
        "remix"
    }

    #[instrument(skip(self, ctx), fields(work_path = %ctx.work_path.display()))]
    async fn build(&self, ctx: &BuilderContext) -> Result<BuildResult> {
        if !ctx.files.is_empty() {
            download(&ctx.files, &ctx.work_path)?;
        }
        let entry_dir = ctx.entry_dir();

        let pkg = PackageJson::load(&entry_dir).unwrap_or_default();
        let runtime =
            RuntimeTable::builtin().resolve(pkg.engines_node(), Utc::now().date_naive())?;
        info!(runtime = %runtime.runtime, "selected node runtime");

        let opts = spawn_options(ctx, &entry_dir);

        run_install(ctx, &entry_dir, &opts).await?;

        {
            let _config = ConfigPatchGuard::apply(&entry_dir)?;
            run_build(ctx, &entry_dir, &pkg, &opts).await?;
        }

        finalize_server_build(&entry_dir)?;

        let route_modules = scan_route_modules(&entry_dir.join("app/routes"));

        let node_fn = Arc::new(trace_node_function(&entry_dir, &runtime.runtime)?);
        let edge_fn = if route_modules.iter().any(|r| r.edge) {
            Some(Arc::new(trace_edge_function(&entry_dir)?))
        } else {
            None
        };

        let mut output = BTreeMap::new();

        let output_dir = ctx
            .config
            .output_directory
            .clone()
            .unwrap_or_else(|| "public".to_string());
        for (rel, file_ref) in glob("**", &entry_dir.join(&output_dir))? {
            let sha256 = file_ref.sha256().ok();
            output.insert(
                rel,
                Output::Static(StaticFile {
                    file: file_ref,
                    content_type: None,
                    sha256,
                }),
            );
        }

        // Every discovered route maps to a function reference; edge
        // routes share one edge instance, everything else the node one.
        for route in &route_modules {
            let handler = match (&edge_fn, route.edge) {
                (Some(edge), true) => Output::Edge(Arc::clone(edge)),
                _ => Output::Serverless(Arc::clone(&node_fn)),
            };
            output.insert(route.path.clone(), handler);
        }
        output
            .entry("index".to_string())
            .or_insert_with(|| Output::Serverless(Arc::clone(&node_fn)));
        // The 404 handler prefers the edge function when one exists.
        output.insert(
            "404".to_string(),
            match &edge_fn {
                Some(edge) => Output::Edge(Arc::clone(edge)),
                None => Output::Serverless(Arc::clone(&node_fn)),
            },
        );

        let routes = vec![
            immutable_asset_rule("^/build/(.*)$"),
            RouteRule::filesystem(),
            RouteRule::src("/(.*)").with_dest("/404"),
        ];

        Ok(BuildResult { routes, output })
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

async fn run_install(ctx: &BuilderContext, entry_dir: &Path, opts: &SpawnOptions) -> Result<()> {
    match ctx.config.install_command.as_deref() {
        Some(cmd) if cmd.trim().is_empty() => {
            debug!("install command is empty, skipping install");
            Ok(())
        }
        Some(cmd) => Ok(exec_command(cmd, opts).await?),
        None => Ok(run_default_install(entry_dir, opts).await?),
    }
}

/// Pick the build command: explicit setting, then the project's
/// `gantry-build` or `build` script, then the framework default.
async fn run_build(
    ctx: &BuilderContext,
    entry_dir: &Path,
    pkg: &PackageJson,
    opts: &SpawnOptions,
) -> Result<()> {
    match ctx.config.build_command.as_deref() {
        Some(cmd) if !cmd.trim().is_empty() => Ok(exec_command(cmd, opts).await?),
        _ if pkg.has_script("gantry-build") => {
            Ok(run_package_json_script(entry_dir, "gantry-build", opts).await?)
        }
        _ if pkg.has_script("build") => {
            Ok(run_package_json_script(entry_dir, "build", opts).await?)
        }
        _ => Ok(exec_command("npx remix build", opts).await?),
    }
}

/// Restores the user's `remix.config.js` on drop.
struct ConfigPatchGuard {
    config_path: PathBuf,
    aside_path: PathBuf,
    had_original: bool,
}

impl ConfigPatchGuard {
    /// Move the user's config aside and write the patched replacement.
    fn apply(entry_dir: &Path) -> Result<Self> {
        let config_path = entry_dir.join(CONFIG_FILE);
        let aside_path = entry_dir.join(CONFIG_ASIDE);

        let format;
        let had_original = config_path.is_file();
        if had_original {
            let source = std::fs::read_to_string(&config_path)?;
            format = detect_module_format(&source);
            std::fs::rename(&config_path, &aside_path)?;
        } else {
            format = project_module_format(entry_dir);
        }

        std::fs::write(&config_path, patched_config(format, had_original))?;
        debug!(format = ?format, had_original, "patched remix config");

        Ok(Self {
            config_path,
            aside_path,
            had_original,
        })
    }
}

impl Drop for ConfigPatchGuard {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.config_path) {
            warn!(error = %err, "failed to remove patched remix config");
        }
        if self.had_original {
            if let Err(err) = std::fs::rename(&self.aside_path, &self.config_path) {
                warn!(error = %err, "failed to restore original remix config");
            }
        }
    }
}

/// Module format for a fresh config, from the project's `type` field.
fn project_module_format(entry_dir: &Path) -> ModuleFormat {
    let manifest = entry_dir.join("package.json");
    let value: Option<serde_json::Value> = std::fs::read_to_string(manifest)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok());
    match value.and_then(|v| v.get("type").and_then(|t| t.as_str().map(String::from))) {
        Some(t) if t == "module" => ModuleFormat::Esm,
        _ => ModuleFormat::Cjs,
    }
}

fn patched_config(format: ModuleFormat, spread_original: bool) -> String {
    // serverBuildTarget and server would redirect the bundle away from
    // serverBuildPath, so both are cleared even when the spread carries
    // them in from the user's config.
    let pinned = concat!(
        "  serverModuleFormat: \"esm\",\n",
        "  serverPlatform: \"neutral\",\n",
        "  serverBuildPath: \"build/index.js\",\n",
        "  serverBuildTarget: undefined,\n",
        "  server: undefined,\n",
    );

    match (format, spread_original) {
        (ModuleFormat::Cjs, true) => format!(
            "const original = require(\"./{CONFIG_ASIDE}\");\n\nmodule.exports = {{\n  ...original,\n{pinned}}};\n"
        ),
        (ModuleFormat::Cjs, false) => {
            format!("module.exports = {{\n{pinned}}};\n")
        }
        (ModuleFormat::Esm, true) => format!(
            "import original from \"./{CONFIG_ASIDE}\";\n\nexport default {{\n  ...original,\n{pinned}}};\n"
        ),
        (ModuleFormat::Esm, false) => {
            format!("export default {{\n{pinned}}};\n")
        }
    }
}

/// Rename the server bundle to `.mjs` so Node loads it as ESM regardless
/// of the project's `type` field.
fn finalize_server_build(entry_dir: &Path) -> Result<()> {
    let built = entry_dir.join(SERVER_BUILD_PATH);
    if !built.is_file() {
        return Err(BuilderError::MissingBuildOutput {
            path: SERVER_BUILD_PATH.to_string(),
            message: "remix build did not produce a server bundle".to_string(),
        });
    }
    std::fs::rename(&built, entry_dir.join(SERVER_HANDLER))?;
    Ok(())
}

fn trace_node_function(entry_dir: &Path, runtime: &str) -> Result<ServerlessFunction> {
    let tracer = ModuleTracer::new();
    let trace = tracer.trace(
        &[entry_dir.join(SERVER_HANDLER)],
        entry_dir,
        &TraceConditions::node(),
    )?;

    for warning in &trace.warnings {
        warn!(code = ?warning.code, specifier = ?warning.specifier, "{}", warning.message);
    }

    Ok(ServerlessFunction {
        files: file_map(entry_dir, &trace.files),
        handler: SERVER_HANDLER.to_string(),
        runtime: runtime.to_string(),
        should_add_helpers: true,
        should_add_sourcemap_support: true,
    })
}

fn trace_edge_function(entry_dir: &Path) -> Result<EdgeFunction> {
    let tracer = ModuleTracer::new().with_legacy_adapters(&[LEGACY_ADAPTER_PACKAGE]);
    let trace = tracer.trace(
        &[entry_dir.join(SERVER_HANDLER)],
        entry_dir,
        &TraceConditions::edge(),
    )?;

    let mut files = file_map(entry_dir, &trace.files);

    if trace.has_warning(TraceWarningCode::MissingLegacyAdapter) {
        warn!(
            package = LEGACY_ADAPTER_PACKAGE,
            "adapter package not installed, bundling compatibility shim"
        );
        let shim_path = entry_dir.join(ADAPTER_SHIM_PATH);
        std::fs::write(&shim_path, ADAPTER_SHIM)?;
        files.insert(ADAPTER_SHIM_PATH.to_string(), FileRef::new(shim_path));
    }

    let mut func = EdgeFunction::new("render", SERVER_HANDLER);
    func.files = files;
    Ok(func)
}

fn file_map(entry_dir: &Path, rel_paths: &[String]) -> BTreeMap<String, FileRef> {
    rel_paths
        .iter()
        .map(|rel| (rel.clone(), FileRef::new(entry_dir.join(rel))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CJS_CONFIG: &str = "module.exports = { appDirectory: \"app\" };\n";

    #[test]
    fn test_config_patch_pins_server_settings() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE), CJS_CONFIG).unwrap();

        let guard = ConfigPatchGuard::apply(temp.path()).unwrap();
        let patched = std::fs::read_to_string(temp.path().join(CONFIG_FILE)).unwrap();
        assert!(patched.contains("require(\"./remix.config.original.js\")"));
        assert!(patched.contains("serverModuleFormat: \"esm\""));
        assert!(patched.contains("serverPlatform: \"neutral\""));
        assert!(temp.path().join(CONFIG_ASIDE).is_file());
        drop(guard);
    }

    #[test]
    fn test_config_patch_clears_server_redirect_keys() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE),
            "module.exports = { serverBuildTarget: \"netlify\", server: \"./server.js\" };\n",
        )
        .unwrap();

        let _guard = ConfigPatchGuard::apply(temp.path()).unwrap();
        let patched = std::fs::read_to_string(temp.path().join(CONFIG_FILE)).unwrap();
        // The spread carries the user's values in, so both keys must be
        // cleared after it.
        assert!(patched.contains("serverBuildTarget: undefined"));
        assert!(patched.contains("server: undefined"));
        let spread = patched.find("...original").unwrap();
        assert!(patched.find("serverBuildTarget: undefined").unwrap() > spread);
        assert!(patched.find("server: undefined").unwrap() > spread);
    }

    #[test]
    fn test_config_restored_byte_identical_on_drop() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE), CJS_CONFIG).unwrap();

        // Simulates a build failing while the guard is live.
        let result: std::result::Result<(), &str> = (|| {
            let _guard = ConfigPatchGuard::apply(temp.path()).unwrap();
            Err("build failed")
        })();
        assert!(result.is_err());

        let restored = std::fs::read_to_string(temp.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(restored, CJS_CONFIG);
        assert!(!temp.path().join(CONFIG_ASIDE).exists());
    }

    #[test]
    fn test_esm_config_patched_in_esm_style() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE),
            "export default { appDirectory: \"app\" };\n",
        )
        .unwrap();

        let _guard = ConfigPatchGuard::apply(temp.path()).unwrap();
        let patched = std::fs::read_to_string(temp.path().join(CONFIG_FILE)).unwrap();
        assert!(patched.starts_with("import original from"));
        assert!(patched.contains("export default {"));
    }

    #[test]
    fn test_missing_config_gets_fresh_patch_and_cleanup() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("package.json"), r#"{"type":"module"}"#).unwrap();

        {
            let _guard = ConfigPatchGuard::apply(temp.path()).unwrap();
            let patched = std::fs::read_to_string(temp.path().join(CONFIG_FILE)).unwrap();
            assert!(patched.starts_with("export default {"));
            assert!(!patched.contains("...original"));
        }

        assert!(!temp.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_finalize_renames_server_bundle() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("build")).unwrap();
        std::fs::write(temp.path().join(SERVER_BUILD_PATH), "export default {};").unwrap();

        finalize_server_build(temp.path()).unwrap();
        assert!(temp.path().join(SERVER_HANDLER).is_file());
        assert!(!temp.path().join(SERVER_BUILD_PATH).exists());
    }

    #[test]
    fn test_finalize_fails_without_server_bundle() {
        let temp = TempDir::new().unwrap();
        let err = finalize_server_build(temp.path()).unwrap_err();
        assert!(matches!(err, BuilderError::MissingBuildOutput { .. }));
    }

    #[test]
    fn test_node_function_traces_server_closure() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("build")).unwrap();
        std::fs::write(
            temp.path().join(SERVER_HANDLER),
            "import { render } from \"./chunk.mjs\";\nexport default render;\n",
        )
        .unwrap();
        std::fs::write(
            temp.path().join("build/chunk.mjs"),
            "export const render = () => new Response(\"ok\");\n",
        )
        .unwrap();

        let func = trace_node_function(temp.path(), "nodejs20.x").unwrap();
        assert_eq!(func.handler, SERVER_HANDLER);
        assert_eq!(func.runtime, "nodejs20.x");
        assert!(func.files.contains_key(SERVER_HANDLER));
        assert!(func.files.contains_key("build/chunk.mjs"));
        assert!(func.should_add_helpers);
    }

    fn prebuilt_project(temp: &TempDir) {
        std::fs::create_dir_all(temp.path().join("build")).unwrap();
        std::fs::create_dir_all(temp.path().join("app/routes")).unwrap();
        std::fs::write(temp.path().join(SERVER_BUILD_PATH), "export default {};\n").unwrap();
    }

    fn prebuilt_context(temp: &TempDir) -> BuilderContext {
        let mut ctx = BuilderContext::new(temp.path(), "package.json");
        ctx.config.install_command = Some(String::new());
        ctx.config.build_command = Some("true".to_string());
        ctx
    }

    #[tokio::test]
    async fn test_every_route_maps_to_a_function() {
        let temp = TempDir::new().unwrap();
        prebuilt_project(&temp);
        std::fs::write(
            temp.path().join("app/routes/index.tsx"),
            "export const config = { runtime: \"edge\" };\nexport default () => null;",
        )
        .unwrap();
        std::fs::write(
            temp.path().join("app/routes/about.tsx"),
            "export default () => null;",
        )
        .unwrap();

        let result = RemixBuilder::new().build(&prebuilt_context(&temp)).await.unwrap();

        // Routes without an edge directive still get a function mapping.
        assert!(matches!(result.output.get("about"), Some(Output::Serverless(_))));
        assert!(matches!(result.output.get("index"), Some(Output::Edge(_))));
        assert!(matches!(result.output.get("404"), Some(Output::Edge(_))));
    }

    #[tokio::test]
    async fn test_routes_share_function_instances() {
        let temp = TempDir::new().unwrap();
        prebuilt_project(&temp);
        let edge_source =
            "export const config = { runtime: \"edge\" };\nexport default () => null;";
        std::fs::write(temp.path().join("app/routes/index.tsx"), edge_source).unwrap();
        std::fs::create_dir_all(temp.path().join("app/routes/blog")).unwrap();
        std::fs::write(temp.path().join("app/routes/blog/post.tsx"), edge_source).unwrap();
        std::fs::write(
            temp.path().join("app/routes/about.tsx"),
            "export default () => null;",
        )
        .unwrap();

        let result = RemixBuilder::new().build(&prebuilt_context(&temp)).await.unwrap();

        // Edge routes are keyed by route path and share one instance.
        let (Some(Output::Edge(a)), Some(Output::Edge(b))) =
            (result.output.get("index"), result.output.get("blog/post"))
        else {
            panic!("expected edge outputs for index and blog/post");
        };
        assert!(Arc::ptr_eq(a, b));

        let Some(Output::Serverless(node)) = result.output.get("about") else {
            panic!("expected a node function for about");
        };
        assert!(node.files.contains_key(SERVER_HANDLER));
    }

    #[tokio::test]
    async fn test_all_node_project_maps_routes_to_node_function() {
        let temp = TempDir::new().unwrap();
        prebuilt_project(&temp);
        std::fs::write(
            temp.path().join("app/routes/index.tsx"),
            "export default () => null;",
        )
        .unwrap();
        std::fs::create_dir_all(temp.path().join("public")).unwrap();
        std::fs::write(temp.path().join("public/index.html"), "<html>").unwrap();

        let result = RemixBuilder::new().build(&prebuilt_context(&temp)).await.unwrap();

        let (Some(Output::Serverless(index)), Some(Output::Serverless(not_found))) =
            (result.output.get("index"), result.output.get("404"))
        else {
            panic!("expected node functions for index and 404");
        };
        assert!(Arc::ptr_eq(index, not_found));
        assert!(index.files.contains_key(SERVER_HANDLER));
        assert!(matches!(
            result.output.get("index.html"),
            Some(Output::Static(_))
        ));
    }

    #[test]
    fn test_edge_function_bundles_adapter_shim() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("build")).unwrap();
        std::fs::write(
            temp.path().join(SERVER_HANDLER),
            "import { createRequestHandler } from \"@remix-run/gantry\";\nexport default createRequestHandler;\n",
        )
        .unwrap();

        let func = trace_edge_function(temp.path()).unwrap();
        assert_eq!(func.deployment_target, "v8-worker");
        assert!(func.files.contains_key(ADAPTER_SHIM_PATH));
        assert!(temp.path().join(ADAPTER_SHIM_PATH).is_file());
    }
}
