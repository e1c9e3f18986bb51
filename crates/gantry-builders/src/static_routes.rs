//! Per-route runtime declarations
//!
//! A route module may opt into the edge runtime by exporting a `config`
//! object with `runtime: "edge"`. The declaration is read structurally
//! from the source text, so malformed or dynamic configs simply do not
//! count as edge.

use std::path::Path;

use regex::Regex;
use tracing::debug;

/// One route module discovered under the framework's routes directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteModule {
    /// Route path relative to the site root (e.g. `blog/post`)
    pub path: String,
    /// Whether the module requests the edge runtime
    pub edge: bool,
}

/// Whether a route module's exported config requests the edge runtime.
///
/// Matches `export const config = { ... runtime: "edge" ... }` and the
/// older `"experimental-edge"` spelling. Only a string literal value
/// counts; a computed runtime cannot be honored without running code.
pub fn declares_edge_runtime(source: &str) -> bool {
    let re = Regex::new(
        r#"export\s+const\s+config\s*=\s*\{[^}]*runtime\s*:\s*["'](edge|experimental-edge)["']"#,
    )
    .expect("static pattern");
    re.is_match(source)
}

/// Enumerate every route module under `routes_dir` with its runtime
/// choice. Unreadable modules default to the node runtime.
pub fn scan_route_modules(routes_dir: &Path) -> Vec<RouteModule> {
    let mut modules = Vec::new();

    let Ok(files) = gantry_build_utils::glob("**/*.{js,jsx,ts,tsx}", routes_dir) else {
        return modules;
    };

    for (rel, file_ref) in files {
        let edge = std::fs::read_to_string(&file_ref.path)
            .map(|source| declares_edge_runtime(&source))
            .unwrap_or(false);
        let path = route_path(&rel);
        if edge {
            debug!(route = %path, "route requests edge runtime");
        }
        modules.push(RouteModule { path, edge });
    }

    modules
}

/// Strip the source extension; the remaining relative path is the route
/// path the platform serves it under.
fn route_path(rel_path: &str) -> String {
    match rel_path.rsplit_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => rel_path.to_string(),
    }
}
