//! Dependency closure tracing for server entrypoints
//!
//! A serverless or edge function must ship every file its handler can
//! reach at runtime. The tracer walks static `import`/`require` specifiers
//! from a set of entrypoints and returns the transitive file closure,
//! relative to a base directory.
//!
//! Edge targets resolve modules under different conditions: a package's
//! `browser` or `module` entry is preferred over `main`, and node-only
//! files must not leak into the closure. Resolution failures are reported
//! as warnings carrying a machine-readable code; compensation for known
//! cases (e.g. a missing legacy compatibility adapter) is keyed on those
//! codes, never on message text.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{BuildUtilsError, Result};

/// Machine-readable warning codes emitted during tracing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TraceWarningCode {
    /// A specifier could not be statically resolved
    UnresolvedModule,
    /// A known legacy compatibility adapter package is not installed
    MissingLegacyAdapter,
    /// A reachable file exists but could not be read
    UnreadableFile,
}

/// A non-fatal problem found while tracing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceWarning {
    pub code: TraceWarningCode,
    /// The module specifier involved, when there is one
    pub specifier: Option<String>,
    pub message: String,
}

/// Result of a trace: the reachable file closure plus warnings
#[derive(Debug, Clone, Default)]
pub struct Trace {
    /// Forward-slash paths relative to the trace base, sorted
    pub files: Vec<String>,
    pub warnings: Vec<TraceWarning>,
}

impl Trace {
    /// Whether any warning carries the given code
    pub fn has_warning(&self, code: TraceWarningCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}

/// Module resolution conditions for a trace
#[derive(Debug, Clone, Default)]
pub struct TraceConditions {
    /// package.json entry fields preferred over `main`, in order
    pub prefer_entry_fields: Vec<&'static str>,
}

impl TraceConditions {
    /// Default Node.js resolution (`main` only)
    pub fn node() -> Self {
        Self::default()
    }

    /// Edge resolution: prefer Web-compatible package entries
    pub fn edge() -> Self {
        Self {
            prefer_entry_fields: vec!["browser", "module"],
        }
    }
}

/// Computes the transitive reachable-file closure for entry modules
pub trait Tracer: Send + Sync {
    fn trace(&self, entrypoints: &[PathBuf], base: &Path, conditions: &TraceConditions)
        -> Result<Trace>;
}

/// Static specifier-scanning tracer.
///
/// Handles `import ... from`, side-effect `import`, `export ... from`,
/// `require(...)`, and dynamic `import(...)` with string-literal
/// specifiers. Dynamic expressions are reported as unresolved, not
/// followed.
pub struct ModuleTracer {
    /// Bare specifiers that, when unresolvable, indicate a missing legacy
    /// adapter rather than a genuinely broken import
    legacy_adapter_packages: Vec<String>,
}

impl ModuleTracer {
    pub fn new() -> Self {
        Self {
            legacy_adapter_packages: Vec::new(),
        }
    }

    pub fn with_legacy_adapters(mut self, packages: &[&str]) -> Self {
        self.legacy_adapter_packages = packages.iter().map(|s| s.to_string()).collect();
        self
    }
}

impl Default for ModuleTracer {
    fn default() -> Self {
        Self::new()
    }
}

const SOURCE_EXTENSIONS: [&str; 6] = ["js", "mjs", "cjs", "jsx", "ts", "tsx"];
const RESOLVE_SUFFIXES: [&str; 7] = [".js", ".mjs", ".cjs", ".jsx", ".ts", ".tsx", ".json"];

impl Tracer for ModuleTracer {
    #[instrument(skip(self, entrypoints), fields(base = %base.display()))]
    fn trace(
        &self,
        entrypoints: &[PathBuf],
        base: &Path,
        conditions: &TraceConditions,
    ) -> Result<Trace> {
        // Canonicalize once so strip_prefix agrees with canonicalized
        // file paths even when base sits behind a symlink.
        let base = base.canonicalize().unwrap_or_else(|_| base.to_path_buf());

        let mut files = BTreeSet::new();
        let mut warnings = Vec::new();
        let mut visited = HashSet::new();
        let mut queue: VecDeque<PathBuf> = VecDeque::new();

        for entry in entrypoints {
            if !entry.is_file() {
                return Err(BuildUtilsError::EntrypointNotFound {
                    path: entry.clone(),
                });
            }
            queue.push_back(entry.clone());
        }

        while let Some(file) = queue.pop_front() {
            let canonical = file.canonicalize().unwrap_or_else(|_| file.clone());
            if !visited.insert(canonical.clone()) {
                continue;
            }

            if let Ok(rel) = canonical.strip_prefix(&base) {
                files.insert(rel.to_string_lossy().replace('\\', "/"));
            }

            if !is_source_file(&canonical) {
                continue;
            }

            let source = match std::fs::read_to_string(&canonical) {
                Ok(source) => source,
                Err(err) => {
                    warnings.push(TraceWarning {
                        code: TraceWarningCode::UnreadableFile,
                        specifier: None,
                        message: format!("{}: {err}", canonical.display()),
                    });
                    continue;
                }
            };

            let dir = canonical.parent().unwrap_or(&base);
            for specifier in extract_specifiers(&source) {
                match self.resolve(&specifier, dir, conditions) {
                    Resolution::File(resolved) => queue.push_back(resolved),
                    Resolution::Builtin => {}
                    Resolution::NotFound => {
                        let code = if self.legacy_adapter_packages.iter().any(|p| p == &specifier)
                        {
                            TraceWarningCode::MissingLegacyAdapter
                        } else {
                            TraceWarningCode::UnresolvedModule
                        };
                        warnings.push(TraceWarning {
                            code,
                            specifier: Some(specifier.clone()),
                            message: format!(
                                "failed to resolve '{specifier}' from {}",
                                canonical.display()
                            ),
                        });
                    }
                }
            }
        }

        debug!(file_count = files.len(), warning_count = warnings.len(), "trace complete");

        Ok(Trace {
            files: files.into_iter().collect(),
            warnings,
        })
    }
}

/// Outcome of resolving one specifier
enum Resolution {
    File(PathBuf),
    /// Runtime-provided module; nothing to ship
    Builtin,
    NotFound,
}

impl ModuleTracer {
    fn resolve(&self, specifier: &str, from_dir: &Path, conditions: &TraceConditions) -> Resolution {
        if specifier.starts_with("./") || specifier.starts_with("../") {
            return match resolve_file_or_dir(&from_dir.join(specifier)) {
                Some(path) => Resolution::File(path),
                None => Resolution::NotFound,
            };
        }
        if specifier.starts_with("node:") || is_node_builtin(specifier) {
            return Resolution::Builtin;
        }
        self.resolve_bare(specifier, from_dir, conditions)
    }

    fn resolve_bare(
        &self,
        specifier: &str,
        from_dir: &Path,
        conditions: &TraceConditions,
    ) -> Resolution {
        let (package, subpath) = split_specifier(specifier);

        let mut current = Some(from_dir);
        while let Some(level) = current {
            let pkg_dir = level.join("node_modules").join(package);
            if pkg_dir.is_dir() {
                let resolved = match subpath {
                    Some(sub) => resolve_file_or_dir(&pkg_dir.join(sub)),
                    None => resolve_package_entry(&pkg_dir, conditions),
                };
                return match resolved {
                    Some(path) => Resolution::File(path),
                    None => Resolution::NotFound,
                };
            }
            current = level.parent();
        }

        Resolution::NotFound
    }
}

fn is_node_builtin(specifier: &str) -> bool {
    const BUILTINS: [&str; 20] = [
        "assert", "buffer", "child_process", "crypto", "events", "fs", "http", "https", "module",
        "net", "os", "path", "process", "querystring", "stream", "string_decoder", "tls", "url",
        "util", "zlib",
    ];
    let root = specifier.split('/').next().unwrap_or(specifier);
    BUILTINS.contains(&root)
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

fn split_specifier(specifier: &str) -> (&str, Option<&str>) {
    let mut parts = specifier.splitn(if specifier.starts_with('@') { 3 } else { 2 }, '/');
    if specifier.starts_with('@') {
        let scope = parts.next().unwrap_or(specifier);
        match parts.next() {
            Some(name) => {
                let package_len = scope.len() + 1 + name.len();
                let package = &specifier[..package_len];
                let rest = parts.next();
                (package, rest)
            }
            None => (specifier, None),
        }
    } else {
        let package = parts.next().unwrap_or(specifier);
        (package, parts.next())
    }
}

/// Resolve a path that may omit its extension or point at a directory
fn resolve_file_or_dir(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    for suffix in RESOLVE_SUFFIXES {
        let candidate = PathBuf::from(format!("{}{}", path.display(), suffix));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    if path.is_dir() {
        for suffix in RESOLVE_SUFFIXES {
            let candidate = path.join(format!("index{suffix}"));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Resolve a package directory to its entry file per the conditions
fn resolve_package_entry(pkg_dir: &Path, conditions: &TraceConditions) -> Option<PathBuf> {
    #[derive(Deserialize)]
    struct PkgEntry {
        main: Option<String>,
        module: Option<String>,
        browser: Option<serde_json::Value>,
    }

    let manifest = std::fs::read_to_string(pkg_dir.join("package.json")).ok();
    let pkg: Option<PkgEntry> = manifest.and_then(|m| serde_json::from_str(&m).ok());

    if let Some(pkg) = &pkg {
        for field in &conditions.prefer_entry_fields {
            let value = match *field {
                "module" => pkg.module.clone(),
                "browser" => pkg.browser.as_ref().and_then(|v| v.as_str().map(String::from)),
                _ => None,
            };
            if let Some(entry) = value {
                if let Some(resolved) = resolve_file_or_dir(&pkg_dir.join(entry)) {
                    return Some(resolved);
                }
            }
        }
        if let Some(main) = &pkg.main {
            if let Some(resolved) = resolve_file_or_dir(&pkg_dir.join(main)) {
                return Some(resolved);
            }
        }
    }

    resolve_file_or_dir(&pkg_dir.join("index"))
}

/// Pull string-literal module specifiers out of a source file.
///
/// Comments and template literals are stripped first so commented-out
/// imports are not followed.
fn extract_specifiers(source: &str) -> Vec<String> {
    let stripped = strip_comments(source);

    // import x from '...', import '...', export ... from '...',
    // require('...'), import('...')
    let patterns = [
        r#"(?m)^\s*import\s+[^'"]*?from\s+['"]([^'"]+)['"]"#,
        r#"(?m)^\s*import\s+['"]([^'"]+)['"]"#,
        r#"(?m)^\s*export\s+[^'"]*?from\s+['"]([^'"]+)['"]"#,
        r#"require\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
        r#"import\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
    ];

    let mut specifiers = Vec::new();
    let mut seen = HashSet::new();
    for pattern in patterns {
        let re = Regex::new(pattern).expect("static regex");
        for captures in re.captures_iter(&stripped) {
            let spec = captures[1].to_string();
            if seen.insert(spec.clone()) {
                specifiers.push(spec);
            }
        }
    }
    specifiers
}

/// Remove line and block comments without disturbing string contents
fn strip_comments(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut out = String::with_capacity(source.len());
    let mut i = 0;
    let mut in_string: Option<u8> = None;

    while i < bytes.len() {
        let c = bytes[i];
        match in_string {
            Some(quote) => {
                out.push(c as char);
                if c == b'\\' && i + 1 < bytes.len() {
                    out.push(bytes[i + 1] as char);
                    i += 2;
                    continue;
                }
                if c == quote {
                    in_string = None;
                }
                i += 1;
            }
            None => {
                if c == b'\'' || c == b'"' || c == b'`' {
                    in_string = Some(c);
                    out.push(c as char);
                    i += 1;
                } else if c == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                    while i < bytes.len() && bytes[i] != b'\n' {
                        i += 1;
                    }
                } else if c == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
                    i += 2;
                    while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                        i += 1;
                    }
                    i += 2;
                } else {
                    out.push(c as char);
                    i += 1;
                }
            }
        }
    }

    out
}
