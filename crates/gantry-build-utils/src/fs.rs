//! File-set materialization, globbing, and project inspection
//!
//! Builders receive their input as an abstract file map, work inside an
//! isolated directory, and hand results back as references to files on
//! disk. These helpers cover that lifecycle plus the ancestor-directory
//! scan that decides which package manager a project uses.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::{Path, PathBuf};

use globset::GlobBuilder;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{BuildUtilsError, Result};

/// An in-memory file, used as builder input before materialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    pub data: Vec<u8>,
}

impl FileBlob {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }
}

/// A reference to a file on local disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub path: PathBuf,
}

impl FileRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Hex-encoded sha256 digest of the file contents
    pub fn sha256(&self) -> Result<String> {
        let mut file = std::fs::File::open(&self.path)?;
        let mut hasher = Sha256::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Materialize an abstract file map into `work_path`.
///
/// Idempotent per call: existing files are overwritten. Keys are
/// forward-slash relative paths.
pub fn download(files: &BTreeMap<String, FileBlob>, work_path: &Path) -> Result<()> {
    for (rel_path, blob) in files {
        let dest = work_path.join(rel_path);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&dest, &blob.data)?;
    }
    debug!(count = files.len(), work_path = %work_path.display(), "materialized file set");
    Ok(())
}

/// Enumerate files under `dir` matching `pattern`.
///
/// Returns a map keyed by forward-slash relative path. Directories are
/// skipped; file contents are not read.
pub fn glob(pattern: &str, dir: &Path) -> Result<BTreeMap<String, FileRef>> {
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(false)
        .build()
        .map_err(|e| BuildUtilsError::InvalidGlobPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?
        .compile_matcher();

    let mut results = BTreeMap::new();
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = match entry.path().strip_prefix(dir) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let key = rel.to_string_lossy().replace('\\', "/");
        if matcher.is_match(&key) {
            results.insert(key, FileRef::new(entry.path()));
        }
    }

    Ok(results)
}

/// Minimal view of a project's `package.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageJson {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub scripts: HashMap<String, String>,
    #[serde(default)]
    pub dependencies: HashMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: HashMap<String, String>,
    #[serde(default)]
    pub engines: HashMap<String, String>,
}

impl PackageJson {
    /// Load from `<dir>/package.json`, or `None` if absent/unreadable
    pub fn load(dir: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(dir.join("package.json")).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Whether `scripts` declares the named script
    pub fn has_script(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }

    /// The declared `engines.node` range, if any
    pub fn engines_node(&self) -> Option<&str> {
        self.engines.get("node").map(|s| s.as_str())
    }
}

/// Package manager in use by a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Npm,
    Pnpm,
    Yarn,
    Bun,
}

impl PackageManager {
    pub fn command(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Pnpm => "pnpm",
            Self::Yarn => "yarn",
            Self::Bun => "bun",
        }
    }

    pub fn install_args(&self) -> &'static [&'static str] {
        match self {
            Self::Npm => &["install"],
            Self::Pnpm => &["install"],
            Self::Yarn => &["install"],
            Self::Bun => &["install"],
        }
    }

    pub fn run_args(&self) -> &'static [&'static str] {
        &["run"]
    }
}

/// Result of scanning ancestor directories for package-manager manifests
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectScan {
    pub package_manager: PackageManager,
    /// Lockfile schema version, when the lockfile declares one
    pub lockfile_version: Option<f64>,
}

/// Inspect `dir` and its ancestors for lockfiles to decide which package
/// manager owns the project. The nearest lockfile wins; no lockfile at
/// any level means npm.
pub fn scan_parent_dirs(dir: &Path) -> ProjectScan {
    let mut current = Some(dir);
    while let Some(level) = current {
        let pnpm_lock = level.join("pnpm-lock.yaml");
        if pnpm_lock.is_file() {
            return ProjectScan {
                package_manager: PackageManager::Pnpm,
                lockfile_version: pnpm_lockfile_version(&pnpm_lock),
            };
        }
        if level.join("yarn.lock").is_file() {
            return ProjectScan {
                package_manager: PackageManager::Yarn,
                lockfile_version: None,
            };
        }
        if level.join("bun.lockb").is_file() || level.join("bun.lock").is_file() {
            return ProjectScan {
                package_manager: PackageManager::Bun,
                lockfile_version: None,
            };
        }
        let npm_lock = level.join("package-lock.json");
        if npm_lock.is_file() {
            return ProjectScan {
                package_manager: PackageManager::Npm,
                lockfile_version: npm_lockfile_version(&npm_lock),
            };
        }
        current = level.parent();
    }

    ProjectScan {
        package_manager: PackageManager::Npm,
        lockfile_version: None,
    }
}

fn pnpm_lockfile_version(path: &Path) -> Option<f64> {
    #[derive(Deserialize)]
    struct PnpmLock {
        #[serde(rename = "lockfileVersion")]
        lockfile_version: serde_yaml::Value,
    }
    let content = std::fs::read_to_string(path).ok()?;
    let lock: PnpmLock = serde_yaml::from_str(&content).ok()?;
    match lock.lockfile_version {
        serde_yaml::Value::Number(n) => n.as_f64(),
        serde_yaml::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn npm_lockfile_version(path: &Path) -> Option<f64> {
    #[derive(Deserialize)]
    struct NpmLock {
        #[serde(rename = "lockfileVersion")]
        lockfile_version: f64,
    }
    let content = std::fs::read_to_string(path).ok()?;
    let lock: NpmLock = serde_json::from_str(&content).ok()?;
    Some(lock.lockfile_version)
}

/// Construct the spawn environment for a project's package manager.
///
/// Older pnpm lockfiles (schema < 6) require the pnpm 7 binary that the
/// build image keeps on a side path, so PATH is adjusted when such a
/// lockfile is detected.
pub fn env_for_package_manager(
    scan: &ProjectScan,
    base_env: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut env = base_env.clone();

    if scan.package_manager == PackageManager::Pnpm {
        if let Some(version) = scan.lockfile_version {
            if version < 6.0 {
                let path = env.get("PATH").cloned().unwrap_or_default();
                env.insert("PATH".to_string(), format!("/pnpm7/node_modules/.bin:{path}"));
                debug!(lockfile_version = version, "pinning pnpm 7 for legacy lockfile");
            }
        }
    }

    env
}
