//! Output directory resolution
//!
//! Resolution never fails: config-read problems are logged and the
//! conventional default is returned instead.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use gantry_build_utils::read_config_file;

use crate::descriptor::{FrameworkDescriptor, OutputDir};

/// Resolve a framework's output directory relative to the project root.
pub fn resolve_output_dir(descriptor: &FrameworkDescriptor, project_root: &Path) -> PathBuf {
    match &descriptor.output_directory {
        OutputDir::Fixed { dir } => PathBuf::from(dir),
        OutputDir::ConfigKey {
            files,
            key,
            fallback,
        } => resolve_from_config(project_root, files, key, fallback),
        OutputDir::FlattenSingleSubdir { base } => flatten_single_subdir(project_root, base),
    }
}

fn resolve_from_config(root: &Path, files: &[String], key: &str, fallback: &str) -> PathBuf {
    let candidates: Vec<PathBuf> = files.iter().map(|f| root.join(f)).collect();
    let candidate_refs: Vec<&Path> = candidates.iter().map(|p| p.as_path()).collect();

    let config: Option<serde_json::Value> = read_config_file(&candidate_refs);

    match config.as_ref().and_then(|c| c.get(key)).and_then(|v| v.as_str()) {
        Some(declared) => {
            debug!(key, declared, "output directory from framework config");
            PathBuf::from(declared)
        }
        None => PathBuf::from(fallback),
    }
}

/// Flatten into a lone nested directory; some frameworks nest their
/// output under a generated (e.g. project-named) subdirectory.
fn flatten_single_subdir(root: &Path, base: &str) -> PathBuf {
    let base_path = root.join(base);
    match std::fs::read_dir(&base_path) {
        Ok(entries) => {
            let entries: Vec<_> = entries.filter_map(|e| e.ok()).collect();
            if entries.len() == 1 && entries[0].path().is_dir() {
                return PathBuf::from(base).join(entries[0].file_name());
            }
            PathBuf::from(base)
        }
        Err(err) => {
            warn!(base, error = %err, "error detecting output directory");
            PathBuf::from(base)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{CommandSetting, FrameworkDescriptor};
    use crate::detection::DetectionRule;
    use tempfile::TempDir;

    fn descriptor_with(output_directory: OutputDir) -> FrameworkDescriptor {
        FrameworkDescriptor {
            name: "Test".to_string(),
            slug: Some("test".to_string()),
            detection: DetectionRule::Always,
            install_command: CommandSetting::default(),
            build_command: CommandSetting::default(),
            dev_command: CommandSetting::default(),
            output_directory,
            default_routes: vec![],
            dependency: None,
            env_prefix: None,
            cache_pattern: None,
        }
    }

    #[test]
    fn test_fixed_dir() {
        let temp = TempDir::new().unwrap();
        let descriptor = descriptor_with(OutputDir::fixed("dist"));
        assert_eq!(resolve_output_dir(&descriptor, temp.path()), PathBuf::from("dist"));
    }

    #[test]
    fn test_config_key_reads_declared_value() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("_config.yml"), "destination: out/site\n").unwrap();

        let descriptor = descriptor_with(OutputDir::ConfigKey {
            files: vec!["_config.yml".to_string()],
            key: "destination".to_string(),
            fallback: "_site".to_string(),
        });
        assert_eq!(
            resolve_output_dir(&descriptor, temp.path()),
            PathBuf::from("out/site")
        );
    }

    #[test]
    fn test_config_key_falls_back_when_key_absent() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("_config.yml"), "title: blog\n").unwrap();

        let descriptor = descriptor_with(OutputDir::ConfigKey {
            files: vec!["_config.yml".to_string()],
            key: "destination".to_string(),
            fallback: "_site".to_string(),
        });
        assert_eq!(
            resolve_output_dir(&descriptor, temp.path()),
            PathBuf::from("_site")
        );
    }

    #[test]
    fn test_config_key_falls_back_when_file_missing() {
        let temp = TempDir::new().unwrap();
        let descriptor = descriptor_with(OutputDir::ConfigKey {
            files: vec!["config.toml".to_string()],
            key: "publishDir".to_string(),
            fallback: "public".to_string(),
        });
        assert_eq!(
            resolve_output_dir(&descriptor, temp.path()),
            PathBuf::from("public")
        );
    }

    #[test]
    fn test_flatten_enters_lone_subdirectory() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("dist/my-app")).unwrap();

        let descriptor = descriptor_with(OutputDir::FlattenSingleSubdir {
            base: "dist".to_string(),
        });
        assert_eq!(
            resolve_output_dir(&descriptor, temp.path()),
            PathBuf::from("dist/my-app")
        );
    }

    #[test]
    fn test_flatten_keeps_base_with_multiple_entries() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("dist/app")).unwrap();
        std::fs::write(temp.path().join("dist/index.html"), "<html>").unwrap();

        let descriptor = descriptor_with(OutputDir::FlattenSingleSubdir {
            base: "dist".to_string(),
        });
        assert_eq!(resolve_output_dir(&descriptor, temp.path()), PathBuf::from("dist"));
    }

    #[test]
    fn test_flatten_keeps_base_when_missing() {
        let temp = TempDir::new().unwrap();
        let descriptor = descriptor_with(OutputDir::FlattenSingleSubdir {
            base: "build".to_string(),
        });
        assert_eq!(resolve_output_dir(&descriptor, temp.path()), PathBuf::from("build"));
    }
}
