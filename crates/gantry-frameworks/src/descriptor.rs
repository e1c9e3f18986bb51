//! Framework descriptor records
//!
//! A descriptor is an immutable record describing one framework: how to
//! detect it, its default commands, where its build output lands, and the
//! route rules the platform applies for it by default.

use serde::Serialize;

use crate::detection::DetectionRule;
use crate::routes::RouteRule;

/// A default command: a concrete value, a user-facing placeholder, or both.
///
/// Placeholders are documentation only: they are shown in dashboards and
/// help text but never executed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommandSetting {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl CommandSetting {
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            placeholder: None,
        }
    }

    pub fn placeholder(placeholder: impl Into<String>) -> Self {
        Self {
            value: None,
            placeholder: Some(placeholder.into()),
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

/// Strategy for resolving a framework's output directory.
///
/// Most frameworks use a fixed directory. The other two strategies cover
/// frameworks that declare the directory in their own config file, and
/// frameworks that nest output under a single generated subdirectory.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum OutputDir {
    /// A fixed directory name
    Fixed { dir: String },
    /// Read `key` from the first readable config file, else `fallback`
    ConfigKey {
        files: Vec<String>,
        key: String,
        fallback: String,
    },
    /// If `base` contains exactly one entry and it is a directory,
    /// flatten into it; otherwise use `base`
    FlattenSingleSubdir { base: String },
}

impl OutputDir {
    pub fn fixed(dir: impl Into<String>) -> Self {
        Self::Fixed { dir: dir.into() }
    }
}

/// Immutable record describing one framework
#[derive(Debug, Clone, Serialize)]
pub struct FrameworkDescriptor {
    /// Human-readable name (e.g. "Next.js")
    pub name: String,

    /// Stable unique identifier; `None` only for the fallback entry
    pub slug: Option<String>,

    /// Detection rule evaluated against the project tree
    pub detection: DetectionRule,

    pub install_command: CommandSetting,
    pub build_command: CommandSetting,
    pub dev_command: CommandSetting,

    /// Where the framework's build output lands
    pub output_directory: OutputDir,

    /// Default route rules, in evaluation order
    pub default_routes: Vec<RouteRule>,

    /// The runner package that must be present (distinct from the
    /// UI-facing name), e.g. `preact-cli` rather than `preact`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency: Option<String>,

    /// Prefix of environment variables exposed to client-side bundles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_prefix: Option<String>,

    /// Glob of directories worth caching between builds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_pattern: Option<String>,
}

impl FrameworkDescriptor {
    /// Whether this is the fallback "Other" entry
    pub fn is_fallback(&self) -> bool {
        self.slug.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_setting_builders() {
        let cmd = CommandSetting::value("remix build")
            .with_placeholder("`npm run build` or `remix build`");
        assert_eq!(cmd.value.as_deref(), Some("remix build"));
        assert!(cmd.placeholder.is_some());
    }

    #[test]
    fn test_descriptor_serializes() {
        let descriptor = FrameworkDescriptor {
            name: "Saber".to_string(),
            slug: Some("saber".to_string()),
            detection: DetectionRule::Every(vec![]),
            install_command: CommandSetting::default(),
            build_command: CommandSetting::value("saber build"),
            dev_command: CommandSetting::value("saber --port $PORT"),
            output_directory: OutputDir::fixed("public"),
            default_routes: vec![RouteRule::filesystem()],
            dependency: Some("saber".to_string()),
            env_prefix: None,
            cache_pattern: None,
        };

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["slug"], "saber");
        assert_eq!(json["output_directory"]["strategy"], "fixed");
    }
}
