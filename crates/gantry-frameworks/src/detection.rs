//! Framework detection
//!
//! Each descriptor carries a boolean rule over file checks: a file must
//! exist, and optionally its text must match a regex. Rules combine the
//! checks with ALL or ANY semantics. Evaluation is a pure function of the
//! project tree snapshot.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::descriptor::FrameworkDescriptor;

/// A single file predicate: existence plus optional content pattern
#[derive(Debug, Clone, Serialize)]
pub struct FileCheck {
    /// Path relative to the project root
    pub path: String,
    /// Regex the file's text must match; `None` means existence suffices
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_content: Option<String>,
}

impl FileCheck {
    /// Check that a file exists
    pub fn exists(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            match_content: None,
        }
    }

    /// Check that a file exists and its content matches `pattern`
    pub fn content(path: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            match_content: Some(pattern.into()),
        }
    }

    /// Check that `package.json` declares `name` in (dev)dependencies.
    ///
    /// The pattern deliberately targets the exact dependency key so that,
    /// for example, a Preact CLI project is matched on `preact-cli` and
    /// not on a bare `preact` entry pulled in by some other framework.
    pub fn npm_dependency(name: &str) -> Self {
        let escaped = regex::escape(name);
        Self::content(
            "package.json",
            format!(r#""(dev)?(d|D)ependencies":\s*\{{[^}}]*"{escaped}":\s*".+?"[^}}]*\}}"#),
        )
    }

    fn passes(&self, root: &Path) -> bool {
        let path = root.join(&self.path);
        if !path.is_file() {
            return false;
        }

        let Some(pattern) = &self.match_content else {
            return true;
        };

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => return false,
        };

        match regex::Regex::new(pattern) {
            Ok(re) => re.is_match(&content),
            Err(err) => {
                warn!(pattern, error = %err, "invalid detection pattern");
                false
            }
        }
    }
}

/// Boolean combinator over file checks
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionRule {
    /// Every check must pass
    Every(Vec<FileCheck>),
    /// At least one check must pass
    Any(Vec<FileCheck>),
    /// Vacuously true; reserved for the fallback descriptor
    Always,
}

impl DetectionRule {
    /// Evaluate the rule against a project root
    pub fn matches(&self, root: &Path) -> bool {
        match self {
            Self::Every(checks) => !checks.is_empty() && checks.iter().all(|c| c.passes(root)),
            Self::Any(checks) => checks.iter().any(|c| c.passes(root)),
            Self::Always => true,
        }
    }
}

/// Find the first descriptor whose detection rule matches the project.
///
/// Descriptors are evaluated in table order. Order encodes priority, so
/// callers must pass the registry unsorted. Returns `None` only when the
/// list lacks a fallback entry and nothing matched.
#[instrument(skip(descriptors), fields(root = %root.display(), descriptor_count = descriptors.len()))]
pub fn detect_framework<'a>(
    root: &Path,
    descriptors: &'a [FrameworkDescriptor],
) -> Option<&'a FrameworkDescriptor> {
    for descriptor in descriptors {
        if descriptor.detection.matches(root) {
            debug!(
                framework = descriptor.name,
                slug = descriptor.slug.as_deref().unwrap_or("<other>"),
                "framework detected"
            );
            return Some(descriptor);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_existence_check() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("remix.config.js"), "module.exports = {}").unwrap();

        assert!(FileCheck::exists("remix.config.js").passes(temp.path()));
        assert!(!FileCheck::exists("next.config.js").passes(temp.path()));
    }

    #[test]
    fn test_content_check_requires_both() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.toml"), "title = \"site\"\n").unwrap();

        assert!(!FileCheck::content("config.toml", "base_url").passes(temp.path()));

        std::fs::write(temp.path().join("config.toml"), "base_url = \"/\"\n").unwrap();
        assert!(FileCheck::content("config.toml", "base_url").passes(temp.path()));
    }

    #[test]
    fn test_npm_dependency_matches_exact_key() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("package.json"),
            r#"{"dependencies":{"preact":"^10.0.0"}}"#,
        )
        .unwrap();

        assert!(FileCheck::npm_dependency("preact").passes(temp.path()));
        assert!(!FileCheck::npm_dependency("preact-cli").passes(temp.path()));

        std::fs::write(
            temp.path().join("package.json"),
            r#"{"devDependencies":{"preact-cli":"^3.0.0"}}"#,
        )
        .unwrap();
        assert!(FileCheck::npm_dependency("preact-cli").passes(temp.path()));
    }

    #[test]
    fn test_every_rule_is_conjunctive() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("package.json"),
            r#"{"dependencies":{"svelte":"^4.0.0","sirv-cli":"^2.0.0"}}"#,
        )
        .unwrap();

        let rule = DetectionRule::Every(vec![
            FileCheck::npm_dependency("svelte"),
            FileCheck::npm_dependency("sirv-cli"),
        ]);
        assert!(rule.matches(temp.path()));

        // Removing any one satisfied check flips the rule to false.
        std::fs::write(
            temp.path().join("package.json"),
            r#"{"dependencies":{"svelte":"^4.0.0"}}"#,
        )
        .unwrap();
        assert!(!rule.matches(temp.path()));
    }

    #[test]
    fn test_any_rule_is_disjunctive() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("package.json"),
            r#"{"dependencies":{"react-dev-utils":"^12.0.0"}}"#,
        )
        .unwrap();

        let rule = DetectionRule::Any(vec![
            FileCheck::npm_dependency("react-scripts"),
            FileCheck::npm_dependency("react-dev-utils"),
        ]);
        assert!(rule.matches(temp.path()));
    }

    #[test]
    fn test_always_matches_empty_project() {
        let temp = TempDir::new().unwrap();
        assert!(DetectionRule::Always.matches(temp.path()));
    }
}
