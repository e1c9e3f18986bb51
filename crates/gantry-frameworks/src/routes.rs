//! Route rules understood by the platform router
//!
//! Rules are evaluated top to bottom. Each rule is either terminal
//! (`dest`/`status`) or a passthrough (`continue: true`), and the
//! `handle: "filesystem"` sentinel means "first try serving a file that
//! exists on disk before falling through to later rules."

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One routing rule in the platform's route list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    /// Source path regex
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,

    /// Rewrite destination
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,

    /// Response headers to set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,

    /// Status code override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Whether evaluation continues past this rule
    #[serde(rename = "continue", default, skip_serializing_if = "std::ops::Not::not")]
    pub continue_: bool,

    /// Phase sentinel; only "filesystem" is defined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}

impl RouteRule {
    /// A rule matching `src`
    pub fn src(pattern: impl Into<String>) -> Self {
        Self {
            src: Some(pattern.into()),
            ..Default::default()
        }
    }

    /// The filesystem-passthrough marker
    pub fn filesystem() -> Self {
        Self {
            handle: Some("filesystem".to_string()),
            ..Default::default()
        }
    }

    pub fn with_dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Mark the rule as a passthrough (`continue: true`)
    pub fn passthrough(mut self) -> Self {
        self.continue_ = true;
        self
    }

    /// Whether this is the filesystem sentinel
    pub fn is_filesystem(&self) -> bool {
        self.handle.as_deref() == Some("filesystem")
    }
}

/// Immutable-asset cache rule shared by several framework entries
pub fn immutable_asset_rule(src: impl Into<String>) -> RouteRule {
    RouteRule::src(src)
        .with_header("cache-control", "public, max-age=31536000, immutable")
        .passthrough()
}

/// SPA fallback: everything that misses the filesystem goes to index.html
pub fn spa_fallback() -> Vec<RouteRule> {
    vec![
        RouteRule::filesystem(),
        RouteRule::src("/(.*)").with_dest("/index.html"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_shape() {
        let rule = RouteRule::src("/_saber/.*")
            .with_header("cache-control", "max-age=31536000, immutable");
        let json = serde_json::to_value(&rule).unwrap();

        assert_eq!(json["src"], "/_saber/.*");
        assert_eq!(json["headers"]["cache-control"], "max-age=31536000, immutable");
        // Unset fields are omitted entirely, not serialized as null.
        assert!(json.get("dest").is_none());
        assert!(json.get("continue").is_none());
    }

    #[test]
    fn test_filesystem_sentinel() {
        let rule = RouteRule::filesystem();
        assert!(rule.is_filesystem());

        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["handle"], "filesystem");
    }

    #[test]
    fn test_passthrough_flag_serializes_when_set() {
        let rule = immutable_asset_rule("^/build/(.*)$");
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["continue"], true);
    }

    #[test]
    fn test_404_rule() {
        let rule = RouteRule::src(".*").with_status(404).with_dest("404.html");
        assert_eq!(rule.status, Some(404));
        assert_eq!(rule.dest.as_deref(), Some("404.html"));
    }
}
