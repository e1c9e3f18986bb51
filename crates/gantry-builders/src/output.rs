//! Deployable output primitives
//!
//! A build normalizes into three primitives. Multiple route keys may point
//! at the same function instance; the map stores `Arc`s so a function built
//! once is shared, not duplicated, across every route it serves.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use gantry_build_utils::FileRef;
use gantry_frameworks::RouteRule;

/// A file served as-is from the CDN
#[derive(Debug, Clone, Serialize)]
pub struct StaticFile {
    pub file: FileRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Content digest, when the builder computed one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl StaticFile {
    pub fn new(file: FileRef) -> Self {
        Self {
            file,
            content_type: None,
            sha256: None,
        }
    }
}

/// A function executed on the Node.js serverless runtime
#[derive(Debug, Clone, Serialize)]
pub struct ServerlessFunction {
    /// Every file the handler can reach, keyed by relative path
    pub files: BTreeMap<String, FileRef>,
    /// Relative path of the handler module
    pub handler: String,
    /// Platform runtime identifier (e.g. "nodejs20.x")
    pub runtime: String,
    pub should_add_helpers: bool,
    pub should_add_sourcemap_support: bool,
}

/// A function executed on the V8 isolate edge runtime
#[derive(Debug, Clone, Serialize)]
pub struct EdgeFunction {
    pub files: BTreeMap<String, FileRef>,
    /// Relative path of the entry module
    pub entrypoint: String,
    /// Always "v8-worker"
    pub deployment_target: String,
    pub name: String,
}

impl EdgeFunction {
    pub fn new(name: impl Into<String>, entrypoint: impl Into<String>) -> Self {
        Self {
            files: BTreeMap::new(),
            entrypoint: entrypoint.into(),
            deployment_target: "v8-worker".to_string(),
            name: name.into(),
        }
    }
}

/// One deployable output, addressed by route key
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Output {
    Static(StaticFile),
    Serverless(Arc<ServerlessFunction>),
    Edge(Arc<EdgeFunction>),
}

/// The normalized result of a build
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildResult {
    /// Route rules, in evaluation order
    pub routes: Vec<RouteRule>,
    /// Deployable outputs keyed by route path
    pub output: BTreeMap<String, Output>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_functions_are_shared_across_route_keys() {
        let func = Arc::new(EdgeFunction::new("render", "server/index.js"));

        let mut output = BTreeMap::new();
        output.insert("index".to_string(), Output::Edge(Arc::clone(&func)));
        output.insert("404".to_string(), Output::Edge(Arc::clone(&func)));

        let (Output::Edge(a), Output::Edge(b)) = (&output["index"], &output["404"]) else {
            panic!("expected edge outputs");
        };
        assert!(Arc::ptr_eq(a, b));
    }

    #[test]
    fn test_edge_function_deployment_target() {
        let func = EdgeFunction::new("render", "server/index.js");
        assert_eq!(func.deployment_target, "v8-worker");
    }
}
