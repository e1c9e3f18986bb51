//! Generic framework config file reading
//!
//! Frameworks declare their output directory (and other settings) in their
//! own config files, which may be JSON, YAML, or TOML. Builders never want
//! a hard failure out of reading one of these: a missing or malformed file
//! means "use the conventional default".

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Read the first existing config file from `candidates` into `T`.
///
/// The format is chosen by file extension: `.json` is parsed with
/// serde_json, `.toml` with toml, and anything else (`.yml`, `.yaml`, or
/// extensionless files like `_config.yml` variants) with serde_yaml.
///
/// Read and parse errors are logged and swallowed; the caller always gets
/// a usable answer (`None` meaning "fall back to the default").
pub fn read_config_file<T: DeserializeOwned>(candidates: &[&Path]) -> Option<T> {
    for path in candidates {
        if !path.is_file() {
            continue;
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read config file");
                continue;
            }
        };

        let parsed = match extension(path) {
            "json" => serde_json::from_str::<T>(&content).map_err(|e| e.to_string()),
            "toml" => toml::from_str::<T>(&content).map_err(|e| e.to_string()),
            _ => serde_yaml::from_str::<T>(&content).map_err(|e| e.to_string()),
        };

        match parsed {
            Ok(value) => {
                debug!(path = %path.display(), "parsed config file");
                return Some(value);
            }
            Err(message) => {
                warn!(path = %path.display(), error = %message, "failed to parse config file");
            }
        }
    }

    None
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}
