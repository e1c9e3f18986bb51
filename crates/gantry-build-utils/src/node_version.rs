//! Supported Node.js runtime selection
//!
//! The platform supports a small, fixed set of Node.js runtimes. Projects
//! may constrain the version through `engines.node` in `package.json`; the
//! resolver picks the newest supported runtime that intersects the declared
//! range, or fails with the list of ranges the user could pick instead.
//!
//! Discontinuation is time-dependent, so filtering happens at resolution
//! time against the clock the caller provides. The table itself is built
//! once at process start and passed around explicitly.

use chrono::NaiveDate;
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BuildUtilsError, Result};

/// One supported Node.js runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeVersion {
    /// Major version line (e.g. 20)
    pub major: u64,
    /// User-facing range for this line (e.g. "20.x")
    pub range: String,
    /// Platform runtime identifier (e.g. "nodejs20.x")
    pub runtime: String,
    /// Date after which deployments on this runtime fail to build
    pub discontinue_date: Option<NaiveDate>,
}

impl RuntimeVersion {
    pub fn new(major: u64, range: &str, runtime: &str) -> Self {
        Self {
            major,
            range: range.to_string(),
            runtime: runtime.to_string(),
            discontinue_date: None,
        }
    }

    pub fn with_discontinue_date(mut self, date: NaiveDate) -> Self {
        self.discontinue_date = Some(date);
        self
    }

    fn is_discontinued(&self, today: NaiveDate) -> bool {
        self.discontinue_date.is_some_and(|d| d <= today)
    }
}

/// The ordered (newest first) table of supported runtimes
#[derive(Debug, Clone)]
pub struct RuntimeTable {
    entries: Vec<RuntimeVersion>,
}

impl RuntimeTable {
    /// Build a table from entries ordered newest to oldest
    pub fn new(entries: Vec<RuntimeVersion>) -> Self {
        Self { entries }
    }

    /// The platform's built-in runtime table
    pub fn builtin() -> Self {
        Self::new(vec![
            RuntimeVersion::new(22, "22.x", "nodejs22.x"),
            RuntimeVersion::new(20, "20.x", "nodejs20.x"),
            RuntimeVersion::new(18, "18.x", "nodejs18.x")
                .with_discontinue_date(NaiveDate::from_ymd_opt(2027, 6, 1).unwrap()),
            RuntimeVersion::new(16, "16.x", "nodejs16.x")
                .with_discontinue_date(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()),
        ])
    }

    /// Resolve the runtime for a project.
    ///
    /// With no declared range the default selection is the oldest runtime
    /// that is still universally available. With a declared range the
    /// candidates are scanned newest-first and the first intersecting
    /// entry wins. Entries already discontinued as of `today` are never
    /// candidates, even when explicitly requested.
    pub fn resolve(&self, declared_range: Option<&str>, today: NaiveDate) -> Result<RuntimeVersion> {
        let candidates: Vec<&RuntimeVersion> = self
            .entries
            .iter()
            .filter(|e| !e.is_discontinued(today))
            .collect();

        let selection = match declared_range {
            None => {
                let default = candidates.last().copied().ok_or_else(|| {
                    BuildUtilsError::context("node version", "no supported runtimes available")
                })?;
                debug!(
                    range = %default.range,
                    "missing `engines` in `package.json`, using default range"
                );
                default
            }
            Some(declared) => {
                let found = candidates
                    .iter()
                    .find(|e| range_intersects(&e.range, declared))
                    .copied();

                match found {
                    Some(entry) => {
                        debug!(
                            range = %entry.range,
                            declared,
                            "found `engines` in `package.json`, selecting range"
                        );
                        entry
                    }
                    None => {
                        return Err(BuildUtilsError::UnsupportedNodeVersion {
                            declared: declared.to_string(),
                            valid_ranges: candidates.iter().map(|e| e.range.clone()).collect(),
                        });
                    }
                }
            }
        };

        if let Some(date) = selection.discontinue_date {
            let valid_ranges: Vec<&str> = self
                .entries
                .iter()
                .filter(|e| e.discontinue_date.is_none())
                .map(|e| e.range.as_str())
                .collect();
            warn!(
                range = %selection.range,
                discontinue_date = %date,
                valid_ranges = ?valid_ranges,
                "selected Node.js version will be discontinued; deployments created on or \
                 after that date will fail to build"
            );
        }

        Ok(selection.clone())
    }

    /// Ranges of runtimes that are not scheduled for discontinuation
    pub fn valid_ranges(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.discontinue_date.is_none())
            .map(|e| e.range.clone())
            .collect()
    }
}

impl Default for RuntimeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Check whether a supported range (always of the form "N.x") intersects
/// a user-declared engines range.
///
/// The semver crate exposes requirement matching but not requirement
/// intersection, so candidate major lines are probed with representative
/// versions. Engines constraints seen in the wild (`18.x`, `^18`, `>=16`)
/// all resolve consistently at this granularity.
fn range_intersects(supported: &str, declared: &str) -> bool {
    let major = match supported.split('.').next().and_then(|s| s.parse::<u64>().ok()) {
        Some(major) => major,
        None => return false,
    };

    let req = match VersionReq::parse(declared) {
        Ok(req) => req,
        Err(err) => {
            warn!(declared, error = %err, "unparseable engines range");
            return false;
        }
    };

    const PROBES: [(u64, u64); 4] = [(0, 0), (0, 999), (99, 999), (999, 999)];
    PROBES
        .iter()
        .any(|&(minor, patch)| req.matches(&Version::new(major, minor, patch)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RuntimeTable {
        RuntimeTable::builtin()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()
    }

    #[test]
    fn test_default_selection_is_oldest_available() {
        let version = table().resolve(None, today()).unwrap();
        // 16.x is discontinued as of the resolution date, so 18.x is the
        // oldest remaining entry.
        assert_eq!(version.major, 18);
    }

    #[test]
    fn test_declared_range_selects_matching_major() {
        let version = table().resolve(Some("20.x"), today()).unwrap();
        assert_eq!(version.major, 20);
        assert_eq!(version.runtime, "nodejs20.x");
    }

    #[test]
    fn test_open_range_selects_newest() {
        let version = table().resolve(Some(">=18"), today()).unwrap();
        assert_eq!(version.major, 22);
    }

    #[test]
    fn test_unsatisfiable_range_enumerates_alternatives() {
        let err = table().resolve(Some("99.x"), today()).unwrap_err();
        match err {
            BuildUtilsError::UnsupportedNodeVersion {
                declared,
                valid_ranges,
            } => {
                assert_eq!(declared, "99.x");
                assert_eq!(valid_ranges, vec!["22.x", "20.x", "18.x"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_discontinued_entry_is_never_returned() {
        // 16.x was discontinued 2025-02-01; asking for it explicitly after
        // that date must fail rather than resolve.
        let err = table().resolve(Some("16.x"), today()).unwrap_err();
        assert!(matches!(
            err,
            BuildUtilsError::UnsupportedNodeVersion { .. }
        ));

        // Before the discontinue date the same request succeeds.
        let before = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let version = table().resolve(Some("16.x"), before).unwrap();
        assert_eq!(version.major, 16);
    }

    #[test]
    fn test_future_discontinue_still_succeeds() {
        // 18.x has a discontinue date in the future relative to `today`;
        // selecting it succeeds (a deprecation warning is logged).
        let version = table().resolve(Some("18.x"), today()).unwrap();
        assert_eq!(version.major, 18);
        assert!(version.discontinue_date.is_some());
    }

    #[test]
    fn test_valid_ranges_excludes_deprecated() {
        assert_eq!(table().valid_ranges(), vec!["22.x", "20.x"]);
    }
}
