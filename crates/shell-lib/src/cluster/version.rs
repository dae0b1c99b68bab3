//! Cluster version normalization

use crate::error::{Result, ShellError};
use std::fmt;
use std::str::FromStr;

/// A clean `vMAJOR.MINOR.PATCH` control-plane version
///
/// Build metadata (`+...`) and pre-release or vendor suffixes (`-...`) are
/// stripped so the value can be used as a path segment in the kubectl
/// release URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterVersion(String);

impl ClusterVersion {
    /// Normalize a raw `gitVersion` as reported by the API server
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let without_build = trimmed.split('+').next().unwrap_or_default();
        let core = without_build.split('-').next().unwrap_or_default();
        let numeric = core.strip_prefix('v').unwrap_or(core);

        let parts: Vec<&str> = numeric.split('.').collect();
        let valid = parts.len() == 3
            && parts
                .iter()
                .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));

        if !valid {
            return Err(ShellError::InvalidVersion(raw.to_string()));
        }

        Ok(Self(format!("v{}", numeric)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ClusterVersion {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ClusterVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ClusterVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_build_metadata_and_prerelease() {
        let version = ClusterVersion::parse("v1.29.3-eks-1234+abcdef").unwrap();
        assert_eq!(version.as_str(), "v1.29.3");
    }

    #[test]
    fn test_strips_build_metadata_only() {
        let version = ClusterVersion::parse("v1.28.5+k3s1").unwrap();
        assert_eq!(version.as_str(), "v1.28.5");
    }

    #[test]
    fn test_strips_dirty_suffix() {
        let version = ClusterVersion::parse("v1.30.0-dirty").unwrap();
        assert_eq!(version.to_string(), "v1.30.0");
    }

    #[test]
    fn test_clean_version_unchanged() {
        let version: ClusterVersion = "v1.27.10".parse().unwrap();
        assert_eq!(version.as_str(), "v1.27.10");
    }

    #[test]
    fn test_adds_missing_prefix() {
        let version = ClusterVersion::parse("1.29.1-gke.1589017").unwrap();
        assert_eq!(version.as_str(), "v1.29.1");
    }

    #[test]
    fn test_rejects_garbage() {
        for raw in ["", "v1.29", "latest", "v1.x.3", "v1.2.3.4", "+abc"] {
            assert!(
                matches!(ClusterVersion::parse(raw), Err(ShellError::InvalidVersion(_))),
                "expected {:?} to be rejected",
                raw
            );
        }
    }
}
