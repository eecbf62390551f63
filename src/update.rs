//! `Update`, `UpdatePlan`, and `ApplyResult`.

use crate::dependency::Dependency;
use crate::manifest::Manifest;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Categorical severity of a version change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    None,
    Patch,
    Minor,
    Major,
}

impl Impact {
    /// Classifies the jump from `current` to `target` by comparing
    /// major/minor/patch triples.
    pub fn classify(current: &semver::Version, target: &semver::Version) -> Self {
        match target.cmp(current) {
            Ordering::Less | Ordering::Equal => Impact::None,
            Ordering::Greater => {
                if target.major != current.major {
                    Impact::Major
                } else if target.minor != current.minor {
                    Impact::Minor
                } else {
                    Impact::Patch
                }
            }
        }
    }
}

/// Which layer of the policy-precedence chain selected an update's target
/// version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicySource {
    Cli,
    Config,
    Manifest,
    Default,
}

/// How `Apply` will mutate a manifest's on-disk bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteStrategy {
    TextRewrite,
    YamlRewrite,
    HclRewrite,
    CustomRewrite,
    NativeCommand,
}

/// A proposed version change for one dependency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub dependency: Dependency,
    pub target_version: String,
    pub impact: Impact,
    pub changelog_url: Option<String>,
    pub policy_source: PolicySource,
}

/// The result of `Plan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePlan {
    pub manifest: Manifest,
    pub updates: Vec<Update>,
    pub strategy: RewriteStrategy,
}

impl UpdatePlan {
    pub fn empty(manifest: Manifest, strategy: RewriteStrategy) -> Self {
        Self {
            manifest,
            updates: Vec::new(),
            strategy,
        }
    }
}

/// The outcome of `Apply`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyResult {
    pub manifest: Manifest,
    pub applied: usize,
    pub failed: usize,
    pub errors: Vec<String>,
    /// Unified-diff-style string covering only semantically meaningful
    /// lines. Empty iff `applied == 0`.
    pub manifest_diff: String,
}

impl ApplyResult {
    pub fn no_op(manifest: Manifest) -> Self {
        Self {
            manifest,
            applied: 0,
            failed: 0,
            errors: Vec::new(),
            manifest_diff: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_major() {
        let current = semver::Version::parse("1.2.3").unwrap();
        let target = semver::Version::parse("2.0.0").unwrap();
        assert_eq!(Impact::classify(&current, &target), Impact::Major);
    }

    #[test]
    fn classify_minor() {
        let current = semver::Version::parse("1.2.3").unwrap();
        let target = semver::Version::parse("1.3.0").unwrap();
        assert_eq!(Impact::classify(&current, &target), Impact::Minor);
    }

    #[test]
    fn classify_patch() {
        let current = semver::Version::parse("1.2.3").unwrap();
        let target = semver::Version::parse("1.2.4").unwrap();
        assert_eq!(Impact::classify(&current, &target), Impact::Patch);
    }

    #[test]
    fn classify_none_for_equal_or_lesser() {
        let current = semver::Version::parse("1.2.3").unwrap();
        assert_eq!(Impact::classify(&current, &current.clone()), Impact::None);
        let lesser = semver::Version::parse("1.0.0").unwrap();
        assert_eq!(Impact::classify(&current, &lesser), Impact::None);
    }
}
