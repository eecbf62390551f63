//! One declared version pin inside a manifest.

use serde::{Deserialize, Serialize};

/// How a dependency is pinned in its native manifest format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Direct,
    Indirect,
    Runtime,
    Tag,
    Sha,
    Ref,
    Image,
}

/// A single declared version pin inside a [`crate::Manifest`].
///
/// Immutable once produced by `Detect` — rewrites happen to the file on
/// disk, never to this in-memory value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    /// Ecosystem-qualified identifier, e.g. `actions/checkout`,
    /// `github.com/foo/bar`, `nodejs`.
    pub name: String,
    /// Opaque string in the ecosystem's native grammar. May be semver, a
    /// SHA, a git ref, or a tag.
    pub current_version: String,
    /// Range expression; often equal to `current_version` for pin-style
    /// ecosystems.
    pub constraint: String,
    pub kind: DependencyKind,
    /// Datasource selector, e.g. `npm`, `go`, `docker-hub`, `github`.
    pub registry: String,
}

impl Dependency {
    pub fn new(
        name: impl Into<String>,
        current_version: impl Into<String>,
        kind: DependencyKind,
        registry: impl Into<String>,
    ) -> Self {
        let current_version = current_version.into();
        Self {
            name: name.into(),
            constraint: current_version.clone(),
            current_version,
            kind,
            registry: registry.into(),
        }
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = constraint.into();
        self
    }
}
