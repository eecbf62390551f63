//! One discovered file.

use crate::dependency::Dependency;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One discovered manifest file.
///
/// Created by `Detect`, consumed by `Plan`/`Apply`/`Validate`, and never
/// mutated after creation — rewrites produce new bytes on disk, not new
/// `content` on this value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Repo-relative path.
    pub path: PathBuf,
    /// Adapter name, e.g. `"github-actions"`, `"docker"`, `"go"`.
    pub kind: String,
    /// Order is significant for diff stability: `Plan` considers
    /// dependencies in this order.
    pub dependencies: Vec<Dependency>,
    /// Original bytes, preserved for rewrite.
    pub content: Vec<u8>,
    /// Adapter-specific open mapping, e.g.
    /// `{module_name, go_version, replacements, workflow_name}`.
    pub metadata: BTreeMap<String, Value>,
}

impl Manifest {
    pub fn new(path: impl Into<PathBuf>, kind: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            kind: kind.into(),
            dependencies: Vec::new(),
            content,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn content_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.content)
    }
}

/// De-duplicates dependencies within one manifest by `(name, registry)`,
/// keeping the first occurrence for diff stability.
pub fn dedup_dependencies(dependencies: Vec<Dependency>) -> Vec<Dependency> {
    let mut seen = std::collections::HashSet::new();
    dependencies
        .into_iter()
        .filter(|dep| seen.insert((dep.name.clone(), dep.registry.clone())))
        .collect()
}
