//! Built-in ecosystem adapters.
//!
//! Each submodule implements [`crate::integration::Integration`] for one
//! manifest family. Shared plumbing — directory walking with the
//! exclusion rules common to every adapter, and unified-diff construction
//! — lives here so adapters only encode their own filters and rewrite
//! strategy.

pub mod asdf;
pub mod docker;
pub mod github_actions;
pub mod go_mod;
pub mod mise;
pub mod tflint;

use crate::datasource::{Datasource, StaticDatasource};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use walkdir::{DirEntry, WalkDir};

/// Looks up `name` in the process-wide datasource registry, falling back
/// to an empty [`StaticDatasource`] when nothing is registered.
///
/// No concrete HTTP-backed datasource ships in this crate — external
/// collaborators are expected to register one; this fallback keeps adapter
/// constructors infallible so they satisfy
/// [`crate::registry::Constructor`]'s `fn() -> Arc<dyn Integration>`
/// signature. A driver that registers a real datasource under the same
/// name transparently takes over for every adapter built with `new()`.
pub(crate) fn default_datasource(name: &str) -> Arc<dyn Datasource> {
    crate::datasource::registry::DATASOURCES
        .get(name)
        .unwrap_or_else(|| Arc::new(StaticDatasource::new(name, HashMap::new())))
}

/// Directories `Detect` never descends into.
const EXCLUDED_DIRS: &[&str] = &["node_modules", "vendor", "testdata"];

fn is_excluded(entry: &DirEntry, repo_root: &Path) -> bool {
    if entry.path() == repo_root {
        return false;
    }
    let Some(name) = entry.file_name().to_str() else {
        return true;
    };
    entry.file_type().is_dir() && (name.starts_with('.') || EXCLUDED_DIRS.contains(&name))
}

/// Walks `repo_root`, skipping dot-directories (other than the root),
/// `node_modules`/`vendor`/`testdata`, and checking `cancel` between
/// entries, yielding every file whose name satisfies `matches`.
pub(crate) fn walk_matching(
    repo_root: &Path,
    cancel: &CancellationToken,
    matches: impl Fn(&Path) -> bool,
) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let walker = WalkDir::new(repo_root).into_iter().filter_entry(|e| !is_excluded(e, repo_root));

    for entry in walker {
        crate::cancel::check(cancel)?;
        let entry = entry.map_err(|err| {
            Error::discovery(
                err.path().unwrap_or(repo_root).to_path_buf(),
                std::io::Error::new(std::io::ErrorKind::Other, err.to_string()),
            )
        })?;
        if entry.file_type().is_file() && matches(entry.path()) {
            found.push(entry.path().to_path_buf());
        }
    }

    found.sort();
    Ok(found)
}

/// Reads `path` (already produced by a walk under `repo_root`, so assumed
/// safe) into its raw bytes, mapping I/O failures to a `Discovery` error.
pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| Error::discovery(path, source))
}

/// Builds a unified-diff-style string: a `---`/`+++` header followed by
/// one `-old`/`+new` pair per changed line.
pub(crate) fn build_diff(path: &Path, changed_lines: &[(String, String)]) -> String {
    if changed_lines.is_empty() {
        return String::new();
    }
    let mut diff = format!("--- {}\n+++ {}\n", path.display(), path.display());
    for (old, new) in changed_lines {
        diff.push_str(&format!("- {old}\n+ {new}\n"));
    }
    diff
}

/// Registers every built-in adapter's constructor into `registry`.
pub fn register_builtins(registry: &crate::registry::IntegrationRegistry) -> Result<()> {
    registry.register("github-actions", || {
        std::sync::Arc::new(github_actions::GithubActionsIntegration::new())
    })?;
    registry.register("docker", || std::sync::Arc::new(docker::DockerIntegration::new()))?;
    registry.register("go", || std::sync::Arc::new(go_mod::GoModIntegration::new()))?;
    registry.register("tflint", || std::sync::Arc::new(tflint::TflintIntegration::new()))?;
    registry.register("asdf", || std::sync::Arc::new(asdf::AsdfIntegration::new()))?;
    registry.register("mise", || std::sync::Arc::new(mise::MiseIntegration::new()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_diff_is_empty_for_no_changes() {
        assert_eq!(build_diff(Path::new("x"), &[]), "");
    }

    #[test]
    fn build_diff_formats_header_and_pairs() {
        let diff = build_diff(
            Path::new("go.mod"),
            &[("a v1.0.0".to_string(), "a v1.0.1".to_string())],
        );
        assert!(diff.starts_with("--- go.mod\n+++ go.mod\n"));
        assert!(diff.contains("- a v1.0.0\n"));
        assert!(diff.contains("+ a v1.0.1\n"));
    }

    #[test]
    fn register_builtins_populates_all_six() {
        let registry = crate::registry::IntegrationRegistry::new();
        register_builtins(&registry).unwrap();
        assert_eq!(registry.count(), 6);
    }
}
