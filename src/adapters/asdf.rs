//! asdf adapter.
//!
//! `.tool-versions` pins tool versions against dozens of independent
//! per-tool plugin registries asdf itself manages; resolving "what's
//! newer" is deferred to the user rather than modeled here. `Plan` always
//! returns an empty plan; `Apply` declines to rewrite (`native_command`)
//! and treats any updates a caller synthesizes anyway as uniformly
//! `failed` with remediation text rather than attempting anything.

use super::{read_file, walk_matching};
use crate::dependency::{Dependency, DependencyKind};
use crate::error::Result;
use crate::integration::Integration;
use crate::manifest::{dedup_dependencies, Manifest};
use crate::pathsafe;
use crate::policy::PlanContext;
use crate::update::{ApplyResult, RewriteStrategy, UpdatePlan};
use async_trait::async_trait;
use std::path::Path;
use tokio_util::sync::CancellationToken;

fn parse_tool_versions(path: &Path, content: &[u8]) -> Manifest {
    let text = String::from_utf8_lossy(content);
    let dependencies = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let tool = parts.next()?;
            let version = parts.next()?;
            Some(Dependency::new(tool, version, DependencyKind::Runtime, "asdf"))
        })
        .collect();

    Manifest::new(path, "asdf", content.to_vec()).with_dependencies(dedup_dependencies(dependencies))
}

#[derive(Default)]
pub struct AsdfIntegration;

impl AsdfIntegration {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Integration for AsdfIntegration {
    fn name(&self) -> &str {
        "asdf"
    }

    async fn detect(&self, repo_root: &Path, cancel: &CancellationToken) -> Result<Vec<Manifest>> {
        let paths = walk_matching(repo_root, cancel, |path| {
            path.file_name().and_then(|n| n.to_str()) == Some(".tool-versions")
        })?;

        let mut manifests = Vec::new();
        for path in paths {
            crate::cancel::check(cancel)?;
            let safe = pathsafe::sanitize(repo_root, &path)?;
            let content = read_file(&safe)?;
            manifests.push(parse_tool_versions(&path, &content));
        }
        tracing::debug!(count = manifests.len(), "asdf: .tool-versions files discovered");
        Ok(manifests)
    }

    async fn plan(&self, manifest: &Manifest, ctx: &PlanContext) -> Result<UpdatePlan> {
        crate::cancel::check(ctx.cancel())?;
        tracing::trace!(path = %manifest.path.display(), "asdf: version resolution deferred, no updates produced");
        Ok(UpdatePlan::empty(manifest.clone(), RewriteStrategy::NativeCommand))
    }

    async fn apply(&self, plan: &UpdatePlan, cancel: &CancellationToken) -> Result<ApplyResult> {
        if plan.updates.is_empty() {
            return Ok(ApplyResult::no_op(plan.manifest.clone()));
        }

        for _ in &plan.updates {
            crate::cancel::check(cancel)?;
        }

        tracing::warn!(
            path = %plan.manifest.path.display(),
            count = plan.updates.len(),
            "asdf: declining to rewrite, run `asdf install` manually for each tool"
        );
        Ok(ApplyResult {
            manifest: plan.manifest.clone(),
            applied: 0,
            failed: plan.updates.len(),
            errors: vec![
                "asdf does not support in-process rewrites; install the listed versions with `asdf install <tool> <version>` and edit .tool-versions by hand".to_string(),
            ],
            manifest_diff: String::new(),
        })
    }

    async fn validate(&self, manifest: &Manifest, cancel: &CancellationToken) -> Result<()> {
        crate::cancel::check(cancel)?;
        let text = manifest
            .content_str()
            .map_err(|_| crate::error::Error::parse(&manifest.path, "tool-versions", "file is not valid UTF-8"))?;
        let has_entry = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .any(|l| l.split_whitespace().count() >= 2);
        if !has_entry {
            return Err(crate::error::Error::parse(&manifest.path, "tool-versions", "no tool/version pairs found"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::IntegrationPolicy;
    use crate::update::{PolicySource, Update, Impact};
    use tempfile::tempdir;

    #[tokio::test]
    async fn detect_parses_tool_version_pairs() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(".tool-versions"), "nodejs 20.11.0\npython 3.12.1\n").unwrap();

        let integration = AsdfIntegration::new();
        let cancel = CancellationToken::new();
        let manifests = integration.detect(dir.path(), &cancel).await.unwrap();
        assert_eq!(manifests.len(), 1);
        assert_eq!(manifests[0].dependencies.len(), 2);
    }

    #[tokio::test]
    async fn plan_never_produces_updates() {
        let manifest = parse_tool_versions(Path::new(".tool-versions"), b"nodejs 20.11.0\n");
        let ctx = PlanContext::new(IntegrationPolicy::default(), PolicySource::Default, CancellationToken::new());
        let integration = AsdfIntegration::new();
        let plan = integration.plan(&manifest, &ctx).await.unwrap();
        assert!(plan.updates.is_empty());
        assert_eq!(plan.strategy, RewriteStrategy::NativeCommand);
    }

    #[tokio::test]
    async fn apply_declines_synthesized_updates() {
        let manifest = parse_tool_versions(Path::new(".tool-versions"), b"nodejs 20.11.0\n");
        let dep = manifest.dependencies[0].clone();
        let plan = UpdatePlan {
            manifest: manifest.clone(),
            updates: vec![Update {
                dependency: dep,
                target_version: "21.0.0".to_string(),
                impact: Impact::Major,
                changelog_url: None,
                policy_source: PolicySource::Default,
            }],
            strategy: RewriteStrategy::NativeCommand,
        };
        let integration = AsdfIntegration::new();
        let result = integration.apply(&plan, &CancellationToken::new()).await.unwrap();
        assert_eq!(result.applied, 0);
        assert_eq!(result.failed, 1);
        assert!(!result.errors.is_empty());
    }
}
