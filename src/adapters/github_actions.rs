//! GitHub Actions workflow adapter.
//!
//! Detects `uses: owner/repo@ref` steps inside `.github/workflows/*.yml`,
//! skips local (`./…`) and Docker (`docker://…`) references and 40-hex SHA
//! pins, and rewrites matched tokens in place with `text_rewrite`.

use super::{build_diff, default_datasource, read_file, walk_matching};
use crate::dependency::{Dependency, DependencyKind};
use crate::error::Result;
use crate::integration::Integration;
use crate::manifest::{dedup_dependencies, Manifest};
use crate::pathsafe;
use crate::policy::PlanContext;
use crate::resolver;
use crate::update::{PolicySource, RewriteStrategy, Update, UpdatePlan};
use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Matches `uses: owner/repo@ref` (optionally quoted), capturing the step
/// identifier and the pinned ref.
fn uses_pattern() -> Regex {
    Regex::new(r#"uses:\s*['"]?([A-Za-z0-9_.\-]+/[A-Za-z0-9_.\-]+)@([A-Za-z0-9_.\-/]+)['"]?"#)
        .expect("static regex is valid")
}

fn is_sha_pin(reference: &str) -> bool {
    reference.len() == 40 && reference.chars().all(|c| c.is_ascii_hexdigit())
}

pub struct GithubActionsIntegration {
    datasource: Arc<dyn crate::datasource::Datasource>,
}

impl GithubActionsIntegration {
    pub fn new() -> Self {
        Self::with_datasource(default_datasource("github"))
    }

    pub fn with_datasource(datasource: Arc<dyn crate::datasource::Datasource>) -> Self {
        Self { datasource }
    }
}

impl Default for GithubActionsIntegration {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_workflow(path: &Path, content: &[u8]) -> Manifest {
    let text = String::from_utf8_lossy(content);
    let pattern = uses_pattern();
    let mut dependencies = Vec::new();

    for capture in pattern.captures_iter(&text) {
        let name = capture[1].to_string();
        let reference = capture[2].to_string();

        if reference.starts_with("docker://") || name.starts_with('.') {
            continue;
        }

        dependencies.push(Dependency::new(name, reference, DependencyKind::Tag, "github"));
    }

    let workflow_name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("workflow").to_string();

    Manifest::new(path, "github-actions", content.to_vec())
        .with_dependencies(dedup_dependencies(dependencies))
        .with_metadata("workflow_name", json!(workflow_name))
}

#[async_trait]
impl Integration for GithubActionsIntegration {
    fn name(&self) -> &str {
        "github-actions"
    }

    async fn detect(&self, repo_root: &Path, cancel: &CancellationToken) -> Result<Vec<Manifest>> {
        let paths = walk_matching(repo_root, cancel, |path| {
            let in_workflows = path
                .ancestors()
                .any(|a| a.file_name().and_then(|n| n.to_str()) == Some("workflows"));
            let is_yaml = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yml") | Some("yaml")
            );
            in_workflows && is_yaml
        })?;

        let mut manifests = Vec::new();
        for path in paths {
            crate::cancel::check(cancel)?;
            let safe = pathsafe::sanitize(repo_root, &path)?;
            let content = read_file(&safe)?;
            manifests.push(parse_workflow(&path, &content));
        }
        tracing::debug!(count = manifests.len(), "github-actions: workflows discovered");
        Ok(manifests)
    }

    async fn plan(&self, manifest: &Manifest, ctx: &PlanContext) -> Result<UpdatePlan> {
        let mut updates = Vec::new();

        for dep in &manifest.dependencies {
            crate::cancel::check(ctx.cancel())?;

            if is_sha_pin(&dep.current_version) {
                tracing::trace!(dependency = %dep.name, "skipping sha-pinned action");
                continue;
            }

            let versions = match self.datasource.get_versions(&dep.name).await {
                Ok(v) => v,
                Err(err) => {
                    tracing::warn!(dependency = %dep.name, error = %err, "datasource lookup failed");
                    continue;
                }
            };

            let Some(resolved) = resolver::resolve(&dep.name, &dep.current_version, &dep.constraint, &versions, ctx.policy())
            else {
                continue;
            };

            let prefixed = if dep.current_version.starts_with('v') {
                format!("v{}", resolved.target_version)
            } else {
                resolved.target_version
            };

            updates.push(Update {
                dependency: dep.clone(),
                target_version: prefixed,
                impact: resolved.impact,
                changelog_url: None,
                policy_source: ctx.policy_source(),
            });
        }

        Ok(UpdatePlan {
            manifest: manifest.clone(),
            updates,
            strategy: RewriteStrategy::TextRewrite,
        })
    }

    async fn apply(&self, plan: &UpdatePlan, cancel: &CancellationToken) -> Result<crate::update::ApplyResult> {
        let mut text = String::from_utf8_lossy(&plan.manifest.content).into_owned();
        let mut applied = 0;
        let mut failed = 0;
        let mut changed_lines = Vec::new();

        for update in &plan.updates {
            crate::cancel::check(cancel)?;
            let old_token = format!("{}@{}", update.dependency.name, update.dependency.current_version);
            let new_token = format!("{}@{}", update.dependency.name, update.target_version);

            if text.contains(&old_token) {
                let old_line = text
                    .lines()
                    .find(|line| line.contains(&old_token))
                    .unwrap_or(&old_token)
                    .trim()
                    .to_string();
                text = text.replace(&old_token, &new_token);
                let new_line = old_line.replace(&old_token, &new_token);
                changed_lines.push((old_line, new_line));
                applied += 1;
            } else {
                failed += 1;
            }
        }

        if applied > 0 {
            pathsafe::write_atomic(&plan.manifest.path, text.as_bytes())
                .map_err(|err| crate::error::Error::apply(&plan.manifest.path, err))?;
        }

        Ok(crate::update::ApplyResult {
            manifest: Manifest {
                content: text.into_bytes(),
                ..plan.manifest.clone()
            },
            applied,
            failed,
            errors: Vec::new(),
            manifest_diff: build_diff(&plan.manifest.path, &changed_lines),
        })
    }

    async fn validate(&self, manifest: &Manifest, cancel: &CancellationToken) -> Result<()> {
        crate::cancel::check(cancel)?;
        let text = manifest.content_str().map_err(|_| {
            crate::error::Error::parse(&manifest.path, "yaml", "workflow file is not valid UTF-8")
        })?;
        let parsed: serde_yaml::Value = serde_yaml::from_str(text)
            .map_err(|err| crate::error::Error::parse(&manifest.path, "yaml", err.to_string()))?;
        if parsed.get("jobs").is_none() {
            return Err(crate::error::Error::parse(
                &manifest.path,
                "yaml",
                "workflow has no `jobs` key",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::StaticDatasource;
    use crate::policy::IntegrationPolicy;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn write_workflow(dir: &Path, content: &str) -> std::path::PathBuf {
        let workflows = dir.join(".github").join("workflows");
        std::fs::create_dir_all(&workflows).unwrap();
        let path = workflows.join("ci.yml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn scenario_1_minor_bump() {
        let dir = tempdir().unwrap();
        write_workflow(
            dir.path(),
            "jobs:\n  build:\n    steps:\n      - uses: actions/checkout@v4.0.0\n",
        );

        let mut versions = BTreeMap::new();
        versions.insert(
            "actions/checkout".to_string(),
            vec!["4.2.2".to_string(), "4.2.1".to_string(), "4.0.0".to_string()],
        );
        let datasource = StaticDatasource::new("github", versions.into_iter().collect());
        let integration = GithubActionsIntegration::with_datasource(Arc::new(datasource));
        let cancel = CancellationToken::new();

        let manifests = integration.detect(dir.path(), &cancel).await.unwrap();
        assert_eq!(manifests.len(), 1);

        let ctx = PlanContext::new(
            IntegrationPolicy {
                update: crate::policy::MaxJump::Minor,
                ..IntegrationPolicy::default()
            },
            PolicySource::Default,
            cancel.clone(),
        );
        let plan = integration.plan(&manifests[0], &ctx).await.unwrap();
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].target_version, "v4.2.2");

        let result = integration.apply(&plan, &cancel).await.unwrap();
        assert_eq!(result.applied, 1);
        assert!(result.manifest.content_str().unwrap().contains("actions/checkout@v4.2.2"));
        assert!(result.manifest_diff.contains("uses:"));

        let reapplied = integration.apply(&plan, &cancel).await.unwrap();
        assert_eq!(reapplied.applied, 0);
    }

    #[tokio::test]
    async fn scenario_2_sha_pin_skipped() {
        let dir = tempdir().unwrap();
        write_workflow(
            dir.path(),
            "jobs:\n  build:\n    steps:\n      - uses: actions/checkout@11bd71901bbe5b1630ceea73d27597364c9af683\n",
        );

        let datasource = StaticDatasource::new(
            "github",
            [(
                "actions/checkout".to_string(),
                vec!["9.9.9".to_string()],
            )]
            .into_iter()
            .collect(),
        );
        let integration = GithubActionsIntegration::with_datasource(Arc::new(datasource));
        let cancel = CancellationToken::new();
        let manifests = integration.detect(dir.path(), &cancel).await.unwrap();
        let ctx = PlanContext::new(IntegrationPolicy::default(), PolicySource::Default, cancel);
        let plan = integration.plan(&manifests[0], &ctx).await.unwrap();
        assert!(plan.updates.is_empty());
    }

    #[test]
    fn docker_and_local_refs_are_filtered_at_parse_time() {
        let manifest = parse_workflow(
            Path::new("ci.yml"),
            b"jobs:\n  build:\n    steps:\n      - uses: docker://alpine@sha256:abc\n      - uses: ./.github/actions/local\n",
        );
        assert!(manifest.dependencies.is_empty());
    }
}
