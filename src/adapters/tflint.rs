//! tflint plugin adapter.
//!
//! Walks `.tflint.hcl` files for `plugin "<label>" { source = …; version =
//! … }` blocks, skipping plugins missing either attribute, and rewrites
//! the `version` attribute with `hcl-edit`'s format-preserving writer
//! (`hcl_rewrite`) — comments and attribute ordering survive untouched.

use super::{default_datasource, read_file, walk_matching};
use crate::dependency::{Dependency, DependencyKind};
use crate::error::Result;
use crate::integration::Integration;
use crate::manifest::{dedup_dependencies, Manifest};
use crate::pathsafe;
use crate::policy::PlanContext;
use crate::resolver;
use crate::update::{RewriteStrategy, Update, UpdatePlan};
use async_trait::async_trait;
use hcl_edit::expr::Expression;
use hcl_edit::structure::{Block, Body, Structure};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn expr_as_str(expr: &Expression) -> Option<&str> {
    match expr {
        Expression::String(s) => Some(s.as_str()),
        _ => None,
    }
}

fn label_as_str(block: &Block) -> Option<&str> {
    block.labels.first().map(|label| label.as_str())
}

fn source_and_version(block: &Block) -> (Option<String>, Option<String>) {
    let mut source = None;
    let mut version = None;
    for structure in block.body.iter() {
        if let Structure::Attribute(attr) = structure {
            match attr.key.as_str() {
                "source" => source = expr_as_str(&attr.value).map(str::to_string),
                "version" => version = expr_as_str(&attr.value).map(str::to_string),
                _ => {}
            }
        }
    }
    (source, version)
}

fn parse_tflint(path: &Path, content: &[u8]) -> Result<Manifest> {
    let text = std::str::from_utf8(content)
        .map_err(|_| crate::error::Error::parse(path, "hcl", "tflint config is not valid UTF-8"))?;
    let body: Body = text
        .parse()
        .map_err(|err: hcl_edit::parser::Error| crate::error::Error::parse(path, "hcl", err.to_string()))?;

    let mut dependencies = Vec::new();
    for structure in body.iter() {
        if let Structure::Block(block) = structure {
            if block.ident.as_str() != "plugin" {
                continue;
            }
            let Some(label) = label_as_str(block) else { continue };
            let (source, version) = source_and_version(block);
            let (Some(source), Some(version)) = (source, version) else { continue };
            dependencies.push(
                Dependency::new(label, version, DependencyKind::Direct, "terraform-registry")
                    .with_constraint(source),
            );
        }
    }

    Ok(Manifest::new(path, "tflint", content.to_vec()).with_dependencies(dedup_dependencies(dependencies)))
}

pub struct TflintIntegration {
    datasource: Arc<dyn crate::datasource::Datasource>,
}

impl TflintIntegration {
    pub fn new() -> Self {
        Self::with_datasource(default_datasource("terraform-registry"))
    }

    pub fn with_datasource(datasource: Arc<dyn crate::datasource::Datasource>) -> Self {
        Self { datasource }
    }
}

impl Default for TflintIntegration {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Integration for TflintIntegration {
    fn name(&self) -> &str {
        "tflint"
    }

    async fn detect(&self, repo_root: &Path, cancel: &CancellationToken) -> Result<Vec<Manifest>> {
        let paths = walk_matching(repo_root, cancel, |path| {
            path.file_name().and_then(|n| n.to_str()) == Some(".tflint.hcl")
        })?;

        let mut manifests = Vec::new();
        for path in paths {
            crate::cancel::check(cancel)?;
            let safe = pathsafe::sanitize(repo_root, &path)?;
            let content = read_file(&safe)?;
            manifests.push(parse_tflint(&path, &content)?);
        }
        tracing::debug!(count = manifests.len(), "tflint: configs discovered");
        Ok(manifests)
    }

    async fn plan(&self, manifest: &Manifest, ctx: &PlanContext) -> Result<UpdatePlan> {
        let mut updates = Vec::new();

        for dep in &manifest.dependencies {
            crate::cancel::check(ctx.cancel())?;

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

            updates.push(Update {
                dependency: dep.clone(),
                target_version: resolved.target_version,
                impact: resolved.impact,
                changelog_url: None,
                policy_source: ctx.policy_source(),
            });
        }

        Ok(UpdatePlan {
            manifest: manifest.clone(),
            updates,
            strategy: RewriteStrategy::HclRewrite,
        })
    }

    async fn apply(&self, plan: &UpdatePlan, cancel: &CancellationToken) -> Result<crate::update::ApplyResult> {
        let text = std::str::from_utf8(&plan.manifest.content)
            .map_err(|_| crate::error::Error::parse(&plan.manifest.path, "hcl", "tflint config is not valid UTF-8"))?;
        let mut body: Body = text
            .parse()
            .map_err(|err: hcl_edit::parser::Error| crate::error::Error::parse(&plan.manifest.path, "hcl", err.to_string()))?;

        let mut applied = 0;
        let mut failed = 0;
        let mut changed_lines = Vec::new();

        for update in &plan.updates {
            crate::cancel::check(cancel)?;
            let mut matched = false;
            for structure in body.iter_mut() {
                if let Structure::Block(block) = structure {
                    if block.ident.as_str() != "plugin" || label_as_str(block) != Some(update.dependency.name.as_str()) {
                        continue;
                    }
                    for inner in block.body.iter_mut() {
                        if let Structure::Attribute(attr) = inner {
                            if attr.key.as_str() == "version" {
                                let old = format!(r#"version = "{}""#, update.dependency.current_version);
                                let new = format!(r#"version = "{}""#, update.target_version);
                                attr.value = Expression::from(update.target_version.clone());
                                changed_lines.push((old, new));
                                matched = true;
                            }
                        }
                    }
                }
            }
            if matched {
                applied += 1;
            } else {
                failed += 1;
            }
        }

        let rewritten = body.to_string();
        if applied > 0 {
            pathsafe::write_atomic(&plan.manifest.path, rewritten.as_bytes())
                .map_err(|err| crate::error::Error::apply(&plan.manifest.path, err))?;
        }

        Ok(crate::update::ApplyResult {
            manifest: Manifest {
                content: rewritten.into_bytes(),
                ..plan.manifest.clone()
            },
            applied,
            failed,
            errors: Vec::new(),
            manifest_diff: super::build_diff(&plan.manifest.path, &changed_lines),
        })
    }

    async fn validate(&self, manifest: &Manifest, cancel: &CancellationToken) -> Result<()> {
        crate::cancel::check(cancel)?;
        let text = manifest
            .content_str()
            .map_err(|_| crate::error::Error::parse(&manifest.path, "hcl", "file is not valid UTF-8"))?;
        text.parse::<Body>()
            .map(|_| ())
            .map_err(|err| crate::error::Error::parse(&manifest.path, "hcl", err.to_string()))
    }
}
