//! Docker adapter.
//!
//! Covers both `Dockerfile`/`Dockerfile.*` `FROM` lines and
//! `{docker-,}compose.{yml,yaml}` `services.*.image` entries. Skips
//! `scratch`, variable-interpolated images, the `latest` tag (implicit or
//! explicit), and digest pins; rewrites the remainder with `text_rewrite`.

use super::{build_diff, default_datasource, read_file, walk_matching};
use crate::dependency::{Dependency, DependencyKind};
use crate::error::Result;
use crate::integration::Integration;
use crate::manifest::{dedup_dependencies, Manifest};
use crate::pathsafe;
use crate::policy::PlanContext;
use crate::resolver;
use crate::update::{RewriteStrategy, Update, UpdatePlan};
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Splits `image:tag` honoring registry hosts with a port (`host:5000/name`).
/// Returns `None` for `scratch`, `${…}`-interpolated images, digest pins,
/// and untagged references (which resolve to the implicit `latest`).
fn split_image_ref(image: &str) -> Option<(String, String)> {
    if image == "scratch" || image.contains("${") || image.contains('@') {
        return None;
    }
    let search_from = image.rfind('/').map(|i| i + 1).unwrap_or(0);
    let colon = image[search_from..].rfind(':').map(|i| i + search_from)?;
    let name = image[..colon].to_string();
    let tag = image[colon + 1..].to_string();
    if tag == "latest" {
        return None;
    }
    Some((name, tag))
}

fn from_line_pattern() -> Regex {
    Regex::new(r"(?im)^FROM\s+(?:--platform=\S+\s+)?(\S+)").expect("static regex is valid")
}

fn is_dockerfile(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n == "Dockerfile" || n.starts_with("Dockerfile."))
        .unwrap_or(false)
}

fn is_compose_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| matches!(n, "compose.yml" | "compose.yaml" | "docker-compose.yml" | "docker-compose.yaml"))
        .unwrap_or(false)
}

fn parse_dockerfile(path: &Path, content: &[u8]) -> Manifest {
    let text = String::from_utf8_lossy(content);
    let dependencies = from_line_pattern()
        .captures_iter(&text)
        .filter_map(|c| split_image_ref(&c[1]))
        .map(|(name, tag)| Dependency::new(name, tag, DependencyKind::Image, "docker-hub"))
        .collect();

    Manifest::new(path, "docker", content.to_vec()).with_dependencies(dedup_dependencies(dependencies))
}

fn parse_compose(path: &Path, content: &[u8]) -> Result<Manifest> {
    let text = std::str::from_utf8(content)
        .map_err(|_| crate::error::Error::parse(path, "yaml", "compose file is not valid UTF-8"))?;
    let doc: serde_yaml::Value = serde_yaml::from_str(text)
        .map_err(|err| crate::error::Error::parse(path, "yaml", err.to_string()))?;

    let mut dependencies = Vec::new();
    if let Some(services) = doc.get("services").and_then(|v| v.as_mapping()) {
        for (_, service) in services {
            if let Some(image) = service.get("image").and_then(|v| v.as_str()) {
                if let Some((name, tag)) = split_image_ref(image) {
                    dependencies.push(Dependency::new(name, tag, DependencyKind::Image, "docker-hub"));
                }
            }
        }
    }

    Ok(Manifest::new(path, "docker", content.to_vec()).with_dependencies(dedup_dependencies(dependencies)))
}

pub struct DockerIntegration {
    datasource: Arc<dyn crate::datasource::Datasource>,
}

impl DockerIntegration {
    pub fn new() -> Self {
        Self::with_datasource(default_datasource("docker-hub"))
    }

    pub fn with_datasource(datasource: Arc<dyn crate::datasource::Datasource>) -> Self {
        Self { datasource }
    }
}

impl Default for DockerIntegration {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Integration for DockerIntegration {
    fn name(&self) -> &str {
        "docker"
    }

    async fn detect(&self, repo_root: &Path, cancel: &CancellationToken) -> Result<Vec<Manifest>> {
        let paths = walk_matching(repo_root, cancel, |path| is_dockerfile(path) || is_compose_file(path))?;

        let mut manifests = Vec::new();
        for path in paths {
            crate::cancel::check(cancel)?;
            let safe = pathsafe::sanitize(repo_root, &path)?;
            let content = read_file(&safe)?;
            if is_dockerfile(&path) {
                manifests.push(parse_dockerfile(&path, &content));
            } else {
                match parse_compose(&path, &content) {
                    Ok(manifest) => manifests.push(manifest),
                    Err(err) => tracing::debug!(path = %path.display(), error = %err, "skipping malformed compose file"),
                }
            }
        }
        tracing::debug!(count = manifests.len(), "docker: manifests discovered");
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
            let old_token = format!("{}:{}", update.dependency.name, update.dependency.current_version);
            let new_token = format!("{}:{}", update.dependency.name, update.target_version);

            if text.contains(&old_token) {
                let old_line = text.lines().find(|l| l.contains(&old_token)).unwrap_or(&old_token).trim().to_string();
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
        let text = manifest
            .content_str()
            .map_err(|_| crate::error::Error::parse(&manifest.path, "text", "file is not valid UTF-8"))?;
        if is_dockerfile(&manifest.path) && !text.to_uppercase().contains("FROM") {
            return Err(crate::error::Error::parse(&manifest.path, "dockerfile", "no FROM instruction found"));
        }
        Ok(())
    }
}
