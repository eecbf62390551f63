//! mise adapter.
//!
//! `mise.toml`/`.mise.toml`'s `[tools]` table values (a bare version
//! string or `{version = "…"}`) share asdf's deferred-resolution model:
//! `Plan` always returns an empty plan, and `Apply` declines to rewrite
//! (`native_command`), treating any caller-synthesized updates as
//! uniformly `failed` with remediation text rather than attempting
//! anything.

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
use toml_edit::{DocumentMut, Item};

fn tool_version(item: &Item) -> Option<String> {
    if let Some(version) = item.as_str() {
        return Some(version.to_string());
    }
    item.as_table_like()?.get("version")?.as_str().map(str::to_string)
}

fn parse_mise(path: &Path, content: &[u8]) -> Result<Manifest> {
    let text = std::str::from_utf8(content)
        .map_err(|_| crate::error::Error::parse(path, "toml", "mise config is not valid UTF-8"))?;
    let document: DocumentMut = text
        .parse()
        .map_err(|err: toml_edit::TomlError| crate::error::Error::parse(path, "toml", err.to_string()))?;

    let mut dependencies = Vec::new();
    if let Some(tools) = document.get("tools").and_then(|item| item.as_table_like()) {
        for (name, item) in tools.iter() {
            if let Some(version) = tool_version(item) {
                dependencies.push(Dependency::new(name, version, DependencyKind::Runtime, "mise"));
            }
        }
    }

    Ok(Manifest::new(path, "mise", content.to_vec()).with_dependencies(dedup_dependencies(dependencies)))
}

fn is_mise_file(path: &Path) -> bool {
    matches!(path.file_name().and_then(|n| n.to_str()), Some("mise.toml") | Some(".mise.toml"))
}

#[derive(Default)]
pub struct MiseIntegration;

impl MiseIntegration {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Integration for MiseIntegration {
    fn name(&self) -> &str {
        "mise"
    }

    async fn detect(&self, repo_root: &Path, cancel: &CancellationToken) -> Result<Vec<Manifest>> {
        let paths = walk_matching(repo_root, cancel, |path| is_mise_file(path))?;

        let mut manifests = Vec::new();
        for path in paths {
            crate::cancel::check(cancel)?;
            let safe = pathsafe::sanitize(repo_root, &path)?;
            let content = read_file(&safe)?;
            match parse_mise(&path, &content) {
                Ok(manifest) => manifests.push(manifest),
                Err(err) => tracing::debug!(path = %path.display(), error = %err, "skipping malformed mise config"),
            }
        }
        tracing::debug!(count = manifests.len(), "mise: configs discovered");
        Ok(manifests)
    }

    async fn plan(&self, manifest: &Manifest, ctx: &PlanContext) -> Result<UpdatePlan> {
        crate::cancel::check(ctx.cancel())?;
        tracing::trace!(path = %manifest.path.display(), "mise: version resolution deferred, no updates produced");
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
            "mise: declining to rewrite, run `mise use` manually for each tool"
        );
        Ok(ApplyResult {
            manifest: plan.manifest.clone(),
            applied: 0,
            failed: plan.updates.len(),
            errors: vec![
                "mise does not support in-process rewrites; run `mise use <tool>@<version>` and let mise rewrite its own config".to_string(),
            ],
            manifest_diff: String::new(),
        })
    }

    async fn validate(&self, manifest: &Manifest, cancel: &CancellationToken) -> Result<()> {
        crate::cancel::check(cancel)?;
        let text = manifest
            .content_str()
            .map_err(|_| crate::error::Error::parse(&manifest.path, "toml", "file is not valid UTF-8"))?;
        text.parse::<DocumentMut>()
            .map(|_| ())
            .map_err(|err| crate::error::Error::parse(&manifest.path, "toml", err.to_string()))
    }
}
