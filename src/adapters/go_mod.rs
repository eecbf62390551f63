//! Go modules adapter.
//!
//! Parses `require` blocks and single-line requires out of `go.mod`,
//! skipping indirect dependencies, modules named in a `replace`
//! directive, and pseudo-versions (`v0.0.0-…`). Rewrites matched lines
//! with a `custom_rewrite` regex using a `QUOTEMETA(name)\s+
//! QUOTEMETA(currentVersion)` → `name targetVersion`.

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

fn require_line_pattern() -> Regex {
    Regex::new(r"^(\S+)\s+(v\S+)(\s*//\s*indirect)?$").expect("static regex is valid")
}

fn replace_line_pattern() -> Regex {
    Regex::new(r"^(\S+)(?:\s+v\S+)?\s*=>\s*\S+").expect("static regex is valid")
}

fn is_pseudo_version(version: &str) -> bool {
    version.starts_with("v0.0.0-")
}

struct ParsedGoMod {
    module_name: Option<String>,
    go_version: Option<String>,
    dependencies: Vec<Dependency>,
}

fn parse_go_mod_text(text: &str) -> ParsedGoMod {
    let mut module_name = None;
    let mut go_version = None;
    let mut dependencies = Vec::new();
    let mut replaced = std::collections::HashSet::new();

    #[derive(PartialEq)]
    enum Block {
        None,
        Require,
        Replace,
    }
    let mut block = Block::None;

    for raw_line in text.lines() {
        let line = raw_line.trim();

        if let Some(rest) = line.strip_prefix("module ") {
            module_name = Some(rest.trim().to_string());
            continue;
        }
        if let Some(rest) = line.strip_prefix("go ") {
            if go_version.is_none() {
                go_version = Some(rest.trim().to_string());
            }
            continue;
        }

        match block {
            Block::None => {
                if line == "require (" {
                    block = Block::Require;
                } else if line == "replace (" {
                    block = Block::Replace;
                } else if let Some(rest) = line.strip_prefix("require ") {
                    if let Some(captures) = require_line_pattern().captures(rest.trim()) {
                        push_dependency(&captures, &replaced, &mut dependencies);
                    }
                } else if let Some(rest) = line.strip_prefix("replace ") {
                    if let Some(captures) = replace_line_pattern().captures(rest.trim()) {
                        replaced.insert(captures[1].to_string());
                    }
                }
            }
            Block::Require => {
                if line == ")" {
                    block = Block::None;
                } else if let Some(captures) = require_line_pattern().captures(line) {
                    push_dependency(&captures, &replaced, &mut dependencies);
                }
            }
            Block::Replace => {
                if line == ")" {
                    block = Block::None;
                } else if let Some(captures) = replace_line_pattern().captures(line) {
                    replaced.insert(captures[1].to_string());
                }
            }
        }
    }

    // A replace directive can appear after the require block naming a
    // module we already collected; drop those now that `replaced` is final.
    dependencies.retain(|dep| !replaced.contains(&dep.name));

    ParsedGoMod {
        module_name,
        go_version,
        dependencies: dedup_dependencies(dependencies),
    }
}

fn push_dependency(
    captures: &regex::Captures<'_>,
    replaced: &std::collections::HashSet<String>,
    dependencies: &mut Vec<Dependency>,
) {
    let name = captures[1].to_string();
    let version = captures[2].to_string();
    let indirect = captures.get(3).is_some();

    if indirect || replaced.contains(&name) || is_pseudo_version(&version) {
        return;
    }

    dependencies.push(Dependency::new(name, version, DependencyKind::Direct, "go"));
}

pub struct GoModIntegration {
    datasource: Arc<dyn crate::datasource::Datasource>,
}

impl GoModIntegration {
    pub fn new() -> Self {
        Self::with_datasource(default_datasource("go"))
    }

    pub fn with_datasource(datasource: Arc<dyn crate::datasource::Datasource>) -> Self {
        Self { datasource }
    }
}

impl Default for GoModIntegration {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Integration for GoModIntegration {
    fn name(&self) -> &str {
        "go"
    }

    async fn detect(&self, repo_root: &Path, cancel: &CancellationToken) -> Result<Vec<Manifest>> {
        let paths = walk_matching(repo_root, cancel, |path| {
            path.file_name().and_then(|n| n.to_str()) == Some("go.mod")
        })?;

        let mut manifests = Vec::new();
        for path in paths {
            crate::cancel::check(cancel)?;
            let safe = pathsafe::sanitize(repo_root, &path)?;
            let content = read_file(&safe)?;
            let text = std::str::from_utf8(&content)
                .map_err(|_| crate::error::Error::parse(&path, "go.mod", "file is not valid UTF-8"))?;
            let parsed = parse_go_mod_text(text);

            let mut manifest = Manifest::new(path.clone(), "go", content).with_dependencies(parsed.dependencies);
            if let Some(module_name) = parsed.module_name {
                manifest = manifest.with_metadata("module_name", serde_json::json!(module_name));
            }
            if let Some(go_version) = parsed.go_version {
                manifest = manifest.with_metadata("go_version", serde_json::json!(go_version));
            }
            manifests.push(manifest);
        }
        tracing::debug!(count = manifests.len(), "go: go.mod files discovered");
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

            // Go module versions are always `v`-prefixed; the resolver
            // hands back a bare semver string.
            let target_version = format!("v{}", resolved.target_version);

            updates.push(Update {
                dependency: dep.clone(),
                target_version,
                impact: resolved.impact,
                changelog_url: None,
                policy_source: ctx.policy_source(),
            });
        }

        Ok(UpdatePlan {
            manifest: manifest.clone(),
            updates,
            strategy: RewriteStrategy::CustomRewrite,
        })
    }

    async fn apply(&self, plan: &UpdatePlan, cancel: &CancellationToken) -> Result<crate::update::ApplyResult> {
        let mut text = String::from_utf8_lossy(&plan.manifest.content).into_owned();
        let mut applied = 0;
        let mut failed = 0;
        let mut changed_lines = Vec::new();

        for update in &plan.updates {
            crate::cancel::check(cancel)?;
            let pattern = Regex::new(&format!(
                r"{}\s+{}",
                regex::escape(&update.dependency.name),
                regex::escape(&update.dependency.current_version)
            ))
            .expect("escaped literals always form a valid regex");

            if let Some(found) = pattern.find(&text) {
                let old_line = found.as_str().to_string();
                let new_line = format!("{} {}", update.dependency.name, update.target_version);
                text = format!("{}{}{}", &text[..found.start()], new_line, &text[found.end()..]);
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
            .map_err(|_| crate::error::Error::parse(&manifest.path, "go.mod", "file is not valid UTF-8"))?;
        if !text.lines().any(|l| l.trim().starts_with("module ")) {
            return Err(crate::error::Error::parse(&manifest.path, "go.mod", "missing module directive"));
        }
        Ok(())
    }
}
