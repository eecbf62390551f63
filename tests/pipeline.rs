//! End-to-end exercises of the registry-driven pipeline: register the
//! built-in adapters, point `Detect` at a scratch repository, and walk
//! through `Plan`/`Apply`/`Validate` the way a driver binary would.

use anyhow::{Context, Result};
use std::sync::Arc;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;
use uptool::adapters::{docker, github_actions, go_mod};
use uptool::datasource::StaticDatasource;
use uptool::policy::{IntegrationPolicy, PlanContext};
use uptool::registry::IntegrationRegistry;
use uptool::update::PolicySource;

#[tokio::test]
async fn registry_round_trip_detects_and_plans_github_actions() -> Result<()> {
    let dir = tempdir().context("creating scratch repo")?;
    let workflows = dir.path().join(".github/workflows");
    std::fs::create_dir_all(&workflows).context("creating .github/workflows")?;
    std::fs::write(
        workflows.join("ci.yml"),
        "jobs:\n  build:\n    steps:\n      - uses: actions/checkout@v3\n      - uses: actions/upload-artifact@a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4e5f6a1b2\n",
    )
    .context("writing ci.yml")?;

    let registry = IntegrationRegistry::new();
    let datasource = Arc::new(StaticDatasource::new(
        "github-releases",
        [("actions/checkout".to_string(), vec!["v3.1.0".to_string()])].into_iter().collect(),
    ));
    registry
        .register("github-actions", move || {
            Arc::new(github_actions::GithubActionsIntegration::with_datasource(datasource.clone()))
        })
        .context("registering github-actions")?;

    let integration = registry.get("github-actions").expect("registered above");
    let cancel = CancellationToken::new();
    let manifests = integration.detect(dir.path(), &cancel).await.context("detecting workflows")?;
    assert_eq!(manifests.len(), 1);
    assert_eq!(manifests[0].dependencies.len(), 2, "both refs are kept at detect time");

    let ctx = PlanContext::new(IntegrationPolicy::default(), PolicySource::Default, cancel.clone());
    let plan = integration.plan(&manifests[0], &ctx).await.context("planning updates")?;
    assert_eq!(plan.updates.len(), 1, "the SHA-pinned step is filtered during plan");
    assert_eq!(plan.updates[0].target_version, "v3.1.0");

    let result = integration.apply(&plan, &cancel).await.context("applying plan")?;
    assert_eq!(result.applied, 1);
    assert!(result.manifest.content_str().context("reading rewritten manifest")?.contains("actions/checkout@v3.1.0"));

    integration.validate(&result.manifest, &cancel).await.context("validating rewritten manifest")?;
    Ok(())
}

#[tokio::test]
async fn multiple_adapters_coexist_in_one_registry() -> Result<()> {
    let dir = tempdir().context("creating scratch repo")?;
    std::fs::write(dir.path().join("Dockerfile"), "FROM redis:7.0.0\n").context("writing Dockerfile")?;
    std::fs::write(
        dir.path().join("go.mod"),
        "module example.com/widget\n\ngo 1.21\n\nrequire github.com/pkg/errors v0.9.0\n",
    )
    .context("writing go.mod")?;

    let registry = IntegrationRegistry::new();
    registry
        .register("docker", || {
            Arc::new(docker::DockerIntegration::with_datasource(Arc::new(StaticDatasource::new(
                "docker-hub",
                [("redis".to_string(), vec!["7.2.0".to_string()])].into_iter().collect(),
            ))))
        })
        .context("registering docker")?;
    registry
        .register("go", || {
            Arc::new(go_mod::GoModIntegration::with_datasource(Arc::new(StaticDatasource::new(
                "go",
                [("github.com/pkg/errors".to_string(), vec!["v0.9.1".to_string()])].into_iter().collect(),
            ))))
        })
        .context("registering go")?;

    assert_eq!(registry.count(), 2);
    assert_eq!(registry.list(), vec!["docker".to_string(), "go".to_string()]);

    let cancel = CancellationToken::new();
    let ctx = PlanContext::new(IntegrationPolicy::default(), PolicySource::Default, cancel.clone());

    let mut total_updates = 0;
    for integration in registry.get_all() {
        let manifests = integration
            .detect(dir.path(), &cancel)
            .await
            .with_context(|| format!("detecting {} manifests", integration.name()))?;
        for manifest in manifests {
            let plan = integration
                .plan(&manifest, &ctx)
                .await
                .with_context(|| format!("planning updates for {}", manifest.path.display()))?;
            total_updates += plan.updates.len();
        }
    }
    assert_eq!(total_updates, 2, "one update from docker, one from go");
    Ok(())
}

#[tokio::test]
async fn reapplying_an_already_applied_plan_is_a_no_op() -> Result<()> {
    let dir = tempdir().context("creating scratch repo")?;
    std::fs::write(dir.path().join("Dockerfile"), "FROM nginx:1.24.0\n").context("writing Dockerfile")?;

    let datasource = Arc::new(StaticDatasource::new(
        "docker-hub",
        [("nginx".to_string(), vec!["1.25.0".to_string()])].into_iter().collect(),
    ));
    let integration = docker::DockerIntegration::with_datasource(datasource);
    let cancel = CancellationToken::new();

    let manifests = integration.detect(dir.path(), &cancel).await.context("detecting Dockerfile")?;
    let ctx = PlanContext::new(IntegrationPolicy::default(), PolicySource::Default, cancel.clone());
    let plan = integration.plan(&manifests[0], &ctx).await.context("planning updates")?;
    let first = integration.apply(&plan, &cancel).await.context("applying plan")?;
    assert_eq!(first.applied, 1);

    let manifests_after = integration.detect(dir.path(), &cancel).await.context("re-detecting Dockerfile")?;
    let plan_after = integration.plan(&manifests_after[0], &ctx).await.context("re-planning updates")?;
    assert!(plan_after.updates.is_empty(), "nginx is already at the target version");
    Ok(())
}
