//! The four-phase contract every ecosystem adapter implements.
//!
//! `Detect → Plan → Apply → Validate`, each independently cancellable.
//! Grounded in `deps-lsp`'s `Ecosystem` trait (`other_examples/`), widened
//! from "parse one manifest" to the full discover/plan/apply/validate
//! lifecycle this crate's registry drives.

use crate::error::Result;
use crate::manifest::Manifest;
use crate::policy::PlanContext;
use crate::update::{ApplyResult, UpdatePlan};
use async_trait::async_trait;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// One ecosystem's adapter: GitHub Actions, Dockerfile/Compose, Go
/// modules, mise/asdf tool versions, tflint plugins, or a dynamically
/// loaded plugin implementing the same contract.
#[async_trait]
pub trait Integration: Send + Sync {
    /// The name this integration is registered and looked up under.
    fn name(&self) -> &str;

    /// Walks `repo_root` for manifests this integration owns. Must not
    /// follow symlinks out of `repo_root`.
    async fn detect(&self, repo_root: &Path, cancel: &CancellationToken) -> Result<Vec<Manifest>>;

    /// Resolves target versions for every dependency in `manifest` under
    /// `ctx`'s effective policy, producing a plan with no side effects.
    async fn plan(&self, manifest: &Manifest, ctx: &PlanContext) -> Result<UpdatePlan>;

    /// Rewrites `plan.manifest`'s bytes on disk per `plan.strategy`. Must
    /// not leave a partially-written file behind on failure. Checks
    /// `cancel` once per update.
    async fn apply(&self, plan: &UpdatePlan, cancel: &CancellationToken) -> Result<ApplyResult>;

    /// Sanity-checks a manifest after `Apply` (e.g. re-parses it). Adapters
    /// with nothing to check may return `Ok(())` unconditionally.
    async fn validate(&self, manifest: &Manifest, cancel: &CancellationToken) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Manifest;
    use crate::policy::IntegrationPolicy;
    use crate::update::{PolicySource, RewriteStrategy};
    use std::path::PathBuf;

    /// A trivial no-op integration, used only to confirm the trait object
    /// is usable the way the registry expects: behind `Arc<dyn Integration>`.
    struct NoopIntegration;

    #[async_trait]
    impl Integration for NoopIntegration {
        fn name(&self) -> &str {
            "noop"
        }

        async fn detect(&self, _repo_root: &Path, _cancel: &CancellationToken) -> Result<Vec<Manifest>> {
            Ok(Vec::new())
        }

        async fn plan(&self, manifest: &Manifest, _ctx: &PlanContext) -> Result<UpdatePlan> {
            Ok(UpdatePlan::empty(manifest.clone(), RewriteStrategy::TextRewrite))
        }

        async fn apply(&self, plan: &UpdatePlan, _cancel: &CancellationToken) -> Result<ApplyResult> {
            Ok(ApplyResult::no_op(plan.manifest.clone()))
        }

        async fn validate(&self, _manifest: &Manifest, _cancel: &CancellationToken) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn trait_object_round_trips_through_the_four_phases() {
        let integration: std::sync::Arc<dyn Integration> = std::sync::Arc::new(NoopIntegration);
        let cancel = CancellationToken::new();
        let manifests = integration.detect(&PathBuf::from("."), &cancel).await.unwrap();
        assert!(manifests.is_empty());

        let manifest = Manifest::new(PathBuf::from("x"), "noop", Vec::new());
        let ctx = PlanContext::new(IntegrationPolicy::default(), PolicySource::Default, cancel.clone());
        let plan = integration.plan(&manifest, &ctx).await.unwrap();
        assert!(plan.updates.is_empty());

        let result = integration.apply(&plan, &cancel).await.unwrap();
        assert_eq!(result.applied, 0);
        integration.validate(&manifest, &cancel).await.unwrap();
    }
}
