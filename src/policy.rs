//! Per-ecosystem update rules and the merged policy context threaded
//! through `Plan`.

use crate::update::PolicySource;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tokio_util::sync::CancellationToken;

/// Maximum allowed semver jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxJump {
    None,
    Patch,
    Minor,
    Major,
}

/// Per-ecosystem update rules.
///
/// This is the typed *shape* the resolver consumes. Reading it from a
/// config file on disk is the caller's responsibility (out of scope for
/// this crate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationPolicy {
    pub update: MaxJump,
    pub allow_prerelease: bool,
    pub ignore: BTreeSet<String>,
    pub pin: BTreeMap<String, String>,
}

impl Default for IntegrationPolicy {
    /// The built-in default: `{update: minor, allow_prerelease: false}`
    ///.
    fn default() -> Self {
        Self {
            update: MaxJump::Minor,
            allow_prerelease: false,
            ignore: BTreeSet::new(),
            pin: BTreeMap::new(),
        }
    }
}

/// Merges CLI, config-file, and per-manifest policies into the single
/// effective policy for a `Plan` call, using whole-policy precedence: the
/// highest-precedence layer that is present wins entirely, and its name is
/// recorded for provenance.
pub fn merge_policies(
    cli: Option<&IntegrationPolicy>,
    config: Option<&IntegrationPolicy>,
    manifest: Option<&IntegrationPolicy>,
) -> (IntegrationPolicy, PolicySource) {
    if let Some(policy) = cli {
        (policy.clone(), PolicySource::Cli)
    } else if let Some(policy) = config {
        (policy.clone(), PolicySource::Config)
    } else if let Some(policy) = manifest {
        (policy.clone(), PolicySource::Manifest)
    } else {
        (IntegrationPolicy::default(), PolicySource::Default)
    }
}

/// Carries the merged effective policy through `Plan`, plus the
/// cancellation handle and the provenance of the policy decision.
#[derive(Clone)]
pub struct PlanContext {
    policy: IntegrationPolicy,
    policy_source: PolicySource,
    cancel: CancellationToken,
}

impl PlanContext {
    pub fn new(policy: IntegrationPolicy, policy_source: PolicySource, cancel: CancellationToken) -> Self {
        Self {
            policy,
            policy_source,
            cancel,
        }
    }

    /// Builds a context from the three precedence layers plus a
    /// cancellation token.
    pub fn from_layers(
        cli: Option<&IntegrationPolicy>,
        config: Option<&IntegrationPolicy>,
        manifest: Option<&IntegrationPolicy>,
        cancel: CancellationToken,
    ) -> Self {
        let (policy, source) = merge_policies(cli, config, manifest);
        Self::new(policy, source, cancel)
    }

    pub fn policy(&self) -> &IntegrationPolicy {
        &self.policy
    }

    pub fn policy_source(&self) -> PolicySource {
        self.policy_source
    }

    pub fn cancel(&self) -> &CancellationToken {
        &self.cancel
    }
}
