//! Semver-aware version selection honoring policy precedence.
//!
//! Ecosystem-specific formats (SHAs, branch names, pseudo-versions like
//! `v0.0.0-YYYYMMDDHHMMSS-xxx`) never reach this module — adapters filter
//! those out before calling in. The resolver operates purely on semver.

use crate::policy::{IntegrationPolicy, MaxJump};
use crate::update::Impact;
use semver::Version;

/// The outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// Unprefixed — the adapter re-attaches a leading `v` if its
    /// ecosystem requires one.
    pub target_version: String,
    pub impact: Impact,
}

/// Strips a single optional leading `v` and parses as semver. Returns
/// `None` for anything that isn't a dotted 1-3 component numeric form
/// with optional pre-release/build metadata.
pub fn normalize(version: &str) -> Option<Version> {
    let stripped = version.strip_prefix('v').unwrap_or(version);
    Version::parse(stripped).ok().or_else(|| {
        // semver::Version requires exactly 3 components; pad `1` / `1.2`.
        let parts: Vec<&str> = stripped.splitn(2, ['-', '+']).next()?.split('.').collect();
        if parts.len() >= 3 || parts.is_empty() {
            return None;
        }
        if !parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit())) {
            return None;
        }
        let mut padded = parts.to_vec();
        while padded.len() < 3 {
            padded.push("0");
        }
        let rest = &stripped[parts.join(".").len()..];
        Version::parse(&format!("{}{}", padded.join("."), rest)).ok()
    })
}

fn within_jump(current: &Version, candidate: &Version, jump: MaxJump) -> bool {
    match jump {
        MaxJump::None => false,
        MaxJump::Patch => candidate.major == current.major && candidate.minor == current.minor,
        MaxJump::Minor => candidate.major == current.major,
        MaxJump::Major => true,
    }
}

/// Selects the target version and classifies its impact for one
/// dependency.
///
/// `constraint` is accepted for contract symmetry with the adapters that
/// call in but is not otherwise consulted — selection is defined purely
/// in terms of `current_version`'s major/minor and the policy's max-jump
/// bound.
pub fn resolve(
    dependency_name: &str,
    current_version: &str,
    _constraint: &str,
    available_versions: &[String],
    policy: &IntegrationPolicy,
) -> Option<Resolved> {
    let current = normalize(current_version)?;

    // Step 3: ignored dependencies never produce an update.
    if policy.ignore.contains(dependency_name) {
        return None;
    }

    // Step 2: filter available versions to valid, strictly-greater,
    // policy-compliant candidates, preserving datasource order.
    let candidates: Vec<(String, Version)> = available_versions
        .iter()
        .filter_map(|raw| normalize(raw).map(|v| (raw.clone(), v)))
        .filter(|(_, v)| v > &current)
        .filter(|(_, v)| policy.allow_prerelease || v.pre.is_empty())
        .filter(|(_, v)| within_jump(&current, v, policy.update))
        .collect();

    // Step 4: a pin wins if its version is among the filtered candidates;
    // otherwise the dependency is left untouched.
    if let Some(pinned) = policy.pin.get(dependency_name) {
        return candidates
            .iter()
            .find(|(raw, v)| raw == pinned || v.to_string() == *pinned)
            .map(|(_, v)| Resolved {
                target_version: v.to_string(),
                impact: Impact::classify(&current, v),
            });
    }

    // Step 5: maximum candidate under semver ordering. `Iterator::max_by`
    // returns the *last* of equal maxima, which is exactly the tie-break
    // prefer the one later in `available_versions` on a tie.
    let (_, target) = candidates.into_iter().max_by(|a, b| a.1.cmp(&b.1))?;

    Some(Resolved {
        impact: Impact::classify(&current, &target),
        target_version: target.to_string(),
    })
}
