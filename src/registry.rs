//! Process-wide named catalog of [`Integration`] constructors.
//!
//! Grounded in `microsoft-regorus`'s generic `Registry<T>` (`src/registry.rs`),
//! adapted from single-threaded `Rc` storage to `Arc` so the catalog can be
//! shared across the concurrent `Detect`/`Plan`/`Apply` phases. Built-in
//! adapters register their constructors at module initialization; plugins
//! register through the same entry point, loaded lazily on first access.

use crate::error::{Error, Result};
use crate::integration::Integration;
use crate::plugin;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A zero-argument integration constructor, stored by name rather than a
/// live instance so construction can be deferred until first use.
pub type Constructor = fn() -> Arc<dyn Integration>;

/// A process-wide, thread-safe catalog mapping integration names to
/// constructors, with a lazily-populated instance cache.
pub struct IntegrationRegistry {
    constructors: DashMap<String, Constructor>,
    cache: DashMap<String, Arc<dyn Integration>>,
    plugins_loaded: AtomicBool,
}

impl Default for IntegrationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl IntegrationRegistry {
    pub fn new() -> Self {
        Self {
            constructors: DashMap::new(),
            cache: DashMap::new(),
            plugins_loaded: AtomicBool::new(false),
        }
    }

    /// Registers a constructor under `name`. Duplicate registration —
    /// including a plugin colliding with a built-in name — is a fatal
    /// programming error,
    pub fn register(&self, name: impl Into<String>, constructor: Constructor) -> Result<()> {
        let name = name.into();
        match self.constructors.entry(name.clone()) {
            Entry::Occupied(_) => Err(Error::Programming(format!(
                "integration '{name}' is already registered"
            ))),
            Entry::Vacant(slot) => {
                slot.insert(constructor);
                Ok(())
            }
        }
    }

    fn ensure_plugins_loaded(&self) {
        if self.plugins_loaded.swap(true, Ordering::SeqCst) {
            return;
        }
        plugin::load_plugins(self);
    }

    /// Ensures plugins are loaded, then returns the cached instance for
    /// `name`, instantiating it on first request.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Integration>> {
        self.ensure_plugins_loaded();
        if let Some(instance) = self.cache.get(name) {
            return Some(instance.clone());
        }
        let constructor = *self.constructors.get(name)?;
        let instance = constructor();
        self.cache.insert(name.to_string(), instance.clone());
        Some(instance)
    }

    /// Ensures plugins are loaded and every registered constructor has
    /// been instantiated, then returns every live instance.
    pub fn get_all(&self) -> Vec<Arc<dyn Integration>> {
        self.ensure_plugins_loaded();
        for entry in self.constructors.iter() {
            if !self.cache.contains_key(entry.key()) {
                let instance = (*entry.value())();
                self.cache.insert(entry.key().clone(), instance);
            }
        }
        self.cache.iter().map(|e| e.value().clone()).collect()
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn count(&self) -> usize {
        self.constructors.len()
    }

    /// Drops every cached instance without forgetting constructors. Forces
    /// `Get`/`GetAll` to re-instantiate on next access.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Clears the instance cache and allows plugin directories to be
    /// rescanned on the next `Get`/`GetAll` call.
    pub fn reload_plugins(&self) {
        self.cache.clear();
        self.plugins_loaded.store(false, Ordering::SeqCst);
    }
}

lazy_static::lazy_static! {
    /// The singleton registry the demo binary and adapters' own
    /// registration code consult. Built-in adapters are registered by
    /// [`crate::adapters::register_builtins`].
    pub static ref INTEGRATIONS: IntegrationRegistry = IntegrationRegistry::new();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result as CrateResult;
    use crate::manifest::Manifest;
    use crate::policy::PlanContext;
    use crate::update::{ApplyResult, RewriteStrategy, UpdatePlan};
    use async_trait::async_trait;
    use std::path::Path;
    use tokio_util::sync::CancellationToken;

    struct FakeIntegration(&'static str);

    #[async_trait]
    impl Integration for FakeIntegration {
        fn name(&self) -> &str {
            self.0
        }

        async fn detect(&self, _repo_root: &Path, _cancel: &CancellationToken) -> CrateResult<Vec<Manifest>> {
            Ok(Vec::new())
        }

        async fn plan(&self, manifest: &Manifest, _ctx: &PlanContext) -> CrateResult<UpdatePlan> {
            Ok(UpdatePlan::empty(manifest.clone(), RewriteStrategy::TextRewrite))
        }

        async fn apply(&self, plan: &UpdatePlan, _cancel: &CancellationToken) -> CrateResult<ApplyResult> {
            Ok(ApplyResult::no_op(plan.manifest.clone()))
        }

        async fn validate(&self, _manifest: &Manifest, _cancel: &CancellationToken) -> CrateResult<()> {
            Ok(())
        }
    }

    fn make_github() -> Arc<dyn Integration> {
        Arc::new(FakeIntegration("github-actions"))
    }

    fn make_docker() -> Arc<dyn Integration> {
        Arc::new(FakeIntegration("docker"))
    }

    #[test]
    fn register_and_fetch_round_trips() {
        let registry = IntegrationRegistry::new();
        registry.register("github-actions", make_github).unwrap();
        assert!(registry.get("github-actions").is_some());
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn duplicate_registration_is_a_programming_error() {
        let registry = IntegrationRegistry::new();
        registry.register("docker", make_docker).unwrap();
        let result = registry.register("docker", make_docker);
        assert!(matches!(result, Err(Error::Programming(_))));
    }

    #[test]
    fn get_caches_the_same_instance() {
        let registry = IntegrationRegistry::new();
        registry.register("docker", make_docker).unwrap();
        let a = registry.get("docker").unwrap();
        let b = registry.get("docker").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn clear_cache_forces_reinstantiation() {
        let registry = IntegrationRegistry::new();
        registry.register("docker", make_docker).unwrap();
        let a = registry.get("docker").unwrap();
        registry.clear_cache();
        let b = registry.get("docker").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn list_is_sorted_and_get_all_matches_count() {
        let registry = IntegrationRegistry::new();
        registry.register("tflint", make_docker).unwrap();
        registry.register("asdf", make_github).unwrap();
        assert_eq!(registry.list(), vec!["asdf".to_string(), "tflint".to_string()]);
        assert_eq!(registry.get_all().len(), 2);
    }
}
