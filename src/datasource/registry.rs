//! Process-wide named catalog of datasource instances.
//!
//! Parallel to [`crate::registry::IntegrationRegistry`] but keyed to the
//! read-only [`super::Datasource`] side of the contract rather than the
//! four-phase [`crate::integration::Integration`] side. Grounded in the
//! same `microsoft-regorus` `Registry<T>` + `lazy_static` pattern,
//! generalized from `Rc` to `Arc` for cross-thread sharing.

use super::Datasource;
use crate::error::{Error, Result};
use dashmap::DashMap;
use std::sync::Arc;

/// A process-wide, thread-safe catalog mapping datasource names to live
/// instances.
#[derive(Default)]
pub struct DatasourceRegistry {
    entries: DashMap<String, Arc<dyn Datasource>>,
}

impl DatasourceRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Registers a datasource under its own `name()`. Re-registering the
    /// same name is a programming error, not a runtime condition callers
    /// should branch on.
    pub fn register(&self, datasource: Arc<dyn Datasource>) -> Result<()> {
        let name = datasource.name().to_string();
        if self.entries.contains_key(&name) {
            return Err(Error::Programming(format!(
                "datasource '{name}' is already registered"
            )));
        }
        self.entries.insert(name, datasource);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Datasource>> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }
}

lazy_static::lazy_static! {
    /// The singleton registry consulted by adapters at `Plan` time.
    pub static ref DATASOURCES: DatasourceRegistry = DatasourceRegistry::new();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::StaticDatasource;

    #[test]
    fn register_and_fetch_round_trips() {
        let registry = DatasourceRegistry::new();
        let ds: Arc<dyn Datasource> =
            Arc::new(StaticDatasource::new("test-npm", Default::default()));
        registry.register(ds).unwrap();
        assert!(registry.get("test-npm").is_some());
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn duplicate_registration_is_an_error() {
        let registry = DatasourceRegistry::new();
        let a: Arc<dyn Datasource> = Arc::new(StaticDatasource::new("dup", Default::default()));
        let b: Arc<dyn Datasource> = Arc::new(StaticDatasource::new("dup", Default::default()));
        registry.register(a).unwrap();
        assert!(matches!(registry.register(b), Err(Error::Programming(_))));
    }

    #[test]
    fn list_is_sorted() {
        let registry = DatasourceRegistry::new();
        registry
            .register(Arc::new(StaticDatasource::new("zeta", Default::default())))
            .unwrap();
        registry
            .register(Arc::new(StaticDatasource::new("alpha", Default::default())))
            .unwrap();
        assert_eq!(registry.list(), vec!["alpha".to_string(), "zeta".to_string()]);
    }
}
