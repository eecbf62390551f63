//! Read-only view of one upstream version registry.
//!
//! Concrete HTTP-backed datasources (npm, Docker Hub, the Go proxy,
//! GitHub Releases) are external collaborators — this module specifies
//! only the interface they implement, plus the caching decorator and
//! process-wide registry that are this crate's job to provide.

mod cache;
pub mod registry;
mod static_ds;

pub use cache::CachingDatasource;
pub use registry::DatasourceRegistry;
pub use static_ds::StaticDatasource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One version entry as reported by a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub release_date: Option<String>,
    pub deprecated: bool,
}

/// Full package metadata as reported by a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub versions: Vec<VersionInfo>,
}

/// A read-only adapter over one upstream version registry.
///
/// Implementations must be safe for concurrent use — typically an HTTP
/// client fronted by an in-memory cache keyed by package name (see
/// [`CachingDatasource`]).
#[async_trait]
pub trait Datasource: Send + Sync {
    fn name(&self) -> &str;

    async fn get_latest_version(&self, package: &str) -> crate::error::Result<String>;

    /// Newest-first by the registry's convention. The resolver does not
    /// depend on this ordering, but does break ties by preferring entries
    /// that appear later, treating them as "more recent".
    async fn get_versions(&self, package: &str) -> crate::error::Result<Vec<String>>;

    async fn get_package_info(&self, package: &str) -> crate::error::Result<PackageInfo>;
}
