//! In-memory test double for [`super::Datasource`].
//!
//! Real network-backed datasources are out of scope for this crate; tests
//! and examples stand one of these up instead of an HTTP client.

use super::{Datasource, PackageInfo, VersionInfo};
use crate::error::Error;
use async_trait::async_trait;
use std::collections::HashMap;

/// A fixed table of package name to available versions, newest-first.
pub struct StaticDatasource {
    name: String,
    versions: HashMap<String, Vec<String>>,
}

impl StaticDatasource {
    pub fn new(name: impl Into<String>, versions: HashMap<String, Vec<String>>) -> Self {
        Self {
            name: name.into(),
            versions,
        }
    }

    /// Convenience constructor from `(package, versions)` pairs, used
    /// heavily in this crate's own tests.
    pub fn from_pairs<I, S, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: IntoIterator<Item = &'static str>,
    {
        let versions = pairs
            .into_iter()
            .map(|(name, vs)| (name.into(), vs.into_iter().map(String::from).collect()))
            .collect();
        Self::new("static", versions)
    }
}

#[async_trait]
impl Datasource for StaticDatasource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_latest_version(&self, package: &str) -> crate::error::Result<String> {
        self.versions
            .get(package)
            .and_then(|vs| vs.first())
            .cloned()
            .ok_or_else(|| Error::datasource(&self.name, package, "unknown package"))
    }

    async fn get_versions(&self, package: &str) -> crate::error::Result<Vec<String>> {
        self.versions
            .get(package)
            .cloned()
            .ok_or_else(|| Error::datasource(&self.name, package, "unknown package"))
    }

    async fn get_package_info(&self, package: &str) -> crate::error::Result<PackageInfo> {
        let versions = self.get_versions(package).await?;
        Ok(PackageInfo {
            name: package.to_string(),
            versions: versions
                .into_iter()
                .map(|version| VersionInfo {
                    version,
                    release_date: None,
                    deprecated: false,
                })
                .collect(),
        })
    }
}
