//! TTL-expiring cache decorator for any [`Datasource`].
//!
//! Grounded in `cargo-edit`'s `IndexCache`/`AnyIndexCache` (`src/index.rs`):
//! one cached fetch per package name, with cheaper queries derived from
//! the cached record, generalized from "one crates.io index" to "any
//! datasource" and made thread-safe with `DashMap` instead of a
//! `&mut self` `HashMap`.

use super::{Datasource, PackageInfo};
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

struct Entry {
    fetched_at: Instant,
    info: PackageInfo,
}

/// Wraps any [`Datasource`] with an in-memory, `DashMap`-backed cache
/// keyed by package name, with a fixed time-to-live.
pub struct CachingDatasource<D> {
    inner: D,
    ttl: Duration,
    cache: DashMap<String, Entry>,
}

impl<D: Datasource> CachingDatasource<D> {
    pub fn new(inner: D, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: DashMap::new(),
        }
    }

    async fn fetch_cached(&self, package: &str) -> crate::error::Result<PackageInfo> {
        if let Some(entry) = self.cache.get(package) {
            if entry.fetched_at.elapsed() < self.ttl {
                return Ok(entry.info.clone());
            }
        }

        let info = self.inner.get_package_info(package).await?;
        self.cache.insert(
            package.to_string(),
            Entry {
                fetched_at: Instant::now(),
                info: info.clone(),
            },
        );
        Ok(info)
    }

    /// Drops the cached entry for `package`, if any, forcing the next
    /// lookup to re-fetch.
    pub fn invalidate(&self, package: &str) {
        self.cache.remove(package);
    }
}

#[async_trait]
impl<D: Datasource> Datasource for CachingDatasource<D> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get_latest_version(&self, package: &str) -> crate::error::Result<String> {
        let info = self.fetch_cached(package).await?;
        info.versions
            .into_iter()
            .map(|v| v.version)
            .next()
            .ok_or_else(|| crate::error::Error::datasource(self.name(), package, "no versions available"))
    }

    async fn get_versions(&self, package: &str) -> crate::error::Result<Vec<String>> {
        let info = self.fetch_cached(package).await?;
        Ok(info.versions.into_iter().map(|v| v.version).collect())
    }

    async fn get_package_info(&self, package: &str) -> crate::error::Result<PackageInfo> {
        self.fetch_cached(package).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::StaticDatasource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingDatasource {
        inner: StaticDatasource,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Datasource for CountingDatasource {
        fn name(&self) -> &str {
            "counting"
        }

        async fn get_latest_version(&self, package: &str) -> crate::error::Result<String> {
            self.inner.get_latest_version(package).await
        }

        async fn get_versions(&self, package: &str) -> crate::error::Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get_versions(package).await
        }

        async fn get_package_info(&self, package: &str) -> crate::error::Result<PackageInfo> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get_package_info(package).await
        }
    }

    #[tokio::test]
    async fn repeated_lookups_hit_cache_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = CountingDatasource {
            inner: StaticDatasource::from_pairs([("pkg", vec!["1.0.0", "1.1.0"])]),
            calls: calls.clone(),
        };
        let cached = CachingDatasource::new(inner, Duration::from_secs(60));

        cached.get_versions("pkg").await.unwrap();
        cached.get_versions("pkg").await.unwrap();
        cached.get_latest_version("pkg").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = CountingDatasource {
            inner: StaticDatasource::from_pairs([("pkg", vec!["1.0.0"])]),
            calls: calls.clone(),
        };
        let cached = CachingDatasource::new(inner, Duration::from_secs(60));

        cached.get_versions("pkg").await.unwrap();
        cached.invalidate("pkg");
        cached.get_versions("pkg").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn expired_entries_are_refetched() {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = CountingDatasource {
            inner: StaticDatasource::from_pairs([("pkg", vec!["1.0.0"])]),
            calls: calls.clone(),
        };
        let cached = CachingDatasource::new(inner, Duration::from_millis(1));

        cached.get_versions("pkg").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        cached.get_versions("pkg").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
