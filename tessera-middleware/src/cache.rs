//! Schema-versioned cache of composite records.
//!
//! [`Cache`] applies the freshness rule (unexpired **and** written under the
//! running schema version) on top of a dumb [`CacheStore`] backend. Backends
//! only persist and return whole entries; writes replace, never merge.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tessera_core::{
    Capability, Clock, CompositeRecord, EntityId, MissReason, SystemClock, TesseraError, TtlPolicy,
};

/// A persisted composite with its bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cached composite.
    pub record: CompositeRecord,
    /// Providers that contributed at least one field.
    pub providers: BTreeSet<String>,
    /// When the entry was written.
    pub cached_at: DateTime<Utc>,
    /// When the entry stops being fresh.
    pub expires_at: DateTime<Utc>,
    /// Normalizer schema version at write time. Files written before the
    /// field existed read as version 0 and are therefore always stale.
    #[serde(default)]
    pub schema_version: u32,
}

impl CacheEntry {
    /// Capability of the cached record.
    #[must_use]
    pub const fn capability(&self) -> Capability {
        self.record.capability()
    }

    /// Entity of the cached record.
    #[must_use]
    pub const fn entity(&self) -> &EntityId {
        self.record.entity()
    }
}

/// Result of [`Cache::get`].
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// Fresh entry under the current schema.
    Hit(CacheEntry),
    /// No usable entry.
    Miss(MissReason),
}

/// Storage backend for cache entries, keyed by (capability, entity).
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Load the entry for a key, regardless of freshness.
    ///
    /// Unreadable entries should be reported as `Ok(None)`.
    async fn load(
        &self,
        capability: Capability,
        entity: &EntityId,
    ) -> Result<Option<CacheEntry>, TesseraError>;

    /// Replace the entry for the entry's key. Atomic per key.
    async fn store(&self, entry: CacheEntry) -> Result<(), TesseraError>;

    /// Drop the entry for a key, if present.
    async fn remove(&self, capability: Capability, entity: &EntityId) -> Result<(), TesseraError>;
}

/// Freshness-aware front for a [`CacheStore`].
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    schema_version: u32,
}

impl core::fmt::Debug for Cache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cache")
            .field("clock", &self.clock)
            .field("schema_version", &self.schema_version)
            .finish_non_exhaustive()
    }
}

impl Cache {
    /// Cache over `store` using the system clock.
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>, schema_version: u32) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            schema_version,
        }
    }

    /// Replace the clock used for expiry decisions.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Schema version entries must carry to be served.
    #[must_use]
    pub const fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Look up a key.
    ///
    /// A schema mismatch is reported separately from expiry but treated the
    /// same way by callers: a fresh orchestration pass. Backend errors are
    /// logged and reported as `Absent`.
    pub async fn get(&self, capability: Capability, entity: &EntityId) -> CacheLookup {
        let entry = match self.store.load(capability, entity).await {
            Ok(Some(e)) => e,
            Ok(None) => return CacheLookup::Miss(MissReason::Absent),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    capability = %capability,
                    entity = %entity,
                    error = %_e,
                    "cache load failed; treating as miss"
                );
                return CacheLookup::Miss(MissReason::Absent);
            }
        };

        if entry.schema_version != self.schema_version {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                capability = %capability,
                entity = %entity,
                found = entry.schema_version,
                current = self.schema_version,
                "cache entry written under another schema"
            );
            return CacheLookup::Miss(MissReason::SchemaStale {
                found: entry.schema_version,
                current: self.schema_version,
            });
        }
        if self.clock.now() >= entry.expires_at {
            return CacheLookup::Miss(MissReason::Expired);
        }
        CacheLookup::Hit(entry)
    }

    /// Write `record` for its key with an expiry derived from `ttl`.
    ///
    /// Returns `Ok(false)` without writing when the policy disables caching.
    ///
    /// # Errors
    /// Returns `InvalidArg` when `record` does not belong to the given key, or
    /// `Cache` when the backend fails.
    pub async fn put(
        &self,
        capability: Capability,
        entity: &EntityId,
        record: CompositeRecord,
        providers: BTreeSet<String>,
        ttl: TtlPolicy,
    ) -> Result<bool, TesseraError> {
        if record.capability() != capability || record.entity() != entity {
            return Err(TesseraError::InvalidArg(format!(
                "record for {}/{} written under key {capability}/{entity}",
                record.capability(),
                record.entity()
            )));
        }
        let now = self.clock.now();
        let Some(expires_at) = ttl.expires_at(now) else {
            return Ok(false);
        };
        self.store
            .store(CacheEntry {
                record,
                providers,
                cached_at: now,
                expires_at,
                schema_version: self.schema_version,
            })
            .await?;
        Ok(true)
    }

    /// Drop the entry for a key.
    ///
    /// # Errors
    /// Returns `Cache` when the backend fails.
    pub async fn invalidate(
        &self,
        capability: Capability,
        entity: &EntityId,
    ) -> Result<(), TesseraError> {
        self.store.remove(capability, entity).await
    }
}

/// Bounded in-memory backend built on `moka`.
///
/// Entries are evicted by capacity only; expiry is decided by [`Cache`] so
/// that an expired entry is still reported as `Expired` rather than `Absent`.
pub struct MemoryCacheStore {
    inner: moka::future::Cache<(Capability, EntityId), CacheEntry>,
}

impl MemoryCacheStore {
    /// Store holding at most `max_entries` entries.
    #[must_use]
    pub fn new(max_entries: u64) -> Self {
        Self {
            inner: moka::future::Cache::builder()
                .max_capacity(max_entries.max(1))
                .build(),
        }
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn load(
        &self,
        capability: Capability,
        entity: &EntityId,
    ) -> Result<Option<CacheEntry>, TesseraError> {
        Ok(self.inner.get(&(capability, entity.clone())).await)
    }

    async fn store(&self, entry: CacheEntry) -> Result<(), TesseraError> {
        let key = (entry.capability(), entry.entity().clone());
        self.inner.insert(key, entry).await;
        Ok(())
    }

    async fn remove(&self, capability: Capability, entity: &EntityId) -> Result<(), TesseraError> {
        self.inner.invalidate(&(capability, entity.clone())).await;
        Ok(())
    }
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// File-backed backend: one JSON document per key under
/// `<root>/<capability>/<ENTITY>.json`.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place, so a concurrent reader sees either the old or the new entry.
/// Entries survive process restarts.
#[derive(Debug, Clone)]
pub struct JsonFileCacheStore {
    root: PathBuf,
}

impl JsonFileCacheStore {
    /// Store rooted at `root`. Directories are created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document for a key.
    #[must_use]
    pub fn path_for(&self, capability: Capability, entity: &EntityId) -> PathBuf {
        self.root
            .join(capability.as_str())
            .join(format!("{}.json", entity.as_str()))
    }
}

#[async_trait]
impl CacheStore for JsonFileCacheStore {
    async fn load(
        &self,
        capability: Capability,
        entity: &EntityId,
    ) -> Result<Option<CacheEntry>, TesseraError> {
        let path = self.path_for(capability, entity);
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) if entry.capability() == capability && entry.entity() == entity => {
                Ok(Some(entry))
            }
            Ok(_) => Ok(None),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    path = %path.display(),
                    error = %_e,
                    "unreadable cache file; treating as miss"
                );
                Ok(None)
            }
        }
    }

    async fn store(&self, entry: CacheEntry) -> Result<(), TesseraError> {
        let path = self.path_for(entry.capability(), entry.entity());
        let dir = path
            .parent()
            .ok_or_else(|| TesseraError::Cache(format!("no parent for {}", path.display())))?;
        tokio::fs::create_dir_all(dir).await?;

        let json = serde_json::to_vec_pretty(&entry)
            .map_err(|e| TesseraError::Cache(format!("serialize cache entry: {e}")))?;
        let tmp = dir.join(format!(
            ".{}.{}.{}.tmp",
            entry.entity().as_str(),
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        tokio::fs::write(&tmp, &json).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            if let Err(_cleanup) = tokio::fs::remove_file(&tmp).await {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    path = %tmp.display(),
                    error = %_cleanup,
                    "failed to remove temporary cache file"
                );
            }
            return Err(e.into());
        }
        Ok(())
    }

    async fn remove(&self, capability: Capability, entity: &EntityId) -> Result<(), TesseraError> {
        match tokio::fs::remove_file(self.path_for(capability, entity)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
