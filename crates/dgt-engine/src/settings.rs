//! Short-TTL settings cache.
//!
//! Settings are admin-mutable and read on every operation. Re-querying
//! the store each time is correct but wasteful, so reads go through a
//! short-TTL cache with explicit invalidation on admin writes.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use dgt_core::{LedgerError, LedgerSettings, Result};
use dgt_store::Store;

/// How long cached settings stay fresh before re-reading the store.
pub const DEFAULT_SETTINGS_TTL: Duration = Duration::from_secs(5);

/// Cached view of the persisted [`LedgerSettings`].
pub struct SettingsCache {
    store: Arc<dyn Store>,
    ttl: Duration,
    cached: RwLock<Option<(Instant, LedgerSettings)>>,
}

impl SettingsCache {
    /// Create a cache over a store with the given TTL.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            cached: RwLock::new(None),
        }
    }

    /// Load the settings, re-reading the store once the TTL has lapsed.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` on storage errors.
    pub fn load(&self) -> Result<LedgerSettings> {
        {
            let cached = self.cached.read().map_err(|_| poisoned())?;
            if let Some((loaded_at, settings)) = cached.as_ref() {
                if loaded_at.elapsed() < self.ttl {
                    return Ok(settings.clone());
                }
            }
        }

        let settings = self.store.get_settings()?;
        let mut cached = self.cached.write().map_err(|_| poisoned())?;
        *cached = Some((Instant::now(), settings.clone()));
        Ok(settings)
    }

    /// Drop the cached value so the next load hits the store.
    pub fn invalidate(&self) {
        if let Ok(mut cached) = self.cached.write() {
            *cached = None;
        }
    }
}

fn poisoned() -> LedgerError {
    LedgerError::OperationFailed {
        transaction_id: None,
        message: "settings cache lock poisoned".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dgt_store::RocksStore;
    use tempfile::TempDir;

    fn cache_with_ttl(ttl: Duration) -> (SettingsCache, Arc<dyn Store>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store: Arc<dyn Store> = Arc::new(RocksStore::open(dir.path()).unwrap());
        (SettingsCache::new(Arc::clone(&store), ttl), store, dir)
    }

    #[test]
    fn long_ttl_serves_stale_until_invalidated() {
        let (cache, store, _dir) = cache_with_ttl(Duration::from_secs(3600));

        let first = cache.load().unwrap();
        assert!(first.tip.enabled);

        let mut settings = first;
        settings.tip.enabled = false;
        store.put_settings(&settings).unwrap();

        // Still inside the TTL: the stale value is served.
        assert!(cache.load().unwrap().tip.enabled);

        cache.invalidate();
        assert!(!cache.load().unwrap().tip.enabled);
    }

    #[test]
    fn zero_ttl_always_rereads() {
        let (cache, store, _dir) = cache_with_ttl(Duration::ZERO);

        let mut settings = cache.load().unwrap();
        settings.rain.enabled = false;
        store.put_settings(&settings).unwrap();

        assert!(!cache.load().unwrap().rain.enabled);
    }
}
