//! Two-tier cache store.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CacheError;
use crate::storage::{InMemorySessionStore, KeyValueStore};

/// Prefix applied to session-tier keys when none is given.
pub const DEFAULT_PREFIX: &str = "farm_lookups";

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    backing_store_key: String,
}

/// Snapshot of how often a key has been cleared.
///
/// Taken before a read-through fetch and handed back to
/// [`CacheStore::set_if_current`], which refuses to store the fetched value
/// if the key was cleared in the meantime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation {
    epoch: u64,
    clears: u64,
}

#[derive(Default)]
struct MemoryTier {
    entries: HashMap<String, CacheEntry>,
    clears: HashMap<String, u64>,
    epoch: u64,
}

impl MemoryTier {
    fn generation(&self, key: &str) -> Generation {
        Generation {
            epoch: self.epoch,
            clears: self.clears.get(key).copied().unwrap_or(0),
        }
    }
}

/// A read-through cache with a memory tier and a session tier.
///
/// The memory tier holds decoded values and is consulted first. The session
/// tier holds the same values as JSON text under `<prefix>:<key>` and is used
/// to rehydrate the memory tier after a reload. Both tiers are always
/// written and cleared together.
///
/// Shared between tasks through an `Arc`; all locking is internal. Every
/// write and clear of both tiers happens under the memory-tier write lock.
pub struct CacheStore {
    prefix: String,
    memory: RwLock<MemoryTier>,
    session: Arc<dyn KeyValueStore>,
}

impl CacheStore {
    /// Creates a cache over `session` using the default key prefix.
    pub fn new(session: Arc<dyn KeyValueStore>) -> Self {
        Self::with_prefix(DEFAULT_PREFIX, session)
    }

    /// Creates a cache whose session keys start with `prefix`.
    pub fn with_prefix(prefix: impl Into<String>, session: Arc<dyn KeyValueStore>) -> Self {
        Self {
            prefix: prefix.into(),
            memory: RwLock::new(MemoryTier::default()),
            session,
        }
    }

    /// Creates a cache backed by a private in-memory session store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemorySessionStore::new()))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the session-tier key used for `key`.
    pub fn backing_store_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryTier> {
        self.memory.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryTier> {
        self.memory.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Looks up a value, falling back to the session tier on a memory miss.
    ///
    /// A session hit is decoded and promoted to the memory tier. Session
    /// text that no longer decodes as `V` is evicted and reported as a miss.
    pub fn get<V>(&self, key: &str) -> Option<Arc<V>>
    where
        V: DeserializeOwned + Send + Sync + 'static,
    {
        if let Some(value) = self.read().entries.get(key).and_then(downcast::<V>) {
            metrics::counter!("lookup_cache_hits_total", "tier" => "memory").increment(1);
            return Some(value);
        }

        let mut memory = self.write();
        if let Some(value) = memory.entries.get(key).and_then(downcast::<V>) {
            metrics::counter!("lookup_cache_hits_total", "tier" => "memory").increment(1);
            return Some(value);
        }

        let backing_store_key = self.backing_store_key(key);
        let Some(text) = self.session.get(&backing_store_key) else {
            metrics::counter!("lookup_cache_misses_total").increment(1);
            return None;
        };

        match serde_json::from_str::<V>(&text) {
            Ok(value) => {
                let value = Arc::new(value);
                memory.entries.insert(
                    key.to_string(),
                    CacheEntry {
                        value: value.clone(),
                        backing_store_key,
                    },
                );
                metrics::counter!("lookup_cache_hits_total", "tier" => "session").increment(1);
                tracing::debug!(key, "Promoted session cache entry");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Evicting undecodable session cache entry");
                self.session.remove(&backing_store_key);
                memory.entries.remove(key);
                metrics::counter!("lookup_cache_misses_total").increment(1);
                None
            }
        }
    }

    /// Stores a value in both tiers and returns the shared handle.
    ///
    /// Nothing is written if the value cannot be encoded.
    pub fn set<V>(&self, key: &str, value: V) -> Result<Arc<V>, CacheError>
    where
        V: Serialize + Send + Sync + 'static,
    {
        let text = serde_json::to_string(&value)?;
        let value = Arc::new(value);
        let mut memory = self.write();
        self.store(&mut memory, key, text, value.clone());
        Ok(value)
    }

    /// Returns the current generation of `key`.
    pub fn generation(&self, key: &str) -> Generation {
        self.read().generation(key)
    }

    /// Stores a value fetched since `generation` was taken.
    ///
    /// If `key` has been cleared since then, the value is returned to the
    /// caller but not stored, so a fetch that started before a clear can
    /// never repopulate the cache with what the clear evicted.
    pub fn set_if_current<V>(
        &self,
        key: &str,
        generation: Generation,
        value: V,
    ) -> Result<Arc<V>, CacheError>
    where
        V: Serialize + Send + Sync + 'static,
    {
        let text = serde_json::to_string(&value)?;
        let value = Arc::new(value);
        let mut memory = self.write();
        if memory.generation(key) != generation {
            tracing::debug!(key, "Discarding value fetched before a clear");
            return Ok(value);
        }
        self.store(&mut memory, key, text, value.clone());
        Ok(value)
    }

    fn store<V>(&self, memory: &mut MemoryTier, key: &str, text: String, value: Arc<V>)
    where
        V: Send + Sync + 'static,
    {
        let backing_store_key = self.backing_store_key(key);
        self.session.set(&backing_store_key, text);
        memory.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                backing_store_key,
            },
        );
    }

    /// Returns true if either tier holds `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.read().entries.contains_key(key) || self.session.get(&self.backing_store_key(key)).is_some()
    }

    /// Evicts `key` from both tiers.
    pub fn clear(&self, key: &str) {
        let mut memory = self.write();
        *memory.clears.entry(key.to_string()).or_default() += 1;
        let backing_store_key = memory
            .entries
            .remove(key)
            .map(|entry| entry.backing_store_key)
            .unwrap_or_else(|| self.backing_store_key(key));
        self.session.remove(&backing_store_key);
        tracing::debug!(key, "Cleared cache entry");
    }

    /// Evicts every entry from both tiers.
    ///
    /// Session keys outside this cache's prefix are left alone.
    pub fn clear_all(&self) {
        let mut memory = self.write();
        memory.entries.clear();
        memory.epoch += 1;

        let prefix = format!("{}:", self.prefix);
        for key in self.session.keys() {
            if key.starts_with(&prefix) {
                self.session.remove(&key);
            }
        }
        tracing::debug!(prefix = %self.prefix, "Cleared all cache entries");
    }
}

fn downcast<V: Send + Sync + 'static>(entry: &CacheEntry) -> Option<Arc<V>> {
    entry.value.clone().downcast::<V>().ok()
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.read().entries.keys().cloned().collect();
        f.debug_struct("CacheStore")
            .field("prefix", &self.prefix)
            .field("memory_keys", &keys)
            .finish_non_exhaustive()
    }
}
