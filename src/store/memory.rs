//! In-process record store.

use super::{HashFields, RecordStore, StoreError, decode_lossy};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Map-backed [`RecordStore`] with the same semantics as Redis hashes.
///
/// Supports `prefix*` and exact-match patterns. [`MemoryStore::set_offline`] makes every call
/// fail with [`StoreError::Unavailable`], and [`MemoryStore::write_count`] reports how many
/// mutations were applied.
#[derive(Default)]
pub struct MemoryStore {
    hashes: RwLock<BTreeMap<String, HashFields>>,
    offline: AtomicBool,
    writes: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle simulated unavailability.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of write and delete operations that changed state.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Insert a hash directly, bypassing the write counter.
    pub async fn seed(&self, key: &str, fields: &[(&str, &[u8])]) {
        let mut guard = self.hashes.write().await;
        let entry = guard.entry(key.to_string()).or_default();
        for (field, value) in fields {
            entry.insert((*field).to_string(), value.to_vec());
        }
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store offline".into()))
        } else {
            Ok(())
        }
    }
}

fn matches_pattern(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.ensure_online()?;
        Ok(self.hashes.read().await.contains_key(key))
    }

    async fn read_hash(&self, key: &str) -> Result<HashFields, StoreError> {
        self.ensure_online()?;
        Ok(self
            .hashes
            .read()
            .await
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    async fn write_hash(&self, key: &str, fields: &[(&str, Vec<u8>)]) -> Result<(), StoreError> {
        self.ensure_online()?;
        if fields.is_empty() {
            return Ok(());
        }
        let mut guard = self.hashes.write().await;
        let entry = guard.entry(key.to_string()).or_default();
        for (field, value) in fields {
            entry.insert((*field).to_string(), value.clone());
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn read_field(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.ensure_online()?;
        Ok(self
            .hashes
            .read()
            .await
            .get(key)
            .and_then(|fields| fields.get(field).cloned()))
    }

    async fn field_exists(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        self.ensure_online()?;
        Ok(self
            .hashes
            .read()
            .await
            .get(key)
            .is_some_and(|fields| fields.contains_key(field)))
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        self.ensure_online()?;
        Ok(self
            .hashes
            .read()
            .await
            .keys()
            .filter(|key| matches_pattern(pattern, key))
            .cloned()
            .collect())
    }

    async fn read_field_many(
        &self,
        keys: &[String],
        field: &str,
    ) -> Result<Vec<Option<String>>, StoreError> {
        self.ensure_online()?;
        let guard = self.hashes.read().await;
        Ok(keys
            .iter()
            .map(|key| {
                guard
                    .get(key)
                    .and_then(|fields| fields.get(field))
                    .map(|bytes| decode_lossy(bytes))
            })
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.ensure_online()?;
        let removed = self.hashes.write().await.remove(key).is_some();
        if removed {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(removed)
    }
}
