//! Record store access layer.
//!
//! [`RecordStore`] is the single seam between record managers and the key-value backend. It
//! exposes only the hash-oriented operations the service needs; [`RedisStore`] implements it
//! for production and [`MemoryStore`] for tests and local runs without Redis.

mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::{RedisSettings, RedisStore};

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Field map of a stored hash; values are raw bytes.
pub type HashFields = HashMap<String, Vec<u8>>;

/// Errors surfaced by the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Redis rejected a command or the connection dropped.
    #[error("Redis request failed: {0}")]
    Redis(#[from] redis::RedisError),
    /// Connecting to Redis did not complete within the connect timeout.
    #[error("Timed out connecting to Redis at {0}")]
    ConnectTimeout(String),
    /// Connection settings could not be turned into a Redis URL.
    #[error("Invalid Redis settings: {0}")]
    InvalidSettings(String),
    /// Store is not reachable.
    #[error("Record store unavailable: {0}")]
    Unavailable(String),
}

/// Hash-oriented operations used by the record managers.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Whether `key` exists.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Read every field of the hash at `key`; missing keys yield an empty map.
    async fn read_hash(&self, key: &str) -> Result<HashFields, StoreError>;

    /// Write all `fields` to the hash at `key` in one command.
    async fn write_hash(&self, key: &str, fields: &[(&str, Vec<u8>)]) -> Result<(), StoreError>;

    /// Read a single field.
    async fn read_field(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Whether `field` is present on the hash at `key`.
    async fn field_exists(&self, key: &str, field: &str) -> Result<bool, StoreError>;

    /// Enumerate keys matching a glob `pattern`.
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    /// Read `field` from each of `keys` in one round trip, decoding text permissively.
    ///
    /// The result is positionally aligned with `keys`.
    async fn read_field_many(
        &self,
        keys: &[String],
        field: &str,
    ) -> Result<Vec<Option<String>>, StoreError>;

    /// Remove the whole hash at `key`; returns whether something was removed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;
}

/// Decode stored bytes, substituting replacement characters for invalid UTF-8.
pub fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
