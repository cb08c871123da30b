//! Redis-backed record store.

use super::{HashFields, RecordStore, StoreError, decode_lossy};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use reqwest::Url;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const SCAN_BATCH: usize = 500;

/// Connection settings for the shared Redis instance.
#[derive(Debug, Clone)]
pub struct RedisSettings {
    /// Hostname or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Logical database index.
    pub db: i64,
    /// Optional password.
    pub password: Option<String>,
}

impl RedisSettings {
    /// `host:port/db`, safe to log.
    pub fn address(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.db)
    }

    fn connection_url(&self) -> Result<Url, StoreError> {
        let mut url = Url::parse(&format!("redis://{}", self.address()))
            .map_err(|error| StoreError::InvalidSettings(error.to_string()))?;
        if let Some(password) = self.password.as_deref()
            && !password.is_empty()
        {
            url.set_password(Some(password)).map_err(|()| {
                StoreError::InvalidSettings("password cannot be applied to this host".into())
            })?;
        }
        Ok(url)
    }
}

/// Record store talking to Redis through two multiplexed connection managers.
///
/// The text handle serves key enumeration and pipelined text reads; the binary handle serves
/// hash reads, writes and attachments. Both are opened and pinged once at startup. Each
/// operation checks out a handle by cloning its manager and releases it on drop.
pub struct RedisStore {
    text: ConnectionManager,
    binary: ConnectionManager,
}

impl RedisStore {
    /// Open both handles, failing if Redis is unreachable or rejects the credentials.
    pub async fn connect(settings: &RedisSettings) -> Result<Self, StoreError> {
        let url = settings.connection_url()?;
        let client = Client::open(url.as_str())?;
        let address = settings.address();
        let text = open_handle(&client, "text", &address).await?;
        let binary = open_handle(&client, "binary", &address).await?;
        Ok(Self { text, binary })
    }

    fn text(&self) -> ConnectionManager {
        self.text.clone()
    }

    fn binary(&self) -> ConnectionManager {
        self.binary.clone()
    }
}

async fn open_handle(
    client: &Client,
    role: &'static str,
    address: &str,
) -> Result<ConnectionManager, StoreError> {
    tracing::info!(role, address, "Opening Redis connection");
    let mut manager = tokio::time::timeout(CONNECT_TIMEOUT, ConnectionManager::new(client.clone()))
        .await
        .map_err(|_| StoreError::ConnectTimeout(address.to_string()))??;
    let pong: String = redis::cmd("PING").query_async(&mut manager).await?;
    tracing::info!(role, address, reply = %pong, "Connected to Redis");
    Ok(manager)
}

#[async_trait]
impl RecordStore for RedisStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.binary();
        let found: bool = conn.exists(key).await?;
        Ok(found)
    }

    async fn read_hash(&self, key: &str) -> Result<HashFields, StoreError> {
        let mut conn = self.binary();
        let fields: HashFields = conn.hgetall(key).await?;
        Ok(fields)
    }

    async fn write_hash(&self, key: &str, fields: &[(&str, Vec<u8>)]) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut conn = self.binary();
        let _: () = conn.hset_multiple(key, fields).await?;
        tracing::debug!(key, fields = fields.len(), "Hash written");
        Ok(())
    }

    async fn read_field(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.binary();
        let value: Option<Vec<u8>> = conn.hget(key, field).await?;
        Ok(value)
    }

    async fn field_exists(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        let mut conn = self.binary();
        let present: bool = conn.hexists(key, field).await?;
        Ok(present)
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.text();
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        // SCAN may return a key more than once across iterations.
        keys.sort();
        keys.dedup();
        tracing::debug!(pattern, count = keys.len(), "Scanned keys");
        Ok(keys)
    }

    async fn read_field_many(
        &self,
        keys: &[String],
        field: &str,
    ) -> Result<Vec<Option<String>>, StoreError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.text();
        let mut pipe = redis::pipe();
        for key in keys {
            pipe.hget(key, field);
        }
        let values: Vec<Option<Vec<u8>>> = pipe.query_async(&mut conn).await?;
        Ok(values
            .into_iter()
            .map(|value| value.map(|bytes| decode_lossy(&bytes)))
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.binary();
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(password: Option<&str>) -> RedisSettings {
        RedisSettings {
            host: "127.0.0.1".into(),
            port: 6380,
            db: 2,
            password: password.map(str::to_string),
        }
    }

    #[test]
    fn connection_url_without_password() {
        let url = settings(None).connection_url().expect("url");
        assert_eq!(url.as_str(), "redis://127.0.0.1:6380/2");
    }

    #[test]
    fn connection_url_encodes_password() {
        let url = settings(Some("p@ss word")).connection_url().expect("url");
        assert_eq!(url.password(), Some("p%40ss%20word"));
        assert_eq!(url.host_str(), Some("127.0.0.1"));
    }

    #[test]
    fn empty_password_is_ignored() {
        let url = settings(Some("")).connection_url().expect("url");
        assert_eq!(url.password(), None);
    }
}
