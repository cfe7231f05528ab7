// Redis-backed key-value store
// Author: kelexine (https://github.com/kelexine)

use super::KeyValueStore;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::utils::logging::redact_url;
use crate::utils::retry::with_retry;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::RedisResult;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

/// [`KeyValueStore`] over a multiplexed, auto-reconnecting Redis connection.
///
/// Cloning is cheap; clones share the underlying connection. Every command is
/// bounded by the configured timeout, and a timeout is reported as
/// [`StoreError::Timeout`] so callers treat it like an unreachable store.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    timeout: Duration,
}

impl RedisStore {
    /// Open the connection described by `config`, retrying with backoff.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let timeout_ms = config.timeout_ms;
        let timeout = Duration::from_millis(timeout_ms);
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| StoreError::Command(format!("Invalid store URL: {}", e)))?;

        info!("Connecting to store at {}", redact_url(&config.url));

        let connection = with_retry("Store connection", config.connect_retries, || {
            let client = client.clone();
            async move {
                match tokio::time::timeout(timeout, ConnectionManager::new(client)).await {
                    Ok(result) => result.map_err(StoreError::from),
                    Err(_) => Err(StoreError::Timeout(timeout_ms)),
                }
            }
        })
        .await?;

        info!("Connected to store");
        Ok(Self { connection, timeout })
    }

    async fn run<T, F>(&self, fut: F) -> StoreResult<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout(self.timeout.as_millis() as u64)),
        }
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut conn = self.connection.clone();
        self.run(async move {
            let value: Option<Vec<u8>> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
            Ok(value)
        })
        .await
    }

    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl_seconds: u64) -> StoreResult<()> {
        let mut conn = self.connection.clone();
        // SET with EX 0 is rejected by Redis
        let ttl_seconds = ttl_seconds.max(1);
        self.run(async move {
            let _: () = redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("EX")
                .arg(ttl_seconds)
                .query_async(&mut conn)
                .await?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.connection.clone();
        self.run(async move {
            let _: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.connection.clone();
        self.run(async move {
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }

    async fn increment(&self, key: &str, ttl_seconds: u64) -> StoreResult<i64> {
        let mut conn = self.connection.clone();
        let ttl_seconds = ttl_seconds.max(1);
        let (count,): (i64,) = self
            .run(async move {
                redis::pipe()
                    .atomic()
                    .cmd("INCR")
                    .arg(key)
                    .cmd("EXPIRE")
                    .arg(key)
                    .arg(ttl_seconds)
                    .ignore()
                    .query_async(&mut conn)
                    .await
            })
            .await?;
        debug!("Counter {} now {}", key, count);
        Ok(count)
    }

    async fn info(&self) -> StoreResult<BTreeMap<String, String>> {
        let mut conn = self.connection.clone();
        let raw: String = self
            .run(async move { redis::cmd("INFO").arg("memory").query_async(&mut conn).await })
            .await?;
        Ok(parse_info(&raw))
    }
}

/// Parse the `key:value` lines of an `INFO` reply.
fn parse_info(raw: &str) -> BTreeMap<String, String> {
    let mut info: BTreeMap<String, String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    info.insert("backend".to_string(), "redis".to_string());
    info
}
