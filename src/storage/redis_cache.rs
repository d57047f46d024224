//! Redis-backed cache index and pending-deletion queue
//!
//! Wire layout:
//!
//! - forward mapping: `SET <forward_prefix>:<cache key> <object path>`
//! - reverse mapping: `SET <reverse_prefix>:<percent-encoded path> <cache key>`
//! - pending deletions: sorted set `<pending_key>`, member = percent-encoded
//!   path, score = expiry in unix seconds
//!
//! No TTL is ever set on these keys; the sorted set is the only expiry
//! mechanism.

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::info;

use super::{CacheIndex, PendingDeletionQueue};
use crate::config::CacheConfig;
use crate::errors::{StoreError, StoreResult};
use crate::utils::{CacheKey, encode_path, redact_url};

const CACHE_INDEX: &str = "redis cache index";
const PENDING_QUEUE: &str = "redis pending-deletion queue";

/// `DEL` the key only while it still holds `ARGV[1]`
const DELETE_IF_EQUAL: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
";

/// `ZREM` the member only while its score is at or below `ARGV[2]`
const REMOVE_IF_DUE: &str = r"
local score = redis.call('ZSCORE', KEYS[1], ARGV[1])
if score and tonumber(score) <= tonumber(ARGV[2]) then
    return redis.call('ZREM', KEYS[1], ARGV[1])
end
return 0
";

/// Key names derived from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisKeys {
    pub forward_prefix: String,
    pub reverse_prefix: String,
    pub pending_key: String,
}

impl RedisKeys {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            forward_prefix: config.forward_prefix.clone(),
            reverse_prefix: config.reverse_prefix.clone(),
            pending_key: config.pending_delete_key.clone(),
        }
    }

    pub fn forward(&self, key: &CacheKey) -> String {
        format!("{}:{}", self.forward_prefix, key)
    }

    pub fn reverse(&self, path: &str) -> String {
        format!("{}:{}", self.reverse_prefix, encode_path(path))
    }
}

/// Cache index and pending-deletion queue sharing one multiplexed connection
#[derive(Clone)]
pub struct RedisCacheStore {
    manager: ConnectionManager,
    keys: RedisKeys,
}

impl RedisCacheStore {
    /// Connect and verify the server is reachable
    pub async fn connect(url: &str, keys: RedisKeys) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        info!("Connected to Redis cache index at {}", redact_url(url));
        Ok(Self { manager, keys })
    }

    fn connection(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

#[async_trait::async_trait]
impl CacheIndex for RedisCacheStore {
    async fn get_forward(&self, key: &CacheKey) -> StoreResult<String> {
        let redis_key = self.keys.forward(key);
        let value: Option<String> = self
            .connection()
            .get(&redis_key)
            .await
            .map_err(|e| StoreError::unavailable(CACHE_INDEX, e))?;
        value.ok_or_else(|| StoreError::not_found(CACHE_INDEX, redis_key))
    }

    async fn set_forward(&self, key: &CacheKey, path: &str) -> StoreResult<()> {
        self.connection()
            .set::<_, _, ()>(self.keys.forward(key), path)
            .await
            .map_err(|e| StoreError::unavailable(CACHE_INDEX, e))
    }

    async fn delete_forward(&self, key: &CacheKey) -> StoreResult<()> {
        self.connection()
            .del::<_, ()>(self.keys.forward(key))
            .await
            .map_err(|e| StoreError::unavailable(CACHE_INDEX, e))
    }

    async fn delete_forward_if(&self, key: &CacheKey, path: &str) -> StoreResult<bool> {
        let removed: i64 = redis::Script::new(DELETE_IF_EQUAL)
            .key(self.keys.forward(key))
            .arg(path)
            .invoke_async(&mut self.connection())
            .await
            .map_err(|e| StoreError::unavailable(CACHE_INDEX, e))?;
        Ok(removed > 0)
    }

    async fn get_reverse(&self, path: &str) -> StoreResult<CacheKey> {
        let redis_key = self.keys.reverse(path);
        let value: Option<String> = self
            .connection()
            .get(&redis_key)
            .await
            .map_err(|e| StoreError::unavailable(CACHE_INDEX, e))?;
        value
            .map(CacheKey::from)
            .ok_or_else(|| StoreError::not_found(CACHE_INDEX, redis_key))
    }

    async fn set_reverse(&self, path: &str, key: &CacheKey) -> StoreResult<()> {
        self.connection()
            .set::<_, _, ()>(self.keys.reverse(path), key.as_str())
            .await
            .map_err(|e| StoreError::unavailable(CACHE_INDEX, e))
    }

    async fn delete_reverse(&self, path: &str) -> StoreResult<()> {
        self.connection()
            .del::<_, ()>(self.keys.reverse(path))
            .await
            .map_err(|e| StoreError::unavailable(CACHE_INDEX, e))
    }
}

#[async_trait::async_trait]
impl PendingDeletionQueue for RedisCacheStore {
    async fn schedule(&self, member: &str, expire_at: i64) -> StoreResult<()> {
        self.connection()
            .zadd::<_, _, _, ()>(&self.keys.pending_key, member, expire_at)
            .await
            .map_err(|e| StoreError::unavailable(PENDING_QUEUE, e))
    }

    async fn due(&self, now: i64) -> StoreResult<Vec<String>> {
        self.connection()
            .zrangebyscore(&self.keys.pending_key, "-inf", now)
            .await
            .map_err(|e| StoreError::unavailable(PENDING_QUEUE, e))
    }

    async fn remove(&self, member: &str) -> StoreResult<()> {
        self.connection()
            .zrem::<_, _, ()>(&self.keys.pending_key, member)
            .await
            .map_err(|e| StoreError::unavailable(PENDING_QUEUE, e))
    }

    async fn remove_if_due(&self, member: &str, now: i64) -> StoreResult<bool> {
        let removed: i64 = redis::Script::new(REMOVE_IF_DUE)
            .key(&self.keys.pending_key)
            .arg(member)
            .arg(now)
            .invoke_async(&mut self.connection())
            .await
            .map_err(|e| StoreError::unavailable(PENDING_QUEUE, e))?;
        Ok(removed > 0)
    }
}
