//! Storage seams used by the resolver and the cleanup sweep
//!
//! Four independent stores, each behind a trait so tests and local
//! development can swap in the in-memory versions:
//!
//! - [`MetadataStore`]: relational rows describing canonical artifacts
//!   (implemented by `database::repositories::ResourceSeaOrmRepository`)
//! - [`ObjectStore`]: blob storage addressed by `/`-separated paths
//! - [`CacheIndex`]: cache key <-> object path mappings, no expiry
//! - [`PendingDeletionQueue`]: object paths scored by expiry time
//!
//! Every adapter reports a missing entry as [`StoreError::NotFound`].
//!
//! [`StoreError::NotFound`]: crate::errors::StoreError::NotFound

use bytes::Bytes;

use crate::errors::StoreResult;
use crate::models::{LogoFormat, ResourceMetadata, Sizing};
use crate::utils::CacheKey;

pub mod http;
pub mod local;
pub mod memory;
pub mod redis_cache;

pub use http::HttpObjectStore;
pub use local::LocalObjectStore;
pub use memory::{MemoryCacheStore, MemoryObjectStore};
pub use redis_cache::RedisCacheStore;

/// Read-only queries against the metadata store
#[async_trait::async_trait]
pub trait MetadataStore: Send + Sync {
    /// Live resource for `name` (short name or title) stored in `format`
    async fn find_by_name_and_format(&self, name: &str, format: LogoFormat) -> StoreResult<ResourceMetadata>;

    /// Exact bitmap match for `name` at `sizing` on `background`, falling
    /// back to the institution's designated edge (vector) source
    async fn find_by_name_and_sizing(
        &self,
        name: &str,
        format: LogoFormat,
        sizing: Sizing,
        background: &str,
    ) -> StoreResult<ResourceMetadata>;
}

/// Blob storage holding canonical and generated artifacts
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, path: &str) -> StoreResult<Bytes>;

    /// Store the complete object; a partially written object is never visible
    async fn put(&self, path: &str, data: Bytes) -> StoreResult<()>;

    /// Deleting a missing object succeeds
    async fn delete(&self, path: &str) -> StoreResult<()>;
}

/// Two-way index between cache keys and generated object paths
///
/// Operations are independent; callers own the ordering discipline.
#[async_trait::async_trait]
pub trait CacheIndex: Send + Sync {
    async fn get_forward(&self, key: &CacheKey) -> StoreResult<String>;
    async fn set_forward(&self, key: &CacheKey, path: &str) -> StoreResult<()>;
    async fn delete_forward(&self, key: &CacheKey) -> StoreResult<()>;

    /// Delete the forward mapping only while it still points at `path`;
    /// returns whether anything was removed
    async fn delete_forward_if(&self, key: &CacheKey, path: &str) -> StoreResult<bool>;

    async fn get_reverse(&self, path: &str) -> StoreResult<CacheKey>;
    async fn set_reverse(&self, path: &str, key: &CacheKey) -> StoreResult<()>;
    async fn delete_reverse(&self, path: &str) -> StoreResult<()>;
}

/// Time-ordered set of encoded object paths awaiting deletion
#[async_trait::async_trait]
pub trait PendingDeletionQueue: Send + Sync {
    /// Add or reschedule `member` to expire at `expire_at` (unix seconds)
    async fn schedule(&self, member: &str, expire_at: i64) -> StoreResult<()>;

    /// Members with an expiry at or before `now` (unix seconds)
    async fn due(&self, now: i64) -> StoreResult<Vec<String>>;

    async fn remove(&self, member: &str) -> StoreResult<()>;

    /// Remove `member` only if its expiry is still at or before `now`.
    /// A member rescheduled past `now` is kept and `false` is returned.
    async fn remove_if_due(&self, member: &str, now: i64) -> StoreResult<bool>;
}

/// Content type for an object path, by extension
pub fn content_type_for(path: &str) -> &'static str {
    let extension = path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
