//! In-process stores for local development and tests

use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{CacheIndex, ObjectStore, PendingDeletionQueue};
use crate::errors::{StoreError, StoreResult};
use crate::utils::CacheKey;

const OBJECT_STORE: &str = "memory object store";
const CACHE_INDEX: &str = "memory cache index";

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, path: &str) -> bool {
        self.objects.read().await.contains_key(path)
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, path: &str) -> StoreResult<Bytes> {
        self.objects
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::not_found(OBJECT_STORE, path))
    }

    async fn put(&self, path: &str, data: Bytes) -> StoreResult<()> {
        self.objects.write().await.insert(path.to_string(), data);
        Ok(())
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        self.objects.write().await.remove(path);
        Ok(())
    }
}

/// Cache index and pending-deletion queue held in process memory
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    forward: RwLock<HashMap<String, String>>,
    reverse: RwLock<HashMap<String, String>>,
    pending: RwLock<HashMap<String, i64>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn forward_len(&self) -> usize {
        self.forward.read().await.len()
    }

    pub async fn reverse_len(&self) -> usize {
        self.reverse.read().await.len()
    }

    /// Snapshot of queued members and their expiry, sorted by member
    pub async fn pending_entries(&self) -> Vec<(String, i64)> {
        let mut entries: Vec<(String, i64)> = self
            .pending
            .read()
            .await
            .iter()
            .map(|(member, score)| (member.clone(), *score))
            .collect();
        entries.sort();
        entries
    }
}

#[async_trait::async_trait]
impl CacheIndex for MemoryCacheStore {
    async fn get_forward(&self, key: &CacheKey) -> StoreResult<String> {
        self.forward
            .read()
            .await
            .get(key.as_str())
            .cloned()
            .ok_or_else(|| StoreError::not_found(CACHE_INDEX, key.as_str()))
    }

    async fn set_forward(&self, key: &CacheKey, path: &str) -> StoreResult<()> {
        self.forward
            .write()
            .await
            .insert(key.as_str().to_string(), path.to_string());
        Ok(())
    }

    async fn delete_forward(&self, key: &CacheKey) -> StoreResult<()> {
        self.forward.write().await.remove(key.as_str());
        Ok(())
    }

    async fn delete_forward_if(&self, key: &CacheKey, path: &str) -> StoreResult<bool> {
        let mut forward = self.forward.write().await;
        if forward.get(key.as_str()).is_some_and(|current| current == path) {
            forward.remove(key.as_str());
            return Ok(true);
        }
        Ok(false)
    }

    async fn get_reverse(&self, path: &str) -> StoreResult<CacheKey> {
        self.reverse
            .read()
            .await
            .get(path)
            .cloned()
            .map(CacheKey::from)
            .ok_or_else(|| StoreError::not_found(CACHE_INDEX, path))
    }

    async fn set_reverse(&self, path: &str, key: &CacheKey) -> StoreResult<()> {
        self.reverse
            .write()
            .await
            .insert(path.to_string(), key.as_str().to_string());
        Ok(())
    }

    async fn delete_reverse(&self, path: &str) -> StoreResult<()> {
        self.reverse.write().await.remove(path);
        Ok(())
    }
}

#[async_trait::async_trait]
impl PendingDeletionQueue for MemoryCacheStore {
    async fn schedule(&self, member: &str, expire_at: i64) -> StoreResult<()> {
        self.pending.write().await.insert(member.to_string(), expire_at);
        Ok(())
    }

    async fn due(&self, now: i64) -> StoreResult<Vec<String>> {
        let mut due: Vec<(i64, String)> = self
            .pending
            .read()
            .await
            .iter()
            .filter(|(_, score)| **score <= now)
            .map(|(member, score)| (*score, member.clone()))
            .collect();
        due.sort();
        Ok(due.into_iter().map(|(_, member)| member).collect())
    }

    async fn remove(&self, member: &str) -> StoreResult<()> {
        self.pending.write().await.remove(member);
        Ok(())
    }

    async fn remove_if_due(&self, member: &str, now: i64) -> StoreResult<bool> {
        let mut pending = self.pending.write().await;
        match pending.get(member) {
            Some(score) if *score <= now => {
                pending.remove(member);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_object_store_missing_is_not_found() {
        let store = MemoryObjectStore::new();
        let err = store.get("beacon/sdut/sdut.svg").await.unwrap_err();
        assert!(err.is_not_found());

        store.put("beacon/sdut/sdut.svg", Bytes::from_static(b"<svg/>")).await.unwrap();
        assert_eq!(store.get("beacon/sdut/sdut.svg").await.unwrap(), Bytes::from_static(b"<svg/>"));

        store.delete("beacon/sdut/sdut.svg").await.unwrap();
        // deleting twice is fine
        store.delete("beacon/sdut/sdut.svg").await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_queue_due_is_inclusive() {
        let store = MemoryCacheStore::new();
        store.schedule("a", 100).await.unwrap();
        store.schedule("b", 200).await.unwrap();
        store.schedule("c", 300).await.unwrap();

        assert_eq!(store.due(200).await.unwrap(), vec!["a".to_string(), "b".to_string()]);
        assert!(store.due(99).await.unwrap().is_empty());

        // rescheduling replaces the score
        store.schedule("a", 400).await.unwrap();
        assert_eq!(store.due(200).await.unwrap(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_index_round_trip() {
        let store = MemoryCacheStore::new();
        let key = CacheKey::from("abc".to_string());
        store.set_forward(&key, "beacon/downloads/sdut/x.png").await.unwrap();
        store.set_reverse("beacon/downloads/sdut/x.png", &key).await.unwrap();

        assert_eq!(store.get_forward(&key).await.unwrap(), "beacon/downloads/sdut/x.png");
        assert_eq!(store.get_reverse("beacon/downloads/sdut/x.png").await.unwrap(), key);

        store.delete_forward(&key).await.unwrap();
        assert!(store.get_forward(&key).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_conditional_removal_respects_newer_writes() {
        let store = MemoryCacheStore::new();
        let key = CacheKey::from("abc".to_string());
        store.set_forward(&key, "beacon/downloads/sdut/new.png").await.unwrap();

        assert!(!store.delete_forward_if(&key, "beacon/downloads/sdut/old.png").await.unwrap());
        assert_eq!(store.get_forward(&key).await.unwrap(), "beacon/downloads/sdut/new.png");
        assert!(store.delete_forward_if(&key, "beacon/downloads/sdut/new.png").await.unwrap());

        store.schedule("a", 500).await.unwrap();
        assert!(!store.remove_if_due("a", 100).await.unwrap());
        assert_eq!(store.pending_entries().await, vec![("a".to_string(), 500)]);
        assert!(store.remove_if_due("a", 500).await.unwrap());
        assert!(!store.remove_if_due("a", 500).await.unwrap());
    }
}
