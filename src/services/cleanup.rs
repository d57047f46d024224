//! Sweep of expired generated artifacts
//!
//! The object is deleted first. Only once that succeeds are the queue entry
//! and the cache mappings removed, so a failed delete leaves the entry in
//! place for the next sweep.
//!
//! A request may regenerate the same path between the delete and the
//! bookkeeping. The queue entry is therefore removed only while its expiry is
//! still due, and the forward mapping only while it still points at the
//! deleted path. A rescheduled entry keeps its mappings for a later sweep.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::errors::AppResult;
use crate::models::CleanResult;
use crate::storage::{CacheIndex, ObjectStore, PendingDeletionQueue};
use crate::utils::decode_path;

pub struct ExpiredArtifactSweeper {
    objects: Arc<dyn ObjectStore>,
    index: Arc<dyn CacheIndex>,
    queue: Arc<dyn PendingDeletionQueue>,
}

impl ExpiredArtifactSweeper {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        index: Arc<dyn CacheIndex>,
        queue: Arc<dyn PendingDeletionQueue>,
    ) -> Self {
        Self { objects, index, queue }
    }

    /// Delete every artifact whose expiry is at or before `now`
    ///
    /// Fails only when the queue itself cannot be read. Per-entry failures
    /// are counted in the returned [`CleanResult`].
    pub async fn clean_expired(&self, now: DateTime<Utc>) -> AppResult<CleanResult> {
        let members = self.queue.due(now.timestamp()).await?;
        let mut result = CleanResult {
            total: members.len(),
            ..CleanResult::default()
        };

        if members.is_empty() {
            debug!("No generated artifacts due for deletion");
            return Ok(result);
        }

        let now = now.timestamp();
        for member in &members {
            self.clean_entry(member, now, &mut result).await;
        }

        info!(
            "Cleanup sweep finished: {} due, {} deleted, {} failed",
            result.total, result.succeeded, result.failed
        );
        Ok(result)
    }

    async fn clean_entry(&self, member: &str, now: i64, result: &mut CleanResult) {
        let Some(path) = decode_path(member) else {
            warn!("Dropping undecodable pending-deletion entry '{}'", member);
            if let Err(e) = self.queue.remove(member).await {
                warn!("Failed to drop pending-deletion entry '{}': {}", member, e);
            }
            result.record_failure(member);
            return;
        };

        let key = match self.index.get_reverse(&path).await {
            Ok(key) => Some(key),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                warn!("Reverse lookup for {} failed: {}", path, e);
                None
            }
        };

        if let Err(e) = self.objects.delete(&path).await {
            warn!("Failed to delete expired artifact {}: {}", path, e);
            result.record_failure(path);
            return;
        }

        match self.queue.remove_if_due(member, now).await {
            Ok(true) => {}
            Ok(false) => {
                debug!("{} was regenerated during the sweep, keeping its mappings", path);
                result.record_success();
                return;
            }
            Err(e) => warn!("Failed to dequeue {}: {}", path, e),
        }

        if let Some(key) = &key {
            match self.index.delete_forward_if(key, &path).await {
                Ok(true) => {}
                Ok(false) => debug!("Cache mapping {} no longer points at {}", key, path),
                Err(e) => warn!("Failed to remove cache mapping {}: {}", key, e),
            }
        }
        if let Err(e) = self.index.delete_reverse(&path).await {
            warn!("Failed to remove reverse mapping for {}: {}", path, e);
        }

        debug!("Deleted expired artifact {}", path);
        result.record_success();
    }
}
