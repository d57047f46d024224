use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace, warn};

use super::ExpiredArtifactSweeper;

/// Runs the expired-artifact sweep on a fixed interval
pub struct CleanupHousekeeper {
    sweeper: Arc<ExpiredArtifactSweeper>,
    interval: Duration,
}

impl CleanupHousekeeper {
    pub fn new(sweeper: Arc<ExpiredArtifactSweeper>, interval: Duration) -> Self {
        Self { sweeper, interval }
    }

    /// Loop until `shutdown` is cancelled
    ///
    /// The first sweep runs immediately.
    pub async fn start(self, shutdown: CancellationToken) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Starting cleanup housekeeper with interval: {:?}", self.interval);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Cleanup housekeeper stopping");
                    break;
                }
                _ = ticker.tick() => self.run_once().await,
            }
        }
    }

    async fn run_once(&self) {
        let started = Utc::now();
        match self.sweeper.clean_expired(started).await {
            Ok(result) if result.failed > 0 => warn!(
                "Cleanup left {} of {} artifacts in place: {:?}",
                result.failed, result.total, result.failed_paths
            ),
            Ok(result) if result.total > 0 => {
                let elapsed = Utc::now().signed_duration_since(started).num_milliseconds();
                info!("Cleanup removed {} artifacts in {}ms", result.succeeded, elapsed);
            }
            Ok(_) => trace!("Cleanup housekeeper: nothing due"),
            Err(e) => error!("Cleanup housekeeper error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryCacheStore, MemoryObjectStore, ObjectStore, PendingDeletionQueue};
    use bytes::Bytes;

    #[tokio::test]
    async fn test_first_tick_sweeps_and_cancel_stops() {
        let objects = Arc::new(MemoryObjectStore::new());
        let cache = Arc::new(MemoryCacheStore::new());
        objects
            .put("beacon/downloads/sdut/a.png", Bytes::from_static(b"png"))
            .await
            .unwrap();
        cache
            .schedule("beacon%2Fdownloads%2Fsdut%2Fa.png", 0)
            .await
            .unwrap();

        let sweeper = Arc::new(ExpiredArtifactSweeper::new(objects.clone(), cache.clone(), cache.clone()));
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(
            CleanupHousekeeper::new(sweeper, Duration::from_secs(3600)).start(shutdown.clone()),
        );

        for _ in 0..50 {
            if objects.is_empty().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(objects.is_empty().await);
        assert!(cache.pending_entries().await.is_empty());

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
