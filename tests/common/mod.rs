//! Shared fixtures for the integration tests
//!
//! Every store is the in-memory implementation wrapped in a fault-injecting
//! shim, and the metadata store is the real SeaORM repository on in-memory
//! SQLite.

#![allow(dead_code)]

use bytes::Bytes;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use logo_api::database::Database;
use logo_api::database::repositories::ResourceSeaOrmRepository;
use logo_api::errors::{RasterizeResult, StoreError, StoreResult};
use logo_api::models::{NewResource, ResourceMetadata};
use logo_api::rasterizer::{RasterizationPipeline, Rasterizer, RenderRequest, ResvgRasterizer};
use logo_api::services::{ExpiredArtifactSweeper, ResolverSettings, ResolverStores, ResourceResolver};
use logo_api::storage::{
    CacheIndex, MemoryCacheStore, MemoryObjectStore, ObjectStore, PendingDeletionQueue,
};
use logo_api::utils::{CacheKey, ObjectLayout};
use logo_api::web::AppState;

pub const SDUT_TITLE: &str = "Shandong University of Technology";
pub const SDUT_SHORT: &str = "sdut";
pub const SDUT_SOURCE_PATH: &str = "beacon/sdut/sdut.svg";

pub const SDUT_SVG: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100"><circle cx="50" cy="50" r="40" fill="#1E4E9C"/></svg>"##;

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

// =============================================================================
// RASTERIZERS
// =============================================================================

/// resvg with a call counter
#[derive(Default)]
pub struct CountingRasterizer {
    inner: ResvgRasterizer,
    calls: AtomicUsize,
}

impl CountingRasterizer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Rasterizer for CountingRasterizer {
    async fn render(&self, source: &[u8], request: &RenderRequest) -> RasterizeResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.render(source, request).await
    }

    fn name(&self) -> &'static str {
        "counting-resvg"
    }
}

/// Never finishes within any reasonable deadline
pub struct StalledRasterizer;

#[async_trait::async_trait]
impl Rasterizer for StalledRasterizer {
    async fn render(&self, _source: &[u8], _request: &RenderRequest) -> RasterizeResult<Vec<u8>> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "stalled"
    }
}

// =============================================================================
// FAULT-INJECTING STORES
// =============================================================================

fn injected(store: &'static str) -> StoreError {
    StoreError::unavailable(store, "injected fault")
}

/// Runs once, right after the next successful object delete
pub type DeleteHook = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// Memory object store with per-path read/delete failures, a global
/// write failure switch and a one-shot post-delete hook
#[derive(Default)]
pub struct FaultyObjectStore {
    pub inner: MemoryObjectStore,
    failing_gets: Mutex<HashSet<String>>,
    failing_deletes: Mutex<HashSet<String>>,
    failing_puts: Mutex<bool>,
    after_delete: Mutex<Option<DeleteHook>>,
}

impl FaultyObjectStore {
    pub fn fail_get(&self, path: &str) {
        self.failing_gets.lock().unwrap().insert(path.to_string());
    }

    pub fn fail_delete(&self, path: &str) {
        self.failing_deletes.lock().unwrap().insert(path.to_string());
    }

    pub fn fail_puts(&self, failing: bool) {
        *self.failing_puts.lock().unwrap() = failing;
    }

    pub fn after_delete<F, Fut>(&self, hook: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let hook: DeleteHook = Box::new(move || Box::pin(hook()));
        *self.after_delete.lock().unwrap() = Some(hook);
    }

    pub fn heal(&self) {
        self.failing_gets.lock().unwrap().clear();
        self.failing_deletes.lock().unwrap().clear();
        self.fail_puts(false);
    }
}

#[async_trait::async_trait]
impl ObjectStore for FaultyObjectStore {
    async fn get(&self, path: &str) -> StoreResult<Bytes> {
        if self.failing_gets.lock().unwrap().contains(path) {
            return Err(injected("object store"));
        }
        self.inner.get(path).await
    }

    async fn put(&self, path: &str, data: Bytes) -> StoreResult<()> {
        if *self.failing_puts.lock().unwrap() {
            return Err(injected("object store"));
        }
        self.inner.put(path, data).await
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        if self.failing_deletes.lock().unwrap().contains(path) {
            return Err(injected("object store"));
        }
        self.inner.delete(path).await?;
        let hook = self.after_delete.lock().unwrap().take();
        if let Some(hook) = hook {
            hook().await;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheFault {
    GetForward,
    SetForward,
    DeleteForward,
    GetReverse,
    SetReverse,
    DeleteReverse,
    Schedule,
    Due,
    Remove,
}

/// Memory cache index and queue with switchable per-operation failures and
/// an optional delay before each forward write
#[derive(Default)]
pub struct FaultyCacheStore {
    pub inner: MemoryCacheStore,
    faults: Mutex<HashSet<CacheFault>>,
    set_forward_delay: Mutex<Option<Duration>>,
}

impl FaultyCacheStore {
    pub fn delay_set_forward(&self, delay: Duration) {
        *self.set_forward_delay.lock().unwrap() = Some(delay);
    }

    pub fn inject(&self, fault: CacheFault) {
        self.faults.lock().unwrap().insert(fault);
    }

    pub fn heal(&self) {
        self.faults.lock().unwrap().clear();
    }

    fn check(&self, fault: CacheFault) -> StoreResult<()> {
        if self.faults.lock().unwrap().contains(&fault) {
            Err(injected("cache index"))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl CacheIndex for FaultyCacheStore {
    async fn get_forward(&self, key: &CacheKey) -> StoreResult<String> {
        self.check(CacheFault::GetForward)?;
        self.inner.get_forward(key).await
    }

    async fn set_forward(&self, key: &CacheKey, path: &str) -> StoreResult<()> {
        self.check(CacheFault::SetForward)?;
        let delay = *self.set_forward_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.set_forward(key, path).await
    }

    async fn delete_forward(&self, key: &CacheKey) -> StoreResult<()> {
        self.check(CacheFault::DeleteForward)?;
        self.inner.delete_forward(key).await
    }

    async fn delete_forward_if(&self, key: &CacheKey, path: &str) -> StoreResult<bool> {
        self.check(CacheFault::DeleteForward)?;
        self.inner.delete_forward_if(key, path).await
    }

    async fn get_reverse(&self, path: &str) -> StoreResult<CacheKey> {
        self.check(CacheFault::GetReverse)?;
        self.inner.get_reverse(path).await
    }

    async fn set_reverse(&self, path: &str, key: &CacheKey) -> StoreResult<()> {
        self.check(CacheFault::SetReverse)?;
        self.inner.set_reverse(path, key).await
    }

    async fn delete_reverse(&self, path: &str) -> StoreResult<()> {
        self.check(CacheFault::DeleteReverse)?;
        self.inner.delete_reverse(path).await
    }
}

#[async_trait::async_trait]
impl PendingDeletionQueue for FaultyCacheStore {
    async fn schedule(&self, member: &str, expire_at: i64) -> StoreResult<()> {
        self.check(CacheFault::Schedule)?;
        self.inner.schedule(member, expire_at).await
    }

    async fn due(&self, now: i64) -> StoreResult<Vec<String>> {
        self.check(CacheFault::Due)?;
        self.inner.due(now).await
    }

    async fn remove(&self, member: &str) -> StoreResult<()> {
        self.check(CacheFault::Remove)?;
        self.inner.remove(member).await
    }

    async fn remove_if_due(&self, member: &str, now: i64) -> StoreResult<bool> {
        self.check(CacheFault::Remove)?;
        self.inner.remove_if_due(member, now).await
    }
}

// =============================================================================
// HARNESS
// =============================================================================

pub struct Harness {
    pub database: Database,
    pub repository: ResourceSeaOrmRepository,
    pub objects: Arc<FaultyObjectStore>,
    pub cache: Arc<FaultyCacheStore>,
    pub rasterizer: Arc<CountingRasterizer>,
    pub resolver: Arc<ResourceResolver>,
    pub sweeper: Arc<ExpiredArtifactSweeper>,
    pub settings: ResolverSettings,
}

impl Harness {
    /// Empty stores apart from the SDUT vector source
    pub async fn new() -> Self {
        Self::build(None, Duration::from_secs(30)).await
    }

    /// Like [`Harness::new`] with a custom request deadline
    pub async fn new_with_timeout(request_timeout: Duration) -> Self {
        Self::build(None, request_timeout).await
    }

    /// Like [`Harness::new`] but rendering through `rasterizer` with a
    /// tight request deadline
    pub async fn with_rasterizer(rasterizer: Arc<dyn Rasterizer>, request_timeout: Duration) -> Self {
        Self::build(Some(rasterizer), request_timeout).await
    }

    async fn build(rasterizer_override: Option<Arc<dyn Rasterizer>>, request_timeout: Duration) -> Self {
        let database = Database::in_memory().await.expect("in-memory database");
        let repository = ResourceSeaOrmRepository::new(database.connection());
        let objects = Arc::new(FaultyObjectStore::default());
        let cache = Arc::new(FaultyCacheStore::default());
        let rasterizer = Arc::new(CountingRasterizer::default());

        let settings = ResolverSettings {
            layout: ObjectLayout::new("beacon", "beacon/downloads"),
            ttl: DEFAULT_TTL,
            request_timeout,
            max_dimension: 4096,
        };

        let renderer: Arc<dyn Rasterizer> = match rasterizer_override {
            Some(renderer) => renderer,
            None => rasterizer.clone(),
        };
        let pipeline = Arc::new(RasterizationPipeline::new(renderer, 90));
        let stores = ResolverStores {
            metadata: Arc::new(repository.clone()),
            objects: objects.clone(),
            index: cache.clone(),
            queue: cache.clone(),
        };
        let resolver = Arc::new(ResourceResolver::new(stores, pipeline, settings.clone()));
        let sweeper = Arc::new(ExpiredArtifactSweeper::new(
            objects.clone(),
            cache.clone(),
            cache.clone(),
        ));

        let harness = Self {
            database,
            repository,
            objects,
            cache,
            rasterizer,
            resolver,
            sweeper,
            settings,
        };
        harness.seed_sdut().await;
        harness
    }

    async fn seed_sdut(&self) -> ResourceMetadata {
        self.objects
            .inner
            .put(SDUT_SOURCE_PATH, Bytes::from_static(SDUT_SVG))
            .await
            .expect("seed source object");
        self.repository
            .insert(NewResource::vector_source(SDUT_TITLE, SDUT_SHORT, "sdut.svg"))
            .await
            .expect("seed source row")
    }

    /// Generated object path for an artifact file name
    pub fn generated_path(&self, file_name: &str) -> String {
        self.settings
            .layout
            .generated_path(SDUT_SHORT, file_name)
            .to_string()
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            database: self.database.clone(),
            resolver: self.resolver.clone(),
            sweeper: self.sweeper.clone(),
        }
    }
}
