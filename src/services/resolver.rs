//! Logo resolution
//!
//! Vector requests are served straight from the metadata store and object
//! store. Raster requests go through the cache index first; on a miss the
//! vector source is rasterized, stored, and recorded in the cache index and
//! the pending-deletion queue.
//!
//! Cache-layer failures never fail a request. They are logged and the
//! resolver carries on along the authoritative path.

use bytes::Bytes;
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::{LogoFormat, LogoRequest, ResourceMetadata, Sizing};
use crate::rasterizer::RasterizationPipeline;
use crate::storage::{CacheIndex, MetadataStore, ObjectStore, PendingDeletionQueue};
use crate::utils::{CacheKey, ObjectLayout, ObjectPath, encode_path};

/// The four stores the resolver talks to
#[derive(Clone)]
pub struct ResolverStores {
    pub metadata: Arc<dyn MetadataStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub index: Arc<dyn CacheIndex>,
    pub queue: Arc<dyn PendingDeletionQueue>,
}

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub layout: ObjectLayout,
    /// How long a generated artifact lives before the sweep may remove it
    pub ttl: Duration,
    /// Deadline for a whole resolution
    pub request_timeout: Duration,
    pub max_dimension: u32,
}

impl ResolverSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            layout: ObjectLayout::new(
                config.object_store.source_prefix.as_str(),
                config.object_store.generated_prefix.as_str(),
            ),
            ttl: config.cache.ttl,
            request_timeout: config.web.request_timeout,
            max_dimension: config.rasterizer.max_dimension,
        }
    }
}

/// Which path produced the bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveSource {
    /// Previously generated artifact found through the cache index
    CacheHit,
    /// Stored artifact already in the requested format
    Direct,
    /// Rasterized for this request
    Generated,
}

impl ResolveSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CacheHit => "hit",
            Self::Direct => "direct",
            Self::Generated => "generated",
        }
    }
}

impl fmt::Display for ResolveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedLogo {
    pub bytes: Bytes,
    pub format: LogoFormat,
    /// File name of the served artifact
    pub artifact_name: String,
    pub source: ResolveSource,
}

pub struct ResourceResolver {
    stores: ResolverStores,
    pipeline: Arc<RasterizationPipeline>,
    settings: ResolverSettings,
}

impl ResourceResolver {
    pub fn new(stores: ResolverStores, pipeline: Arc<RasterizationPipeline>, settings: ResolverSettings) -> Self {
        Self {
            stores,
            pipeline,
            settings,
        }
    }

    /// Resolve a request to artifact bytes within the configured deadline
    pub async fn resolve(&self, request: &LogoRequest) -> AppResult<ResolvedLogo> {
        let deadline = self.settings.request_timeout;
        match timeout(deadline, self.resolve_inner(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Resolution of '{}' ({}) timed out after {:?}", request.name, request.format, deadline);
                Err(AppError::Timeout(deadline))
            }
        }
    }

    async fn resolve_inner(&self, request: &LogoRequest) -> AppResult<ResolvedLogo> {
        let name = request.name.trim();
        let Some(sizing) = request.validate(self.settings.max_dimension)? else {
            // Vector artifacts are canonical and never cache-managed
            let resource = self
                .stores
                .metadata
                .find_by_name_and_format(name, LogoFormat::Svg)
                .await?;
            return self.serve_stored(&resource, LogoFormat::Svg).await;
        };

        let background = request.normalized_background();
        let key = CacheKey::for_request(request, sizing);

        if let Some(hit) = self.lookup_cached(&key, request.format).await {
            return Ok(hit);
        }

        let resource = self
            .stores
            .metadata
            .find_by_name_and_sizing(name, request.format, sizing, &background)
            .await?;

        if request.format.matches_stored(&resource.resource_type) {
            return self.serve_stored(&resource, request.format).await;
        }
        if !resource.is_vector_source() {
            return Err(AppError::not_found(
                "vector source",
                format!("{name} ({} stored as {})", request.format, resource.resource_type),
            ));
        }

        self.generate(&key, &resource, request.format, sizing, &background)
            .await
    }

    /// Follow the forward mapping; any non-definitive answer is a miss
    ///
    /// A mapping whose object cannot be read is deleted so it is never
    /// followed again.
    async fn lookup_cached(&self, key: &CacheKey, format: LogoFormat) -> Option<ResolvedLogo> {
        let stored_path = match self.stores.index.get_forward(key).await {
            Ok(path) => path,
            Err(e) if e.is_not_found() => {
                debug!("Cache miss for key {}", key);
                return None;
            }
            Err(e) => {
                warn!("Cache index lookup for {} failed, regenerating: {}", key, e);
                return None;
            }
        };

        match ObjectPath::parse(&stored_path) {
            Some(path) => match self.stores.objects.get(&stored_path).await {
                Ok(bytes) => {
                    info!("Cache hit for {} -> {}", key, stored_path);
                    return Some(ResolvedLogo {
                        bytes,
                        format,
                        artifact_name: path.file_name().to_string(),
                        source: ResolveSource::CacheHit,
                    });
                }
                Err(e) => warn!("Cached artifact {} is unreadable, purging mapping: {}", stored_path, e),
            },
            None => warn!("Cache entry {} holds malformed path '{}', purging", key, stored_path),
        }

        if let Err(e) = self.stores.index.delete_forward(key).await {
            warn!("Failed to purge stale cache mapping {}: {}", key, e);
        }
        None
    }

    async fn serve_stored(&self, resource: &ResourceMetadata, format: LogoFormat) -> AppResult<ResolvedLogo> {
        let path = self
            .settings
            .layout
            .source_path(&resource.short_name, &resource.resource_name);
        let bytes = self.stores.objects.get(&path.to_string()).await?;
        debug!("Serving stored artifact {}", path);
        Ok(ResolvedLogo {
            bytes,
            format,
            artifact_name: path.file_name().to_string(),
            source: ResolveSource::Direct,
        })
    }

    async fn generate(
        &self,
        key: &CacheKey,
        resource: &ResourceMetadata,
        format: LogoFormat,
        sizing: Sizing,
        background: &str,
    ) -> AppResult<ResolvedLogo> {
        let source_path = self
            .settings
            .layout
            .source_path(&resource.short_name, &resource.resource_name);
        let source = self.stores.objects.get(&source_path.to_string()).await?;

        let artifact = self
            .pipeline
            .rasterize(&source, &resource.title, format, sizing, background)
            .await?;

        let target = self
            .settings
            .layout
            .generated_path(&resource.short_name, &artifact.metadata.file_name)
            .to_string();
        self.stores.objects.put(&target, artifact.bytes.clone()).await?;
        info!(
            "Generated {} ({} bytes, sha256 {}) from {}",
            target, artifact.metadata.size_bytes, artifact.metadata.content_hash, source_path
        );

        // The object is durable now. Record it on a detached task so a
        // cancelled request still completes the bookkeeping.
        let ttl_secs = i64::try_from(self.settings.ttl.as_secs()).unwrap_or(i64::MAX);
        let expire_at = Utc::now().timestamp().saturating_add(ttl_secs);
        let bookkeeping = tokio::spawn(record_artifact(
            self.stores.index.clone(),
            self.stores.queue.clone(),
            key.clone(),
            target,
            expire_at,
        ));
        if let Err(e) = bookkeeping.await {
            warn!("Cache bookkeeping task for {} did not complete: {}", key, e);
        }

        Ok(ResolvedLogo {
            bytes: artifact.bytes,
            format,
            artifact_name: artifact.metadata.file_name,
            source: ResolveSource::Generated,
        })
    }
}

/// Write both mapping directions and schedule the expiry
///
/// Each write is independent; a failure only costs caching.
async fn record_artifact(
    index: Arc<dyn CacheIndex>,
    queue: Arc<dyn PendingDeletionQueue>,
    key: CacheKey,
    path: String,
    expire_at: i64,
) {
    if let Err(e) = index.set_forward(&key, &path).await {
        warn!("Failed to record cache mapping {} -> {}: {}", key, path, e);
    }
    if let Err(e) = index.set_reverse(&path, &key).await {
        warn!("Failed to record reverse mapping {} -> {}: {}", path, key, e);
    }
    if let Err(e) = queue.schedule(&encode_path(&path), expire_at).await {
        warn!("Failed to schedule deletion of {} at {}: {}", path, expire_at, e);
    }
}
