use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use super::ObjectStore;
use crate::errors::{StoreError, StoreResult};

const STORE: &str = "local object store";

/// Object store backed by a directory tree
///
/// Object paths map onto files below `root`; paths that would escape the
/// root are rejected.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub async fn ensure_root(&self) -> Result<(), std::io::Error> {
        fs::create_dir_all(&self.root).await
    }

    fn resolve(&self, path: &str) -> StoreResult<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let is_contained = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if path.trim().is_empty() || !is_contained {
            return Err(StoreError::Unavailable {
                store: STORE,
                message: format!("refusing path outside the store root: '{path}'"),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl ObjectStore for LocalObjectStore {
    async fn get(&self, path: &str) -> StoreResult<Bytes> {
        let file = self.resolve(path)?;
        match fs::read(&file).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::not_found(STORE, path)),
            Err(e) => Err(StoreError::unavailable(STORE, e)),
        }
    }

    async fn put(&self, path: &str, data: Bytes) -> StoreResult<()> {
        let file = self.resolve(path)?;
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::unavailable(STORE, e))?;
        }

        // Write next to the target and rename so readers never see a partial file
        let staging = file.with_extension(format!("{}.partial", Uuid::new_v4()));
        if let Err(e) = fs::write(&staging, &data).await {
            let _ = fs::remove_file(&staging).await;
            return Err(StoreError::unavailable(STORE, e));
        }
        if let Err(e) = fs::rename(&staging, &file).await {
            let _ = fs::remove_file(&staging).await;
            return Err(StoreError::unavailable(STORE, e));
        }

        debug!("Stored {} bytes at {}", data.len(), file.display());
        Ok(())
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        let file = self.resolve(path)?;
        match fs::remove_file(&file).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::unavailable(STORE, e)),
        }
    }
}
