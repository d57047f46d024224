use bytes::Bytes;
use reqwest::{Client, RequestBuilder, StatusCode, header};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{ObjectStore, content_type_for};
use crate::errors::{StoreError, StoreResult};

const STORE: &str = "http object store";

/// Object store speaking plain GET/PUT/DELETE against a bucket endpoint
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl HttpObjectStore {
    pub fn new(base_url: &str, auth_token: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Self::with_client(client, base_url, auth_token)
    }

    pub fn with_client(client: Client, base_url: &str, auth_token: Option<String>) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Object store URL cannot be used as a base: {}", base_url);
        }
        Ok(Self {
            client,
            base_url,
            auth_token,
        })
    }

    /// Bucket URL for an object path, each segment percent-encoded
    pub fn object_url(&self, path: &str) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| StoreError::Unavailable {
                store: STORE,
                message: format!("invalid base URL {}", self.base_url),
            })?;
            segments.pop_if_empty();
            segments.extend(path.split('/').filter(|segment| !segment.is_empty()));
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn status_error(path: &str, status: StatusCode) -> StoreError {
        StoreError::Unavailable {
            store: STORE,
            message: format!(
                "{} {} for '{}'",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown"),
                path
            ),
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for HttpObjectStore {
    async fn get(&self, path: &str) -> StoreResult<Bytes> {
        let url = self.object_url(path)?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| StoreError::unavailable(STORE, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StoreError::not_found(STORE, path)),
            status if !status.is_success() => Err(Self::status_error(path, status)),
            _ => response
                .bytes()
                .await
                .map_err(|e| StoreError::unavailable(STORE, e)),
        }
    }

    async fn put(&self, path: &str, data: Bytes) -> StoreResult<()> {
        let url = self.object_url(path)?;
        let size = data.len();
        let response = self
            .authorize(self.client.put(url))
            .header(header::CONTENT_TYPE, content_type_for(path))
            .body(data)
            .send()
            .await
            .map_err(|e| StoreError::unavailable(STORE, e))?;

        if !response.status().is_success() {
            return Err(Self::status_error(path, response.status()));
        }
        debug!("Uploaded {} bytes to {}", size, path);
        Ok(())
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        let url = self.object_url(path)?;
        let response = self
            .authorize(self.client.delete(url))
            .send()
            .await
            .map_err(|e| StoreError::unavailable(STORE, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if !status.is_success() => Err(Self::status_error(path, status)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url_encodes_segments() {
        let store = HttpObjectStore::new("https://bucket.example.com/logos/", None).unwrap();
        let url = store.object_url("beacon/downloads/sdut/A B-logo-64px.png").unwrap();
        assert_eq!(
            url.as_str(),
            "https://bucket.example.com/logos/beacon/downloads/sdut/A%20B-logo-64px.png"
        );
    }

    #[test]
    fn test_object_url_without_base_path() {
        let store = HttpObjectStore::new("https://bucket.example.com", None).unwrap();
        let url = store.object_url("beacon/sdut/sdut.svg").unwrap();
        assert_eq!(url.as_str(), "https://bucket.example.com/beacon/sdut/sdut.svg");
    }

    #[test]
    fn test_rejects_non_base_urls() {
        assert!(HttpObjectStore::new("mailto:ops@example.com", None).is_err());
    }
}
