use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::redact::{MASK, redact_url};

pub mod defaults;
pub mod duration_serde;

use defaults::*;

/// Environment variable prefix; sections are separated by `__`
/// (e.g. `LOGO_API_CACHE__TTL=5m`).
pub const ENV_PREFIX: &str = "LOGO_API_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub object_store: ObjectStoreConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub rasterizer: RasterizerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on a single logo resolution, rasterization included
    #[serde(default = "default_request_timeout", with = "duration_serde::duration")]
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStoreBackend {
    /// Bucket reachable over plain HTTP verbs
    Http,
    /// Directory on the local filesystem
    #[default]
    Local,
    /// Process memory, for development and tests
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    #[serde(default)]
    pub backend: ObjectStoreBackend,
    /// Bucket endpoint for the `http` backend
    pub base_url: Option<String>,
    /// Bearer token sent with every bucket request
    pub auth_token: Option<String>,
    /// Root directory for the `local` backend
    #[serde(default = "default_object_store_root")]
    pub root: PathBuf,
    /// Prefix under which canonical source artifacts live
    #[serde(default = "default_source_prefix")]
    pub source_prefix: String,
    /// Prefix under which generated artifacts are written
    #[serde(default = "default_generated_prefix")]
    pub generated_prefix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Redis,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_forward_prefix")]
    pub forward_prefix: String,
    #[serde(default = "default_reverse_prefix")]
    pub reverse_prefix: String,
    #[serde(default = "default_pending_delete_key")]
    pub pending_delete_key: String,
    /// Lifetime of a generated artifact before the sweep may delete it
    #[serde(default = "default_artifact_ttl", with = "duration_serde::duration")]
    pub ttl: Duration,
    #[serde(default = "default_cleanup_interval", with = "duration_serde::duration")]
    pub cleanup_interval: Duration,
    #[serde(default = "default_cleanup_enabled")]
    pub cleanup_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RasterizerBackend {
    /// External `rsvg-convert` process
    #[default]
    RsvgConvert,
    /// In-process rendering with resvg
    Resvg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterizerConfig {
    #[serde(default)]
    pub backend: RasterizerBackend,
    /// Executable for the `rsvg-convert` backend
    #[serde(default = "default_rasterizer_command")]
    pub command: String,
    #[serde(default = "default_rasterizer_timeout", with = "duration_serde::duration")]
    pub timeout: Duration,
    /// Largest width, height or size a request may ask for
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn parse_default_duration(value: &str) -> Duration {
    humantime::parse_duration(value).unwrap_or(Duration::from_secs(30))
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_request_timeout() -> Duration {
    parse_default_duration(DEFAULT_REQUEST_TIMEOUT)
}
fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}
fn default_object_store_root() -> PathBuf {
    PathBuf::from(DEFAULT_OBJECT_STORE_ROOT)
}
fn default_source_prefix() -> String {
    DEFAULT_SOURCE_PREFIX.to_string()
}
fn default_generated_prefix() -> String {
    DEFAULT_GENERATED_PREFIX.to_string()
}
fn default_redis_url() -> String {
    DEFAULT_REDIS_URL.to_string()
}
fn default_forward_prefix() -> String {
    DEFAULT_FORWARD_PREFIX.to_string()
}
fn default_reverse_prefix() -> String {
    DEFAULT_REVERSE_PREFIX.to_string()
}
fn default_pending_delete_key() -> String {
    DEFAULT_PENDING_DELETE_KEY.to_string()
}
fn default_artifact_ttl() -> Duration {
    parse_default_duration(DEFAULT_ARTIFACT_TTL)
}
fn default_cleanup_interval() -> Duration {
    parse_default_duration(DEFAULT_CLEANUP_INTERVAL)
}
fn default_cleanup_enabled() -> bool {
    DEFAULT_CLEANUP_ENABLED
}
fn default_rasterizer_command() -> String {
    DEFAULT_RASTERIZER_COMMAND.to_string()
}
fn default_rasterizer_timeout() -> Duration {
    parse_default_duration(DEFAULT_RASTERIZER_TIMEOUT)
}
fn default_max_dimension() -> u32 {
    DEFAULT_MAX_DIMENSION
}
fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: Some(DEFAULT_MAX_CONNECTIONS),
        }
    }
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            backend: ObjectStoreBackend::default(),
            base_url: None,
            auth_token: None,
            root: default_object_store_root(),
            source_prefix: default_source_prefix(),
            generated_prefix: default_generated_prefix(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            redis_url: default_redis_url(),
            forward_prefix: default_forward_prefix(),
            reverse_prefix: default_reverse_prefix(),
            pending_delete_key: default_pending_delete_key(),
            ttl: default_artifact_ttl(),
            cleanup_interval: default_cleanup_interval(),
            cleanup_enabled: default_cleanup_enabled(),
        }
    }
}

impl Default for RasterizerConfig {
    fn default() -> Self {
        Self {
            backend: RasterizerBackend::default(),
            command: default_rasterizer_command(),
            timeout: default_rasterizer_timeout(),
            max_dimension: default_max_dimension(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

impl Config {
    /// Layered load: built-in defaults, then the TOML file (if present),
    /// then `LOGO_API_*` environment variables.
    pub fn load_from_file<P: AsRef<Path>>(config_file: P) -> Result<Self> {
        let config_file = config_file.as_ref();
        let config: Self = Self::figment(config_file)
            .extract()
            .with_context(|| format!("Failed to load configuration from {}", config_file.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn figment(config_file: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Reject combinations that would only fail later at first use
    pub fn validate(&self) -> Result<()> {
        if self.object_store.backend == ObjectStoreBackend::Http && self.object_store.base_url.is_none() {
            anyhow::bail!("object_store.base_url is required for the http backend");
        }
        if self.rasterizer.jpeg_quality == 0 || self.rasterizer.jpeg_quality > 100 {
            anyhow::bail!(
                "rasterizer.jpeg_quality must be between 1 and 100, got {}",
                self.rasterizer.jpeg_quality
            );
        }
        if self.rasterizer.max_dimension == 0 {
            anyhow::bail!("rasterizer.max_dimension must be positive");
        }
        if self.cache.cleanup_interval.is_zero() {
            anyhow::bail!("cache.cleanup_interval must be positive");
        }
        Ok(())
    }

    /// Copy with credentials masked
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.database.url = redact_url(&config.database.url);
        config.cache.redis_url = redact_url(&config.cache.redis_url);
        if config.object_store.auth_token.is_some() {
            config.object_store.auth_token = Some(MASK.to_string());
        }
        config
    }

    /// Effective configuration rendered as TOML, secrets masked
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(&self.redacted())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.forward_prefix, "logo_cache");
        assert_eq!(config.cache.reverse_prefix, "logo_cos_to_key");
        assert_eq!(config.cache.pending_delete_key, "cos_pending_delete");
        assert_eq!(config.cache.ttl, Duration::from_secs(3600));
        assert_eq!(config.object_store.generated_prefix, "beacon/downloads");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load_from_file("/nonexistent/logo-api.toml").unwrap();
        assert_eq!(config.web.port, DEFAULT_PORT);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[cache]\nbackend = \"memory\"\nttl = \"20s\"\n\n[rasterizer]\nbackend = \"resvg\"\njpeg_quality = 75"
        )
        .unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.ttl, Duration::from_secs(20));
        assert_eq!(config.rasterizer.jpeg_quality, 75);
        assert_eq!(config.rasterizer.backend, RasterizerBackend::Resvg);
        // untouched sections keep their defaults
        assert_eq!(config.cache.forward_prefix, DEFAULT_FORWARD_PREFIX);
    }

    #[test]
    fn test_http_backend_requires_base_url() {
        let mut config = Config::default();
        config.object_store.backend = ObjectStoreBackend::Http;
        assert!(config.validate().is_err());

        config.object_store.base_url = Some("https://bucket.example.com".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_round_trips_through_toml() {
        let rendered = Config::default().to_toml().unwrap();
        assert!(rendered.contains("request_timeout = \"30s\""));
    }

    #[test]
    fn test_rendered_toml_masks_credentials() {
        let mut config = Config::default();
        config.database.url = "postgres://logo:dbsecret@db/logos".to_string();
        config.cache.redis_url = "redis://:cachesecret@cache:6379/0".to_string();
        config.object_store.auth_token = Some("bucket-token".to_string());

        let rendered = config.to_toml().unwrap();

        for secret in ["dbsecret", "cachesecret", "bucket-token"] {
            assert!(!rendered.contains(secret), "{secret} leaked");
        }
        assert!(rendered.contains("redis://:****@cache:6379/0"));
        assert!(rendered.contains("auth_token = \"****\""));
        // the live config is untouched
        assert_eq!(config.object_store.auth_token.as_deref(), Some("bucket-token"));
    }
}
