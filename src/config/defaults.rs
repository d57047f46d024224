/// Configuration default values
///
/// All defaults live here so they can be changed in one place.
// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REQUEST_TIMEOUT: &str = "30s";

// Database defaults
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./logo-api.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

// Object store defaults
pub const DEFAULT_OBJECT_STORE_ROOT: &str = "./data/objects";
pub const DEFAULT_SOURCE_PREFIX: &str = "beacon";
pub const DEFAULT_GENERATED_PREFIX: &str = "beacon/downloads";

// Cache index defaults
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_FORWARD_PREFIX: &str = "logo_cache";
pub const DEFAULT_REVERSE_PREFIX: &str = "logo_cos_to_key";
pub const DEFAULT_PENDING_DELETE_KEY: &str = "cos_pending_delete";
pub const DEFAULT_ARTIFACT_TTL: &str = "1h";
pub const DEFAULT_CLEANUP_INTERVAL: &str = "20m";
pub const DEFAULT_CLEANUP_ENABLED: bool = true;

// Rasterizer defaults
pub const DEFAULT_RASTERIZER_COMMAND: &str = "rsvg-convert";
pub const DEFAULT_RASTERIZER_TIMEOUT: &str = "20s";
pub const DEFAULT_MAX_DIMENSION: u32 = 4096;
pub const DEFAULT_JPEG_QUALITY: u8 = 90;
