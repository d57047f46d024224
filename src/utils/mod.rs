//! Pure helpers shared by the resolver and the cleanup sweep

pub mod cache_key;
pub mod color;
pub mod naming;
pub mod path_codec;
pub mod redact;

pub use cache_key::CacheKey;
pub use color::normalize_color;
pub use naming::{ObjectLayout, ObjectPath, artifact_file_name};
pub use path_codec::{decode_path, encode_path};
pub use redact::redact_url;
