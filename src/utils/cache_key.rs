//! Deterministic cache keys for generated artifacts

use sha2::{Digest, Sha256};
use std::fmt;

use crate::models::{LogoFormat, LogoRequest, Sizing};

/// Stand-in for an empty (unset or unrecognized) background color, so every
/// such request hashes identically
pub const NO_COLOR_SENTINEL: &str = "NIL";

/// SHA-256 hex digest of everything that influences a rendered artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Hash the canonical parameter string
    ///
    /// `background` must already be normalized. Every field is always
    /// present so "unspecified" and "zero" cannot be confused.
    pub fn generate(
        name: &str,
        format: LogoFormat,
        background: &str,
        size: u32,
        width: u32,
        height: u32,
    ) -> Self {
        let background = if background.is_empty() {
            NO_COLOR_SENTINEL
        } else {
            background
        };
        let canonical = format!("name:{name}|fmt:{format}|bg:{background}|size:{size}|w:{width}|h:{height}");

        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Key for a raster request after its sizing has been resolved
    ///
    /// When `size` is in effect the ignored width/height hash as zero, so
    /// requests that render identically share a key.
    pub fn for_request(request: &LogoRequest, sizing: Sizing) -> Self {
        let (size, width, height) = match sizing {
            Sizing::Square(size) => (size, 0, 0),
            Sizing::Exact { width, height } => (0, width, height),
        };
        Self::generate(
            request.name.trim(),
            request.format,
            &request.normalized_background(),
            size,
            width,
            height,
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CacheKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}
