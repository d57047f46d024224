//! Artifact file names and object-store paths

use std::fmt;

use crate::models::{LogoFormat, Sizing};

/// Deterministic artifact file name
///
/// `<title>-logo-<size>px.<ext>` for squares, `<title>-logo-<w>px-<h>px.<ext>`
/// otherwise. A non-empty normalized background is appended as `-<RRGGBB>`.
pub fn artifact_file_name(title: &str, sizing: Sizing, background: &str, format: LogoFormat) -> String {
    let title = sanitize_segment(title);
    let dimensions = match sizing {
        Sizing::Square(size) => format!("{size}px"),
        Sizing::Exact { width, height } => format!("{width}px-{height}px"),
    };
    let background = if background.is_empty() {
        String::new()
    } else {
        format!("-{background}")
    };
    format!("{title}-logo-{dimensions}{background}.{}", format.extension())
}

/// Separators inside a single path segment would change the path's shape
fn sanitize_segment(segment: &str) -> String {
    segment.trim().replace(['/', '\\'], "_")
}

/// Prefixes that place source and generated artifacts in the object store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLayout {
    source_prefix: String,
    generated_prefix: String,
}

impl ObjectLayout {
    pub fn new<S: Into<String>>(source_prefix: S, generated_prefix: S) -> Self {
        Self {
            source_prefix: source_prefix.into().trim_matches('/').to_string(),
            generated_prefix: generated_prefix.into().trim_matches('/').to_string(),
        }
    }

    /// Where a canonical artifact listed in the metadata store lives
    pub fn source_path(&self, short_name: &str, resource_name: &str) -> ObjectPath {
        ObjectPath::new(&self.source_prefix, short_name, resource_name)
    }

    /// Where a generated artifact is written
    pub fn generated_path(&self, short_name: &str, file_name: &str) -> ObjectPath {
        ObjectPath::new(&self.generated_prefix, short_name, file_name)
    }
}

/// `<prefix>/<short_name>/<file_name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectPath {
    prefix: String,
    short_name: String,
    file_name: String,
}

impl ObjectPath {
    pub fn new(prefix: &str, short_name: &str, file_name: &str) -> Self {
        Self {
            prefix: prefix.trim_matches('/').to_string(),
            short_name: sanitize_segment(short_name),
            file_name: sanitize_segment(file_name),
        }
    }

    /// Split a stored path back into its components
    ///
    /// The prefix may itself contain `/`; the last two segments are always
    /// the short name and the file name.
    pub fn parse(path: &str) -> Option<Self> {
        let mut parts = path.trim_matches('/').rsplitn(3, '/');
        let file_name = parts.next().filter(|s| !s.is_empty())?;
        let short_name = parts.next().filter(|s| !s.is_empty())?;
        let prefix = parts.next().filter(|s| !s.is_empty())?;
        Some(Self {
            prefix: prefix.to_string(),
            short_name: short_name.to_string(),
            file_name: file_name.to_string(),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.prefix, self.short_name, self.file_name)
    }
}
