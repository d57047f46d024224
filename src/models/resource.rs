use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::LogoFormat;

/// A logo artifact known to the metadata store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    pub id: i32,
    /// Display title of the institution, used in artifact names
    pub title: String,
    /// Institution short name, used as the object path segment
    pub short_name: String,
    /// File name of the artifact under `<source_prefix>/<short_name>/`
    pub resource_name: String,
    /// Stored format spelling (`svg`, `png`, `jpg`, ...)
    pub resource_type: String,
    pub content_hash: String,
    pub size_bytes: Option<i64>,
    pub is_vector: bool,
    pub width: Option<i32>,
    pub height: Option<i32>,
    /// Designated fallback source for the institution
    pub used_for_edge: bool,
    /// Normalized background color, empty for none
    pub background_color: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ResourceMetadata {
    /// Parsed stored format, if it is one the service understands
    pub fn format(&self) -> Option<LogoFormat> {
        self.resource_type.trim().parse().ok()
    }

    /// Can this row be fed to the rasterizer
    pub fn is_vector_source(&self) -> bool {
        self.is_vector || self.format().is_some_and(LogoFormat::is_vector)
    }
}

/// Insert payload for a canonical resource row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResource {
    pub title: String,
    pub short_name: String,
    pub resource_name: String,
    pub resource_type: String,
    #[serde(default)]
    pub content_hash: String,
    pub size_bytes: Option<i64>,
    #[serde(default)]
    pub is_vector: bool,
    pub width: Option<i32>,
    pub height: Option<i32>,
    #[serde(default)]
    pub used_for_edge: bool,
    #[serde(default)]
    pub background_color: String,
}

impl NewResource {
    /// Canonical vector source for an institution, marked as its fallback
    pub fn vector_source<S: Into<String>>(title: S, short_name: S, resource_name: S) -> Self {
        Self {
            title: title.into(),
            short_name: short_name.into(),
            resource_name: resource_name.into(),
            resource_type: LogoFormat::Svg.extension().to_string(),
            content_hash: String::new(),
            size_bytes: None,
            is_vector: true,
            width: None,
            height: None,
            used_for_edge: true,
            background_color: String::new(),
        }
    }

    /// Pre-rendered bitmap for an institution at a fixed resolution
    pub fn bitmap<S: Into<String>>(
        title: S,
        short_name: S,
        resource_name: S,
        format: LogoFormat,
        width: i32,
        height: i32,
    ) -> Self {
        Self {
            title: title.into(),
            short_name: short_name.into(),
            resource_name: resource_name.into(),
            resource_type: format.extension().to_string(),
            content_hash: String::new(),
            size_bytes: None,
            is_vector: false,
            width: Some(width),
            height: Some(height),
            used_for_edge: false,
            background_color: String::new(),
        }
    }

    pub fn with_background<S: Into<String>>(mut self, background: S) -> Self {
        self.background_color = background.into();
        self
    }
}
