//! Logical logo requests and the formats they can ask for

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};

use crate::errors::{AppError, AppResult};
use crate::utils::color::normalize_color;

/// Output formats the service understands
///
/// `Svg` is the canonical vector format; every other variant is a raster
/// target produced by the rasterization pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogoFormat {
    Svg,
    Png,
    #[strum(to_string = "jpg", serialize = "jpeg")]
    Jpeg,
    Webp,
}

impl LogoFormat {
    /// File extension used for artifact names
    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }

    /// Spellings a metadata row may carry for this format
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Svg => &["svg"],
            Self::Png => &["png"],
            Self::Jpeg => &["jpg", "jpeg"],
            Self::Webp => &["webp"],
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }

    pub fn is_vector(self) -> bool {
        matches!(self, Self::Svg)
    }

    /// Match a stored `resource_type` value, ignoring case and the jpg/jpeg split
    pub fn matches_stored(self, stored: &str) -> bool {
        LogoFormat::from_str(stored.trim()).is_ok_and(|format| format == self)
    }
}

impl Serialize for LogoFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.extension())
    }
}

impl<'de> Deserialize<'de> for LogoFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        LogoFormat::from_str(raw.trim())
            .map_err(|_| serde::de::Error::custom(format!("unsupported logo format '{raw}'")))
    }
}

/// The single sizing mode handed to the rasterizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sizing {
    /// `size x size`
    Square(u32),
    /// Explicit width and height
    Exact { width: u32, height: u32 },
}

impl Sizing {
    /// Resolve the request's optional sizing fields; `size` wins when set
    pub fn from_parts(size: Option<u32>, width: Option<u32>, height: Option<u32>) -> Option<Self> {
        match (size, width, height) {
            (Some(size), _, _) if size > 0 => Some(Self::Square(size)),
            (_, Some(width), Some(height)) if width > 0 && height > 0 => {
                Some(Self::Exact { width, height })
            }
            _ => None,
        }
    }

    /// Side of the square the vector source is rendered at
    pub fn render_side(self) -> u32 {
        match self {
            Self::Square(size) => size,
            Self::Exact { width, height } => width.min(height),
        }
    }

    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Square(size) => (size, size),
            Self::Exact { width, height } => (width, height),
        }
    }

    /// True when the rendered square has to be resampled to reach the target
    pub fn needs_resize(self) -> bool {
        let (width, height) = self.dimensions();
        let side = self.render_side();
        width != side || height != side
    }

    fn largest_side(self) -> u32 {
        let (width, height) = self.dimensions();
        width.max(height)
    }
}

/// A logical logo request as received from a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoRequest {
    /// Institution short name or title
    pub name: String,
    #[serde(rename = "type")]
    pub format: LogoFormat,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default, rename = "bg")]
    pub background: Option<String>,
}

impl LogoRequest {
    pub fn new<S: Into<String>>(name: S, format: LogoFormat) -> Self {
        Self {
            name: name.into(),
            format,
            size: None,
            width: None,
            height: None,
            background: None,
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_background<S: Into<String>>(mut self, background: S) -> Self {
        self.background = Some(background.into());
        self
    }

    pub fn sizing(&self) -> Option<Sizing> {
        Sizing::from_parts(self.size, self.width, self.height)
    }

    /// Background color in canonical `RRGGBB` form, or empty when unset/unknown
    pub fn normalized_background(&self) -> String {
        self.background.as_deref().map(normalize_color).unwrap_or_default()
    }

    /// Check the request and return the sizing a raster target will use
    ///
    /// Vector requests ignore sizing and always yield `None`.
    pub fn validate(&self, max_dimension: u32) -> AppResult<Option<Sizing>> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("logo name must not be empty"));
        }
        if self.format.is_vector() {
            return Ok(None);
        }

        let sizing = self.sizing().ok_or_else(|| {
            AppError::validation(format!(
                "{} logos need either a size or both width and height",
                self.format
            ))
        })?;
        if sizing.largest_side() > max_dimension {
            return Err(AppError::validation(format!(
                "requested dimensions {:?} exceed the maximum of {max_dimension}px",
                sizing.dimensions()
            )));
        }
        Ok(Some(sizing))
    }
}
