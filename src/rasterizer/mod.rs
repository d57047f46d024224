//! Vector-to-raster conversion
//!
//! A [`Rasterizer`] turns SVG bytes into a square PNG (the intermediate
//! format). The [`RasterizationPipeline`] takes it from there: resize to the
//! exact target, re-encode, and derive the artifact's metadata.

use std::sync::Arc;

use crate::config::{RasterizerBackend, RasterizerConfig};
use crate::errors::RasterizeResult;
use crate::models::{LogoFormat, Sizing};

pub mod pipeline;
pub mod resvg_renderer;
pub mod rsvg;

pub use pipeline::{ArtifactMetadata, RasterizationPipeline, RasterizedArtifact};
pub use resvg_renderer::ResvgRasterizer;
pub use rsvg::RsvgConvertRasterizer;

/// What the rasterizer is asked to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub format: LogoFormat,
    pub sizing: Sizing,
    /// Normalized `RRGGBB`, empty for a transparent background
    pub background: String,
}

impl RenderRequest {
    /// Side of the square PNG the rasterizer must emit
    pub fn side(&self) -> u32 {
        self.sizing.render_side()
    }
}

/// Renders vector source bytes to a square PNG of `request.side()` pixels
#[async_trait::async_trait]
pub trait Rasterizer: Send + Sync {
    async fn render(&self, source: &[u8], request: &RenderRequest) -> RasterizeResult<Vec<u8>>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Build the configured rasterizer backend
pub fn from_config(config: &RasterizerConfig) -> Arc<dyn Rasterizer> {
    match config.backend {
        RasterizerBackend::RsvgConvert => Arc::new(RsvgConvertRasterizer::new(&config.command, config.timeout)),
        RasterizerBackend::Resvg => Arc::new(ResvgRasterizer::new()),
    }
}
