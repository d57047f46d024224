use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageFormat, RgbImage, RgbaImage};
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

use super::{Rasterizer, RenderRequest};
use crate::errors::{RasterizeError, RasterizeResult};
use crate::models::{LogoFormat, Sizing};
use crate::utils::artifact_file_name;
use crate::utils::color::rgb_or_white;

/// Facts about a generated artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactMetadata {
    /// Deterministic file name, see [`artifact_file_name`]
    pub file_name: String,
    pub format: LogoFormat,
    pub size_bytes: usize,
    /// SHA-256 of the encoded bytes, lowercase hex
    pub content_hash: String,
    pub width: u32,
    pub height: u32,
    /// Normalized background, empty when transparent
    pub background: String,
}

#[derive(Debug, Clone)]
pub struct RasterizedArtifact {
    pub bytes: Bytes,
    pub metadata: ArtifactMetadata,
}

/// Render, resample and re-encode a vector source into a raster artifact
///
/// Nothing is written anywhere: the caller stores the artifact only once the
/// whole pipeline has succeeded.
pub struct RasterizationPipeline {
    rasterizer: Arc<dyn Rasterizer>,
    jpeg_quality: u8,
}

impl RasterizationPipeline {
    pub fn new(rasterizer: Arc<dyn Rasterizer>, jpeg_quality: u8) -> Self {
        Self {
            rasterizer,
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub async fn rasterize(
        &self,
        source: &[u8],
        title: &str,
        format: LogoFormat,
        sizing: Sizing,
        background: &str,
    ) -> RasterizeResult<RasterizedArtifact> {
        if format.is_vector() {
            return Err(RasterizeError::UnsupportedFormat(format.to_string()));
        }

        let request = RenderRequest {
            format,
            sizing,
            background: background.to_string(),
        };
        let intermediate = self.rasterizer.render(source, &request).await?;
        if intermediate.is_empty() {
            return Err(RasterizeError::EmptyOutput);
        }
        debug!(
            "{} rendered {}px intermediate ({} bytes)",
            self.rasterizer.name(),
            request.side(),
            intermediate.len()
        );

        let quality = self.jpeg_quality;
        let (encoded, width, height) =
            tokio::task::spawn_blocking(move || finish(intermediate, request, quality))
                .await
                .map_err(|e| RasterizeError::TaskAborted(e.to_string()))??;

        let mut hasher = Sha256::new();
        hasher.update(&encoded);
        let metadata = ArtifactMetadata {
            file_name: artifact_file_name(title, sizing, background, format),
            format,
            size_bytes: encoded.len(),
            content_hash: format!("{:x}", hasher.finalize()),
            width,
            height,
            background: background.to_string(),
        };

        Ok(RasterizedArtifact {
            bytes: Bytes::from(encoded),
            metadata,
        })
    }
}

/// Resize (if needed) and encode the PNG intermediate into the target format
fn finish(intermediate: Vec<u8>, request: RenderRequest, quality: u8) -> RasterizeResult<(Vec<u8>, u32, u32)> {
    let (width, height) = request.sizing.dimensions();

    let mut image = image::load_from_memory_with_format(&intermediate, ImageFormat::Png)?;
    let already_sized = image.width() == width && image.height() == height;
    if already_sized && request.format == LogoFormat::Png {
        return Ok((intermediate, width, height));
    }
    if !already_sized {
        image = image.resize_exact(width, height, FilterType::CatmullRom);
    }

    let encoded = encode(&image, request.format, &request.background, quality)?;
    Ok((encoded, width, height))
}

fn encode(image: &DynamicImage, format: LogoFormat, background: &str, quality: u8) -> RasterizeResult<Vec<u8>> {
    let mut out = Vec::new();
    match format {
        LogoFormat::Png => {
            image.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
        }
        LogoFormat::Jpeg => {
            let flattened = flatten(&image.to_rgba8(), rgb_or_white(background));
            JpegEncoder::new_with_quality(&mut out, quality).encode_image(&flattened)?;
        }
        LogoFormat::Webp => {
            let rgba = image.to_rgba8();
            WebPEncoder::new_lossless(&mut out).encode(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
        LogoFormat::Svg => return Err(RasterizeError::UnsupportedFormat(format.to_string())),
    }
    Ok(out)
}

/// Composite onto an opaque background for formats without alpha
fn flatten(rgba: &RgbaImage, background: [u8; 3]) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let pixel = rgba.get_pixel(x, y).0;
        let alpha = u32::from(pixel[3]);
        let blend = |channel: usize| {
            let fg = u32::from(pixel[channel]) * alpha;
            let bg = u32::from(background[channel]) * (255 - alpha);
            ((fg + bg + 127) / 255) as u8
        };
        image::Rgb([blend(0), blend(1), blend(2)])
    })
}
