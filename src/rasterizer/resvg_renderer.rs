use resvg::{tiny_skia, usvg};

use super::{Rasterizer, RenderRequest};
use crate::errors::{RasterizeError, RasterizeResult};
use crate::utils::color::rgb_or_white;

/// In-process rasterizer built on resvg
///
/// Stretches the SVG viewport onto the square target, like
/// `rsvg-convert --width N --height N`. Text needs fonts, and none are
/// loaded, so logos relying on `<text>` should be converted to paths.
#[derive(Debug, Clone, Default)]
pub struct ResvgRasterizer;

impl ResvgRasterizer {
    pub fn new() -> Self {
        Self
    }

    fn render_png(source: &[u8], side: u32, background: &str) -> RasterizeResult<Vec<u8>> {
        let tree = usvg::Tree::from_data(source, &usvg::Options::default())
            .map_err(|e| RasterizeError::InvalidSource(e.to_string()))?;

        let mut pixmap = tiny_skia::Pixmap::new(side, side).ok_or(RasterizeError::EmptyOutput)?;
        if !background.is_empty() {
            let [r, g, b] = rgb_or_white(background);
            pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, 255));
        }

        let size = tree.size();
        let transform = tiny_skia::Transform::from_scale(
            side as f32 / size.width(),
            side as f32 / size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        pixmap
            .encode_png()
            .map_err(|e| RasterizeError::Encode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Rasterizer for ResvgRasterizer {
    async fn render(&self, source: &[u8], request: &RenderRequest) -> RasterizeResult<Vec<u8>> {
        let source = source.to_vec();
        let side = request.side();
        let background = request.background.clone();
        tokio::task::spawn_blocking(move || Self::render_png(&source, side, &background))
            .await
            .map_err(|e| RasterizeError::TaskAborted(e.to_string()))?
    }

    fn name(&self) -> &'static str {
        "resvg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LogoFormat, Sizing};

    const RED_SQUARE: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="#ff0000"/></svg>"##;
    const HALF_EMPTY: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="5" height="10" fill="#0000ff"/></svg>"##;

    fn request(side: u32, background: &str) -> RenderRequest {
        RenderRequest {
            format: LogoFormat::Png,
            sizing: Sizing::Square(side),
            background: background.to_string(),
        }
    }

    #[tokio::test]
    async fn test_renders_square_png_at_requested_side() {
        let png = ResvgRasterizer::new().render(RED_SQUARE, &request(32, "")).await.unwrap();
        let image = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (32, 32));
        assert_eq!(image.get_pixel(16, 16).0, [255, 0, 0, 255]);
    }

    #[tokio::test]
    async fn test_background_fills_uncovered_area() {
        let png = ResvgRasterizer::new()
            .render(HALF_EMPTY, &request(20, "00FF00"))
            .await
            .unwrap();
        let image = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(image.get_pixel(2, 10).0, [0, 0, 255, 255]);
        assert_eq!(image.get_pixel(18, 10).0, [0, 255, 0, 255]);

        let transparent = ResvgRasterizer::new().render(HALF_EMPTY, &request(20, "")).await.unwrap();
        let image = image::load_from_memory(&transparent).unwrap().to_rgba8();
        assert_eq!(image.get_pixel(18, 10).0[3], 0);
    }

    #[tokio::test]
    async fn test_invalid_source() {
        let err = ResvgRasterizer::new()
            .render(b"definitely not svg", &request(20, ""))
            .await
            .unwrap_err();
        assert!(matches!(err, RasterizeError::InvalidSource(_)));
    }
}
