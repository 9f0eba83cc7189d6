use crate::error::RenderError;
use resvg::usvg::{self, Transform};
use std::borrow::Cow;
use std::io::Cursor;
use std::sync::Arc;
use tiny_skia::Pixmap;

/// Largest side of a rendered image, in pixels.
pub const MAX_RENDER_SIDE: u32 = 16_384;

/// Rasterizes pattern and legend SVGs to RGB PNGs.
///
/// The SVG is rendered at its own size onto a white canvas, so the output
/// has no transparency.
pub struct SvgRenderer {
    /// Font database for text rendering
    fontdb: Arc<fontdb::Database>,
}

impl SvgRenderer {
    /// Create a new SVG renderer with fonts loaded from the provided data
    pub fn with_fonts(fonts: Vec<(String, Cow<'static, [u8]>)>) -> Self {
        let mut fontdb = fontdb::Database::new();

        for (name, data) in fonts {
            fontdb.load_font_data(data.into_owned());
            tracing::debug!(font = %name, "Loaded font");
        }

        // System fonts as fallback
        fontdb.load_system_fonts();

        tracing::info!(
            font_count = fontdb.len(),
            "Loaded fonts for SVG text rendering"
        );

        Self {
            fontdb: Arc::new(fontdb),
        }
    }

    /// Create a new SVG renderer with system fonts only
    pub fn new() -> Self {
        Self::with_fonts(Vec::new())
    }

    pub fn font_count(&self) -> usize {
        self.fontdb.len()
    }

    /// Render SVG to an 8-bit RGB PNG.
    pub fn render_to_png(&self, svg_data: &[u8]) -> Result<Vec<u8>, RenderError> {
        let pixmap = self.rasterize_svg(svg_data)?;
        encode_png(&pixmap)
    }

    /// Parse and rasterize SVG to an RGBA pixmap at its natural size
    fn rasterize_svg(&self, svg_data: &[u8]) -> Result<Pixmap, RenderError> {
        let options = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_data(svg_data, &options)
            .map_err(|e| RenderError::SvgParse(e.to_string()))?;

        let size = tree.size();
        let width = size.width().ceil() as u32;
        let height = size.height().ceil() as u32;
        if width == 0 || height == 0 || width > MAX_RENDER_SIDE || height > MAX_RENDER_SIDE {
            return Err(RenderError::UnsupportedDimensions { width, height });
        }

        let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::PixmapAllocation)?;
        pixmap.fill(tiny_skia::Color::WHITE);
        resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

        Ok(pixmap)
    }
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode an opaque pixmap as RGB PNG.
///
/// The canvas is filled white before rendering, so premultiplied and
/// straight color agree and the alpha channel can be dropped.
fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, RenderError> {
    let rgb: Vec<u8> = pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();

    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, pixmap.width(), pixmap.height());
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::PngEncode(e.to_string()))?;
        writer
            .write_image_data(&rgb)
            .map_err(|e| RenderError::PngEncode(e.to_string()))?;
    }
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(png_bytes: &[u8]) -> (png::OutputInfo, Vec<u8>) {
        let decoder = png::Decoder::new(Cursor::new(png_bytes));
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        buf.truncate(info.buffer_size());
        (info, buf)
    }

    #[test]
    fn test_renders_at_svg_size() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10">
            <rect x="10" width="10" height="10" fill="#ff0000"/>
        </svg>"##;
        let png = SvgRenderer::new().render_to_png(svg.as_bytes()).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let (info, pixels) = decode(&png);
        assert_eq!((info.width, info.height), (20, 10));
        assert_eq!(info.color_type, png::ColorType::Rgb);
        // left half stays on the white canvas, right half is red
        assert_eq!(&pixels[0..3], &[255, 255, 255]);
        let right = (5 * 20 + 15) * 3;
        assert_eq!(&pixels[right..right + 3], &[255, 0, 0]);
    }

    #[test]
    fn test_invalid_svg() {
        let result = SvgRenderer::new().render_to_png(b"<not-svg");
        assert!(matches!(result, Err(RenderError::SvgParse(_))));
    }

    #[test]
    fn test_oversized_svg_rejected() {
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="4"/>"#,
            MAX_RENDER_SIDE + 1
        );
        let result = SvgRenderer::new().render_to_png(svg.as_bytes());
        assert!(matches!(
            result,
            Err(RenderError::UnsupportedDimensions { height: 4, .. })
        ));
    }
}
