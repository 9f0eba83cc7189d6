use crate::assets::AssetLoader;
use crate::error::RenderError;
use crate::rendering::{LegendView, PatternView, SvgRenderer};
use crate::services::template_service::{TemplateService, LEGEND_TEMPLATE, PATTERN_TEMPLATE};
use bead_pattern::{LayoutGeometry, LegendEntry, PaletteSet, Pattern};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Printable export: the labelled chart followed by the legend, one SVG
/// page each.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExportDocument {
    pub title: String,
    pub pages: Vec<String>,
}

/// High-level render service that turns patterns into SVG and PNG
pub struct RenderService {
    templates: TemplateService,
    /// The SVG rasterizer, shared with blocking render tasks
    pub svg_renderer: Arc<SvgRenderer>,
    cell_px: u32,
}

impl RenderService {
    pub fn new(loader: &AssetLoader, cell_px: u32) -> Result<Self, RenderError> {
        Ok(Self {
            templates: TemplateService::new(loader)?,
            svg_renderer: Arc::new(SvgRenderer::with_fonts(loader.get_fonts())),
            cell_px: cell_px.max(1),
        })
    }

    pub fn cell_px(&self) -> u32 {
        self.cell_px
    }

    /// Bead chart with board lines.
    pub fn pattern_svg(
        &self,
        pattern: &Pattern,
        geometry: &LayoutGeometry,
        legend: &[LegendEntry],
        palette: &PaletteSet,
        show_labels: bool,
    ) -> Result<String, RenderError> {
        let view = PatternView::build(pattern, geometry, palette, legend, self.cell_px, show_labels);
        tracing::debug!(
            beads = view.beads.len(),
            width = view.width,
            height = view.height,
            "Rendering pattern SVG"
        );
        Ok(self.templates.render(PATTERN_TEMPLATE, &view)?)
    }

    pub fn legend_svg(&self, title: &str, legend: &[LegendEntry]) -> Result<String, RenderError> {
        let view = LegendView::build(title, legend);
        Ok(self.templates.render(LEGEND_TEMPLATE, &view)?)
    }

    pub fn document(
        &self,
        title: &str,
        pattern: &Pattern,
        geometry: &LayoutGeometry,
        legend: &[LegendEntry],
        palette: &PaletteSet,
    ) -> Result<ExportDocument, RenderError> {
        Ok(ExportDocument {
            title: title.to_string(),
            pages: vec![
                self.pattern_svg(pattern, geometry, legend, palette, true)?,
                self.legend_svg(title, legend)?,
            ],
        })
    }

    /// Rasterize an SVG to PNG
    ///
    /// Uses spawn_blocking to avoid blocking the async runtime during
    /// CPU-intensive SVG rendering.
    pub async fn render_png(&self, svg: String) -> Result<Vec<u8>, RenderError> {
        let renderer = self.svg_renderer.clone();

        tokio::task::spawn_blocking(move || renderer.render_to_png(svg.as_bytes()))
            .await
            .map_err(|e| RenderError::SvgParse(format!("Render task failed: {e}")))?
    }
}
