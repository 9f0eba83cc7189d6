//! Template contexts for the pattern and legend SVGs.
//!
//! These turn a [`Pattern`] and its computed layout into plain pixel
//! coordinates so the templates only have to loop and print.

use std::collections::HashMap;

use bead_pattern::{LayoutGeometry, LegendEntry, PaletteSet, Pattern, Rgb};
use serde::Serialize;

const BACKGROUND: &str = "#ffffff";

/// One bead drawn on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeadView {
    pub cx: f64,
    pub cy: f64,
    /// Baseline of the label text
    pub label_y: f64,
    pub hex: String,
    pub label: String,
    /// Text color readable on top of `hex`
    pub ink: &'static str,
}

/// Context for `pattern.svg`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternView {
    pub width: u32,
    pub height: u32,
    pub background: &'static str,
    pub radius: f64,
    pub hole: f64,
    pub show_labels: bool,
    pub label_size: f64,
    pub beads: Vec<BeadView>,
    pub vertical_lines: Vec<u32>,
    pub horizontal_lines: Vec<u32>,
}

impl PatternView {
    /// Place every visible bead of `pattern` on the board canvas.
    ///
    /// Backdrop cells are skipped when the layout removes the background;
    /// unmapped cells are always skipped.
    pub fn build(
        pattern: &Pattern,
        geometry: &LayoutGeometry,
        palette: &PaletteSet,
        legend: &[LegendEntry],
        cell_px: u32,
        show_labels: bool,
    ) -> Self {
        let cell = cell_px.max(1);
        let labels: HashMap<&str, &str> = legend
            .iter()
            .map(|e| (e.bead_id.as_str(), e.label.as_str()))
            .collect();

        let size = cell as f64;
        let label_size = size * 0.38;
        let mut beads = Vec::new();
        for place in geometry.cells() {
            let (x, y) = (place.source_x, place.source_y);
            if geometry.remove_background && pattern.mask.is_background(x, y) {
                continue;
            }
            let Some(id) = pattern.beads.bead_at(x, y) else {
                continue;
            };
            let Some(color) = palette.get(id) else {
                tracing::warn!(bead_id = id, x, y, "Bead not in active palette; not drawn");
                continue;
            };
            let rgb = palette.rgb_of(id).unwrap_or(Rgb::BLACK);
            let cy = (place.canvas_y as f64 + 0.5) * size;
            beads.push(BeadView {
                cx: (place.canvas_x as f64 + 0.5) * size,
                cy,
                label_y: cy + label_size * 0.35,
                hex: rgb.to_hex(),
                label: labels.get(color.id.as_str()).copied().unwrap_or_default().to_string(),
                ink: ink_for(rgb),
            });
        }

        let scale = |lines: Vec<usize>| lines.into_iter().map(|l| l as u32 * cell).collect();
        Self {
            width: (geometry.board_grid_width as u32 * cell).max(1),
            height: (geometry.board_grid_height as u32 * cell).max(1),
            background: BACKGROUND,
            radius: size * 0.45,
            hole: size * 0.15,
            show_labels,
            label_size,
            beads,
            vertical_lines: scale(geometry.vertical_board_lines()),
            horizontal_lines: scale(geometry.horizontal_board_lines()),
        }
    }
}

/// Black on light colors, white on dark ones.
pub fn ink_for(rgb: Rgb) -> &'static str {
    let luma = (299 * rgb.r as u32 + 587 * rgb.g as u32 + 114 * rgb.b as u32) / 1000;
    if luma >= 140 {
        "#000000"
    } else {
        "#ffffff"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendColumns {
    pub label: u32,
    pub swatch: u32,
    pub name: u32,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendRow {
    pub y: u32,
    pub label: String,
    pub hex: String,
    pub name: String,
    pub code: Option<String>,
    pub count: usize,
}

/// Context for `legend.svg`: one row per bead color plus a total row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendView {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub title: String,
    pub header_y: u32,
    pub columns: LegendColumns,
    pub rows: Vec<LegendRow>,
    pub total_y: u32,
    pub total: usize,
}

const LEGEND_WIDTH: u32 = 480;
const LEGEND_MARGIN: u32 = 24;
const LEGEND_HEADER_Y: u32 = 72;
const LEGEND_ROW_HEIGHT: u32 = 26;

impl LegendView {
    pub fn build(title: &str, legend: &[LegendEntry]) -> Self {
        let first_row = LEGEND_HEADER_Y + LEGEND_ROW_HEIGHT + 4;
        let rows: Vec<LegendRow> = legend
            .iter()
            .enumerate()
            .map(|(i, e)| LegendRow {
                y: first_row + i as u32 * LEGEND_ROW_HEIGHT,
                label: e.label.clone(),
                hex: e.hex.clone(),
                name: e.name.clone(),
                code: e.code.clone(),
                count: e.count,
            })
            .collect();
        let total_y = first_row + rows.len() as u32 * LEGEND_ROW_HEIGHT + 12;

        Self {
            width: LEGEND_WIDTH,
            height: total_y + LEGEND_MARGIN,
            margin: LEGEND_MARGIN,
            title: title.to_string(),
            header_y: LEGEND_HEADER_Y,
            columns: LegendColumns {
                label: LEGEND_MARGIN,
                swatch: LEGEND_MARGIN + 56,
                name: LEGEND_MARGIN + 96,
                count: LEGEND_WIDTH - LEGEND_MARGIN,
            },
            rows,
            total_y,
            total: bead_pattern::legend::total_beads(legend),
        }
    }
}
