//! Legend construction and short bead labels
//!
//! Every bead color used in a pattern gets a label made of a category letter
//! and a rank, e.g. `A1`, `G3`. Categories group colors by hue family so
//! that similar beads share a letter:
//!
//! | Category | Rule |
//! |----------|------|
//! | K | saturation < 10% (greys) |
//! | L | lightness < 40% and saturation in [10%, 25%) (dark muted) |
//! | A | hue in [345°, 15°) |
//! | B | [15°, 45°) |
//! | C | [45°, 70°) |
//! | D | [70°, 100°) |
//! | E | [100°, 150°) |
//! | F | [150°, 190°) |
//! | G | [190°, 230°) |
//! | H | [230°, 265°) |
//! | I | [265°, 300°) |
//! | J | [300°, 345°) |
//!
//! Within a category the lightest color is ranked first; equal lightness
//! resolves by bead id.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::color::{Hsl, Rgb};
use crate::error::{PatternError, Result};
use crate::grid::{BackgroundMask, BeadGrid};
use crate::palette::PaletteSet;

/// One row of a pattern legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    pub bead_id: String,
    pub count: usize,
    pub hex: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub label: String,
}

/// Hue-family letter for a color.
pub fn category(hsl: Hsl) -> char {
    if hsl.s < 10.0 {
        return 'K';
    }
    if hsl.l < 40.0 && hsl.s < 25.0 {
        return 'L';
    }
    match hsl.h {
        h if !(15.0..345.0).contains(&h) => 'A',
        h if h < 45.0 => 'B',
        h if h < 70.0 => 'C',
        h if h < 100.0 => 'D',
        h if h < 150.0 => 'E',
        h if h < 190.0 => 'F',
        h if h < 230.0 => 'G',
        h if h < 265.0 => 'H',
        h if h < 300.0 => 'I',
        _ => 'J',
    }
}

/// Assign a label to every entry, keyed by bead id.
pub fn assign_labels(entries: &[LegendEntry]) -> HashMap<String, String> {
    let mut groups: HashMap<char, Vec<(&str, f64)>> = HashMap::new();
    for entry in entries {
        let hsl = match entry.hex.parse::<Rgb>() {
            Ok(rgb) => Hsl::from(rgb),
            Err(e) => {
                tracing::warn!(bead_id = %entry.bead_id, error = %e, "Unparseable legend color; labelling as grey");
                Hsl {
                    h: 0.0,
                    s: 0.0,
                    l: 0.0,
                }
            }
        };
        groups
            .entry(category(hsl))
            .or_default()
            .push((entry.bead_id.as_str(), hsl.l));
    }

    let mut labels = HashMap::with_capacity(entries.len());
    for (letter, mut members) in groups {
        members.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        for (rank, (id, _)) in members.into_iter().enumerate() {
            labels.insert(id.to_string(), format!("{letter}{}", rank + 1));
        }
    }
    labels
}

/// Count beads per id, skipping backdrop cells, and return labelled entries
/// sorted by descending count (ties by id).
pub fn build_legend(
    beads: &BeadGrid,
    mask: Option<&BackgroundMask>,
    palette: &PaletteSet,
) -> Result<Vec<LegendEntry>> {
    if let Some(mask) = mask {
        mask.ensure_dimensions(beads.width(), beads.height())?;
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (i, cell) in beads.cells().iter().enumerate() {
        let Some(id) = cell.as_deref() else { continue };
        if mask.is_some_and(|m| m.cells()[i]) {
            continue;
        }
        *counts.entry(id).or_default() += 1;
    }

    let mut entries = counts
        .into_iter()
        .map(|(id, count)| {
            let color = palette
                .get(id)
                .ok_or_else(|| PatternError::UnknownBeadId(id.to_string()))?;
            Ok(LegendEntry {
                bead_id: id.to_string(),
                count,
                hex: color.hex.clone(),
                name: color.name.clone(),
                code: color.code.clone(),
                label: String::new(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.bead_id.cmp(&b.bead_id)));

    let labels = assign_labels(&entries);
    for entry in &mut entries {
        if let Some(label) = labels.get(&entry.bead_id) {
            entry.label.clone_from(label);
        }
    }
    Ok(entries)
}

/// Total bead count over a legend.
pub fn total_beads(entries: &[LegendEntry]) -> usize {
    entries.iter().map(|e| e.count).sum()
}
