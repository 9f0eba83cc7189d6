//! Pixel color to bead assignment
//!
//! A [`ColorMapping`] maps every distinct source color (lowercase
//! `#rrggbb` key) to a bead id. It starts out filled by the matcher and
//! then accumulates user overrides. Every change goes through one of the
//! explicit operations below, each of which reports what it touched.
//!
//! | Operation | Keys written | Overrides |
//! |-----------|--------------|-----------|
//! | [`auto_match`](ColorMapping::auto_match) `only_empty = true` | unmapped keys | kept |
//! | [`auto_match`](ColorMapping::auto_match) `only_empty = false` | all keys | cleared for written keys |
//! | [`set_override`](ColorMapping::set_override) | one key | key marked |
//! | [`reset_all`](ColorMapping::reset_all) | all keys | cleared |
//! | [`on_palette_change`](ColorMapping::on_palette_change) | all keys | cleared, count logged |

use std::collections::{BTreeMap, BTreeSet};

use crate::color::{DistanceMode, Rgb};
use crate::error::{PatternError, Result};
use crate::grid::{BeadGrid, Grid, PixelGrid};
use crate::palette::{PaletteMatcher, PaletteSet};

/// Hex key to bead id, with the set of user-overridden keys.
///
/// ```
/// use bead_pattern::grid::PixelGrid;
/// use bead_pattern::{ColorMapping, DistanceMode, PaletteColor, PaletteSet, Rgb};
///
/// let palette = PaletteSet::from_colors([
///     PaletteColor::new("black", "Black", "#000000"),
///     PaletteColor::new("white", "White", "#ffffff"),
/// ]);
/// let pixels = PixelGrid::from_fn(2, 1, |x, _| if x == 0 { Rgb::new(20, 20, 20) } else { Rgb::WHITE });
///
/// let mut mapping = ColorMapping::new();
/// mapping.auto_match(&pixels, &palette, DistanceMode::Rgb, false).unwrap();
/// assert_eq!(mapping.get("#141414"), Some("black"));
///
/// mapping.set_override("#141414", "white", &palette).unwrap();
/// assert!(mapping.is_overridden("#141414"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorMapping {
    entries: BTreeMap<String, String>,
    overrides: BTreeSet<String>,
}

/// Lowercase `#rrggbb` form of any accepted hex spelling.
pub fn normalize_key(key: &str) -> Result<String> {
    Ok(key.parse::<Rgb>()?.to_hex())
}

impl ColorMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted parts. Keys are normalized; override keys
    /// without an entry are dropped.
    pub fn from_parts(
        entries: impl IntoIterator<Item = (String, String)>,
        overrides: impl IntoIterator<Item = String>,
    ) -> Result<Self> {
        let entries = entries
            .into_iter()
            .map(|(k, v)| Ok((normalize_key(&k)?, v)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        let overrides = overrides
            .into_iter()
            .map(|k| normalize_key(&k))
            .collect::<Result<BTreeSet<_>>>()?
            .into_iter()
            .filter(|k| entries.contains_key(k))
            .collect();
        Ok(Self { entries, overrides })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn bead_for(&self, color: Rgb) -> Option<&str> {
        self.get(&color.to_hex())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_overridden(&self, key: &str) -> bool {
        self.overrides.contains(key)
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    pub fn overrides(&self) -> &BTreeSet<String> {
        &self.overrides
    }

    /// Match every distinct color of `pixels`. With `only_empty`, keys that
    /// already have a bead are left alone. Returns the number of keys
    /// written.
    pub fn auto_match(
        &mut self,
        pixels: &PixelGrid,
        palette: &PaletteSet,
        mode: DistanceMode,
        only_empty: bool,
    ) -> Result<usize> {
        let matcher = PaletteMatcher::new(mode);
        let mut written = 0;
        for color in pixels.distinct_colors() {
            let key = color.to_hex();
            if only_empty && self.entries.contains_key(&key) {
                continue;
            }
            let bead = matcher.match_pixel(color, palette)?;
            self.overrides.remove(&key);
            self.entries.insert(key, bead.id.clone());
            written += 1;
        }
        tracing::debug!(written, only_empty, %mode, "Auto-matched colors");
        Ok(written)
    }

    /// Pin `key` to `bead_id`.
    pub fn set_override(&mut self, key: &str, bead_id: &str, palette: &PaletteSet) -> Result<()> {
        let key = normalize_key(key)?;
        if !palette.contains(bead_id) {
            return Err(PatternError::UnknownBeadId(bead_id.to_string()));
        }
        tracing::debug!(%key, bead_id, "Color override set");
        self.entries.insert(key.clone(), bead_id.to_string());
        self.overrides.insert(key);
        Ok(())
    }

    /// Drop every override and rematch all colors of `pixels` from scratch.
    pub fn reset_all(
        &mut self,
        pixels: &PixelGrid,
        palette: &PaletteSet,
        mode: DistanceMode,
    ) -> Result<usize> {
        let mut fresh = Self::new();
        let written = fresh.auto_match(pixels, palette, mode, false)?;
        *self = fresh;
        Ok(written)
    }

    /// Rematch after the active palettes or the distance mode changed.
    ///
    /// Every key is overwritten, user overrides included.
    pub fn on_palette_change(
        &mut self,
        pixels: &PixelGrid,
        palette: &PaletteSet,
        mode: DistanceMode,
    ) -> Result<usize> {
        let discarded = self.overrides.len();
        let written = self.reset_all(pixels, palette, mode)?;
        if discarded > 0 {
            tracing::warn!(
                discarded,
                "Palette or distance change replaced user color overrides"
            );
        }
        Ok(written)
    }

    /// Fail with `UnknownBeadId` if any entry names a bead outside
    /// `palette`.
    pub fn validate(&self, palette: &PaletteSet) -> Result<()> {
        match self.entries.values().find(|id| !palette.contains(id)) {
            Some(id) => Err(PatternError::UnknownBeadId(id.clone())),
            None => Ok(()),
        }
    }

    /// One bead id per pixel; colors without an entry stay empty.
    pub fn bead_grid(&self, pixels: &PixelGrid) -> BeadGrid {
        Grid::from_fn(pixels.width(), pixels.height(), |x, y| {
            self.bead_for(pixels.pixel(x, y)).map(str::to_string)
        })
    }
}
