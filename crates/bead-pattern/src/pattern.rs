//! Image to pattern pipeline.
//!
//! [`PatternBuilder`] runs the full chain on a decoded image:
//! grid detection and resampling when the image is larger than the bead
//! limit, a forced downsample if it is still too large, palette matching,
//! then background segmentation. The result is a [`Pattern`], whose derived
//! parts are recomputed through [`Pattern::refresh`] whenever the mapping
//! changes.

use crate::color::DistanceMode;
use crate::error::{PatternError, Result};
use crate::grid::{fit_within, resample, BackgroundMask, BeadGrid, GridDetector, GridInfo, PixelGrid};
use crate::layout::{layout, LayoutGeometry, LayoutOptions};
use crate::legend::{build_legend, LegendEntry};
use crate::mapping::ColorMapping;
use crate::palette::PaletteSet;
use crate::segment::segment;

/// Largest recommended pattern side, in beads.
pub const DEFAULT_MAX_DIMENSION: usize = 200;

/// A converted image with everything derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    /// Size of the image as decoded, before any resampling
    pub source_width: usize,
    pub source_height: usize,
    pub grid_info: GridInfo,
    /// One pixel per bead
    pub pixels: PixelGrid,
    pub mapping: ColorMapping,
    pub beads: BeadGrid,
    pub mask: BackgroundMask,
}

impl Pattern {
    /// Assemble a pattern from already resampled pixels and a mapping,
    /// deriving the bead grid and background mask.
    pub fn from_parts(
        pixels: PixelGrid,
        mapping: ColorMapping,
        grid_info: GridInfo,
        source_size: (usize, usize),
    ) -> Result<Self> {
        let beads = mapping.bead_grid(&pixels);
        let mask = segment(&beads, pixels.alpha())?;
        Ok(Self {
            source_width: source_size.0,
            source_height: source_size.1,
            grid_info,
            pixels,
            mapping,
            beads,
            mask,
        })
    }

    pub fn width(&self) -> usize {
        self.pixels.width()
    }

    pub fn height(&self) -> usize {
        self.pixels.height()
    }

    /// Recompute the bead grid and mask after the mapping changed.
    pub fn refresh(&mut self) -> Result<()> {
        self.beads = self.mapping.bead_grid(&self.pixels);
        self.mask = segment(&self.beads, self.pixels.alpha())?;
        Ok(())
    }

    /// Legend of the beads used. Backdrop cells are excluded unless
    /// `remove_background` is off.
    pub fn legend(&self, palette: &PaletteSet, remove_background: bool) -> Result<Vec<LegendEntry>> {
        let mask = remove_background.then_some(&self.mask);
        build_legend(&self.beads, mask, palette)
    }

    pub fn layout(&self, options: LayoutOptions) -> Result<LayoutGeometry> {
        layout(&self.mask, options)
    }

    /// Cells that would actually receive a bead.
    pub fn bead_count(&self, remove_background: bool) -> usize {
        self.beads
            .cells()
            .iter()
            .zip(self.mask.cells())
            .filter(|(bead, &bg)| bead.is_some() && !(remove_background && bg))
            .count()
    }
}

/// Configures and runs the pipeline against one palette set.
#[derive(Debug, Clone)]
pub struct PatternBuilder<'a> {
    palette: &'a PaletteSet,
    distance: DistanceMode,
    max_dimension: usize,
    detector: GridDetector,
}

impl<'a> PatternBuilder<'a> {
    pub fn new(palette: &'a PaletteSet) -> Self {
        Self {
            palette,
            distance: DistanceMode::default(),
            max_dimension: DEFAULT_MAX_DIMENSION,
            detector: GridDetector::default(),
        }
    }

    pub fn distance(mut self, mode: DistanceMode) -> Self {
        self.distance = mode;
        self
    }

    pub fn max_dimension(mut self, max_dimension: usize) -> Self {
        self.max_dimension = max_dimension.max(1);
        self
    }

    pub fn detector(mut self, detector: GridDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Convert a decoded image into a pattern.
    pub fn build(&self, source: &PixelGrid) -> Result<Pattern> {
        if self.palette.is_empty() {
            return Err(PatternError::NoPaletteColors);
        }
        let (width, height) = source.dimensions();

        let (working, grid_info) = if width.max(height) > self.max_dimension {
            let info = self.detector.detect_info(source);
            match info.square_cell().filter(|&n| n > 1) {
                Some(n) => (resample(source, n)?, info),
                None => (source.clone(), info),
            }
        } else {
            (source.clone(), identity_grid(width, height))
        };

        let working = if working.width().max(working.height()) > self.max_dimension {
            fit_within(&working, self.max_dimension)
        } else {
            working
        };

        let mut mapping = ColorMapping::new();
        let colors = mapping.auto_match(&working, self.palette, self.distance, false)?;

        tracing::info!(
            source_width = width,
            source_height = height,
            width = working.width(),
            height = working.height(),
            cell_size = grid_info.cell_width,
            colors,
            distance = %self.distance,
            "Pattern built"
        );

        Pattern::from_parts(working, mapping, grid_info, (width, height))
    }
}

/// Grid info for an image used as-is.
pub fn identity_grid(width: usize, height: usize) -> GridInfo {
    GridInfo {
        cell_width: 1,
        cell_height: 1,
        offset_x: 0,
        offset_y: 0,
        columns: width,
        rows: height,
        confidence: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::palette::PaletteColor;

    fn palette() -> PaletteSet {
        PaletteSet::from_colors([
            PaletteColor::new("white", "White", "#ffffff"),
            PaletteColor::new("black", "Black", "#000000"),
            PaletteColor::new("red", "Red", "#ff0000"),
        ])
    }

    /// White canvas with a red square and a few dark specks.
    fn sprite(size: usize) -> PixelGrid {
        PixelGrid::from_fn(size, size, |x, y| {
            if (2..size - 2).contains(&x) && (2..size - 2).contains(&y) {
                Rgb::new(250, 5, 5)
            } else if (x + y) % 7 == 0 {
                Rgb::new(5, 5, 5)
            } else {
                Rgb::WHITE
            }
        })
    }

    #[test]
    fn test_small_image_is_used_as_is() {
        let set = palette();
        let pattern = PatternBuilder::new(&set)
            .distance(DistanceMode::Rgb)
            .build(&sprite(10))
            .unwrap();
        assert_eq!(pattern.pixels.dimensions(), (10, 10));
        assert!(pattern.grid_info.is_identity());
        assert_eq!(pattern.beads.bead_at(5, 5), Some("red"));
    }

    #[test]
    fn test_upscaled_image_is_resampled() {
        // neighbouring cells always differ, so only the true scale is uniform
        let ids = ["white", "black", "red"];
        let colors = [Rgb::WHITE, Rgb::BLACK, Rgb::new(250, 5, 5)];
        let upscaled = PixelGrid::from_fn(80, 80, |x, y| colors[(x / 4 + 2 * (y / 4)) % 3]);

        let set = palette();
        let pattern = PatternBuilder::new(&set)
            .max_dimension(50)
            .detector(GridDetector::with_seed(11))
            .build(&upscaled)
            .unwrap();
        assert_eq!(pattern.grid_info.cell_width, 4);
        assert_eq!(pattern.pixels.dimensions(), (20, 20));
        assert_eq!((pattern.source_width, pattern.source_height), (80, 80));
        for (x, y) in [(0, 0), (3, 1), (10, 10), (19, 7)] {
            assert_eq!(pattern.beads.bead_at(x, y), Some(ids[(x + 2 * y) % 3]));
        }
    }

    #[test]
    fn test_oversized_noise_is_forced_down() {
        let set = palette();
        let noise = PixelGrid::from_fn(301, 97, |x, y| {
            if (x * 7 + y * 3) % 5 == 0 {
                Rgb::BLACK
            } else {
                Rgb::WHITE
            }
        });
        let pattern = PatternBuilder::new(&set)
            .max_dimension(100)
            .detector(GridDetector::with_seed(0))
            .build(&noise)
            .unwrap();
        assert_eq!(pattern.grid_info.cell_width, 1);
        assert!(pattern.width() <= 100 && pattern.height() <= 100);
    }

    #[test]
    fn test_empty_palette() {
        let set = PaletteSet::default();
        assert_eq!(
            PatternBuilder::new(&set).build(&sprite(6)),
            Err(PatternError::NoPaletteColors)
        );
    }

    #[test]
    fn test_refresh_after_override() {
        let set = palette();
        let mut pattern = PatternBuilder::new(&set)
            .distance(DistanceMode::Rgb)
            .build(&sprite(10))
            .unwrap();
        pattern
            .mapping
            .set_override(&Rgb::new(250, 5, 5).to_hex(), "black", &set)
            .unwrap();
        pattern.refresh().unwrap();
        assert_eq!(pattern.beads.bead_at(5, 5), Some("black"));
    }

    #[test]
    fn test_legend_matches_bead_count() {
        let set = palette();
        let pattern = PatternBuilder::new(&set).build(&sprite(12)).unwrap();
        for remove_background in [true, false] {
            let legend = pattern.legend(&set, remove_background).unwrap();
            let total: usize = legend.iter().map(|e| e.count).sum();
            assert_eq!(total, pattern.bead_count(remove_background));
        }
        assert_eq!(pattern.bead_count(false), 144);
    }
}
