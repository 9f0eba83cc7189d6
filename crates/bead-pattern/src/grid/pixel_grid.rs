//! Rectangular grids: source pixels, bead assignments, background masks.
//!
//! All grids store cells row-major in a flat `Vec` (`index = y * width + x`)
//! and serialize as nested rows, top to bottom.

use std::collections::HashSet;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::color::Rgb;
use crate::error::{PatternError, Result};

fn mismatch(expected: (usize, usize), got: (usize, usize)) -> PatternError {
    PatternError::DimensionMismatch {
        expected_width: expected.0,
        expected_height: expected.1,
        width: got.0,
        height: got.1,
    }
}

/// Generic row-major grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

/// One bead id per cell, `None` for an empty cell.
pub type BeadGrid = Grid<Option<String>>;

/// `true` marks a backdrop cell.
pub type BackgroundMask = Grid<bool>;

impl<T> Grid<T> {
    /// Wrap a flat row-major buffer.
    pub fn new(width: usize, height: usize, cells: Vec<T>) -> Result<Self> {
        if cells.len() != width * height {
            return Err(mismatch((width, height), (cells.len(), 1)));
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    /// Build from nested rows; every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut cells = Vec::with_capacity(width * height);
        for row in rows {
            if row.len() != width {
                return Err(mismatch((width, height), (row.len(), height)));
            }
            cells.extend(row);
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x < self.width && y < self.height {
            self.cells.get(self.index(x, y))
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        if x < self.width && y < self.height {
            let i = self.index(x, y);
            self.cells.get_mut(i)
        } else {
            None
        }
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        // chunks(0) panics; an empty grid has no rows
        self.cells.chunks(self.width.max(1)).take(self.height)
    }

    /// Fail with `DimensionMismatch` unless this grid is `width × height`.
    pub fn ensure_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if self.dimensions() == (width, height) {
            Ok(())
        } else {
            Err(mismatch((width, height), self.dimensions()))
        }
    }
}

impl BackgroundMask {
    /// All-foreground mask.
    pub fn empty(width: usize, height: usize) -> Self {
        Self::from_fn(width, height, |_, _| false)
    }

    pub fn is_background(&self, x: usize, y: usize) -> bool {
        self.get(x, y).copied().unwrap_or(false)
    }

    pub fn background_count(&self) -> usize {
        self.cells.iter().filter(|&&b| b).count()
    }

    pub fn foreground_count(&self) -> usize {
        self.len() - self.background_count()
    }
}

impl BeadGrid {
    pub fn bead_at(&self, x: usize, y: usize) -> Option<&str> {
        self.get(x, y).and_then(|c| c.as_deref())
    }

    /// Distinct bead ids in row-major first-seen order.
    pub fn bead_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.cells
            .iter()
            .filter_map(|c| c.as_deref())
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

impl<T: Serialize> Serialize for Grid<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Grid<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let rows = Vec::<Vec<T>>::deserialize(deserializer)?;
        Grid::from_rows(rows).map_err(D::Error::custom)
    }
}

/// Decoded source image: RGB pixels with an optional alpha channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    pixels: Grid<Rgb>,
    alpha: Option<Vec<u8>>,
}

impl PixelGrid {
    pub fn new(width: usize, height: usize, pixels: Vec<Rgb>) -> Result<Self> {
        Ok(Self {
            pixels: Grid::new(width, height, pixels)?,
            alpha: None,
        })
    }

    pub fn from_fn(width: usize, height: usize, f: impl FnMut(usize, usize) -> Rgb) -> Self {
        Self {
            pixels: Grid::from_fn(width, height, f),
            alpha: None,
        }
    }

    /// Decode a tightly packed RGBA8 buffer. The alpha channel is kept only
    /// when at least one pixel is not fully opaque.
    pub fn from_rgba8(width: usize, height: usize, data: &[u8]) -> Result<Self> {
        if data.len() != width * height * 4 {
            return Err(mismatch((width, height), (data.len() / 4, 1)));
        }
        let pixels = data
            .chunks_exact(4)
            .map(|px| Rgb::new(px[0], px[1], px[2]))
            .collect();
        let alpha: Vec<u8> = data.chunks_exact(4).map(|px| px[3]).collect();
        let grid = Self::new(width, height, pixels)?;
        if alpha.iter().any(|&a| a < 255) {
            grid.with_alpha(alpha)
        } else {
            Ok(grid)
        }
    }

    /// Assemble from grids that already share dimensions.
    pub(crate) fn from_parts(pixels: Grid<Rgb>, alpha: Option<Grid<u8>>) -> Self {
        debug_assert!(alpha
            .as_ref()
            .map_or(true, |a| a.dimensions() == pixels.dimensions()));
        Self {
            pixels,
            alpha: alpha.map(|a| a.cells),
        }
    }

    /// Attach a per-pixel alpha channel.
    pub fn with_alpha(mut self, alpha: Vec<u8>) -> Result<Self> {
        if alpha.len() != self.pixels.len() {
            return Err(mismatch(self.dimensions(), (alpha.len(), 1)));
        }
        self.alpha = Some(alpha);
        Ok(self)
    }

    pub fn width(&self) -> usize {
        self.pixels.width()
    }

    pub fn height(&self) -> usize {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.pixels.dimensions()
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Panics when out of bounds.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        self.pixels.cells()[self.pixels.index(x, y)]
    }

    #[inline]
    pub fn alpha_at(&self, x: usize, y: usize) -> u8 {
        self.alpha
            .as_ref()
            .map_or(255, |a| a[self.pixels.index(x, y)])
    }

    pub fn pixels(&self) -> &[Rgb] {
        self.pixels.cells()
    }

    pub fn alpha(&self) -> Option<&[u8]> {
        self.alpha.as_deref()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Rgb]> {
        self.pixels.rows()
    }

    /// Distinct colors in row-major first-seen order.
    pub fn distinct_colors(&self) -> Vec<Rgb> {
        let mut seen = HashSet::new();
        self.pixels
            .cells()
            .iter()
            .copied()
            .filter(|p| seen.insert(*p))
            .collect()
    }

    /// Distinct hex keys in row-major first-seen order.
    pub fn distinct_keys(&self) -> Vec<String> {
        self.distinct_colors().into_iter().map(Rgb::to_hex).collect()
    }

    pub fn ensure_dimensions(&self, width: usize, height: usize) -> Result<()> {
        self.pixels.ensure_dimensions(width, height)
    }
}

#[derive(Serialize)]
struct PixelGridRef<'a> {
    width: usize,
    height: usize,
    grid: &'a Grid<Rgb>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alpha: Option<&'a [u8]>,
}

#[derive(Deserialize)]
struct PixelGridRepr {
    width: usize,
    height: usize,
    grid: Grid<Rgb>,
    #[serde(default)]
    alpha: Option<Vec<u8>>,
}

impl Serialize for PixelGrid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        PixelGridRef {
            width: self.width(),
            height: self.height(),
            grid: &self.pixels,
            alpha: self.alpha(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PixelGrid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let repr = PixelGridRepr::deserialize(deserializer)?;
        // An empty `grid` carries no width of its own
        if repr.grid.is_empty() && repr.width * repr.height == 0 {
            return Ok(Self {
                pixels: Grid::from_fn(repr.width, repr.height, |_, _| Rgb::BLACK),
                alpha: None,
            });
        }
        repr.grid
            .ensure_dimensions(repr.width, repr.height)
            .map_err(D::Error::custom)?;
        let grid = Self {
            pixels: repr.grid,
            alpha: None,
        };
        match repr.alpha {
            Some(alpha) => grid.with_alpha(alpha).map_err(D::Error::custom),
            None => Ok(grid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_rejects_wrong_length() {
        let err = PixelGrid::new(2, 2, vec![Rgb::BLACK; 3]).unwrap_err();
        assert!(matches!(err, PatternError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = Grid::from_rows(vec![vec![true, false], vec![true]]).unwrap_err();
        assert_eq!(
            err,
            PatternError::DimensionMismatch {
                expected_width: 2,
                expected_height: 2,
                width: 1,
                height: 2
            }
        );
    }

    #[test]
    fn test_row_major_indexing() {
        let grid = Grid::from_fn(3, 2, |x, y| (x, y));
        assert_eq!(grid.get(2, 1), Some(&(2, 1)));
        assert_eq!(grid.cells()[4], (1, 1));
        assert_eq!(grid.get(3, 0), None);
        let rows: Vec<_> = grid.rows().map(|r| r.len()).collect();
        assert_eq!(rows, [3, 3]);
    }

    #[test]
    fn test_rgba_keeps_alpha_only_when_translucent() {
        let opaque = PixelGrid::from_rgba8(1, 2, &[1, 2, 3, 255, 4, 5, 6, 255]).unwrap();
        assert!(opaque.alpha().is_none());

        let clear = PixelGrid::from_rgba8(1, 2, &[1, 2, 3, 0, 4, 5, 6, 255]).unwrap();
        assert_eq!(clear.alpha(), Some(&[0u8, 255][..]));
        assert_eq!(clear.alpha_at(0, 0), 0);
        assert_eq!(clear.pixel(0, 1), Rgb::new(4, 5, 6));
    }

    #[test]
    fn test_pixel_grid_serializes_as_nested_rows() {
        let grid = PixelGrid::from_fn(2, 1, |x, _| Rgb::new(x as u8, 0, 0));
        let json = serde_json::to_value(&grid).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "width": 2,
                "height": 1,
                "grid": [[{"r": 0, "g": 0, "b": 0}, {"r": 1, "g": 0, "b": 0}]]
            })
        );
        let back: PixelGrid = serde_json::from_value(json).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn test_pixel_grid_keeps_alpha_through_json() {
        let grid = PixelGrid::from_rgba8(2, 1, &[9, 9, 9, 0, 1, 2, 3, 255]).unwrap();
        let json = serde_json::to_value(&grid).unwrap();
        assert_eq!(json["alpha"], serde_json::json!([0, 255]));
        let back: PixelGrid = serde_json::from_value(json).unwrap();
        assert_eq!(back.alpha(), Some(&[0u8, 255][..]));
    }

    #[test]
    fn test_pixel_grid_rejects_declared_size_mismatch() {
        let json = serde_json::json!({
            "width": 3,
            "height": 1,
            "grid": [[{"r": 0, "g": 0, "b": 0}]]
        });
        assert!(serde_json::from_value::<PixelGrid>(json).is_err());
    }

    #[test]
    fn test_bead_grid_serializes_empty_as_null() {
        let grid: BeadGrid =
            Grid::from_rows(vec![vec![Some("P01".to_string()), None]]).unwrap();
        assert_eq!(
            serde_json::to_string(&grid).unwrap(),
            r#"[["P01",null]]"#
        );
        assert_eq!(grid.bead_ids(), ["P01"]);
    }

    #[test]
    fn test_distinct_keys_first_seen_order() {
        let grid = PixelGrid::new(
            3,
            1,
            vec![Rgb::WHITE, Rgb::BLACK, Rgb::WHITE],
        )
        .unwrap();
        assert_eq!(grid.distinct_keys(), ["#ffffff", "#000000"]);
    }
}
