//! Pixel-art cell size detection
//!
//! Upscaled pixel art is made of solid `N×N` blocks. [`GridDetector`] tries
//! candidate block sizes from largest to smallest and accepts the first one
//! for which a random sample of cells is uniform. [`detect_line_spacing`] is
//! an advisory alternative that looks for regularly spaced edges instead.
//!
//! Cell sampling is randomized, so an ambiguous image may be classified
//! differently between runs. Exact synthetic block images always detect the
//! block size; use [`GridDetector::with_seed`] for reproducible results.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::pixel_grid::PixelGrid;

/// Cell sizes tried, largest first.
pub const CANDIDATE_SIZES: [usize; 14] = [32, 24, 20, 16, 15, 12, 10, 8, 6, 5, 4, 3, 2, 1];

/// Cells sampled per candidate.
pub const SAMPLE_COUNT: usize = 10;

/// Maximum per-channel difference from a cell's top-left pixel.
pub const CHANNEL_TOLERANCE: u8 = 5;

/// Detected sampling grid. Advisory: callers decide whether to resample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridInfo {
    pub cell_width: usize,
    pub cell_height: usize,
    pub offset_x: usize,
    pub offset_y: usize,
    pub columns: usize,
    pub rows: usize,
    /// In `[0, 1]`
    pub confidence: f64,
}

impl GridInfo {
    /// True when the grid maps every source pixel to its own cell.
    pub fn is_identity(&self) -> bool {
        self.cell_width == 1 && self.cell_height == 1
    }

    /// Square cell size if both axes agree.
    pub fn square_cell(&self) -> Option<usize> {
        (self.cell_width == self.cell_height).then_some(self.cell_width)
    }
}

/// Block-uniformity grid detector.
#[derive(Debug, Clone)]
pub struct GridDetector {
    samples: usize,
    tolerance: u8,
    seed: Option<u64>,
}

impl Default for GridDetector {
    fn default() -> Self {
        Self {
            samples: SAMPLE_COUNT,
            tolerance: CHANNEL_TOLERANCE,
            seed: None,
        }
    }
}

impl GridDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic detector: every call samples from a fresh RNG seeded
    /// with `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn with_tolerance(mut self, tolerance: u8) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples.max(1);
        self
    }

    /// Detect the cell size, falling back to `1`.
    pub fn detect(&self, grid: &PixelGrid) -> usize {
        match self.seed {
            Some(seed) => self.detect_with_rng(grid, &mut StdRng::seed_from_u64(seed)),
            None => self.detect_with_rng(grid, &mut rand::thread_rng()),
        }
    }

    /// Detect the cell size using the supplied RNG for cell sampling.
    pub fn detect_with_rng<R: Rng + ?Sized>(&self, grid: &PixelGrid, rng: &mut R) -> usize {
        let (width, height) = grid.dimensions();
        for &n in CANDIDATE_SIZES.iter().filter(|&&n| n > 1) {
            if width % n != 0 || height % n != 0 {
                continue;
            }
            let (columns, rows) = (width / n, height / n);
            if columns == 0 || rows == 0 {
                continue;
            }

            let uniform = (0..self.samples).all(|_| {
                let cx = rng.gen_range(0..columns);
                let cy = rng.gen_range(0..rows);
                self.cell_is_uniform(grid, cx * n, cy * n, n)
            });
            if uniform {
                tracing::debug!(cell_size = n, columns, rows, "Grid detected");
                return n;
            }
            tracing::trace!(cell_size = n, "Rejected candidate cell size");
        }
        tracing::debug!(width, height, "No grid detected; using one cell per pixel");
        1
    }

    /// Detect and describe the grid.
    ///
    /// Confidence is `1.0` when a candidate passed and `0.0` for the
    /// one-pixel fallback.
    pub fn detect_info(&self, grid: &PixelGrid) -> GridInfo {
        let n = self.detect(grid);
        GridInfo {
            cell_width: n,
            cell_height: n,
            offset_x: 0,
            offset_y: 0,
            columns: grid.width() / n,
            rows: grid.height() / n,
            confidence: if n > 1 { 1.0 } else { 0.0 },
        }
    }

    fn cell_is_uniform(&self, grid: &PixelGrid, x0: usize, y0: usize, n: usize) -> bool {
        let anchor = grid.pixel(x0, y0);
        let anchor_alpha = grid.alpha_at(x0, y0);
        for y in y0..y0 + n {
            for x in x0..x0 + n {
                if !grid.pixel(x, y).within_tolerance(anchor, self.tolerance) {
                    return false;
                }
                if grid.alpha_at(x, y).abs_diff(anchor_alpha) > self.tolerance {
                    return false;
                }
            }
        }
        true
    }
}

/// Edge-profile spacing heuristic.
///
/// Builds the grayscale mean profile of every column (for the cell width)
/// and every row (for the cell height), then scores each spacing in
/// `min_spacing..=max_spacing` by how strong and how consistent the gradient
/// peaks at its multiples are. Returns `None` when either axis has no
/// usable spacing.
pub fn detect_line_spacing(
    grid: &PixelGrid,
    min_spacing: usize,
    max_spacing: usize,
) -> Option<GridInfo> {
    let (width, height) = grid.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let luma: Vec<f64> = grid.pixels().iter().map(|p| luminance(p.r, p.g, p.b)).collect();

    let column_profile: Vec<f64> = (0..width)
        .map(|x| (0..height).map(|y| luma[y * width + x]).sum::<f64>() / height as f64)
        .collect();
    let row_profile: Vec<f64> = luma
        .chunks(width)
        .map(|row| row.iter().sum::<f64>() / width as f64)
        .collect();

    let (cell_width, h_confidence) = regular_spacing(&column_profile, min_spacing, max_spacing)?;
    let (cell_height, v_confidence) = regular_spacing(&row_profile, min_spacing, max_spacing)?;

    let info = GridInfo {
        cell_width,
        cell_height,
        offset_x: 0,
        offset_y: 0,
        columns: width / cell_width,
        rows: height / cell_height,
        confidence: (h_confidence + v_confidence) / 2.0,
    };
    tracing::info!(
        columns = info.columns,
        rows = info.rows,
        cell_width,
        cell_height,
        confidence = info.confidence,
        "Edge grid detected"
    );
    Some(info)
}

/// ITU-R 601 luma, as used for 8-bit grayscale conversion.
#[inline]
fn luminance(r: u8, g: u8, b: u8) -> f64 {
    (r as f64 * 299.0 + g as f64 * 587.0 + b as f64 * 114.0) / 1000.0
}

/// Score peaks of `|Δprofile|` at multiples of each spacing and return the
/// best `(spacing, confidence)`.
fn regular_spacing(profile: &[f64], min_spacing: usize, max_spacing: usize) -> Option<(usize, f64)> {
    let gradient: Vec<f64> = profile.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    let upper = (max_spacing + 1).min(profile.len() / 2);

    let mut best: Option<(usize, f64)> = None;
    for spacing in min_spacing.max(1)..upper {
        let expected_lines = profile.len() / spacing;
        if expected_lines < 2 {
            continue;
        }

        let scores: Vec<f64> = (1..expected_lines)
            .map(|i| i * spacing)
            .filter(|&pos| pos < gradient.len())
            .map(|pos| {
                let start = pos.saturating_sub(2);
                let end = (pos + 3).min(gradient.len());
                gradient[start..end].iter().copied().fold(0.0, f64::max)
            })
            .collect();
        if scores.len() < 2 {
            continue;
        }

        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / scores.len() as f64;
        // High, even peaks score best
        let consistency = mean / (1.0 + variance.sqrt());

        if consistency > best.map_or(0.0, |(_, score)| score) {
            best = Some((spacing, consistency));
        }
    }

    best.map(|(spacing, score)| (spacing, (score / 100.0).min(1.0)))
}
