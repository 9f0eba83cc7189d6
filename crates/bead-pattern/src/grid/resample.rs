//! Grid resampling.

use crate::error::{PatternError, Result};

use super::pixel_grid::{Grid, PixelGrid};

/// Reduce each `cell_size × cell_size` block to its top-left pixel.
///
/// `cell_size` must evenly divide both dimensions.
pub fn resample(grid: &PixelGrid, cell_size: usize) -> Result<PixelGrid> {
    let (width, height) = grid.dimensions();
    if cell_size == 0 || width % cell_size != 0 || height % cell_size != 0 {
        return Err(PatternError::InvalidCellSize {
            cell_size,
            width,
            height,
        });
    }
    if cell_size == 1 {
        return Ok(grid.clone());
    }
    Ok(sample_every(grid, cell_size))
}

/// Nearest-neighbour downsample so that neither dimension exceeds
/// `max_dimension`. The step is the smallest integer factor that fits.
pub fn fit_within(grid: &PixelGrid, max_dimension: usize) -> PixelGrid {
    let longest = grid.width().max(grid.height());
    let max_dimension = max_dimension.max(1);
    if longest <= max_dimension {
        return grid.clone();
    }
    let factor = longest.div_ceil(max_dimension);
    tracing::debug!(
        width = grid.width(),
        height = grid.height(),
        factor,
        "Downsampling image to fit bead limit"
    );
    sample_every(grid, factor)
}

fn sample_every(grid: &PixelGrid, step: usize) -> PixelGrid {
    let out_w = grid.width().div_ceil(step);
    let out_h = grid.height().div_ceil(step);

    let pixels = Grid::from_fn(out_w, out_h, |x, y| grid.pixel(x * step, y * step));
    let alpha = grid.alpha().map(|_| {
        Grid::from_fn(out_w, out_h, |x, y| grid.alpha_at(x * step, y * step))
    });
    PixelGrid::from_parts(pixels, alpha)
}
