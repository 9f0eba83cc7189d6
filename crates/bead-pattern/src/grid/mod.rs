//! Pixel, bead and mask grids plus cell-size detection and resampling.
//!
//! ```
//! use bead_pattern::grid::{resample, GridDetector, PixelGrid};
//! use bead_pattern::Rgb;
//!
//! // 4×4 blocks of 3×3 pixels, each block its own color
//! let image = PixelGrid::from_fn(12, 12, |x, y| {
//!     Rgb::new((x / 3 * 60) as u8, (y / 3 * 60) as u8, 0)
//! });
//! let cell = GridDetector::with_seed(0).detect(&image);
//! assert_eq!(cell, 3);
//! assert_eq!(resample(&image, cell).unwrap().dimensions(), (4, 4));
//! ```

mod detect;
mod pixel_grid;
mod resample;

pub use detect::{
    detect_line_spacing, GridDetector, GridInfo, CANDIDATE_SIZES, CHANNEL_TOLERANCE, SAMPLE_COUNT,
};
pub use pixel_grid::{BackgroundMask, BeadGrid, Grid, PixelGrid};
pub use resample::{fit_within, resample};
