//! Bead palettes and nearest-color matching
//!
//! - [`Palette`]: one manufacturer catalog
//! - [`PaletteRegistry`]: every palette known to the process
//! - [`PaletteSet`]: the ordered working set the matcher scans
//! - [`PaletteMatcher`]: nearest-color search under a [`DistanceMode`](crate::DistanceMode)

mod matcher;
mod palette;
mod registry;

pub use matcher::{match_color, Nearest, PaletteMatcher};
pub use palette::{Candidate, Palette, PaletteColor, PaletteSet};
pub use registry::PaletteRegistry;
