//! bead-pattern: turn raster images into fuse-bead patterns
//!
//! The crate is the synchronous core of the beadsprite service. Everything
//! here is a pure function of its inputs (plus an injectable RNG for grid
//! detection), so it can be called from a CLI, a blocking task in a web
//! server, or a test without any setup.
//!
//! # Quick Start
//!
//! ```
//! use bead_pattern::grid::PixelGrid;
//! use bead_pattern::{LayoutOptions, PaletteColor, PatternBuilder, PaletteSet, Rgb};
//!
//! let palette = PaletteSet::from_colors([
//!     PaletteColor::new("white", "White", "#ffffff"),
//!     PaletteColor::new("red", "Red", "#e02020"),
//! ]);
//!
//! // A red 2×2 square on a white 6×6 canvas
//! let image = PixelGrid::from_fn(6, 6, |x, y| {
//!     if (2..4).contains(&x) && (2..4).contains(&y) {
//!         Rgb::new(230, 30, 30)
//!     } else {
//!         Rgb::WHITE
//!     }
//! });
//!
//! let pattern = PatternBuilder::new(&palette).build(&image).unwrap();
//! assert_eq!(pattern.mask.foreground_count(), 4);
//!
//! let legend = pattern.legend(&palette, true).unwrap();
//! assert_eq!(legend[0].bead_id, "red");
//! assert_eq!(legend[0].label, "A1");
//!
//! let geometry = pattern.layout(LayoutOptions::default()).unwrap();
//! assert_eq!((geometry.content_width, geometry.content_height), (2, 2));
//! ```
//!
//! # Pipeline
//!
//! ```text
//! decoded image (PixelGrid)
//!     |
//!     +---> GridDetector      (only when larger than the bead limit)
//!     |       |
//!     |     resample / fit_within
//!     v
//! PaletteMatcher              (every distinct color -> nearest bead)
//!     |
//!     v
//! ColorMapping ---> BeadGrid
//!                     |
//!                     v
//!               segment()     (alpha, else largest border region)
//!                     |
//!                     v
//!               BackgroundMask ---> layout()       (boards, offsets, mirror)
//!                     |
//!                     +-----------> build_legend() (counts, labels)
//! ```
//!
//! # Color Distance
//!
//! Matching runs in one of three metrics selected by [`DistanceMode`]:
//! plain RGB Euclidean, CIE76 (Euclidean in Lab) and CIEDE2000. The
//! default is CIEDE2000, which tracks perceived difference best on the
//! saturated colors bead palettes are made of. Palette colors are converted
//! to Lab once, when the [`PaletteSet`] is built; the matcher converts each
//! pixel once per search.
//!
//! Matching is a linear scan with strictly-less comparison, so palette order
//! matters: on a tie the earlier palette entry wins.

pub mod color;
pub mod error;
pub mod grid;
pub mod layout;
pub mod legend;
pub mod mapping;
pub mod palette;
pub mod pattern;
pub mod segment;


pub use color::{cie76, ciede2000, rgb_distance, DistanceMode, Hsl, Lab, Rgb};
pub use error::{PatternError, Result};
pub use grid::{BackgroundMask, BeadGrid, GridDetector, GridInfo, PixelGrid};
pub use layout::{layout, BoardRect, BoundingBox, LayoutGeometry, LayoutOptions, Placement};
pub use legend::{assign_labels, build_legend, LegendEntry};
pub use mapping::ColorMapping;
pub use palette::{match_color, Palette, PaletteColor, PaletteMatcher, PaletteRegistry, PaletteSet};
pub use pattern::{Pattern, PatternBuilder};
pub use segment::segment;
