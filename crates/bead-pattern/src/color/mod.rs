//! Color types, conversions and difference metrics
//!
//! - [`Rgb`]: 8-bit sRGB, the pixel and palette value type
//! - [`Lab`]: CIE L*a*b* (D65), where the perceptual metrics operate
//! - [`Hsl`]: hue/saturation/lightness, used for legend grouping
//!
//! ```
//! use bead_pattern::{ciede2000, Lab, Rgb};
//!
//! let a = Lab::from(Rgb::new(200, 30, 30));
//! let b = Lab::from(Rgb::new(190, 40, 35));
//! assert!(ciede2000(a, b) < 5.0);
//! ```

mod distance;
mod hsl;
mod lab;
mod lut;
mod rgb;

pub use distance::{cie76, ciede2000, rgb_distance, DistanceMode};
pub use hsl::Hsl;
pub use lab::Lab;
pub use rgb::Rgb;
