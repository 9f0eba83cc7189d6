//! CIE L*a*b* color space (D65)
//!
//! Lab is the space the perceptual distances operate in. Conversion goes
//! sRGB → linear RGB → XYZ (sRGB matrix, D65) → Lab, and the reverse path
//! rounds and clamps back to 8-bit sRGB.

use super::lut::{linear_to_srgb, srgb_u8_to_linear};
use super::rgb::Rgb;

/// D65 reference white
const WHITE_X: f64 = 0.95047;
const WHITE_Y: f64 = 1.00000;
const WHITE_Z: f64 = 1.08883;

const DELTA: f64 = 6.0 / 29.0;

/// A color in CIE L*a*b* space.
///
/// - `l`: lightness, 0 (black) to 100 (white)
/// - `a`: green (negative) to red (positive)
/// - `b`: blue (negative) to yellow (positive)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Lab {
    #[inline]
    pub fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    /// Chroma magnitude `sqrt(a² + b²)`.
    #[inline]
    pub fn chroma(self) -> f64 {
        self.a.hypot(self.b)
    }

    /// Convert back to 8-bit sRGB, rounding and clamping each channel.
    pub fn to_rgb(self) -> Rgb {
        let fy = (self.l + 16.0) / 116.0;
        let fx = self.a / 500.0 + fy;
        let fz = fy - self.b / 200.0;

        let x = WHITE_X * f_inv(fx);
        let y = WHITE_Y * f_inv(fy);
        let z = WHITE_Z * f_inv(fz);

        let r = x * 3.2404542 + y * -1.5371385 + z * -0.4985314;
        let g = x * -0.9692660 + y * 1.8760108 + z * 0.0415560;
        let b = x * 0.0556434 + y * -0.2040259 + z * 1.0572252;

        Rgb::new(encode_channel(r), encode_channel(g), encode_channel(b))
    }
}

impl From<Rgb> for Lab {
    fn from(rgb: Rgb) -> Self {
        let r = srgb_u8_to_linear(rgb.r);
        let g = srgb_u8_to_linear(rgb.g);
        let b = srgb_u8_to_linear(rgb.b);

        let x = r * 0.4124564 + g * 0.3575761 + b * 0.1804375;
        let y = r * 0.2126729 + g * 0.7151522 + b * 0.0721750;
        let z = r * 0.0193339 + g * 0.1191920 + b * 0.9503041;

        let fx = f(x / WHITE_X);
        let fy = f(y / WHITE_Y);
        let fz = f(z / WHITE_Z);

        Self {
            l: 116.0 * fy - 16.0,
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }
}

#[inline]
fn f(t: f64) -> f64 {
    if t > DELTA * DELTA * DELTA {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

#[inline]
fn f_inv(t: f64) -> f64 {
    if t > DELTA {
        t * t * t
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

#[inline]
fn encode_channel(linear: f64) -> u8 {
    let srgb = linear_to_srgb(linear.max(0.0));
    (srgb * 255.0).round().clamp(0.0, 255.0) as u8
}
