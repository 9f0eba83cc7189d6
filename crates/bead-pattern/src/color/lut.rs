//! Gamma lookup for 8-bit sRGB channels
//!
//! Every input channel is an 8-bit value, so the decode side of the sRGB
//! transfer function is a 256-entry table built on first use. The encode
//! side works on arbitrary floats and uses the exact formula.

use std::sync::OnceLock;

static SRGB_TO_LINEAR: OnceLock<[f64; 256]> = OnceLock::new();

/// IEC 61966-2-1 exact formula: sRGB (0.0..=1.0) to linear
fn srgb_to_linear_exact(srgb: f64) -> f64 {
    if srgb <= 0.04045 {
        srgb / 12.92
    } else {
        ((srgb + 0.055) / 1.055).powf(2.4)
    }
}

/// Decode an 8-bit sRGB channel to linear light.
#[inline]
pub fn srgb_u8_to_linear(value: u8) -> f64 {
    let table = SRGB_TO_LINEAR.get_or_init(|| {
        let mut table = [0.0; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = srgb_to_linear_exact(i as f64 / 255.0);
        }
        table
    });
    table[value as usize]
}

/// IEC 61966-2-1 exact formula: linear to sRGB (0.0..=1.0).
#[inline]
pub fn linear_to_srgb(linear: f64) -> f64 {
    if linear <= 0.0031308 {
        linear * 12.92
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    }
}
