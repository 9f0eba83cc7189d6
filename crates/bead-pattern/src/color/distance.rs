//! Color difference metrics
//!
//! Three metrics are available to the matcher:
//!
//! | Mode | Space | Notes |
//! |------|-------|-------|
//! | [`DistanceMode::Rgb`] | sRGB bytes | plain Euclidean, cheap, not perceptual |
//! | [`DistanceMode::Cie76`] | Lab | Euclidean in Lab |
//! | [`DistanceMode::Ciede2000`] | Lab | CIEDE2000 with kL = kC = kH = 1 |
//!
//! All three are symmetric and non-negative.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::lab::Lab;
use super::rgb::Rgb;

/// Distance metric used when matching pixels to palette colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMode {
    /// Euclidean distance over the 8-bit RGB channels.
    Rgb,
    /// Euclidean distance in CIE Lab (Delta E 1976).
    Cie76,
    /// CIEDE2000 perceptual difference in CIE Lab.
    #[default]
    Ciede2000,
}

impl DistanceMode {
    /// True when the metric needs Lab coordinates.
    #[inline]
    pub fn uses_lab(self) -> bool {
        !matches!(self, DistanceMode::Rgb)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DistanceMode::Rgb => "rgb",
            DistanceMode::Cie76 => "cie76",
            DistanceMode::Ciede2000 => "ciede2000",
        }
    }
}

impl fmt::Display for DistanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rgb" | "euclidean" => Ok(DistanceMode::Rgb),
            "cie76" | "lab" => Ok(DistanceMode::Cie76),
            "ciede2000" | "de2000" | "perceptual" => Ok(DistanceMode::Ciede2000),
            other => Err(format!(
                "unknown distance mode {other:?} (expected rgb, cie76 or ciede2000)"
            )),
        }
    }
}

/// Euclidean distance between two sRGB colors.
///
/// ```
/// use bead_pattern::{rgb_distance, Rgb};
/// assert_eq!(rgb_distance(Rgb::new(0, 0, 0), Rgb::new(3, 4, 0)), 5.0);
/// ```
#[inline]
pub fn rgb_distance(p: Rgb, q: Rgb) -> f64 {
    let dr = p.r as f64 - q.r as f64;
    let dg = p.g as f64 - q.g as f64;
    let db = p.b as f64 - q.b as f64;
    (dr * dr + dg * dg + db * db).sqrt()
}

/// Delta E 1976: Euclidean distance in Lab.
#[inline]
pub fn cie76(p: Lab, q: Lab) -> f64 {
    let dl = p.l - q.l;
    let da = p.a - q.a;
    let db = p.b - q.b;
    (dl * dl + da * da + db * db).sqrt()
}

const POW25_7: f64 = 6_103_515_625.0; // 25^7

/// CIEDE2000 color difference (Sharma, Wu, Dalal 2005 formulation).
pub fn ciede2000(p: Lab, q: Lab) -> f64 {
    let c1 = p.chroma();
    let c2 = q.chroma();
    let c_bar = 0.5 * (c1 + c2);
    let c_bar7 = c_bar.powi(7);
    let g = 0.5 * (1.0 - (c_bar7 / (c_bar7 + POW25_7)).sqrt());

    let a1p = (1.0 + g) * p.a;
    let a2p = (1.0 + g) * q.a;
    let c1p = a1p.hypot(p.b);
    let c2p = a2p.hypot(q.b);

    let h1p = hue_degrees(p.b, a1p);
    let h2p = hue_degrees(q.b, a2p);

    let dlp = q.l - p.l;
    let dcp = c2p - c1p;

    let chroma_product = c1p * c2p;
    let dhp = if chroma_product == 0.0 {
        0.0
    } else {
        let diff = h2p - h1p;
        if diff > 180.0 {
            diff - 360.0
        } else if diff < -180.0 {
            diff + 360.0
        } else {
            diff
        }
    };
    let d_big_hp = 2.0 * chroma_product.sqrt() * (dhp.to_radians() / 2.0).sin();

    let l_bar_p = 0.5 * (p.l + q.l);
    let c_bar_p = 0.5 * (c1p + c2p);
    let h_bar_p = if chroma_product == 0.0 {
        h1p + h2p
    } else if (h1p - h2p).abs() <= 180.0 {
        0.5 * (h1p + h2p)
    } else if h1p + h2p < 360.0 {
        0.5 * (h1p + h2p + 360.0)
    } else {
        0.5 * (h1p + h2p - 360.0)
    };

    let t = 1.0 - 0.17 * (h_bar_p - 30.0).to_radians().cos()
        + 0.24 * (2.0 * h_bar_p).to_radians().cos()
        + 0.32 * (3.0 * h_bar_p + 6.0).to_radians().cos()
        - 0.20 * (4.0 * h_bar_p - 63.0).to_radians().cos();

    let d_theta = 30.0 * (-((h_bar_p - 275.0) / 25.0).powi(2)).exp();
    let c_bar_p7 = c_bar_p.powi(7);
    let r_c = 2.0 * (c_bar_p7 / (c_bar_p7 + POW25_7)).sqrt();
    let l_term = (l_bar_p - 50.0).powi(2);
    let s_l = 1.0 + 0.015 * l_term / (20.0 + l_term).sqrt();
    let s_c = 1.0 + 0.045 * c_bar_p;
    let s_h = 1.0 + 0.015 * c_bar_p * t;
    let r_t = -(2.0 * d_theta * PI / 180.0).sin() * r_c;

    let dl = dlp / s_l;
    let dc = dcp / s_c;
    let dh = d_big_hp / s_h;

    (dl * dl + dc * dc + dh * dh + r_t * dc * dh).max(0.0).sqrt()
}

/// Hue angle in degrees `[0, 360)`; 0 for achromatic input.
#[inline]
fn hue_degrees(b: f64, a_prime: f64) -> f64 {
    if b == 0.0 && a_prime == 0.0 {
        0.0
    } else {
        b.atan2(a_prime).to_degrees().rem_euclid(360.0)
    }
}
