//! Hue/saturation/lightness view of an sRGB color
//!
//! Used for grouping legend labels by hue family. Saturation and lightness
//! are expressed in percent to match how the label categories are defined.

use super::rgb::Rgb;

/// HSL coordinates: hue in degrees `[0, 360)`, saturation and lightness in
/// percent `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl From<Rgb> for Hsl {
    fn from(rgb: Rgb) -> Self {
        let r = rgb.r as f64 / 255.0;
        let g = rgb.g as f64 / 255.0;
        let b = rgb.b as f64 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let d = max - min;

        if d == 0.0 {
            return Self {
                h: 0.0,
                s: 0.0,
                l: l * 100.0,
            };
        }

        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };

        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };

        Self {
            h: (h * 60.0).rem_euclid(360.0),
            s: s * 100.0,
            l: l * 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.05
    }

    #[test]
    fn test_primaries() {
        let red = Hsl::from(Rgb::new(255, 0, 0));
        assert!(close(red.h, 0.0) && close(red.s, 100.0) && close(red.l, 50.0));

        let green = Hsl::from(Rgb::new(0, 255, 0));
        assert!(close(green.h, 120.0));

        let blue = Hsl::from(Rgb::new(0, 0, 255));
        assert!(close(blue.h, 240.0));
    }

    #[test]
    fn test_grays_have_no_saturation() {
        for v in [0u8, 77, 128, 255] {
            let hsl = Hsl::from(Rgb::new(v, v, v));
            assert_eq!(hsl.s, 0.0);
            assert_eq!(hsl.h, 0.0);
        }
        assert!(close(Hsl::from(Rgb::WHITE).l, 100.0));
    }

    #[test]
    fn test_magenta_wraps_below_360() {
        let hsl = Hsl::from(Rgb::new(255, 0, 128));
        assert!(hsl.h > 329.0 && hsl.h < 331.0, "h = {}", hsl.h);
    }
}
