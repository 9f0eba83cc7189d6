//! 8-bit sRGB pixel type
//!
//! `Rgb` is the value type every image pixel and palette entry is reduced
//! to. Hex strings are the canonical key used by the color mapping.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PatternError;

/// A pixel in 8-bit sRGB.
///
/// Serializes as `{"r": .., "g": .., "b": ..}`, matching the project
/// persistence payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create from a byte array `[R, G, B]`.
    #[inline]
    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Lowercase `#rrggbb` key, as used by [`ColorMapping`](crate::ColorMapping).
    ///
    /// ```
    /// use bead_pattern::Rgb;
    /// assert_eq!(Rgb::new(255, 16, 0).to_hex(), "#ff1000");
    /// ```
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// True when every channel differs from `other` by at most `tolerance`.
    #[inline]
    pub fn within_tolerance(self, other: Rgb, tolerance: u8) -> bool {
        self.r.abs_diff(other.r) <= tolerance
            && self.g.abs_diff(other.g) <= tolerance
            && self.b.abs_diff(other.b) <= tolerance
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(bytes: [u8; 3]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl FromStr for Rgb {
    type Err = PatternError;

    /// Parse `#RRGGBB`, `RRGGBB`, `#RGB` or `RGB` (case-insensitive,
    /// surrounding whitespace ignored).
    ///
    /// ```
    /// use bead_pattern::Rgb;
    /// let white: Rgb = "#FFFFFF".parse().unwrap();
    /// assert_eq!(white, Rgb::WHITE);
    /// let red: Rgb = "f00".parse().unwrap();
    /// assert_eq!(red, Rgb::new(255, 0, 0));
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

        let invalid = |reason: &str| PatternError::InvalidHex {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid("non-hex character"));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|e| invalid(&e.to_string()))
        };

        match digits.len() {
            3 => Ok(Self::new(
                channel(0..1)? * 17,
                channel(1..2)? * 17,
                channel(2..3)? * 17,
            )),
            6 => Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            _ => Err(invalid("expected 3 or 6 hex digits")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parse_formats() {
        assert_eq!("#000000".parse::<Rgb>().unwrap(), Rgb::BLACK);
        assert_eq!("ffffff".parse::<Rgb>().unwrap(), Rgb::WHITE);
        assert_eq!("  #AbCdEf ".parse::<Rgb>().unwrap(), Rgb::new(0xab, 0xcd, 0xef));
        assert_eq!("#0f8".parse::<Rgb>().unwrap(), Rgb::new(0, 255, 136));
    }

    #[test]
    fn test_hex_parse_rejects_garbage() {
        assert!(matches!(
            "#12345".parse::<Rgb>(),
            Err(PatternError::InvalidHex { .. })
        ));
        assert!(matches!(
            "#gg0000".parse::<Rgb>(),
            Err(PatternError::InvalidHex { .. })
        ));
        assert!("".parse::<Rgb>().is_err());
        // multi-byte characters must not panic on slicing
        assert!("#ü12345".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_hex_format_is_lowercase() {
        assert_eq!(Rgb::new(0xAB, 0x0C, 0xFF).to_hex(), "#ab0cff");
        assert_eq!(Rgb::new(1, 2, 3).to_string(), "#010203");
    }

    #[test]
    fn test_within_tolerance() {
        let base = Rgb::new(100, 100, 100);
        assert!(base.within_tolerance(Rgb::new(105, 95, 100), 5));
        assert!(!base.within_tolerance(Rgb::new(106, 100, 100), 5));
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&Rgb::new(1, 2, 3)).unwrap();
        assert_eq!(json, r#"{"r":1,"g":2,"b":3}"#);
    }
}
