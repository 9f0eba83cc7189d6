//! Nearest-palette-color search.

use crate::color::{cie76, ciede2000, rgb_distance, DistanceMode, Lab, Rgb};
use crate::error::{PatternError, Result};

use super::palette::{Candidate, PaletteColor, PaletteSet};

/// Result of a nearest-color search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    /// Index into the candidate slice
    pub index: usize,
    /// Distance under the matcher's metric; `None` when every candidate was
    /// skipped and the first entry was returned as a fallback
    pub distance: Option<f64>,
}

impl Nearest {
    pub fn is_degraded(&self) -> bool {
        self.distance.is_none()
    }
}

/// Linear-scan matcher over an ordered candidate list.
///
/// Comparisons are strictly-less, so among equally distant candidates the
/// first one in the list wins.
///
/// ```
/// use bead_pattern::{DistanceMode, PaletteColor, PaletteMatcher, PaletteSet, Rgb};
///
/// let set = PaletteSet::from_colors([
///     PaletteColor::new("black", "Black", "#000000"),
///     PaletteColor::new("white", "White", "#FFFFFF"),
/// ]);
/// let matcher = PaletteMatcher::new(DistanceMode::Rgb);
/// let color = matcher.match_pixel(Rgb::new(10, 10, 10), &set).unwrap();
/// assert_eq!(color.id, "black");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PaletteMatcher {
    mode: DistanceMode,
}

impl PaletteMatcher {
    pub fn new(mode: DistanceMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> DistanceMode {
        self.mode
    }

    /// Distance between a pixel and one prepared candidate, or `None` when
    /// the candidate cannot be compared.
    #[inline]
    fn distance(&self, pixel: Rgb, pixel_lab: Option<Lab>, candidate: &Candidate) -> Option<f64> {
        let d = match self.mode {
            DistanceMode::Rgb => rgb_distance(pixel, candidate.rgb?),
            DistanceMode::Cie76 => cie76(pixel_lab?, candidate.lab?),
            DistanceMode::Ciede2000 => ciede2000(pixel_lab?, candidate.lab?),
        };
        d.is_finite().then_some(d)
    }

    /// Find the nearest candidate to `pixel`.
    ///
    /// # Errors
    ///
    /// [`PatternError::NoPaletteColors`] when `candidates` is empty.
    pub fn nearest(&self, pixel: Rgb, candidates: &[Candidate]) -> Result<Nearest> {
        if candidates.is_empty() {
            return Err(PatternError::NoPaletteColors);
        }

        // Pixel representation is computed once per search
        let pixel_lab = self.mode.uses_lab().then(|| Lab::from(pixel));

        let mut best: Option<(usize, f64)> = None;
        for (i, candidate) in candidates.iter().enumerate() {
            let Some(d) = self.distance(pixel, pixel_lab, candidate) else {
                tracing::warn!(
                    id = %candidate.color.id,
                    hex = %candidate.color.hex,
                    "Skipping palette color that cannot be compared"
                );
                continue;
            };
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((i, d)),
            }
        }

        match best {
            Some((index, distance)) => Ok(Nearest {
                index,
                distance: Some(distance),
            }),
            None => {
                tracing::warn!(
                    pixel = %pixel,
                    fallback = %candidates[0].color.id,
                    "No palette color could be compared; falling back to the first entry"
                );
                Ok(Nearest {
                    index: 0,
                    distance: None,
                })
            }
        }
    }

    /// Find the nearest palette color to `pixel` in `set`.
    pub fn match_pixel<'a>(&self, pixel: Rgb, set: &'a PaletteSet) -> Result<&'a PaletteColor> {
        let nearest = self.nearest(pixel, set.candidates())?;
        Ok(&set.candidates()[nearest.index].color)
    }
}

/// `match(pixel, candidates, distanceMode)` as a free function.
pub fn match_color<'a>(
    pixel: Rgb,
    set: &'a PaletteSet,
    mode: DistanceMode,
) -> Result<&'a PaletteColor> {
    PaletteMatcher::new(mode).match_pixel(pixel, set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::PaletteColor;

    fn bw() -> PaletteSet {
        PaletteSet::from_colors([
            PaletteColor::new("black", "Black", "#000000"),
            PaletteColor::new("white", "White", "#FFFFFF"),
        ])
    }

    #[test]
    fn test_dark_pixel_matches_black_in_every_mode() {
        let set = bw();
        for mode in [DistanceMode::Rgb, DistanceMode::Cie76, DistanceMode::Ciede2000] {
            let color = match_color(Rgb::new(10, 10, 10), &set, mode).unwrap();
            assert_eq!(color.id, "black", "mode {mode}");
        }
    }

    #[test]
    fn test_empty_candidates_is_an_error() {
        let set = PaletteSet::default();
        assert_eq!(
            match_color(Rgb::BLACK, &set, DistanceMode::Rgb),
            Err(PatternError::NoPaletteColors)
        );
    }

    #[test]
    fn test_ties_resolve_to_first_candidate() {
        // (128,0,0) and (0,128,0) are both exactly 128 away from black
        let set = PaletteSet::from_colors([
            PaletteColor::new("red", "Red", "#800000"),
            PaletteColor::new("green", "Green", "#008000"),
        ]);
        let matcher = PaletteMatcher::new(DistanceMode::Rgb);
        assert_eq!(matcher.match_pixel(Rgb::BLACK, &set).unwrap().id, "red");

        let swapped = PaletteSet::from_colors([
            PaletteColor::new("green", "Green", "#008000"),
            PaletteColor::new("red", "Red", "#800000"),
        ]);
        assert_eq!(matcher.match_pixel(Rgb::BLACK, &swapped).unwrap().id, "green");
    }

    #[test]
    fn test_duplicate_colors_resolve_to_first() {
        let set = PaletteSet::from_colors([
            PaletteColor::new("first", "First", "#336699"),
            PaletteColor::new("second", "Second", "#336699"),
        ]);
        for mode in [DistanceMode::Rgb, DistanceMode::Ciede2000] {
            let color = match_color(Rgb::new(0x33, 0x66, 0x99), &set, mode).unwrap();
            assert_eq!(color.id, "first");
        }
    }

    #[test]
    fn test_unparseable_candidates_are_skipped() {
        let set = PaletteSet::from_colors([
            PaletteColor::new("broken", "Broken", "not-a-color"),
            PaletteColor::new("white", "White", "#ffffff"),
        ]);
        let nearest = PaletteMatcher::new(DistanceMode::Ciede2000)
            .nearest(Rgb::BLACK, set.candidates())
            .unwrap();
        assert_eq!(nearest.index, 1);
        assert!(!nearest.is_degraded());
    }

    #[test]
    fn test_all_unparseable_falls_back_to_first() {
        let set = PaletteSet::from_colors([
            PaletteColor::new("x", "X", "#xyz"),
            PaletteColor::new("y", "Y", "bogus"),
        ]);
        let nearest = PaletteMatcher::new(DistanceMode::Rgb)
            .nearest(Rgb::WHITE, set.candidates())
            .unwrap();
        assert_eq!(nearest.index, 0);
        assert!(nearest.is_degraded());
    }

    #[test]
    fn test_exact_match_has_zero_distance() {
        let set = PaletteSet::from_colors([
            PaletteColor::new("a", "A", "#102030"),
            PaletteColor::new("b", "B", "#a0b0c0"),
        ]);
        let nearest = PaletteMatcher::new(DistanceMode::Ciede2000)
            .nearest(Rgb::new(0xa0, 0xb0, 0xc0), set.candidates())
            .unwrap();
        assert_eq!(nearest.index, 1);
        assert_eq!(nearest.distance, Some(0.0));
    }
}
