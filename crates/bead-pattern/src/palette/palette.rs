//! Bead palettes and the concatenated working set used for matching.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::color::{Lab, Rgb};
use crate::error::{PatternError, Result};

/// One bead color in a manufacturer palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteColor {
    /// Unique within its palette
    pub id: String,
    pub name: String,
    /// Manufacturer catalog code, when the palette has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// `#RRGGBB`
    pub hex: String,
}

impl PaletteColor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, hex: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            code: None,
            hex: hex.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Parsed color value.
    pub fn rgb(&self) -> Result<Rgb> {
        self.hex.parse()
    }
}

/// A named, ordered, immutable catalog of bead colors.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    name: String,
    colors: Vec<PaletteColor>,
}

impl Palette {
    /// Build a palette, rejecting duplicate ids.
    ///
    /// Malformed hex values are accepted here; the matcher skips them with
    /// a warning so one bad entry does not disable a whole palette.
    pub fn new(name: impl Into<String>, colors: Vec<PaletteColor>) -> Result<Self> {
        let name = name.into();
        let mut seen = std::collections::HashSet::new();
        for color in &colors {
            if !seen.insert(color.id.as_str()) {
                return Err(PatternError::DuplicateColorId {
                    palette: name,
                    id: color.id.clone(),
                });
            }
        }
        Ok(Self { name, colors })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn colors(&self) -> &[PaletteColor] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&PaletteColor> {
        self.colors.iter().find(|c| c.id == id)
    }
}

/// A palette entry with its color representations computed once.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub color: PaletteColor,
    /// `None` when the hex value failed to parse
    pub rgb: Option<Rgb>,
    pub lab: Option<Lab>,
}

impl Candidate {
    fn prepare(color: PaletteColor) -> Self {
        match color.rgb() {
            Ok(rgb) => Self {
                color,
                rgb: Some(rgb),
                lab: Some(Lab::from(rgb)),
            },
            Err(e) => {
                tracing::warn!(
                    id = %color.id,
                    hex = %color.hex,
                    error = %e,
                    "Palette color has an unparseable hex value; it will never be matched"
                );
                Self {
                    color,
                    rgb: None,
                    lab: None,
                }
            }
        }
    }
}

/// The working "available colors" sequence: one or more palettes
/// concatenated in order.
///
/// Order is part of the matching contract: when two candidates are equally
/// close to a pixel, the earlier one wins.
#[derive(Debug, Clone, Default)]
pub struct PaletteSet {
    names: Vec<String>,
    candidates: Vec<Candidate>,
    by_id: HashMap<String, usize>,
}

impl PaletteSet {
    /// Concatenate palettes in the given order.
    pub fn new<'a>(palettes: impl IntoIterator<Item = &'a Palette>) -> Self {
        let mut set = Self::default();
        for palette in palettes {
            set.names.push(palette.name.clone());
            for color in &palette.colors {
                set.push(color.clone());
            }
        }
        set
    }

    /// Build a set directly from colors (a single anonymous palette).
    pub fn from_colors(colors: impl IntoIterator<Item = PaletteColor>) -> Self {
        let mut set = Self::default();
        for color in colors {
            set.push(color);
        }
        set
    }

    fn push(&mut self, color: PaletteColor) {
        let index = self.candidates.len();
        if self.by_id.contains_key(&color.id) {
            tracing::warn!(
                id = %color.id,
                "Bead id appears in more than one active palette; lookups resolve to the first"
            );
        } else {
            self.by_id.insert(color.id.clone(), index);
        }
        self.candidates.push(Candidate::prepare(color));
    }

    /// Names of the palettes, in concatenation order.
    pub fn palette_names(&self) -> &[String] {
        &self.names
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn colors(&self) -> impl Iterator<Item = &PaletteColor> {
        self.candidates.iter().map(|c| &c.color)
    }

    pub fn get(&self, id: &str) -> Option<&PaletteColor> {
        self.by_id.get(id).map(|&i| &self.candidates[i].color)
    }

    /// Parsed color for a bead id, if it exists and parses.
    pub fn rgb_of(&self, id: &str) -> Option<Rgb> {
        self.by_id.get(id).and_then(|&i| self.candidates[i].rgb)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bw() -> Palette {
        Palette::new(
            "bw",
            vec![
                PaletteColor::new("black", "Black", "#000000"),
                PaletteColor::new("white", "White", "#FFFFFF"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = Palette::new(
            "dup",
            vec![
                PaletteColor::new("a", "A", "#000000"),
                PaletteColor::new("a", "A again", "#111111"),
            ],
        );
        assert_eq!(
            result,
            Err(PatternError::DuplicateColorId {
                palette: "dup".into(),
                id: "a".into()
            })
        );
    }

    #[test]
    fn test_set_preserves_concatenation_order() {
        let extra = Palette::new(
            "extra",
            vec![PaletteColor::new("red", "Red", "#ff0000").with_code("R1")],
        )
        .unwrap();
        let set = PaletteSet::new([&extra, &bw()]);
        let ids: Vec<&str> = set.colors().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["red", "black", "white"]);
        assert_eq!(set.palette_names(), ["extra", "bw"]);
        assert_eq!(set.get("red").and_then(|c| c.code.as_deref()), Some("R1"));
    }

    #[test]
    fn test_bad_hex_is_kept_but_unparsed() {
        let set = PaletteSet::from_colors([
            PaletteColor::new("bad", "Bad", "#zzzzzz"),
            PaletteColor::new("ok", "Ok", "#123456"),
        ]);
        assert_eq!(set.len(), 2);
        assert!(set.candidates()[0].rgb.is_none());
        assert_eq!(set.rgb_of("ok"), Some(Rgb::new(0x12, 0x34, 0x56)));
        assert_eq!(set.rgb_of("bad"), None);
        assert!(set.contains("bad"));
    }

    #[test]
    fn test_palette_color_serde_omits_missing_code() {
        let json = serde_json::to_string(&PaletteColor::new("a", "A", "#000000")).unwrap();
        assert_eq!(json, r##"{"id":"a","name":"A","hex":"#000000"}"##);
        let parsed: PaletteColor =
            serde_json::from_str(r##"{"id":"b","name":"B","code":"P02","hex":"#ffffff"}"##)
                .unwrap();
        assert_eq!(parsed.code.as_deref(), Some("P02"));
    }
}
