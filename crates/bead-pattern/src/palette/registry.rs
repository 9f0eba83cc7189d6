//! Registry of the palettes known to the process.

use crate::error::{PatternError, Result};

use super::palette::{Palette, PaletteSet};

/// Immutable, ordered collection of named palettes.
///
/// Constructed once at startup and passed explicitly to whatever needs
/// palette data.
#[derive(Debug, Clone, Default)]
pub struct PaletteRegistry {
    palettes: Vec<Palette>,
}

impl PaletteRegistry {
    pub fn new(palettes: Vec<Palette>) -> Self {
        Self { palettes }
    }

    pub fn palettes(&self) -> &[Palette] {
        &self.palettes
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.palettes.iter().map(|p| p.name())
    }

    pub fn get(&self, name: &str) -> Option<&Palette> {
        self.palettes
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    /// Concatenate the named palettes, in the order given, into a working
    /// set for matching.
    pub fn active_set<S: AsRef<str>>(&self, names: &[S]) -> Result<PaletteSet> {
        let palettes = names
            .iter()
            .map(|name| {
                self.get(name.as_ref())
                    .ok_or_else(|| PatternError::UnknownPalette(name.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(PaletteSet::new(palettes))
    }
}
