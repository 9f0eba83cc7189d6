//! Loading bead palettes from JSON assets.

use crate::assets::AssetLoader;
use bead_pattern::{Palette, PaletteColor, PaletteRegistry, PatternError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaletteLoadError {
    #[error("Failed to read palette {name}: {source}")]
    Io {
        name: String,
        source: std::io::Error,
    },

    #[error("Failed to parse palette {name}: {source}")]
    Parse {
        name: String,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Invalid(#[from] PatternError),
}

/// Load one palette file (`[{id, name, code?, hex}]`) by name.
pub fn load_palette(loader: &AssetLoader, name: &str) -> Result<Palette, PaletteLoadError> {
    let data = loader.read_palette(name).map_err(|source| PaletteLoadError::Io {
        name: name.to_string(),
        source,
    })?;
    let colors: Vec<PaletteColor> =
        serde_json::from_slice(&data).map_err(|source| PaletteLoadError::Parse {
            name: name.to_string(),
            source,
        })?;

    Ok(Palette::new(name, colors)?)
}

/// Load every available palette. Files that fail to load are skipped with a
/// warning.
pub fn load_registry(loader: &AssetLoader) -> PaletteRegistry {
    let mut palettes = Vec::new();
    for name in loader.list_palettes() {
        match load_palette(loader, &name) {
            Ok(palette) => {
                tracing::debug!(palette = %name, colors = palette.len(), "Loaded palette");
                palettes.push(palette);
            }
            Err(e) => tracing::warn!(palette = %name, error = %e, "Skipping palette"),
        }
    }
    tracing::info!(palettes = palettes.len(), "Palette registry ready");
    PaletteRegistry::new(palettes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_embedded_palettes() {
        let registry = load_registry(&AssetLoader::default());
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, ["hama", "perler"]);

        let perler = registry.get("perler").unwrap();
        let white = perler.get("P01").unwrap();
        assert_eq!(white.name, "White");
        assert_eq!(white.code.as_deref(), Some("80-19001"));
        assert!(perler.colors().iter().all(|c| c.rgb().is_ok()));
    }

    #[test]
    fn test_broken_external_palette_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.json"), "{ nope").unwrap();
        fs::write(
            dir.path().join("mini.json"),
            r##"[{"id": "m1", "name": "Ink", "hex": "#101010"}]"##,
        )
        .unwrap();

        let loader = AssetLoader::new(Some(dir.path().to_path_buf()), None, None, None);
        assert!(matches!(
            load_palette(&loader, "broken"),
            Err(PaletteLoadError::Parse { .. })
        ));

        let registry = load_registry(&loader);
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, ["hama", "mini", "perler"]);
        assert_eq!(registry.get("mini").unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("dup.json"),
            r##"[{"id": "x", "name": "A", "hex": "#000000"}, {"id": "x", "name": "B", "hex": "#ffffff"}]"##,
        )
        .unwrap();

        let loader = AssetLoader::new(Some(dir.path().to_path_buf()), None, None, None);
        assert!(matches!(
            load_palette(&loader, "dup"),
            Err(PaletteLoadError::Invalid(PatternError::DuplicateColorId { .. }))
        ));
    }

    #[test]
    fn test_missing_palette() {
        assert!(matches!(
            load_palette(&AssetLoader::default(), "nonexistent"),
            Err(PaletteLoadError::Io { .. })
        ));
    }
}
