//! Asset loading with embedded fallbacks
//!
//! Palettes, SVG templates and the config file are compiled into the binary.
//! Each can be overridden from the filesystem:
//!
//! - If an env var is NOT set: use embedded assets only (no filesystem access)
//! - If an env var IS set and path is empty/missing: seed with embedded assets, then use filesystem
//! - If an env var IS set and path has files: use filesystem with embedded fallback
//!
//! Fonts are never embedded; `FONTS_DIR` adds fonts on top of the system ones.

use rust_embed::RustEmbed;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Embedded bead palettes (one JSON list of colors per file)
#[derive(RustEmbed)]
#[folder = "palettes/"]
#[include = "*.json"]
struct EmbeddedPalettes;

/// Embedded SVG templates for pattern and legend rendering
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.svg"]
struct EmbeddedTemplates;

/// Embedded default config
#[derive(RustEmbed)]
#[folder = "."]
#[include = "config.yaml"]
struct EmbeddedConfig;

const PALETTE_EXT: &str = "json";

/// Asset category for selective operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCategory {
    Palettes,
    Templates,
    Config,
}

/// Report of seeding operations
#[derive(Debug, Default)]
pub struct SeedReport {
    pub palettes_seeded: Vec<String>,
    pub templates_seeded: Vec<String>,
    pub config_seeded: bool,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        self.palettes_seeded.is_empty() && self.templates_seeded.is_empty() && !self.config_seeded
    }
}

/// Report of init (extraction) operations
#[derive(Debug, Default)]
pub struct InitReport {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
}

/// Asset loader with merge behavior and optional filesystem override
#[derive(Debug, Clone, Default)]
pub struct AssetLoader {
    /// External palettes directory (from PALETTES_DIR env var)
    palettes_dir: Option<PathBuf>,
    /// External templates directory (from TEMPLATES_DIR env var)
    templates_dir: Option<PathBuf>,
    /// Extra fonts (from FONTS_DIR env var)
    fonts_dir: Option<PathBuf>,
    /// External config file path (from CONFIG_FILE env var)
    config_file: Option<PathBuf>,
}

impl AssetLoader {
    /// Create a new asset loader
    ///
    /// Paths should be `Some` only if the corresponding env var was set.
    /// If `None`, embedded assets are used exclusively.
    pub fn new(
        palettes_dir: Option<PathBuf>,
        templates_dir: Option<PathBuf>,
        fonts_dir: Option<PathBuf>,
        config_file: Option<PathBuf>,
    ) -> Self {
        Self {
            palettes_dir,
            templates_dir,
            fonts_dir,
            config_file,
        }
    }

    /// Loader configured from `PALETTES_DIR`, `TEMPLATES_DIR`, `FONTS_DIR`
    /// and `CONFIG_FILE`.
    pub fn from_env() -> Self {
        let path = |var: &str| std::env::var(var).ok().map(PathBuf::from);
        Self::new(
            path("PALETTES_DIR"),
            path("TEMPLATES_DIR"),
            path("FONTS_DIR"),
            path("CONFIG_FILE"),
        )
    }

    pub fn palettes_dir(&self) -> Option<&Path> {
        self.palettes_dir.as_deref()
    }

    pub fn templates_dir(&self) -> Option<&Path> {
        self.templates_dir.as_deref()
    }

    pub fn fonts_dir(&self) -> Option<&Path> {
        self.fonts_dir.as_deref()
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Read the JSON definition of a palette by name (`perler` reads
    /// `perler.json`).
    pub fn read_palette(&self, name: &str) -> io::Result<Cow<'static, [u8]>> {
        let file = format!("{name}.{PALETTE_EXT}");
        read_with_fallback::<EmbeddedPalettes>(self.palettes_dir.as_deref(), &file, "Palette")
    }

    /// List all available palette names (merged view of embedded + external)
    pub fn list_palettes(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = EmbeddedPalettes::iter()
            .filter_map(|f| palette_name(&f).map(str::to_string))
            .collect();

        if let Some(ref dir) = self.palettes_dir {
            if let Ok(entries) = fs::read_dir(dir) {
                for entry in entries.flatten() {
                    if let Some(name) = entry.file_name().to_str().and_then(palette_name) {
                        names.insert(name.to_string());
                    }
                }
            }
        }

        names.into_iter().collect()
    }

    /// Read an SVG template by file name
    pub fn read_template(&self, name: &str) -> io::Result<Cow<'static, [u8]>> {
        read_with_fallback::<EmbeddedTemplates>(self.templates_dir.as_deref(), name, "Template")
    }

    /// Read a template as a UTF-8 string
    pub fn read_template_string(&self, name: &str) -> io::Result<String> {
        let bytes = self.read_template(name)?;
        String::from_utf8(bytes.into_owned())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Get font data from `FONTS_DIR` (for loading into fontdb)
    pub fn get_fonts(&self) -> Vec<(String, Cow<'static, [u8]>)> {
        let mut fonts = Vec::new();
        let Some(ref dir) = self.fonts_dir else {
            return fonts;
        };
        let Ok(entries) = fs::read_dir(dir) else {
            tracing::warn!(dir = %dir.display(), "Fonts directory not readable");
            return fonts;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let is_font = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e, "ttf" | "otf" | "woff" | "woff2"));
            if !is_font {
                continue;
            }
            match fs::read(&path) {
                Ok(data) => {
                    let name = entry.file_name().to_string_lossy().to_string();
                    tracing::trace!(font = %name, "Loading font from filesystem");
                    fonts.push((name, Cow::Owned(data)));
                }
                Err(e) => tracing::warn!(path = %path.display(), %e, "Failed to read font"),
            }
        }
        fonts
    }

    /// Read the config file
    ///
    /// If an external path is configured and exists, uses that.
    /// Otherwise falls back to embedded config.
    pub fn read_config(&self) -> io::Result<Cow<'static, [u8]>> {
        if let Some(ref path) = self.config_file {
            if path.exists() {
                tracing::trace!(path = %path.display(), "Loading config from filesystem");
                return Ok(Cow::Owned(fs::read(path)?));
            }
        }

        EmbeddedConfig::get("config.yaml")
            .map(|f| {
                tracing::trace!("Loading config from embedded assets");
                f.data
            })
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "Embedded config.yaml not found")
            })
    }

    /// Read config as a UTF-8 string
    pub fn read_config_string(&self) -> io::Result<String> {
        let bytes = self.read_config()?;
        String::from_utf8(bytes.into_owned())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Check if a directory exists and is empty (ignoring .gitkeep)
    fn is_empty_dir(path: &Path) -> bool {
        if !path.exists() || !path.is_dir() {
            return false;
        }
        path.read_dir()
            .map(|mut entries| {
                entries.all(|e| {
                    e.map(|entry| entry.file_name() == ".gitkeep")
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false)
    }

    /// Seed empty/missing directories with embedded assets
    ///
    /// Only operates on paths that were configured (env var was set).
    pub fn seed_if_configured(&self) -> io::Result<SeedReport> {
        let mut report = SeedReport::default();

        if let Some(ref dir) = self.palettes_dir {
            if !dir.exists() || Self::is_empty_dir(dir) {
                report.palettes_seeded = write_embedded::<EmbeddedPalettes>(dir)?;
                tracing::info!(
                    dir = %dir.display(),
                    count = report.palettes_seeded.len(),
                    "Seeded palettes directory with embedded assets"
                );
            }
        }

        if let Some(ref dir) = self.templates_dir {
            if !dir.exists() || Self::is_empty_dir(dir) {
                report.templates_seeded = write_embedded::<EmbeddedTemplates>(dir)?;
                tracing::info!(
                    dir = %dir.display(),
                    count = report.templates_seeded.len(),
                    "Seeded templates directory with embedded assets"
                );
            }
        }

        if let Some(ref path) = self.config_file {
            if !path.exists() {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                if let Some(data) = EmbeddedConfig::get("config.yaml") {
                    fs::write(path, &*data.data)?;
                    report.config_seeded = true;
                    tracing::info!(path = %path.display(), "Seeded config file with embedded default");
                }
            }
        }

        Ok(report)
    }

    /// Extract embedded assets to filesystem (init command)
    ///
    /// Uses the configured paths (or defaults if not set).
    pub fn init(&self, categories: &[AssetCategory], force: bool) -> io::Result<InitReport> {
        let mut report = InitReport::default();

        for category in categories {
            match category {
                AssetCategory::Palettes => {
                    let dir = self
                        .palettes_dir
                        .clone()
                        .unwrap_or_else(|| PathBuf::from("./palettes"));
                    extract_embedded::<EmbeddedPalettes>(&dir, force, &mut report)?;
                }
                AssetCategory::Templates => {
                    let dir = self
                        .templates_dir
                        .clone()
                        .unwrap_or_else(|| PathBuf::from("./templates"));
                    extract_embedded::<EmbeddedTemplates>(&dir, force, &mut report)?;
                }
                AssetCategory::Config => {
                    let path = self
                        .config_file
                        .clone()
                        .unwrap_or_else(|| PathBuf::from("./config.yaml"));

                    if !force && path.exists() {
                        report.skipped.push(path.display().to_string());
                        continue;
                    }
                    if let Some(parent) = path.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    if let Some(data) = EmbeddedConfig::get("config.yaml") {
                        fs::write(&path, &*data.data)?;
                        report.written.push(path.display().to_string());
                    }
                }
            }
        }

        Ok(report)
    }

    /// List embedded assets by category (for display)
    pub fn list_embedded(category: AssetCategory) -> Vec<String> {
        let mut files: Vec<String> = match category {
            AssetCategory::Palettes => EmbeddedPalettes::iter().map(|s| s.to_string()).collect(),
            AssetCategory::Templates => EmbeddedTemplates::iter().map(|s| s.to_string()).collect(),
            AssetCategory::Config => vec!["config.yaml".to_string()],
        };
        files.sort();
        files
    }
}

fn palette_name(file: &str) -> Option<&str> {
    file.strip_suffix(PALETTE_EXT)?.strip_suffix('.')
}

/// Filesystem first when `dir` is configured, embedded otherwise.
fn read_with_fallback<E: RustEmbed>(
    dir: Option<&Path>,
    file: &str,
    kind: &str,
) -> io::Result<Cow<'static, [u8]>> {
    if let Some(dir) = dir {
        let full_path = dir.join(file);
        if full_path.exists() {
            tracing::trace!(path = %full_path.display(), "Loading {kind} from filesystem");
            return Ok(Cow::Owned(fs::read(&full_path)?));
        }
    }

    E::get(file)
        .map(|f| {
            tracing::trace!(file, "Loading {kind} from embedded assets");
            f.data
        })
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{kind} not found: {file}")))
}

fn write_embedded<E: RustEmbed>(dir: &Path) -> io::Result<Vec<String>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for file in E::iter() {
        if let Some(data) = E::get(&file) {
            fs::write(dir.join(file.as_ref()), &*data.data)?;
            written.push(file.to_string());
        }
    }
    Ok(written)
}

fn extract_embedded<E: RustEmbed>(
    dir: &Path,
    force: bool,
    report: &mut InitReport,
) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    for file in E::iter() {
        let path = dir.join(file.as_ref());
        if !force && path.exists() {
            report.skipped.push(path.display().to_string());
            continue;
        }
        if let Some(data) = E::get(&file) {
            fs::write(&path, &*data.data)?;
            report.written.push(path.display().to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_embedded_palettes_listed() {
        let loader = AssetLoader::default();
        let names = loader.list_palettes();
        assert!(names.contains(&"perler".to_string()));
        assert!(names.contains(&"hama".to_string()));
        assert!(loader.read_palette("perler").is_ok());
    }

    #[test]
    fn test_missing_palette_is_not_found() {
        let loader = AssetLoader::default();
        let err = loader.read_palette("nope").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_external_palette_overrides_and_merges() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("perler.json"), "[]").unwrap();
        fs::write(dir.path().join("artkal.json"), "[]").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let loader = AssetLoader::new(Some(dir.path().to_path_buf()), None, None, None);
        assert_eq!(&*loader.read_palette("perler").unwrap(), b"[]");
        assert_eq!(loader.list_palettes(), ["artkal", "hama", "perler"]);
    }

    #[test]
    fn test_templates_embedded() {
        let loader = AssetLoader::default();
        let svg = loader.read_template_string("pattern.svg").unwrap();
        assert!(svg.contains("<svg"));
        assert!(loader.read_template_string("legend.svg").is_ok());
    }

    #[test]
    fn test_seed_fills_empty_dirs_only() {
        let root = TempDir::new().unwrap();
        let palettes = root.path().join("palettes");
        let templates = root.path().join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("pattern.svg"), "<svg/>").unwrap();
        let config = root.path().join("conf/config.yaml");

        let loader = AssetLoader::new(
            Some(palettes.clone()),
            Some(templates.clone()),
            None,
            Some(config.clone()),
        );
        let report = loader.seed_if_configured().unwrap();

        assert!(report.palettes_seeded.contains(&"perler.json".to_string()));
        assert!(report.templates_seeded.is_empty());
        assert!(report.config_seeded);
        assert!(palettes.join("hama.json").exists());
        assert!(config.exists());
        assert_eq!(fs::read_to_string(templates.join("pattern.svg")).unwrap(), "<svg/>");

        // second run has nothing left to do
        assert!(loader.seed_if_configured().unwrap().is_empty());
    }

    #[test]
    fn test_init_skips_existing_without_force() {
        let root = TempDir::new().unwrap();
        let config = root.path().join("config.yaml");
        fs::write(&config, "max_dimension: 50\n").unwrap();

        let loader = AssetLoader::new(None, None, None, Some(config.clone()));
        let report = loader.init(&[AssetCategory::Config], false).unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(fs::read_to_string(&config).unwrap(), "max_dimension: 50\n");

        let report = loader.init(&[AssetCategory::Config], true).unwrap();
        assert_eq!(report.written.len(), 1);
        assert!(fs::read_to_string(&config).unwrap().contains("board_unit"));
    }

    #[test]
    fn test_fonts_only_from_configured_dir() {
        assert!(AssetLoader::default().get_fonts().is_empty());

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.ttf"), b"not really a font").unwrap();
        fs::write(dir.path().join("readme.md"), b"skip").unwrap();
        let loader = AssetLoader::new(None, None, Some(dir.path().to_path_buf()), None);
        let fonts = loader.get_fonts();
        assert_eq!(fonts.len(), 1);
        assert_eq!(fonts[0].0, "a.ttf");
    }

    #[test]
    fn test_list_embedded_sorted() {
        assert_eq!(
            AssetLoader::list_embedded(AssetCategory::Palettes),
            ["hama.json", "perler.json"]
        );
        assert_eq!(
            AssetLoader::list_embedded(AssetCategory::Config),
            ["config.yaml"]
        );
    }
}
