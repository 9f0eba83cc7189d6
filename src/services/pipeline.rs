//! Upload validation, decoding and the project editing operations.
//!
//! Every operation takes the current [`Project`] by value and returns the
//! updated one. Callers commit the result to the store only on success, so
//! a failed run leaves the stored project as it was.

use std::sync::Arc;

use bead_pattern::grid::PixelGrid;
use bead_pattern::{
    GridDetector, LayoutGeometry, LegendEntry, PaletteRegistry, PaletteSet, Pattern,
    PatternBuilder, PatternError,
};
use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::error::{ApiError, ValidationError};
use crate::models::{
    AppConfig, Project, ProjectPayload, ProjectSettings, SettingsUpdate, PROJECT_VERSION,
};

/// Hex characters kept from the SHA-256 of an upload for its project id.
const PROJECT_ID_LEN: usize = 16;

/// A decoded upload.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub pixels: PixelGrid,
    /// Detected container format, e.g. `PNG`
    pub format: String,
}

#[derive(Clone)]
pub struct ImagePipeline {
    config: Arc<AppConfig>,
    palettes: Arc<PaletteRegistry>,
    detector: GridDetector,
}

impl ImagePipeline {
    pub fn new(config: Arc<AppConfig>, palettes: Arc<PaletteRegistry>) -> Self {
        Self {
            config,
            palettes,
            detector: GridDetector::new(),
        }
    }

    /// Use a specific grid detector, e.g. a seeded one.
    pub fn with_detector(mut self, detector: GridDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn palettes(&self) -> &PaletteRegistry {
        &self.palettes
    }

    /// Check the declared media type and body size of an upload.
    pub fn validate_upload(
        &self,
        content_type: Option<&str>,
        size: usize,
    ) -> Result<(), ValidationError> {
        let media_type = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default();
        if !media_type.starts_with("image/") {
            let shown = if media_type.is_empty() {
                "none".to_string()
            } else {
                media_type
            };
            return Err(ValidationError::UnsupportedMediaType(shown));
        }
        if size == 0 {
            return Err(ValidationError::invalid("body", "upload is empty"));
        }
        let max = self.config.max_upload_bytes;
        if size > max {
            return Err(ValidationError::TooLarge { size, max });
        }
        Ok(())
    }

    /// Decode image bytes into an RGBA pixel grid.
    pub fn decode(bytes: &[u8]) -> Result<DecodedImage, ApiError> {
        let format = image::guess_format(bytes).map_err(|e| ApiError::Decode(e.to_string()))?;
        let rgba = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| ApiError::Decode(e.to_string()))?
            .into_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(ApiError::Decode("image has no pixels".to_string()));
        }
        let pixels = PixelGrid::from_rgba8(width as usize, height as usize, rgba.as_raw())?;

        tracing::debug!(width, height, ?format, "Decoded upload");
        Ok(DecodedImage {
            pixels,
            format: format!("{format:?}").to_uppercase(),
        })
    }

    /// Content-addressed id: the same image always maps to the same project.
    pub fn project_id(bytes: &[u8]) -> String {
        let digest = hex::encode(Sha256::digest(bytes));
        digest[..PROJECT_ID_LEN].to_string()
    }

    /// Concatenate the named palettes in order.
    pub fn palette_set(&self, names: &[String]) -> Result<PaletteSet, PatternError> {
        self.palettes.active_set(names)
    }

    /// Run the core pipeline on decoded pixels with the given settings.
    pub fn build_pattern(
        &self,
        pixels: &PixelGrid,
        settings: &ProjectSettings,
    ) -> Result<Pattern, ApiError> {
        let set = self.palette_set(&settings.palettes)?;
        let pattern = PatternBuilder::new(&set)
            .distance(settings.distance)
            .max_dimension(self.config.max_dimension)
            .detector(self.detector.clone())
            .build(pixels)?;
        Ok(pattern)
    }

    /// Validate, decode and convert an upload into a new project.
    pub async fn create_project(
        &self,
        body: Vec<u8>,
        content_type: Option<&str>,
        name: Option<String>,
    ) -> Result<Project, ApiError> {
        self.validate_upload(content_type, body.len())?;
        let pipeline = self.clone();
        run_blocking(move || pipeline.convert_upload(&body, name)).await
    }

    fn convert_upload(&self, body: &[u8], name: Option<String>) -> Result<Project, ApiError> {
        let decoded = Self::decode(body)?;
        let settings = ProjectSettings::from_config(&self.config);
        let pattern = self.build_pattern(&decoded.pixels, &settings)?;

        let id = Self::project_id(body);
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("project-{}", &id[..8]));
        let now = Utc::now();

        tracing::info!(
            project_id = %id,
            width = pattern.width(),
            height = pattern.height(),
            format = %decoded.format,
            "Project created"
        );
        Ok(Project {
            id,
            name,
            format: Some(decoded.format),
            pattern,
            settings,
            remove_background: self.config.remove_background,
            created_at: now,
            updated_at: now,
        })
    }

    /// Match colors automatically. With `only_empty`, mapped keys are kept.
    pub async fn auto_match(
        &self,
        project: Project,
        only_empty: bool,
    ) -> Result<(Project, usize), ApiError> {
        let pipeline = self.clone();
        run_blocking(move || {
            let mut project = project;
            let set = pipeline.palette_set(&project.settings.palettes)?;
            let pattern = &mut project.pattern;
            let written = pattern.mapping.auto_match(
                &pattern.pixels,
                &set,
                project.settings.distance,
                only_empty,
            )?;
            pattern.refresh()?;
            project.touch();
            Ok((project, written))
        })
        .await
    }

    /// Pin one color key to a bead.
    pub async fn set_override(
        &self,
        project: Project,
        key: String,
        bead_id: String,
    ) -> Result<Project, ApiError> {
        let pipeline = self.clone();
        run_blocking(move || {
            let mut project = project;
            let set = pipeline.palette_set(&project.settings.palettes)?;
            project.pattern.mapping.set_override(&key, &bead_id, &set)?;
            project.pattern.refresh()?;
            project.touch();
            Ok(project)
        })
        .await
    }

    /// Drop every override and rematch all colors.
    pub async fn reset_mapping(&self, project: Project) -> Result<(Project, usize), ApiError> {
        let pipeline = self.clone();
        run_blocking(move || {
            let mut project = project;
            let set = pipeline.palette_set(&project.settings.palettes)?;
            let pattern = &mut project.pattern;
            let written = pattern
                .mapping
                .reset_all(&pattern.pixels, &set, project.settings.distance)?;
            pattern.refresh()?;
            project.touch();
            Ok((project, written))
        })
        .await
    }

    /// Apply a settings change. A new palette list or distance mode rematches
    /// every color, overrides included.
    pub async fn update_settings(
        &self,
        project: Project,
        update: SettingsUpdate,
    ) -> Result<Project, ApiError> {
        if update.palettes.as_ref().is_some_and(Vec::is_empty) {
            return Err(ValidationError::invalid("palettes", "at least one palette is required").into());
        }
        if update.board_unit == Some(0) {
            return Err(PatternError::InvalidBoardUnit(0).into());
        }

        let pipeline = self.clone();
        run_blocking(move || {
            let mut project = project;
            let settings = &mut project.settings;
            let mut rematch = false;
            if let Some(palettes) = update.palettes {
                rematch |= palettes != settings.palettes;
                settings.palettes = palettes;
            }
            if let Some(distance) = update.distance {
                rematch |= distance != settings.distance;
                settings.distance = distance;
            }
            if let Some(board_unit) = update.board_unit {
                settings.board_unit = board_unit;
            }
            if let Some(mirror) = update.mirror {
                settings.mirror = mirror;
            }
            if let Some(remove_background) = update.remove_background {
                project.remove_background = remove_background;
            }

            if rematch {
                let set = pipeline.palette_set(&project.settings.palettes)?;
                let pattern = &mut project.pattern;
                pattern
                    .mapping
                    .on_palette_change(&pattern.pixels, &set, project.settings.distance)?;
                pattern.refresh()?;
            }
            project.touch();
            tracing::debug!(project_id = %project.id, rematch, "Settings updated");
            Ok(project)
        })
        .await
    }

    /// Rebuild a project from a saved payload.
    pub fn import(&self, id: String, payload: ProjectPayload) -> Result<Project, ApiError> {
        if payload.version != PROJECT_VERSION {
            return Err(ValidationError::invalid(
                "version",
                format!("unsupported project version {}", payload.version),
            )
            .into());
        }
        if payload.settings.palettes.is_empty() {
            return Err(ValidationError::invalid("palettes", "at least one palette is required").into());
        }
        if payload.settings.board_unit == 0 {
            return Err(PatternError::InvalidBoardUnit(0).into());
        }
        let (width, height) = payload.parsed_pixels.dimensions();
        let max = self.config.max_dimension;
        if width.max(height) > max {
            return Err(ValidationError::invalid(
                "parsedPixels",
                format!("{width}x{height} exceeds the {max} bead limit"),
            )
            .into());
        }
        let set = self.palette_set(&payload.settings.palettes)?;
        let project = Project::from_payload(id, payload, &set)?;
        tracing::info!(project_id = %project.id, "Project imported");
        Ok(project)
    }

    /// Legend for the project's current beads.
    pub fn legend(&self, project: &Project) -> Result<Vec<LegendEntry>, ApiError> {
        let set = self.palette_set(&project.settings.palettes)?;
        Ok(project.pattern.legend(&set, project.remove_background)?)
    }

    pub fn layout(&self, project: &Project) -> Result<LayoutGeometry, ApiError> {
        Ok(project.pattern.layout(project.layout_options())?)
    }
}

/// Run CPU-bound work off the async runtime.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("Pipeline task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetLoader;
    use crate::services::palettes::load_registry;
    use bead_pattern::DistanceMode;
    use image::{ImageFormat, Rgba, RgbaImage};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const WHITE: Rgba<u8> = Rgba([0xF1, 0xF1, 0xF1, 255]);
    const RED: Rgba<u8> = Rgba([0xBF, 0x2E, 0x40, 255]);

    fn pipeline() -> ImagePipeline {
        ImagePipeline::new(
            Arc::new(AppConfig::default()),
            Arc::new(load_registry(&AssetLoader::default())),
        )
        .with_detector(GridDetector::with_seed(7))
    }

    /// 8×8 sprite with a red 4×4 center, upscaled by `scale`
    fn sprite_png(scale: u32) -> Vec<u8> {
        let image = RgbaImage::from_fn(8 * scale, 8 * scale, |x, y| {
            let (sx, sy) = (x / scale, y / scale);
            if (2..6).contains(&sx) && (2..6).contains(&sy) {
                RED
            } else {
                WHITE
            }
        });
        encode(&image)
    }

    /// 8×8 checkerboard upscaled by `scale`; no coarser grid fits it
    fn checker_png(scale: u32) -> Vec<u8> {
        let image = RgbaImage::from_fn(8 * scale, 8 * scale, |x, y| {
            if (x / scale + y / scale) % 2 == 1 {
                RED
            } else {
                WHITE
            }
        });
        encode(&image)
    }

    fn encode(image: &RgbaImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    async fn created() -> Project {
        pipeline()
            .create_project(sprite_png(1), Some("image/png"), Some("heart".into()))
            .await
            .unwrap()
    }

    #[test]
    fn test_validate_upload() {
        let p = pipeline();
        assert!(p.validate_upload(Some("image/png"), 10).is_ok());
        assert!(p.validate_upload(Some("IMAGE/GIF; charset=binary"), 10).is_ok());
        assert!(matches!(
            p.validate_upload(Some("text/plain"), 10),
            Err(ValidationError::UnsupportedMediaType(t)) if t == "text/plain"
        ));
        assert!(matches!(
            p.validate_upload(None, 10),
            Err(ValidationError::UnsupportedMediaType(t)) if t == "none"
        ));
        assert!(matches!(
            p.validate_upload(Some("image/png"), 0),
            Err(ValidationError::InvalidParameter { name: "body", .. })
        ));
        assert!(matches!(
            p.validate_upload(Some("image/png"), 10 * 1024 * 1024 + 1),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_decode_png() {
        let decoded = ImagePipeline::decode(&sprite_png(2)).unwrap();
        assert_eq!(decoded.format, "PNG");
        assert_eq!(decoded.pixels.dimensions(), (16, 16));
        assert!(decoded.pixels.alpha().is_none());
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            ImagePipeline::decode(b"definitely not an image"),
            Err(ApiError::Decode(_))
        ));
    }

    #[test]
    fn test_project_id_is_content_addressed() {
        let a = ImagePipeline::project_id(b"abc");
        assert_eq!(a, "ba7816bf8f01cfea");
        assert_eq!(a, ImagePipeline::project_id(b"abc"));
        assert_ne!(a, ImagePipeline::project_id(b"abd"));
    }

    #[tokio::test]
    async fn test_create_project() {
        let project = created().await;
        assert_eq!(project.name, "heart");
        assert_eq!(project.format.as_deref(), Some("PNG"));
        assert_eq!(project.pattern.beads.bead_at(3, 3), Some("P05"));
        assert_eq!(project.pattern.beads.bead_at(0, 0), Some("P01"));
        assert_eq!(project.pattern.mask.foreground_count(), 16);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_resampled() {
        let config = AppConfig {
            max_dimension: 32,
            ..AppConfig::default()
        };
        let pipeline = ImagePipeline::new(
            Arc::new(config),
            Arc::new(load_registry(&AssetLoader::default())),
        )
        .with_detector(GridDetector::with_seed(1));

        let project = pipeline
            .create_project(checker_png(8), Some("image/png"), None)
            .await
            .unwrap();
        assert_eq!(project.pattern.source_width, 64);
        assert_eq!(project.pattern.pixels.dimensions(), (8, 8));
        assert_eq!(project.pattern.grid_info.cell_width, 8);
        assert!(project.name.starts_with("project-"));
    }

    #[tokio::test]
    async fn test_decode_error_before_conversion() {
        let result = pipeline()
            .create_project(b"GIF89a broken".to_vec(), Some("image/gif"), None)
            .await;
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn test_override_then_reset() {
        let p = pipeline();
        let project = p
            .set_override(created().await, "#BF2E40".into(), "P03".into())
            .await
            .unwrap();
        assert_eq!(project.pattern.beads.bead_at(3, 3), Some("P03"));
        assert!(project.pattern.mapping.is_overridden("#bf2e40"));

        let (project, written) = p.reset_mapping(project).await.unwrap();
        assert_eq!(written, 2);
        assert_eq!(project.pattern.beads.bead_at(3, 3), Some("P05"));
        assert!(project.pattern.mapping.overrides().is_empty());
    }

    #[tokio::test]
    async fn test_override_unknown_bead() {
        let result = pipeline()
            .set_override(created().await, "#bf2e40".into(), "H05".into())
            .await;
        assert!(matches!(
            result,
            Err(ApiError::Pattern(PatternError::UnknownBeadId(id))) if id == "H05"
        ));
    }

    #[tokio::test]
    async fn test_auto_match_only_empty_keeps_overrides() {
        let p = pipeline();
        let project = p
            .set_override(created().await, "#bf2e40".into(), "P03".into())
            .await
            .unwrap();

        let (project, written) = p.auto_match(project, true).await.unwrap();
        assert_eq!(written, 0);
        assert_eq!(project.pattern.mapping.get("#bf2e40"), Some("P03"));

        let (project, written) = p.auto_match(project, false).await.unwrap();
        assert_eq!(written, 2);
        assert_eq!(project.pattern.mapping.get("#bf2e40"), Some("P05"));
    }

    #[tokio::test]
    async fn test_palette_change_rematches_everything() {
        let p = pipeline();
        let project = p
            .set_override(created().await, "#bf2e40".into(), "P03".into())
            .await
            .unwrap();

        let update = SettingsUpdate {
            palettes: Some(vec!["hama".into()]),
            ..SettingsUpdate::default()
        };
        let project = p.update_settings(project, update).await.unwrap();
        assert_eq!(project.settings.palettes, ["hama"]);
        assert!(project.pattern.mapping.overrides().is_empty());
        assert!(project
            .pattern
            .beads
            .bead_ids()
            .iter()
            .all(|id| id.starts_with('H')));
    }

    #[tokio::test]
    async fn test_layout_only_update_keeps_mapping() {
        let p = pipeline();
        let project = p
            .set_override(created().await, "#bf2e40".into(), "P03".into())
            .await
            .unwrap();

        let update = SettingsUpdate {
            board_unit: Some(14),
            mirror: Some(true),
            distance: Some(DistanceMode::Ciede2000),
            ..SettingsUpdate::default()
        };
        let project = p.update_settings(project, update).await.unwrap();
        assert_eq!(project.settings.board_unit, 14);
        assert!(project.settings.mirror);
        assert_eq!(project.pattern.mapping.get("#bf2e40"), Some("P03"));
    }

    #[tokio::test]
    async fn test_invalid_settings_rejected() {
        let p = pipeline();
        let project = created().await;

        let empty = SettingsUpdate {
            palettes: Some(Vec::new()),
            ..SettingsUpdate::default()
        };
        assert!(matches!(
            p.update_settings(project.clone(), empty).await,
            Err(ApiError::Validation(_))
        ));

        let zero = SettingsUpdate {
            board_unit: Some(0),
            ..SettingsUpdate::default()
        };
        assert!(matches!(
            p.update_settings(project.clone(), zero).await,
            Err(ApiError::Pattern(PatternError::InvalidBoardUnit(0)))
        ));

        let unknown = SettingsUpdate {
            palettes: Some(vec!["artkal".into()]),
            ..SettingsUpdate::default()
        };
        assert!(matches!(
            p.update_settings(project, unknown).await,
            Err(ApiError::Pattern(PatternError::UnknownPalette(_)))
        ));
    }

    #[tokio::test]
    async fn test_import_round_trip_and_version_check() {
        let p = pipeline();
        let project = created().await;

        let restored = p.import(project.id.clone(), project.to_payload()).unwrap();
        assert_eq!(restored.pattern, project.pattern);

        let mut payload = project.to_payload();
        payload.version = 2;
        assert!(matches!(
            p.import(project.id.clone(), payload),
            Err(ApiError::Validation(ValidationError::InvalidParameter { name: "version", .. }))
        ));
    }

    #[tokio::test]
    async fn test_import_rejects_oversized_pixels() {
        let project = created().await;
        let config = AppConfig {
            max_dimension: 4,
            ..AppConfig::default()
        };
        let small = ImagePipeline::new(
            Arc::new(config),
            Arc::new(load_registry(&AssetLoader::default())),
        );

        assert!(matches!(
            small.import(project.id.clone(), project.to_payload()),
            Err(ApiError::Validation(ValidationError::InvalidParameter { name: "parsedPixels", .. }))
        ));
    }

    #[tokio::test]
    async fn test_legend_and_layout() {
        let p = pipeline();
        let project = created().await;

        let legend = p.legend(&project).unwrap();
        assert_eq!(legend.len(), 1);
        assert_eq!(legend[0].bead_id, "P05");
        assert_eq!(legend[0].count, 16);

        let geometry = p.layout(&project).unwrap();
        assert_eq!((geometry.content_width, geometry.content_height), (4, 4));
        assert_eq!(geometry.board_count(), 1);
    }
}
