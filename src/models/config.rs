use crate::assets::AssetLoader;
use bead_pattern::layout::DEFAULT_BOARD_UNIT;
use bead_pattern::pattern::DEFAULT_MAX_DIMENSION;
use bead_pattern::DistanceMode;
use serde::Deserialize;

/// Application configuration loaded from config.yaml
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,

    /// Largest pattern side in beads before detection/downsampling kicks in
    pub max_dimension: usize,

    /// Pegs per side of one pegboard
    pub board_unit: usize,

    /// Default color distance for new projects
    pub distance: DistanceMode,

    /// Active palettes for new projects, in matching order
    pub palettes: Vec<String>,

    /// Default backdrop handling for new projects
    pub remove_background: bool,

    /// Origins allowed by the CORS layer
    pub cors_origins: Vec<String>,

    /// Size of one bead in rendered output, in pixels
    pub cell_px: u32,
}

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_CELL_PX: u32 = 16;

impl AppConfig {
    /// Load configuration from AssetLoader (embedded or external)
    pub fn load_from_assets(loader: &AssetLoader) -> Self {
        match loader.read_config_string() {
            Ok(content) => match serde_yaml::from_str::<Self>(&content) {
                Ok(config) => {
                    let config = config.sanitized();
                    tracing::info!(
                        palettes = ?config.palettes,
                        distance = %config.distance,
                        max_dimension = config.max_dimension,
                        board_unit = config.board_unit,
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(%e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(%e, "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// Replace values that would make the service unusable with defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.board_unit == 0 {
            tracing::warn!("board_unit must be at least 1, using default");
            self.board_unit = defaults.board_unit;
        }
        if self.max_dimension == 0 {
            tracing::warn!("max_dimension must be at least 1, using default");
            self.max_dimension = defaults.max_dimension;
        }
        if self.cell_px == 0 {
            tracing::warn!("cell_px must be at least 1, using default");
            self.cell_px = defaults.cell_px;
        }
        if self.palettes.is_empty() {
            tracing::warn!("No palettes configured, using default");
            self.palettes = defaults.palettes;
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_dimension: DEFAULT_MAX_DIMENSION,
            board_unit: DEFAULT_BOARD_UNIT,
            distance: DistanceMode::default(),
            palettes: vec!["perler".to_string()],
            remove_background: true,
            cors_origins: vec!["http://localhost:5173".to_string()],
            cell_px: DEFAULT_CELL_PX,
        }
    }
}
