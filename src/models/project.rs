//! Project sessions and their JSON persistence payload.

use std::collections::BTreeMap;

use bead_pattern::{
    BackgroundMask, BeadGrid, ColorMapping, DistanceMode, GridInfo, LayoutOptions, PaletteSet,
    Pattern, PatternError, PixelGrid,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::AppConfig;

/// Current version of the persisted project format.
pub const PROJECT_VERSION: u32 = 1;

/// Per-project settings that affect matching and layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    /// Color distance: `rgb`, `cie76` or `ciede2000`
    #[schema(value_type = String, example = "ciede2000")]
    pub distance: DistanceMode,
    /// Active palettes, in matching order
    pub palettes: Vec<String>,
    /// Pegs per board side
    pub board_unit: usize,
    /// Lay out the pattern mirrored (for ironing from the back)
    #[serde(default)]
    pub mirror: bool,
}

impl ProjectSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            distance: config.distance,
            palettes: config.palettes.clone(),
            board_unit: config.board_unit,
            mirror: false,
        }
    }
}

/// Partial settings change; absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[schema(value_type = Option<String>, example = "rgb")]
    pub distance: Option<DistanceMode>,
    pub palettes: Option<Vec<String>>,
    pub board_unit: Option<usize>,
    pub mirror: Option<bool>,
    pub remove_background: Option<bool>,
}

/// A converted image being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Decoded image format of the upload, when known
    pub format: Option<String>,
    pub pattern: Pattern,
    pub settings: ProjectSettings,
    pub remove_background: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            remove_background: self.remove_background,
            board_unit: self.settings.board_unit,
            mirror: self.settings.mirror,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn to_payload(&self) -> ProjectPayload {
        ProjectPayload {
            version: PROJECT_VERSION,
            project_name: self.name.clone(),
            parsed_pixels: self.pattern.pixels.clone(),
            bead_grid: self.pattern.beads.clone(),
            background_mask: self.pattern.mask.clone(),
            remove_background: self.remove_background,
            color_mapping: self.pattern.mapping.entries().clone(),
            overridden_keys: self.pattern.mapping.overrides().iter().cloned().collect(),
            settings: self.settings.clone(),
            grid_info: Some(self.pattern.grid_info),
            source_width: Some(self.pattern.source_width),
            source_height: Some(self.pattern.source_height),
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        }
    }

    /// Rebuild a project from an imported payload.
    ///
    /// The stored bead grid and mask are kept as saved, after checking that
    /// they match the pixel grid and only name beads of `palette`.
    pub fn from_payload(
        id: String,
        payload: ProjectPayload,
        palette: &PaletteSet,
    ) -> Result<Self, PatternError> {
        let (width, height) = payload.parsed_pixels.dimensions();
        payload.bead_grid.ensure_dimensions(width, height)?;
        payload.background_mask.ensure_dimensions(width, height)?;

        if let Some(id) = payload.bead_grid.bead_ids().into_iter().find(|id| !palette.contains(id)) {
            return Err(PatternError::UnknownBeadId(id.to_string()));
        }
        let mapping = ColorMapping::from_parts(payload.color_mapping, payload.overridden_keys)?;
        mapping.validate(palette)?;

        let grid_info = payload
            .grid_info
            .unwrap_or_else(|| bead_pattern::pattern::identity_grid(width, height));
        let now = Utc::now();
        Ok(Self {
            id,
            name: payload.project_name,
            format: None,
            pattern: Pattern {
                source_width: payload.source_width.unwrap_or(width),
                source_height: payload.source_height.unwrap_or(height),
                grid_info,
                pixels: payload.parsed_pixels,
                mapping,
                beads: payload.bead_grid,
                mask: payload.background_mask,
            },
            settings: payload.settings,
            remove_background: payload.remove_background,
            created_at: payload.created_at.unwrap_or(now),
            updated_at: now,
        })
    }
}

/// Saved project, as exchanged with the frontend.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPayload {
    pub version: u32,
    pub project_name: String,
    /// `{width, height, grid}` with `grid` as rows of `{r, g, b}`
    #[schema(value_type = Object)]
    pub parsed_pixels: PixelGrid,
    /// Rows of bead ids, `null` for unmapped cells
    #[schema(value_type = Vec<Vec<Option<String>>>)]
    pub bead_grid: BeadGrid,
    /// Rows of booleans, `true` for backdrop
    #[schema(value_type = Vec<Vec<bool>>)]
    pub background_mask: BackgroundMask,
    pub remove_background: bool,
    /// Lowercase `#rrggbb` to bead id
    pub color_mapping: BTreeMap<String, String>,
    #[serde(default)]
    pub overridden_keys: Vec<String>,
    pub settings: ProjectSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub grid_info: Option<GridInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_width: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_height: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
