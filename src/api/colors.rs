use axum::{
    extract::{Path, State},
    response::Json,
};
use bead_pattern::{Palette, PaletteColor};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::server::AppState;

/// One bead color of a palette
#[derive(Debug, Serialize, ToSchema)]
pub struct BeadColorResponse {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// `#RRGGBB`
    pub hex: String,
}

impl From<&PaletteColor> for BeadColorResponse {
    fn from(color: &PaletteColor) -> Self {
        Self {
            id: color.id.clone(),
            name: color.name.clone(),
            code: color.code.clone(),
            hex: color.hex.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaletteListResponse {
    /// Every loaded palette
    pub palettes: Vec<String>,
    /// Palettes used for new projects, in matching order
    pub active: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaletteColorsResponse {
    pub palette: String,
    pub colors: Vec<BeadColorResponse>,
}

fn find_palette<'a>(state: &'a AppState, name: &str) -> Result<&'a Palette, ApiError> {
    state
        .pipeline
        .palettes()
        .get(name)
        .ok_or_else(|| ApiError::NotFound(format!("Palette {name}")))
}

/// List palettes
#[utoipa::path(
    get,
    path = "/api/colors/palettes",
    responses((status = 200, description = "Loaded and active palettes", body = PaletteListResponse)),
    tag = "Colors"
)]
pub async fn handle_list_palettes(State(state): State<AppState>) -> Json<PaletteListResponse> {
    Json(PaletteListResponse {
        palettes: state.pipeline.palettes().names().map(str::to_string).collect(),
        active: state.config.palettes.clone(),
    })
}

/// All colors of a palette, in matching order
#[utoipa::path(
    get,
    path = "/api/colors/{palette}",
    params(("palette" = String, Path, description = "Palette name, e.g. `perler`")),
    responses(
        (status = 200, description = "Palette colors", body = PaletteColorsResponse),
        (status = 404, description = "Unknown palette"),
    ),
    tag = "Colors"
)]
pub async fn handle_palette_colors(
    State(state): State<AppState>,
    Path(palette): Path<String>,
) -> Result<Json<PaletteColorsResponse>, ApiError> {
    let found = find_palette(&state, &palette)?;
    tracing::debug!(palette = found.name(), colors = found.len(), "Returning palette");
    Ok(Json(PaletteColorsResponse {
        palette: found.name().to_string(),
        colors: found.colors().iter().map(BeadColorResponse::from).collect(),
    }))
}

/// One color by id
#[utoipa::path(
    get,
    path = "/api/colors/{palette}/{id}",
    params(
        ("palette" = String, Path, description = "Palette name"),
        ("id" = String, Path, description = "Color id, e.g. `P01`"),
    ),
    responses(
        (status = 200, description = "The color", body = BeadColorResponse),
        (status = 404, description = "Unknown palette or color"),
    ),
    tag = "Colors"
)]
pub async fn handle_palette_color(
    State(state): State<AppState>,
    Path((palette, id)): Path<(String, String)>,
) -> Result<Json<BeadColorResponse>, ApiError> {
    let found = find_palette(&state, &palette)?;
    let color = found.get(&id).ok_or_else(|| {
        tracing::warn!(palette = %palette, color_id = %id, "Color not found");
        ApiError::NotFound(format!("Color {id}"))
    })?;
    Ok(Json(BeadColorResponse::from(color)))
}
