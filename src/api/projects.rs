use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    response::Json,
};
use bead_pattern::{BoardRect, LayoutGeometry, LegendEntry};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::{Project, ProjectPayload, SettingsUpdate};
use crate::server::AppState;

/// Fetch a stored project or fail with 404.
pub(crate) async fn load_project(state: &AppState, id: &str) -> Result<Project, ApiError> {
    state
        .projects
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::ProjectNotFound(id.to_string()))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverrideRequest {
    /// Source color, `#rrggbb`
    pub key: String,
    pub bead_id: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutoMatchRequest {
    /// Only match colors that have no bead yet
    #[serde(default)]
    pub only_empty: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MappingResponse {
    /// Number of colors written by this operation
    pub updated: usize,
    pub color_mapping: BTreeMap<String, String>,
    pub overridden_keys: Vec<String>,
}

impl MappingResponse {
    fn new(project: &Project, updated: usize) -> Self {
        let mapping = &project.pattern.mapping;
        Self {
            updated,
            color_mapping: mapping.entries().clone(),
            overridden_keys: mapping.overrides().iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LegendResponse {
    #[schema(value_type = Vec<Object>)]
    pub entries: Vec<LegendEntry>,
    pub total: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResponse {
    #[schema(value_type = Object)]
    pub geometry: LayoutGeometry,
    #[schema(value_type = Vec<Object>)]
    pub boards: Vec<BoardRect>,
    pub bead_count: usize,
}

/// Export a project as its persistence payload
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "Saved project", body = ProjectPayload),
        (status = 404, description = "Unknown project"),
    ),
    tag = "Projects"
)]
pub async fn handle_get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProjectPayload>, ApiError> {
    let project = load_project(&state, &id).await?;
    Ok(Json(project.to_payload()))
}

/// Import a saved project under the given id
///
/// The bead grid and mask are restored as saved after validation against
/// the pixel grid and the project's palettes.
#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    params(("id" = String, Path, description = "Project id")),
    request_body = ProjectPayload,
    responses(
        (status = 200, description = "Project imported", body = ProjectPayload),
        (status = 400, description = "Invalid payload"),
    ),
    tag = "Projects"
)]
pub async fn handle_import_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ProjectPayload>,
) -> Result<Json<ProjectPayload>, ApiError> {
    let project = state.pipeline.import(id, payload)?;
    let response = project.to_payload();
    state.projects.upsert(project).await?;
    Ok(Json(response))
}

/// Pin one color to a bead
#[utoipa::path(
    put,
    path = "/api/projects/{id}/mapping",
    params(("id" = String, Path, description = "Project id")),
    request_body = OverrideRequest,
    responses(
        (status = 200, description = "Override recorded", body = MappingResponse),
        (status = 400, description = "Invalid key or unknown bead"),
        (status = 404, description = "Unknown project"),
    ),
    tag = "Mapping"
)]
pub async fn handle_set_override(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<OverrideRequest>,
) -> Result<Json<MappingResponse>, ApiError> {
    let project = load_project(&state, &id).await?;
    let project = state
        .pipeline
        .set_override(project, request.key, request.bead_id)
        .await?;
    let response = MappingResponse::new(&project, 1);
    state.projects.upsert(project).await?;
    Ok(Json(response))
}

/// Match colors automatically
#[utoipa::path(
    post,
    path = "/api/projects/{id}/mapping/auto",
    params(("id" = String, Path, description = "Project id")),
    request_body = AutoMatchRequest,
    responses(
        (status = 200, description = "Colors matched", body = MappingResponse),
        (status = 404, description = "Unknown project"),
    ),
    tag = "Mapping"
)]
pub async fn handle_auto_match(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Option<Json<AutoMatchRequest>>,
) -> Result<Json<MappingResponse>, ApiError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let project = load_project(&state, &id).await?;
    let (project, updated) = state
        .pipeline
        .auto_match(project, request.only_empty)
        .await?;
    let response = MappingResponse::new(&project, updated);
    state.projects.upsert(project).await?;
    Ok(Json(response))
}

/// Drop all overrides and rematch every color
#[utoipa::path(
    post,
    path = "/api/projects/{id}/mapping/reset",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "Mapping reset", body = MappingResponse),
        (status = 404, description = "Unknown project"),
    ),
    tag = "Mapping"
)]
pub async fn handle_reset_mapping(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MappingResponse>, ApiError> {
    let project = load_project(&state, &id).await?;
    let (project, updated) = state.pipeline.reset_mapping(project).await?;
    let response = MappingResponse::new(&project, updated);
    state.projects.upsert(project).await?;
    Ok(Json(response))
}

/// Change matching or layout settings
///
/// A different palette list or distance mode rematches every color and
/// discards overrides.
#[utoipa::path(
    put,
    path = "/api/projects/{id}/settings",
    params(("id" = String, Path, description = "Project id")),
    request_body = SettingsUpdate,
    responses(
        (status = 200, description = "Updated project", body = ProjectPayload),
        (status = 400, description = "Invalid settings"),
        (status = 404, description = "Unknown project"),
    ),
    tag = "Projects"
)]
pub async fn handle_update_settings(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<ProjectPayload>, ApiError> {
    let project = load_project(&state, &id).await?;
    let project = state.pipeline.update_settings(project, update).await?;
    let response = project.to_payload();
    state.projects.upsert(project).await?;
    Ok(Json(response))
}

/// Bead counts and labels
#[utoipa::path(
    get,
    path = "/api/projects/{id}/legend",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "Legend sorted by count", body = LegendResponse),
        (status = 404, description = "Unknown project"),
    ),
    tag = "Projects"
)]
pub async fn handle_legend(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LegendResponse>, ApiError> {
    let project = load_project(&state, &id).await?;
    let entries = state.pipeline.legend(&project)?;
    let total = bead_pattern::legend::total_beads(&entries);
    Ok(Json(LegendResponse { entries, total }))
}

/// Pegboard layout
#[utoipa::path(
    get,
    path = "/api/projects/{id}/layout",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "Board geometry", body = LayoutResponse),
        (status = 404, description = "Unknown project"),
    ),
    tag = "Projects"
)]
pub async fn handle_layout(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LayoutResponse>, ApiError> {
    let project = load_project(&state, &id).await?;
    let geometry = state.pipeline.layout(&project)?;
    Ok(Json(LayoutResponse {
        boards: geometry.boards().collect(),
        bead_count: project.pattern.bead_count(project.remove_background),
        geometry,
    }))
}
