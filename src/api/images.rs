use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Json,
};
use bead_pattern::GridInfo;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, ValidationError};
use crate::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct UploadQuery {
    /// Project name; defaults to `project-<id prefix>`
    pub name: Option<String>,
}

/// Result of a successful upload
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub project_id: String,
    pub name: String,
    /// Pattern size in beads
    pub width: usize,
    pub height: usize,
    /// Detected image format, e.g. `PNG`
    pub format: String,
    /// Size of the uploaded image in pixels
    pub source_width: usize,
    pub source_height: usize,
    /// Grid detection result
    #[schema(value_type = Object)]
    pub grid: GridInfo,
    /// Beads needed with the default background handling
    pub bead_count: usize,
    pub message: String,
}

/// Upload an image and convert it into a project
///
/// The raw image bytes form the request body. Re-uploading the same image
/// replaces its project.
#[utoipa::path(
    post,
    path = "/api/images/upload",
    params(UploadQuery),
    request_body(content = Vec<u8>, content_type = "image/*", description = "Raw image bytes"),
    responses(
        (status = 200, description = "Project created", body = UploadResponse),
        (status = 400, description = "Empty or undecodable image"),
        (status = 413, description = "Upload too large"),
        (status = 415, description = "Not an image content type"),
    ),
    tag = "Images"
)]
pub async fn handle_upload(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let max = state.config.max_upload_bytes;
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            let size = headers
                .get(header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(max + 1);
            ApiError::from(ValidationError::TooLarge { size, max })
        } else {
            ApiError::from(ValidationError::invalid("body", rejection.body_text()))
        }
    })?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let project = state
        .pipeline
        .create_project(body.to_vec(), content_type, query.name)
        .await?;

    let pattern = &project.pattern;
    let response = UploadResponse {
        success: true,
        project_id: project.id.clone(),
        name: project.name.clone(),
        width: pattern.width(),
        height: pattern.height(),
        format: project.format.clone().unwrap_or_default(),
        source_width: pattern.source_width,
        source_height: pattern.source_height,
        grid: pattern.grid_info,
        bead_count: pattern.bead_count(project.remove_background),
        message: format!(
            "Image uploaded successfully: {}x{}",
            pattern.source_width, pattern.source_height
        ),
    };

    state.projects.upsert(project).await?;
    tracing::info!(
        project_id = %response.project_id,
        beads = response.bead_count,
        "Upload converted"
    );
    Ok(Json(response))
}
