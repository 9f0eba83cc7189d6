use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::api::projects::load_project;
use crate::error::ApiError;
use crate::models::Project;
use crate::server::AppState;
use crate::services::pipeline::run_blocking;
use crate::services::ExportDocument;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ExportQuery {
    /// Print legend labels on the beads
    #[serde(default)]
    pub labels: bool,
}

/// Pattern SVG plus everything needed to render it, built in a blocking task.
async fn pattern_svg(state: &AppState, project: Project, labels: bool) -> Result<String, ApiError> {
    let pipeline = state.pipeline.clone();
    let renderer = state.renderer.clone();
    run_blocking(move || {
        let set = pipeline.palette_set(&project.settings.palettes)?;
        let legend = pipeline.legend(&project)?;
        let geometry = pipeline.layout(&project)?;
        Ok(renderer.pattern_svg(&project.pattern, &geometry, &legend, &set, labels)?)
    })
    .await
}

async fn document(state: &AppState, project: Project) -> Result<ExportDocument, ApiError> {
    let pipeline = state.pipeline.clone();
    let renderer = state.renderer.clone();
    run_blocking(move || {
        let set = pipeline.palette_set(&project.settings.palettes)?;
        let legend = pipeline.legend(&project)?;
        let geometry = pipeline.layout(&project)?;
        Ok(renderer.document(&project.name, &project.pattern, &geometry, &legend, &set)?)
    })
    .await
}

/// Render the pattern as PNG
#[utoipa::path(
    get,
    path = "/api/projects/{id}/export.png",
    params(("id" = String, Path, description = "Project id"), ExportQuery),
    responses(
        (status = 200, description = "Rendered pattern", content_type = "image/png"),
        (status = 404, description = "Unknown project"),
    ),
    tag = "Export"
)]
pub async fn handle_export_png(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let project = load_project(&state, &id).await?;
    let disposition = format!("inline; filename=\"{}.png\"", file_stem(&project.name));
    let svg = pattern_svg(&state, project, query.labels).await?;
    let png = state.renderer.render_png(svg).await?;

    tracing::info!(project_id = %id, bytes = png.len(), "Exported PNG");
    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        png,
    )
        .into_response())
}

/// Printable document: labelled chart and legend, one SVG per page
#[utoipa::path(
    get,
    path = "/api/projects/{id}/export/document",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "Document pages", body = ExportDocument),
        (status = 404, description = "Unknown project"),
    ),
    tag = "Export"
)]
pub async fn handle_export_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExportDocument>, ApiError> {
    let project = load_project(&state, &id).await?;
    Ok(Json(document(&state, project).await?))
}

/// Project name reduced to characters safe in a header filename.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "pattern".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetLoader;
    use crate::server::create_app_state;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::sync::Arc;

    /// 6x6 white image with a red 2x2 center
    fn sprite_png() -> Vec<u8> {
        let image = RgbaImage::from_fn(6, 6, |x, y| {
            if (2..4).contains(&x) && (2..4).contains(&y) {
                Rgba([0xBF, 0x2E, 0x40, 255])
            } else {
                Rgba([0xF1, 0xF1, 0xF1, 255])
            }
        });
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    async fn state_and_project() -> (AppState, Project) {
        let state = create_app_state(Arc::new(AssetLoader::default())).unwrap();
        let project = state
            .pipeline
            .create_project(sprite_png(), Some("image/png"), Some("dot".into()))
            .await
            .unwrap();
        (state, project)
    }

    #[tokio::test]
    async fn test_pattern_svg_renders_in_blocking_task() {
        let (state, project) = state_and_project().await;
        let svg = pattern_svg(&state, project, true).await.unwrap();
        assert_eq!(svg.matches(r##"fill="#bf2e40""##).count(), 4);
        assert!(svg.contains("<text"));
    }

    #[tokio::test]
    async fn test_document_renders_in_blocking_task() {
        let (state, project) = state_and_project().await;
        let doc = document(&state, project).await.unwrap();
        assert_eq!(doc.title, "dot");
        assert_eq!(doc.pages.len(), 2);
        assert!(doc.pages[1].contains(">4</text>"));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("my heart"), "my_heart");
        assert_eq!(file_stem("a\"b\\c"), "a_b_c");
        assert_eq!(file_stem(""), "pattern");
    }
}
