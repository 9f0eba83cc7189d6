//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CACHE_CONTROL, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::api;
use crate::assets::AssetLoader;
use crate::models::AppConfig;
use crate::services::{load_registry, ImagePipeline, InMemoryProjectStore, ProjectStore, RenderService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<ImagePipeline>,
    pub projects: Arc<dyn ProjectStore>,
    pub renderer: Arc<RenderService>,
}

/// Create application state from an asset loader.
///
/// Fails when a palette named in the configuration is not available.
pub fn create_app_state(asset_loader: Arc<AssetLoader>) -> anyhow::Result<AppState> {
    let config = Arc::new(AppConfig::load_from_assets(&asset_loader));
    let palettes = Arc::new(load_registry(&asset_loader));
    palettes
        .active_set(&config.palettes)
        .map_err(|e| anyhow::anyhow!("Configured palettes are not usable: {e}"))?;

    let renderer = Arc::new(RenderService::new(&asset_loader, config.cell_px)?);
    let pipeline = Arc::new(ImagePipeline::new(config.clone(), palettes));

    Ok(AppState {
        config,
        pipeline,
        projects: Arc::new(InMemoryProjectStore::new()),
        renderer,
    })
}

/// CORS for the configured frontend origins. Origins that are not valid
/// header values are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any)
}

/// Build the API router with all endpoints and middleware.
///
/// This is the core router used by both production and tests.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/", get(api::handle_root))
        .route("/health", get(api::handle_health))
        // Palettes
        .route("/api/colors/palettes", get(api::handle_list_palettes))
        .route("/api/colors/:palette", get(api::handle_palette_colors))
        .route("/api/colors/:palette/:id", get(api::handle_palette_color))
        // Upload
        .route("/api/images/upload", post(api::handle_upload))
        // Projects
        .route(
            "/api/projects/:id",
            get(api::handle_get_project).put(api::handle_import_project),
        )
        .route("/api/projects/:id/mapping", put(api::handle_set_override))
        .route("/api/projects/:id/mapping/auto", post(api::handle_auto_match))
        .route("/api/projects/:id/mapping/reset", post(api::handle_reset_mapping))
        .route("/api/projects/:id/settings", put(api::handle_update_settings))
        .route("/api/projects/:id/legend", get(api::handle_legend))
        .route("/api/projects/:id/layout", get(api::handle_layout))
        // Export
        .route("/api/projects/:id/export.png", get(api::handle_export_png))
        .route(
            "/api/projects/:id/export/document",
            get(api::handle_export_document),
        )
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Project state changes with every edit
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
}
