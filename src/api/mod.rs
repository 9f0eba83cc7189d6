pub mod colors;
pub mod export;
pub mod health;
pub mod images;
pub mod projects;

pub use colors::{
    handle_list_palettes, handle_palette_color, handle_palette_colors, BeadColorResponse,
    PaletteColorsResponse, PaletteListResponse, __path_handle_list_palettes,
    __path_handle_palette_color, __path_handle_palette_colors,
};
pub use export::{
    handle_export_document, handle_export_png, __path_handle_export_document,
    __path_handle_export_png,
};
pub use health::{
    handle_health, handle_root, HealthResponse, RootResponse, __path_handle_health,
    __path_handle_root,
};
pub use images::{handle_upload, UploadResponse, __path_handle_upload};
pub use projects::{
    handle_auto_match, handle_get_project, handle_import_project, handle_layout, handle_legend,
    handle_reset_mapping, handle_set_override, handle_update_settings, AutoMatchRequest,
    LayoutResponse, LegendResponse, MappingResponse, OverrideRequest, __path_handle_auto_match,
    __path_handle_get_project, __path_handle_import_project, __path_handle_layout,
    __path_handle_legend, __path_handle_reset_mapping, __path_handle_set_override,
    __path_handle_update_settings,
};
