pub mod palettes;
pub mod pipeline;
pub mod project_store;
pub mod renderer;
pub mod template_service;

pub use palettes::{load_palette, load_registry, PaletteLoadError};
pub use pipeline::{DecodedImage, ImagePipeline};
pub use project_store::{InMemoryProjectStore, ProjectStore};
pub use renderer::{ExportDocument, RenderService};
pub use template_service::{TemplateError, TemplateService};
