pub mod config;
pub mod project;

pub use config::AppConfig;
pub use project::{Project, ProjectPayload, ProjectSettings, SettingsUpdate, PROJECT_VERSION};
