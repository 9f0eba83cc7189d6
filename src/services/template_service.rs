use crate::assets::AssetLoader;
use crate::error::RenderError;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

/// Template used for the bead chart.
pub const PATTERN_TEMPLATE: &str = "pattern.svg";
/// Template used for the color legend.
pub const LEGEND_TEMPLATE: &str = "legend.svg";

/// Error type for template rendering
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Template error: {0}")]
    Tera(#[from] tera::Error),

    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Failed to read template: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TemplateError> for RenderError {
    fn from(e: TemplateError) -> Self {
        RenderError::Template(e.to_string())
    }
}

/// Service for rendering the export SVG templates with Tera
///
/// Templates come from `TEMPLATES_DIR` when set, falling back to the
/// embedded copies, and are compiled once at startup.
pub struct TemplateService {
    tera: Tera,
}

impl TemplateService {
    /// Load and compile the pattern and legend templates
    pub fn new(loader: &AssetLoader) -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        for name in [PATTERN_TEMPLATE, LEGEND_TEMPLATE] {
            let source = loader.read_template_string(name).map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => TemplateError::NotFound(name.to_string()),
                _ => TemplateError::Io(e),
            })?;
            tera.add_raw_template(name, &source)?;
        }
        Self::register_filters(&mut tera);

        tracing::info!(
            templates = tera.get_template_names().count(),
            "Template service initialized"
        );

        Ok(Self { tera })
    }

    /// Register custom Tera filters
    fn register_filters(tera: &mut Tera) {
        // coord filter: numbers rounded to two decimals for compact SVG
        tera.register_filter(
            "coord",
            |value: &tera::Value, _: &HashMap<String, tera::Value>| {
                let n = tera::try_get_value!("coord", "value", f64, value);
                let rounded = (n * 100.0).round() / 100.0;
                let text = if rounded.fract() == 0.0 {
                    format!("{rounded:.0}")
                } else {
                    rounded.to_string()
                };
                Ok(tera::Value::String(text))
            },
        );
    }

    /// Render a template with the given data
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, TemplateError> {
        if !self.tera.get_template_names().any(|t| t == name) {
            return Err(TemplateError::NotFound(name.to_string()));
        }
        let context = Context::from_serialize(data)?;
        Ok(self.tera.render(name, &context)?)
    }
}
