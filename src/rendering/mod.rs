pub mod pattern_view;
pub mod svg_to_png;

pub use pattern_view::{LegendView, PatternView};
pub use svg_to_png::SvgRenderer;
