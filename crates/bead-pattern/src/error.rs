//! Error types for the pattern pipeline.

use thiserror::Error;

/// Errors raised by the core pattern operations.
///
/// Degenerate layouts (no foreground cells) are not errors: the layout
/// engine falls back to the whole grid instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The matcher was invoked with an empty candidate set.
    #[error("no palette colors available for matching")]
    NoPaletteColors,

    /// A hex color string could not be parsed.
    #[error("invalid hex color {value:?}: {reason}")]
    InvalidHex { value: String, reason: String },

    /// Two grids that must share dimensions do not.
    #[error("dimension mismatch: expected {expected_width}x{expected_height}, got {width}x{height}")]
    DimensionMismatch {
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },

    /// A cell size does not evenly divide the image dimensions.
    #[error("cell size {cell_size} does not divide {width}x{height}")]
    InvalidCellSize {
        cell_size: usize,
        width: usize,
        height: usize,
    },

    /// Board unit must be at least one cell.
    #[error("board unit must be at least 1, got {0}")]
    InvalidBoardUnit(usize),

    /// A bead id is not part of the active palette set.
    #[error("unknown bead id: {0}")]
    UnknownBeadId(String),

    /// A palette name is not registered.
    #[error("unknown palette: {0}")]
    UnknownPalette(String),

    /// Two colors in one palette share an id.
    #[error("duplicate color id {id:?} in palette {palette:?}")]
    DuplicateColorId { palette: String, id: String },
}

pub type Result<T> = std::result::Result<T, PatternError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PatternError::NoPaletteColors.to_string(),
            "no palette colors available for matching"
        );
        assert_eq!(
            PatternError::InvalidCellSize {
                cell_size: 3,
                width: 8,
                height: 8
            }
            .to_string(),
            "cell size 3 does not divide 8x8"
        );
        assert_eq!(
            PatternError::DimensionMismatch {
                expected_width: 2,
                expected_height: 2,
                width: 3,
                height: 2
            }
            .to_string(),
            "dimension mismatch: expected 2x2, got 3x2"
        );
    }
}
