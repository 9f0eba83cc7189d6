//! Pegboard tiling
//!
//! Beads are placed on square pegboards of `board_unit × board_unit` pegs.
//! The layout trims the pattern to the subject's bounding box, counts how
//! many boards are needed per axis, and places the content on that board
//! grid centred horizontally and resting on the bottom edge:
//!
//! ```text
//!  board grid (2×1 boards)
//! +-------------+-------------+
//! |             |             |
//! |   offsetX   +------+      |   offsetY = boardGridHeight - contentHeight
//! |<----------->|content      |
//! |             |      |      |
//! +-------------+------+------+
//! ```
//!
//! With `mirror` enabled the subject is read right-to-left (source column
//! `width - 1 - x`) and the bounding box is computed in that mirrored view.

use serde::Serialize;

use crate::error::{PatternError, Result};
use crate::grid::BackgroundMask;

/// Layout parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutOptions {
    pub remove_background: bool,
    pub board_unit: usize,
    pub mirror: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            remove_background: true,
            board_unit: DEFAULT_BOARD_UNIT,
            mirror: false,
        }
    }
}

/// Pegs per side of a standard large square pegboard.
pub const DEFAULT_BOARD_UNIT: usize = 29;

/// Inclusive cell bounds, in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl BoundingBox {
    pub fn width(&self) -> usize {
        self.max_x + 1 - self.min_x
    }

    pub fn height(&self) -> usize {
        self.max_y + 1 - self.min_y
    }
}

/// One cell placed on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub canvas_x: usize,
    pub canvas_y: usize,
    pub source_x: usize,
    pub source_y: usize,
}

/// One board of the board grid, in canvas cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardRect {
    pub column: usize,
    pub row: usize,
    pub x: usize,
    pub y: usize,
    pub size: usize,
}

/// Computed placement of a pattern on its pegboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutGeometry {
    pub source_width: usize,
    pub source_height: usize,
    /// `None` only for an empty grid
    pub bounding_box: Option<BoundingBox>,
    pub content_width: usize,
    pub content_height: usize,
    pub board_unit: usize,
    pub boards_x: usize,
    pub boards_y: usize,
    pub board_grid_width: usize,
    pub board_grid_height: usize,
    pub offset_x: usize,
    pub offset_y: usize,
    pub mirror: bool,
    pub remove_background: bool,
}

/// Compute the board layout for a masked pattern.
///
/// Falls back to the whole grid when `remove_background` is off or no
/// foreground cell exists.
pub fn layout(mask: &BackgroundMask, options: LayoutOptions) -> Result<LayoutGeometry> {
    let LayoutOptions {
        remove_background,
        board_unit,
        mirror,
    } = options;
    if board_unit == 0 {
        return Err(PatternError::InvalidBoardUnit(board_unit));
    }

    let (width, height) = mask.dimensions();
    let whole = (width > 0 && height > 0).then(|| BoundingBox {
        min_x: 0,
        min_y: 0,
        max_x: width - 1,
        max_y: height - 1,
    });

    let bounding_box = if remove_background {
        foreground_bounds(mask, mirror).or_else(|| {
            if whole.is_some() {
                tracing::debug!("No foreground cells; laying out the whole grid");
            }
            whole
        })
    } else {
        whole
    };

    let (content_width, content_height) =
        bounding_box.map_or((0, 0), |b| (b.width(), b.height()));
    let boards_x = content_width.div_ceil(board_unit);
    let boards_y = content_height.div_ceil(board_unit);
    let board_grid_width = boards_x * board_unit;
    let board_grid_height = boards_y * board_unit;

    Ok(LayoutGeometry {
        source_width: width,
        source_height: height,
        bounding_box,
        content_width,
        content_height,
        board_unit,
        boards_x,
        boards_y,
        board_grid_width,
        board_grid_height,
        offset_x: (board_grid_width - content_width) / 2,
        offset_y: board_grid_height - content_height,
        mirror,
        remove_background,
    })
}

/// Tight bounds of non-background cells in the (possibly mirrored) view.
fn foreground_bounds(mask: &BackgroundMask, mirror: bool) -> Option<BoundingBox> {
    let width = mask.width();
    let mut bounds: Option<BoundingBox> = None;
    for (y, row) in mask.rows().enumerate() {
        for (x, &background) in row.iter().enumerate() {
            if background {
                continue;
            }
            let vx = if mirror { width - 1 - x } else { x };
            bounds = Some(match bounds {
                None => BoundingBox {
                    min_x: vx,
                    min_y: y,
                    max_x: vx,
                    max_y: y,
                },
                Some(b) => BoundingBox {
                    min_x: b.min_x.min(vx),
                    min_y: b.min_y.min(y),
                    max_x: b.max_x.max(vx),
                    max_y: b.max_y.max(y),
                },
            });
        }
    }
    bounds
}

impl LayoutGeometry {
    /// Source column read for view column `vx`.
    #[inline]
    pub fn source_x(&self, vx: usize) -> usize {
        if self.mirror {
            self.source_width - 1 - vx
        } else {
            vx
        }
    }

    /// Canvas position of view cell `(vx, y)`, or `None` outside the
    /// bounding box.
    pub fn to_canvas(&self, vx: usize, y: usize) -> Option<(usize, usize)> {
        let b = self.bounding_box?;
        if vx < b.min_x || vx > b.max_x || y < b.min_y || y > b.max_y {
            return None;
        }
        Some((vx - b.min_x + self.offset_x, y - b.min_y + self.offset_y))
    }

    /// Every cell of the bounding box with its canvas and source position,
    /// row by row.
    pub fn cells(&self) -> impl Iterator<Item = Placement> + '_ {
        let (xs, ys) = match self.bounding_box {
            Some(b) => (b.min_x..b.max_x + 1, b.min_y..b.max_y + 1),
            None => (0..0, 0..0),
        };
        ys.flat_map(move |y| {
            xs.clone().map(move |vx| {
                let (canvas_x, canvas_y) = self
                    .to_canvas(vx, y)
                    .unwrap_or((self.offset_x, self.offset_y));
                Placement {
                    canvas_x,
                    canvas_y,
                    source_x: self.source_x(vx),
                    source_y: y,
                }
            })
        })
    }

    /// Boards in row-major order.
    pub fn boards(&self) -> impl Iterator<Item = BoardRect> + '_ {
        (0..self.boards_y).flat_map(move |row| {
            (0..self.boards_x).map(move |column| BoardRect {
                column,
                row,
                x: column * self.board_unit,
                y: row * self.board_unit,
                size: self.board_unit,
            })
        })
    }

    /// Canvas x positions of vertical board edges, outer edges included.
    pub fn vertical_board_lines(&self) -> Vec<usize> {
        (0..=self.boards_x).map(|i| i * self.board_unit).collect()
    }

    /// Canvas y positions of horizontal board edges, outer edges included.
    pub fn horizontal_board_lines(&self) -> Vec<usize> {
        (0..=self.boards_y).map(|i| i * self.board_unit).collect()
    }

    pub fn board_count(&self) -> usize {
        self.boards_x * self.boards_y
    }
}
