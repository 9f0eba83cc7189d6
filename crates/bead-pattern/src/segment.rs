//! Backdrop detection
//!
//! Two phases, the first that applies wins:
//!
//! 1. **Alpha**: when an alpha channel is present and any pixel is not
//!    fully opaque, the mask is exactly `alpha < 255`.
//! 2. **Connected regions**: cells are grouped into 4-connected components
//!    of equal bead id (an empty cell is its own id). Of the components
//!    touching the grid border, the largest one is the backdrop. Equal
//!    sizes resolve to the component whose first cell comes first in
//!    row-major order.
//!
//! A grid that is a single component is therefore entirely backdrop.

use crate::error::{PatternError, Result};
use crate::grid::{BackgroundMask, BeadGrid, Grid};

/// Classify every cell of `beads` as backdrop (`true`) or subject.
///
/// ```
/// use bead_pattern::grid::Grid;
/// use bead_pattern::segment;
///
/// let a = Some("a".to_string());
/// let b = Some("b".to_string());
/// let beads = Grid::from_rows(vec![
///     vec![a.clone(), a.clone(), a.clone()],
///     vec![a.clone(), b.clone(), a.clone()],
///     vec![a.clone(), a.clone(), a.clone()],
/// ]).unwrap();
/// let mask = segment(&beads, None).unwrap();
/// assert_eq!(mask.background_count(), 8);
/// assert!(!mask.is_background(1, 1));
/// ```
pub fn segment(beads: &BeadGrid, alpha: Option<&[u8]>) -> Result<BackgroundMask> {
    let (width, height) = beads.dimensions();

    if let Some(alpha) = alpha {
        if alpha.len() != beads.len() {
            return Err(PatternError::DimensionMismatch {
                expected_width: width,
                expected_height: height,
                width: alpha.len(),
                height: 1,
            });
        }
        if alpha.iter().any(|&a| a < 255) {
            tracing::debug!("Segmenting background from alpha channel");
            return Grid::new(width, height, alpha.iter().map(|&a| a < 255).collect());
        }
    }

    Ok(largest_border_component(beads))
}

fn largest_border_component(beads: &BeadGrid) -> BackgroundMask {
    let (width, height) = beads.dimensions();
    let cells = beads.cells();
    let mut visited = vec![false; cells.len()];
    let mut worklist = Vec::new();
    let mut component = Vec::new();
    let mut background: Vec<usize> = Vec::new();
    let mut components = 0usize;

    for start in 0..cells.len() {
        if visited[start] {
            continue;
        }
        components += 1;
        let key = &cells[start];
        let mut touches_border = false;

        component.clear();
        visited[start] = true;
        worklist.push(start);

        while let Some(i) = worklist.pop() {
            component.push(i);
            let (x, y) = (i % width, i / width);
            if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                touches_border = true;
            }

            let mut visit = |n: usize| {
                if !visited[n] && cells[n] == *key {
                    visited[n] = true;
                    worklist.push(n);
                }
            };
            if x > 0 {
                visit(i - 1);
            }
            if x + 1 < width {
                visit(i + 1);
            }
            if y > 0 {
                visit(i - width);
            }
            if y + 1 < height {
                visit(i + width);
            }
        }

        // Strictly larger: the first component found keeps ties
        if touches_border && component.len() > background.len() {
            std::mem::swap(&mut background, &mut component);
        }
    }

    let mut mask = vec![false; cells.len()];
    for &i in &background {
        mask[i] = true;
    }
    tracing::debug!(
        components,
        background = background.len(),
        total = cells.len(),
        "Segmented background by connected regions"
    );
    Grid::from_fn(width, height, |x, y| mask[y * width + x])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn grid(rows: &[&str]) -> BeadGrid {
        Grid::from_rows(
            rows.iter()
                .map(|row| {
                    row.chars()
                        .map(|c| (c != '.').then(|| c.to_string()))
                        .collect()
                })
                .collect(),
        )
        .unwrap()
    }

    fn render(mask: &BackgroundMask) -> Vec<String> {
        mask.rows()
            .map(|row| row.iter().map(|&b| if b { '#' } else { '-' }).collect())
            .collect()
    }

    #[test]
    fn test_ring_is_background() {
        let beads = grid(&["aaaaa", "abbba", "abbba", "abbba", "aaaaa"]);
        let mask = segment(&beads, None).unwrap();
        assert_eq!(mask.background_count(), 16);
        assert_eq!(
            render(&mask),
            ["#####", "#---#", "#---#", "#---#", "#####"]
        );
    }

    #[test]
    fn test_single_cell_is_background() {
        let mask = segment(&grid(&["a"]), None).unwrap();
        assert!(mask.is_background(0, 0));
    }

    #[test]
    fn test_uniform_grid_is_all_background() {
        let mask = segment(&grid(&["ccc", "ccc"]), None).unwrap();
        assert_eq!(mask.foreground_count(), 0);
    }

    #[test]
    fn test_only_border_components_qualify() {
        // 'b' is the largest component but never touches the border
        let beads = grid(&[
            "aaaaaaa",
            "abbbbba",
            "abbbbba",
            "abbbbba",
            "abbbbba",
            "abbbbba",
            "aaaaaaa",
        ]);
        let mask = segment(&beads, None).unwrap();
        assert_eq!(mask.background_count(), 24);
        assert!(!mask.is_background(3, 3));
    }

    #[test]
    fn test_tie_goes_to_first_component_in_row_major_order() {
        let beads = grid(&["aabb", "aabb"]);
        let mask = segment(&beads, None).unwrap();
        assert_eq!(render(&mask), ["##--", "##--"]);
    }

    #[test]
    fn test_empty_cells_form_their_own_component() {
        let beads = grid(&["...", ".x.", "..."]);
        let mask = segment(&beads, None).unwrap();
        assert_eq!(render(&mask), ["###", "#-#", "###"]);
    }

    #[test]
    fn test_diagonal_cells_are_not_connected() {
        let beads = grid(&["ab", "ba"]);
        let mask = segment(&beads, None).unwrap();
        // four single-cell components; the first wins
        assert_eq!(render(&mask), ["#-", "--"]);
    }

    #[test]
    fn test_alpha_takes_precedence() {
        let beads = grid(&["aaa", "aba", "aaa"]);
        let alpha = [255, 0, 255, 255, 255, 255, 255, 255, 10];
        let mask = segment(&beads, Some(&alpha)).unwrap();
        assert_eq!(render(&mask), ["-#-", "---", "--#"]);
    }

    #[test]
    fn test_fully_opaque_alpha_falls_through() {
        let beads = grid(&["aaa", "aba", "aaa"]);
        let mask = segment(&beads, Some(&[255; 9])).unwrap();
        assert_eq!(mask.background_count(), 8);
    }

    #[test]
    fn test_alpha_length_mismatch() {
        let beads = grid(&["aa"]);
        assert!(matches!(
            segment(&beads, Some(&[0])),
            Err(PatternError::DimensionMismatch { .. })
        ));
    }
}
