//! Board geometry: the fixed blocked-cell layout and footprint rectangles.
//!
//! Every component that needs to know whether a cell is usable consults
//! [`is_blocked`]. There is no second copy of the layout anywhere.

use crate::model::Footprint;
use crate::types::{CellPos, CellRect, GRID_CELLS};

/// Structural cells of the board that can never hold an idol.
pub const BLOCKED_CELLS: [CellPos; 10] = [
    CellPos::new(0, 0),
    CellPos::new(2, 1),
    CellPos::new(2, 4),
    CellPos::new(3, 1),
    CellPos::new(3, 2),
    CellPos::new(3, 3),
    CellPos::new(3, 4),
    CellPos::new(4, 1),
    CellPos::new(4, 4),
    CellPos::new(6, 5),
];

/// Checks whether the cell at `(row, col)` is permanently unusable.
///
/// Coordinates outside the board are not blocked; bounds are checked separately.
///
/// # Examples
/// ```
/// use idol_planner::geometry::is_blocked;
///
/// assert!(is_blocked(0, 0));
/// assert!(!is_blocked(0, 1));
/// ```
pub const fn is_blocked(row: usize, col: usize) -> bool {
    matches!(
        (row, col),
        (0, 0) | (2, 1) | (2, 4) | (3, 1) | (3, 2) | (3, 3) | (3, 4) | (4, 1) | (4, 4) | (6, 5)
    )
}

/// Same as [`is_blocked`] for a [`CellPos`].
#[inline]
pub const fn is_blocked_pos(pos: CellPos) -> bool {
    is_blocked(pos.row, pos.col)
}

/// Number of cells that can hold an idol.
pub const fn usable_cell_count() -> usize {
    GRID_CELLS - BLOCKED_CELLS.len()
}

/// Rectangle covered by a footprint anchored at `anchor`.
#[inline]
pub fn footprint_rect(anchor: CellPos, footprint: &Footprint) -> CellRect {
    CellRect::new(anchor, footprint.width, footprint.height)
}

/// Checks whether any cell of the rectangle is blocked.
pub fn covers_blocked(rect: &CellRect) -> bool {
    rect.cells().any(is_blocked_pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GRID_COLS, GRID_ROWS};

    #[test]
    fn predicate_matches_blocked_table() {
        let mut count = 0;
        for row in 0..GRID_ROWS {
            for col in 0..GRID_COLS {
                let listed = BLOCKED_CELLS.contains(&CellPos::new(row, col));
                assert_eq!(is_blocked(row, col), listed, "mismatch at ({row}, {col})");
                if listed {
                    count += 1;
                }
            }
        }
        assert_eq!(count, BLOCKED_CELLS.len());
        assert_eq!(usable_cell_count(), 32);
    }

    #[test]
    fn rect_over_center_is_blocked() {
        let rect = CellRect::new(CellPos::new(3, 0), 3, 1);
        assert!(covers_blocked(&rect));

        let free = CellRect::new(CellPos::new(5, 0), 2, 2);
        assert!(!covers_blocked(&free));
    }

    #[test]
    fn out_of_board_is_not_blocked() {
        assert!(!is_blocked(7, 0));
        assert!(!is_blocked(0, 6));
    }
}
