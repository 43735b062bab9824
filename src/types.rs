//! Common types and traits for the idol board geometry.
//!
//! This module defines the cell coordinate type, axis-aligned cell rectangles
//! and the `Spanning` trait shared by everything that occupies grid cells.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Number of rows on the idol board.
pub const GRID_ROWS: usize = 7;

/// Number of columns on the idol board.
pub const GRID_COLS: usize = 6;

/// Total number of cells on the board, blocked cells included.
pub const GRID_CELLS: usize = GRID_ROWS * GRID_COLS;

/// A cell coordinate on the board.
///
/// Rows grow downwards, columns grow to the right. `(0, 0)` is the top-left cell.
///
/// # Examples
/// ```
/// use idol_planner::types::CellPos;
///
/// let pos = CellPos::new(2, 3);
/// assert_eq!(pos.index(), 15);
/// assert_eq!(CellPos::from_index(15), pos);
/// ```
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
pub struct CellPos {
    pub row: usize,
    pub col: usize,
}

impl CellPos {
    /// Creates a new cell coordinate.
    #[inline]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// The top-left cell.
    #[inline]
    pub const fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Row-major index of the cell.
    #[inline]
    pub const fn index(&self) -> usize {
        self.row * GRID_COLS + self.col
    }

    /// Inverse of [`CellPos::index`].
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        Self::new(index / GRID_COLS, index % GRID_COLS)
    }

    /// Checks whether the coordinate lies on the board.
    #[inline]
    pub const fn is_on_board(&self) -> bool {
        self.row < GRID_ROWS && self.col < GRID_COLS
    }

    /// Iterates over every board cell in row-major order.
    pub fn row_major() -> impl Iterator<Item = CellPos> {
        (0..GRID_CELLS).map(CellPos::from_index)
    }
}

impl From<(usize, usize)> for CellPos {
    #[inline]
    fn from((row, col): (usize, usize)) -> Self {
        Self::new(row, col)
    }
}

impl std::fmt::Display for CellPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Trait for objects that span a rectangle of cells.
pub trait Spanning {
    /// Returns `(width, height)` in cells.
    fn span(&self) -> (usize, usize);

    /// Number of cells covered.
    fn area(&self) -> usize {
        let (width, height) = self.span();
        width * height
    }
}

/// Axis-aligned rectangle of cells, anchored at its top-left cell.
///
/// `width` counts columns, `height` counts rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRect {
    pub origin: CellPos,
    pub width: usize,
    pub height: usize,
}

impl CellRect {
    /// Creates a new rectangle.
    #[inline]
    pub const fn new(origin: CellPos, width: usize, height: usize) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    /// Exclusive end row, saturating for anchors far off the board.
    #[inline]
    pub const fn end_row(&self) -> usize {
        self.origin.row.saturating_add(self.height)
    }

    /// Exclusive end column, saturating for anchors far off the board.
    #[inline]
    pub const fn end_col(&self) -> usize {
        self.origin.col.saturating_add(self.width)
    }

    /// Checks if the rectangle lies completely on the board.
    #[inline]
    pub const fn fits_on_board(&self) -> bool {
        self.origin.is_on_board() && self.end_row() <= GRID_ROWS && self.end_col() <= GRID_COLS
    }

    /// Checks if two rectangles share at least one cell.
    ///
    /// Same separating-axis test as for bounding boxes: the rectangles do NOT
    /// intersect if they are separated along either axis.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        !(self.end_col() <= other.origin.col
            || other.end_col() <= self.origin.col
            || self.end_row() <= other.origin.row
            || other.end_row() <= self.origin.row)
    }

    /// Checks if a cell lies inside the rectangle.
    #[inline]
    pub fn contains(&self, pos: CellPos) -> bool {
        pos.row >= self.origin.row
            && pos.row < self.end_row()
            && pos.col >= self.origin.col
            && pos.col < self.end_col()
    }

    /// Iterates over the covered cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellPos> + use<> {
        let (start_col, end_col) = (self.origin.col, self.end_col());
        (self.origin.row..self.end_row())
            .flat_map(move |row| (start_col..end_col).map(move |col| CellPos::new(row, col)))
    }
}

impl Spanning for CellRect {
    fn span(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip_covers_board() {
        let all: Vec<CellPos> = CellPos::row_major().collect();
        assert_eq!(all.len(), GRID_CELLS);
        assert_eq!(all[0], CellPos::origin());
        assert_eq!(all[GRID_COLS], CellPos::new(1, 0));
        assert_eq!(all[GRID_CELLS - 1], CellPos::new(GRID_ROWS - 1, GRID_COLS - 1));
        for (idx, pos) in all.iter().enumerate() {
            assert_eq!(pos.index(), idx);
        }
    }

    #[test]
    fn test_rect_cells_row_major() {
        let rect = CellRect::new(CellPos::new(5, 0), 2, 2);
        let cells: Vec<CellPos> = rect.cells().collect();
        assert_eq!(
            cells,
            vec![
                CellPos::new(5, 0),
                CellPos::new(5, 1),
                CellPos::new(6, 0),
                CellPos::new(6, 1)
            ]
        );
        assert_eq!(rect.area(), 4);
    }

    #[test]
    fn test_rect_fits_on_board() {
        assert!(CellRect::new(CellPos::new(4, 3), 3, 3).fits_on_board());
        assert!(!CellRect::new(CellPos::new(5, 3), 3, 3).fits_on_board());
        assert!(!CellRect::new(CellPos::new(0, 4), 3, 1).fits_on_board());
    }

    #[test]
    fn test_far_off_anchor_does_not_wrap() {
        let rect = CellRect::new(CellPos::new(usize::MAX, 1), 1, 2);
        assert_eq!(rect.end_row(), usize::MAX);
        assert!(!rect.fits_on_board());
        assert_eq!(rect.cells().count(), 0);

        let wide = CellRect::new(CellPos::new(0, usize::MAX - 1), 3, 1);
        assert!(!wide.fits_on_board());
        assert!(!wide.contains(CellPos::new(0, 0)));
    }

    #[test]
    fn test_rect_intersects() {
        let a = CellRect::new(CellPos::new(0, 0), 2, 2);
        let b = CellRect::new(CellPos::new(1, 1), 2, 2);
        let c = CellRect::new(CellPos::new(0, 2), 1, 3);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(b.intersects(&c));
    }

    #[test]
    fn test_rect_contains() {
        let rect = CellRect::new(CellPos::new(1, 1), 3, 1);
        assert!(rect.contains(CellPos::new(1, 3)));
        assert!(!rect.contains(CellPos::new(1, 4)));
        assert!(!rect.contains(CellPos::new(2, 1)));
    }
}
