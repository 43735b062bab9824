//! The 7×6 idol board: snapshot, placement validation and pure mutation.
//!
//! A `Grid` is a value. `place`, `remove` and `move_idol` never touch `self`;
//! they return a fresh snapshot so callers can keep history around.

use std::collections::HashSet;
use std::sync::Arc;

use crate::catalog::FootprintCatalog;
use crate::geometry::{covers_blocked, footprint_rect, is_blocked_pos};
use crate::model::{Idol, IdolId};
use crate::types::{CellPos, GRID_COLS, GRID_ROWS};

/// Content of an occupied cell: the idol and the anchor of its footprint.
#[derive(Clone, Debug, PartialEq)]
pub struct Occupant {
    pub idol: Arc<Idol>,
    pub position: CellPos,
}

/// Reasons why an idol cannot be placed at a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlacementFailure {
    UnknownType,
    SizeTooLarge,
    BlockedCells,
    Overlapping,
}

impl PlacementFailure {
    pub fn code(&self) -> &'static str {
        match self {
            PlacementFailure::UnknownType => "unknown_type",
            PlacementFailure::SizeTooLarge => "size_too_large",
            PlacementFailure::BlockedCells => "blocked_cells",
            PlacementFailure::Overlapping => "overlapping",
        }
    }
}

impl std::fmt::Display for PlacementFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlacementFailure::UnknownType => write!(f, "Unknown idol type"),
            PlacementFailure::SizeTooLarge => {
                write!(f, "Idol does not fit on the board at this position")
            }
            PlacementFailure::BlockedCells => write!(f, "Idol would cover a blocked cell"),
            PlacementFailure::Overlapping => write!(f, "Idol would overlap another idol"),
        }
    }
}

impl std::error::Error for PlacementFailure {}

/// Snapshot of the board.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Grid {
    cells: [[Option<Occupant>; GRID_COLS]; GRID_ROWS],
}

impl Grid {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Content of a cell; `None` for empty, blocked or off-board cells.
    pub fn cell(&self, pos: CellPos) -> Option<&Occupant> {
        if !pos.is_on_board() {
            return None;
        }
        self.cells[pos.row][pos.col].as_ref()
    }

    /// Checks whether a cell holds part of an idol.
    pub fn is_occupied(&self, pos: CellPos) -> bool {
        self.cell(pos).is_some()
    }

    /// Number of filled cells. Blocked cells are never filled.
    pub fn filled_cells(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    /// Every placed idol once, with its anchor, in row-major anchor order.
    pub fn placed_idols(&self) -> Vec<(CellPos, Arc<Idol>)> {
        let mut seen = HashSet::new();
        let mut placed = Vec::new();
        for pos in CellPos::row_major() {
            if let Some(occupant) = self.cell(pos) {
                if seen.insert(occupant.position) {
                    placed.push((occupant.position, Arc::clone(&occupant.idol)));
                }
            }
        }
        placed
    }

    /// Anchor of the idol with the given id, if it is on the board.
    pub fn anchor_of(&self, id: IdolId) -> Option<CellPos> {
        self.cells
            .iter()
            .flatten()
            .flatten()
            .find(|occupant| occupant.idol.id == id)
            .map(|occupant| occupant.position)
    }

    pub fn contains_idol(&self, id: IdolId) -> bool {
        self.anchor_of(id).is_some()
    }

    /// Matrix of idol ids for rendering, `None` for empty cells.
    pub fn id_matrix(&self) -> Vec<Vec<Option<IdolId>>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|c| c.as_ref().map(|o| o.idol.id)).collect())
            .collect()
    }

    /// Checks whether `idol` fits with its top-left cell at `top_left`.
    ///
    /// Checks in order, stopping at the first failure:
    /// 1. the type has a footprint (`UnknownType`)
    /// 2. the footprint stays on the board (`SizeTooLarge`)
    /// 3. per covered cell: blocked (`BlockedCells`) or held by another idol (`Overlapping`)
    ///
    /// An idol whose id is already on the board is rejected as `Overlapping`
    /// wherever it is aimed; use [`Grid::move_idol`] to reposition it.
    pub fn validate(
        &self,
        footprints: &FootprintCatalog,
        idol: &Idol,
        top_left: CellPos,
    ) -> Result<(), PlacementFailure> {
        self.check_placement(footprints, idol, top_left, None)
    }

    /// Same checks as [`Grid::validate`], with cells of the idol `moving`
    /// treated as free.
    fn check_placement(
        &self,
        footprints: &FootprintCatalog,
        idol: &Idol,
        top_left: CellPos,
        moving: Option<IdolId>,
    ) -> Result<(), PlacementFailure> {
        let footprint = footprints
            .get(&idol.type_id)
            .ok_or(PlacementFailure::UnknownType)?;

        let rect = footprint_rect(top_left, footprint);
        if !rect.fits_on_board() {
            return Err(PlacementFailure::SizeTooLarge);
        }

        for pos in rect.cells() {
            if is_blocked_pos(pos) {
                return Err(PlacementFailure::BlockedCells);
            }
            if let Some(occupant) = self.cell(pos) {
                if Some(occupant.idol.id) != moving {
                    return Err(PlacementFailure::Overlapping);
                }
            }
        }

        if moving != Some(idol.id) && self.contains_idol(idol.id) {
            return Err(PlacementFailure::Overlapping);
        }

        Ok(())
    }

    /// Returns a new board with `idol` stamped into every cell of its footprint.
    ///
    /// Overlap is not checked; call [`Grid::validate`] first. Unknown types,
    /// off-board rectangles and rectangles touching blocked cells leave the
    /// board unchanged, so the blocked layout can never be written to.
    pub fn place(&self, footprints: &FootprintCatalog, idol: &Idol, top_left: CellPos) -> Grid {
        let mut next = self.clone();
        let Some(footprint) = footprints.get(&idol.type_id) else {
            return next;
        };
        let rect = footprint_rect(top_left, footprint);
        if !rect.fits_on_board() || covers_blocked(&rect) {
            return next;
        }

        let placed = Arc::new(idol.with_placed(true));
        for pos in rect.cells() {
            next.cells[pos.row][pos.col] = Some(Occupant {
                idol: Arc::clone(&placed),
                position: top_left,
            });
        }
        next
    }

    /// Validates, then places.
    pub fn try_place(
        &self,
        footprints: &FootprintCatalog,
        idol: &Idol,
        top_left: CellPos,
    ) -> Result<Grid, PlacementFailure> {
        self.validate(footprints, idol, top_left)?;
        Ok(self.place(footprints, idol, top_left))
    }

    /// Returns a new board without the idol anchored at `anchor`.
    ///
    /// Nothing anchored there means an unchanged copy.
    pub fn remove(&self, footprints: &FootprintCatalog, anchor: CellPos) -> Grid {
        let mut next = self.clone();
        let Some(occupant) = self.cell(anchor).filter(|o| o.position == anchor) else {
            return next;
        };

        let id = occupant.idol.id;
        match footprints.get(&occupant.idol.type_id) {
            Some(footprint) => {
                for pos in footprint_rect(anchor, footprint).cells() {
                    if pos.is_on_board() {
                        next.cells[pos.row][pos.col] = None;
                    }
                }
            }
            // The footprint table changed under a loaded snapshot: clear by identity.
            None => {
                for cell in next.cells.iter_mut().flatten() {
                    if cell.as_ref().is_some_and(|o| o.idol.id == id) {
                        *cell = None;
                    }
                }
            }
        }
        next
    }

    /// Moves the idol anchored at `from` so it is anchored at `to`.
    ///
    /// The idol's own cells do not block the move.
    pub fn move_idol(
        &self,
        footprints: &FootprintCatalog,
        from: CellPos,
        to: CellPos,
    ) -> Result<Grid, PlacementFailure> {
        let Some(occupant) = self.cell(from).filter(|o| o.position == from) else {
            return Ok(self.clone());
        };
        let idol = Arc::clone(&occupant.idol);
        self.check_placement(footprints, &idol, to, Some(idol.id))?;
        Ok(self.remove(footprints, from).place(footprints, &idol, to))
    }

    /// Rebuilds a board from a list of placements, validating each one.
    pub fn from_placements<'a>(
        footprints: &FootprintCatalog,
        placements: impl IntoIterator<Item = (CellPos, &'a Idol)>,
    ) -> Result<Grid, (IdolId, PlacementFailure)> {
        let mut grid = Grid::new();
        for (pos, idol) in placements {
            grid = grid
                .try_place(footprints, idol, pos)
                .map_err(|failure| (idol.id, failure))?;
        }
        Ok(grid)
    }
}
