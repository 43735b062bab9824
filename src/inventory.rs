//! Ordered idol collection, placed or not.

use crate::grid::Grid;
use crate::model::{Idol, IdolId, ValidationError};

/// Idols owned by the user, in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Inventory {
    idols: Vec<Idol>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an idol after validating it. Ids must be unique.
    pub fn add(&mut self, idol: Idol) -> Result<(), ValidationError> {
        idol.validate()?;
        if self.get(idol.id).is_some() {
            return Err(ValidationError::InvalidIdol(format!(
                "idol id {} already in inventory",
                idol.id
            )));
        }
        self.idols.push(idol);
        Ok(())
    }

    /// Removes and returns the idol with the given id.
    pub fn remove(&mut self, id: IdolId) -> Option<Idol> {
        let idx = self.idols.iter().position(|i| i.id == id)?;
        Some(self.idols.remove(idx))
    }

    pub fn get(&self, id: IdolId) -> Option<&Idol> {
        self.idols.iter().find(|i| i.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Idol> {
        self.idols.iter()
    }

    pub fn len(&self) -> usize {
        self.idols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idols.is_empty()
    }

    /// Next free id (one above the current maximum).
    pub fn next_id(&self) -> IdolId {
        self.idols.iter().map(|i| i.id + 1).max().unwrap_or(1)
    }

    /// Refreshes every `is_placed` flag from the board.
    pub fn sync_placement(&mut self, grid: &Grid) {
        for idol in &mut self.idols {
            idol.is_placed = grid.contains_idol(idol.id);
        }
    }

    /// Idols not currently on the board according to the cached flag.
    pub fn unplaced(&self) -> impl Iterator<Item = &Idol> {
        self.idols.iter().filter(|i| !i.is_placed)
    }
}

impl FromIterator<Idol> for Inventory {
    fn from_iter<T: IntoIterator<Item = Idol>>(iter: T) -> Self {
        Self {
            idols: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FootprintCatalog;
    use crate::model::fixtures::idol;
    use crate::types::CellPos;

    #[test]
    fn rejects_duplicate_ids() {
        let mut inventory = Inventory::new();
        inventory.add(idol(1, "minor")).unwrap();
        assert!(inventory.add(idol(1, "noble")).is_err());
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory.next_id(), 2);
    }

    #[test]
    fn sync_follows_the_board() {
        let fp = FootprintCatalog::standard();
        let mut inventory: Inventory = [idol(1, "minor"), idol(2, "noble")].into_iter().collect();

        let grid = Grid::new().place(&fp, &idol(2, "noble"), CellPos::new(0, 1));
        inventory.sync_placement(&grid);
        let unplaced: Vec<IdolId> = inventory.unplaced().map(|i| i.id).collect();
        assert_eq!(unplaced, vec![1]);

        let cleared = grid.remove(&fp, CellPos::new(0, 1));
        inventory.sync_placement(&cleared);
        assert_eq!(inventory.unplaced().count(), 2);

        assert_eq!(inventory.remove(1).map(|i| i.id), Some(1));
        assert!(inventory.remove(1).is_none());
    }
}
