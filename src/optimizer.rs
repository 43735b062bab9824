//! Packing optimizer for arranging many idols on the board.
//!
//! Two strategies are available:
//! - Randomized multi-restart first-fit, maximizing the number of filled cells
//! - Exhaustive backtracking, maximizing the total modifier count of placed idols
//!
//! Neither strategy is clever per step. Placement is always first-fit in
//! row-major scan order; quality comes from restarts or from the search.

use std::cmp::Ordering;
use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::catalog::FootprintCatalog;
use crate::geometry::is_blocked_pos;
use crate::grid::{Grid, PlacementFailure};
use crate::model::{Idol, IdolId};
use crate::types::CellPos;

/// Search strategy of the optimizer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PackingStrategy {
    /// Shuffle, first-fit, keep the run with the most filled cells.
    Randomized,
    /// Try every position for every idol within a node budget.
    Exhaustive,
    /// Exhaustive for small inputs, randomized otherwise.
    Auto,
}

impl PackingStrategy {
    pub fn code(&self) -> &'static str {
        match self {
            PackingStrategy::Randomized => "randomized",
            PackingStrategy::Exhaustive => "exhaustive",
            PackingStrategy::Auto => "auto",
        }
    }

    /// Parses a strategy name, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "randomized" | "random" => Some(PackingStrategy::Randomized),
            "exhaustive" | "backtracking" => Some(PackingStrategy::Exhaustive),
            "auto" => Some(PackingStrategy::Auto),
            _ => None,
        }
    }
}

/// Configuration of the packing optimizer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PackingConfig {
    /// Number of shuffled first-fit runs of the randomized strategy
    pub restarts: usize,
    /// Fixed RNG seed; `None` draws a fresh seed per call
    pub seed: Option<u64>,
    pub strategy: PackingStrategy,
    /// Run one value-per-cell ordered pass before the random restarts
    pub preseed: bool,
    /// Maximum number of search nodes of the exhaustive strategy
    pub exhaustive_budget: usize,
    /// Largest input that `Auto` hands to the exhaustive strategy
    pub exhaustive_item_limit: usize,
}

impl PackingConfig {
    pub const DEFAULT_RESTARTS: usize = 1000;
    pub const DEFAULT_STRATEGY: PackingStrategy = PackingStrategy::Randomized;
    pub const DEFAULT_PRESEED: bool = true;
    pub const DEFAULT_EXHAUSTIVE_BUDGET: usize = 200_000;
    pub const DEFAULT_EXHAUSTIVE_ITEM_LIMIT: usize = 8;
    /// Hard ceiling for exhaustive search, whatever the configured item limit.
    pub const MAX_EXHAUSTIVE_ITEMS: usize = 16;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            restarts: Self::DEFAULT_RESTARTS,
            seed: None,
            strategy: Self::DEFAULT_STRATEGY,
            preseed: Self::DEFAULT_PRESEED,
            exhaustive_budget: Self::DEFAULT_EXHAUSTIVE_BUDGET,
            exhaustive_item_limit: Self::DEFAULT_EXHAUSTIVE_ITEM_LIMIT,
        }
    }
}

/// Builder for PackingConfig.
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    /// Sets the number of random restarts.
    pub fn restarts(mut self, restarts: usize) -> Self {
        self.config.restarts = restarts;
        self
    }

    /// Fixes the RNG seed for reproducible runs.
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn strategy(mut self, strategy: PackingStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Enables or disables the value-per-cell pre-seed pass.
    pub fn preseed(mut self, preseed: bool) -> Self {
        self.config.preseed = preseed;
        self
    }

    /// Sets the node budget of the exhaustive search.
    pub fn exhaustive_budget(mut self, budget: usize) -> Self {
        self.config.exhaustive_budget = budget;
        self
    }

    pub fn exhaustive_item_limit(mut self, limit: usize) -> Self {
        self.config.exhaustive_item_limit = limit;
        self
    }

    /// Creates the final configuration.
    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// Reasons why an idol ended up off the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnplacedReason {
    NoSpace,
    SizeTooLarge,
    Overlapping,
    BlockedCells,
    UnknownType,
}

impl UnplacedReason {
    pub fn code(&self) -> &'static str {
        match self {
            UnplacedReason::NoSpace => "no_space",
            UnplacedReason::SizeTooLarge => "size_too_large",
            UnplacedReason::Overlapping => "overlapping",
            UnplacedReason::BlockedCells => "blocked_cells",
            UnplacedReason::UnknownType => "unknown_type",
        }
    }
}

impl From<PlacementFailure> for UnplacedReason {
    fn from(failure: PlacementFailure) -> Self {
        match failure {
            PlacementFailure::UnknownType => UnplacedReason::UnknownType,
            PlacementFailure::SizeTooLarge => UnplacedReason::SizeTooLarge,
            PlacementFailure::BlockedCells => UnplacedReason::BlockedCells,
            PlacementFailure::Overlapping => UnplacedReason::Overlapping,
        }
    }
}

impl std::fmt::Display for UnplacedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnplacedReason::NoSpace => write!(f, "No free space left on the board"),
            UnplacedReason::SizeTooLarge => {
                write!(f, "Idol does not fit into any remaining gap")
            }
            UnplacedReason::Overlapping => write!(f, "Every candidate position overlaps an idol"),
            UnplacedReason::BlockedCells => {
                write!(f, "Every candidate position covers a blocked cell")
            }
            UnplacedReason::UnknownType => write!(f, "Idol type has no known footprint"),
        }
    }
}

/// Idol that could not be placed.
#[derive(Clone, Debug)]
pub struct UnplacedIdol {
    pub idol: Idol,
    pub reason: UnplacedReason,
}

/// Result of an optimizer run.
#[derive(Clone, Debug)]
pub struct PackingResult {
    pub grid: Grid,
    /// Ids of input idols on the board: those already on the start board first,
    /// then the newly placed ones in input order.
    pub placed: Vec<IdolId>,
    pub unplaced: Vec<UnplacedIdol>,
    /// Strategy that actually ran (`Auto` resolved).
    pub strategy: PackingStrategy,
}

impl PackingResult {
    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }

    pub fn not_placed_count(&self) -> usize {
        self.unplaced.len()
    }

    /// Indicates whether every input idol is on the board.
    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }

    /// Filled, non-blocked cells of the final board.
    pub fn score(&self) -> usize {
        self.grid.filled_cells()
    }
}

/// Events emitted while optimizing, for live visualization.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum PackEvent {
    /// The search begins.
    Started {
        idols: usize,
        already_placed: usize,
        strategy: PackingStrategy,
    },
    /// A better arrangement was found.
    Improved {
        attempt: usize,
        score: usize,
        unplaced: usize,
    },
    /// Optimization finished.
    Finished {
        placed: usize,
        unplaced: usize,
        score: usize,
    },
}

/// One complete arrangement of the pending idols.
struct Attempt {
    grid: Grid,
    /// Index into the pending idols plus the reason, in ascending index order.
    unplaced: Vec<(usize, UnplacedReason)>,
}

impl Attempt {
    fn score(&self) -> usize {
        self.grid.filled_cells()
    }
}

/// Arranges `idols` on top of `start`.
///
/// Idols already on `start` count as placed and are not moved. A repeated
/// idol id is reported as `Overlapping` after the first occurrence, and
/// exhaustive search only runs up to the item limit; larger inputs pack
/// randomized.
///
/// # Parameters
/// * `idols` - Idols to arrange
/// * `start` - Board to start from, usually the current one
/// * `footprints` - Footprint table
/// * `config` - Optimizer configuration
///
/// # Returns
/// `PackingResult` with the best board found and every idol that did not fit
pub fn optimize(
    idols: Vec<Idol>,
    start: &Grid,
    footprints: &FootprintCatalog,
    config: PackingConfig,
) -> PackingResult {
    optimize_with_progress(idols, start, footprints, config, |_| {})
}

/// Same as [`optimize`], calling `on_event` for every notable step (suitable for SSE).
pub fn optimize_with_progress(
    idols: Vec<Idol>,
    start: &Grid,
    footprints: &FootprintCatalog,
    config: PackingConfig,
    mut on_event: impl FnMut(&PackEvent),
) -> PackingResult {
    let mut seen = HashSet::new();
    let mut already = Vec::new();
    let mut pending = Vec::new();
    let mut duplicates = Vec::new();
    for idol in idols {
        if !seen.insert(idol.id) {
            duplicates.push(UnplacedIdol {
                idol,
                reason: UnplacedReason::Overlapping,
            });
        } else if start.contains_idol(idol.id) {
            already.push(idol);
        } else {
            pending.push(idol);
        }
    }

    let item_limit = config
        .exhaustive_item_limit
        .min(PackingConfig::MAX_EXHAUSTIVE_ITEMS);
    let strategy = match config.strategy {
        PackingStrategy::Auto | PackingStrategy::Exhaustive if pending.len() <= item_limit => {
            PackingStrategy::Exhaustive
        }
        PackingStrategy::Exhaustive => {
            eprintln!(
                "⚠️ {} idols exceed the exhaustive limit of {}. Packing randomized instead.",
                pending.len(),
                item_limit
            );
            PackingStrategy::Randomized
        }
        PackingStrategy::Auto | PackingStrategy::Randomized => PackingStrategy::Randomized,
    };

    on_event(&PackEvent::Started {
        idols: pending.len(),
        already_placed: already.len(),
        strategy,
    });

    let attempt = if pending.is_empty() {
        Attempt {
            grid: start.clone(),
            unplaced: Vec::new(),
        }
    } else if strategy == PackingStrategy::Exhaustive {
        pack_exhaustive(&pending, start, footprints, &config, &mut on_event)
    } else {
        pack_randomized(&pending, start, footprints, &config, &mut on_event)
    };

    let mut placed: Vec<IdolId> = already.iter().map(|idol| idol.id).collect();
    let mut unplaced = Vec::with_capacity(attempt.unplaced.len());
    let mut rejected = attempt.unplaced.into_iter().peekable();
    for (idx, idol) in pending.into_iter().enumerate() {
        match rejected.next_if(|(rejected_idx, _)| *rejected_idx == idx) {
            Some((_, reason)) => unplaced.push(UnplacedIdol { idol, reason }),
            None => placed.push(idol.id),
        }
    }
    unplaced.extend(duplicates);

    on_event(&PackEvent::Finished {
        placed: placed.len(),
        unplaced: unplaced.len(),
        score: attempt.grid.filled_cells(),
    });

    PackingResult {
        grid: attempt.grid,
        placed,
        unplaced,
        strategy,
    }
}

/// Finds the first anchor in row-major order where the idol fits.
///
/// Anchors whose own cell is blocked or occupied are not candidates. On
/// failure the reason of the first rejected candidate is returned, or
/// `NoSpace` when there was no candidate at all.
fn find_first_fit(
    grid: &Grid,
    footprints: &FootprintCatalog,
    idol: &Idol,
) -> Result<CellPos, UnplacedReason> {
    let mut first_failure: Option<PlacementFailure> = None;

    for pos in CellPos::row_major() {
        if is_blocked_pos(pos) || grid.is_occupied(pos) {
            continue;
        }
        match grid.validate(footprints, idol, pos) {
            Ok(()) => return Ok(pos),
            Err(failure) => {
                first_failure.get_or_insert(failure);
            }
        }
    }

    Err(first_failure
        .map(UnplacedReason::from)
        .unwrap_or(UnplacedReason::NoSpace))
}

/// Places the idols one by one in the given order, each at its first fit.
fn first_fit(
    start: &Grid,
    footprints: &FootprintCatalog,
    idols: &[Idol],
    order: &[usize],
) -> Attempt {
    let mut grid = start.clone();
    let mut unplaced = Vec::new();

    for &idx in order {
        let idol = &idols[idx];
        match find_first_fit(&grid, footprints, idol) {
            Ok(pos) => grid = grid.place(footprints, idol, pos),
            Err(reason) => unplaced.push((idx, reason)),
        }
    }

    unplaced.sort_by_key(|(idx, _)| *idx);
    Attempt { grid, unplaced }
}

/// Orders idols by modifiers per covered cell, best first.
///
/// Ties go to the larger footprint (harder to fit later), then input order.
/// Idols of unknown type go last.
fn value_per_cell_order(idols: &[Idol], footprints: &FootprintCatalog) -> Vec<usize> {
    let density = |idol: &Idol| -> f64 {
        match footprints.area_of(&idol.type_id) {
            Some(area) if area > 0 => idol.modifier_count() as f64 / area as f64,
            _ => -1.0,
        }
    };

    let mut order: Vec<usize> = (0..idols.len()).collect();
    order.sort_by(|&a, &b| {
        density(&idols[b])
            .partial_cmp(&density(&idols[a]))
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                let area_a = footprints.area_of(&idols[a].type_id).unwrap_or(0);
                let area_b = footprints.area_of(&idols[b].type_id).unwrap_or(0);
                area_b.cmp(&area_a)
            })
            .then_with(|| a.cmp(&b))
    });
    order
}

/// Randomized multi-restart first-fit.
///
/// Only a strictly better score replaces the current best, so the first run
/// reaching an optimum is kept.
fn pack_randomized(
    idols: &[Idol],
    start: &Grid,
    footprints: &FootprintCatalog,
    config: &PackingConfig,
    on_event: &mut impl FnMut(&PackEvent),
) -> Attempt {
    let seed = config.seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = StdRng::seed_from_u64(seed);

    let mut best: Option<Attempt> = None;

    if config.preseed {
        let seeded = first_fit(start, footprints, idols, &value_per_cell_order(idols, footprints));
        on_event(&PackEvent::Improved {
            attempt: 0,
            score: seeded.score(),
            unplaced: seeded.unplaced.len(),
        });
        best = Some(seeded);
    }

    let mut order: Vec<usize> = (0..idols.len()).collect();
    for attempt in 1..=config.restarts {
        // A run that placed everything cannot be beaten.
        if best.as_ref().is_some_and(|b| b.unplaced.is_empty()) {
            break;
        }

        order.shuffle(&mut rng);
        let candidate = first_fit(start, footprints, idols, &order);
        let score = candidate.score();

        if best.as_ref().is_none_or(|b| score > b.score()) {
            on_event(&PackEvent::Improved {
                attempt,
                score,
                unplaced: candidate.unplaced.len(),
            });
            best = Some(candidate);
        }
    }

    best.unwrap_or_else(|| {
        let order: Vec<usize> = (0..idols.len()).collect();
        first_fit(start, footprints, idols, &order)
    })
}

/// Depth-first search over "place at each valid position or skip" per idol.
struct Backtracker<'a> {
    footprints: &'a FootprintCatalog,
    idols: &'a [Idol],
    /// Idol indices sorted by descending modifier count.
    order: Vec<usize>,
    /// `remaining_value[d]` = modifier count of `order[d..]`.
    remaining_value: Vec<usize>,
    budget: usize,
    visited: usize,
    best_value: usize,
    best_grid: Grid,
    best_placed: Vec<bool>,
    /// `(node, filled cells, unplaced)` for every improvement.
    improvements: Vec<(usize, usize, usize)>,
}

impl<'a> Backtracker<'a> {
    fn new(idols: &'a [Idol], start: &Grid, footprints: &'a FootprintCatalog, budget: usize) -> Self {
        let mut order: Vec<usize> = (0..idols.len()).collect();
        order.sort_by(|&a, &b| {
            idols[b]
                .modifier_count()
                .cmp(&idols[a].modifier_count())
                .then_with(|| a.cmp(&b))
        });

        let mut remaining_value = vec![0; order.len() + 1];
        for depth in (0..order.len()).rev() {
            remaining_value[depth] = remaining_value[depth + 1] + idols[order[depth]].modifier_count();
        }

        Self {
            footprints,
            idols,
            order,
            remaining_value,
            budget,
            visited: 0,
            best_value: 0,
            best_grid: start.clone(),
            best_placed: vec![false; idols.len()],
            improvements: Vec::new(),
        }
    }

    fn exhausted(&self) -> bool {
        self.visited >= self.budget
    }

    fn search(&mut self, depth: usize, grid: &Grid, value: usize, placed: &mut Vec<bool>) {
        if self.exhausted() {
            return;
        }
        self.visited += 1;

        if value > self.best_value {
            self.best_value = value;
            self.best_grid = grid.clone();
            self.best_placed.clone_from(placed);
            let unplaced = placed.iter().filter(|p| !**p).count();
            self.improvements
                .push((self.visited, grid.filled_cells(), unplaced));
        }

        if depth == self.order.len() || value + self.remaining_value[depth] <= self.best_value {
            return;
        }

        let footprints = self.footprints;
        let idols = self.idols;
        let idx = self.order[depth];
        let idol = &idols[idx];

        for pos in CellPos::row_major() {
            if grid.validate(footprints, idol, pos).is_err() {
                continue;
            }
            placed[idx] = true;
            let next = grid.place(footprints, idol, pos);
            self.search(depth + 1, &next, value + idol.modifier_count(), placed);
            placed[idx] = false;
            if self.exhausted() {
                return;
            }
        }

        self.search(depth + 1, grid, value, placed);
    }
}

/// Exhaustive backtracking maximizing the summed modifier count.
fn pack_exhaustive(
    idols: &[Idol],
    start: &Grid,
    footprints: &FootprintCatalog,
    config: &PackingConfig,
    on_event: &mut impl FnMut(&PackEvent),
) -> Attempt {
    let mut search = Backtracker::new(idols, start, footprints, config.exhaustive_budget);
    let mut placed = vec![false; idols.len()];
    search.search(0, start, 0, &mut placed);

    for &(attempt, score, unplaced) in &search.improvements {
        on_event(&PackEvent::Improved {
            attempt,
            score,
            unplaced,
        });
    }

    let grid = search.best_grid;
    let unplaced = search
        .best_placed
        .iter()
        .enumerate()
        .filter(|(_, placed)| !**placed)
        .map(|(idx, _)| {
            let reason = match find_first_fit(&grid, footprints, &idols[idx]) {
                Err(reason) => reason,
                // Fits, but leaving it out scored higher within the budget.
                Ok(_) => UnplacedReason::NoSpace,
            };
            (idx, reason)
        })
        .collect();

    Attempt { grid, unplaced }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{footprint_rect, usable_cell_count};
    use crate::model::fixtures::modifier;
    use crate::model::ModifierClass;

    const TYPES: [&str; 6] = ["minor", "kamasan", "totemic", "noble", "conqueror", "burial"];

    fn idol_with(id: IdolId, type_id: &str, modifiers: usize) -> Idol {
        let prefixes = (0..modifiers.min(2))
            .map(|n| {
                modifier(
                    &format!("p{n}"),
                    "Teeming",
                    "3% increased Pack size",
                    ModifierClass::Prefix,
                )
            })
            .collect();
        let suffixes = (2..modifiers.max(2))
            .map(|n| {
                modifier(
                    &format!("s{n}"),
                    "of Rarity",
                    "5% increased Rarity",
                    ModifierClass::Suffix,
                )
            })
            .collect();
        Idol::new(id, type_id, format!("Idol {id}"), prefixes, suffixes).unwrap()
    }

    fn seeded(restarts: usize) -> PackingConfig {
        PackingConfig::builder()
            .restarts(restarts)
            .seed(Some(7))
            .build()
    }

    fn assert_board_matches(result: &PackingResult, input: &[Idol]) {
        let fp = FootprintCatalog::standard();
        assert_eq!(result.placed_count() + result.not_placed_count(), input.len());
        for idol in input {
            let on_board = result.grid.contains_idol(idol.id);
            let listed_placed = result.placed.contains(&idol.id);
            let listed_unplaced = result.unplaced.iter().any(|u| u.idol.id == idol.id);
            assert!(listed_placed ^ listed_unplaced, "idol {} listed twice or never", idol.id);
            assert_eq!(on_board, listed_placed, "idol {} board/list mismatch", idol.id);
        }
        for (anchor, idol) in result.grid.placed_idols() {
            let rect = footprint_rect(anchor, fp.get(&idol.type_id).unwrap());
            for pos in rect.cells() {
                assert!(!is_blocked_pos(pos));
                assert_eq!(result.grid.cell(pos).unwrap().idol.id, idol.id);
            }
        }
    }

    #[test]
    fn twenty_minor_idols_all_fit() {
        let idols: Vec<Idol> = (1..=20).map(|id| idol_with(id, "minor", 1)).collect();
        let result = optimize(
            idols.clone(),
            &Grid::new(),
            &FootprintCatalog::standard(),
            seeded(1000),
        );
        assert_eq!(result.not_placed_count(), 0);
        assert_eq!(result.placed_count(), 20);
        assert_eq!(result.score(), 20);
        assert!(result.is_complete());
        assert_board_matches(&result, &idols);
    }

    #[test]
    fn conservation_over_random_inputs() {
        let fp = FootprintCatalog::standard();
        for seed in 0..15u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let count = rng.random_range(1..=18);
            let idols: Vec<Idol> = (0..count)
                .map(|id| {
                    let type_id = TYPES[rng.random_range(0..TYPES.len())];
                    idol_with(id as IdolId + 1, type_id, rng.random_range(1..=4))
                })
                .collect();

            let config = PackingConfig::builder()
                .restarts(60)
                .seed(Some(seed))
                .build();
            let result = optimize(idols.clone(), &Grid::new(), &fp, config);
            assert_board_matches(&result, &idols);
            assert!(result.score() <= usable_cell_count());
        }
    }

    #[test]
    fn overfull_board_reports_every_leftover() {
        let idols: Vec<Idol> = (1..=12).map(|id| idol_with(id, "conqueror", 2)).collect();
        let result = optimize(
            idols.clone(),
            &Grid::new(),
            &FootprintCatalog::standard(),
            seeded(50),
        );
        assert!(result.not_placed_count() > 0);
        assert!(result.placed_count() * 4 <= usable_cell_count());
        for entry in &result.unplaced {
            assert!(matches!(
                entry.reason,
                UnplacedReason::NoSpace
                    | UnplacedReason::SizeTooLarge
                    | UnplacedReason::Overlapping
                    | UnplacedReason::BlockedCells
            ));
        }
        assert_board_matches(&result, &idols);
    }

    #[test]
    fn full_board_reports_no_space_for_single_cells() {
        let fp = FootprintCatalog::standard();
        let mut start = Grid::new();
        for (n, pos) in CellPos::row_major().enumerate() {
            if !is_blocked_pos(pos) {
                start = start.place(&fp, &idol_with(1000 + n as IdolId, "minor", 1), pos);
            }
        }
        assert_eq!(start.filled_cells(), usable_cell_count());

        let result = optimize(vec![idol_with(1, "minor", 1)], &start, &fp, seeded(10));
        assert_eq!(result.not_placed_count(), 1);
        assert_eq!(result.unplaced[0].reason, UnplacedReason::NoSpace);
    }

    #[test]
    fn unknown_type_is_reported_not_dropped() {
        let result = optimize(
            vec![idol_with(1, "giant", 1), idol_with(2, "minor", 1)],
            &Grid::new(),
            &FootprintCatalog::standard(),
            seeded(10),
        );
        assert_eq!(result.placed, vec![2]);
        assert_eq!(result.unplaced.len(), 1);
        assert_eq!(result.unplaced[0].reason, UnplacedReason::UnknownType);
        assert_eq!(result.unplaced[0].reason.code(), "unknown_type");
    }

    #[test]
    fn idols_on_start_grid_stay_put() {
        let fp = FootprintCatalog::standard();
        let resident = idol_with(1, "conqueror", 1);
        let start = Grid::new().place(&fp, &resident, CellPos::new(5, 0));

        let result = optimize(
            vec![resident.clone(), idol_with(2, "minor", 1)],
            &start,
            &fp,
            seeded(10),
        );
        assert_eq!(result.grid.anchor_of(1), Some(CellPos::new(5, 0)));
        assert_eq!(result.placed, vec![1, 2]);
        assert_eq!(result.score(), 5);
    }

    /// Board with everything filled except the 2×2 hole at (5,0).
    fn board_with_hole() -> Grid {
        let fp = FootprintCatalog::standard();
        let hole = footprint_rect(CellPos::new(5, 0), fp.get("conqueror").unwrap());
        let mut grid = Grid::new();
        for (n, pos) in CellPos::row_major().enumerate() {
            if !is_blocked_pos(pos) && !hole.contains(pos) {
                grid = grid.place(&fp, &idol_with(1000 + n as IdolId, "minor", 1), pos);
            }
        }
        grid
    }

    #[test]
    fn preseed_prefers_dense_idols() {
        let fp = FootprintCatalog::standard();
        let start = board_with_hole();
        let idols = vec![
            idol_with(1, "conqueror", 1),
            idol_with(2, "minor", 1),
            idol_with(3, "minor", 3),
        ];
        let config = PackingConfig::builder()
            .restarts(0)
            .preseed(true)
            .seed(Some(1))
            .build();
        let result = optimize(idols, &start, &fp, config);

        // minor(3) first, then minor(1); the conqueror no longer fits.
        assert_eq!(result.grid.anchor_of(3), Some(CellPos::new(5, 0)));
        assert_eq!(result.grid.anchor_of(2), Some(CellPos::new(5, 1)));
        assert_eq!(result.unplaced.len(), 1);
        assert_eq!(result.unplaced[0].idol.id, 1);
        // First free anchor left is (6,0), where a 2×2 runs off the board.
        assert_eq!(result.unplaced[0].reason, UnplacedReason::SizeTooLarge);
    }

    #[test]
    fn exhaustive_maximizes_modifier_count() {
        let fp = FootprintCatalog::standard();
        let start = board_with_hole();
        let idols = vec![
            idol_with(1, "conqueror", 1),
            idol_with(2, "minor", 2),
            idol_with(3, "minor", 2),
            idol_with(4, "kamasan", 1),
        ];
        let config = PackingConfig::builder()
            .strategy(PackingStrategy::Exhaustive)
            .build();
        let result = optimize(idols.clone(), &start, &fp, config);

        assert_eq!(result.strategy, PackingStrategy::Exhaustive);
        // Two minors (2 + 2) and the kamasan (1) beat the lone conqueror (1).
        let mut placed = result.placed.clone();
        placed.sort();
        assert_eq!(placed, vec![2, 3, 4]);
        assert_eq!(result.unplaced[0].idol.id, 1);
        assert_board_matches(&result, &idols);
    }

    #[test]
    fn exhaustive_respects_budget() {
        let idols: Vec<Idol> = (1..=6).map(|id| idol_with(id, "minor", 1)).collect();
        let config = PackingConfig::builder()
            .strategy(PackingStrategy::Exhaustive)
            .exhaustive_budget(1)
            .build();
        let result = optimize(idols.clone(), &Grid::new(), &FootprintCatalog::standard(), config);
        // Only the root node was visited: nothing placed, everything reported.
        assert_eq!(result.placed_count(), 0);
        assert_eq!(result.not_placed_count(), 6);
        assert_board_matches(&result, &idols);
    }

    #[test]
    fn auto_picks_by_input_size() {
        let fp = FootprintCatalog::standard();
        let config = PackingConfig::builder()
            .strategy(PackingStrategy::Auto)
            .exhaustive_item_limit(3)
            .seed(Some(3))
            .restarts(20)
            .build();

        let small: Vec<Idol> = (1..=3).map(|id| idol_with(id, "minor", 1)).collect();
        assert_eq!(
            optimize(small, &Grid::new(), &fp, config).strategy,
            PackingStrategy::Exhaustive
        );

        let large: Vec<Idol> = (1..=4).map(|id| idol_with(id, "minor", 1)).collect();
        assert_eq!(
            optimize(large, &Grid::new(), &fp, config).strategy,
            PackingStrategy::Randomized
        );
    }

    #[test]
    fn oversized_exhaustive_request_packs_randomized() {
        let idols: Vec<Idol> = (1..=500).map(|id| idol_with(id, "minor", 1)).collect();
        let config = PackingConfig::builder()
            .strategy(PackingStrategy::Exhaustive)
            .exhaustive_item_limit(1000)
            .restarts(2)
            .seed(Some(5))
            .build();
        let result = optimize(idols.clone(), &Grid::new(), &FootprintCatalog::standard(), config);

        assert_eq!(result.strategy, PackingStrategy::Randomized);
        assert_eq!(result.placed_count(), usable_cell_count());
        assert_eq!(result.not_placed_count(), 500 - usable_cell_count());
        assert_board_matches(&result, &idols);
    }

    #[test]
    fn repeated_idol_id_is_placed_once() {
        let fp = FootprintCatalog::standard();
        for strategy in [PackingStrategy::Randomized, PackingStrategy::Exhaustive] {
            let idols = vec![idol_with(1, "kamasan", 1), idol_with(1, "noble", 1)];
            let config = PackingConfig::builder()
                .strategy(strategy)
                .restarts(10)
                .seed(Some(2))
                .build();
            let result = optimize(idols, &Grid::new(), &fp, config);

            assert_eq!(result.placed, vec![1], "{strategy:?}");
            assert_eq!(result.grid.placed_idols().len(), 1);
            assert_eq!(result.grid.filled_cells(), 2);
            assert_eq!(result.unplaced.len(), 1);
            assert_eq!(result.unplaced[0].idol.type_id, "noble");
            assert_eq!(result.unplaced[0].reason, UnplacedReason::Overlapping);
        }

        let resident = idol_with(1, "minor", 1);
        let start = Grid::new().place(&fp, &resident, CellPos::new(0, 1));
        let result = optimize(
            vec![resident.clone(), idol_with(1, "conqueror", 2)],
            &start,
            &fp,
            seeded(5),
        );
        assert_eq!(result.grid, start);
        assert_eq!(result.placed, vec![1]);
        assert_eq!(result.unplaced[0].reason, UnplacedReason::Overlapping);
    }

    #[test]
    fn progress_events_frame_the_run() {
        let mut events = Vec::new();
        let idols: Vec<Idol> = (1..=5).map(|id| idol_with(id, "noble", 1)).collect();
        let result = optimize_with_progress(
            idols,
            &Grid::new(),
            &FootprintCatalog::standard(),
            seeded(25),
            |evt| events.push(evt.clone()),
        );

        assert!(matches!(events.first(), Some(PackEvent::Started { idols: 5, .. })));
        match events.last() {
            Some(PackEvent::Finished {
                placed,
                unplaced,
                score,
            }) => {
                assert_eq!(*placed, result.placed_count());
                assert_eq!(*unplaced, result.not_placed_count());
                assert_eq!(*score, result.score());
            }
            other => panic!("unexpected last event: {other:?}"),
        }
        assert!(events.iter().any(|e| matches!(e, PackEvent::Improved { .. })));
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let fp = FootprintCatalog::standard();
        let idols: Vec<Idol> = (1..=10)
            .map(|id| idol_with(id, TYPES[id as usize % TYPES.len()], 1))
            .collect();
        let config = PackingConfig::builder()
            .restarts(30)
            .preseed(false)
            .seed(Some(99))
            .build();
        let a = optimize(idols.clone(), &Grid::new(), &fp, config);
        let b = optimize(idols, &Grid::new(), &fp, config);
        assert_eq!(a.grid, b.grid);
        assert_eq!(a.placed, b.placed);
    }

    #[test]
    fn strategy_parsing() {
        assert_eq!(PackingStrategy::parse(" Random "), Some(PackingStrategy::Randomized));
        assert_eq!(PackingStrategy::parse("backtracking"), Some(PackingStrategy::Exhaustive));
        assert_eq!(PackingStrategy::parse("auto"), Some(PackingStrategy::Auto));
        assert_eq!(PackingStrategy::parse("greedy"), None);
    }
}
