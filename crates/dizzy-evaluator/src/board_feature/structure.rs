//! Structure features computed directly on bit rows.
//!
//! All scans run from the summit down to the floor; rows above the summit are
//! known to be empty.

use std::ops::RangeInclusive;

use dizzy_engine::{BitBoard, GameState};

use crate::{
    board_feature::{BoardFeature, BoxedBoardFeature},
    placement_analysis::PlacementAnalysis,
};

// Pairs of horizontally adjacent cells from (left wall, column 0) to
// (column 9, right wall), indexed by the left cell's bit.
const TRANSITION_PAIRS: u16 = ((1 << (BitBoard::PLAYABLE_WIDTH + 1)) - 1) << 1;

fn stack_rows(state: &GameState) -> RangeInclusive<usize> {
    BitBoard::FLOOR..=state.summit()
}

/// Sum of filled cells weighted by their row, as if the stack were built on
/// top of every line cleared so far.
///
/// # Raw measurement
///
/// With `L` total cleared lines and `f = pieces * 4 / width`:
///
/// ```text
/// raw = L(L+1)/2 + Σ(filled[y] / width × (L + y)) - f(f+1)/2
/// ```
///
/// where `y` is the 1-based playable row. The last term subtracts the value
/// of a perfectly packed stack, so the measurement stays bounded over a long
/// game. It covers both landing height and cleared lines.
#[derive(Debug, Clone)]
pub struct WeightedRows;

impl BoardFeature for WeightedRows {
    fn id(&self) -> &'static str {
        "weighted_rows"
    }
    fn name(&self) -> &'static str {
        "Weighted Rows"
    }
    fn clone_boxed(&self) -> BoxedBoardFeature {
        Box::new(self.clone())
    }
    #[expect(clippy::cast_precision_loss)]
    fn compute(&self, analysis: &PlacementAnalysis) -> f64 {
        let state = analysis.state();
        let board = state.board();
        let width = BitBoard::PLAYABLE_WIDTH as f64;
        let lines = state.total_lines() as f64;

        let mut value = lines * (lines + 1.0) / 2.0;
        for y in stack_rows(state) {
            let filled = f64::from(board.row(y).filled_cells());
            let height = (y + 1 - BitBoard::FLOOR) as f64;
            value += filled / width * (lines + height);
        }
        let packed = (state.total_pieces() * 4) as f64 / width;
        value - packed * (packed + 1.0) / 2.0
    }
}

/// Number of horizontal boundaries between a filled and an empty cell.
///
/// The walls count as filled, so every empty row between the summit and the
/// roof contributes 2.
#[derive(Debug, Clone)]
pub struct RowTransitions;

impl BoardFeature for RowTransitions {
    fn id(&self) -> &'static str {
        "row_transitions"
    }
    fn name(&self) -> &'static str {
        "Row Transitions"
    }
    fn clone_boxed(&self) -> BoxedBoardFeature {
        Box::new(self.clone())
    }
    fn compute(&self, analysis: &PlacementAnalysis) -> f64 {
        let state = analysis.state();
        let board = state.board();
        let mut transitions = 2 * BitBoard::ROOF.saturating_sub(state.summit());
        for y in stack_rows(state) {
            let bits = board.row(y).bits();
            transitions += ((bits ^ (bits >> 1)) & TRANSITION_PAIRS).count_ones() as usize;
        }
        count(transitions)
    }
}

/// Number of vertical boundaries between a filled and an empty cell.
///
/// The floor counts as filled.
#[derive(Debug, Clone)]
pub struct ColumnTransitions;

impl BoardFeature for ColumnTransitions {
    fn id(&self) -> &'static str {
        "column_transitions"
    }
    fn name(&self) -> &'static str {
        "Column Transitions"
    }
    fn clone_boxed(&self) -> BoxedBoardFeature {
        Box::new(self.clone())
    }
    fn compute(&self, analysis: &PlacementAnalysis) -> f64 {
        let state = analysis.state();
        let board = state.board();
        let mut transitions = BitBoard::PLAYABLE_WIDTH
            - board.row(BitBoard::FLOOR).filled_cells() as usize;
        for y in stack_rows(state) {
            let changed = board.row(y + 1).playable_bits() ^ board.row(y).playable_bits();
            transitions += changed.count_ones() as usize;
        }
        count(transitions)
    }
}

/// Number of rows with at least one empty cell covered anywhere above it.
///
/// A covered column stays covered all the way down, so a single mask of
/// covered columns is carried from the summit to the floor.
#[derive(Debug, Clone)]
pub struct RowsWithHoles;

impl BoardFeature for RowsWithHoles {
    fn id(&self) -> &'static str {
        "rows_with_holes"
    }
    fn name(&self) -> &'static str {
        "Rows with Holes"
    }
    fn clone_boxed(&self) -> BoxedBoardFeature {
        Box::new(self.clone())
    }
    fn compute(&self, analysis: &PlacementAnalysis) -> f64 {
        let state = analysis.state();
        let board = state.board();
        let mut rows = 0;
        let mut holes = 0;
        let mut above = board.row(state.summit() + 1).playable_bits();
        for y in stack_rows(state).rev() {
            let row = board.row(y).playable_bits();
            holes = !row & (above | holes);
            if holes != 0 {
                rows += 1;
            }
            above = row;
        }
        f64::from(rows)
    }
}

// Empty cells with filled (or wall) neighbors on both sides and an empty
// cell directly below, as a bit mask of row `y`.
fn two_deep_wells(board: &BitBoard, y: usize) -> u16 {
    let row = board.row(y).bits();
    (row >> 1) & (row << 1) & !row & !board.row(y - 1).bits()
}

/// Number of wells with at least one empty cell directly below them.
///
/// ```text
/// [filled][empty][filled]
///         [empty]
/// ```
///
/// Counting 2-deep and 3-deep wells separately penalizes deep wells without
/// the triangular blow-up of cumulative well depth.
#[derive(Debug, Clone)]
pub struct TwoDeepWells;

impl BoardFeature for TwoDeepWells {
    fn id(&self) -> &'static str {
        "wells_2_deep"
    }
    fn name(&self) -> &'static str {
        "2-Deep Wells"
    }
    fn clone_boxed(&self) -> BoxedBoardFeature {
        Box::new(self.clone())
    }
    fn compute(&self, analysis: &PlacementAnalysis) -> f64 {
        let state = analysis.state();
        let board = state.board();
        let wells: u32 = stack_rows(state)
            .map(|y| two_deep_wells(board, y).count_ones())
            .sum();
        f64::from(wells)
    }
}

/// Number of wells with at least two empty cells directly below them.
#[derive(Debug, Clone)]
pub struct ThreeDeepWells;

impl BoardFeature for ThreeDeepWells {
    fn id(&self) -> &'static str {
        "wells_3_deep"
    }
    fn name(&self) -> &'static str {
        "3-Deep Wells"
    }
    fn clone_boxed(&self) -> BoxedBoardFeature {
        Box::new(self.clone())
    }
    fn compute(&self, analysis: &PlacementAnalysis) -> f64 {
        let state = analysis.state();
        let board = state.board();
        let wells: u32 = stack_rows(state)
            .map(|y| (two_deep_wells(board, y) & !board.row(y - 2).bits()).count_ones())
            .sum();
        f64::from(wells)
    }
}

/// How many empty cells have to be filled before the holes can be reached.
///
/// For every hole, each filled row directly covering it is charged once:
/// one point, plus its empty cells minus a discount of one per row between
/// it and the hole. Deep holes are discounted because ordinary play tends to
/// clear the rows near the bottom before they are dug out.
#[derive(Debug, Clone)]
pub struct HoleQuota;

impl BoardFeature for HoleQuota {
    fn id(&self) -> &'static str {
        "hole_quota"
    }
    fn name(&self) -> &'static str {
        "Hole Quota"
    }
    fn clone_boxed(&self) -> BoxedBoardFeature {
        Box::new(self.clone())
    }
    fn compute(&self, analysis: &PlacementAnalysis) -> f64 {
        let state = analysis.state();
        let board = state.board();
        let mut quota = 0;
        let mut charged_rows: u32 = 0;
        for y in stack_rows(state).rev() {
            let above = board.row(y + 1);
            let row = board.row(y);
            if above.playable_bits() & !row.playable_bits() == 0 {
                continue;
            }
            for col in 0..BitBoard::PLAYABLE_WIDTH {
                if !above.is_cell_occupied(col) || row.is_cell_occupied(col) {
                    continue;
                }
                let mut cover = y + 1;
                while cover < BitBoard::TOTAL_HEIGHT && board.row(cover).is_cell_occupied(col) {
                    if charged_rows & (1 << cover) == 0 {
                        let empties =
                            BitBoard::PLAYABLE_WIDTH - board.row(cover).filled_cells() as usize;
                        let discount = cover - y - 1;
                        quota += 1 + empties.saturating_sub(discount);
                        charged_rows |= 1 << cover;
                    }
                    cover += 1;
                }
            }
        }
        count(quota)
    }
}

#[expect(clippy::cast_precision_loss)]
fn count(n: usize) -> f64 {
    n as f64
}

#[cfg(test)]
mod tests {
    use dizzy_engine::PieceKind;

    use super::*;

    fn analyze(art: &str) -> PlacementAnalysis {
        let state = GameState::with_board(BitBoard::from_ascii(art), PieceKind::T);
        PlacementAnalysis::from_locked(state)
    }

    fn empty() -> PlacementAnalysis {
        PlacementAnalysis::from_locked(GameState::new(PieceKind::T))
    }

    #[test]
    fn test_empty_board() {
        let analysis = empty();
        assert_eq!(WeightedRows.compute(&analysis), 0.0);
        assert_eq!(RowTransitions.compute(&analysis), 40.0);
        assert_eq!(ColumnTransitions.compute(&analysis), 10.0);
        assert_eq!(RowsWithHoles.compute(&analysis), 0.0);
        assert_eq!(TwoDeepWells.compute(&analysis), 0.0);
        assert_eq!(ThreeDeepWells.compute(&analysis), 0.0);
        assert_eq!(HoleQuota.compute(&analysis), 0.0);
    }

    #[test]
    fn test_weighted_rows() {
        let analysis = analyze(
            r"
            ##........
            ##########
            ",
        );
        // 10 cells at height 1, 2 cells at height 2, no pieces counted
        assert!((WeightedRows.compute(&analysis) - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_row_transitions() {
        let analysis = analyze(
            r"
            .####.....
            #.#.......
            ",
        );
        // each stack row has 4 boundaries, the walls included
        let expected = 2.0 * (BitBoard::ROOF - (BitBoard::FLOOR + 1)) as f64 + 4.0 + 4.0;
        assert_eq!(RowTransitions.compute(&analysis), expected);
    }

    #[test]
    fn test_column_transitions() {
        let analysis = analyze(
            r"
            #.........
            ..........
            #.#.......
            ",
        );
        // floor vs row 1: 8 empty cells
        // row 1 vs row 2: columns 0 and 2
        // row 2 vs row 3: column 0
        // row 3 vs empty row above: column 0
        assert_eq!(ColumnTransitions.compute(&analysis), 8.0 + 2.0 + 1.0 + 1.0);
    }

    #[test]
    fn test_rows_with_holes() {
        let analysis = analyze(
            r"
            ...#......
            ..........
            .........#
            ##.#######
            ",
        );
        // column 3 is covered on the two rows below its top cell; the bottom
        // row's gap at column 2 is open
        assert_eq!(RowsWithHoles.compute(&analysis), 2.0);
    }

    #[test]
    fn test_rows_with_holes_carries_cover_down() {
        let analysis = analyze(
            r"
            ####......
            .#........
            ..........
            ",
        );
        // the gaps under the top row stay covered down to the floor
        assert_eq!(RowsWithHoles.compute(&analysis), 2.0);
    }

    #[test]
    fn test_wells() {
        let analysis = analyze(
            r"
            #.#......#
            #.#......#
            #.#.#....#
            ##########
            ",
        );
        // column 1: empty on rows 2-4 between filled columns 0 and 2
        //   row 4 (2 empties below) counts for both, row 3 for the 2-deep only
        assert_eq!(TwoDeepWells.compute(&analysis), 2.0);
        assert_eq!(ThreeDeepWells.compute(&analysis), 1.0);
    }

    #[test]
    fn test_wells_at_wall() {
        let analysis = analyze(
            r"
            .#........
            .#........
            .#........
            ",
        );
        assert_eq!(TwoDeepWells.compute(&analysis), 2.0);
        assert_eq!(ThreeDeepWells.compute(&analysis), 1.0);
    }

    #[test]
    fn test_hole_quota() {
        let analysis = analyze(
            r"
            #.........
            ##########
            .#########
            ",
        );
        // hole at column 0 row 1, covered by row 2 (full, 0 empties, discount 0)
        // and row 3 (9 empties, discount 1)
        assert_eq!(HoleQuota.compute(&analysis), (1.0 + 0.0) + (1.0 + 8.0));
    }

    #[test]
    fn test_hole_quota_charges_shared_cover_once() {
        let analysis = analyze(
            r"
            ###.......
            .#........
            ",
        );
        // holes at columns 0 and 2 share the cover row; it is charged once
        assert_eq!(HoleQuota.compute(&analysis), 1.0 + 7.0);
    }
}
