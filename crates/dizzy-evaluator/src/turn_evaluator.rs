//! Turn evaluation: selecting the placement for the current piece.
//!
//! The [`TurnEvaluator`] is greedy. It scores every placement of the piece in
//! play and keeps the best one, without looking at future pieces.
//!
//! Placements come from [`generate_placements`], which only covers straight
//! vertical drops. Placements whose lock ends the game are never selected.

use dizzy_engine::{GameState, generate_placements};

use crate::{placement_analysis::PlacementAnalysis, placement_evaluator::PlacementEvaluator};

#[derive(Debug)]
pub struct TurnEvaluator<'a> {
    placement_evaluator: Box<dyn PlacementEvaluator + 'a>,
}

impl<'a> TurnEvaluator<'a> {
    #[must_use]
    pub fn new(placement_evaluator: Box<dyn PlacementEvaluator + 'a>) -> Self {
        Self {
            placement_evaluator,
        }
    }

    /// Scores every placement of the piece in play and returns the analysis of
    /// the strictly highest-scoring one.
    ///
    /// Ties keep the first placement in generation order. Returns `None` if
    /// every placement ends the game.
    #[must_use]
    pub fn select_best_placement(&self, state: &GameState) -> Option<PlacementAnalysis> {
        let kind = state.placement().kind();
        let mut best_score = f64::NEG_INFINITY;
        let mut best_result = None;

        for placement in generate_placements(kind, state.column_heights()) {
            let analysis = PlacementAnalysis::from_state(state, placement);
            if analysis.state().is_game_over() {
                continue;
            }
            let score = self.placement_evaluator.evaluate_placement(&analysis);
            if best_result.is_none() || score > best_score {
                best_score = score;
                best_result = Some(analysis);
            }
        }

        best_result
    }
}

#[cfg(test)]
mod tests {
    use dizzy_engine::{BitBoard, PieceKind};

    use super::*;

    #[derive(Debug)]
    struct Constant;

    impl PlacementEvaluator for Constant {
        fn evaluate_placement(&self, _analysis: &PlacementAnalysis) -> f64 {
            0.0
        }
    }

    // Prefers low landing rows, then the left-most column.
    #[derive(Debug)]
    struct Lowest;

    impl PlacementEvaluator for Lowest {
        #[expect(clippy::cast_precision_loss)]
        fn evaluate_placement(&self, analysis: &PlacementAnalysis) -> f64 {
            -(analysis.placement().y() as f64)
        }
    }

    #[test]
    fn test_ties_keep_first_placement() {
        let evaluator = TurnEvaluator::new(Box::new(Constant));
        let state = GameState::new(PieceKind::L);
        let first = generate_placements(PieceKind::L, state.column_heights())[0];
        let best = evaluator.select_best_placement(&state).unwrap();
        assert_eq!(best.placement(), first);
    }

    #[test]
    fn test_selects_highest_score() {
        let board = BitBoard::from_ascii(
            r"
            ##.#######
            ##.#######
            ##.#######
            ##.#######
            ",
        );
        let state = GameState::with_board(board, PieceKind::I);
        let evaluator = TurnEvaluator::new(Box::new(Lowest));
        let best = evaluator.select_best_placement(&state).unwrap();
        // the vertical I drops into the well and clears all four rows
        assert!(best.placement().covers_column(2));
        assert_eq!(best.state().lines(), 4);
        assert_eq!(best.state().board(), &BitBoard::INITIAL);
    }

    #[test]
    fn test_skips_game_over_placements() {
        let mut art = String::new();
        for _ in 0..BitBoard::PLAYABLE_HEIGHT {
            art.push_str("#########.\n");
        }
        // every column but the right-most is filled to the roof
        let board = BitBoard::from_ascii(&art);
        let state = GameState::with_board(board, PieceKind::O);
        let evaluator = TurnEvaluator::new(Box::new(Constant));
        assert!(evaluator.select_best_placement(&state).is_none());
    }
}
