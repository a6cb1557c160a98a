//! Placement evaluation: scoring a single locked placement.
//!
//! The [`FeatureBasedPlacementEvaluator`] computes a linear combination of raw
//! feature values:
//!
//! ```text
//! score = w₀·f₀ + w₁·f₁ + ... + w₈·f₈
//! ```
//!
//! Features are not normalized; each weight carries both the sign and the
//! scale of its feature. The score only depends on the locked state, so it is
//! bit-identical across calls.
//!
//! # Usage
//!
//! ```
//! use dizzy_engine::{GameState, PieceKind, generate_placements};
//! use dizzy_evaluator::{
//!     board_feature::all_board_features,
//!     placement_analysis::PlacementAnalysis,
//!     placement_evaluator::{FeatureBasedPlacementEvaluator, PlacementEvaluator as _},
//!     strategy::Strategy,
//! };
//!
//! let evaluator =
//!     FeatureBasedPlacementEvaluator::new(all_board_features(), Strategy::baseline()).unwrap();
//! let state = GameState::new(PieceKind::T);
//! let placement = generate_placements(PieceKind::T, state.column_heights())[0];
//! let analysis = PlacementAnalysis::from_state(&state, placement);
//! let score = evaluator.evaluate_placement(&analysis);
//! assert_eq!(score, evaluator.evaluate_placement(&analysis));
//! ```

use std::{fmt, iter};

use crate::{
    StrategyDimensionError,
    board_feature::{BoardFeature as _, BoxedBoardFeature},
    placement_analysis::PlacementAnalysis,
    strategy::Strategy,
};

/// Scores a placement from its analysis (higher is better).
pub trait PlacementEvaluator: fmt::Debug + Send + Sync {
    fn evaluate_placement(&self, analysis: &PlacementAnalysis) -> f64;
}

impl<E> PlacementEvaluator for &E
where
    E: PlacementEvaluator + ?Sized,
{
    fn evaluate_placement(&self, analysis: &PlacementAnalysis) -> f64 {
        (**self).evaluate_placement(analysis)
    }
}

#[derive(Debug, Clone)]
pub struct FeatureBasedPlacementEvaluator {
    features: Vec<BoxedBoardFeature>,
    strategy: Strategy,
}

impl FeatureBasedPlacementEvaluator {
    /// Pairs each feature with the weight at the same index.
    ///
    /// # Errors
    ///
    /// Returns [`StrategyDimensionError`] if the strategy and the feature list
    /// differ in length.
    pub fn new(
        features: Vec<BoxedBoardFeature>,
        strategy: Strategy,
    ) -> Result<Self, StrategyDimensionError> {
        if features.len() != strategy.len() {
            return Err(StrategyDimensionError {
                weights: strategy.len(),
                features: features.len(),
            });
        }
        Ok(Self { features, strategy })
    }

    #[must_use]
    pub fn features(&self) -> &[BoxedBoardFeature] {
        &self.features
    }

    #[must_use]
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }
}

impl PlacementEvaluator for FeatureBasedPlacementEvaluator {
    #[inline]
    fn evaluate_placement(&self, analysis: &PlacementAnalysis) -> f64 {
        iter::zip(&self.features, self.strategy.weights())
            .map(|(f, w)| f.compute(analysis) * w)
            .sum()
    }
}
