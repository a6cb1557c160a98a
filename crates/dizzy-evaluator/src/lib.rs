//! Greedy placement selection driven by weighted board features.
//!
//! The evaluation is layered:
//!
//! ```text
//! GameSimulator (plays a whole game)
//!     ↓ uses
//! TurnEvaluator (select the best placement of the current piece)
//!     ↓ uses
//! PlacementEvaluator (score a single locked placement)
//!     ↓ uses
//! BoardFeature (one structural measurement of the locked board)
//! ```
//!
//! A placement's score is the dot product of a [`Strategy`](strategy::Strategy)
//! with the nine features of [`board_feature::all_board_features`], measured
//! on the state right after the piece is locked and lines are cleared.
//!
//! # Example
//!
//! ```
//! use dizzy_engine::RandomPieceSource;
//! use dizzy_evaluator::{
//!     board_feature::all_board_features, game_simulator::GameSimulator,
//!     placement_evaluator::FeatureBasedPlacementEvaluator, strategy::Strategy,
//!     turn_evaluator::TurnEvaluator,
//! };
//!
//! let evaluator =
//!     FeatureBasedPlacementEvaluator::new(all_board_features(), Strategy::baseline()).unwrap();
//! let turn_evaluator = TurnEvaluator::new(Box::new(evaluator));
//! let mut simulator =
//!     GameSimulator::new(turn_evaluator, RandomPieceSource::with_seed(0), Some(200));
//! let outcome = simulator.run();
//! assert!(outcome.pieces <= 200);
//! ```

pub mod board_feature;
pub mod game_simulator;
pub mod placement_analysis;
pub mod placement_evaluator;
pub mod strategy;
pub mod turn_evaluator;

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("strategy has {weights} weights but {features} features are evaluated")]
pub struct StrategyDimensionError {
    pub weights: usize,
    pub features: usize,
}
