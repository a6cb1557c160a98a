//! Parallel fitness evaluation of candidate strategies.
//!
//! A fixed number of workers pull candidate indices from a shared cursor and
//! report `(index, mean lines)` back over a channel. The scope join acts as
//! the barrier: [`evaluate_candidates`] returns only after every candidate has
//! been played.
//!
//! Every candidate plays the same games: game `j` draws its pieces from
//! `base_seed + j`. Results therefore do not depend on the worker count or on
//! the order in which workers pick up candidates.

use std::{
    num::NonZero,
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc,
    },
    thread,
};

use dizzy_engine::RandomPieceSource;
use dizzy_evaluator::{
    StrategyDimensionError, board_feature::BoxedBoardFeature, game_simulator::GameSimulator,
    placement_evaluator::FeatureBasedPlacementEvaluator, strategy::Strategy,
    turn_evaluator::TurnEvaluator,
};

use crate::weights;

/// Games played by every candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialConfig {
    pub games: usize,
    pub base_seed: u64,
    pub max_pieces: Option<usize>,
    pub l1_constant: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateResult {
    pub strategy: Strategy,
    /// Raw mean cleared lines over the trial's games.
    pub mean_lines: f64,
    /// L1-penalized mean lines, used for ranking only.
    pub fitness: f64,
}

/// Number of workers to use when none is configured.
#[must_use]
pub fn default_worker_count() -> usize {
    thread::available_parallelism().map_or(1, NonZero::get)
}

/// Plays the trial's games with a single evaluator and returns the mean
/// cleared lines.
#[must_use]
pub fn play_trial(evaluator: &FeatureBasedPlacementEvaluator, config: &TrialConfig) -> f64 {
    let mut total_lines = 0;
    for game in 0..config.games as u64 {
        let seed = config.base_seed.wrapping_add(game);
        let turn_evaluator = TurnEvaluator::new(Box::new(evaluator));
        let source = RandomPieceSource::with_seed(seed);
        let mut simulator = GameSimulator::new(turn_evaluator, source, config.max_pieces);
        total_lines += simulator.run().lines;
    }
    mean(total_lines, config.games)
}

/// Evaluates every candidate on `workers` threads.
///
/// Results are returned in candidate order.
pub fn evaluate_candidates(
    features: &[BoxedBoardFeature],
    candidates: Vec<Strategy>,
    config: &TrialConfig,
    workers: usize,
) -> Result<Vec<CandidateResult>, StrategyDimensionError> {
    let evaluators = candidates
        .into_iter()
        .map(|strategy| FeatureBasedPlacementEvaluator::new(features.to_vec(), strategy))
        .collect::<Result<Vec<_>, _>>()?;

    let count = evaluators.len();
    let workers = workers.clamp(1, count.max(1));
    let cursor = AtomicUsize::new(0);
    let mut mean_lines = vec![None; count];

    thread::scope(|s| {
        let (tx, rx) = mpsc::channel();
        for _ in 0..workers {
            let tx = tx.clone();
            let cursor = &cursor;
            let evaluators = &evaluators;
            s.spawn(move || {
                loop {
                    let index = cursor.fetch_add(1, Ordering::Relaxed);
                    let Some(evaluator) = evaluators.get(index) else {
                        break;
                    };
                    let lines = play_trial(evaluator, config);
                    log::debug!("candidate {index}: {lines:.1} mean lines");
                    if tx.send((index, lines)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);
        for (index, lines) in rx.iter().take(count) {
            mean_lines[index] = Some(lines);
        }
    });

    let results = evaluators
        .into_iter()
        .zip(mean_lines)
        .filter_map(|(evaluator, lines)| {
            let mean_lines = lines?;
            let strategy = evaluator.strategy().clone();
            let fitness =
                weights::penalized_fitness(mean_lines, config.l1_constant, strategy.weights());
            Some(CandidateResult {
                strategy,
                mean_lines,
                fitness,
            })
        })
        .collect();
    Ok(results)
}

#[expect(clippy::cast_precision_loss)]
fn mean(total: usize, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    total as f64 / count as f64
}
