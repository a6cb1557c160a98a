//! Noisy cross-entropy method over strategy weights.
//!
//! The trainer keeps a diagonal Gaussian over weight vectors. Each iteration:
//!
//! 1. The iteration counter is incremented (the first iteration is 1)
//! 2. `population` candidates are sampled with
//!    `w[d] ~ Normal(μ[d], σ²[d] + noise × |μ[d]|)`, where
//!    `noise = noise_constant / log10(1 + iteration)`
//! 3. Every candidate plays `games_per_trial` seeded games (see [`fitness`])
//! 4. Candidates are ranked by `mean - λ × mean × Σ|w|`
//! 5. μ and σ² are refit to the top `⌊elite_fraction × population⌋`
//!    candidates (at least one), with σ² floored at `variance_floor`
//! 6. The best records are updated, and the log and checkpoint are written
//!
//! Ranking uses the penalized fitness, while every reported score is the raw
//! mean of cleared lines.
//!
//! # Best Records
//!
//! - **Best average**: the refit mean vector, scored by the mean lines of the
//!   elite it was fitted to
//! - **Best single**: the candidate with the highest mean lines over its own
//!   games
//!
//! Both are only replaced on strict improvement, so they never regress.
//!
//! [`fitness`]: crate::fitness

use std::{
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};

use chrono::{DateTime, Utc};
use dizzy_evaluator::{
    StrategyDimensionError, board_feature::BoxedBoardFeature, strategy::Strategy,
};
use dizzy_stats::descriptive::DescriptiveStats;
use rand::Rng;
use rand_distr::NormalError;
use serde::{Deserialize, Serialize};

use crate::{
    checkpoint::TrainerCheckpoint,
    fitness::{self, CandidateResult, TrialConfig},
    training_log::TrainingLog,
    weights,
};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum TrainingError {
    #[display("training log or checkpoint I/O failed: {_0}")]
    Io(std::io::Error),
    #[display("{_0}")]
    StrategyDimension(StrategyDimensionError),
    #[display("malformed trainer checkpoint: {_0}")]
    Checkpoint(serde_json::Error),
    #[display("{_0}")]
    InvalidParams(InvalidParamsError),
    #[display("cannot sample candidate weights: {_0}")]
    Sampling(NormalError),
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("invalid training parameter `{name}`: {reason}")]
pub struct InvalidParamsError {
    pub name: &'static str,
    pub reason: &'static str,
}

/// Trainer configuration.
///
/// Missing fields take their default when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossEntropyParams {
    /// Candidates sampled per iteration.
    pub population: usize,
    /// Share of the population the distribution is refit to.
    pub elite_fraction: f64,
    /// Games played by every candidate.
    pub games_per_trial: usize,
    /// Variance of every dimension before the first refit.
    pub initial_variance: f64,
    pub noise_constant: f64,
    /// L1 regularization constant (λ).
    pub l1_constant: f64,
    pub variance_floor: f64,
    /// Pieces after which a game is stopped.
    pub max_pieces: Option<usize>,
    /// Seed of the first game of every trial.
    pub base_seed: u64,
    /// Worker threads; all available cores if unset.
    pub workers: Option<usize>,
    /// Iterations after which [`CrossEntropyTrainer::run`] returns.
    pub max_iterations: Option<usize>,
}

impl Default for CrossEntropyParams {
    fn default() -> Self {
        Self {
            population: 100,
            elite_fraction: 0.1,
            games_per_trial: 10,
            initial_variance: 10.0,
            noise_constant: 0.03,
            l1_constant: 0.04 / 9.0,
            variance_floor: 1e-3,
            max_pieces: Some(1_000_000),
            base_seed: 0,
            workers: None,
            max_iterations: None,
        }
    }
}

impl CrossEntropyParams {
    pub fn validate(&self) -> Result<(), InvalidParamsError> {
        let invalid = |name, reason| Err(InvalidParamsError { name, reason });
        if self.population == 0 {
            return invalid("population", "must be at least 1");
        }
        if !(self.elite_fraction > 0.0 && self.elite_fraction <= 1.0) {
            return invalid("elite_fraction", "must be in (0, 1]");
        }
        if self.games_per_trial == 0 {
            return invalid("games_per_trial", "must be at least 1");
        }
        if !(self.initial_variance.is_finite() && self.initial_variance >= 0.0) {
            return invalid("initial_variance", "must be finite and non-negative");
        }
        if !(self.noise_constant.is_finite() && self.noise_constant >= 0.0) {
            return invalid("noise_constant", "must be finite and non-negative");
        }
        if !(self.l1_constant.is_finite() && self.l1_constant >= 0.0) {
            return invalid("l1_constant", "must be finite and non-negative");
        }
        if !(self.variance_floor.is_finite() && self.variance_floor > 0.0) {
            return invalid("variance_floor", "must be finite and positive");
        }
        if self.workers == Some(0) {
            return invalid("workers", "must be at least 1");
        }
        Ok(())
    }

    /// Number of top candidates the distribution is refit to.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn elite_count(&self) -> usize {
        let count = (self.elite_fraction * self.population as f64).floor() as usize;
        count.clamp(1, self.population.max(1))
    }

    #[must_use]
    pub fn trial_config(&self) -> TrialConfig {
        TrialConfig {
            games: self.games_per_trial,
            base_seed: self.base_seed,
            max_pieces: self.max_pieces,
            l1_constant: self.l1_constant,
        }
    }
}

/// A strategy together with the raw mean lines it was scored with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestRecord {
    pub lines: f64,
    pub strategy: Strategy,
}

/// Everything a single iteration produced.
#[derive(Debug, Clone)]
pub struct IterationReport {
    pub iteration: usize,
    pub finished_at: DateTime<Utc>,
    pub games_per_trial: usize,
    /// Elite candidates, best fitness first.
    pub elite: Vec<CandidateResult>,
    pub elite_fitness: Option<DescriptiveStats>,
    pub best_mean: BestRecord,
    pub best_single: BestRecord,
    pub new_best_single: bool,
}

#[derive(Debug, Clone)]
pub struct CrossEntropyTrainer {
    params: CrossEntropyParams,
    features: Vec<BoxedBoardFeature>,
    means: Vec<f64>,
    variances: Vec<f64>,
    iteration: usize,
    best_mean: Option<BestRecord>,
    best_single: Option<BestRecord>,
    last_elite_fitness: Option<DescriptiveStats>,
}

impl CrossEntropyTrainer {
    /// Starts from `initial` as the mean, with `initial_variance` everywhere.
    pub fn new(
        params: CrossEntropyParams,
        features: Vec<BoxedBoardFeature>,
        initial: Strategy,
    ) -> Result<Self, TrainingError> {
        params.validate()?;
        check_dimension(initial.len(), features.len())?;
        let variances = vec![params.initial_variance; features.len()];
        Ok(Self {
            params,
            features,
            means: initial.into_weights(),
            variances,
            iteration: 0,
            best_mean: None,
            best_single: None,
            last_elite_fitness: None,
        })
    }

    /// Resumes from a checkpoint written by [`Self::checkpoint`].
    pub fn from_checkpoint(
        params: CrossEntropyParams,
        features: Vec<BoxedBoardFeature>,
        checkpoint: TrainerCheckpoint,
    ) -> Result<Self, TrainingError> {
        params.validate()?;
        check_dimension(checkpoint.means.len(), features.len())?;
        check_dimension(checkpoint.variances.len(), features.len())?;
        for record in [&checkpoint.best_mean, &checkpoint.best_single]
            .into_iter()
            .flatten()
        {
            check_dimension(record.strategy.len(), features.len())?;
        }
        Ok(Self {
            params,
            features,
            means: checkpoint.means,
            variances: checkpoint.variances,
            iteration: checkpoint.iteration,
            best_mean: checkpoint.best_mean,
            best_single: checkpoint.best_single,
            last_elite_fitness: checkpoint.last_elite_fitness,
        })
    }

    #[must_use]
    pub fn checkpoint(&self) -> TrainerCheckpoint {
        TrainerCheckpoint {
            iteration: self.iteration,
            means: self.means.clone(),
            variances: self.variances.clone(),
            best_mean: self.best_mean.clone(),
            best_single: self.best_single.clone(),
            last_elite_fitness: self.last_elite_fitness,
        }
    }

    #[must_use]
    pub fn params(&self) -> &CrossEntropyParams {
        &self.params
    }

    /// Number of completed iterations.
    #[must_use]
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    #[must_use]
    pub fn variances(&self) -> &[f64] {
        &self.variances
    }

    #[must_use]
    pub fn best_mean(&self) -> Option<&BestRecord> {
        self.best_mean.as_ref()
    }

    #[must_use]
    pub fn best_single(&self) -> Option<&BestRecord> {
        self.best_single.as_ref()
    }

    /// Noise factor used while sampling iteration `iteration`.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn noise(&self, iteration: usize) -> f64 {
        self.params.noise_constant / (1.0 + iteration as f64).log10()
    }

    /// Draws the candidates of the next iteration.
    pub fn sample_candidates<R>(&self, rng: &mut R) -> Result<Vec<Strategy>, TrainingError>
    where
        R: Rng + ?Sized,
    {
        let noise = self.noise(self.iteration + 1);
        (0..self.params.population)
            .map(|_| {
                weights::sample_gaussian(rng, &self.means, &self.variances, noise)
                    .map(Strategy::new)
                    .map_err(TrainingError::from)
            })
            .collect()
    }

    /// Samples, evaluates and refits once.
    pub fn run_iteration<R>(&mut self, rng: &mut R) -> Result<IterationReport, TrainingError>
    where
        R: Rng + ?Sized,
    {
        let candidates = self.sample_candidates(rng)?;
        let workers = self
            .params
            .workers
            .unwrap_or_else(fitness::default_worker_count);
        let results = fitness::evaluate_candidates(
            &self.features,
            candidates,
            &self.params.trial_config(),
            workers,
        )?;
        self.iteration += 1;
        Ok(self.refit(results))
    }

    /// Ranks evaluated candidates, refits the distribution and updates the
    /// best records.
    pub fn refit(&mut self, mut results: Vec<CandidateResult>) -> IterationReport {
        let single_best = results
            .iter()
            .max_by(|a, b| a.mean_lines.total_cmp(&b.mean_lines))
            .map(|r| BestRecord {
                lines: r.mean_lines,
                strategy: r.strategy.clone(),
            });
        results.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        results.truncate(self.params.elite_count());
        let elite = results;

        let samples = elite
            .iter()
            .map(|result| result.strategy.weights())
            .collect::<Vec<_>>();
        if let Some((means, variances)) =
            weights::fit_gaussian(&samples, self.means.len(), self.params.variance_floor)
        {
            self.means = means;
            self.variances = variances;
        }

        let elite_lines = DescriptiveStats::new(elite.iter().map(|r| r.mean_lines));
        let elite_fitness = DescriptiveStats::new(elite.iter().map(|r| r.fitness));
        self.last_elite_fitness = elite_fitness;

        let (best_mean, _) = keep_best(
            &mut self.best_mean,
            BestRecord {
                lines: elite_lines.map_or(0.0, |stats| stats.mean),
                strategy: Strategy::new(self.means.clone()),
            },
        );
        let (best_single, new_best_single) = match single_best {
            Some(candidate) => keep_best(&mut self.best_single, candidate),
            None => (self.best_single.clone().unwrap_or_else(|| best_mean.clone()), false),
        };

        if let Some(stats) = &elite_fitness {
            log::info!(
                "iteration {}: elite fitness min {:.1} / mean {:.1} / max {:.1}, best average {:.0}, best single {:.0}",
                self.iteration,
                stats.min,
                stats.mean,
                stats.max,
                best_mean.lines,
                best_single.lines,
            );
        }
        if new_best_single {
            log::info!("new best single: {:.0} lines", best_single.lines);
        }

        IterationReport {
            iteration: self.iteration,
            finished_at: Utc::now(),
            games_per_trial: self.params.games_per_trial,
            elite,
            elite_fitness,
            best_mean,
            best_single,
            new_best_single,
        }
    }

    /// Iterates until `stop` is set or `max_iterations` is reached.
    ///
    /// `stop` is only checked between iterations. Each report is appended to
    /// `log`, and the trainer state is written to `checkpoint_path` after every
    /// iteration.
    pub fn run<R, W>(
        &mut self,
        rng: &mut R,
        log: &mut TrainingLog<W>,
        checkpoint_path: Option<&Path>,
        stop: &AtomicBool,
    ) -> Result<(), TrainingError>
    where
        R: Rng + ?Sized,
        W: std::io::Write,
    {
        while !stop.load(Ordering::Relaxed)
            && self
                .params
                .max_iterations
                .is_none_or(|max| self.iteration < max)
        {
            let report = self.run_iteration(rng)?;
            log.write_iteration(&report)?;
            if let Some(path) = checkpoint_path {
                self.checkpoint().save(path)?;
            }
        }
        Ok(())
    }
}

fn check_dimension(weights: usize, features: usize) -> Result<(), StrategyDimensionError> {
    if weights == features {
        Ok(())
    } else {
        Err(StrategyDimensionError { weights, features })
    }
}

// Replaces the record only on strict improvement and returns the record kept.
fn keep_best(slot: &mut Option<BestRecord>, candidate: BestRecord) -> (BestRecord, bool) {
    let (best, improved) = match slot.take() {
        Some(best) if best.lines >= candidate.lines => (best, false),
        _ => (candidate, true),
    };
    *slot = Some(best.clone());
    (best, improved)
}

#[cfg(test)]
mod tests {
    use dizzy_evaluator::board_feature::{
        all_board_features,
        structure::{ColumnTransitions, RowTransitions},
    };
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn two_features() -> Vec<BoxedBoardFeature> {
        vec![Box::new(RowTransitions), Box::new(ColumnTransitions)]
    }

    fn result(weights: [f64; 2], mean_lines: f64, fitness: f64) -> CandidateResult {
        CandidateResult {
            strategy: Strategy::new(weights.to_vec()),
            mean_lines,
            fitness,
        }
    }

    fn small_trainer() -> CrossEntropyTrainer {
        let params = CrossEntropyParams {
            population: 4,
            elite_fraction: 0.5,
            ..CrossEntropyParams::default()
        };
        CrossEntropyTrainer::new(params, two_features(), Strategy::new(vec![0.0, 0.0])).unwrap()
    }

    #[test]
    fn test_elite_count() {
        assert_eq!(CrossEntropyParams::default().elite_count(), 10);
        let tiny = CrossEntropyParams {
            population: 5,
            ..CrossEntropyParams::default()
        };
        assert_eq!(tiny.elite_count(), 1);
        let all = CrossEntropyParams {
            population: 3,
            elite_fraction: 1.0,
            ..CrossEntropyParams::default()
        };
        assert_eq!(all.elite_count(), 3);
    }

    #[test]
    fn test_validate() {
        assert!(CrossEntropyParams::default().validate().is_ok());
        let err = CrossEntropyParams {
            population: 0,
            ..CrossEntropyParams::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.name, "population");
        let err = CrossEntropyParams {
            elite_fraction: 0.0,
            ..CrossEntropyParams::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.name, "elite_fraction");
    }

    #[test]
    fn test_params_defaults_fill_missing_fields() {
        let params: CrossEntropyParams =
            serde_json::from_str(r#"{"population": 5, "workers": 2}"#).unwrap();
        assert_eq!(params.population, 5);
        assert_eq!(params.workers, Some(2));
        assert_eq!(params.games_per_trial, 10);
        assert_eq!(params.max_pieces, Some(1_000_000));
    }

    #[test]
    fn test_noise_decays() {
        let trainer = small_trainer();
        assert!((trainer.noise(1) - 0.03 / 2.0_f64.log10()).abs() < 1e-12);
        assert!((trainer.noise(9) - 0.03).abs() < 1e-12);
        assert!(trainer.noise(100) < trainer.noise(10));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = CrossEntropyTrainer::new(
            CrossEntropyParams::default(),
            all_board_features(),
            Strategy::new(vec![1.0; 2]),
        )
        .unwrap_err();
        assert!(matches!(err, TrainingError::StrategyDimension(_)));

        let mut checkpoint = small_trainer().checkpoint();
        checkpoint.variances.push(1.0);
        let params = small_trainer().params().clone();
        let err = CrossEntropyTrainer::from_checkpoint(params, two_features(), checkpoint)
            .unwrap_err();
        assert!(matches!(err, TrainingError::StrategyDimension(_)));
    }

    #[test]
    fn test_refit_to_elite() {
        let mut trainer = small_trainer();
        trainer.iteration = 1;
        let report = trainer.refit(vec![
            result([9.0, 9.0], 50.0, 1.0),
            result([1.0, 2.0], 40.0, 4.0),
            result([3.0, 2.0], 30.0, 3.0),
            result([7.0, 7.0], 20.0, 2.0),
        ]);

        assert_eq!(trainer.means(), &[2.0, 2.0]);
        // no spread in the second dimension
        assert_eq!(trainer.variances(), &[1.0, 1e-3]);

        assert_eq!(report.elite.len(), 2);
        assert_eq!(report.elite[0].fitness, 4.0);
        assert_eq!(report.elite[1].fitness, 3.0);
        assert_eq!(report.best_mean.lines, 35.0);
        assert_eq!(report.best_mean.strategy.weights(), &[2.0, 2.0]);
        // best single is taken from the whole population
        assert_eq!(report.best_single.lines, 50.0);
        assert_eq!(report.best_single.strategy.weights(), &[9.0, 9.0]);
        assert!(report.new_best_single);
        assert_eq!(report.elite_fitness.map(|s| s.mean), Some(3.5));
    }

    #[test]
    fn test_best_records_never_regress() {
        let mut trainer = small_trainer();
        trainer.refit(vec![
            result([1.0, 1.0], 80.0, 8.0),
            result([2.0, 2.0], 60.0, 6.0),
        ]);
        let report = trainer.refit(vec![
            result([5.0, 5.0], 10.0, 1.0),
            result([6.0, 6.0], 5.0, 0.5),
        ]);
        assert!(!report.new_best_single);
        assert_eq!(report.best_single.lines, 80.0);
        assert_eq!(report.best_mean.lines, 70.0);
        assert_eq!(report.best_mean.strategy.weights(), &[1.5, 1.5]);
        // the sampling distribution still follows the latest elite
        assert_eq!(trainer.means(), &[5.5, 5.5]);
        assert_eq!(trainer.best_single().map(|b| b.lines), Some(80.0));
    }

    #[test]
    fn test_sampling_is_seeded() {
        let trainer = small_trainer();
        let a = trainer.sample_candidates(&mut Pcg32::seed_from_u64(3)).unwrap();
        let b = trainer.sample_candidates(&mut Pcg32::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
        assert!(a.iter().all(|s| s.len() == 2));
    }

    fn tiny_params() -> CrossEntropyParams {
        CrossEntropyParams {
            population: 3,
            elite_fraction: 0.5,
            games_per_trial: 1,
            max_pieces: Some(20),
            workers: Some(2),
            max_iterations: Some(2),
            ..CrossEntropyParams::default()
        }
    }

    #[test]
    fn test_run_until_iteration_cap() {
        let mut trainer =
            CrossEntropyTrainer::new(tiny_params(), all_board_features(), Strategy::baseline())
                .unwrap();
        let mut log = TrainingLog::new(Vec::new());
        let stop = AtomicBool::new(false);
        trainer
            .run(&mut Pcg32::seed_from_u64(0), &mut log, None, &stop)
            .unwrap();

        assert_eq!(trainer.iteration(), 2);
        let text = String::from_utf8(log.into_inner()).unwrap();
        assert!(text.contains("Iteration 1\t"));
        assert!(text.contains("Iteration 2\t"));
        assert!(!text.contains("Iteration 3\t"));

        let checkpoint = trainer.checkpoint();
        assert_eq!(checkpoint.iteration, 2);
        assert!(checkpoint.best_mean.is_some());
        assert!(checkpoint.variances.iter().all(|&v| v >= 1e-3));
    }

    #[test]
    fn test_stop_flag_prevents_iterations() {
        let mut trainer =
            CrossEntropyTrainer::new(tiny_params(), all_board_features(), Strategy::baseline())
                .unwrap();
        let mut log = TrainingLog::new(Vec::new());
        let stop = AtomicBool::new(true);
        trainer
            .run(&mut Pcg32::seed_from_u64(0), &mut log, None, &stop)
            .unwrap();
        assert_eq!(trainer.iteration(), 0);
        assert!(log.into_inner().is_empty());
    }

    // Raises the stop flag as soon as a log block is written.
    struct StopOnWrite<'a> {
        text: Vec<u8>,
        stop: &'a AtomicBool,
    }

    impl std::io::Write for StopOnWrite<'_> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.stop.store(true, Ordering::Relaxed);
            self.text.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_stop_mid_run_finishes_current_iteration() {
        let params = CrossEntropyParams {
            max_iterations: None,
            ..tiny_params()
        };
        let mut trainer =
            CrossEntropyTrainer::new(params, all_board_features(), Strategy::baseline()).unwrap();
        let stop = AtomicBool::new(false);
        let mut log = TrainingLog::new(StopOnWrite {
            text: Vec::new(),
            stop: &stop,
        });
        trainer
            .run(&mut Pcg32::seed_from_u64(0), &mut log, None, &stop)
            .unwrap();

        assert_eq!(trainer.iteration(), 1);
        assert!(trainer.best_mean().is_some());
        let text = String::from_utf8(log.into_inner().text).unwrap();
        assert!(text.contains("Iteration 1\t"));
        assert!(!text.contains("Iteration 2\t"));
    }

    #[test]
    fn test_resume_continues_counting() {
        let mut trainer =
            CrossEntropyTrainer::new(tiny_params(), all_board_features(), Strategy::baseline())
                .unwrap();
        trainer.run_iteration(&mut Pcg32::seed_from_u64(1)).unwrap();
        let checkpoint = trainer.checkpoint();

        let mut resumed =
            CrossEntropyTrainer::from_checkpoint(tiny_params(), all_board_features(), checkpoint)
                .unwrap();
        assert_eq!(resumed.means(), trainer.means());
        let report = resumed.run_iteration(&mut Pcg32::seed_from_u64(2)).unwrap();
        assert_eq!(report.iteration, 2);
    }
}
