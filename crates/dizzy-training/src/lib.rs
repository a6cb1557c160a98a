//! Training system for tuning feature weights with the noisy cross-entropy
//! method.
//!
//! # How Training Works
//!
//! 1. **Sample** - Draw a population of weight vectors from a diagonal Gaussian
//! 2. **Evaluate** - Each candidate plays a fixed set of seeded games in parallel
//! 3. **Rank** - Candidates are sorted by L1-penalized mean cleared lines
//! 4. **Refit** - The Gaussian is refit to the elite fraction of the population
//! 5. **Record** - Best records, the training log and the checkpoint are updated
//!
//! # Architecture
//!
//! ```text
//! CrossEntropyTrainer
//!     ↓ samples
//! Strategy (candidate weights)
//!     ↓ played by
//! GameSimulator (dizzy-evaluator), fanned out over worker threads
//!     ↓ produces
//! Mean cleared lines → fitness
//!     ↓ guides
//! Refit of the sampling distribution
//! ```
//!
//! Noise added to the sampling variance is proportional to each mean weight and
//! decays logarithmically with the iteration count, which keeps the
//! distribution from collapsing too early. See [`cross_entropy`] for details.

pub use self::cross_entropy::{InvalidParamsError, TrainingError};

pub mod checkpoint;
pub mod cross_entropy;
pub mod fitness;
pub mod training_log;
pub mod weights;
