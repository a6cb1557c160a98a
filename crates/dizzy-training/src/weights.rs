//! Weight vector operations for the cross-entropy method.
//!
//! - **Sampling**: [`sample_gaussian`] draws a candidate from the diagonal
//!   Gaussian with proportional noise
//! - **Refit**: [`fit_gaussian`] estimates a new Gaussian from the elite set
//! - **Regularization**: [`penalized_fitness`] applies the L1 penalty

use dizzy_stats::descriptive::DescriptiveStats;
use rand::Rng;
use rand_distr::{Normal, NormalError};

/// Draws one weight vector, dimension by dimension.
///
/// Dimension `d` is sampled from `Normal(means[d], variances[d] + noise × |means[d]|)`,
/// so the extra exploration scales with the magnitude of each weight.
///
/// # Errors
///
/// Returns an error if a resulting variance is negative or not a number.
pub fn sample_gaussian<R>(
    rng: &mut R,
    means: &[f64],
    variances: &[f64],
    noise: f64,
) -> Result<Vec<f64>, NormalError>
where
    R: Rng + ?Sized,
{
    assert_eq!(means.len(), variances.len());
    means
        .iter()
        .zip(variances)
        .map(|(&mean, &variance)| {
            let std_dev = (mean.abs() * noise + variance).sqrt();
            Normal::new(mean, std_dev).map(|normal| rng.sample(normal))
        })
        .collect()
}

/// Per-dimension sample mean and population variance of `samples`.
///
/// Variances are raised to at least `variance_floor`. Returns `None` if
/// there are no samples.
#[must_use]
pub fn fit_gaussian(
    samples: &[&[f64]],
    dims: usize,
    variance_floor: f64,
) -> Option<(Vec<f64>, Vec<f64>)> {
    let mut means = Vec::with_capacity(dims);
    let mut variances = Vec::with_capacity(dims);
    for d in 0..dims {
        let stats = DescriptiveStats::new(samples.iter().map(|sample| sample[d]))?;
        means.push(stats.mean);
        variances.push(stats.variance.max(variance_floor));
    }
    Some((means, variances))
}

/// Mean cleared lines minus an L1 penalty proportional to the mean itself.
///
/// ```text
/// fitness = mean_lines - λ × mean_lines × Σ|w|
/// ```
///
/// Scaling the penalty by the score keeps it meaningful both early, when
/// games are short, and late, when they last for thousands of lines.
#[must_use]
pub fn penalized_fitness(mean_lines: f64, l1_constant: f64, weights: &[f64]) -> f64 {
    let l1_norm: f64 = weights.iter().map(|w| w.abs()).sum();
    mean_lines - l1_constant * mean_lines * l1_norm
}
