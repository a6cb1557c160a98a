//! Feature weight vectors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One weight per board feature, in canonical feature order.
///
/// A strategy is immutable for the duration of a game. Its length is only
/// checked against a feature list when an evaluator is built from both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Strategy {
    weights: Vec<f64>,
}

impl Strategy {
    /// Hand-tuned starting point for training.
    pub const BASELINE_WEIGHTS: [f64; 9] = [-4.0, -1.0, -1.0, -10.0, -0.25, -5.0, -0.1, 1.5, -1.0];

    #[must_use]
    pub fn new(weights: Vec<f64>) -> Self {
        Self { weights }
    }

    #[must_use]
    pub fn baseline() -> Self {
        Self::new(Self::BASELINE_WEIGHTS.to_vec())
    }

    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    #[must_use]
    pub fn into_weights(self) -> Vec<f64> {
        self.weights
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Sum of absolute weights.
    #[must_use]
    pub fn l1_norm(&self) -> f64 {
        self.weights.iter().map(|w| w.abs()).sum()
    }
}

impl From<Vec<f64>> for Strategy {
    fn from(weights: Vec<f64>) -> Self {
        Self::new(weights)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, weight) in self.weights.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{weight:6.2}")?;
        }
        Ok(())
    }
}
