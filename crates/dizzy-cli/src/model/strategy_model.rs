use std::{collections::BTreeMap, path::Path};

use chrono::{DateTime, Utc};
use dizzy_evaluator::{board_feature::BoxedBoardFeature, strategy::Strategy};
use serde::{Deserialize, Serialize};

use crate::util;

/// Trained strategy weights keyed by feature id.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyModel {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    /// Mean cleared lines the strategy was scored with.
    pub mean_lines: f64,
    pub weights: BTreeMap<String, f64>,
}

impl StrategyModel {
    pub fn new(
        name: impl Into<String>,
        mean_lines: f64,
        features: &[BoxedBoardFeature],
        strategy: &Strategy,
    ) -> Self {
        Self {
            name: name.into(),
            trained_at: Utc::now(),
            mean_lines,
            weights: features
                .iter()
                .zip(strategy.weights())
                .map(|(f, w)| (f.id().to_owned(), *w))
                .collect(),
        }
    }

    pub fn open<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        util::read_json_file("strategy model", path)
    }

    /// Orders the weights like `features`.
    ///
    /// Every feature needs a weight and every weight a feature.
    pub fn to_strategy(&self, features: &[BoxedBoardFeature]) -> anyhow::Result<Strategy> {
        if let Some(unknown) = self
            .weights
            .keys()
            .find(|id| !features.iter().any(|f| f.id() == id.as_str()))
        {
            anyhow::bail!("Feature ID {unknown} in model not found");
        }
        let weights = features
            .iter()
            .map(|feature| {
                self.weights.get(feature.id()).copied().ok_or_else(|| {
                    anyhow::anyhow!("Model has no weight for feature {}", feature.id())
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Strategy::new(weights))
    }
}
