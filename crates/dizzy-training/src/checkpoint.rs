//! JSON snapshot of the trainer state, written at iteration boundaries.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write as _},
    path::Path,
};

use dizzy_stats::descriptive::DescriptiveStats;
use serde::{Deserialize, Serialize};

use crate::{TrainingError, cross_entropy::BestRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerCheckpoint {
    /// Completed iterations.
    pub iteration: usize,
    pub means: Vec<f64>,
    pub variances: Vec<f64>,
    pub best_mean: Option<BestRecord>,
    pub best_single: Option<BestRecord>,
    #[serde(default)]
    pub last_elite_fitness: Option<DescriptiveStats>,
}

impl TrainerCheckpoint {
    pub fn load(path: &Path) -> Result<Self, TrainingError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Replaces `path` with this checkpoint.
    pub fn save(&self, path: &Path) -> Result<(), TrainingError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
