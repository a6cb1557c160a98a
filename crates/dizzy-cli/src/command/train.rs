use std::{
    path::PathBuf,
    process,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::Context as _;
use dizzy_evaluator::{board_feature::all_board_features, strategy::Strategy};
use dizzy_training::{
    checkpoint::TrainerCheckpoint,
    cross_entropy::{CrossEntropyParams, CrossEntropyTrainer},
    training_log::TrainingLog,
};
use rand::SeedableRng as _;
use rand_pcg::Pcg32;

use crate::{model::strategy_model::StrategyModel, util};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Trainer parameters (JSON); missing fields take their defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Training log file, appended to
    #[arg(long, default_value = "training.log")]
    log: PathBuf,
    /// Checkpoint file written after every iteration
    #[arg(long)]
    checkpoint: Option<PathBuf>,
    /// Resume from the checkpoint file instead of starting over
    #[arg(long, requires = "checkpoint")]
    resume: bool,
    /// Strategy model to start from; the built-in baseline is used if omitted
    #[arg(long)]
    initial: Option<PathBuf>,
    /// Stop after this many iterations in total
    #[arg(long)]
    max_iterations: Option<usize>,
    #[arg(long)]
    population: Option<usize>,
    #[arg(long)]
    games_per_trial: Option<usize>,
    #[arg(long)]
    workers: Option<usize>,
    /// Seed of the candidate sampler; random if omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Where to save the best-average strategy model (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let params = load_params(arg)?;
    let features = all_board_features();

    let mut trainer = if arg.resume {
        let path = arg
            .checkpoint
            .as_deref()
            .context("--resume needs a checkpoint file")?;
        let checkpoint = TrainerCheckpoint::load(path)
            .with_context(|| format!("Failed to load checkpoint: {}", path.display()))?;
        log::info!(
            "resuming after iteration {} from {}",
            checkpoint.iteration,
            path.display()
        );
        CrossEntropyTrainer::from_checkpoint(params, features.clone(), checkpoint)?
    } else {
        let initial = match &arg.initial {
            Some(path) => StrategyModel::open(path)?.to_strategy(&features)?,
            None => Strategy::baseline(),
        };
        CrossEntropyTrainer::new(params, features.clone(), initial)?
    };

    let seed = arg.seed.unwrap_or_else(rand::random);
    log::info!("sampler seed: {seed}");
    let mut rng = Pcg32::seed_from_u64(seed);

    let mut log = TrainingLog::append(&arg.log)
        .with_context(|| format!("Failed to open training log: {}", arg.log.display()))?;
    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || request_stop(&handler_stop))
        .context("Failed to install the Ctrl-C handler")?;
    trainer.run(&mut rng, &mut log, arg.checkpoint.as_deref(), &stop)?;

    let Some(best) = trainer.best_mean() else {
        eprintln!("No iteration was run; no model saved");
        return Ok(());
    };
    let model = StrategyModel::new("cross-entropy", best.lines, &features, &best.strategy);
    util::save_json(&model, arg.output.as_deref())?;

    eprintln!();
    eprintln!("Model saved successfully");
    if let Some(path) = &arg.output {
        eprintln!("  Path: {}", path.display());
    }
    eprintln!("  Iterations: {}", trainer.iteration());
    eprintln!("  Mean lines: {:.0}", model.mean_lines);
    if let Some(single) = trainer.best_single() {
        eprintln!("  Best single: {:.0} : [{}]", single.lines, single.strategy);
    }

    Ok(())
}

// The first request lets the current iteration finish; a second one exits at once.
fn request_stop(stop: &AtomicBool) {
    if stop.swap(true, Ordering::Relaxed) {
        process::exit(130);
    }
    log::warn!("stop requested; finishing the current iteration (press Ctrl-C again to abort)");
}

fn load_params(arg: &TrainArg) -> anyhow::Result<CrossEntropyParams> {
    let mut params: CrossEntropyParams = match &arg.config {
        Some(path) => util::read_json_file("trainer config", path)?,
        None => CrossEntropyParams::default(),
    };
    if let Some(max_iterations) = arg.max_iterations {
        params.max_iterations = Some(max_iterations);
    }
    if let Some(population) = arg.population {
        params.population = population;
    }
    if let Some(games) = arg.games_per_trial {
        params.games_per_trial = games;
    }
    if let Some(workers) = arg.workers {
        params.workers = Some(workers);
    }
    params.validate()?;
    Ok(params)
}
