use std::{
    io::{self, Write as _},
    path::PathBuf,
    time::Instant,
};

use anyhow::Context as _;
use dizzy_engine::RandomPieceSource;
use dizzy_evaluator::{
    board_feature::all_board_features, game_simulator::GameSimulator,
    placement_evaluator::FeatureBasedPlacementEvaluator, strategy::Strategy,
    turn_evaluator::TurnEvaluator,
};

use crate::model::strategy_model::StrategyModel;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    /// Strategy model file (JSON); the built-in baseline is used if omitted
    #[arg(long)]
    model: Option<PathBuf>,
    /// Seed of the first game; game `i` uses `seed + i`
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Stop each game after this many pieces
    #[arg(long)]
    max_pieces: Option<usize>,
    /// Number of games to play
    #[arg(long, default_value_t = 1)]
    games: u64,
    /// Print one JSON snapshot per step to stdout
    #[arg(long)]
    trace: bool,
}

pub(crate) fn run(arg: &PlayArg) -> anyhow::Result<()> {
    let PlayArg {
        model,
        seed,
        max_pieces,
        games,
        trace,
    } = arg;

    let features = all_board_features();
    let strategy = match model {
        Some(path) => StrategyModel::open(path)?.to_strategy(&features)?,
        None => Strategy::baseline(),
    };
    log::info!("strategy: [{strategy}]");
    let evaluator = FeatureBasedPlacementEvaluator::new(features, strategy)?;

    let mut stdout = io::stdout().lock();
    for game in 0..*games {
        let game_seed = seed.wrapping_add(game);
        let turn_evaluator = TurnEvaluator::new(Box::new(&evaluator));
        let source = RandomPieceSource::with_seed(game_seed);
        let mut simulator = GameSimulator::new(turn_evaluator, source, *max_pieces);

        let started = Instant::now();
        let outcome = if *trace {
            loop {
                let phase = simulator.step();
                serde_json::to_writer(&mut stdout, &simulator.snapshot())
                    .context("Failed to write game snapshot")?;
                writeln!(stdout).context("Failed to write game snapshot")?;
                if phase.is_game_over() {
                    break simulator.outcome();
                }
            }
        } else {
            simulator.run()
        };
        let elapsed = started.elapsed().as_secs_f64();

        #[expect(clippy::cast_precision_loss)]
        let pieces_per_second = if elapsed > 0.0 {
            outcome.pieces as f64 / elapsed
        } else {
            0.0
        };
        eprintln!(
            "Game {game} (seed {game_seed}): {} pieces, {} lines{}, {pieces_per_second:.0} pieces/s",
            outcome.pieces,
            outcome.lines,
            if outcome.capped { " (capped)" } else { "" },
        );
    }

    Ok(())
}
