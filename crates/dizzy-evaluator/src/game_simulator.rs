//! Headless games driven by a [`TurnEvaluator`].
//!
//! A game alternates between two phases until it ends:
//!
//! ```text
//! Spawned --select best placement--> Placed --lock, draw next piece--> Spawned
//!    |                                  |
//!    +--- spawn blocked or no safe -----+--- piece cap reached ---> GameOver
//!         placement
//! ```
//!
//! The simulator owns its state and piece source, so games never share
//! anything and identical seeds and strategies replay identically.

use dizzy_engine::{BitBoard, ColumnHeights, GameState, PieceSource, Placement};
use serde::Serialize;

use crate::turn_evaluator::TurnEvaluator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::IsVariant)]
pub enum GamePhase {
    /// A new piece sits at its spawn position.
    Spawned,
    /// The best placement is chosen and waits to be locked.
    Placed,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameOutcome {
    pub pieces: usize,
    pub lines: usize,
    /// The game was stopped by the piece cap rather than by topping out.
    pub capped: bool,
}

/// Read-only view of a game between two steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSnapshot {
    pub phase: GamePhase,
    pub board: BitBoard,
    pub placement: Placement,
    pub column_heights: ColumnHeights,
    pub summit: usize,
    pub lines: usize,
    pub total_lines: usize,
    pub total_pieces: usize,
}

#[derive(Debug)]
enum Phase {
    Spawned,
    // Holds the state after locking the chosen placement.
    Placed(GameState),
    GameOver,
}

#[derive(Debug)]
pub struct GameSimulator<'a, S> {
    turn_evaluator: TurnEvaluator<'a>,
    source: S,
    max_pieces: Option<usize>,
    state: GameState,
    phase: Phase,
    capped: bool,
}

impl<'a, S> GameSimulator<'a, S>
where
    S: PieceSource,
{
    /// Starts a game on an empty board with the first piece of `source`.
    ///
    /// The game ends after `max_pieces` locks even if it could continue.
    pub fn new(
        turn_evaluator: TurnEvaluator<'a>,
        mut source: S,
        max_pieces: Option<usize>,
    ) -> Self {
        let state = GameState::new(source.next_piece());
        Self::with_state(turn_evaluator, source, state, max_pieces)
    }

    /// Starts a game from `state`, whose current placement is taken as the
    /// freshly spawned piece.
    pub fn with_state(
        turn_evaluator: TurnEvaluator<'a>,
        source: S,
        state: GameState,
        max_pieces: Option<usize>,
    ) -> Self {
        Self {
            turn_evaluator,
            source,
            max_pieces,
            state,
            phase: Phase::Spawned,
            capped: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> GamePhase {
        match self.phase {
            Phase::Spawned => GamePhase::Spawned,
            Phase::Placed(_) => GamePhase::Placed,
            Phase::GameOver => GamePhase::GameOver,
        }
    }

    /// Advances the game by one phase transition and returns the new phase.
    ///
    /// Stepping a finished game does nothing.
    pub fn step(&mut self) -> GamePhase {
        self.phase = match std::mem::replace(&mut self.phase, Phase::GameOver) {
            Phase::Spawned => self.place(),
            Phase::Placed(locked) => self.lock_and_spawn(locked),
            Phase::GameOver => Phase::GameOver,
        };
        self.phase()
    }

    fn place(&mut self) -> Phase {
        if self.state.board().is_colliding(self.state.placement()) {
            return Phase::GameOver;
        }
        let Some(analysis) = self.turn_evaluator.select_best_placement(&self.state) else {
            return Phase::GameOver;
        };
        self.state = self.state.with_placement(analysis.placement());
        Phase::Placed(analysis.into_state())
    }

    fn lock_and_spawn(&mut self, locked: GameState) -> Phase {
        self.state = locked;
        if let Some(max_pieces) = self.max_pieces
            && locked.total_pieces() >= max_pieces
        {
            log::warn!(
                "game stopped at the piece cap ({max_pieces} pieces, {} lines)",
                locked.total_lines()
            );
            self.capped = true;
            return Phase::GameOver;
        }
        let next = self.source.next_piece();
        self.state = locked.with_placement(Placement::spawn(next));
        Phase::Spawned
    }

    /// Plays until the game is over.
    pub fn run(&mut self) -> GameOutcome {
        while !self.step().is_game_over() {}
        self.outcome()
    }

    #[must_use]
    pub fn outcome(&self) -> GameOutcome {
        GameOutcome {
            pieces: self.state.total_pieces(),
            lines: self.state.total_lines(),
            capped: self.capped,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        let state = &self.state;
        GameSnapshot {
            phase: self.phase(),
            board: *state.board(),
            placement: state.placement(),
            column_heights: *state.column_heights(),
            summit: state.summit(),
            lines: state.lines(),
            total_lines: state.total_lines(),
            total_pieces: state.total_pieces(),
        }
    }
}
