//! Game state right after a candidate placement is locked.
//!
//! Features only look at the locked state: the merged board with full rows
//! removed, its column heights, summit and counters.
//! Derived surface values are computed lazily, since the tactical features are
//! the only ones that need them.

use std::cell::OnceCell;

use dizzy_engine::{BitBoard, GameState, Placement};

pub type HeightDiffs = [i32; BitBoard::PLAYABLE_WIDTH - 1];

#[derive(Debug)]
pub struct PlacementAnalysis {
    placement: Placement,
    state: GameState,
    height_diffs: OnceCell<HeightDiffs>,
}

impl PlacementAnalysis {
    #[must_use]
    pub fn from_state(before_placement: &GameState, placement: Placement) -> Self {
        Self {
            placement,
            state: before_placement.lock(placement),
            height_diffs: OnceCell::new(),
        }
    }

    /// Wraps a state whose current placement is already locked.
    #[must_use]
    pub fn from_locked(state: GameState) -> Self {
        Self {
            placement: state.placement(),
            state,
            height_diffs: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// State after locking the placement.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn into_state(self) -> GameState {
        self.state
    }

    /// `h[i] - h[i + 1]` for each pair of neighboring columns.
    #[must_use]
    pub fn height_diffs(&self) -> &HeightDiffs {
        self.height_diffs.get_or_init(|| {
            let heights = self.state.column_heights();
            let mut diffs = [0; BitBoard::PLAYABLE_WIDTH - 1];
            for (diff, pair) in diffs.iter_mut().zip(heights.windows(2)) {
                *diff = i32::from(pair[0]) - i32::from(pair[1]);
            }
            diffs
        })
    }
}
