//! Tactical features computed from the column height profile.
//!
//! Both features look for steps of exactly one cell between neighboring
//! columns, which is where a vertical S or Z fits without leaving a hole.

use dizzy_engine::BitBoard;

use crate::{
    board_feature::{BoardFeature, BoxedBoardFeature},
    placement_analysis::PlacementAnalysis,
};

/// 1 if a vertical S and a vertical Z could both still be placed hole-free.
///
/// That needs a step down (`h[i] - h[i+1] == 1`) and a step up
/// (`h[j] - h[j+1] == -1`) whose column pairs do not overlap.
#[derive(Debug, Clone)]
pub struct SafeSz;

impl BoardFeature for SafeSz {
    fn id(&self) -> &'static str {
        "safe_sz"
    }
    fn name(&self) -> &'static str {
        "Safe S/Z"
    }
    fn clone_boxed(&self) -> BoxedBoardFeature {
        Box::new(self.clone())
    }
    fn compute(&self, analysis: &PlacementAnalysis) -> f64 {
        let diffs = analysis.height_diffs();
        let positions = |step| {
            diffs
                .iter()
                .enumerate()
                .filter(move |&(_, diff)| *diff == step)
                .map(|(i, _)| i)
        };
        let safe = positions(1).any(|i| positions(-1).any(|j| i.abs_diff(j) >= 2));
        if safe { 1.0 } else { 0.0 }
    }
}

/// Number of S/Z fits that would leave a well at least 3 deep.
///
/// For a step down from `tall` to its neighbor, the trap column is on the
/// other side of `tall`. Filling the step raises `tall` by two, so if the trap
/// column is already lower than `tall` and the column beyond it reaches at
/// least two above `tall`, the trap column ends up at the bottom of a deep
/// well. The walls count as infinitely high.
#[derive(Debug, Clone)]
pub struct WellTraps;

impl BoardFeature for WellTraps {
    fn id(&self) -> &'static str {
        "well_traps"
    }
    fn name(&self) -> &'static str {
        "Well Traps"
    }
    fn clone_boxed(&self) -> BoxedBoardFeature {
        Box::new(self.clone())
    }
    fn compute(&self, analysis: &PlacementAnalysis) -> f64 {
        let heights = analysis.state().column_heights();
        let height = |col: Option<usize>| {
            col.filter(|&c| c < BitBoard::PLAYABLE_WIDTH)
                .map_or(i32::MAX, |c| i32::from(heights[c]))
        };

        let mut traps = 0;
        for (i, &diff) in analysis.height_diffs().iter().enumerate() {
            let (tall, trap, other) = match diff {
                1 => (i, i.checked_sub(1), i.checked_sub(2)),
                -1 => (i + 1, Some(i + 2), Some(i + 3)),
                _ => continue,
            };
            let Some(trap) = trap.filter(|&c| c < BitBoard::PLAYABLE_WIDTH) else {
                continue;
            };
            let tall = height(Some(tall));
            if height(Some(trap)) < tall && height(other) >= tall + 2 {
                traps += 1;
            }
        }
        f64::from(traps)
    }
}
