//! Board features measured on the locked state of a candidate placement.
//!
//! Features come in two groups:
//!
//! **Structure features** ([`structure`]) - computed row by row on the bit board:
//! - [`structure::WeightedRows`] - Generalized landing height and line clears
//! - [`structure::RowTransitions`] - Horizontal filled/empty boundaries
//! - [`structure::ColumnTransitions`] - Vertical filled/empty boundaries
//! - [`structure::RowsWithHoles`] - Rows holding at least one covered empty cell
//! - [`structure::TwoDeepWells`] - Wells with at least one empty cell beneath
//! - [`structure::ThreeDeepWells`] - Wells with at least two empty cells beneath
//! - [`structure::HoleQuota`] - Empty cells that must be filled to uncover holes
//!
//! **Tactical features** ([`tactical`]) - computed from column height differences:
//! - [`tactical::SafeSz`] - Whether a vertical S and Z could both be placed hole-free
//! - [`tactical::WellTraps`] - S/Z fits that would dig a well at least 3 deep
//!
//! Feature values are raw measurements; sign and scale are left to the
//! strategy weights.

use std::fmt;

use crate::placement_analysis::PlacementAnalysis;

pub mod structure;
pub mod tactical;

/// Features in canonical strategy order.
#[must_use]
pub fn all_board_features() -> Vec<BoxedBoardFeature> {
    vec![
        Box::new(structure::WeightedRows),
        Box::new(structure::RowTransitions),
        Box::new(structure::ColumnTransitions),
        Box::new(structure::RowsWithHoles),
        Box::new(structure::TwoDeepWells),
        Box::new(structure::ThreeDeepWells),
        Box::new(structure::HoleQuota),
        Box::new(tactical::SafeSz),
        Box::new(tactical::WellTraps),
    ]
}

pub trait BoardFeature: fmt::Debug + Send + Sync {
    #[must_use]
    fn id(&self) -> &str;
    #[must_use]
    fn name(&self) -> &str;
    #[must_use]
    fn clone_boxed(&self) -> BoxedBoardFeature;
    #[must_use]
    fn compute(&self, analysis: &PlacementAnalysis) -> f64;
}

pub type BoxedBoardFeature = Box<dyn BoardFeature>;

impl Clone for BoxedBoardFeature {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

impl BoardFeature for BoxedBoardFeature {
    fn id(&self) -> &str {
        self.as_ref().id()
    }

    fn name(&self) -> &str {
        self.as_ref().name()
    }

    fn clone_boxed(&self) -> BoxedBoardFeature {
        self.as_ref().clone_boxed()
    }

    fn compute(&self, analysis: &PlacementAnalysis) -> f64 {
        self.as_ref().compute(analysis)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_feature_ids_are_unique() {
        let features = all_board_features();
        assert_eq!(features.len(), 9);
        let ids: HashSet<_> = features.iter().map(|f| f.id().to_owned()).collect();
        assert_eq!(ids.len(), features.len());
    }

    #[test]
    fn test_boxed_clone_keeps_identity() {
        for feature in all_board_features() {
            let cloned = feature.clone();
            assert_eq!(cloned.id(), feature.id());
            assert_eq!(cloned.name(), feature.name());
        }
    }
}
