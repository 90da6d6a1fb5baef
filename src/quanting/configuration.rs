//! A candidate pair of quantized beam positions and its running score.

use crate::geometry::BeamPositions;

use super::scorers::{Scorer, NUM_SCORERS};

/// Scale of the distance-from-seed score given to new candidates, small
/// enough to only break ties between otherwise equal configurations.
const ORIGINAL_DISTANCE_SCALE: f64 = 1.0 / 1000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BeamConfiguration {
    /// Left and right positions, in staff spaces
    pub y: BeamPositions,
    /// Accumulated demerits; never decreases
    pub demerits: f64,
    /// Index of the next scorer to run
    pub next_scorer_todo: usize,
    /// Contribution of each scorer that has run so far
    pub contributions: [f64; NUM_SCORERS],
    /// Initial distance-from-seed score
    pub original_distance: f64,
}

impl BeamConfiguration {
    /// A candidate at `trunc(start) + offset` on each side. Its initial score
    /// orders the search so that candidates close to the seed come first.
    pub fn new_config(start: BeamPositions, offset: BeamPositions) -> Self {
        let y = BeamPositions::new(
            start.left.trunc() + offset.left,
            start.right.trunc() + offset.right,
        );
        let original_distance = (offset.left.abs() + offset.right.abs()) * ORIGINAL_DISTANCE_SCALE;
        Self {
            y,
            demerits: original_distance,
            next_scorer_todo: 0,
            contributions: [0.0; NUM_SCORERS],
            original_distance,
        }
    }

    /// True once every scorer has run.
    pub fn done(&self) -> bool {
        self.next_scorer_todo >= NUM_SCORERS
    }

    /// The scorer that runs next, if any.
    pub fn next_scorer(&self) -> Option<Scorer> {
        Scorer::ALL.get(self.next_scorer_todo).copied()
    }

    /// Record the demerit of the scorer that just ran and move on to the next.
    pub(super) fn add(&mut self, demerit: f64) {
        debug_assert!(demerit >= 0.0, "negative demerit {demerit}");
        self.demerits += demerit;
        self.contributions[self.next_scorer_todo] += demerit;
        self.next_scorer_todo += 1;
    }
}
