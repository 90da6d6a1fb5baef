//! Lazy best-first search over the quant candidates.
//!
//! Candidates sit in a min-queue keyed on their demerits so far. The
//! cheapest one is popped and scored by one more scorer, then pushed back.
//! Scorers only ever add, so a fully scored candidate that reaches the top
//! of the queue cannot be beaten by anything still in it.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use log::{debug, warn};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::QuantWarning;
use crate::geometry::BeamPositions;
use crate::params::SolveOptions;

use super::configuration::BeamConfiguration;
use super::problem::BeamScoringProblem;
use super::scorers::Scorer;

/// Inspected positions farther than this from every candidate are reported.
const INSPECT_MAX_DISTANCE: f64 = 1e5;

/// Work done by one solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveStats {
    /// Candidates that survived the quant range filter
    pub candidates: usize,
    /// Individual scorer runs
    pub scorer_calls: usize,
    /// Candidates that were fully scored
    pub completed: usize,
}

/// Demerit one scorer gave the chosen configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub scorer: Scorer,
    pub demerit: f64,
}

/// Breakdown of the chosen configuration's demerits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub entries: Vec<ScoreEntry>,
    /// Distance-from-seed score the candidate started with
    pub original_distance: f64,
    pub total: f64,
    pub completed: usize,
    pub candidates: usize,
}

impl fmt::Display for ScoreCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in self.entries.iter().filter(|e| e.demerit != 0.0) {
            write!(f, "{} {:.2} ", entry.scorer.tag(), entry.demerit)?;
        }
        write!(f, "c{}/{}", self.completed, self.candidates)
    }
}

/// The chosen beam positions and how they were found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Left and right positions, in staff spaces
    pub positions: BeamPositions,
    /// Total demerits of the chosen quants; `None` for the unquantized fallback
    pub demerits: Option<f64>,
    pub warnings: Vec<QuantWarning>,
    pub stats: SolveStats,
    /// Present when debugging was requested
    pub score_card: Option<ScoreCard>,
}

impl BeamScoringProblem {
    /// Pick the quantized positions with the fewest demerits.
    pub fn solve(&self, options: &SolveOptions) -> Solution {
        let mut configs = self.generate_quants();
        let mut warnings = self.warnings.clone();
        let mut stats = SolveStats { candidates: configs.len(), ..SolveStats::default() };

        let best = match options.inspect_quants {
            Some(target) => self.force_score(target, &mut configs, &mut stats, &mut warnings),
            None => self.best_first(&mut configs, &mut stats),
        };
        let best = match best {
            Some(idx) => idx,
            None => {
                let warning = QuantWarning::NoViableQuant;
                warn!("{warning}");
                warnings.push(warning);
                return Solution {
                    positions: self.unquanted_y,
                    demerits: None,
                    warnings,
                    stats,
                    score_card: None,
                };
            }
        };

        stats.completed = configs.iter().filter(|c| c.done()).count();
        let chosen = &configs[best];
        debug!(
            "beam quanting: {} candidates, {} scorer calls, {} fully scored",
            stats.candidates, stats.scorer_calls, stats.completed
        );

        let score_card = if options.debug {
            let card = ScoreCard {
                entries: Scorer::ALL
                    .iter()
                    .zip(chosen.contributions)
                    .map(|(&scorer, demerit)| ScoreEntry { scorer, demerit })
                    .collect(),
                original_distance: chosen.original_distance,
                total: chosen.demerits,
                completed: stats.completed,
                candidates: stats.candidates,
            };
            debug!("beam score card: {card}");
            Some(card)
        } else {
            None
        };

        Solution {
            positions: chosen.y,
            demerits: Some(chosen.demerits),
            warnings,
            stats,
            score_card,
        }
    }

    /// Run every remaining scorer on `config`.
    pub fn score_fully(&self, config: &mut BeamConfiguration) {
        while !config.done() {
            self.one_scorer(config);
        }
    }

    fn best_first(&self, configs: &mut [BeamConfiguration], stats: &mut SolveStats) -> Option<usize> {
        // Ties go to the earlier candidate.
        let mut queue: BinaryHeap<Reverse<(OrderedFloat<f64>, usize)>> = configs
            .iter()
            .enumerate()
            .map(|(idx, c)| Reverse((OrderedFloat(c.demerits), idx)))
            .collect();

        while let Some(Reverse((_, idx))) = queue.pop() {
            let config = &mut configs[idx];
            if config.done() {
                return Some(idx);
            }
            self.one_scorer(config);
            stats.scorer_calls += 1;
            queue.push(Reverse((OrderedFloat(config.demerits), idx)));
        }
        None
    }

    // Diagnostics: fully score the candidate nearest to `target`, skipping the search.
    fn force_score(
        &self,
        target: BeamPositions,
        configs: &mut [BeamConfiguration],
        stats: &mut SolveStats,
        warnings: &mut Vec<QuantWarning>,
    ) -> Option<usize> {
        let (idx, distance) = configs
            .iter()
            .enumerate()
            .map(|(idx, c)| (idx, (c.y.left - target.left).abs() + (c.y.right - target.right).abs()))
            .min_by(|a, b| a.1.total_cmp(&b.1))?;

        if distance > INSPECT_MAX_DISTANCE {
            let warning = QuantWarning::InspectQuantNotFound { distance };
            warn!("{warning}");
            warnings.push(warning);
        }

        let config = &mut configs[idx];
        while !config.done() {
            self.one_scorer(config);
            stats.scorer_calls += 1;
        }
        Some(idx)
    }
}
