//! Beam quanting: choosing the final left and right beam positions.
//!
//! A [`BeamScoringProblem`] is built from the beam's stems and the objects
//! it passes over. Candidates are generated on a grid of canonical
//! positions relative to the staff lines, and the best-first solver scores
//! them lazily until the cheapest fully scored candidate is known.
//!
//! All vertical quantities inside this module are in staff spaces.

mod candidates;
mod configuration;
mod problem;
mod scorers;
mod shift;
mod solver;

pub use candidates::BaseQuants;
pub use configuration::BeamConfiguration;
pub use problem::{BeamScoringProblem, Collision, StemInfo};
pub(crate) use problem::validate_staff;
pub use scorers::{Scorer, NUM_SCORERS};
pub use shift::{shift_region_to_valid, ShiftedLine};
pub use solver::{ScoreCard, ScoreEntry, Solution, SolveStats};
