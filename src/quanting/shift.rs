//! Moves the unquantized beam to a starting point where quanting has a
//! chance of finding good quants: no stem shorter than its minimum, and
//! not buried inside a large obstacle.
//!
//! The beam's slope is kept; only its height changes. Heights are worked
//! out for the left end of the beam.

use log::{trace, warn};

use crate::error::QuantWarning;
use crate::geometry::{BeamPositions, Direction, Interval};
use crate::model::BeamInput;

use super::problem::relevant_covered;

/// Obstacles shorter than this (in staff spaces) are left to the quant
/// search; taller ones, such as notes with stems or clefs, block whole
/// regions of the staff.
const MIN_FORBIDDEN_HEIGHT: f64 = 2.0;

/// Step taken past the edge of a forbidden region, relative to the size of
/// the bound (never less than this in absolute terms).
const NUDGE_EPSILON: f64 = 1.0e-10;

/// Passes over the forbidden regions before giving up on a placement.
const MAX_NUDGE_PASSES: usize = 1000;

/// Distance from the finite bound when falling back to an arbitrary
/// feasible point.
const FALLBACK_DISTANCE: f64 = 2.0;

/// Result of shifting a beam into a workable region.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftedLine {
    pub positions: BeamPositions,
    pub warning: Option<QuantWarning>,
}

/// Shift `positions` (in staff spaces) so that quanting starts in a
/// feasible region.
pub fn shift_region_to_valid(input: &BeamInput, positions: BeamPositions) -> ShiftedLine {
    let unshifted = ShiftedLine { positions, warning: None };
    let (first, last) = match (input.first_normal_stem(), input.last_normal_stem()) {
        (Some(f), Some(l)) => (f, l),
        _ => return unshifted,
    };
    let ss = input.staff.staff_space;
    let x_span = Interval::new(first.x, last.x);

    let beam_dy = positions.delta();
    let mut beam_left_y = positions.left;
    let slope = if x_span.delta() != 0.0 { beam_dy / x_span.delta() } else { 0.0 };

    // Left-end heights at which every stem reaches its minimum length.
    let mut feasible_left_point = Interval::full();
    for stem in input.normal_stems() {
        if stem.direction == Direction::Center {
            continue;
        }
        let left_y = stem.shortest_y / ss - slope * (stem.x - x_span.lo);
        let mut flp = Interval::full();
        flp.set_at(stem.direction.opposite(), left_y);
        feasible_left_point.intersect(flp);
    }

    let mut forbidden_intervals = Vec::new();
    for object in relevant_covered(input, x_span) {
        let mut b = object.extent;
        b.y = b.y.scaled(1.0 / ss);

        if let Some(stem) = &object.note_head_stem {
            // Asking a beamed stem for its length would depend on that beam's
            // own position, so treat it as infinitely long.
            if stem.normal && stem.beamed && stem.direction != Direction::Center {
                let dir = stem.direction;
                b.y.set_at(dir, dir.sign() * f64::INFINITY);
            }
        }

        if b.y.length() < MIN_FORBIDDEN_HEIGHT {
            continue;
        }

        for x in [b.x.lo, b.x.hi] {
            let dy = slope * (x - x_span.lo);
            forbidden_intervals.push(Interval::new(b.y.lo - dy, b.y.hi - dy));
        }
    }
    forbidden_intervals.sort_by(|a, b| a.lo.total_cmp(&b.lo));

    // Push each bound of the placement out of every forbidden region it
    // lands in, repeating until nothing moves.
    let mut feasible_beam_placements = Interval::point(beam_left_y);
    let mut dirty = true;
    let mut passes = 0;
    while dirty {
        if passes == MAX_NUDGE_PASSES {
            let w = QuantWarning::NoViableInitialConfiguration;
            warn!("{w} (placement still moving after {MAX_NUDGE_PASSES} passes)");
            return ShiftedLine { positions, warning: Some(w) };
        }
        passes += 1;
        dirty = false;
        for forbidden in &forbidden_intervals {
            for d in [Direction::Down, Direction::Up] {
                let bound = forbidden.at(d);
                if bound == d.sign() * f64::INFINITY {
                    feasible_beam_placements.set_at(d, bound);
                } else if forbidden.contains(feasible_beam_placements.at(d)) {
                    feasible_beam_placements.set_at(d, nudged_past(bound, d));
                    trace!("beam start nudged {:?} to {}", d, feasible_beam_placements.at(d));
                    dirty = true;
                }
            }
        }
    }

    // A placement that violates the stem lengths can never be a candidate.
    for d in [Direction::Down, Direction::Up] {
        if !feasible_left_point.contains(feasible_beam_placements.at(d)) {
            feasible_beam_placements.set_at(d, d.sign() * f64::INFINITY);
        }
    }

    let mut warning = None;
    if feasible_beam_placements.hi == f64::INFINITY
        && feasible_beam_placements.lo == f64::NEG_INFINITY
        && !feasible_left_point.is_empty()
    {
        // Colliding either way, but the stem lengths can be satisfied.
        beam_left_y = point_in_interval(feasible_left_point, FALLBACK_DISTANCE);
    } else if !feasible_left_point.is_empty() {
        if (beam_left_y - feasible_beam_placements.lo).abs()
            > (beam_left_y - feasible_beam_placements.hi).abs()
        {
            beam_left_y = feasible_beam_placements.hi;
        } else {
            beam_left_y = feasible_beam_placements.lo;
        }
    } else {
        let w = QuantWarning::NoViableInitialConfiguration;
        warn!("{w}");
        warning = Some(w);
    }

    ShiftedLine {
        positions: BeamPositions::new(beam_left_y, beam_left_y + beam_dy),
        warning,
    }
}

/// A point just beyond `bound` in direction `dir`, far enough that adding
/// the step is not lost to rounding.
fn nudged_past(bound: f64, dir: Direction) -> f64 {
    bound + dir.sign() * bound.abs().max(1.0) * NUDGE_EPSILON
}

/// A reasonable point inside the non-empty interval `v`.
fn point_in_interval(v: Interval, dist: f64) -> f64 {
    if v.lo.is_infinite() {
        v.hi - dist
    } else if v.hi.is_infinite() {
        v.lo + dist
    } else {
        v.center()
    }
}
