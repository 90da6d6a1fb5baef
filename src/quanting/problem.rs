//! Construction of a beam scoring problem from stem and obstacle geometry.
//!
//! All vertical quantities are divided by the staff space here, once.
//! Horizontal positions are kept as given.

use std::collections::{BTreeMap, HashSet};

use log::warn;

use crate::error::{BeamError, QuantWarning, Result};
use crate::geometry::{BeamPositions, Direction, Interval, PerSide, Side};
use crate::model::{BeamInput, BeamSegment, CoveredObject};
use crate::params::QuantParameters;

use super::configuration::BeamConfiguration;

/// Largest staff radius accepted, in staff spaces.
const MAX_STAFF_RADIUS: f64 = 100.0;

/// Length limits of one stem, in staff spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StemInfo {
    pub dir: Direction,
    pub ideal_y: f64,
    pub shortest_y: f64,
}

/// An obstacle the beam should keep clear of.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    pub x: f64,
    /// Vertical extent of the obstacle
    pub y: Interval,
    /// Extent of the beam stack at `x`, relative to the beam's main line
    pub beam_y: Interval,
    pub base_penalty: f64,
}

/// One beam's optimisation instance.
#[derive(Debug, Clone)]
pub struct BeamScoringProblem {
    pub(super) params: QuantParameters,
    pub(super) unquanted_y: BeamPositions,
    pub(super) musical_dy: f64,

    pub(super) beam_thickness: f64,
    pub(super) line_thickness: f64,
    pub(super) beam_translation: f64,
    pub(super) staff_radius: f64,

    pub(super) x_span: Interval,
    pub(super) stem_xpositions: Vec<f64>,
    pub(super) stem_infos: Vec<StemInfo>,
    pub(super) base_lengths: Vec<f64>,

    pub(super) edge_dirs: PerSide<Direction>,
    pub(super) edge_beam_counts: PerSide<i32>,
    pub(super) quant_range: PerSide<Interval>,
    pub(super) collisions: Vec<Collision>,

    pub(super) is_xstaff: bool,
    pub(super) is_knee: bool,
    pub(super) warnings: Vec<QuantWarning>,
}

impl BeamScoringProblem {
    /// Build the problem for `input`, searching around `unquanted_y`
    /// (in staff spaces).
    pub fn new(
        input: &BeamInput,
        unquanted_y: BeamPositions,
        musical_dy: f64,
        params: QuantParameters,
    ) -> Result<Self> {
        validate_staff(input)?;
        let staff = &input.staff;
        let ss = staff.staff_space;

        let first = input.first_normal_stem().ok_or(BeamError::NoNormalStems)?;
        let last = input.last_normal_stem().ok_or(BeamError::NoNormalStems)?;
        let edge_stems = PerSide::new(first, last);
        let x_span = Interval::new(first.x, last.x);

        let mut stem_infos = Vec::new();
        let mut stem_xpositions = Vec::new();
        let mut base_lengths = Vec::new();
        let mut dirs_found = (false, false);
        for stem in input.normal_stems() {
            stem_infos.push(StemInfo {
                dir: stem.direction,
                ideal_y: stem.ideal_y / ss,
                shortest_y: stem.shortest_y / ss,
            });
            match stem.direction {
                Direction::Down => dirs_found.0 = true,
                Direction::Up => dirs_found.1 = true,
                Direction::Center => {}
            }
            base_lengths.push(stem.base_length / ss);
            stem_xpositions.push(stem.x);
        }

        let edge_dirs = PerSide::new(first.direction, last.direction);
        let edge_beam_counts = PerSide::new(
            input.stems.first().map_or(1, |s| s.multiplicity_span as i32 + 1),
            input.stems.last().map_or(1, |s| s.multiplicity_span as i32 + 1),
        );

        let beam_thickness = staff.beam_thickness / ss;
        let beam_translation = staff.beam_translation / ss;

        // The edge stems must reach past their note heads plus the beam
        // stack, which bounds each end from one side.
        let mut quant_range = PerSide::new(Interval::full(), Interval::full());
        for side in Side::BOTH {
            let ed = edge_dirs[side];
            if ed == Direction::Center {
                continue;
            }
            let mut heads = edge_stems[side].head_positions.scaled(0.5);
            heads.widen(
                0.5 + (edge_beam_counts[side] - 1) as f64 * beam_translation + beam_thickness * 0.5,
            );
            quant_range[side].set_at(ed.opposite(), heads.at(ed));
        }

        let mut problem = Self {
            params,
            unquanted_y,
            musical_dy,
            beam_thickness,
            line_thickness: staff.line_thickness / ss,
            beam_translation,
            staff_radius: staff.staff_radius,
            x_span,
            stem_xpositions,
            stem_infos,
            base_lengths,
            edge_dirs,
            edge_beam_counts,
            quant_range,
            collisions: Vec::new(),
            is_xstaff: input.cross_staff,
            is_knee: dirs_found.0 && dirs_found.1,
            warnings: Vec::new(),
        };
        problem.init_collisions(input);
        Ok(problem)
    }

    fn init_collisions(&mut self, input: &BeamInput) {
        if input.x_refpoint != input.segment_x_refpoint {
            let warning = QuantWarning::CommonRefpointMismatch {
                expected: input.x_refpoint,
                found: input.segment_x_refpoint,
            };
            warn!("{warning}");
            self.warnings.push(warning);
            return;
        }

        let mut segments = input.segments.clone();
        if segments.is_empty() {
            segments.push(BeamSegment { horizontal: self.x_span, vertical_count: 0 });
        }
        segments.sort_by(|a, b| a.horizontal.lo.total_cmp(&b.horizontal.lo));

        let ss = input.staff.staff_space;
        let beam_stems: HashSet<usize> = input.stems.iter().filter_map(|s| s.id).collect();
        let mut stems = BTreeMap::new();

        for object in relevant_covered(input, self.x_span) {
            let b = object.extent;
            let width_factor = (b.x.length() / ss).sqrt();
            for x in [b.x.lo, b.x.hi] {
                self.add_collision(&segments, x, b.y.scaled(1.0 / ss), width_factor);
            }

            if let Some(stem) = &object.note_head_stem {
                if stem.normal && !beam_stems.contains(&stem.id) {
                    stems.insert(stem.id, stem);
                }
            }
        }

        for stem in stems.values() {
            if stem.direction == Direction::Center {
                continue;
            }
            let mut y = Interval::full();
            y.set_at(stem.direction.opposite(), stem.chord_start_y / ss);
            let factor = if stem.beamed { self.params.stem_collision_factor } else { 1.0 };
            self.add_collision(&segments, stem.x, y, factor);
        }
    }

    fn add_collision(&mut self, segments: &[BeamSegment], x: f64, y: Interval, score_factor: f64) {
        let d = self.edge_dirs.left;
        if d == self.edge_dirs.right && d != Direction::Center && !y.is_empty() {
            // The stem length limits alone keep the beam clear of this one.
            let back = d.opposite();
            let left = self.quant_range.left.at(back);
            let right = self.quant_range.right.at(back);
            let quant_range_y = if self.x_span.delta() != 0.0 {
                left + (x - self.x_span.lo) * (right - left) / self.x_span.delta()
            } else {
                left
            };
            if d.sign() * (quant_range_y - y.at(d)) > 0.0 {
                return;
            }
        }

        let mut beam_y = Interval::empty();
        for segment in segments {
            if segment.horizontal.contains(x) {
                beam_y.add_point(segment.vertical_count as f64 * self.beam_translation);
            }
            if segment.horizontal.lo > x {
                break;
            }
        }
        beam_y.widen(0.5 * self.beam_thickness);

        self.collisions.push(Collision { x, y, beam_y, base_penalty: score_factor });
    }

    /// Beam height at `x` for the given configuration.
    pub fn y_at(&self, x: f64, config: &BeamConfiguration) -> f64 {
        let dx = self.x_span.delta();
        if dx == 0.0 {
            return config.y.left;
        }
        config.y.left + (x - self.x_span.lo) * config.y.delta() / dx
    }

    pub fn unquanted_y(&self) -> BeamPositions {
        self.unquanted_y
    }

    pub fn quant_range(&self) -> PerSide<Interval> {
        self.quant_range
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    pub fn stem_infos(&self) -> &[StemInfo] {
        &self.stem_infos
    }

    pub fn edge_dirs(&self) -> PerSide<Direction> {
        self.edge_dirs
    }

    pub fn edge_beam_counts(&self) -> PerSide<i32> {
        self.edge_beam_counts
    }

    pub fn x_span(&self) -> Interval {
        self.x_span
    }

    pub fn is_knee(&self) -> bool {
        self.is_knee
    }

    pub fn is_cross_staff(&self) -> bool {
        self.is_xstaff
    }

    pub fn params(&self) -> &QuantParameters {
        &self.params
    }

    /// Diagnostics raised while building the problem.
    pub fn warnings(&self) -> &[QuantWarning] {
        &self.warnings
    }
}

pub(crate) fn validate_staff(input: &BeamInput) -> Result<()> {
    let staff = &input.staff;
    if !(staff.staff_space.is_finite() && staff.staff_space > 0.0) {
        return Err(BeamError::InvalidStaffGeometry(format!(
            "staff space must be positive, got {}",
            staff.staff_space
        )));
    }
    if !(staff.staff_radius.is_finite()
        && (0.0..=MAX_STAFF_RADIUS).contains(&staff.staff_radius))
    {
        return Err(BeamError::InvalidStaffGeometry(format!(
            "staff radius must be between 0 and {MAX_STAFF_RADIUS}, got {}",
            staff.staff_radius
        )));
    }
    if staff.beam_thickness < 0.0 || staff.line_thickness < 0.0 {
        return Err(BeamError::InvalidStaffGeometry(
            "beam and line thickness must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// Covered objects that can interfere with the beam: non-empty, within the
/// beam's horizontal span, and not a beam on another staff.
pub(super) fn relevant_covered(
    input: &BeamInput,
    x_span: Interval,
) -> impl Iterator<Item = &CoveredObject> {
    input.covered.iter().filter(move |object| {
        !(object.is_beam && object.cross_staff)
            && !object.extent.is_empty()
            && !object.extent.x.intersection(x_span).is_empty()
    })
}
