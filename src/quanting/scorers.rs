//! Demerit scorers. Each is a pure function of a configuration and the
//! problem, and returns a non-negative penalty.

use serde::{Deserialize, Serialize};

use crate::geometry::{Direction, Side};

use super::configuration::BeamConfiguration;
use super::problem::BeamScoringProblem;

pub const NUM_SCORERS: usize = 7;

/// Tuned against short grace stems: part of the forbidden-quant demerit
/// that does not depend on how deep the staff line sits in the gap.
const FORBIDDEN_FIXED_DEMERIT: f64 = 0.4;

/// The scorers, in the order they are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scorer {
    SlopeIdeal,
    SlopeDirection,
    SlopeMusical,
    Forbidden,
    StemLengths,
    Collisions,
    HorizontalInter,
}

impl Scorer {
    pub const ALL: [Scorer; NUM_SCORERS] = [
        Scorer::SlopeIdeal,
        Scorer::SlopeDirection,
        Scorer::SlopeMusical,
        Scorer::Forbidden,
        Scorer::StemLengths,
        Scorer::Collisions,
        Scorer::HorizontalInter,
    ];

    /// Short tag used in score cards.
    pub fn tag(self) -> &'static str {
        match self {
            Scorer::SlopeIdeal => "Si",
            Scorer::SlopeDirection => "Sd",
            Scorer::SlopeMusical => "Sm",
            Scorer::Forbidden => "F",
            Scorer::StemLengths => "L",
            Scorer::Collisions => "C",
            Scorer::HorizontalInter => "H",
        }
    }
}

/// `|x|`, weighted by `fac` when `x` is negative.
fn shrink_extra_weight(x: f64, fac: f64) -> f64 {
    let weight = if x < 0.0 { fac } else { 1.0 };
    x.abs() * weight
}

fn my_modf(x: f64) -> f64 {
    x - x.floor()
}

fn sign(x: f64) -> Direction {
    Direction::from_sign(x)
}

impl BeamScoringProblem {
    /// Run the next scorer on `config`.
    ///
    /// # Panics
    /// If every scorer has already run on `config`.
    pub fn one_scorer(&self, config: &mut BeamConfiguration) {
        let scorer = match config.next_scorer() {
            Some(scorer) => scorer,
            None => panic!(
                "scorer index {} run on a fully scored configuration",
                config.next_scorer_todo
            ),
        };
        let demerit = self.score(scorer, config);
        config.add(demerit);
    }

    /// The demerit `scorer` assigns to `config`.
    pub fn score(&self, scorer: Scorer, config: &BeamConfiguration) -> f64 {
        match scorer {
            Scorer::SlopeIdeal => self.score_slope_ideal(config),
            Scorer::SlopeDirection => self.score_slope_direction(config),
            Scorer::SlopeMusical => self.score_slope_musical(config),
            Scorer::Forbidden => self.score_forbidden_quants(config),
            Scorer::StemLengths => self.score_stem_lengths(config),
            Scorer::Collisions => self.score_collisions(config),
            Scorer::HorizontalInter => self.score_horizontal_inter_quants(config),
        }
    }

    // Deviation from the damped slope. Too flat costs more than too steep.
    fn score_slope_ideal(&self, config: &BeamConfiguration) -> f64 {
        let dy = config.y.delta();
        let damped_dy = self.unquanted_y.delta();

        // Cross-staff beams tend to use extreme slopes to get short stems.
        let mut slope_penalty = self.params.ideal_slope_factor;
        if self.is_xstaff {
            slope_penalty *= 10.0;
        }

        shrink_extra_weight(damped_dy.abs() - dy.abs(), 1.5) * slope_penalty
    }

    fn score_slope_direction(&self, config: &BeamConfiguration) -> f64 {
        let dy = config.y.delta();
        let damped_dy = self.unquanted_y.delta();

        if sign(damped_dy) == sign(dy) {
            return 0.0;
        }
        if dy == 0.0 && (damped_dy / self.x_span.delta()).abs() <= self.params.round_to_zero_slope {
            self.params.hint_direction_penalty
        } else {
            self.params.damping_direction_penalty
        }
    }

    // Going steeper than the melody.
    fn score_slope_musical(&self, config: &BeamConfiguration) -> f64 {
        let dy = config.y.delta();
        self.params.musical_direction_factor * (dy.abs() - self.musical_dy.abs()).max(0.0)
    }

    fn score_forbidden_quants(&self, config: &BeamConfiguration) -> f64 {
        let dy = config.y.delta();
        let counts = self.edge_beam_counts;
        let max_count = counts.left.max(counts.right);
        let extra_demerit = self.params.secondary_beam_demerit / max_count.max(1) as f64;
        let eps = self.params.beam_eps;
        let mut dem = 0.0;
        // Staff lines sit at -radius, -radius + 1, ... up to radius.
        let line_count = (2.0 * self.staff_radius + eps).floor().max(0.0) as u32;

        // Staff lines showing in the gaps between stacked beams.
        for side in Side::BOTH {
            let stem_dir = self.edge_dirs[side].sign();
            for j in 1..=counts[side] {
                let j = j as f64;
                // 2.2 rather than 2.0 leaves some leniency for borderline
                // quants like (2, sit).
                let gap1 = config.y[side]
                    - stem_dir
                        * ((j - 1.0) * self.beam_translation + self.beam_thickness / 2.0
                            - self.line_thickness / 2.2);
                let gap2 = config.y[side]
                    - stem_dir
                        * (j * self.beam_translation - self.beam_thickness / 2.0
                            + self.line_thickness / 2.2);
                let gap_lo = gap1.min(gap2);
                let gap_hi = gap1.max(gap2);
                let gap_length = gap_hi - gap_lo;

                for line in 0..=line_count {
                    let k = -self.staff_radius + line as f64;
                    if gap_lo <= k && k <= gap_hi && gap_length > 0.0 {
                        let dist = (gap_hi - k).abs().min((gap_lo - k).abs());
                        dem += extra_demerit
                            * (FORBIDDEN_FIXED_DEMERIT
                                + (1.0 - FORBIDDEN_FIXED_DEMERIT) * (dist / gap_length) * 2.0);
                    }
                }
            }
        }

        if max_count >= 2 {
            let straddle = 0.0;
            let sit = (self.beam_thickness - self.line_thickness) / 2.0;
            let inter = 0.5;
            let hang = 1.0 - sit;

            for side in Side::BOTH {
                let dir = self.edge_dirs[side];
                let y = config.y[side];

                if counts[side] >= 2
                    && (y - dir.sign() * self.beam_translation).abs() < self.staff_radius + inter
                {
                    if dir == Direction::Up && dy <= eps && (my_modf(y) - sit).abs() < eps {
                        dem += extra_demerit;
                    }
                    if dir == Direction::Down && dy >= eps && (my_modf(y) - hang).abs() < eps {
                        dem += extra_demerit;
                    }
                }

                if counts[side] >= 3
                    && (y - 2.0 * dir.sign() * self.beam_translation).abs()
                        < self.staff_radius + inter
                {
                    if dir == Direction::Up && dy <= eps && (my_modf(y) - straddle).abs() < eps {
                        dem += extra_demerit;
                    }
                    if dir == Direction::Down && dy >= eps && (my_modf(y) - straddle).abs() < eps {
                        dem += extra_demerit;
                    }
                }
            }
        }

        dem
    }

    fn score_stem_lengths(&self, config: &BeamConfiguration) -> f64 {
        let limit_penalty = self.params.stem_length_limit_penalty;
        let length_pen = self.params.stem_length_demerit_factor;
        // Indexed by stem direction: down, up.
        let mut score = [0.0_f64; 2];
        let mut count = [0_usize; 2];

        let dx = self.x_span.delta();
        for ((&x, info), base_length) in self
            .stem_xpositions
            .iter()
            .zip(&self.stem_infos)
            .zip(&self.base_lengths)
        {
            let beam_y = if dx != 0.0 {
                config.y.right * (x - self.x_span.lo) / dx
                    + config.y.left * (self.x_span.hi - x) / dx
            } else {
                (config.y.right + config.y.left) / 2.0
            };
            let current_y = beam_y + base_length;
            let d = info.dir.sign();
            let slot = usize::from(info.dir != Direction::Down);

            score[slot] += limit_penalty * (d * (info.shortest_y - current_y)).max(0.0);

            let ideal_diff = d * (current_y - info.ideal_y);
            let mut ideal_score = shrink_extra_weight(ideal_diff, 1.5);

            // Strictly convex, so a symmetric knee beam (up/down/up/down)
            // has its optimum in the middle.
            if self.is_knee {
                ideal_score = ideal_score.powf(1.1);
            }

            score[slot] += length_pen * ideal_score;
            count[slot] += 1;
        }

        // Per stem, to make the measure scale-free.
        score[0] / count[0].max(1) as f64 + score[1] / count[1].max(1) as f64
    }

    fn score_collisions(&self, config: &BeamConfiguration) -> f64 {
        let padding = self.params.collision_padding;
        let mut demerits = 0.0;

        for collision in &self.collisions {
            let beam_y = collision.beam_y.translated(self.y_at(collision.x, config));
            if beam_y.is_empty() {
                continue;
            }

            let dist = if !beam_y.intersection(collision.y).is_empty() {
                0.0
            } else {
                beam_y.distance(collision.y.lo).min(beam_y.distance(collision.y.hi))
            };

            let scale_free = if padding > 0.0 {
                (padding - dist).max(0.0) / padding
            } else if dist == 0.0 {
                1.0
            } else {
                0.0
            };
            demerits += collision.base_penalty * scale_free.powi(3) * self.params.collision_penalty;
        }

        demerits
    }

    // Staff lines next to a horizontal beam make it look like part of the
    // staff, so horizontal beams between two lines get their own penalty.
    fn score_horizontal_inter_quants(&self, config: &BeamConfiguration) -> f64 {
        if config.y.delta() == 0.0 && config.y.left.abs() < self.staff_radius {
            let yshift = config.y.left - 0.5;
            if ((yshift + 0.5).floor() - yshift).abs() < 0.01 {
                return self.params.horizontal_inter_quant;
            }
        }
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BeamPositions, BoundingBox, Interval, PerSide};
    use crate::model::{BeamInput, CoveredObject, StemInput};
    use crate::params::QuantParameters;

    fn problem_with(input: &BeamInput, unquanted: BeamPositions) -> BeamScoringProblem {
        BeamScoringProblem::new(input, unquanted, unquanted.delta(), QuantParameters::default())
            .unwrap()
    }

    fn up_pair() -> BeamInput {
        BeamInput::new(vec![
            StemInput::new(0.0, Direction::Up, 2.0, 1.0),
            StemInput::new(10.0, Direction::Up, 2.0, 1.0),
        ])
    }

    fn at(left: f64, right: f64) -> BeamConfiguration {
        BeamConfiguration::new_config(PerSide::new(0.0, 0.0), PerSide::new(left, right))
    }

    #[test]
    fn flatter_than_ideal_costs_more_than_steeper() {
        let problem = problem_with(&up_pair(), PerSide::new(2.0, 3.0));
        let flatter = problem.score(Scorer::SlopeIdeal, &at(2.0, 2.5));
        let steeper = problem.score(Scorer::SlopeIdeal, &at(2.0, 3.5));
        assert!((flatter - 5.0).abs() < 1e-9);
        assert!((steeper - 7.5).abs() < 1e-9);
    }

    #[test]
    fn cross_staff_slope_penalty_is_heavier() {
        let mut input = up_pair();
        input.cross_staff = true;
        let problem = problem_with(&input, PerSide::new(2.0, 3.0));
        assert!((problem.score(Scorer::SlopeIdeal, &at(2.0, 2.5)) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn sign_flip_is_worse_than_rounding_to_flat() {
        let problem = problem_with(&up_pair(), PerSide::new(2.0, 2.1));
        let params = QuantParameters::default();
        assert_eq!(problem.score(Scorer::SlopeDirection, &at(2.0, 1.5)), params.damping_direction_penalty);
        assert_eq!(problem.score(Scorer::SlopeDirection, &at(2.0, 2.0)), params.hint_direction_penalty);
        assert_eq!(problem.score(Scorer::SlopeDirection, &at(2.0, 2.5)), 0.0);
    }

    #[test]
    fn flattening_a_clear_slope_costs_the_full_penalty() {
        let problem = problem_with(&up_pair(), PerSide::new(2.0, 3.0));
        assert_eq!(
            problem.score(Scorer::SlopeDirection, &at(2.0, 2.0)),
            QuantParameters::default().damping_direction_penalty
        );
    }

    #[test]
    fn musical_slope_only_penalizes_excess() {
        let problem = problem_with(&up_pair(), PerSide::new(2.0, 3.0));
        assert_eq!(problem.score(Scorer::SlopeMusical, &at(2.0, 2.5)), 0.0);
        assert!((problem.score(Scorer::SlopeMusical, &at(2.0, 3.5)) - 200.0).abs() < 1e-9);
    }

    #[test]
    fn staff_line_inside_beam_gap_is_forbidden() {
        let mut input = up_pair();
        for stem in &mut input.stems {
            stem.multiplicity_span = 1;
        }
        let problem = problem_with(&input, PerSide::new(2.0, 2.0));
        // Gaps around the beams: [y - 0.555, y - 0.195] and [y - 1.305, y - 0.945].
        let in_gap = problem.score(Scorer::Forbidden, &at(1.5, 1.5));
        let clear = problem.score(Scorer::Forbidden, &at(0.81, 0.81));
        assert!(in_gap > 0.0);
        assert_eq!(clear, 0.0);
    }

    #[test]
    fn forbidden_quants_cover_every_line_of_a_wide_staff() {
        let mut input = up_pair();
        let narrow = problem_with(&input, PerSide::new(2.0, 2.0));
        input.staff.staff_radius = 50.0;
        let wide = problem_with(&input, PerSide::new(2.0, 2.0));
        // The single beam's gap, [39.94, 40.31], holds line 40 of the wide staff only.
        assert_eq!(narrow.score(Scorer::Forbidden, &at(40.5, 40.5)), 0.0);
        assert!(wide.score(Scorer::Forbidden, &at(40.5, 40.5)) > 0.0);
    }

    #[test]
    fn stem_lengths_punish_short_stems_hard() {
        let problem = problem_with(&up_pair(), PerSide::new(2.0, 2.0));
        let ideal = problem.score(Scorer::StemLengths, &at(2.0, 2.0));
        let long = problem.score(Scorer::StemLengths, &at(2.5, 2.5));
        let short = problem.score(Scorer::StemLengths, &at(0.5, 0.5));
        assert_eq!(ideal, 0.0);
        assert!((long - 2.5).abs() < 1e-9);
        // 5000 * 0.5 for the limit plus 5 * 1.5 * 1.5 for the deviation.
        assert!((short - 2511.25).abs() < 1e-9);
    }

    #[test]
    fn knee_stem_lengths_grow_faster_than_linear() {
        let mut knee = up_pair();
        knee.stems[1] = StemInput::new(10.0, Direction::Down, -2.0, -1.0);
        let problem = problem_with(&knee, PerSide::new(2.0, -2.0));
        assert!(problem.is_knee());

        let small = problem.score(Scorer::StemLengths, &at(3.0, -2.0));
        let large = problem.score(Scorer::StemLengths, &at(6.0, -2.0));
        // Non-knee scoring would give exactly 4x; the exponent makes it more.
        assert!(large > 4.0 * small);
    }

    #[test]
    fn collision_penalty_vanishes_beyond_padding() {
        let mut input = up_pair();
        input.covered.push(CoveredObject {
            extent: BoundingBox::new(Interval::new(3.0, 7.0), Interval::new(1.5, 2.5)),
            is_beam: false,
            cross_staff: false,
            note_head_stem: None,
        });
        let problem = problem_with(&input, PerSide::new(2.0, 2.0));
        let overlapping = problem.score(Scorer::Collisions, &at(2.0, 2.0));
        let close = problem.score(Scorer::Collisions, &at(3.0, 3.0));
        let clear = problem.score(Scorer::Collisions, &at(3.25, 3.25));
        // Two obstacle edges, each with weight 2 and full overlap.
        assert!((overlapping - 2000.0).abs() < 1e-9);
        assert!(close > 0.0 && close < overlapping);
        assert_eq!(clear, 0.0);
    }

    #[test]
    fn horizontal_beam_between_lines_is_penalized() {
        let problem = problem_with(&up_pair(), PerSide::new(1.5, 1.5));
        let params = QuantParameters::default();
        assert_eq!(problem.score(Scorer::HorizontalInter, &at(1.5, 1.5)), params.horizontal_inter_quant);
        assert_eq!(problem.score(Scorer::HorizontalInter, &at(1.0, 1.0)), 0.0);
        assert_eq!(problem.score(Scorer::HorizontalInter, &at(1.5, 2.0)), 0.0);
        assert_eq!(problem.score(Scorer::HorizontalInter, &at(2.5, 2.5)), 0.0);
    }

    #[test]
    fn one_scorer_accumulates_monotonically() {
        let problem = problem_with(&up_pair(), PerSide::new(2.0, 2.5));
        let mut config = at(0.5, 3.0);
        let mut last = config.demerits;
        while !config.done() {
            problem.one_scorer(&mut config);
            assert!(config.demerits >= last);
            last = config.demerits;
        }
        let sum: f64 = config.contributions.iter().sum();
        assert!((config.demerits - config.original_distance - sum).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "fully scored")]
    fn scoring_a_finished_configuration_panics() {
        let problem = problem_with(&up_pair(), PerSide::new(2.0, 2.0));
        let mut config = at(2.0, 2.0);
        for _ in 0..=NUM_SCORERS {
            problem.one_scorer(&mut config);
        }
    }
}
