//! First approximation of a beam: the unquantized line that quanting
//! starts from, and the slope implied by the melody.
//!
//! The chain is least-squares fit, then slope damping. Positions come out
//! in staff spaces; stem x positions are used as given.

use serde::{Deserialize, Serialize};

use crate::geometry::{BeamPositions, Direction, Interval, PerSide};
use crate::model::{BeamInput, StaffGeometry};

/// Concaveness at or above which a beam is forced horizontal.
const HORIZONTAL_CONCAVENESS: f64 = 10000.0;

/// The unquantized beam and the musical slope hint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdealLine {
    pub positions: BeamPositions,
    /// Rise implied by the melodic contour, in staff spaces
    pub musical_dy: f64,
}

/// Least-squares fit followed by slope damping.
pub fn ideal_line(input: &BeamInput) -> IdealLine {
    let mut line = least_squares_positions(input);
    slope_damping(&mut line, input);
    line
}

/// Fit a line through the ideal stem ends of the normal stems.
///
/// A beam without normal stems is placed by [`no_visible_stem_positions`].
/// [`quant_beam`](crate::quant_beam) rejects such beams before getting here,
/// so that case only arises when this function is called directly.
pub fn least_squares_positions(input: &BeamInput) -> IdealLine {
    let ss = input.staff.staff_space;
    let normal: Vec<_> = input.normal_stems().collect();
    let (first, last) = match (normal.first(), normal.last()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => {
            let y = no_visible_stem_positions(input, Interval::point(0.0));
            return IdealLine {
                positions: PerSide::new(y.lo, y.hi),
                musical_dy: 0.0,
            };
        }
    };

    let ideal = PerSide::new(first.ideal_y / ss, last.ideal_y / ss);

    if ideal.delta() == 0.0 {
        // Both ends want the same height. A two-note beam on the middle
        // line still gets a slight slope following the note heads.
        let chord = Interval::new(first.chord_start_y, last.chord_start_y);
        let positions = if ideal.left == 0.0 && chord.delta() != 0.0 && normal.len() == 2 {
            let half = input.staff.beam_thickness / ss / 2.0;
            if chord.delta() > 0.0 {
                PerSide::new(-half, half)
            } else {
                PerSide::new(half, -half)
            }
        } else {
            ideal
        };
        return IdealLine { positions, musical_dy: positions.delta() };
    }

    let x0 = first.x;
    let points: Vec<(f64, f64)> = normal.iter().map(|s| (s.x - x0, s.ideal_y / ss)).collect();
    let (slope, y) = minimise_least_squares(&points);

    let dx = last.x - x0;
    let dy = set_minimum_dy(&input.staff, slope * dx);

    IdealLine {
        positions: PerSide::new(y, y + dy),
        musical_dy: dy,
    }
}

/// Ordinary least squares: returns `(slope, intercept)`.
fn minimise_least_squares(points: &[(f64, f64)]) -> (f64, f64) {
    let n = points.len() as f64;
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let (mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0);
    for &(x, y) in points {
        sx += x;
        sy += y;
        sxx += x * x;
        sxy += x * y;
    }
    let denom = n * sxx - sx * sx;
    if denom.abs() < f64::EPSILON {
        return (0.0, sy / n);
    }
    let slope = (n * sxy - sx * sy) / denom;
    (slope, (sy - slope * sx) / n)
}

/// Raise a non-zero rise to at least the smallest quant step, so that the
/// slope-direction demerits are not triggered by rounding noise.
pub fn set_minimum_dy(staff: &StaffGeometry, dy: f64) -> f64 {
    if dy == 0.0 {
        return dy;
    }
    let ss = staff.staff_space;
    let sit = (staff.beam_thickness - staff.line_thickness) / ss / 2.0;
    let inter = 0.5;
    let hang = 1.0 - sit;
    dy.signum() * dy.abs().max(sit.min(inter).min(hang))
}

/// Damp the slope with `0.6 * tanh(slope) / (damping + concaveness)`,
/// splitting the change evenly over both ends.
pub fn slope_damping(line: &mut IdealLine, input: &BeamInput) {
    if input.normal_stems().count() <= 1 {
        return;
    }
    let mut damping = input.damping;
    let concaveness = input.concaveness;
    if concaveness >= HORIZONTAL_CONCAVENESS {
        line.positions.left = line.positions.right;
        line.musical_dy = 0.0;
        damping = 0.0;
    }
    if damping == 0.0 {
        return;
    }

    let ss = input.staff.staff_space;
    let dx = match (input.first_normal_stem(), input.last_normal_stem()) {
        (Some(f), Some(l)) => l.x - f.x,
        _ => 0.0,
    };
    let dy = line.positions.delta();
    let slope = if dy != 0.0 && dx != 0.0 { dy * ss / dx } else { 0.0 };
    let slope = 0.6 * slope.tanh() / (damping + concaveness);

    let damped_dy = set_minimum_dy(&input.staff, slope * dx / ss);
    line.positions.left += (dy - damped_dy) / 2.0;
    line.positions.right -= (dy - damped_dy) / 2.0;
}

/// Position for a beam without visible stems: just beyond the outermost
/// note head, leaving room for the beam stack.
pub fn no_visible_stem_positions(input: &BeamInput, default_value: Interval) -> Interval {
    if input.stems.is_empty() {
        return default_value;
    }
    let mut heads = Interval::empty();
    let mut span = 0;
    for stem in &input.stems {
        heads.unite(stem.head_positions);
        span = span.max(stem.multiplicity_span);
    }
    let dir = input.stems[0].direction;
    if dir == Direction::Center {
        return default_value;
    }
    let ss = input.staff.staff_space;
    let y = heads.at(dir) * 0.5 + dir.sign() * input.staff.beam_translation / ss * (span + 1) as f64;
    Interval::point(y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StemInput;

    fn up(x: f64, ideal: f64) -> StemInput {
        StemInput::new(x, Direction::Up, ideal, ideal - 1.0)
    }

    #[test]
    fn least_squares_follows_a_straight_melody() {
        let input = BeamInput::new(vec![up(0.0, 1.0), up(2.0, 2.0), up(4.0, 3.0)]);
        let line = least_squares_positions(&input);
        assert!((line.positions.left - 1.0).abs() < 1e-9);
        assert!((line.positions.right - 3.0).abs() < 1e-9);
        assert!((line.musical_dy - 2.0).abs() < 1e-9);
    }

    #[test]
    fn flat_ideal_keeps_flat_positions() {
        let input = BeamInput::new(vec![up(0.0, 2.0), up(3.0, 2.5), up(6.0, 2.0)]);
        let line = least_squares_positions(&input);
        assert_eq!(line.positions, PerSide::new(2.0, 2.0));
        assert_eq!(line.musical_dy, 0.0);
    }

    #[test]
    fn two_notes_on_middle_line_get_artificial_slope() {
        let input = BeamInput::new(vec![
            up(0.0, 0.0).with_heads(-3.0, -3.0),
            up(4.0, 0.0).with_heads(-1.0, -1.0),
        ]);
        let line = least_squares_positions(&input);
        assert!(line.positions.delta() > 0.0);
        assert!((line.positions.right - 0.24).abs() < 1e-9);
    }

    #[test]
    fn grace_edge_stem_does_not_tilt_a_flat_beam() {
        let mut grace = up(-2.0, 0.0).with_heads(-6.0, -6.0);
        grace.normal = false;
        let input = BeamInput::new(vec![
            grace,
            up(0.0, 0.0).with_heads(-1.0, -1.0),
            up(4.0, 0.0).with_heads(-1.0, -1.0),
        ]);
        let line = least_squares_positions(&input);
        assert_eq!(line.positions, PerSide::new(0.0, 0.0));
        assert_eq!(line.musical_dy, 0.0);
    }

    #[test]
    fn tiny_slope_is_raised_to_smallest_quant() {
        let staff = StaffGeometry::default();
        let dy = set_minimum_dy(&staff, -0.01);
        assert!((dy + 0.19).abs() < 1e-9);
        assert_eq!(set_minimum_dy(&staff, 0.0), 0.0);
        assert_eq!(set_minimum_dy(&staff, 1.5), 1.5);
    }

    #[test]
    fn damping_flattens_but_keeps_direction() {
        let input = BeamInput::new(vec![up(0.0, 0.0), up(4.0, 4.0)]);
        let mut line = least_squares_positions(&input);
        let before = line.positions.delta();
        slope_damping(&mut line, &input);
        let after = line.positions.delta();
        assert!(after > 0.0 && after < before);
        // The center of the beam does not move.
        assert!((line.positions.left + line.positions.right - 4.0).abs() < 1e-9);
    }

    #[test]
    fn huge_concaveness_forces_horizontal() {
        let mut input = BeamInput::new(vec![up(0.0, 0.0), up(4.0, 4.0)]);
        input.concaveness = 20000.0;
        let line = ideal_line(&input);
        assert_eq!(line.positions.delta(), 0.0);
        assert_eq!(line.musical_dy, 0.0);
    }

    #[test]
    fn beam_without_normal_stems_sits_beyond_heads() {
        let mut stem = up(0.0, 0.0).with_heads(-2.0, 4.0);
        stem.normal = false;
        let input = BeamInput::new(vec![stem]);
        let line = least_squares_positions(&input);
        assert!((line.positions.left - 2.75).abs() < 1e-9);
    }
}
