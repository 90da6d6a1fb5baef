//! Tunable demerit weights for beam quanting.
//!
//! Every weight has a documented default and may be overridden on its own,
//! either through the `with_*` setters or, at an external boundary, by its
//! kebab-case detail name via [`QuantParameters::with_detail`].

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{BeamError, Result};
use crate::geometry::BeamPositions;

// ── General ─────────────────────────────────────────────────────────
pub const DEFAULT_BEAM_EPS: f64 = 1e-3;
pub const DEFAULT_REGION_SIZE: i32 = 2;
/// Largest accepted region size; the candidate count grows with its square.
pub const MAX_REGION_SIZE: i32 = 16;

// ── Forbidden quants and stem lengths ───────────────────────────────
pub const DEFAULT_SECONDARY_BEAM_DEMERIT: f64 = 10.0;
pub const DEFAULT_STEM_LENGTH_DEMERIT_FACTOR: f64 = 5.0;
pub const DEFAULT_HORIZONTAL_INTER_QUANT: f64 = 500.0;
pub const DEFAULT_STEM_LENGTH_LIMIT_PENALTY: f64 = 5000.0;

// ── Slopes ──────────────────────────────────────────────────────────
pub const DEFAULT_DAMPING_DIRECTION_PENALTY: f64 = 800.0;
pub const DEFAULT_HINT_DIRECTION_PENALTY: f64 = 20.0;
pub const DEFAULT_MUSICAL_DIRECTION_FACTOR: f64 = 400.0;
pub const DEFAULT_IDEAL_SLOPE_FACTOR: f64 = 10.0;
pub const DEFAULT_ROUND_TO_ZERO_SLOPE: f64 = 0.02;

// ── Collisions ──────────────────────────────────────────────────────
pub const DEFAULT_COLLISION_PENALTY: f64 = 500.0;
pub const DEFAULT_COLLISION_PADDING: f64 = 0.5;
pub const DEFAULT_STEM_COLLISION_FACTOR: f64 = 0.1;

/// Weights read once per solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct QuantParameters {
    /// Tolerance when comparing quant positions (`beam-eps`)
    pub beam_eps: f64,
    /// Staff spaces searched on either side of the seed line (`region-size`),
    /// at most [`MAX_REGION_SIZE`]
    #[serde(deserialize_with = "deserialize_region_size")]
    pub region_size: i32,
    /// Demerit for a staff line showing in the gap between stacked beams
    /// (`secondary-beam-demerit`)
    pub secondary_beam_demerit: f64,
    /// Weight of deviations from the ideal stem length (`stem-length-demerit-factor`)
    pub stem_length_demerit_factor: f64,
    /// Demerit for a horizontal beam between two staff lines (`horizontal-inter-quant`)
    pub horizontal_inter_quant: f64,
    /// Weight of stems shorter than their minimum (`stem-length-limit-penalty`)
    pub stem_length_limit_penalty: f64,
    /// Demerit for sloping against the damped slope (`damping-direction-penalty`)
    pub damping_direction_penalty: f64,
    /// Demerit for flattening a very slight slope (`hint-direction-penalty`)
    pub hint_direction_penalty: f64,
    /// Weight of slopes steeper than the melody (`musical-direction-factor`)
    pub musical_direction_factor: f64,
    /// Weight of deviations from the damped slope (`ideal-slope-factor`)
    pub ideal_slope_factor: f64,
    /// Slopes below this count as horizontal (`round-to-zero-slope`)
    pub round_to_zero_slope: f64,
    /// Demerit for a beam touching an obstacle (`collision-penalty`)
    pub collision_penalty: f64,
    /// Clearance below which collisions are penalized (`collision-padding`)
    pub collision_padding: f64,
    /// Scale for collisions with stems of other beams (`stem-collision-factor`)
    pub stem_collision_factor: f64,
}

impl Default for QuantParameters {
    fn default() -> Self {
        Self {
            beam_eps: DEFAULT_BEAM_EPS,
            region_size: DEFAULT_REGION_SIZE,
            secondary_beam_demerit: DEFAULT_SECONDARY_BEAM_DEMERIT,
            stem_length_demerit_factor: DEFAULT_STEM_LENGTH_DEMERIT_FACTOR,
            horizontal_inter_quant: DEFAULT_HORIZONTAL_INTER_QUANT,
            stem_length_limit_penalty: DEFAULT_STEM_LENGTH_LIMIT_PENALTY,
            damping_direction_penalty: DEFAULT_DAMPING_DIRECTION_PENALTY,
            hint_direction_penalty: DEFAULT_HINT_DIRECTION_PENALTY,
            musical_direction_factor: DEFAULT_MUSICAL_DIRECTION_FACTOR,
            ideal_slope_factor: DEFAULT_IDEAL_SLOPE_FACTOR,
            round_to_zero_slope: DEFAULT_ROUND_TO_ZERO_SLOPE,
            collision_penalty: DEFAULT_COLLISION_PENALTY,
            collision_padding: DEFAULT_COLLISION_PADDING,
            stem_collision_factor: DEFAULT_STEM_COLLISION_FACTOR,
        }
    }
}

impl QuantParameters {
    /// Creates a parameter set with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search region size, clamped to `0..=MAX_REGION_SIZE`.
    pub fn with_region_size(mut self, region_size: i32) -> Self {
        self.region_size = region_size.clamp(0, MAX_REGION_SIZE);
        self
    }

    /// Sets the collision penalty.
    pub fn with_collision_penalty(mut self, penalty: f64) -> Self {
        self.collision_penalty = penalty;
        self
    }

    /// Sets the collision padding.
    pub fn with_collision_padding(mut self, padding: f64) -> Self {
        self.collision_padding = padding;
        self
    }

    /// Sets the stem length demerit factor.
    pub fn with_stem_length_demerit_factor(mut self, factor: f64) -> Self {
        self.stem_length_demerit_factor = factor;
        self
    }

    /// Sets the ideal slope factor.
    pub fn with_ideal_slope_factor(mut self, factor: f64) -> Self {
        self.ideal_slope_factor = factor;
        self
    }

    /// Overrides one weight by its detail name, e.g. `"collision-padding"`.
    pub fn with_detail(mut self, name: &str, value: f64) -> Result<Self> {
        match name {
            "beam-eps" => self.beam_eps = value,
            "region-size" => self.region_size = checked_region_size(value)?,
            "secondary-beam-demerit" => self.secondary_beam_demerit = value,
            "stem-length-demerit-factor" => self.stem_length_demerit_factor = value,
            "horizontal-inter-quant" => self.horizontal_inter_quant = value,
            "stem-length-limit-penalty" => self.stem_length_limit_penalty = value,
            "damping-direction-penalty" => self.damping_direction_penalty = value,
            "hint-direction-penalty" => self.hint_direction_penalty = value,
            "musical-direction-factor" => self.musical_direction_factor = value,
            "ideal-slope-factor" => self.ideal_slope_factor = value,
            "round-to-zero-slope" => self.round_to_zero_slope = value,
            "collision-penalty" => self.collision_penalty = value,
            "collision-padding" => self.collision_padding = value,
            "stem-collision-factor" => self.stem_collision_factor = value,
            _ => return Err(BeamError::UnknownParameter(name.to_string())),
        }
        Ok(self)
    }

    /// Applies a list of `(name, value)` overrides in order.
    pub fn with_details<'a, I>(self, details: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        details
            .into_iter()
            .try_fold(self, |params, (name, value)| params.with_detail(name, value))
    }
}

fn checked_region_size(value: f64) -> Result<i32> {
    if value.is_finite() && (0.0..=MAX_REGION_SIZE as f64).contains(&value) {
        Ok(value as i32)
    } else {
        Err(BeamError::ParameterOutOfRange { name: "region-size".to_string(), value })
    }
}

fn deserialize_region_size<'de, D>(deserializer: D) -> std::result::Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    checked_region_size(value).map_err(serde::de::Error::custom)
}

/// Per-call switches for the solver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    /// Attach a score card for the chosen configuration to the solution
    pub debug: bool,
    /// Fully score only the candidate nearest to these positions
    pub inspect_quants: Option<BeamPositions>,
}

impl SolveOptions {
    pub fn debug() -> Self {
        Self { debug: true, inspect_quants: None }
    }

    pub fn inspect(positions: BeamPositions) -> Self {
        Self { debug: true, inspect_quants: Some(positions) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_override_single_weights() {
        let params = QuantParameters::new()
            .with_details([("region-size", 3.0), ("collision-padding", 0.25)])
            .unwrap();
        assert_eq!(params.region_size, 3);
        assert_eq!(params.collision_padding, 0.25);
        assert_eq!(params.collision_penalty, DEFAULT_COLLISION_PENALTY);
    }

    #[test]
    fn unknown_detail_is_rejected() {
        let err = QuantParameters::new().with_detail("beam-wobble", 1.0).unwrap_err();
        assert!(matches!(err, BeamError::UnknownParameter(ref n) if n == "beam-wobble"));
    }

    #[test]
    fn out_of_range_region_size_is_rejected() {
        for value in [1.0e12, -1.0, f64::NAN, f64::INFINITY, (MAX_REGION_SIZE + 1) as f64] {
            let err = QuantParameters::new().with_detail("region-size", value).unwrap_err();
            assert!(
                matches!(err, BeamError::ParameterOutOfRange { ref name, .. } if name == "region-size"),
                "region size {value} accepted"
            );
        }
        let params = QuantParameters::new().with_detail("region-size", MAX_REGION_SIZE as f64).unwrap();
        assert_eq!(params.region_size, MAX_REGION_SIZE);
    }

    #[test]
    fn region_size_setter_clamps() {
        assert_eq!(QuantParameters::new().with_region_size(i32::MAX).region_size, MAX_REGION_SIZE);
        assert_eq!(QuantParameters::new().with_region_size(-5).region_size, 0);
    }

    #[test]
    fn region_size_is_checked_when_deserializing() {
        let params: QuantParameters = serde_json::from_str(r#"{ "region-size": 4 }"#).unwrap();
        assert_eq!(params.region_size, 4);
        let err = serde_json::from_str::<QuantParameters>(r#"{ "region-size": 1e12 }"#).unwrap_err();
        assert!(err.to_string().contains("region-size"), "unexpected error: {err}");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let params: QuantParameters =
            serde_json::from_str(r#"{ "ideal-slope-factor": 2.5 }"#).unwrap();
        assert_eq!(params.ideal_slope_factor, 2.5);
        assert_eq!(params.stem_length_limit_penalty, DEFAULT_STEM_LENGTH_LIMIT_PENALTY);
    }
}
