//! Enumeration of quantized (left, right) candidates around the seed line.

use crate::geometry::{BeamPositions, Side};
use crate::params::MAX_REGION_SIZE;

use super::configuration::BeamConfiguration;
use super::problem::BeamScoringProblem;

/// Extra staff spaces searched for knees, and again when there are
/// collisions to steer around.
const HARD_CASE_EXTRA_REGION: i32 = 2;

/// Canonical beam positions within one staff space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseQuants {
    /// Centered on a staff line
    pub straddle: f64,
    /// Resting on a staff line
    pub sit: f64,
    /// Halfway between two lines
    pub inter: f64,
    /// Hanging from a staff line
    pub hang: f64,
}

impl BaseQuants {
    pub fn new(beam_thickness: f64, line_thickness: f64) -> Self {
        let sit = (beam_thickness - line_thickness) / 2.0;
        Self { straddle: 0.0, sit, inter: 0.5, hang: 1.0 - sit }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.straddle, self.sit, self.inter, self.hang]
    }
}

impl BeamScoringProblem {
    pub fn base_quants(&self) -> BaseQuants {
        BaseQuants::new(self.beam_thickness, self.line_thickness)
    }

    /// Staff spaces searched on either side of the seed.
    pub fn region_size(&self) -> i32 {
        let mut region_size = self.params.region_size.clamp(0, MAX_REGION_SIZE);
        if self.is_knee {
            region_size = region_size.saturating_add(HARD_CASE_EXTRA_REGION);
        }
        if !self.collisions.is_empty() {
            region_size = region_size.saturating_add(HARD_CASE_EXTRA_REGION);
        }
        region_size
    }

    /// Every quant pair within the region whose ends both lie in their
    /// side's feasible quant range.
    pub fn generate_quants(&self) -> Vec<BeamConfiguration> {
        let region_size = self.region_size();
        let base = self.base_quants().as_array();

        let unshifted_quants: Vec<f64> = (-region_size..region_size)
            .flat_map(|i| base.iter().map(move |q| i as f64 + q))
            .collect();

        let mut configs = Vec::with_capacity(unshifted_quants.len() * unshifted_quants.len());
        for &left in &unshifted_quants {
            for &right in &unshifted_quants {
                let config = BeamConfiguration::new_config(
                    self.unquanted_y,
                    BeamPositions::new(left, right),
                );
                if Side::BOTH.iter().all(|&side| self.quant_range[side].contains(config.y[side])) {
                    configs.push(config);
                }
            }
        }
        configs
    }
}
