//! Error and warning types.
//!
//! `BeamError` covers input that cannot be turned into a scoring problem at
//! all. Conditions the engine can work around are reported as
//! [`QuantWarning`]s alongside a best-effort result instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BeamError {
    #[error("beam has no normal stems")]
    NoNormalStems,

    #[error("invalid staff geometry: {0}")]
    InvalidStaffGeometry(String),

    #[error("unknown beam quanting parameter '{0}'")]
    UnknownParameter(String),

    #[error("beam quanting parameter '{name}' out of range: {value}")]
    ParameterOutOfRange { name: String, value: f64 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BeamError>;

/// A recoverable problem met while positioning a beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum QuantWarning {
    /// No starting line satisfies the stem length constraints; the
    /// unshifted line was used as the search seed.
    NoViableInitialConfiguration,
    /// Every quant candidate fell outside the feasible quant ranges; the
    /// unquantized line was returned.
    NoViableQuant,
    /// Beam segments and stems were measured against different x reference
    /// points; collisions were not scored.
    CommonRefpointMismatch { expected: u32, found: u32 },
    /// The candidate nearest to the inspected positions is far away from them.
    InspectQuantNotFound { distance: f64 },
}

impl std::fmt::Display for QuantWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuantWarning::NoViableInitialConfiguration => {
                write!(f, "no viable initial configuration found: may not find good beam slope")
            }
            QuantWarning::NoViableQuant => {
                write!(f, "no viable beam quanting found, using unquanted y value")
            }
            QuantWarning::CommonRefpointMismatch { expected, found } => write!(
                f,
                "disagree on common x ({expected} vs {found}), skipping collisions in beam scoring"
            ),
            QuantWarning::InspectQuantNotFound { distance } => {
                write!(f, "cannot find quant near inspected positions (distance {distance:.2})")
            }
        }
    }
}
