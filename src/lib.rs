//! beamlib — beam quanting engine for music engraving.
//!
//! Given a beam, the stems it joins and the objects it passes over, picks
//! the left and right beam positions: legible against the staff lines,
//! respecting stem lengths, and clear of collisions.
//!
//! # Example
//! ```
//! use beamlib::{quant_beam, BeamInput, Direction, QuantParameters, SolveOptions, StemInput};
//!
//! let input = BeamInput::new(vec![
//!     StemInput::new(0.0, Direction::Up, 2.0, 1.0),
//!     StemInput::new(10.0, Direction::Up, 2.0, 1.0),
//! ]);
//! let solution = quant_beam(&input, &QuantParameters::default(), &SolveOptions::default()).unwrap();
//! println!("Beam from {} to {}", solution.positions.left, solution.positions.right);
//! ```

pub mod error;
pub mod geometry;
pub mod ideal;
pub mod model;
pub mod params;
pub mod quanting;

use serde::{Deserialize, Serialize};

pub use error::{BeamError, QuantWarning, Result};
pub use geometry::{BeamPositions, BoundingBox, Direction, Interval, PerSide, Side};
pub use ideal::{ideal_line, IdealLine};
pub use model::*;
pub use params::{QuantParameters, SolveOptions};
pub use quanting::{shift_region_to_valid, BeamScoringProblem, ScoreCard, Solution, SolveStats};

/// Position one beam: ideal line, slope damping, feasibility shift, then
/// quanting.
///
/// `input.positions` and `input.musical_dy`, when present, replace the
/// computed ideal line and melodic slope.
///
/// Beams without normal stems and invalid staff geometry are rejected up
/// front, so the stemless placement in [`ideal`] is never used here.
pub fn quant_beam(
    input: &BeamInput,
    params: &QuantParameters,
    options: &SolveOptions,
) -> Result<Solution> {
    if input.first_normal_stem().is_none() {
        return Err(BeamError::NoNormalStems);
    }
    quanting::validate_staff(input)?;

    let ideal = ideal_line(input);
    let unquanted = input.positions.unwrap_or(ideal.positions);
    let musical_dy = input.musical_dy.unwrap_or(ideal.musical_dy);

    let shifted = shift_region_to_valid(input, unquanted);
    let problem = BeamScoringProblem::new(input, shifted.positions, musical_dy, params.clone())?;

    let mut solution = problem.solve(options);
    if let Some(warning) = shifted.warning {
        solution.warnings.insert(0, warning);
    }
    Ok(solution)
}

/// A beam together with optional weights and solver switches, as read from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeamRequest {
    pub beam: BeamInput,
    #[serde(default)]
    pub params: QuantParameters,
    #[serde(default)]
    pub options: SolveOptions,
}

/// Parse a [`BeamRequest`] from JSON, position the beam, and return the
/// [`Solution`] as JSON.
pub fn quant_beam_json(json: &str) -> Result<String> {
    let request: BeamRequest = serde_json::from_str(json)?;
    let solution = quant_beam(&request.beam, &request.params, &request.options)?;
    solution_to_json(&solution)
}

/// Convert a solution to a JSON string.
/// Useful for passing data across FFI boundaries.
pub fn solution_to_json(solution: &Solution) -> Result<String> {
    Ok(serde_json::to_string_pretty(solution)?)
}

// ═══════════════════════════════════════════════════════════════════════
// C FFI
// ═══════════════════════════════════════════════════════════════════════

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// Position a beam described by a JSON request and return the solution as
/// a JSON C string, or null on error.
/// The caller must free the returned string with `beamlib_free_string`.
///
/// # Safety
/// `request` must be a valid null-terminated UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn beamlib_quant_json(request: *const c_char) -> *mut c_char {
    if request.is_null() {
        return std::ptr::null_mut();
    }
    let c_str = unsafe { CStr::from_ptr(request) };
    let json = match c_str.to_str() {
        Ok(s) => s,
        Err(_) => return std::ptr::null_mut(),
    };

    match quant_beam_json(json) {
        Ok(out) => CString::new(out).unwrap_or_default().into_raw(),
        Err(e) => {
            log::warn!("beam request failed: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Free a string previously returned by beamlib functions.
///
/// # Safety
/// `ptr` must be a string previously returned by a beamlib function, or null.
#[no_mangle]
pub unsafe extern "C" fn beamlib_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}
