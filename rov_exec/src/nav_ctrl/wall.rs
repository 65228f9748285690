//! Wall following control law
//!
//! The rover keeps a wall on its left. The side distances are the mean distance of the navigable
//! samples beyond a fixed angle on each side, and steering is proportional to the error between
//! the left distance and a target standoff.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use util::maths::{clamp, mean};

use super::NavCtrlParams;
use crate::per::PolarSamples;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Mean distance of the samples to the left of `+angle_rad`, scaled into world units. Zero if
/// there are no such samples.
pub fn left_distance(samples: &PolarSamples, angle_rad: f64, px_per_unit: f64) -> f64 {
    side_distance(samples, |a| a > angle_rad, px_per_unit)
}

/// Mean distance of the samples to the right of `-angle_rad`, scaled into world units. Zero if
/// there are no such samples.
pub fn right_distance(samples: &PolarSamples, angle_rad: f64, px_per_unit: f64) -> f64 {
    side_distance(samples, |a| a < -angle_rad, px_per_unit)
}

/// The gap to keep to the left wall: half the corridor width, capped at `max_standoff`.
pub fn target_standoff(left: f64, right: f64, max_standoff: f64) -> f64 {
    max_standoff.min((left + right) / 2.0)
}

/// Steering demand for the given left distance and target standoff.
///
/// Positive error (too far from the wall) turns left with the gentle gain, zero or negative error
/// turns right with the strong gain.
pub fn wall_steer(left: f64, target: f64, params: &NavCtrlParams) -> f64 {
    let err = left - target;

    let steer = if err > 0.0 {
        params.gain_toward_wall * err
    } else {
        params.gain_away_wall * err
    };

    clamp(steer, params.steer_min_deg, params.follow_steer_max_deg)
}

fn side_distance<F: Fn(f64) -> bool>(samples: &PolarSamples, side: F, px_per_unit: f64) -> f64 {
    mean(samples.pairs().filter(|(_, a)| side(*a)).map(|(d, _)| d))
        .map(|d| d / px_per_unit)
        .unwrap_or(0.0)
}
