//! # Drive Equipment Demands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands sent to the drive and sample handling equipment each cycle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct DriveDems {
    /// Throttle demand, always non-negative.
    pub throttle: f64,

    /// Brake demand, always non-negative.
    pub brake: f64,

    /// Steering angle demand, positive to the left.
    ///
    /// Units: degrees
    pub steer_deg: f64,

    /// Request a sample pickup. Only set on the single cycle the request is made.
    pub pickup: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DriveDems {
    /// Demands which bring the rover to a halt with the given brake value.
    pub fn stop(brake: f64) -> Self {
        Self {
            throttle: 0.0,
            brake,
            steer_deg: 0.0,
            pickup: false,
        }
    }
}
