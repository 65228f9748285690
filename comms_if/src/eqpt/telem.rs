//! # Rover Telemetry
//!
//! Telemetry reported by the simulator (or hardware) at the start of every cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Pose, kinematics and sample status of the rover.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct RoverTelem {
    /// Position of the rover in the world frame.
    ///
    /// Units: world map cells
    pub position: [f64; 2],

    /// Heading of the rover in the world frame, `[0, 360)`.
    ///
    /// Units: degrees
    pub yaw_deg: f64,

    /// Pitch of the rover, `[0, 360)`.
    ///
    /// Units: degrees
    pub pitch_deg: f64,

    /// Roll of the rover, `[0, 360)`.
    ///
    /// Units: degrees
    pub roll_deg: f64,

    /// Forward velocity of the rover.
    ///
    /// Units: meters/second
    pub vel_ms: f64,

    /// True when the rover is close enough to a sample to pick it up.
    pub near_sample: bool,

    /// True while a pickup is in progress.
    pub picking_up: bool,

    /// Monotonic simulation time.
    ///
    /// Units: seconds
    pub total_time_s: f64,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_telem_from_json() {
        let telem: RoverTelem = serde_json::from_str(
            r#"{
                "position": [99.7, 85.6],
                "yaw_deg": 56.8,
                "pitch_deg": 359.6,
                "roll_deg": 0.3,
                "vel_ms": 0.0,
                "near_sample": false,
                "picking_up": false,
                "total_time_s": 12.5
            }"#,
        )
        .unwrap();

        assert_eq!(telem.position, [99.7, 85.6]);
        assert_eq!(telem.total_time_s, 12.5);
        assert!(!telem.near_sample);
    }
}
