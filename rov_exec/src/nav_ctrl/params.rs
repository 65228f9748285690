//! Parameters structure for NavCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::NavCtrlError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for navigation control.
#[derive(Debug, Clone, Deserialize)]
pub struct NavCtrlParams {

    // ---- ACTUATION ----

    /// Throttle demand used when driving forward.
    pub throttle_set: f64,

    /// Brake demand used when stopping.
    pub brake_set: f64,

    /// Steering demand used when turning on the spot, negative turns right.
    ///
    /// Units: degrees
    pub turn_steer_deg: f64,

    /// Lowest steering demand the actuator accepts.
    ///
    /// Units: degrees
    pub steer_min_deg: f64,

    /// Highest steering demand the actuator accepts.
    ///
    /// Units: degrees
    pub steer_max_deg: f64,

    // ---- STOP/GO ----

    /// While rotating to find a wall, a navigable sample count below this means a wall is ahead.
    pub wall_close_px: usize,

    /// Minimum navigable sample count needed to keep driving forward.
    pub go_forward_px: usize,

    // ---- WALL FOLLOWING ----

    /// Samples at an angle beyond this on either side count towards the side distances.
    ///
    /// Units: degrees
    pub wall_angle_deg: f64,

    /// Rectified image pixels per world unit, used to scale the side distances.
    pub px_per_unit: f64,

    /// Largest desired gap to the left wall.
    ///
    /// Units: world units
    pub max_standoff: f64,

    /// Steering gain applied when the rover is too far from the left wall.
    ///
    /// Units: degrees/world unit
    pub gain_toward_wall: f64,

    /// Steering gain applied when the rover is too close to the left wall.
    ///
    /// Units: degrees/world unit
    pub gain_away_wall: f64,

    /// Highest steering demand used while following a wall.
    ///
    /// Units: degrees
    pub follow_steer_max_deg: f64,

    // ---- ROCK APPROACH ----

    /// Rocks seen closer than this on average are approached.
    ///
    /// Units: pixels
    pub rock_max_dist_px: f64,

    /// Steering gain applied to the mean rock angle.
    ///
    /// Units: degrees/radian
    pub rock_steer_gain: f64,

    /// Throttle is cut while the rover is faster than this during an approach.
    ///
    /// Units: meters/second
    pub rock_approach_max_vel_ms: f64,

    /// An approach lasting longer than this is abandoned.
    ///
    /// Units: seconds
    pub rock_timeout_s: f64,

    /// After an approach is abandoned, rocks do not start a new approach for this long. Must be
    /// longer than `stuck_timeout_s`.
    ///
    /// Units: seconds
    pub rock_cooldown_s: f64,

    // ---- STUCK RECOVERY ----

    /// The rover is considered stationary below this speed.
    ///
    /// Units: meters/second
    pub stuck_vel_ms: f64,

    /// Time spent stationary with throttle applied before the rover is considered stuck.
    ///
    /// Units: seconds
    pub stuck_timeout_s: f64,

    /// Period of the turn/throttle recovery cycle. The first half of each period is spent turning.
    ///
    /// Units: seconds
    pub stuck_period_s: f64,

    /// Recovery ends once the rover is faster than this.
    ///
    /// Units: meters/second
    pub unstuck_vel_ms: f64,

    /// Multiple of the throttle setpoint applied while recovering.
    pub stuck_throttle_factor: f64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl NavCtrlParams {
    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), NavCtrlError> {
        let non_negative = [
            ("throttle_set", self.throttle_set),
            ("brake_set", self.brake_set),
            ("wall_angle_deg", self.wall_angle_deg),
            ("max_standoff", self.max_standoff),
            ("gain_toward_wall", self.gain_toward_wall),
            ("gain_away_wall", self.gain_away_wall),
            ("rock_max_dist_px", self.rock_max_dist_px),
            ("rock_approach_max_vel_ms", self.rock_approach_max_vel_ms),
            ("rock_timeout_s", self.rock_timeout_s),
            ("rock_cooldown_s", self.rock_cooldown_s),
            ("stuck_vel_ms", self.stuck_vel_ms),
            ("stuck_timeout_s", self.stuck_timeout_s),
            ("unstuck_vel_ms", self.unstuck_vel_ms),
            ("stuck_throttle_factor", self.stuck_throttle_factor),
        ];

        for (name, value) in non_negative.iter() {
            if !(*value >= 0.0) {
                return Err(NavCtrlError::InvalidParams(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }

        if !(self.px_per_unit > 0.0) || !(self.stuck_period_s > 0.0) {
            return Err(NavCtrlError::InvalidParams(String::from(
                "px_per_unit and stuck_period_s must be positive",
            )));
        }

        if !(self.steer_min_deg <= self.steer_max_deg) {
            return Err(NavCtrlError::InvalidParams(format!(
                "steering range [{}, {}] is empty",
                self.steer_min_deg, self.steer_max_deg
            )));
        }

        if self.follow_steer_max_deg < self.steer_min_deg
            || self.follow_steer_max_deg > self.steer_max_deg
        {
            return Err(NavCtrlError::InvalidParams(format!(
                "follow_steer_max_deg ({}) outside the steering range",
                self.follow_steer_max_deg
            )));
        }

        if self.turn_steer_deg < self.steer_min_deg || self.turn_steer_deg > self.steer_max_deg {
            return Err(NavCtrlError::InvalidParams(format!(
                "turn_steer_deg ({}) outside the steering range",
                self.turn_steer_deg
            )));
        }

        if !(self.rock_cooldown_s > self.stuck_timeout_s) {
            return Err(NavCtrlError::InvalidParams(format!(
                "rock_cooldown_s ({}) must exceed stuck_timeout_s ({})",
                self.rock_cooldown_s, self.stuck_timeout_s
            )));
        }

        Ok(())
    }

    /// Side distance angle bound in radians.
    pub fn wall_angle_rad(&self) -> f64 {
        self.wall_angle_deg.to_radians()
    }
}
