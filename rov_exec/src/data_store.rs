//! # Rover State
//!
//! The single mutable record passed between perception and navigation control every cycle. The
//! control loop owns it; perception writes the samples and rock flag, navigation control writes
//! the demands and mode, and the equipment telemetry fills in the pose and kinematics.

use comms_if::eqpt::{drive::DriveDems, telem::RoverTelem};
use serde::Serialize;

use crate::{nav_ctrl::NavMode, per::PolarSamples};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Rover state shared by the autonomy modules.
#[derive(Debug, Clone, Default)]
pub struct RoverState {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    /// Monotonic simulation time
    pub total_time_s: f64,

    // Pose and kinematics, from telemetry
    /// World position, in map cells
    pub position: [f64; 2],
    pub yaw_deg: f64,
    pub pitch_deg: f64,
    pub roll_deg: f64,

    /// Forward velocity
    pub vel_ms: f64,

    // Demands, written by NavCtrl
    pub throttle: f64,
    pub brake: f64,
    pub steer_deg: f64,

    // Perception outputs
    /// Samples of navigable terrain
    pub nav: PolarSamples,

    /// Samples of rock-coloured terrain
    pub rock: PolarSamples,

    /// True if enough rock pixels were seen this cycle
    pub rock_found: bool,

    /// Navigable angles from the last accepted frame, substituted in when a frame is rejected
    pub prev_nav_angles: Vec<f64>,

    // Sample handling
    pub near_sample: bool,
    pub picking_up: bool,

    /// One-shot pickup request, only true on the cycle it is raised
    pub pickup_request: bool,

    /// Set once a pickup has been requested for the current sample, released when the rover is
    /// no longer near a sample.
    pub pickup_latched: bool,

    // Navigation mode and timers
    pub mode: NavMode,

    /// Mode to return to after a rock approach or stuck recovery
    pub prev_mode: Option<NavMode>,

    /// Time at which the rover was first seen stuck
    pub first_stuck_time_s: Option<f64>,

    /// Time at which the current rock approach started
    pub first_rock_time_s: Option<f64>,

    /// True if the last rock approach ended by losing sight of the rock, cleared once wall
    /// following has stopped for a cycle
    pub rock_lost: bool,

    /// Rocks seen before this time do not start an approach
    pub rock_ignore_until_s: Option<f64>,
}

/// Flat per-cycle snapshot of the state for CSV archiving.
#[derive(Debug, Clone, Serialize)]
pub struct RoverStateRecord {
    pub num_cycles: u64,
    pub total_time_s: f64,
    pub pos_x: f64,
    pub pos_y: f64,
    pub yaw_deg: f64,
    pub pitch_deg: f64,
    pub roll_deg: f64,
    pub vel_ms: f64,
    pub throttle: f64,
    pub brake: f64,
    pub steer_deg: f64,
    pub num_nav: usize,
    pub num_rock: usize,
    pub rock_found: bool,
    pub near_sample: bool,
    pub picking_up: bool,
    pub pickup_request: bool,
    pub mode: NavMode,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl RoverState {
    /// Create a fresh state, with timers cleared and the controller in its initial mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Perform actions required at the start of a cycle.
    pub fn cycle_start(&mut self, telem: &RoverTelem) {
        self.num_cycles += 1;
        self.apply_telem(telem);
    }

    /// Copy the equipment telemetry into the state.
    pub fn apply_telem(&mut self, telem: &RoverTelem) {
        self.position = telem.position;
        self.yaw_deg = telem.yaw_deg;
        self.pitch_deg = telem.pitch_deg;
        self.roll_deg = telem.roll_deg;
        self.vel_ms = telem.vel_ms;
        self.near_sample = telem.near_sample;
        self.picking_up = telem.picking_up;
        self.total_time_s = telem.total_time_s;
    }

    /// The demands to send to the drive equipment this cycle.
    pub fn drive_dems(&self) -> DriveDems {
        DriveDems {
            throttle: self.throttle,
            brake: self.brake,
            steer_deg: self.steer_deg,
            pickup: self.pickup_request,
        }
    }

    /// Set the throttle, brake and steering demands. The pickup request is left alone.
    pub fn set_drive_dems(&mut self, dems: DriveDems) {
        self.throttle = dems.throttle;
        self.brake = dems.brake;
        self.steer_deg = dems.steer_deg;
    }

    /// Snapshot of the state for archiving.
    pub fn record(&self) -> RoverStateRecord {
        RoverStateRecord {
            num_cycles: self.num_cycles,
            total_time_s: self.total_time_s,
            pos_x: self.position[0],
            pos_y: self.position[1],
            yaw_deg: self.yaw_deg,
            pitch_deg: self.pitch_deg,
            roll_deg: self.roll_deg,
            vel_ms: self.vel_ms,
            throttle: self.throttle,
            brake: self.brake,
            steer_deg: self.steer_deg,
            num_nav: self.nav.count(),
            num_rock: self.rock.count(),
            rock_found: self.rock_found,
            near_sample: self.near_sample,
            picking_up: self.picking_up,
            pickup_request: self.pickup_request,
            mode: self.mode,
        }
    }
}
