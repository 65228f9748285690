//! Mode-independent rules, run every cycle after the mode handler.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::drive::DriveDems;
use log::{info, warn};

use super::{NavCtrlParams, NavMode};
use crate::data_store::RoverState;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Switch to stuck recovery if the rover has been driving without moving for too long.
///
/// Only wall following is checked.
pub(super) fn check_stuck(params: &NavCtrlParams, state: &mut RoverState) {
    if state.mode != NavMode::FollowWall {
        return;
    }

    let stationary = state.throttle > 0.0
        && state.brake == 0.0
        && state.vel_ms.abs() < params.stuck_vel_ms;

    if !stationary {
        state.first_stuck_time_s = None;
        return;
    }

    match state.first_stuck_time_s {
        None => state.first_stuck_time_s = Some(state.total_time_s),
        Some(t) if state.total_time_s - t > params.stuck_timeout_s => {
            warn!(
                "Rover stuck for {:.1} s, starting recovery",
                state.total_time_s - t
            );
            state.prev_mode = Some(state.mode);
            state.mode = NavMode::StuckRecovery;
        }
        Some(_) => (),
    }
}

/// Request a pickup once the rover has stopped next to a sample.
///
/// Only one request is made per sample: the latch is released once the rover is no longer near
/// a sample. The rover is held stopped and any stuck timer is cleared, whichever mode was
/// interrupted.
pub(super) fn check_pickup(params: &NavCtrlParams, state: &mut RoverState) {
    if !state.near_sample {
        state.pickup_latched = false;
        return;
    }

    if state.vel_ms == 0.0 && !state.picking_up && !state.pickup_latched {
        state.pickup_request = true;
        state.pickup_latched = true;
        state.rock_found = false;
        state.first_rock_time_s = None;
        state.first_stuck_time_s = None;
        state.set_drive_dems(DriveDems::stop(params.brake_set));
        state.mode = state.prev_mode.take().unwrap_or(NavMode::FollowWall);

        info!("Sample pickup requested, resuming {}", state.mode);
    }
}
