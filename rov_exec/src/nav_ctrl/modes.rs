//! Navigation mode handlers
//!
//! Each [`NavMode`] has exactly one handler here, which sets the demands for the cycle and may
//! change the mode. Handlers never touch the mode-independent rules, see `supervisor`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::drive::DriveDems;
use log::{debug, info, warn};
use util::maths::{clamp, rem_euclid};

use super::{
    wall::{left_distance, right_distance, target_standoff, wall_steer},
    NavCtrlParams, NavMode,
};
use crate::data_store::RoverState;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Turn right on the spot until a wall fills enough of the view.
pub(super) fn rotate_to_wall(params: &NavCtrlParams, state: &mut RoverState) {
    state.throttle = 0.0;
    state.brake = 0.0;
    state.steer_deg = params.turn_steer_deg;

    if state.nav.count() < params.wall_close_px {
        state.steer_deg = 0.0;
        state.mode = NavMode::ApproachWall;
    }
}

/// Drive straight at the wall until it is close.
pub(super) fn approach_wall(params: &NavCtrlParams, state: &mut RoverState) {
    state.steer_deg = 0.0;
    state.throttle = params.throttle_set;

    if state.nav.count() < params.go_forward_px {
        state.throttle = 0.0;
        state.brake = params.brake_set;
        state.mode = NavMode::StoppedTurning;
    }
}

/// Keep the wall on the left at the target standoff, watching for dead ends and rocks.
pub(super) fn follow_wall(params: &NavCtrlParams, state: &mut RoverState) {
    if state.picking_up {
        return;
    }

    // Stay stopped for one cycle after losing sight of a rock
    if state.rock_lost {
        state.rock_lost = false;
        state.set_drive_dems(DriveDems::stop(params.brake_set));
        return;
    }

    if state.nav.has_depth() {
        state.brake = 0.0;
        state.throttle = params.throttle_set;

        let bound = params.wall_angle_rad();
        let left = left_distance(&state.nav, bound, params.px_per_unit);
        let right = right_distance(&state.nav, bound, params.px_per_unit);
        let target = target_standoff(left, right, params.max_standoff);

        state.steer_deg = wall_steer(left, target, params);

        if state.nav.count() < params.go_forward_px {
            state.brake = params.brake_set;
            state.throttle = 0.0;
            state.mode = NavMode::StoppedTurning;
        }
    } else {
        // No depth this cycle, coast on the current heading
        state.throttle = params.throttle_set;
        state.brake = 0.0;
    }

    let cooling_down = match state.rock_ignore_until_s {
        Some(t) if state.total_time_s < t => true,
        Some(_) => {
            debug!("Rock cooldown over");
            state.rock_ignore_until_s = None;
            false
        }
        None => false,
    };

    let rock_close = !cooling_down
        && state.rock_found
        && state
            .rock
            .mean_dist_px()
            .map_or(false, |d| d < params.rock_max_dist_px);

    if rock_close {
        state.set_drive_dems(DriveDems::stop(params.brake_set));
        state.prev_mode = Some(state.mode);
        state.first_rock_time_s = Some(state.total_time_s);
        state.rock_lost = false;
        state.mode = NavMode::ApproachRock;
    }
}

/// Steer towards the rock and stop next to it.
pub(super) fn approach_rock(params: &NavCtrlParams, state: &mut RoverState) {
    state.brake = 0.0;

    if state.near_sample {
        state.set_drive_dems(DriveDems::stop(params.brake_set));
        return;
    }

    let elapsed_s = state
        .first_rock_time_s
        .map_or(0.0, |t| state.total_time_s - t);

    if elapsed_s > params.rock_timeout_s {
        warn!("Rock not reached after {:.1} s, abandoning approach", elapsed_s);
        abandon_rock(params, state, false);
        return;
    }

    match state.rock.mean_angle_rad() {
        Some(angle) => {
            state.steer_deg = clamp(
                params.rock_steer_gain * angle,
                params.steer_min_deg,
                params.steer_max_deg,
            );
            state.throttle = if state.vel_ms > params.rock_approach_max_vel_ms {
                0.0
            } else {
                params.throttle_set
            };
            state.rock_lost = false;
        }
        None => {
            warn!("Rock lost during approach");
            abandon_rock(params, state, true);
        }
    }
}

/// Turn right on the spot until there is room to drive.
pub(super) fn stopped_turning(params: &NavCtrlParams, state: &mut RoverState) {
    state.steer_deg = params.turn_steer_deg;
    state.brake = 0.0;
    state.throttle = 0.0;

    if state.nav.count() > params.go_forward_px {
        state.steer_deg = 0.0;
        state.mode = NavMode::FollowWall;
    }
}

/// Alternate between turning and hard throttle until the rover moves.
pub(super) fn stuck_recovery(params: &NavCtrlParams, state: &mut RoverState) {
    let stuck_s = state
        .first_stuck_time_s
        .map_or(0.0, |t| state.total_time_s - t);

    state.brake = 0.0;

    if rem_euclid(stuck_s, params.stuck_period_s) < params.stuck_period_s / 2.0 {
        state.steer_deg = params.turn_steer_deg;
        state.throttle = 0.0;
    } else {
        state.steer_deg = 0.0;
        state.throttle = params.throttle_set * params.stuck_throttle_factor;
    }

    if state.vel_ms > params.unstuck_vel_ms {
        info!("Rover moving again after {:.1} s", stuck_s);
        state.mode = state.prev_mode.take().unwrap_or(NavMode::FollowWall);
        state.first_stuck_time_s = None;
    }
}

/// Stop the rock approach and return to the mode it interrupted. No new approach starts until
/// `rock_cooldown_s` has passed.
fn abandon_rock(params: &NavCtrlParams, state: &mut RoverState, lost: bool) {
    state.set_drive_dems(DriveDems::stop(params.brake_set));
    state.rock_found = false;
    state.rock_lost = lost;
    state.first_rock_time_s = None;
    state.rock_ignore_until_s = Some(state.total_time_s + params.rock_cooldown_s);
    state.mode = state.prev_mode.take().unwrap_or(NavMode::FollowWall);
}
