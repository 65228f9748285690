//! # Navigation control module
//!
//! Finite state machine turning perception output and rover kinematics into throttle, brake and
//! steering demands. The rover explores by keeping a wall on its left, breaking off to approach
//! any sample rock it sees, and recovering if it gets stuck.
//!
//! Every cycle the handler for the current [`NavMode`] runs, followed by the stuck and pickup
//! rules which apply regardless of mode.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod modes;
mod params;
mod supervisor;
pub mod wall;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fmt;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    maths::clamp,
    session::Session,
};

use crate::data_store::RoverState;

pub use params::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Navigation control module state
pub struct NavCtrl {
    params: NavCtrlParams,

    report: StatusReport,
    arch_report: Archiver,
}

/// Status report for NavCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct StatusReport {
    /// Mode at the start of the cycle
    pub mode_in: NavMode,

    /// Mode at the end of the cycle
    pub mode_out: NavMode,

    pub throttle: f64,
    pub brake: f64,
    pub steer_deg: f64,

    /// True if the steering demand had to be limited to the actuator range
    pub steer_limited: bool,

    pub pickup_request: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Navigation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavMode {
    /// Turn on the spot looking for a nearby wall
    RotateToWall,

    /// Drive straight towards the wall
    ApproachWall,

    /// Keep the wall on the left at the standoff distance
    FollowWall,

    /// Drive to a detected sample rock
    ApproachRock,

    /// Stopped at a dead end, turning right until clear
    StoppedTurning,

    /// Alternate turning and throttling to get unstuck
    StuckRecovery,
}

/// Possible errors that can occur during NavCtrl initialisation.
#[derive(Debug, thiserror::Error)]
pub enum NavCtrlError {
    #[error("Invalid navigation control parameters: {0}")]
    InvalidParams(String),

    #[error("Could not create the NavCtrl archive: {0}")]
    ArchiveError(#[from] ArchiveError),
}

/// Handler run for a mode each cycle.
type ModeHandler = fn(&NavCtrlParams, &mut RoverState);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl NavMode {
    /// The handler for this mode.
    fn handler(&self) -> ModeHandler {
        match self {
            NavMode::RotateToWall => modes::rotate_to_wall,
            NavMode::ApproachWall => modes::approach_wall,
            NavMode::FollowWall => modes::follow_wall,
            NavMode::ApproachRock => modes::approach_rock,
            NavMode::StoppedTurning => modes::stopped_turning,
            NavMode::StuckRecovery => modes::stuck_recovery,
        }
    }
}

impl Default for NavMode {
    fn default() -> Self {
        NavMode::RotateToWall
    }
}

impl fmt::Display for NavMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NavMode::RotateToWall => "RotateToWall",
            NavMode::ApproachWall => "ApproachWall",
            NavMode::FollowWall => "FollowWall",
            NavMode::ApproachRock => "ApproachRock",
            NavMode::StoppedTurning => "StoppedTurning",
            NavMode::StuckRecovery => "StuckRecovery",
        };

        write!(f, "{}", name)
    }
}

impl NavCtrl {
    /// Create a new controller with validated parameters. Reports are not archived.
    pub fn new(params: NavCtrlParams) -> Result<Self, NavCtrlError> {
        params.validate()?;

        Ok(Self {
            params,
            report: StatusReport::default(),
            arch_report: Archiver::default(),
        })
    }

    /// Create a new controller which archives its status report into the session.
    pub fn with_archive(params: NavCtrlParams, session: &Session) -> Result<Self, NavCtrlError> {
        let mut nav_ctrl = Self::new(params)?;
        nav_ctrl.arch_report = Archiver::from_path(session, "nav_ctrl/status_report.csv")?;

        Ok(nav_ctrl)
    }

    /// Perform one cycle of navigation control.
    ///
    /// Reads the perception outputs and kinematics from the state, writes the demands, mode and
    /// pickup request back into it.
    pub fn step(&mut self, state: &mut RoverState) -> StatusReport {
        let mode_in = state.mode;
        state.pickup_request = false;

        (mode_in.handler())(&self.params, state);

        supervisor::check_stuck(&self.params, state);
        supervisor::check_pickup(&self.params, state);

        // Final limit on every demand regardless of which handler set it
        let steer = clamp(state.steer_deg, self.params.steer_min_deg, self.params.steer_max_deg);
        let steer_limited = steer != state.steer_deg;
        state.steer_deg = steer;
        state.throttle = state.throttle.max(0.0);
        state.brake = state.brake.max(0.0);

        if state.mode != mode_in {
            info!("NavCtrl mode change: {} -> {}", mode_in, state.mode);
        }

        self.report = StatusReport {
            mode_in,
            mode_out: state.mode,
            throttle: state.throttle,
            brake: state.brake,
            steer_deg: state.steer_deg,
            steer_limited,
            pickup_request: state.pickup_request,
        };

        debug!(
            "NavCtrl {}: throttle {:.2}, brake {:.2}, steer {:.2} deg",
            state.mode, state.throttle, state.brake, state.steer_deg
        );

        self.report
    }

    pub fn params(&self) -> &NavCtrlParams {
        &self.params
    }
}

impl Archived for NavCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_report.serialise(self.report)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::per::PolarSamples;

    fn nav_ctrl() -> NavCtrl {
        let params: NavCtrlParams =
            util::params::load_str(include_str!("../../../params/nav_ctrl.toml")).unwrap();

        NavCtrl::new(params).unwrap()
    }

    /// `count` samples straight ahead at 100 px.
    fn ahead(count: usize) -> PolarSamples {
        PolarSamples::from_pairs(std::iter::repeat((100.0, 0.0)).take(count))
    }

    /// Plenty of samples ahead plus some either side, so the side distances come out at `left`
    /// and `right` world units.
    fn corridor(left: f64, right: f64) -> PolarSamples {
        let mut pairs: Vec<(f64, f64)> = std::iter::repeat((100.0, 0.0)).take(1000).collect();
        pairs.extend(std::iter::repeat((left * 10.0, 1.0)).take(50));
        pairs.extend(std::iter::repeat((right * 10.0, -1.0)).take(50));

        PolarSamples::from_pairs(pairs)
    }

    fn follow_state() -> RoverState {
        RoverState {
            mode: NavMode::FollowWall,
            nav: corridor(1.5, 1.5),
            vel_ms: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_rotate_to_wall() {
        let mut nc = nav_ctrl();
        let mut state = RoverState::new();

        // Open space, keep turning
        state.nav = ahead(3000);
        nc.step(&mut state);
        assert_eq!(state.mode, NavMode::RotateToWall);
        assert_eq!(state.steer_deg, -15.0);
        assert_eq!(state.throttle, 0.0);

        // Wall fills the view
        state.nav = ahead(2000);
        let rpt = nc.step(&mut state);
        assert_eq!(state.mode, NavMode::ApproachWall);
        assert_eq!(state.steer_deg, 0.0);
        assert_eq!(rpt.mode_in, NavMode::RotateToWall);
        assert_eq!(rpt.mode_out, NavMode::ApproachWall);
    }

    #[test]
    fn test_approach_wall_then_turn() {
        let mut nc = nav_ctrl();
        let mut state = RoverState {
            mode: NavMode::ApproachWall,
            nav: ahead(1000),
            ..Default::default()
        };

        nc.step(&mut state);
        assert_eq!(state.mode, NavMode::ApproachWall);
        assert_eq!(state.throttle, 0.2);

        state.nav = ahead(400);
        nc.step(&mut state);
        assert_eq!(state.mode, NavMode::StoppedTurning);
        assert_eq!(state.throttle, 0.0);
        assert_eq!(state.brake, 10.0);

        // Turn right, still blocked
        nc.step(&mut state);
        assert_eq!(state.mode, NavMode::StoppedTurning);
        assert_eq!(state.steer_deg, -15.0);
        assert_eq!(state.brake, 0.0);

        // Clear ahead
        state.nav = ahead(600);
        nc.step(&mut state);
        assert_eq!(state.mode, NavMode::FollowWall);
        assert_eq!(state.steer_deg, 0.0);
    }

    #[test]
    fn test_follow_wall_steering() {
        let mut nc = nav_ctrl();

        // Too far from the wall
        let mut state = follow_state();
        state.nav = corridor(2.0, 1.0);
        nc.step(&mut state);
        assert!((state.steer_deg - 5.0).abs() < 1e-9);
        assert_eq!(state.throttle, 0.2);
        assert_eq!(state.brake, 0.0);

        // Centred in a narrow corridor
        state.nav = corridor(0.5, 0.5);
        nc.step(&mut state);
        assert!(state.steer_deg.abs() < 1e-9);

        // Far too close, clipped hard right
        state.nav = corridor(0.1, 3.0);
        let rpt = nc.step(&mut state);
        assert_eq!(state.steer_deg, -15.0);
        assert!(!rpt.steer_limited);
        assert_eq!(state.mode, NavMode::FollowWall);
    }

    #[test]
    fn test_follow_wall_dead_end() {
        let mut nc = nav_ctrl();
        let mut state = follow_state();

        state.nav = ahead(100);
        nc.step(&mut state);

        assert_eq!(state.mode, NavMode::StoppedTurning);
        assert_eq!(state.brake, 10.0);
        assert_eq!(state.throttle, 0.0);
    }

    #[test]
    fn test_follow_wall_no_depth_coasts() {
        let mut nc = nav_ctrl();
        let mut state = follow_state();
        state.steer_deg = 4.0;
        state.brake = 10.0;

        // Frame rejected, angles only
        state.nav = PolarSamples::angles_only(vec![0.1; 100]);
        nc.step(&mut state);

        assert_eq!(state.mode, NavMode::FollowWall);
        assert_eq!(state.throttle, 0.2);
        assert_eq!(state.brake, 0.0);
        assert_eq!(state.steer_deg, 4.0);

        // Nothing at all
        state.nav = PolarSamples::default();
        nc.step(&mut state);
        assert_eq!(state.mode, NavMode::FollowWall);
        assert_eq!(state.steer_deg, 4.0);
    }

    #[test]
    fn test_follow_wall_holds_while_picking_up() {
        let mut nc = nav_ctrl();
        let mut state = follow_state();
        state.picking_up = true;
        state.throttle = 0.0;
        state.brake = 10.0;
        state.steer_deg = 0.0;
        state.nav = corridor(2.0, 1.0);

        nc.step(&mut state);

        assert_eq!(state.throttle, 0.0);
        assert_eq!(state.brake, 10.0);
        assert_eq!(state.steer_deg, 0.0);
    }

    #[test]
    fn test_stuck_detection_and_recovery() {
        let mut nc = nav_ctrl();
        let mut state = follow_state();
        state.vel_ms = 0.0;

        // Stationary with throttle for just under 9 s is not yet stuck
        for i in 0..90 {
            state.total_time_s = i as f64 * 0.1;
            nc.step(&mut state);
            assert_eq!(state.mode, NavMode::FollowWall);
        }
        assert_eq!(state.first_stuck_time_s, Some(0.0));

        state.total_time_s = 9.2;
        nc.step(&mut state);
        assert_eq!(state.mode, NavMode::StuckRecovery);

        // First half of the period turns, second half throttles
        state.total_time_s = 10.0;
        nc.step(&mut state);
        assert_eq!(state.steer_deg, 0.0);
        assert!((state.throttle - 0.4).abs() < 1e-12);

        state.total_time_s = 13.0;
        nc.step(&mut state);
        assert_eq!(state.steer_deg, -15.0);
        assert_eq!(state.throttle, 0.0);

        // Moving again
        state.vel_ms = 0.3;
        nc.step(&mut state);
        assert_eq!(state.mode, NavMode::FollowWall);
        assert_eq!(state.first_stuck_time_s, None);
    }

    #[test]
    fn test_stuck_timer_cleared_when_moving() {
        let mut nc = nav_ctrl();
        let mut state = follow_state();

        state.vel_ms = 0.0;
        state.total_time_s = 1.0;
        nc.step(&mut state);
        assert_eq!(state.first_stuck_time_s, Some(1.0));

        state.vel_ms = 0.5;
        state.total_time_s = 2.0;
        nc.step(&mut state);
        assert_eq!(state.first_stuck_time_s, None);
    }

    #[test]
    fn test_approach_rock_is_not_stuck_checked() {
        let mut nc = nav_ctrl();
        let mut state = RoverState {
            mode: NavMode::ApproachRock,
            prev_mode: Some(NavMode::FollowWall),
            rock: PolarSamples::from_pairs(vec![(50.0, 0.0)]),
            rock_found: true,
            first_rock_time_s: Some(0.0),
            ..Default::default()
        };

        for i in 0..150 {
            state.total_time_s = i as f64 * 0.1;
            nc.step(&mut state);
            assert_eq!(state.mode, NavMode::ApproachRock);
        }

        assert_eq!(state.first_stuck_time_s, None);
    }

    #[test]
    fn test_rock_approach_and_pickup() {
        let mut nc = nav_ctrl();
        let mut state = follow_state();
        state.total_time_s = 5.0;

        // Rock seen close by on the left
        state.rock = PolarSamples::from_pairs(vec![(100.0, 0.4), (120.0, 0.5)]);
        state.rock_found = true;
        nc.step(&mut state);

        assert_eq!(state.mode, NavMode::ApproachRock);
        assert_eq!(state.prev_mode, Some(NavMode::FollowWall));
        assert_eq!(state.first_rock_time_s, Some(5.0));
        assert_eq!(state.brake, 10.0);
        assert_eq!(state.throttle, 0.0);
        assert_eq!(state.steer_deg, 0.0);

        // Steer towards it
        state.total_time_s = 5.1;
        state.vel_ms = 0.3;
        nc.step(&mut state);
        assert!((state.steer_deg - 4.5).abs() < 1e-9);
        assert_eq!(state.throttle, 0.2);
        assert_eq!(state.brake, 0.0);

        // Too fast, pause throttle
        state.vel_ms = 0.6;
        nc.step(&mut state);
        assert_eq!(state.throttle, 0.0);

        // Near the sample but still rolling, brake
        state.near_sample = true;
        nc.step(&mut state);
        assert_eq!(state.brake, 10.0);
        assert!(!state.pickup_request);

        // Stopped, request pickup exactly once
        state.vel_ms = 0.0;
        let rpt = nc.step(&mut state);
        assert!(state.pickup_request);
        assert!(rpt.pickup_request);
        assert!(!state.rock_found);
        assert_eq!(state.mode, NavMode::FollowWall);
        assert_eq!(state.drive_dems().pickup, true);

        let mut requests = 0;
        for picking_up in [false, true, true, false] {
            state.picking_up = picking_up;
            nc.step(&mut state);
            if state.pickup_request {
                requests += 1;
            }
        }
        assert_eq!(requests, 0);

        // Moving away from the sample releases the latch
        state.near_sample = false;
        nc.step(&mut state);
        assert!(!state.pickup_latched);
    }

    #[test]
    fn test_pickup_restores_saved_mode() {
        let mut nc = nav_ctrl();
        let mut state = RoverState {
            mode: NavMode::ApproachRock,
            prev_mode: Some(NavMode::StoppedTurning),
            near_sample: true,
            vel_ms: 0.0,
            nav: ahead(100),
            ..Default::default()
        };

        nc.step(&mut state);

        assert!(state.pickup_request);
        assert_eq!(state.mode, NavMode::StoppedTurning);
        assert_eq!(state.prev_mode, None);

        // No saved mode falls back to wall following
        let mut state = RoverState {
            mode: NavMode::ApproachRock,
            near_sample: true,
            ..Default::default()
        };
        nc.step(&mut state);
        assert_eq!(state.mode, NavMode::FollowWall);
    }

    #[test]
    fn test_rock_lost() {
        let mut nc = nav_ctrl();
        let mut state = RoverState {
            mode: NavMode::ApproachRock,
            prev_mode: Some(NavMode::FollowWall),
            rock_found: true,
            first_rock_time_s: Some(0.0),
            total_time_s: 1.0,
            vel_ms: 0.3,
            ..Default::default()
        };

        nc.step(&mut state);

        assert_eq!(state.mode, NavMode::FollowWall);
        assert!(state.rock_lost);
        assert!(!state.rock_found);
        assert_eq!(state.throttle, 0.0);
        assert_eq!(state.brake, 10.0);

        // Wall following stays stopped for one cycle, then drives on
        state.nav = corridor(1.5, 1.5);
        state.total_time_s = 1.1;
        nc.step(&mut state);
        assert_eq!(state.mode, NavMode::FollowWall);
        assert!(!state.rock_lost);
        assert_eq!(state.throttle, 0.0);
        assert_eq!(state.brake, 10.0);

        state.total_time_s = 1.2;
        nc.step(&mut state);
        assert_eq!(state.throttle, 0.2);
        assert_eq!(state.brake, 0.0);
    }

    #[test]
    fn test_rock_timeout() {
        let mut nc = nav_ctrl();
        let mut state = RoverState {
            mode: NavMode::ApproachRock,
            prev_mode: Some(NavMode::FollowWall),
            rock: PolarSamples::from_pairs(vec![(150.0, 0.2)]),
            rock_found: true,
            first_rock_time_s: Some(0.0),
            total_time_s: 20.5,
            vel_ms: 0.3,
            ..Default::default()
        };

        nc.step(&mut state);

        assert_eq!(state.mode, NavMode::FollowWall);
        assert!(!state.rock_found);
        assert!(!state.rock_lost);
        assert_eq!(state.rock_ignore_until_s, Some(35.5));

        // The same rock is ignored until the cooldown is over
        state.total_time_s = 30.0;
        state.rock_found = true;
        nc.step(&mut state);
        assert_eq!(state.mode, NavMode::FollowWall);

        state.total_time_s = 36.0;
        state.rock_found = true;
        nc.step(&mut state);
        assert_eq!(state.mode, NavMode::ApproachRock);
        assert_eq!(state.first_rock_time_s, Some(36.0));
        assert_eq!(state.rock_ignore_until_s, None);
    }

    #[test]
    fn test_blocked_rock_ends_in_stuck_recovery() {
        let mut nc = nav_ctrl();
        let mut state = follow_state();
        state.vel_ms = 0.0;

        let mut approaches = 0;
        for i in 0..1200 {
            // Perception sees the rock every cycle
            state.rock = PolarSamples::from_pairs(vec![(100.0, 0.2)]);
            state.rock_found = true;
            state.total_time_s = i as f64 * 0.1;

            let rpt = nc.step(&mut state);
            if rpt.mode_in != NavMode::ApproachRock && rpt.mode_out == NavMode::ApproachRock {
                approaches += 1;
            }
        }

        assert_eq!(approaches, 1);
        assert_eq!(state.mode, NavMode::StuckRecovery);
        assert_eq!(state.prev_mode, Some(NavMode::FollowWall));
    }

    #[test]
    fn test_pickup_during_stuck_recovery() {
        let mut nc = nav_ctrl();
        let mut state = follow_state();
        state.mode = NavMode::StuckRecovery;
        state.prev_mode = Some(NavMode::FollowWall);
        state.first_stuck_time_s = Some(0.0);
        state.vel_ms = 0.0;
        state.near_sample = true;
        state.total_time_s = 11.0;

        nc.step(&mut state);

        assert!(state.pickup_request);
        assert_eq!(state.mode, NavMode::FollowWall);
        assert_eq!(state.first_stuck_time_s, None);
        assert_eq!(state.throttle, 0.0);
        assert_eq!(state.brake, 10.0);

        // Held stopped for the whole pickup
        state.picking_up = true;
        for i in 1..150 {
            state.total_time_s = 11.0 + i as f64 * 0.1;
            nc.step(&mut state);

            assert_eq!(state.mode, NavMode::FollowWall);
            assert_eq!(state.throttle, 0.0);
            assert!(!state.pickup_request);
        }
    }

    #[test]
    fn test_no_pickup_while_picking_up() {
        let mut nc = nav_ctrl();
        let mut state = RoverState {
            mode: NavMode::ApproachRock,
            prev_mode: Some(NavMode::FollowWall),
            rock: PolarSamples::from_pairs(vec![(20.0, 0.0)]),
            rock_found: true,
            first_rock_time_s: Some(0.0),
            near_sample: true,
            picking_up: true,
            vel_ms: 0.0,
            total_time_s: 3.0,
            ..Default::default()
        };

        let rpt = nc.step(&mut state);

        assert!(!state.pickup_latched);
        assert!(!state.pickup_request);
        assert!(!rpt.pickup_request);
        assert_eq!(state.mode, NavMode::ApproachRock);
        assert_eq!(state.prev_mode, Some(NavMode::FollowWall));

        // Pickup finished without a request from us, now one is made
        state.picking_up = false;
        nc.step(&mut state);
        assert!(state.pickup_request);
        assert_eq!(state.mode, NavMode::FollowWall);
    }

    #[test]
    fn test_steer_always_in_range() {
        let mut nc = nav_ctrl();

        let rocks = [
            PolarSamples::from_pairs(vec![(50.0, 3.0)]),
            PolarSamples::from_pairs(vec![(50.0, -3.0)]),
        ];

        for rock in rocks.iter() {
            let mut state = RoverState {
                mode: NavMode::ApproachRock,
                rock: rock.clone(),
                rock_found: true,
                first_rock_time_s: Some(0.0),
                ..Default::default()
            };

            let rpt = nc.step(&mut state);
            assert!(state.steer_deg >= -15.0 && state.steer_deg <= 15.0);
            assert!(!rpt.steer_limited);
        }

        let mut state = follow_state();
        for (l, r) in [(0.0, 0.0), (100.0, 0.0), (0.0, 100.0), (1e6, 1e6)] {
            state.nav = corridor(l, r);
            nc.step(&mut state);
            assert!(state.steer_deg >= -15.0 && state.steer_deg <= 10.0);
        }
    }

    #[test]
    fn test_deterministic_replay() {
        let ticks: Vec<(PolarSamples, f64)> = (0..200)
            .map(|i| {
                let count = match i % 40 {
                    0..=9 => 3000,
                    10..=19 => 1500,
                    20..=24 => 200,
                    _ => 800,
                };
                (ahead(count), if i % 7 == 0 { 0.0 } else { 0.5 })
            })
            .collect();

        let run = || {
            let mut nc = nav_ctrl();
            let mut state = RoverState::new();

            ticks
                .iter()
                .enumerate()
                .map(|(i, (nav, vel))| {
                    state.nav = nav.clone();
                    state.vel_ms = *vel;
                    state.total_time_s = i as f64 * 0.1;
                    nc.step(&mut state).mode_out
                })
                .collect::<Vec<_>>()
        };

        let first = run();
        assert_eq!(first, run());
        assert!(first.iter().any(|m| *m != NavMode::RotateToWall));
    }
}
