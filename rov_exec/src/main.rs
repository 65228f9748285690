//! Main rover-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop, one cycle per recorded frame:
//!         - Telemetry input acquisition
//!         - Camera frame decoding
//!         - Perception processing
//!         - Navigation control processing
//!         - Archiving
//!     - Export the world map
//!
//! # Usage
//!
//! `rov_exec [DATASET_DIR]`, where the optional argument overrides the dataset directory set in
//! `replay.toml`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, trace, warn};
use std::{env, path::PathBuf};

// Internal
use rov_lib::{
    data_store::RoverState,
    nav_ctrl::{NavCtrl, NavCtrlParams},
    per::{PerError, PerMgr, PerMgrParams},
    replay::{Replay, ReplayParams},
};
use util::{
    archive::{Archived, Archiver},
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("rov_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Rover Autonomy Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let per_params: PerMgrParams =
        util::params::load("per.toml").wrap_err("Could not load perception params")?;
    let nav_ctrl_params: NavCtrlParams =
        util::params::load("nav_ctrl.toml").wrap_err("Could not load navigation params")?;
    let replay_params: ReplayParams =
        util::params::load("replay.toml").wrap_err("Could not load replay params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE DATA SOURCE ----

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    let dataset_dir = match args.len() {
        1 => replay_params.dataset_dir.clone(),
        2 => PathBuf::from(&args[1]),
        n => return Err(eyre!("Expected zero or one argument, found {}", n - 1)),
    };

    let dataset_dir = if dataset_dir.is_relative() {
        host::get_sw_root()
            .wrap_err("Cannot resolve the dataset directory")?
            .join(dataset_dir)
    } else {
        dataset_dir
    };

    info!("Replaying dataset from {:?}", dataset_dir);

    let replay = Replay::open(&dataset_dir, replay_params.cycle_period_s)
        .wrap_err("Failed to open the replay dataset")?;

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut state = RoverState::new();

    let mut per_mgr = PerMgr::new(per_params).wrap_err("Failed to initialise PerMgr")?;
    info!("PerMgr init complete");

    let mut nav_ctrl = NavCtrl::with_archive(nav_ctrl_params, &session)
        .wrap_err("Failed to initialise NavCtrl")?;
    info!("NavCtrl init complete");

    let mut arch_state = Archiver::from_path(&session, "rover_state.csv")
        .wrap_err("Failed to create the rover state archive")?;

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Beginning main loop\n");

    let max_cycles = replay_params.max_cycles.unwrap_or(u64::MAX);
    let mut num_skipped: u64 = 0;

    for tick in replay.take(max_cycles as usize) {
        let tick = tick.wrap_err("Failed to read the next replay cycle")?;

        // ---- DATA INPUT ----

        state.cycle_start(&tick.telem);

        let image = match tick.frame.to_cam_image() {
            Ok(i) => i.image,
            Err(e) => {
                warn!("Could not decode camera frame, cycle skipped: {}", e);
                num_skipped += 1;
                continue;
            }
        };

        // ---- PERCEPTION ----

        match per_mgr.process(&image, &mut state) {
            Ok(_) => (),
            Err(e @ PerError::FrameSizeMismatch { .. }) => {
                warn!("{}, cycle skipped", e);
                num_skipped += 1;
                continue;
            }
            Err(e) => return Err(e).wrap_err("Perception processing failed"),
        }

        // ---- NAVIGATION CONTROL ----

        nav_ctrl.step(&mut state);

        trace!(
            "Cycle {}: demands {:?}, recorded {:?}",
            state.num_cycles,
            state.drive_dems(),
            tick.recorded_dems
        );

        // ---- ARCHIVING ----

        nav_ctrl.write().wrap_err("Failed to archive NavCtrl")?;
        arch_state
            .serialise(state.record())
            .wrap_err("Failed to archive the rover state")?;
    }

    info!(
        "End of dataset reached after {} cycles ({} skipped)",
        state.num_cycles, num_skipped
    );

    // ---- EXPORT ----

    let world_map = per_mgr.world_map();
    let coverage = world_map.coverage();
    info!("World map coverage: {:?}", coverage);

    world_map
        .to_rgb_image()
        .save(session.path("world_map.png"))
        .wrap_err("Failed to save the world map image")?;
    world_map
        .save(session.path("world_map.json"))
        .wrap_err("Failed to save the world map")?;
    session
        .save("world_map_coverage.json", &coverage)
        .wrap_err("Failed to save the world map coverage")?;

    info!("World map exported to {:?}", session.session_root);

    Ok(())
}
