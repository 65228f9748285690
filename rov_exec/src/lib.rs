//! # Rover library.
//!
//! This library allows other crates in the workspace to access items defined inside the rover
//! crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Rover state - the record passed between the autonomy modules each cycle
pub mod data_store;

/// World map - persistent grid of terrain evidence
pub mod map;

/// Navigation control module - converts perception output into drive demands
pub mod nav_ctrl;

/// Perception module - converts camera images into navigation samples and map updates
pub mod per;

/// Log replay - provides telemetry and camera frames from a recorded dataset
pub mod replay;
