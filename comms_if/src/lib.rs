//! # Communications interface crate.
//!
//! Provides the plain data structures exchanged between the rover autonomy and its collaborators
//! (the simulator or hardware), once per cycle.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Data definitions for equipment (camera, drive actuators, telemetry)
pub mod eqpt;
