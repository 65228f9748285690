//! # Map
//!
//! This module implements the persistent [`WorldMap`], a fixed size grid of evidence
//! accumulators filled in by perception every cycle.

// ------------------------------------------------------------------------------------------------
// MODS
// ------------------------------------------------------------------------------------------------

/// Implements the [`WorldMap`] type
mod world_map;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use world_map::{MapCoverage, WorldMap, WorldMapError, WorldMapLayer, WorldMapParams};
