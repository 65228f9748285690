//! # Equipment Interface
//!
//! This module defines the interface structures exchanged with the equipment every cycle.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod cam;
pub mod drive;
pub mod telem;
