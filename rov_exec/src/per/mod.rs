//! # Perception module
//!
//! Converts forward camera images into rover-centred navigation samples and accumulates the
//! persistent world map.
//!
//! Procedure for each frame:
//!  - Rectify the image into a top-down view of the ground
//!  - Threshold into navigable, obstacle and rock masks, rejecting navigation if the rover is
//!    pitched too far for the rectification to hold
//!  - Convert the masks to rover-centred coordinates, then into world cells which are added to
//!    the map
//!  - Convert to polar samples for navigation control

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

mod classify;
mod coords;
mod params;
mod rectify;
mod samples;

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::RgbImage;
use log::{debug, trace, warn};
use serde::Serialize;
use util::maths::wrap_deg_180;

use crate::{
    data_store::RoverState,
    map::{WorldMap, WorldMapError, WorldMapLayer},
};

pub use classify::*;
pub use coords::*;
pub use params::*;
pub use rectify::*;
pub use samples::*;

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// Manages the perception algorithm.
#[derive(Debug, Clone)]
pub struct PerMgr {
    params: PerMgrParams,

    transform: PerspectiveTransform,

    world_map: WorldMap,
}

/// Summary of a single processed frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PerReport {
    /// True if the frame was rejected for navigation due to the rover's pitch
    pub frame_gated: bool,

    /// Weight added to the world map for each classified pixel
    pub map_weight: u32,

    pub num_nav_px: usize,
    pub num_obs_px: usize,
    pub num_rock_px: usize,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PerError {
    #[error("The perspective transform points are degenerate")]
    DegenerateTransform,

    #[error("Expected a {expected:?} px frame but got {actual:?} px")]
    FrameSizeMismatch {
        expected: [u32; 2],
        actual: [u32; 2],
    },

    #[error("Invalid perception parameters: {0}")]
    InvalidParams(String),

    #[error("World map error: {0}")]
    WorldMap(#[from] WorldMapError),
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl PerMgr {
    /// Create a new perception manager with an empty world map.
    pub fn new(params: PerMgrParams) -> Result<Self, PerError> {
        params.validate()?;

        let [width, height] = params.frame_size_px;
        let dst = dst_square(width, height, params.dst_size_px, params.bottom_offset_px);
        let transform = PerspectiveTransform::from_points(&params.src_points_px, &dst)?;

        let world_map = WorldMap::new(&params.world_map)?;

        Ok(Self {
            params,
            transform,
            world_map,
        })
    }

    /// Process a single camera frame taken at the pose held in `state`.
    ///
    /// Writes the navigation and rock samples and the rock found flag into the state, and
    /// accumulates the classified pixels into the world map.
    pub fn process(
        &mut self,
        image: &RgbImage,
        state: &mut RoverState,
    ) -> Result<PerReport, PerError> {
        let (width, height) = image.dimensions();
        if [width, height] != self.params.frame_size_px {
            return Err(PerError::FrameSizeMismatch {
                expected: self.params.frame_size_px,
                actual: [width, height],
            });
        }

        // ---- RECTIFICATION ----

        let rect = self.transform.warp(image, self.params.sky_rows);

        // ---- CLASSIFICATION ----

        let frame_gated = wrap_deg_180(state.pitch_deg).abs() > self.params.pitch_limit_deg;
        let nav_thresh = if frame_gated {
            warn!(
                "Pitch of {:.2} deg exceeds limit, frame not used for navigation",
                wrap_deg_180(state.pitch_deg)
            );
            ColourThresh::saturated()
        } else {
            self.params.nav_thresh
        };

        let nav_mask = nav_mask(&rect.image, &nav_thresh);
        let obs_mask = obstacle_mask(&nav_mask, &rect.in_view);
        let rock_mask = rock_mask(&rect.image, &self.params.rock_range);

        // ---- COORDINATES ----

        let (nav_x, nav_y) = rover_coords(&nav_mask);
        let (obs_x, obs_y) = rover_coords(&obs_mask);
        let (rock_x, rock_y) = rover_coords(&rock_mask);

        // ---- MAPPING ----

        let map_weight = if wrap_deg_180(state.roll_deg).abs() <= self.params.roll_limit_deg {
            self.params.map_weight_level
        } else {
            self.params.map_weight_tilted
        };

        let pose = WorldPose {
            position: state.position,
            yaw_deg: state.yaw_deg,
        };

        for (layer, x_px, y_px) in [
            (WorldMapLayer::Navigable, &nav_x, &nav_y),
            (WorldMapLayer::Obstacle, &obs_x, &obs_y),
            (WorldMapLayer::Rock, &rock_x, &rock_y),
        ] {
            let (x_cells, y_cells) = pix_to_world(
                x_px,
                y_px,
                &pose,
                self.world_map.size(),
                self.params.scale_px_per_cell(),
            );

            self.world_map.accumulate(layer, &x_cells, &y_cells, map_weight)?;
        }

        // ---- OUTPUT ----

        let nav = PolarSamples::from_rover_coords(&nav_x, &nav_y);

        state.nav = if frame_gated {
            PolarSamples::angles_only(state.prev_nav_angles.clone())
        } else {
            state.prev_nav_angles = nav.angles_rad.clone();
            nav
        };

        state.rock = PolarSamples::from_rover_coords(&rock_x, &rock_y);
        state.rock_found = !state.rock.is_empty() && state.rock.count() >= self.params.min_rock_px;

        let report = PerReport {
            frame_gated,
            map_weight,
            num_nav_px: nav_x.len(),
            num_obs_px: obs_x.len(),
            num_rock_px: rock_x.len(),
        };

        trace!("{:?}", report);
        debug!(
            "Per: {} nav samples, {} rock samples, rock found: {}",
            state.nav.count(),
            state.rock.count(),
            state.rock_found
        );

        Ok(report)
    }

    /// The accumulated world map.
    pub fn world_map(&self) -> &WorldMap {
        &self.world_map
    }

    pub fn params(&self) -> &PerMgrParams {
        &self.params
    }
}
