//! Parameters structure for PerMgr

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::{ColourThresh, PerError, RgbRange};
use crate::map::WorldMapParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the perception manager.
#[derive(Debug, Clone, Deserialize)]
pub struct PerMgrParams {

    // ---- CAMERA ----

    /// Expected size of camera frames as `[width, height]`.
    ///
    /// Units: pixels
    pub frame_size_px: [u32; 2],

    /// Corners of a ground square as seen in the camera image, `[x, y]`, ordered bottom left,
    /// bottom right, top right, top left.
    ///
    /// Units: pixels
    pub src_points_px: [[f64; 2]; 4],

    /// Half the side length of the ground square in the rectified image. Twice this is the
    /// number of rectified pixels per world map cell.
    ///
    /// Units: pixels
    pub dst_size_px: f64,

    /// Distance between the bottom of the rectified image and the bottom of the ground square.
    ///
    /// Units: pixels
    pub bottom_offset_px: f64,

    /// Number of rows at the top of the rectified image which are always blanked.
    pub sky_rows: u32,

    // ---- FRAME QUALITY ----

    /// Frames taken with a pitch larger than this are not used for navigation.
    ///
    /// Units: degrees
    pub pitch_limit_deg: f64,

    /// Map updates made with a roll larger than this use the tilted weight.
    ///
    /// Units: degrees
    pub roll_limit_deg: f64,

    // ---- CLASSIFICATION ----

    /// Navigable terrain threshold, all channels must be strictly above.
    pub nav_thresh: ColourThresh,

    /// Inclusive colour range of sample rocks.
    pub rock_range: RgbRange,

    /// Minimum number of rock pixels for a rock to be considered found.
    pub min_rock_px: usize,

    // ---- MAPPING ----

    /// Weight added to the map per pixel when the rover is level.
    pub map_weight_level: u32,

    /// Weight added to the map per pixel when the rover is tilted.
    pub map_weight_tilted: u32,

    /// World map parameters
    pub world_map: WorldMapParams,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl PerMgrParams {
    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), PerError> {
        let [width, height] = self.frame_size_px;

        if width == 0 || height == 0 {
            return Err(PerError::InvalidParams(format!(
                "frame size must be non-zero, got {}x{}",
                width, height
            )));
        }

        if !(self.dst_size_px > 0.0) {
            return Err(PerError::InvalidParams(format!(
                "dst_size_px must be positive, got {}",
                self.dst_size_px
            )));
        }

        if !(self.bottom_offset_px >= 0.0)
            || self.bottom_offset_px + 2.0 * self.dst_size_px > height as f64
        {
            return Err(PerError::InvalidParams(format!(
                "destination square (offset {}, size {}) does not fit in a frame {} px high",
                self.bottom_offset_px,
                2.0 * self.dst_size_px,
                height
            )));
        }

        if !(self.pitch_limit_deg >= 0.0) || !(self.roll_limit_deg >= 0.0) {
            return Err(PerError::InvalidParams(String::from(
                "attitude limits must be non-negative",
            )));
        }

        if self.rock_range.min.iter().zip(self.rock_range.max.iter()).any(|(lo, hi)| lo > hi) {
            return Err(PerError::InvalidParams(format!(
                "rock range min {:?} exceeds max {:?}",
                self.rock_range.min, self.rock_range.max
            )));
        }

        if self.world_map.size_cells == 0 {
            return Err(PerError::InvalidParams(String::from(
                "world map must have at least one cell",
            )));
        }

        Ok(())
    }

    /// Number of rectified pixels per world map cell.
    pub fn scale_px_per_cell(&self) -> f64 {
        2.0 * self.dst_size_px
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_shipped_params() {
        let params: PerMgrParams =
            util::params::load_str(include_str!("../../../params/per.toml")).unwrap();

        assert!(params.validate().is_ok());
        assert_eq!(params.frame_size_px, [320, 160]);
        assert_eq!(params.nav_thresh, ColourThresh([137, 175, 134]));
        assert_eq!(params.scale_px_per_cell(), 10.0);
        assert_eq!(params.world_map.size_cells, 200);
    }

    #[test]
    fn test_invalid_params() {
        let mut params: PerMgrParams =
            util::params::load_str(include_str!("../../../params/per.toml")).unwrap();

        params.dst_size_px = 0.0;
        assert!(matches!(params.validate(), Err(PerError::InvalidParams(_))));

        params.dst_size_px = 5.0;
        params.rock_range.min = [200, 0, 0];
        params.rock_range.max = [100, 255, 255];
        assert!(matches!(params.validate(), Err(PerError::InvalidParams(_))));
    }
}
