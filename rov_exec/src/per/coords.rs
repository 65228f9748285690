//! # Coordinate conversions
//!
//! Rectified image pixels to rover-centred coordinates, and rover-centred coordinates to world
//! map cells.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use ndarray::Array2;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The rover pose needed to place rover-centred points into the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldPose {
    /// Position of the rover in world units
    pub position: [f64; 2],

    /// Heading of the rover
    ///
    /// Units: degrees
    pub yaw_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert every set pixel of a mask into rover-centred coordinates.
///
/// The rover sits at the bottom centre of the image with x pointing up the image (forward) and y
/// pointing left. Returns `(x, y)` in pixels, in row-major order.
pub fn rover_coords(mask: &Array2<bool>) -> (Vec<f64>, Vec<f64>) {
    let (rows, cols) = mask.dim();
    let rows = rows as f64;
    let half_cols = cols as f64 / 2.0;

    mask.indexed_iter()
        .filter(|(_, set)| **set)
        .map(|((row, col), _)| (rows - row as f64, half_cols - col as f64))
        .unzip()
}

/// Project rover-centred pixel coordinates into world map cells.
///
/// Points are rotated by the rover yaw, scaled from pixels into world units, translated by the
/// rover position, truncated, and clamped into `[0, world_size - 1]`. Returns `(x, y)` cell
/// indices.
pub fn pix_to_world(
    x_px: &[f64],
    y_px: &[f64],
    pose: &WorldPose,
    world_size: usize,
    scale_px_per_cell: f64,
) -> (Vec<usize>, Vec<usize>) {
    let (sin, cos) = pose.yaw_deg.to_radians().sin_cos();
    let max_idx = world_size.saturating_sub(1) as i64;

    x_px.iter()
        .zip(y_px.iter())
        .map(|(&x, &y)| {
            let x_rot = x * cos - y * sin;
            let y_rot = x * sin + y * cos;

            let x_world = x_rot / scale_px_per_cell + pose.position[0];
            let y_world = y_rot / scale_px_per_cell + pose.position[1];

            (
                clamp_cell(x_world, max_idx),
                clamp_cell(y_world, max_idx),
            )
        })
        .unzip()
}

/// Truncate towards zero then clamp into the grid.
fn clamp_cell(value: f64, max_idx: i64) -> usize {
    // NaN casts to 0
    (value as i64).clamp(0, max_idx) as usize
}
