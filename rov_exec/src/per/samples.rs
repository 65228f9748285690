//! # Polar samples
//!
//! Rover-centred `(distance, angle)` samples, one per classified pixel.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Ordered sequence of rover-centred polar samples.
///
/// Distances and angles are stored as two parallel sequences. Normally they have the same length,
/// but a sample set rebuilt from cached angles after a rejected frame carries angles only, see
/// [`PolarSamples::angles_only`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PolarSamples {
    /// Distance of each sample from the rover.
    ///
    /// Units: pixels of the rectified image
    pub dists_px: Vec<f64>,

    /// Angle of each sample from the rover's forward axis, positive to the left.
    ///
    /// Units: radians
    pub angles_rad: Vec<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PolarSamples {
    /// Convert rover-frame cartesian pixel coordinates into polar samples.
    pub fn from_rover_coords(x_px: &[f64], y_px: &[f64]) -> Self {
        let (dists_px, angles_rad) = x_px
            .iter()
            .zip(y_px.iter())
            .map(|(&x, &y)| to_polar(x, y))
            .unzip();

        Self { dists_px, angles_rad }
    }

    /// Build samples from `(distance, angle)` pairs.
    pub fn from_pairs<I: IntoIterator<Item = (f64, f64)>>(pairs: I) -> Self {
        let (dists_px, angles_rad) = pairs.into_iter().unzip();

        Self { dists_px, angles_rad }
    }

    /// Build a sample set which only carries angles, with no depth information.
    pub fn angles_only(angles_rad: Vec<f64>) -> Self {
        Self {
            dists_px: Vec::new(),
            angles_rad,
        }
    }

    /// Number of samples, as used by the stop/go thresholds.
    pub fn count(&self) -> usize {
        self.angles_rad.len()
    }

    /// True if there are no samples at all.
    pub fn is_empty(&self) -> bool {
        self.angles_rad.is_empty()
    }

    /// True if both distances and angles are available.
    pub fn has_depth(&self) -> bool {
        !self.dists_px.is_empty() && !self.angles_rad.is_empty()
    }

    /// Iterate over the `(distance, angle)` pairs. Yields nothing for angle-only samples.
    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.dists_px
            .iter()
            .copied()
            .zip(self.angles_rad.iter().copied())
    }

    /// Mean distance of the samples, `None` if there are no distances.
    pub fn mean_dist_px(&self) -> Option<f64> {
        util::maths::mean(self.dists_px.iter().copied())
    }

    /// Mean angle of the samples, `None` if there are no angles.
    pub fn mean_angle_rad(&self) -> Option<f64> {
        util::maths::mean(self.angles_rad.iter().copied())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert a rover-frame point to `(distance, angle)`.
pub fn to_polar(x_px: f64, y_px: f64) -> (f64, f64) {
    (x_px.hypot(y_px), y_px.atan2(x_px))
}
