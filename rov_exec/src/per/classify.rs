//! # Pixel classification
//!
//! Colour thresholding of the rectified image into navigable terrain, obstacle and rock masks.
//! All masks are indexed `[row, col]`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::{Rgb, RgbImage};
use ndarray::{Array2, Zip};
use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Lower bound threshold: a pixel passes if every channel is strictly above the matching value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ColourThresh(pub [u8; 3]);

/// Inclusive RGB range: a pixel passes if every channel lies within `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RgbRange {
    pub min: [u8; 3],
    pub max: [u8; 3],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ColourThresh {
    /// A threshold no pixel can pass.
    pub fn saturated() -> Self {
        Self([u8::MAX; 3])
    }

    pub fn passes(&self, pixel: &Rgb<u8>) -> bool {
        pixel.0.iter().zip(self.0.iter()).all(|(p, t)| p > t)
    }
}

impl RgbRange {
    pub fn contains(&self, pixel: &Rgb<u8>) -> bool {
        pixel
            .0
            .iter()
            .zip(self.min.iter().zip(self.max.iter()))
            .all(|(p, (lo, hi))| p >= lo && p <= hi)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Mask of navigable terrain pixels.
pub fn nav_mask(image: &RgbImage, thresh: &ColourThresh) -> Array2<bool> {
    mask_from_fn(image, |p| thresh.passes(p))
}

/// Mask of rock pixels, independent of the terrain classification.
pub fn rock_mask(image: &RgbImage, range: &RgbRange) -> Array2<bool> {
    mask_from_fn(image, |p| range.contains(p))
}

/// Obstacle mask: every pixel the camera saw which is not navigable.
pub fn obstacle_mask(nav: &Array2<bool>, in_view: &Array2<bool>) -> Array2<bool> {
    Zip::from(nav)
        .and(in_view)
        .map_collect(|&n, &v| v && !n)
}

fn mask_from_fn<F: Fn(&Rgb<u8>) -> bool>(image: &RgbImage, f: F) -> Array2<bool> {
    let (width, height) = image.dimensions();

    Array2::from_shape_fn((height as usize, width as usize), |(row, col)| {
        f(image.get_pixel(col as u32, row as u32))
    })
}

#[cfg(test)]
mod test {
    use super::*;

    const NAV_THRESH: ColourThresh = ColourThresh([137, 175, 134]);

    const ROCK_RANGE: RgbRange = RgbRange {
        min: [110, 110, 0],
        max: [255, 255, 50],
    };

    #[test]
    fn test_thresholds() {
        // Bright sand
        assert!(NAV_THRESH.passes(&Rgb([200, 190, 180])));
        // Threshold is strict
        assert!(!NAV_THRESH.passes(&Rgb([137, 190, 180])));
        // Dark rock wall
        assert!(!NAV_THRESH.passes(&Rgb([90, 80, 70])));
        // Nothing passes the saturated threshold
        assert!(!ColourThresh::saturated().passes(&Rgb([255, 255, 255])));

        // Golden sample rock, but not sand or black
        assert!(ROCK_RANGE.contains(&Rgb([180, 150, 20])));
        assert!(!ROCK_RANGE.contains(&Rgb([200, 190, 180])));
        assert!(!ROCK_RANGE.contains(&Rgb([0, 0, 0])));
    }

    #[test]
    fn test_masks() {
        // Left half sand, right half wall
        let img = RgbImage::from_fn(4, 2, |x, _| {
            if x < 2 { Rgb([200, 190, 180]) } else { Rgb([90, 80, 70]) }
        });

        let nav = nav_mask(&img, &NAV_THRESH);
        assert_eq!(nav.shape(), &[2, 4]);
        assert!(nav[[0, 0]] && nav[[1, 1]]);
        assert!(!nav[[0, 2]] && !nav[[1, 3]]);

        // Column 3 not in view, so not an obstacle either
        let mut in_view = Array2::from_elem((2, 4), true);
        in_view[[0, 3]] = false;
        in_view[[1, 3]] = false;

        let obs = obstacle_mask(&nav, &in_view);
        assert!(!obs[[0, 0]]);
        assert!(obs[[0, 2]] && obs[[1, 2]]);
        assert!(!obs[[0, 3]]);
    }
}
