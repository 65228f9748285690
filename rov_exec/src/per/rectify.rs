//! # Perspective rectification
//!
//! Warps the forward camera image into a top-down view of the ground in front of the rover.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::{Rgb, RgbImage};
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};
use ndarray::Array2;

use super::PerError;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Homogeneous coordinates with a smaller scale than this are considered at infinity.
const MIN_HOMOGENEOUS_SCALE: f64 = 1e-9;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A four point perspective transform (homography) between the camera image plane and the
/// top-down view.
#[derive(Debug, Clone)]
pub struct PerspectiveTransform {
    /// Camera image to top-down view
    cam_to_top: Matrix3<f64>,

    /// Top-down view to camera image, used to warp by inverse mapping
    top_to_cam: Matrix3<f64>,
}

/// The result of rectifying a single frame.
#[derive(Debug, Clone)]
pub struct Rectified {
    /// The top-down image, same resolution as the camera image
    pub image: RgbImage,

    /// Mask of pixels in the top-down image which were actually seen by the camera, and are not
    /// in the blanked sky band. Indexed `[row, col]`.
    pub in_view: Array2<bool>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PerspectiveTransform {
    /// Solve the transform mapping each `src` point onto the matching `dst` point.
    ///
    /// Points are `[x, y]` in pixels, i.e. `[col, row]`.
    pub fn from_points(src: &[[f64; 2]; 4], dst: &[[f64; 2]; 4]) -> Result<Self, PerError> {
        // Standard 8 unknown formulation with h33 fixed to 1:
        //   u = (h11 x + h12 y + h13) / (h31 x + h32 y + 1)
        //   v = (h21 x + h22 y + h23) / (h31 x + h32 y + 1)
        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();

        for (i, (s, d)) in src.iter().zip(dst.iter()).enumerate() {
            let (x, y) = (s[0], s[1]);
            let (u, v) = (d[0], d[1]);

            let r = 2 * i;
            a[(r, 0)] = x;
            a[(r, 1)] = y;
            a[(r, 2)] = 1.0;
            a[(r, 6)] = -u * x;
            a[(r, 7)] = -u * y;
            b[r] = u;

            a[(r + 1, 3)] = x;
            a[(r + 1, 4)] = y;
            a[(r + 1, 5)] = 1.0;
            a[(r + 1, 6)] = -v * x;
            a[(r + 1, 7)] = -v * y;
            b[r + 1] = v;
        }

        let h = a.lu().solve(&b).ok_or(PerError::DegenerateTransform)?;

        let cam_to_top = Matrix3::new(
            h[0], h[1], h[2],
            h[3], h[4], h[5],
            h[6], h[7], 1.0,
        );

        let top_to_cam = cam_to_top
            .try_inverse()
            .ok_or(PerError::DegenerateTransform)?;

        Ok(Self {
            cam_to_top,
            top_to_cam,
        })
    }

    /// Map a camera image point into the top-down view.
    pub fn cam_to_top(&self, point: [f64; 2]) -> Option<[f64; 2]> {
        project(&self.cam_to_top, point)
    }

    /// Map a top-down view point back into the camera image.
    pub fn top_to_cam(&self, point: [f64; 2]) -> Option<[f64; 2]> {
        project(&self.top_to_cam, point)
    }

    /// Warp a camera image into the top-down view at the same resolution.
    ///
    /// The first `sky_rows` rows of the output are blanked, as is any pixel whose source falls
    /// outside the camera image.
    pub fn warp(&self, image: &RgbImage, sky_rows: u32) -> Rectified {
        let (width, height) = image.dimensions();

        let mut out = RgbImage::new(width, height);
        let mut in_view = Array2::from_elem((height as usize, width as usize), false);

        for row in sky_rows.min(height)..height {
            for col in 0..width {
                let src = match self.top_to_cam([col as f64, row as f64]) {
                    Some(s) => s,
                    None => continue,
                };

                // Nearest neighbour sampling
                let (src_col, src_row) = (src[0].round(), src[1].round());
                if src_col < 0.0
                    || src_row < 0.0
                    || src_col >= width as f64
                    || src_row >= height as f64
                {
                    continue;
                }

                let pixel: Rgb<u8> = *image.get_pixel(src_col as u32, src_row as u32);
                out.put_pixel(col, row, pixel);
                in_view[[row as usize, col as usize]] = true;
            }
        }

        Rectified {
            image: out,
            in_view,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Destination square for the rectification: a `2 * dst_size` pixel square centred horizontally,
/// `bottom_offset` pixels above the bottom of the image. Ordered to match the source points
/// (bottom left, bottom right, top right, top left).
pub fn dst_square(width: u32, height: u32, dst_size_px: f64, bottom_offset_px: f64) -> [[f64; 2]; 4] {
    let cx = width as f64 / 2.0;
    let bottom = height as f64 - bottom_offset_px;
    let top = bottom - 2.0 * dst_size_px;

    [
        [cx - dst_size_px, bottom],
        [cx + dst_size_px, bottom],
        [cx + dst_size_px, top],
        [cx - dst_size_px, top],
    ]
}

fn project(m: &Matrix3<f64>, point: [f64; 2]) -> Option<[f64; 2]> {
    let p = m * Vector3::new(point[0], point[1], 1.0);

    if p.z.abs() < MIN_HOMOGENEOUS_SCALE {
        return None;
    }

    Some([p.x / p.z, p.y / p.z])
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
