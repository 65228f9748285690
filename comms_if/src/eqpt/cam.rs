//! # Camera Equipment Communications Module

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};
use std::{io::Cursor, path::Path};
use chrono::{DateTime, Utc, serde::ts_milliseconds};
use image::{DynamicImage, ImageResult, RgbImage};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An encoded frame from the forward camera, as delivered by the collaborator
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CamFrame {

    /// UTC timestamp at which the frame was acquired
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// The format of this frame
    pub format: ImageFormat,

    /// The formatted image data
    pub data: Vec<u8>
}

/// A decoded RGB frame ready for perception
#[derive(Debug, Clone)]
pub struct CamImage {
    /// UTC timestamp at which the frame was acquired
    pub timestamp: DateTime<Utc>,

    /// The image itself
    pub image: RgbImage
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Possible formats for camera images. This is used rather than image::ImageFormat to:
///     1. Restrict the formats that can be sent back and forth
///     2. Allow serialisation as image::ImageFormat does not implement serde.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG image
    Png,

    /// JPEG image with a quality value between 1 and 100, where 100 is best.
    Jpeg(u8)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ImageFormat {
    /// Guess the format of an image file from its extension. Returns `None` for unsupported
    /// extensions.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();

        match ext.as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg(100)),
            _ => None
        }
    }
}

impl CamFrame {
    /// Convert this camera frame into a camera image
    pub fn to_cam_image(&self) -> ImageResult<CamImage>  {
        let format = match self.format {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg(_) => image::ImageFormat::Jpeg
        };

        let image = image::load_from_memory_with_format(&self.data, format)?.to_rgb8();

        Ok(CamImage {
            timestamp: self.timestamp,
            image
        })
    }
}

impl CamImage {
    /// Convert this camera image into a camera frame with the given format
    pub fn to_cam_frame(&self, format: ImageFormat) -> ImageResult<CamFrame> {
        let mut data = Cursor::new(Vec::<u8>::new());

        let output_format = match format {
            ImageFormat::Png =>
                image::ImageOutputFormat::Png,
            ImageFormat::Jpeg(q) =>
                image::ImageOutputFormat::Jpeg(q)
        };

        DynamicImage::ImageRgb8(self.image.clone()).write_to(&mut data, output_format)?;

        Ok(CamFrame {
            timestamp: self.timestamp,
            format,
            data: data.into_inner()
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_png_frame_round_trip() {
        let img = CamImage {
            timestamp: Utc::now(),
            image: RgbImage::from_fn(8, 4, |x, y| Rgb([x as u8 * 10, y as u8 * 20, 200]))
        };

        let frame = img.to_cam_frame(ImageFormat::Png).unwrap();
        let decoded = frame.to_cam_image().unwrap();

        assert_eq!(decoded.image, img.image);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ImageFormat::from_path("IMG/robocam_01.jpg"), Some(ImageFormat::Jpeg(100)));
        assert_eq!(ImageFormat::from_path("frame.PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_path("frame.bmp"), None);
        assert_eq!(ImageFormat::from_path("frame"), None);
    }
}
