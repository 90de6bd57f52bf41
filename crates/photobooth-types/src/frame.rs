use chrono::{DateTime, Utc};
use image::{DynamicImage, Rgb, RgbImage};

use crate::{PhotoboothError, Result};

/// Number of snapshots that make up one strip.
pub const STRIP_FRAME_COUNT: usize = 4;

/// A captured RGB raster. Transforms derive new frames instead of mutating.
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbImage,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self {
            image,
            captured_at: Utc::now(),
        }
    }

    /// Converts any decoded image to RGB, dropping alpha.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self::new(image.to_rgb8())
    }

    /// Decodes an uploaded camera shot (PNG or JPEG bytes).
    pub fn from_encoded(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|err| PhotoboothError::Decoding(format!("unreadable capture: {err}")))?;
        Ok(Self::from_dynamic(image))
    }

    pub fn solid(width: u32, height: u32, color: [u8; 3]) -> Self {
        Self::new(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    /// New frame carrying `image` but keeping this frame's capture time.
    pub fn derive(&self, image: RgbImage) -> Self {
        Self {
            image,
            captured_at: self.captured_at,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// True when every pixel has R = G = B.
    pub fn is_grayscale(&self) -> bool {
        self.image
            .pixels()
            .all(|&Rgb([r, g, b])| r == g && g == b)
    }
}
