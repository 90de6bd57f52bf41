use std::io::Cursor;

use image::{DynamicImage, ImageFormat, ImageOutputFormat, RgbImage};
use photobooth_types::{PhotoboothError, Result};

/// Serialises the strip for download. Only PNG is supported.
pub fn encode(strip: &RgbImage, format: ImageFormat) -> Result<Vec<u8>> {
    if format != ImageFormat::Png {
        return Err(PhotoboothError::Encoding(format!(
            "unsupported output format {format:?}, strips are PNG only"
        )));
    }
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(strip.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .map_err(|err| PhotoboothError::Encoding(format!("failed to write PNG: {err}")))?;
    Ok(bytes)
}
