//! Polaroid framing, candid rotation and vertical stacking.

use image::{imageops, Rgb, RgbImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use photobooth_types::{config::Color, frame::Frame, PhotoboothError, Result};
use rand::Rng;
use tracing::debug;

use crate::transform::fit_to_frame;

/// Stacked strip before the outer frame and encoding.
#[derive(Debug, Clone)]
pub struct StackedStrip {
    pub image: RgbImage,
    /// Applied angle per frame in degrees, in input order.
    pub rotations: Vec<f32>,
}

/// Places the photo on a solid canvas with `border_px` on every side plus
/// `bottom_extra_px` of blank caption space below.
pub fn build_polaroid_frame(
    frame: &Frame,
    target: (u32, u32),
    border_px: u32,
    bottom_extra_px: u32,
    frame_color: Color,
) -> Frame {
    let photo = fit_to_frame(frame, target);
    let (target_w, target_h) = target;
    let mut canvas = RgbImage::from_pixel(
        target_w + 2 * border_px,
        target_h + 2 * border_px + bottom_extra_px,
        Rgb(frame_color),
    );
    imageops::replace(
        &mut canvas,
        photo.image(),
        i64::from(border_px),
        i64::from(border_px),
    );
    frame.derive(canvas)
}

/// Rotates about the centre into a bounding box large enough for the whole
/// frame; exposed corners take `fill`.
pub fn rotate_expanded(frame: &Frame, degrees: f32, fill: Color) -> Frame {
    if degrees == 0.0 {
        return frame.clone();
    }
    let radians = degrees.to_radians();
    let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
    let (width, height) = (frame.width() as f32, frame.height() as f32);
    let expanded_w = expand_extent(width * cos + height * sin).max(frame.width());
    let expanded_h = expand_extent(width * sin + height * cos).max(frame.height());

    let mut canvas = RgbImage::from_pixel(expanded_w, expanded_h, Rgb(fill));
    imageops::replace(
        &mut canvas,
        frame.image(),
        i64::from((expanded_w - frame.width()) / 2),
        i64::from((expanded_h - frame.height()) / 2),
    );
    let rotated = rotate_about_center(&canvas, radians, Interpolation::Bilinear, Rgb(fill));
    frame.derive(rotated)
}

fn expand_extent(value: f32) -> u32 {
    (value - 1e-3).ceil().max(1.0) as u32
}

/// Stacks frames top to bottom with `gap_px` between them.
///
/// Each frame is rotated by a random angle in `[-max_rotation_degrees,
/// max_rotation_degrees]` (no draw when the limit is 0) and centred on the
/// common width; anything wider is clipped at the strip edges.
pub fn assemble_strip<R: Rng + ?Sized>(
    frames: &[Frame],
    gap_px: u32,
    background: Color,
    max_rotation_degrees: f32,
    rng: &mut R,
) -> Result<StackedStrip> {
    let Some(first) = frames.first() else {
        return Err(PhotoboothError::InvalidFrameCount {
            expected: photobooth_types::frame::STRIP_FRAME_COUNT,
            actual: 0,
        });
    };
    let strip_w = first.width();
    if let Some((index, frame)) = frames
        .iter()
        .enumerate()
        .find(|(_, frame)| frame.width() != strip_w)
    {
        return Err(PhotoboothError::FrameWidthMismatch {
            expected: strip_w,
            actual: frame.width(),
            index,
        });
    }

    let mut rotations = Vec::with_capacity(frames.len());
    let mut placed = Vec::with_capacity(frames.len());
    for frame in frames {
        let angle = if max_rotation_degrees > 0.0 {
            rng.random_range(-max_rotation_degrees..=max_rotation_degrees)
        } else {
            0.0
        };
        rotations.push(angle);
        placed.push(rotate_expanded(frame, angle, background));
    }

    let strip_h = gap_px
        .checked_mul(placed.len() as u32 - 1)
        .and_then(|gaps| {
            placed
                .iter()
                .try_fold(gaps, |total, frame| total.checked_add(frame.height()))
        })
        .ok_or_else(|| {
            PhotoboothError::Configuration(format!(
                "strip of {} frames with {}px gaps exceeds the maximum image height",
                placed.len(),
                gap_px
            ))
        })?;
    let mut strip = RgbImage::from_pixel(strip_w, strip_h, Rgb(background));
    let mut y = 0i64;
    for frame in &placed {
        let x = (i64::from(strip_w) - i64::from(frame.width())) / 2;
        imageops::replace(&mut strip, frame.image(), x, y);
        y += i64::from(frame.height()) + i64::from(gap_px);
    }
    debug!(
        "Assembled {} frames into {}x{} strip, rotations {:?}",
        placed.len(),
        strip_w,
        strip_h,
        rotations
    );
    Ok(StackedStrip {
        image: strip,
        rotations,
    })
}

/// Wraps the strip in a solid border of `thickness` pixels.
pub fn apply_outer_frame(strip: &RgbImage, thickness: u32, color: Color) -> RgbImage {
    if thickness == 0 {
        return strip.clone();
    }
    let mut canvas = RgbImage::from_pixel(
        strip.width() + 2 * thickness,
        strip.height() + 2 * thickness,
        Rgb(color),
    );
    imageops::replace(
        &mut canvas,
        strip,
        i64::from(thickness),
        i64::from(thickness),
    );
    canvas
}
