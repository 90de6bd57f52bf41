//! Per-frame black-and-white treatment and sizing.

use image::{
    imageops::{self, FilterType},
    Pixel, Rgb, RgbImage,
};
use imageproc::filter::filter3x3;
use photobooth_types::frame::Frame;
use tracing::debug;

/// 3x3 smoothing kernel used as the degenerate image for sharpening.
const SMOOTH_KERNEL: [f32; 9] = [1.0, 1.0, 1.0, 1.0, 5.0, 1.0, 1.0, 1.0, 1.0];
const SMOOTH_WEIGHT: f32 = 13.0;

/// Grayscale, re-expanded to RGB, then contrast and sharpness in that order.
///
/// Every output pixel has R = G = B. Repeating the transform keeps that
/// property but compounds the contrast and sharpness adjustments.
pub fn transform_frame(frame: &Frame, contrast_factor: f32, sharpness_factor: f32) -> Frame {
    let gray = imageops::grayscale(frame.image());
    let mut rgb = RgbImage::new(gray.width(), gray.height());
    for (x, y, luma) in gray.enumerate_pixels() {
        let value = luma.0[0];
        rgb.put_pixel(x, y, Rgb([value, value, value]));
    }
    let contrasted = enhance_contrast(&rgb, contrast_factor);
    let sharpened = enhance_sharpness(&contrasted, sharpness_factor);
    frame.derive(sharpened)
}

/// Scales each channel's distance from the mean luminance by `factor`.
pub fn enhance_contrast(image: &RgbImage, factor: f32) -> RgbImage {
    if image.width() == 0 || image.height() == 0 {
        return image.clone();
    }
    let total: u64 = image
        .pixels()
        .map(|pixel| u64::from(pixel.to_luma().0[0]))
        .sum();
    let pixels = u64::from(image.width()) * u64::from(image.height());
    let mean = (total as f32 / pixels as f32).round();

    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for channel in pixel.channels_mut() {
            *channel = blend(mean, f32::from(*channel), factor);
        }
    }
    out
}

/// Blends the image with a smoothed copy of itself; factor 1.0 is the identity.
/// Edge pixels are left untouched.
pub fn enhance_sharpness(image: &RgbImage, factor: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    let mut out = image.clone();
    if width < 3 || height < 3 {
        return out;
    }
    // Unnormalised sums stay exact in f32; the division happens per pixel below.
    let smooth = filter3x3::<_, f32, f32>(image, &SMOOTH_KERNEL);
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let degenerate = smooth.get_pixel(x, y);
            let source = image.get_pixel(x, y);
            let target = out.get_pixel_mut(x, y);
            for c in 0..3 {
                let blurred = (degenerate.0[c] / SMOOTH_WEIGHT).round();
                target.0[c] = blend(blurred, f32::from(source.0[c]), factor);
            }
        }
    }
    out
}

/// `degenerate + factor * (value - degenerate)`, clamped to a byte.
fn blend(degenerate: f32, value: f32, factor: f32) -> u8 {
    (degenerate + factor * (value - degenerate))
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Center-crops to the target aspect ratio, then scales to exactly `target`.
pub fn fit_to_frame(frame: &Frame, target: (u32, u32)) -> Frame {
    let (target_w, target_h) = target;
    let (width, height) = (frame.width(), frame.height());
    if (width, height) == target {
        return frame.clone();
    }

    let (crop_w, crop_h) =
        if u64::from(width) * u64::from(target_h) > u64::from(height) * u64::from(target_w) {
            let w = (f64::from(height) * f64::from(target_w) / f64::from(target_h)).round() as u32;
            (w.clamp(1, width), height)
        } else {
            let h = (f64::from(width) * f64::from(target_h) / f64::from(target_w)).round() as u32;
            (width, h.clamp(1, height))
        };
    let x = (width - crop_w) / 2;
    let y = (height - crop_h) / 2;
    debug!(
        "Fitting {}x{} frame: crop {}x{} at ({}, {}) then scale to {}x{}",
        width, height, crop_w, crop_h, x, y, target_w, target_h
    );

    let cropped = imageops::crop_imm(frame.image(), x, y, crop_w, crop_h).to_image();
    let fitted = if (crop_w, crop_h) == target {
        cropped
    } else {
        imageops::resize(&cropped, target_w, target_h, FilterType::Lanczos3)
    };
    frame.derive(fitted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Frame {
        Frame::new(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8])
        }))
    }

    #[test]
    fn transform_produces_grayscale() {
        let out = transform_frame(&gradient(32, 24), 1.15, 1.05);
        assert!(out.is_grayscale());
        assert_eq!((out.width(), out.height()), (32, 24));
    }

    #[test]
    fn repeated_transform_stays_grayscale() {
        let once = transform_frame(&gradient(20, 20), 1.5, 2.0);
        let twice = transform_frame(&once, 1.5, 2.0);
        assert!(twice.is_grayscale());
    }

    #[test]
    fn unit_factors_are_identity() {
        let image = gradient(10, 10).into_image();
        assert_eq!(enhance_contrast(&image, 1.0), image);
        assert_eq!(enhance_sharpness(&image, 1.0), image);
    }

    #[test]
    fn contrast_spreads_values_around_mean() {
        let mut image = RgbImage::from_pixel(2, 1, Rgb([100, 100, 100]));
        image.put_pixel(1, 0, Rgb([200, 200, 200]));
        let out = enhance_contrast(&image, 2.0);
        assert_eq!(out.get_pixel(0, 0), &Rgb([50, 50, 50]));
        assert_eq!(out.get_pixel(1, 0), &Rgb([250, 250, 250]));
    }

    #[test]
    fn sharpness_leaves_flat_regions_alone() {
        let image = RgbImage::from_pixel(8, 8, Rgb([77, 77, 77]));
        assert_eq!(enhance_sharpness(&image, 3.0), image);
    }

    #[test]
    fn sharpening_steepens_an_edge() {
        let image = RgbImage::from_fn(8, 6, |x, _| {
            if x < 4 {
                Rgb([80, 80, 80])
            } else {
                Rgb([160, 160, 160])
            }
        });
        let out = enhance_sharpness(&image, 2.0);
        let dark = out.get_pixel(3, 3).0[0];
        let light = out.get_pixel(4, 3).0[0];
        assert!(dark < 80, "dark side of edge not darkened: {dark}");
        assert!(light > 160, "light side of edge not lightened: {light}");
        assert_eq!(out.get_pixel(1, 3).0, [80, 80, 80]);
        assert_eq!(out.get_pixel(0, 3), image.get_pixel(0, 3));
        assert_eq!(out.get_pixel(7, 0), image.get_pixel(7, 0));
        assert!(Frame::new(out).is_grayscale());
    }

    #[test]
    fn fit_always_hits_target_size() {
        for (w, h) in [(640, 480), (480, 640), (100, 100), (1, 900), (1280, 720)] {
            let out = fit_to_frame(&gradient(w, h), (64, 48));
            assert_eq!((out.width(), out.height()), (64, 48), "input {w}x{h}");
        }
    }

    #[test]
    fn fit_crops_the_longer_side_centrally() {
        let mut image = RgbImage::from_pixel(30, 10, Rgb([0, 0, 0]));
        for y in 0..10 {
            for x in 10..20 {
                image.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        let out = fit_to_frame(&Frame::new(image), (10, 10));
        assert!(out.image().pixels().all(|p| p.0 == [255, 255, 255]));
    }
}
