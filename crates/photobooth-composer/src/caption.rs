//! Caption fonts and placement on the reserved bottom band of the last polaroid.

use std::{fs, path::Path};

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::RgbImage;
use photobooth_types::{config::Color, frame::Frame};
use rand::{seq::IndexedRandom, Rng};
use rusttype::{point, Font, Scale};
use tracing::{debug, warn};

const BITMAP_CELL: u32 = 8;

/// A font that is always ready to draw.
pub enum CaptionFont {
    Outline { font: Font<'static>, scale: Scale },
    /// Built-in 8x8 bitmap glyphs, each cell enlarged by an integer factor.
    Bitmap { factor: u32 },
}

/// Pixel rectangle, `x1`/`y1` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl ClipRect {
    fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

pub struct FontResolver;

impl FontResolver {
    /// Loads the preferred font, or the built-in bitmap font when it is missing
    /// or unparsable. Never fails.
    pub fn resolve(preferred: Option<&Path>, size_px: f32) -> CaptionFont {
        let Some(path) = preferred else {
            debug!("No caption font configured; using built-in font");
            return CaptionFont::builtin(size_px);
        };
        match load_outline(path) {
            Ok(font) => {
                debug!("Loaded caption font {:?}", path);
                CaptionFont::Outline {
                    font,
                    scale: Scale::uniform(size_px),
                }
            }
            Err(reason) => {
                warn!(
                    "Caption font {:?} unavailable ({}); falling back to built-in font",
                    path, reason
                );
                CaptionFont::builtin(size_px)
            }
        }
    }
}

fn load_outline(path: &Path) -> Result<Font<'static>, String> {
    let bytes = fs::read(path).map_err(|err| err.to_string())?;
    Font::try_from_vec(bytes).ok_or_else(|| "not a TrueType/OpenType font".to_string())
}

impl CaptionFont {
    /// Bitmap glyphs are square cells, so they are drawn at half the requested
    /// size to keep a similar line length to outline fonts.
    pub fn builtin(size_px: f32) -> Self {
        let factor = (size_px / (2.0 * BITMAP_CELL as f32)).round().max(1.0) as u32;
        CaptionFont::Bitmap { factor }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, CaptionFont::Bitmap { .. })
    }

    /// Rendered bounding box of `text` as `(width, height)`.
    pub fn measure(&self, text: &str) -> (u32, u32) {
        if text.is_empty() {
            return (0, 0);
        }
        match self {
            CaptionFont::Outline { font, scale } => {
                let v_metrics = font.v_metrics(*scale);
                let width = font
                    .layout(text, *scale, point(0.0, v_metrics.ascent))
                    .filter_map(|glyph| glyph.pixel_bounding_box())
                    .map(|bb| bb.max.x)
                    .max()
                    .unwrap_or(0)
                    .max(0) as u32;
                let height = (v_metrics.ascent - v_metrics.descent).ceil().max(1.0) as u32;
                (width, height)
            }
            CaptionFont::Bitmap { factor } => {
                let cell = BITMAP_CELL * factor;
                (text.chars().count() as u32 * cell, cell)
            }
        }
    }

    /// Draws `text` with its top-left corner at `(x, y)`, blending glyph
    /// coverage into `canvas` and never touching pixels outside `clip`.
    pub fn draw(
        &self,
        canvas: &mut RgbImage,
        x: i32,
        y: i32,
        color: Color,
        text: &str,
        clip: ClipRect,
    ) {
        let clip = ClipRect {
            x0: clip.x0.max(0),
            y0: clip.y0.max(0),
            x1: clip.x1.min(canvas.width() as i32),
            y1: clip.y1.min(canvas.height() as i32),
        };
        match self {
            CaptionFont::Outline { font, scale } => {
                let v_metrics = font.v_metrics(*scale);
                let origin = point(x as f32, y as f32 + v_metrics.ascent);
                for glyph in font.layout(text, *scale, origin) {
                    let Some(bb) = glyph.pixel_bounding_box() else {
                        continue;
                    };
                    glyph.draw(|gx, gy, coverage| {
                        let px = gx as i32 + bb.min.x;
                        let py = gy as i32 + bb.min.y;
                        blend_pixel(canvas, px, py, color, coverage, &clip);
                    });
                }
            }
            CaptionFont::Bitmap { factor } => {
                let factor = *factor as i32;
                let cell = BITMAP_CELL as i32 * factor;
                for (i, ch) in text.chars().enumerate() {
                    let rows = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?'));
                    let Some(rows) = rows else {
                        continue;
                    };
                    let left = x + i as i32 * cell;
                    for (row, bits) in rows.iter().enumerate() {
                        for col in 0..BITMAP_CELL as i32 {
                            if bits & (1 << col) == 0 {
                                continue;
                            }
                            for dy in 0..factor {
                                for dx in 0..factor {
                                    let px = left + col * factor + dx;
                                    let py = y + row as i32 * factor + dy;
                                    blend_pixel(canvas, px, py, color, 1.0, &clip);
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn blend_pixel(
    canvas: &mut RgbImage,
    x: i32,
    y: i32,
    color: Color,
    coverage: f32,
    clip: &ClipRect,
) {
    if coverage <= 0.0 || !clip.contains(x, y) {
        return;
    }
    let alpha = coverage.min(1.0);
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    for (channel, src) in dst.0.iter_mut().zip(color) {
        *channel = (f32::from(src) * alpha + f32::from(*channel) * (1.0 - alpha)).round() as u8;
    }
}

/// Uniformly random caption from `pool`, `None` when the pool is empty.
pub fn pick_caption<'a, R: Rng + ?Sized>(pool: &'a [String], rng: &mut R) -> Option<&'a str> {
    pool.choose(rng).map(String::as_str)
}

/// Centres `text` inside the bottom `bottom_extra_px` rows of `frame`.
///
/// With no reserved band (or no text) the frame is returned unchanged, so a
/// caption can never cover the photo.
pub fn draw_caption(
    frame: &Frame,
    text: &str,
    font: &CaptionFont,
    color: Color,
    bottom_extra_px: u32,
) -> Frame {
    if bottom_extra_px == 0 || text.is_empty() {
        return frame.clone();
    }
    let (width, height) = (frame.width() as i32, frame.height() as i32);
    let band_top = height - bottom_extra_px.min(frame.height()) as i32;
    let band_height = height - band_top;
    let (text_w, text_h) = font.measure(text);
    let x = (width - text_w as i32) / 2;
    let y = band_top + (band_height - text_h as i32) / 2;
    debug!(
        "Drawing caption {:?} ({}x{}) at ({}, {})",
        text, text_w, text_h, x, y
    );

    let mut canvas = frame.image().clone();
    let clip = ClipRect {
        x0: 0,
        y0: band_top,
        x1: width,
        y1: height,
    };
    font.draw(&mut canvas, x, y, color, text, clip);
    frame.derive(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    const PAPER: Color = [255, 255, 255];
    const INK: Color = [30, 30, 30];

    fn blank(width: u32, height: u32) -> Frame {
        Frame::solid(width, height, PAPER)
    }

    #[test]
    fn missing_font_falls_back_to_builtin() {
        let font = FontResolver::resolve(Some(Path::new("/nonexistent/Script.ttf")), 48.0);
        assert!(font.is_builtin());
    }

    #[test]
    fn unparsable_font_falls_back_to_builtin() {
        let path = std::env::temp_dir().join("photobooth-not-a-font.ttf");
        fs::write(&path, b"definitely not a font").expect("write fake font");
        let font = FontResolver::resolve(Some(path.as_path()), 48.0);
        assert!(font.is_builtin());
        fs::remove_file(&path).expect("cleanup fake font");
    }

    fn fixture_font() -> &'static Path {
        Path::new(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/fixtures/DejaVuSansMono.ttf"
        ))
    }

    #[test]
    fn readable_font_resolves_to_outline() {
        let font = FontResolver::resolve(Some(fixture_font()), 48.0);
        assert!(!font.is_builtin());
        let (width, height) = font.measure("best day ever");
        assert!(width > 100 && width < 640, "width {width}");
        assert!((40..=80).contains(&height), "height {height}");
        assert_eq!(font.measure(""), (0, 0));
    }

    #[test]
    fn outline_caption_is_centred_inside_band() {
        let font = FontResolver::resolve(Some(fixture_font()), 48.0);
        let frame = blank(640, 280);
        let out = draw_caption(&frame, "best day ever", &font, INK, 140);

        let inked: Vec<(u32, u32)> = out
            .image()
            .enumerate_pixels()
            .filter(|(_, _, pixel)| pixel.0 != PAPER)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!inked.is_empty());
        assert!(inked.iter().all(|&(_, y)| y >= 140), "ink above the band");

        let min_x = inked.iter().map(|&(x, _)| x).min().unwrap_or(0);
        let max_x = inked.iter().map(|&(x, _)| x).max().unwrap_or(0);
        let centre = (min_x + max_x) as i32 / 2;
        assert!((centre - 320).abs() <= 8, "caption centred at x={centre}");

        let min_y = inked.iter().map(|&(_, y)| y).min().unwrap_or(0);
        let max_y = inked.iter().map(|&(_, y)| y).max().unwrap_or(0);
        assert!(min_y > 140 && max_y < 279, "rows {min_y}..{max_y} touch band edges");
    }

    #[test]
    fn builtin_measure_scales_with_size() {
        assert_eq!(CaptionFont::builtin(48.0).measure("abcd"), (4 * 24, 24));
        assert_eq!(CaptionFont::builtin(1.0).measure("ab"), (16, 8));
        assert_eq!(CaptionFont::builtin(48.0).measure(""), (0, 0));
    }

    #[test]
    fn caption_lands_only_in_bottom_band() {
        let frame = blank(200, 160);
        let font = CaptionFont::builtin(32.0);
        let out = draw_caption(&frame, "hello", &font, INK, 60);

        let mut inked_in_band = 0;
        for (_, y, pixel) in out.image().enumerate_pixels() {
            if pixel.0 != PAPER {
                assert!(y >= 100, "caption pixel above band at row {y}");
                inked_in_band += 1;
            }
        }
        assert!(inked_in_band > 0);
    }

    #[test]
    fn zero_band_is_a_no_op() {
        let frame = blank(50, 50);
        let out = draw_caption(&frame, "hello", &CaptionFont::builtin(16.0), INK, 0);
        assert_eq!(out.image(), frame.image());
    }

    #[test]
    fn oversized_caption_is_clipped_to_band() {
        let frame = blank(40, 40);
        let out = draw_caption(&frame, "far too long to fit", &CaptionFont::builtin(64.0), INK, 10);
        for (_, y, pixel) in out.image().enumerate_pixels() {
            if y < 30 {
                assert_eq!(pixel.0, PAPER);
            }
        }
    }

    #[test]
    fn caption_choice_is_seeded() {
        let pool: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        let first = pick_caption(&pool, &mut StdRng::seed_from_u64(7));
        let second = pick_caption(&pool, &mut StdRng::seed_from_u64(7));
        assert_eq!(first, second);
        assert!(first.is_some_and(|caption| pool.iter().any(|p| p == caption)));
        assert_eq!(pick_caption(&[], &mut StdRng::seed_from_u64(7)), None);
    }
}
