//! Strip composition: four snapshots in, one captioned black-and-white strip out.

use image::{ImageFormat, RgbImage};
use photobooth_types::{
    config::StripConfig,
    frame::{Frame, STRIP_FRAME_COUNT},
    session::{BoothSession, BoothStage},
    PhotoboothError, Result,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::info;

pub mod caption;
pub mod encode;
pub mod layout;
pub mod transform;

pub use caption::{draw_caption, pick_caption, CaptionFont, FontResolver};
pub use encode::encode;
pub use layout::{apply_outer_frame, assemble_strip, build_polaroid_frame, rotate_expanded};
pub use transform::{fit_to_frame, transform_frame};

/// The finished strip and the random draws that shaped it.
#[derive(Debug, Clone)]
pub struct Strip {
    pub image: RgbImage,
    pub png: Vec<u8>,
    pub caption: Option<String>,
    pub rotations: Vec<f32>,
}

/// Stateless pipeline; every call depends only on its inputs and the RNG.
#[derive(Debug, Clone)]
pub struct StripComposer {
    config: StripConfig,
}

impl StripComposer {
    /// Fails with `Configuration` when `config` does not validate.
    pub fn new(config: StripConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StripConfig {
        &self.config
    }

    pub fn compose<R: Rng + ?Sized>(&self, frames: &[Frame], rng: &mut R) -> Result<Strip> {
        ensure_frame_count(frames)?;
        ensure_frames_have_pixels(frames)?;
        let config = &self.config;
        let font = FontResolver::resolve(config.caption_font.as_deref(), config.caption_font_size);
        let caption = pick_caption(&config.caption_pool, rng).map(str::to_owned);

        let last = frames.len() - 1;
        let polaroids: Vec<Frame> = frames
            .iter()
            .enumerate()
            .map(|(index, frame)| {
                let treated =
                    transform_frame(frame, config.contrast_factor, config.sharpness_factor);
                let bottom_extra = if index == last {
                    config.bottom_caption_space_px
                } else {
                    0
                };
                let polaroid = build_polaroid_frame(
                    &treated,
                    config.frame_size,
                    config.border_px,
                    bottom_extra,
                    config.frame_color,
                );
                match (&caption, bottom_extra) {
                    (Some(text), extra) if extra > 0 => {
                        draw_caption(&polaroid, text, &font, config.caption_color, extra)
                    }
                    _ => polaroid,
                }
            })
            .collect();

        let stacked = assemble_strip(
            &polaroids,
            config.gap_px,
            config.background_color,
            config.max_rotation_degrees,
            rng,
        )?;
        let image = apply_outer_frame(
            &stacked.image,
            config.outer_frame_px,
            config.outer_frame_color,
        );
        let png = encode(&image, ImageFormat::Png)?;
        info!(
            "Composed {}x{} strip ({} bytes) with caption {:?}",
            image.width(),
            image.height(),
            png.len(),
            caption
        );
        Ok(Strip {
            image,
            png,
            caption,
            rotations: stacked.rotations,
        })
    }

    /// Reproducible composition from a fixed seed.
    pub fn compose_seeded(&self, frames: &[Frame], seed: u64) -> Result<Strip> {
        self.compose(frames, &mut StdRng::seed_from_u64(seed))
    }

    /// Composes the photos held by a session that has entered `Composing`.
    pub fn compose_session<R: Rng + ?Sized>(
        &self,
        session: &BoothSession,
        rng: &mut R,
    ) -> Result<Strip> {
        session.expect_stage(BoothStage::Composing)?;
        info!("Composing strip for session {}", session.id);
        self.compose(session.photos(), rng)
    }
}

fn ensure_frame_count(frames: &[Frame]) -> Result<()> {
    if frames.len() == STRIP_FRAME_COUNT {
        Ok(())
    } else {
        Err(PhotoboothError::InvalidFrameCount {
            expected: STRIP_FRAME_COUNT,
            actual: frames.len(),
        })
    }
}

fn ensure_frames_have_pixels(frames: &[Frame]) -> Result<()> {
    match frames
        .iter()
        .position(|frame| frame.width() == 0 || frame.height() == 0)
    {
        Some(index) => Err(PhotoboothError::EmptyFrame { index }),
        None => Ok(()),
    }
}
