use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{PhotoboothError, Result};

/// RGB colour, written as `[r, g, b]` in TOML.
pub type Color = [u8; 3];

const MAX_ROTATION_LIMIT: f32 = 45.0;
/// Upper bound for every pixel dimension in `StripConfig`; keeps strip sizes
/// well inside `u32`.
pub const MAX_CANVAS_PX: u32 = 16_384;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StripConfig {
    pub frame_size: (u32, u32),
    pub gap_px: u32,
    pub border_px: u32,
    pub bottom_caption_space_px: u32,
    pub background_color: Color,
    /// Canvas colour of each polaroid (border and caption area).
    pub frame_color: Color,
    /// Preferred caption font file; the built-in font is used when absent or unreadable.
    pub caption_font: Option<PathBuf>,
    pub caption_font_size: f32,
    pub caption_color: Color,
    pub contrast_factor: f32,
    pub sharpness_factor: f32,
    pub max_rotation_degrees: f32,
    pub caption_pool: Vec<String>,
    /// Thickness of the photobooth frame around the finished strip, 0 to disable.
    pub outer_frame_px: u32,
    pub outer_frame_color: Color,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            frame_size: (640, 640),
            gap_px: 24,
            border_px: 10,
            bottom_caption_space_px: 140,
            background_color: [250, 250, 250],
            frame_color: [255, 255, 255],
            caption_font: None,
            caption_font_size: 48.0,
            caption_color: [30, 30, 30],
            contrast_factor: 1.15,
            sharpness_factor: 1.05,
            max_rotation_degrees: 1.5,
            caption_pool: vec![
                "six months of us".into(),
                "still my favourite".into(),
                "say cheese!".into(),
                "best day ever".into(),
                "you + me".into(),
            ],
            outer_frame_px: 40,
            outer_frame_color: [0, 0, 0],
        }
    }
}

impl StripConfig {
    pub fn validate(&self) -> Result<()> {
        let (width, height) = self.frame_size;
        if width == 0 || height == 0 {
            return Err(PhotoboothError::Configuration(
                "strip.frame_size must be non-zero in both dimensions".into(),
            ));
        }
        for (name, value) in [
            ("strip.frame_size", width.max(height)),
            ("strip.gap_px", self.gap_px),
            ("strip.border_px", self.border_px),
            ("strip.bottom_caption_space_px", self.bottom_caption_space_px),
            ("strip.outer_frame_px", self.outer_frame_px),
        ] {
            if value > MAX_CANVAS_PX {
                return Err(PhotoboothError::Configuration(format!(
                    "{name} must be at most {MAX_CANVAS_PX}px, got {value}"
                )));
            }
        }
        if !(self.contrast_factor.is_finite() && self.contrast_factor > 0.0) {
            return Err(PhotoboothError::Configuration(
                "strip.contrast_factor must be a positive number".into(),
            ));
        }
        if !(self.sharpness_factor.is_finite() && self.sharpness_factor > 0.0) {
            return Err(PhotoboothError::Configuration(
                "strip.sharpness_factor must be a positive number".into(),
            ));
        }
        if !(0.0..=MAX_ROTATION_LIMIT).contains(&self.max_rotation_degrees) {
            return Err(PhotoboothError::Configuration(format!(
                "strip.max_rotation_degrees must be between 0 and {MAX_ROTATION_LIMIT}"
            )));
        }
        if self.caption_pool.is_empty() {
            return Err(PhotoboothError::Configuration(
                "strip.caption_pool must contain at least one caption".into(),
            ));
        }
        if !(self.caption_font_size.is_finite() && self.caption_font_size > 0.0) {
            return Err(PhotoboothError::Configuration(
                "strip.caption_font_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OpsConfig {
    pub log_level: String,
    pub output_dir: String,
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            output_dir: "output".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhotoboothConfig {
    pub strip: StripConfig,
    pub ops: OpsConfig,
}

impl PhotoboothConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|err| {
            PhotoboothError::Configuration(format!(
                "unable to read config file {}: {err}",
                path_ref.display()
            ))
        })?;
        toml::from_str(&contents).map_err(|err| {
            PhotoboothError::Configuration(format!(
                "failed to parse config file {}: {err}",
                path_ref.display()
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.strip.validate()?;
        if self.ops.output_dir.trim().is_empty() {
            return Err(PhotoboothError::Configuration(
                "ops.output_dir must not be empty".into(),
            ));
        }
        Ok(())
    }
}
