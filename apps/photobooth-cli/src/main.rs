use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use photobooth_composer::StripComposer;
use photobooth_ops::{ensure_output_dir, init_tracing, write_download, STRIP_DOWNLOAD};
use photobooth_types::{config::PhotoboothConfig, frame::Frame, session::BoothSession};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use tracing::info;

/// Turn four snapshots into a black-and-white photobooth strip.
#[derive(Debug, Parser)]
#[command(name = "photobooth", version)]
struct Cli {
    /// TOML config file (falls back to PHOTOBOOTH_CONFIG, then built-in defaults).
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Seed for caption and rotation draws; random when omitted.
    #[arg(short, long)]
    seed: Option<u64>,
    /// Output directory, overriding `ops.output_dir`.
    #[arg(short, long)]
    out: Option<String>,
    /// Preferred caption font, overriding `strip.caption_font`.
    #[arg(long)]
    font: Option<PathBuf>,
    /// Exactly four photos, in strip order.
    #[arg(required = true)]
    photos: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct StripSummary {
    session: String,
    path: PathBuf,
    mime: &'static str,
    width: u32,
    height: u32,
    caption: Option<String>,
    rotations: Vec<f32>,
    seed: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.clone());
    if let Some(out) = cli.out.clone() {
        config.ops.output_dir = out;
    }
    if let Some(font) = cli.font.clone() {
        config.strip.caption_font = Some(font);
    }
    init_tracing(&config.ops)?;

    let mut session = BoothSession::new();
    for path in &cli.photos {
        let bytes =
            fs::read(path).with_context(|| format!("reading photo {}", path.display()))?;
        let frame = Frame::from_encoded(&bytes)
            .with_context(|| format!("decoding photo {}", path.display()))?;
        info!(
            "Captured {} ({}x{})",
            path.display(),
            frame.width(),
            frame.height()
        );
        session = session.capture(frame)?.add_pending()?;
    }
    let session = session
        .begin_composing()
        .context("a strip needs exactly four photos")?;

    let seed = cli.seed.unwrap_or_else(rand::random);
    let composer = StripComposer::new(config.strip.clone())?;
    let strip = composer.compose_session(&session, &mut StdRng::seed_from_u64(seed))?;
    let session = session.finish()?;

    let dir = ensure_output_dir(&config.ops.output_dir)?;
    let path = write_download(&dir, &strip.png)?;

    let summary = StripSummary {
        session: session.id.to_string(),
        path,
        mime: STRIP_DOWNLOAD.mime,
        width: strip.image.width(),
        height: strip.image.height(),
        caption: strip.caption,
        rotations: strip.rotations,
        seed,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn load_config(from_args: Option<PathBuf>) -> PhotoboothConfig {
    let from_env = std::env::var("PHOTOBOOTH_CONFIG").ok().map(PathBuf::from);
    let Some(path) = from_args.or(from_env) else {
        return PhotoboothConfig::default();
    };
    match PhotoboothConfig::from_file(&path) {
        Ok(cfg) => {
            if let Err(err) = cfg.validate() {
                eprintln!(
                    "Invalid config in '{}': {err}. Falling back to internal defaults.",
                    path.display()
                );
                PhotoboothConfig::default()
            } else {
                cfg
            }
        }
        Err(err) => {
            eprintln!(
                "Failed to load config from '{}': {err}. Falling back to internal defaults.",
                path.display()
            );
            PhotoboothConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_photos_and_overrides() {
        let cli = Cli::try_parse_from([
            "photobooth",
            "--seed",
            "7",
            "--out",
            "strips",
            "a.png",
            "b.png",
            "c.png",
            "d.png",
        ])
        .expect("parse args");
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.out.as_deref(), Some("strips"));
        assert_eq!(cli.photos.len(), 4);
    }

    #[test]
    fn photos_are_required() {
        assert!(Cli::try_parse_from(["photobooth"]).is_err());
    }

    #[test]
    fn unreadable_config_falls_back_to_defaults() {
        let config = load_config(Some(PathBuf::from("/nonexistent/photobooth.toml")));
        assert_eq!(config, PhotoboothConfig::default());
    }
}
