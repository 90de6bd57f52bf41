//! Operational helpers: logging and handing the finished strip to the user.

use std::{
    fs,
    path::{Path, PathBuf},
};

use photobooth_types::{config::OpsConfig, PhotoboothError, Result};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// File metadata offered with the download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Download {
    pub file_name: &'static str,
    pub mime: &'static str,
}

pub const STRIP_DOWNLOAD: Download = Download {
    file_name: "photobooth_strip.png",
    mime: "image/png",
};

pub fn init_tracing(config: &OpsConfig) -> Result<()> {
    let filter = EnvFilter::try_new(config.log_level.clone())
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| PhotoboothError::Ops(format!("failed to create log filter: {err}")))?;

    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| PhotoboothError::Ops(format!("tracing init error: {err}")))?;
    Ok(())
}

pub fn ensure_output_dir(path: &str) -> Result<PathBuf> {
    let dir = PathBuf::from(path);
    fs::create_dir_all(&dir)
        .map_err(|err| PhotoboothError::Ops(format!("failed to create output dir: {err}")))?;
    info!("Output directory ready at {:?}", dir);
    Ok(dir)
}

/// Writes the encoded strip under `dir` using the download file name.
pub fn write_download(dir: &Path, bytes: &[u8]) -> Result<PathBuf> {
    let path = dir.join(STRIP_DOWNLOAD.file_name);
    fs::write(&path, bytes).map_err(|err| {
        PhotoboothError::Ops(format!("failed to write {}: {err}", path.display()))
    })?;
    info!(
        "Wrote {} ({} bytes, {})",
        path.display(),
        bytes.len(),
        STRIP_DOWNLOAD.mime
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_strip_into_fresh_dir() {
        let root = std::env::temp_dir().join(format!("photobooth-ops-{}", uuid::Uuid::new_v4()));
        let nested = root.join("strips");

        let dir = ensure_output_dir(nested.to_str().expect("utf-8 temp path")).expect("create dir");
        let path = write_download(&dir, b"\x89PNG fake").expect("write strip");

        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("photobooth_strip.png"));
        assert_eq!(fs::read(&path).expect("read back"), b"\x89PNG fake");
        fs::remove_dir_all(&root).expect("cleanup");
    }

    #[test]
    fn download_is_png() {
        assert_eq!(STRIP_DOWNLOAD.mime, "image/png");
        assert!(STRIP_DOWNLOAD.file_name.ends_with(".png"));
    }
}
