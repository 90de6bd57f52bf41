use thiserror::Error;

pub type Result<T, E = PhotoboothError> = std::result::Result<T, E>;

/// Unified error type covering the failure modes of capture, composition and output.
#[derive(Debug, Error)]
pub enum PhotoboothError {
    #[error("expected exactly {expected} frames, got {actual}")]
    InvalidFrameCount { expected: usize, actual: usize },
    #[error("frame {index} is {actual}px wide, strip requires {expected}px")]
    FrameWidthMismatch {
        expected: u32,
        actual: u32,
        index: usize,
    },
    #[error("frame {index} has no pixels")]
    EmptyFrame { index: usize },
    #[error("encoding error: {0}")]
    Encoding(String),
    #[error("decoding error: {0}")]
    Decoding(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("session error: {0}")]
    Session(String),
    #[error("operational error: {0}")]
    Ops(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
