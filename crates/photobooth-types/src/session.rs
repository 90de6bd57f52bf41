//! Request-scoped booth flow: collect four photos, compose, download.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    frame::{Frame, STRIP_FRAME_COUNT},
    PhotoboothError, Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoothStage {
    AwaitingPhotos,
    Composing,
    ReadyForDownload,
}

/// Immutable session value owned by the UI layer. Each transition consumes the
/// session and hands back the next one.
#[derive(Debug, Clone)]
pub struct BoothSession {
    pub id: Uuid,
    stage: BoothStage,
    photos: Vec<Frame>,
    pending: Option<Frame>,
}

impl Default for BoothSession {
    fn default() -> Self {
        Self::new()
    }
}

impl BoothSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            stage: BoothStage::AwaitingPhotos,
            photos: Vec::with_capacity(STRIP_FRAME_COUNT),
            pending: None,
        }
    }

    pub fn stage(&self) -> BoothStage {
        self.stage
    }

    /// Photos accepted into the strip, oldest first.
    pub fn photos(&self) -> &[Frame] {
        &self.photos
    }

    pub fn pending(&self) -> Option<&Frame> {
        self.pending.as_ref()
    }

    pub fn remaining(&self) -> usize {
        STRIP_FRAME_COUNT.saturating_sub(self.photos.len())
    }

    /// Holds the latest camera shot until it is added or discarded.
    pub fn capture(self, frame: Frame) -> Result<Self> {
        self.expect_stage(BoothStage::AwaitingPhotos)?;
        Ok(Self {
            pending: Some(frame),
            ..self
        })
    }

    pub fn add_pending(self) -> Result<Self> {
        self.expect_stage(BoothStage::AwaitingPhotos)?;
        if self.photos.len() >= STRIP_FRAME_COUNT {
            return Err(session_error(format!(
                "already holding {STRIP_FRAME_COUNT} photos"
            )));
        }
        let Self {
            id,
            stage,
            mut photos,
            pending,
        } = self;
        let Some(frame) = pending else {
            return Err(session_error("no photo captured yet"));
        };
        photos.push(frame);
        Ok(Self {
            id,
            stage,
            photos,
            pending: None,
        })
    }

    /// Drops the pending shot so the user can retake it.
    pub fn discard_pending(self) -> Self {
        Self {
            pending: None,
            ..self
        }
    }

    pub fn begin_composing(self) -> Result<Self> {
        self.expect_stage(BoothStage::AwaitingPhotos)?;
        if self.photos.len() != STRIP_FRAME_COUNT {
            return Err(PhotoboothError::InvalidFrameCount {
                expected: STRIP_FRAME_COUNT,
                actual: self.photos.len(),
            });
        }
        Ok(Self {
            stage: BoothStage::Composing,
            pending: None,
            ..self
        })
    }

    pub fn finish(self) -> Result<Self> {
        self.expect_stage(BoothStage::Composing)?;
        Ok(Self {
            stage: BoothStage::ReadyForDownload,
            ..self
        })
    }

    /// Starts over with an empty session ("retake all" or "new strip").
    pub fn reset(self) -> Self {
        Self::new()
    }

    pub fn expect_stage(&self, expected: BoothStage) -> Result<()> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(session_error(format!(
                "expected stage {:?}, session is in {:?}",
                expected, self.stage
            )))
        }
    }
}

fn session_error(message: impl Into<String>) -> PhotoboothError {
    PhotoboothError::Session(message.into())
}
