//! Units of work handed to the host.
//!
//! A job owns everything it reads, so the host can run it on whatever thread
//! or worker it likes and hand the outcome back to the session. Jobs check the
//! session's [`CancelToken`] before and after the expensive step.

use std::sync::Arc;

use crate::compose::{render, RenderError, RenderTarget, RenderedImage};
use crate::config::PipelineConfig;
use crate::decode::{decode_image, scale_to_cover, DecodeError, DecodedImage, SourceImage, UploadFile};
use crate::transform::Rotation;
use crate::Adjustments;

use super::cancel::CancelToken;
use super::slot::SlotId;

/// Position of a file inside an upload batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchTicket {
    pub batch_id: u64,
    pub file_index: usize,
}

/// Decode one uploaded file and pre-scale it to cover the product face.
#[derive(Debug)]
pub struct DecodeJob {
    ticket: BatchTicket,
    file: UploadFile,
    target: RenderTarget,
    config: PipelineConfig,
    cancel: CancelToken,
}

/// Result of a [`DecodeJob`].
#[derive(Debug)]
pub struct DecodeOutcome {
    pub ticket: BatchTicket,
    pub file_name: String,
    pub result: Result<SourceImage, DecodeError>,
}

impl DecodeJob {
    pub(crate) fn new(
        ticket: BatchTicket,
        file: UploadFile,
        target: RenderTarget,
        config: PipelineConfig,
        cancel: CancelToken,
    ) -> Self {
        Self {
            ticket,
            file,
            target,
            config,
            cancel,
        }
    }

    pub fn ticket(&self) -> BatchTicket {
        self.ticket
    }

    pub fn file_name(&self) -> &str {
        &self.file.name
    }

    pub fn run(self) -> DecodeOutcome {
        let DecodeJob {
            ticket,
            file,
            target,
            config,
            cancel,
        } = self;
        let result = decode_upload(&file, &target, &config, &cancel)
            .map(|bitmap| SourceImage::new(bitmap, file.bytes, file.mime));
        DecodeOutcome {
            ticket,
            file_name: file.name,
            result,
        }
    }
}

fn decode_upload(
    file: &UploadFile,
    target: &RenderTarget,
    config: &PipelineConfig,
    cancel: &CancelToken,
) -> Result<DecodedImage, DecodeError> {
    if cancel.is_cancelled() {
        return Err(DecodeError::Cancelled);
    }
    let bitmap = decode_image(&file.bytes)?;
    let bitmap = scale_to_cover(&bitmap, target.width, target.height, config.resize_filter)?;
    if cancel.is_cancelled() {
        return Err(DecodeError::Cancelled);
    }
    log::debug!("decoded {} to {}x{}", file.name, bitmap.width, bitmap.height);
    Ok(bitmap)
}

/// Re-render a populated slot with new rotation and adjustments.
#[derive(Debug)]
pub struct RenderJob {
    slot_id: SlotId,
    generation: u64,
    bitmap: Arc<DecodedImage>,
    rotation: Rotation,
    adjustments: Adjustments,
    target: RenderTarget,
    config: PipelineConfig,
    cancel: CancelToken,
}

/// Result of a [`RenderJob`].
#[derive(Debug)]
pub struct RenderOutcome {
    pub slot_id: SlotId,
    pub generation: u64,
    pub rotation: Rotation,
    pub adjustments: Adjustments,
    pub result: Result<RenderedImage, RenderError>,
}

impl RenderJob {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        slot_id: SlotId,
        generation: u64,
        bitmap: Arc<DecodedImage>,
        rotation: Rotation,
        adjustments: Adjustments,
        target: RenderTarget,
        config: PipelineConfig,
        cancel: CancelToken,
    ) -> Self {
        Self {
            slot_id,
            generation,
            bitmap,
            rotation,
            adjustments,
            target,
            config,
            cancel,
        }
    }

    pub fn slot_id(&self) -> SlotId {
        self.slot_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn run(self) -> RenderOutcome {
        let result = if self.cancel.is_cancelled() {
            Err(RenderError::Cancelled)
        } else {
            render(
                &self.bitmap,
                self.rotation,
                &self.adjustments,
                &self.target,
                &self.config,
            )
            .and_then(|rendered| {
                if self.cancel.is_cancelled() {
                    Err(RenderError::Cancelled)
                } else {
                    Ok(rendered)
                }
            })
        };
        RenderOutcome {
            slot_id: self.slot_id,
            generation: self.generation,
            rotation: self.rotation,
            adjustments: self.adjustments,
            result,
        }
    }
}
