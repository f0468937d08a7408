//! Multi-image upload session.
//!
//! One [`UploadSession`] backs the uploader of a single product. It holds
//! exactly `max_images` slots, each `Empty`, `PendingCrop` or `Populated`:
//!
//! ```text
//! Empty --begin_batch/complete_decode--> PendingCrop --confirm_crop--> Populated
//!   ^                                                                     |
//!   +------------------------------- remove ------------------------------+
//! ```
//!
//! Non-empty slots always form a prefix of the slot list. Removing a slot
//! shifts later slots down and appends an `Empty` one.
//!
//! Decoding and re-rendering are issued as jobs ([`DecodeJob`],
//! [`RenderJob`]) and their outcomes fed back with
//! [`UploadSession::complete_decode`] and [`UploadSession::complete_render`].
//! Outcomes that arrive after [`UploadSession::close`], or that belong to a
//! superseded render, are dropped.

mod cancel;
mod job;
mod observer;
mod slot;

pub use cancel::CancelToken;
pub use job::{BatchTicket, DecodeJob, DecodeOutcome, RenderJob, RenderOutcome};
pub use observer::SlotObserver;
pub use slot::{ImageSlot, PendingSlot, PopulatedSlot, SlotId, SlotState};

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::catalog::Product;
use crate::compose::{render, RenderError, RenderTarget, RenderedImage};
use crate::config::PipelineConfig;
use crate::decode::{decode_image, validate_upload, DecodeError, SourceImage, UploadError, UploadFile};
use crate::transform::{rasterize, CropRegion, CropSelector, Rotation};
use crate::{AdjustmentChannel, Adjustments};

/// Errors from session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Slot {index} is out of range (session has {len} slots)")]
    SlotOutOfRange { index: usize, len: usize },

    #[error("No image is waiting to be cropped")]
    NotInCropMode,

    #[error("Slot {0} has no cropped image")]
    SlotNotPopulated(usize),

    #[error("Slot {0} is already empty")]
    SlotEmpty(usize),

    #[error("An upload is already in progress")]
    BatchInProgress,

    #[error("{given} images supplied but the product takes {max}")]
    TooManyImages { given: usize, max: usize },

    #[error("Upload session is closed")]
    Closed,
}

/// A decode that failed during a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    pub file_name: String,
    pub error: DecodeError,
}

/// Jobs for an accepted batch, plus what was turned away up front.
#[derive(Debug)]
pub struct BatchPlan {
    pub batch_id: u64,
    pub jobs: Vec<DecodeJob>,
    /// Files dropped because the product had no room for them
    pub truncated: usize,
    /// Files that failed validation
    pub rejected: Vec<UploadError>,
}

/// Summary of a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub batch_id: u64,
    /// Slot indices that received a new pending image, in submission order
    pub placed: Vec<usize>,
    pub failed: Vec<DecodeFailure>,
    pub truncated: usize,
    pub rejected: Vec<UploadError>,
}

#[derive(Debug)]
struct PendingBatch {
    batch_id: u64,
    outcomes: Vec<Option<DecodeOutcome>>,
    truncated: usize,
    rejected: Vec<UploadError>,
}

impl PendingBatch {
    fn is_complete(&self) -> bool {
        self.outcomes.iter().all(Option::is_some)
    }
}

#[derive(Debug, Clone)]
struct CropMode {
    index: usize,
    selector: CropSelector,
}

/// Upload, crop and edit state for one product.
pub struct UploadSession {
    target: RenderTarget,
    config: PipelineConfig,
    slots: Vec<ImageSlot>,
    crop: Option<CropMode>,
    batch: Option<PendingBatch>,
    next_batch_id: u64,
    next_slot_id: SlotId,
    cancel: CancelToken,
    closed: bool,
    observer: Option<Box<dyn SlotObserver>>,
}

impl fmt::Debug for UploadSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSession")
            .field("target", &self.target)
            .field("slots", &self.slots.iter().map(ImageSlot::state).collect::<Vec<_>>())
            .field("crop_index", &self.crop.as_ref().map(|c| c.index))
            .field("batch", &self.batch.as_ref().map(|b| b.batch_id))
            .field("closed", &self.closed)
            .finish()
    }
}

impl UploadSession {
    /// Create a session with `max_images` empty slots.
    pub fn new(max_images: usize, target: RenderTarget, config: PipelineConfig) -> Self {
        let max_images = max_images.max(1);
        Self {
            target,
            config: config.validated(),
            slots: vec![ImageSlot::Empty; max_images],
            crop: None,
            batch: None,
            next_batch_id: 1,
            next_slot_id: 1,
            cancel: CancelToken::new(),
            closed: false,
            observer: None,
        }
    }

    /// Session sized and targeted for a catalog product.
    pub fn for_product(product: &Product, config: PipelineConfig) -> Self {
        let config = config.validated();
        let target = product.render_target(&config);
        Self::new(product.required_images(), target, config)
    }

    /// Session re-hydrated from images already placed in the cart.
    pub fn with_existing(
        product: &Product,
        config: PipelineConfig,
        images: &[String],
    ) -> Result<Self, SessionError> {
        let mut session = Self::for_product(product, config);
        session.load_existing(images)?;
        Ok(session)
    }

    pub fn set_observer(&mut self, observer: impl SlotObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn max_images(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[ImageSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&ImageSlot> {
        self.slots.get(index)
    }

    pub fn populated_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_populated()).count()
    }

    pub fn pending_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_pending()).count()
    }

    /// Empty slots not already reserved by an in-flight batch.
    pub fn remaining_capacity(&self) -> usize {
        let empty = self.slots.iter().filter(|s| s.is_empty()).count();
        let reserved = self.batch.as_ref().map_or(0, |b| b.outcomes.len());
        empty.saturating_sub(reserved)
    }

    /// Every slot populated: the product can go in the cart.
    pub fn is_complete(&self) -> bool {
        self.populated_count() == self.max_images()
    }

    /// Populated data URLs in slot order.
    pub fn populated_images(&self) -> Vec<String> {
        self.slots.iter().filter_map(ImageSlot::data_url).collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Cancel outstanding jobs and stop accepting work.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.cancel.cancel();
        self.closed = true;
        self.batch = None;
        self.crop = None;
        log::info!("upload session closed");
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.closed {
            Err(SessionError::Closed)
        } else {
            Ok(())
        }
    }

    fn check_index(&self, index: usize) -> Result<(), SessionError> {
        if index < self.slots.len() {
            Ok(())
        } else {
            Err(SessionError::SlotOutOfRange {
                index,
                len: self.slots.len(),
            })
        }
    }

    fn populated(&self, index: usize) -> Result<&PopulatedSlot, SessionError> {
        self.check_index(index)?;
        self.slots[index]
            .as_populated()
            .ok_or(SessionError::SlotNotPopulated(index))
    }

    fn notify(&mut self) {
        let images = self.populated_images();
        if let Some(observer) = self.observer.as_mut() {
            observer.images_updated(&images);
        }
    }

    fn allocate_slot_id(&mut self) -> SlotId {
        let id = self.next_slot_id;
        self.next_slot_id += 1;
        id
    }

    // ----- Upload -----

    /// Validate a file selection and issue one decode job per accepted file.
    ///
    /// The selection is truncated to the remaining capacity first, then
    /// non-image files are dropped, then oversized files are rejected.
    pub fn begin_batch(&mut self, mut files: Vec<UploadFile>) -> Result<BatchPlan, SessionError> {
        self.ensure_open()?;
        if self.batch.is_some() {
            return Err(SessionError::BatchInProgress);
        }

        let capacity = self.remaining_capacity();
        if capacity == 0 && !files.is_empty() {
            return Err(UploadError::NoCapacity.into());
        }

        let truncated = files.len().saturating_sub(capacity);
        files.truncate(capacity);
        if truncated > 0 {
            log::info!("{} file(s) beyond remaining capacity ignored", truncated);
        }

        let batch_id = self.next_batch_id;
        self.next_batch_id += 1;

        let mut rejected = Vec::new();
        let mut accepted = Vec::new();
        for file in files {
            match validate_upload(&file, &self.config) {
                Ok(()) => accepted.push(file),
                Err(err @ UploadError::FileTooLarge { .. }) => {
                    log::warn!("{}", err);
                    rejected.push(err);
                }
                Err(err) => {
                    log::debug!("skipping upload: {}", err);
                    rejected.push(err);
                }
            }
        }

        let jobs: Vec<DecodeJob> = accepted
            .into_iter()
            .enumerate()
            .map(|(file_index, file)| {
                DecodeJob::new(
                    BatchTicket {
                        batch_id,
                        file_index,
                    },
                    file,
                    self.target,
                    self.config.clone(),
                    self.cancel.clone(),
                )
            })
            .collect();

        if !jobs.is_empty() {
            self.batch = Some(PendingBatch {
                batch_id,
                outcomes: std::iter::repeat_with(|| None).take(jobs.len()).collect(),
                truncated,
                rejected: rejected.clone(),
            });
            log::debug!("batch {} issued {} decode job(s)", batch_id, jobs.len());
        }

        Ok(BatchPlan {
            batch_id,
            jobs,
            truncated,
            rejected,
        })
    }

    /// Record a decode outcome. Returns the batch report once every job of
    /// the batch has reported.
    pub fn complete_decode(
        &mut self,
        outcome: DecodeOutcome,
    ) -> Result<Option<BatchReport>, SessionError> {
        if self.closed || self.cancel.is_cancelled() {
            log::warn!("dropping decode of {} after close", outcome.file_name);
            return Ok(None);
        }

        let Some(batch) = self.batch.as_mut() else {
            log::warn!("dropping decode of {}: no batch in progress", outcome.file_name);
            return Ok(None);
        };
        if batch.batch_id != outcome.ticket.batch_id {
            log::warn!(
                "dropping decode of {} from stale batch {}",
                outcome.file_name,
                outcome.ticket.batch_id
            );
            return Ok(None);
        }
        let file_index = outcome.ticket.file_index;
        match batch.outcomes.get_mut(file_index) {
            Some(entry) if entry.is_none() => *entry = Some(outcome),
            _ => {
                log::warn!(
                    "dropping unexpected decode result for file {} of batch {}",
                    outcome.ticket.file_index,
                    outcome.ticket.batch_id
                );
                return Ok(None);
            }
        }

        if !batch.is_complete() {
            return Ok(None);
        }

        let Some(batch) = self.batch.take() else {
            return Ok(None);
        };
        Ok(Some(self.place_batch(batch)))
    }

    fn place_batch(&mut self, batch: PendingBatch) -> BatchReport {
        let mut report = BatchReport {
            batch_id: batch.batch_id,
            truncated: batch.truncated,
            rejected: batch.rejected,
            ..BatchReport::default()
        };

        for outcome in batch.outcomes.into_iter().flatten() {
            match outcome.result {
                Ok(source) => {
                    let Some(index) = self.slots.iter().position(ImageSlot::is_empty) else {
                        report.rejected.push(UploadError::NoCapacity);
                        continue;
                    };
                    let id = self.allocate_slot_id();
                    self.slots[index] = ImageSlot::PendingCrop(PendingSlot {
                        id,
                        source: Arc::new(source),
                        file_name: outcome.file_name,
                    });
                    report.placed.push(index);
                }
                Err(error) => {
                    log::warn!("failed to decode {}: {}", outcome.file_name, error);
                    report.failed.push(DecodeFailure {
                        file_name: outcome.file_name,
                        error,
                    });
                }
            }
        }

        if self.crop.is_none() {
            if let Some(&first) = report.placed.first() {
                self.enter_crop_mode(first);
            }
        }
        log::info!(
            "batch {} placed {} image(s), {} failed",
            report.batch_id,
            report.placed.len(),
            report.failed.len()
        );
        report
    }

    /// Run a whole batch synchronously.
    pub fn upload_batch(&mut self, files: Vec<UploadFile>) -> Result<BatchReport, SessionError> {
        let plan = self.begin_batch(files)?;
        if plan.jobs.is_empty() {
            return Ok(BatchReport {
                batch_id: plan.batch_id,
                truncated: plan.truncated,
                rejected: plan.rejected,
                ..BatchReport::default()
            });
        }

        let mut report = None;
        for job in plan.jobs {
            report = self.complete_decode(job.run())?;
        }
        report.ok_or(SessionError::Closed)
    }

    // ----- Crop mode -----

    fn enter_crop_mode(&mut self, index: usize) {
        let Some(source) = self.slots.get(index).and_then(ImageSlot::source) else {
            self.crop = None;
            return;
        };
        let selector = CropSelector::for_target(
            source.width(),
            source.height(),
            &self.target,
            self.config.min_crop_size,
        );
        self.crop = Some(CropMode { index, selector });
    }

    /// Next pending slot after `index`, wrapping to earlier ones.
    fn next_pending_after(&self, index: usize) -> Option<usize> {
        let n = self.slots.len();
        (1..=n)
            .map(|offset| (index + offset) % n)
            .find(|&i| self.slots[i].is_pending())
    }

    pub fn is_cropping(&self) -> bool {
        self.crop.is_some()
    }

    /// Slot index currently being cropped.
    pub fn current_crop_index(&self) -> Option<usize> {
        self.crop.as_ref().map(|c| c.index)
    }

    pub fn crop_selector(&self) -> Option<&CropSelector> {
        self.crop.as_ref().map(|c| &c.selector)
    }

    fn selector_mut(&mut self) -> Result<&mut CropSelector, SessionError> {
        self.crop
            .as_mut()
            .map(|c| &mut c.selector)
            .ok_or(SessionError::NotInCropMode)
    }

    pub fn set_crop_region(&mut self, region: CropRegion) -> Result<CropRegion, SessionError> {
        Ok(self.selector_mut()?.set_region(region))
    }

    pub fn translate_crop(&mut self, dx: i64, dy: i64) -> Result<CropRegion, SessionError> {
        Ok(self.selector_mut()?.translate(dx, dy))
    }

    pub fn scale_crop(&mut self, factor: f64) -> Result<CropRegion, SessionError> {
        Ok(self.selector_mut()?.scale_about_center(factor))
    }

    pub fn reset_crop(&mut self) -> Result<CropRegion, SessionError> {
        Ok(self.selector_mut()?.reset())
    }

    /// Confirm the current crop box. Returns the slot that was populated.
    ///
    /// Crop mode moves on to the next pending slot, or ends if none remain.
    pub fn confirm_crop(&mut self) -> Result<usize, SessionError> {
        self.ensure_open()?;
        let mode = self.crop.as_ref().ok_or(SessionError::NotInCropMode)?;
        let index = mode.index;
        let region = mode.selector.region();

        let ImageSlot::PendingCrop(pending) = &self.slots[index] else {
            return Err(SessionError::NotInCropMode);
        };
        let id = pending.id;
        let source = Arc::clone(&pending.source);

        let cropped = rasterize(source.bitmap(), &region, &self.target, self.config.resize_filter)?;
        let rendered = render(
            &cropped,
            Rotation::Deg0,
            &Adjustments::default(),
            &self.target,
            &self.config,
        )?;

        self.slots[index] = ImageSlot::Populated(PopulatedSlot {
            id,
            source,
            crop: region,
            cropped: Arc::new(cropped),
            rotation: Rotation::Deg0,
            adjustments: Adjustments::default(),
            rendered,
            generation: 0,
        });
        log::info!("slot {} populated ({}x{} crop)", index, region.width, region.height);

        match self.next_pending_after(index) {
            Some(next) => self.enter_crop_mode(next),
            None => self.crop = None,
        }
        self.notify();
        Ok(index)
    }

    /// Set the crop box then confirm it.
    pub fn confirm_crop_region(&mut self, region: CropRegion) -> Result<usize, SessionError> {
        self.set_crop_region(region)?;
        self.confirm_crop()
    }

    /// Abandon every pending image and leave crop mode.
    pub fn cancel_crop(&mut self) {
        let before = self.slots.len();
        self.slots.retain(|s| !s.is_pending());
        self.slots.resize(before, ImageSlot::Empty);
        self.crop = None;
    }

    // ----- Editing -----

    /// Issue a re-render of a populated slot.
    ///
    /// The slot keeps its current rendering until the outcome is delivered
    /// with [`complete_render`](Self::complete_render); any older job still
    /// running for the slot is superseded.
    pub fn edit(
        &mut self,
        index: usize,
        rotation: Rotation,
        adjustments: Adjustments,
    ) -> Result<RenderJob, SessionError> {
        self.ensure_open()?;
        self.populated(index)?;
        let target = self.target;
        let config = self.config.clone();
        let cancel = self.cancel.clone();

        let slot = self.slots[index]
            .as_populated_mut()
            .ok_or(SessionError::SlotNotPopulated(index))?;
        slot.generation += 1;

        Ok(RenderJob::new(
            slot.id,
            slot.generation,
            Arc::clone(&slot.cropped),
            rotation,
            adjustments.clamped(),
            target,
            config,
            cancel,
        ))
    }

    /// Deliver a render outcome. Returns `true` if it replaced the slot's
    /// rendering.
    ///
    /// Failed renders leave the slot as it was and return the error.
    pub fn complete_render(&mut self, outcome: RenderOutcome) -> Result<bool, SessionError> {
        if self.closed || self.cancel.is_cancelled() {
            log::warn!("dropping render for slot id {} after close", outcome.slot_id);
            return Ok(false);
        }

        let Some(slot) = self
            .slots
            .iter_mut()
            .filter_map(ImageSlot::as_populated_mut)
            .find(|s| s.id == outcome.slot_id)
        else {
            log::warn!("dropping render for removed slot id {}", outcome.slot_id);
            return Ok(false);
        };

        if slot.generation != outcome.generation {
            log::warn!(
                "dropping stale render {} for slot id {} (latest {})",
                outcome.generation,
                outcome.slot_id,
                slot.generation
            );
            return Ok(false);
        }

        let rendered = outcome.result?;
        slot.rotation = outcome.rotation;
        slot.adjustments = outcome.adjustments;
        slot.rendered = rendered;
        log::debug!("slot id {} re-rendered", outcome.slot_id);

        self.notify();
        Ok(true)
    }

    /// Re-render synchronously.
    pub fn apply_edit(
        &mut self,
        index: usize,
        rotation: Rotation,
        adjustments: Adjustments,
    ) -> Result<(), SessionError> {
        let job = self.edit(index, rotation, adjustments)?;
        self.complete_render(job.run())?;
        Ok(())
    }

    /// Rotate a populated slot a quarter turn clockwise.
    pub fn rotate(&mut self, index: usize) -> Result<Rotation, SessionError> {
        let slot = self.populated(index)?;
        let rotation = slot.rotation.rotate_cw();
        let adjustments = slot.adjustments;
        self.apply_edit(index, rotation, adjustments)?;
        Ok(rotation)
    }

    /// Change one adjustment channel of a populated slot.
    pub fn set_adjustment(
        &mut self,
        index: usize,
        channel: AdjustmentChannel,
        value: f32,
    ) -> Result<Adjustments, SessionError> {
        let slot = self.populated(index)?;
        let rotation = slot.rotation;
        let mut adjustments = slot.adjustments;
        adjustments.set(channel, value);
        self.apply_edit(index, rotation, adjustments)?;
        Ok(adjustments)
    }

    /// Restore identity adjustments, keeping the rotation.
    pub fn reset_adjustments(&mut self, index: usize) -> Result<(), SessionError> {
        let rotation = self.populated(index)?.rotation;
        self.apply_edit(index, rotation, Adjustments::default())
    }

    /// Crop selector over a populated slot's source, starting from its
    /// current crop.
    pub fn recrop_selector(&self, index: usize) -> Result<CropSelector, SessionError> {
        let slot = self.populated(index)?;
        let mut selector = CropSelector::for_target(
            slot.source.width(),
            slot.source.height(),
            &self.target,
            self.config.min_crop_size,
        );
        selector.set_region(slot.crop);
        Ok(selector)
    }

    /// Crop a populated slot again from its source image.
    ///
    /// Rotation and adjustments are kept and re-applied.
    pub fn recrop(&mut self, index: usize, region: CropRegion) -> Result<CropRegion, SessionError> {
        self.ensure_open()?;
        let mut selector = self.recrop_selector(index)?;
        let region = selector.set_region(region);

        let slot = self.populated(index)?;
        let cropped = rasterize(
            slot.source.bitmap(),
            &region,
            &self.target,
            self.config.resize_filter,
        )?;
        let rendered = render(
            &cropped,
            slot.rotation,
            &slot.adjustments,
            &self.target,
            &self.config,
        )?;

        let slot = self.slots[index]
            .as_populated_mut()
            .ok_or(SessionError::SlotNotPopulated(index))?;
        slot.crop = region;
        slot.cropped = Arc::new(cropped);
        slot.rendered = rendered;
        slot.generation += 1;
        log::info!("slot {} re-cropped", index);

        self.notify();
        Ok(region)
    }

    /// Remove a slot, shifting later slots down.
    pub fn remove(&mut self, index: usize) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.check_index(index)?;
        if self.slots[index].is_empty() {
            return Err(SessionError::SlotEmpty(index));
        }

        let removed = self.slots.remove(index);
        self.slots.push(ImageSlot::Empty);
        log::info!("slot {} removed", index);

        match self.current_crop_index() {
            Some(current) if current > index => {
                if let Some(mode) = self.crop.as_mut() {
                    mode.index -= 1;
                }
            }
            Some(current) if current == index => {
                let resume = if self.slots[index].is_pending() {
                    Some(index)
                } else {
                    self.next_pending_after(index)
                };
                match resume {
                    Some(next) => self.enter_crop_mode(next),
                    None => self.crop = None,
                }
            }
            _ => {}
        }

        if removed.is_populated() {
            self.notify();
        }
        Ok(())
    }

    /// Replace every slot with images already rendered elsewhere.
    ///
    /// Each data URL becomes a populated slot whose source and rendering are
    /// the supplied image.
    pub fn load_existing(&mut self, images: &[String]) -> Result<(), SessionError> {
        self.ensure_open()?;
        if images.len() > self.slots.len() {
            return Err(SessionError::TooManyImages {
                given: images.len(),
                max: self.slots.len(),
            });
        }

        let mut loaded = Vec::with_capacity(self.slots.len());
        for url in images {
            let rendered = RenderedImage::from_data_url(url)?;
            let bitmap = decode_image(&rendered.bytes)?;
            let source = Arc::new(SourceImage::new(
                bitmap.clone(),
                rendered.bytes.clone(),
                rendered.mime.clone(),
            ));
            let id = self.allocate_slot_id();
            loaded.push(ImageSlot::Populated(PopulatedSlot {
                id,
                crop: CropRegion::full(bitmap.width, bitmap.height),
                source,
                cropped: Arc::new(bitmap),
                rotation: Rotation::Deg0,
                adjustments: Adjustments::default(),
                rendered,
                generation: 0,
            }));
        }
        loaded.resize(self.slots.len(), ImageSlot::Empty);

        self.slots = loaded;
        self.crop = None;
        self.batch = None;
        log::info!("loaded {} existing image(s)", images.len());
        self.notify();
        Ok(())
    }
}

impl Drop for UploadSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests;
