//! Per-slot state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::compose::RenderedImage;
use crate::decode::{DecodedImage, SourceImage};
use crate::transform::{CropRegion, Rotation};
use crate::Adjustments;

/// Stable identity of a slot's contents. Survives compaction.
pub type SlotId = u64;

/// A decoded upload waiting for its crop.
#[derive(Debug, Clone)]
pub struct PendingSlot {
    pub id: SlotId,
    pub source: Arc<SourceImage>,
    pub file_name: String,
}

/// A cropped, rendered image.
#[derive(Debug, Clone)]
pub struct PopulatedSlot {
    pub id: SlotId,
    pub source: Arc<SourceImage>,
    pub crop: CropRegion,
    /// The cropped bitmap before rotation and adjustments. Every edit is
    /// rendered from this.
    pub cropped: Arc<DecodedImage>,
    pub rotation: Rotation,
    pub adjustments: Adjustments,
    pub rendered: RenderedImage,
    /// Latest render generation issued for this slot
    pub generation: u64,
}

impl PopulatedSlot {
    pub fn data_url(&self) -> String {
        self.rendered.to_data_url()
    }
}

#[derive(Debug, Clone, Default)]
pub enum ImageSlot {
    #[default]
    Empty,
    PendingCrop(PendingSlot),
    Populated(PopulatedSlot),
}

/// Slot variant without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotState {
    Empty,
    PendingCrop,
    Populated,
}

impl ImageSlot {
    pub fn state(&self) -> SlotState {
        match self {
            ImageSlot::Empty => SlotState::Empty,
            ImageSlot::PendingCrop(_) => SlotState::PendingCrop,
            ImageSlot::Populated(_) => SlotState::Populated,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ImageSlot::Empty)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ImageSlot::PendingCrop(_))
    }

    pub fn is_populated(&self) -> bool {
        matches!(self, ImageSlot::Populated(_))
    }

    pub fn id(&self) -> Option<SlotId> {
        match self {
            ImageSlot::Empty => None,
            ImageSlot::PendingCrop(p) => Some(p.id),
            ImageSlot::Populated(p) => Some(p.id),
        }
    }

    /// The source image behind a pending or populated slot.
    pub fn source(&self) -> Option<&Arc<SourceImage>> {
        match self {
            ImageSlot::Empty => None,
            ImageSlot::PendingCrop(p) => Some(&p.source),
            ImageSlot::Populated(p) => Some(&p.source),
        }
    }

    pub fn as_populated(&self) -> Option<&PopulatedSlot> {
        match self {
            ImageSlot::Populated(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_populated_mut(&mut self) -> Option<&mut PopulatedSlot> {
        match self {
            ImageSlot::Populated(p) => Some(p),
            _ => None,
        }
    }

    pub fn data_url(&self) -> Option<String> {
        self.as_populated().map(PopulatedSlot::data_url)
    }
}
