//! Key face geometry: label slots, their anchors and font sizes.
//!
//! Slots `0..9` form the 3×3 grid of the top face in row-major order (top-left first); slots
//! `9..12` are the left/center/right legends on the front face.

use crate::layout::{Align, Baseline, LayoutRequest};
use crate::model::{BoxRect, Rotation};
use keycap_core::LabelConfig;
use serde::{Deserialize, Serialize};

pub const MAIN_SLOTS: usize = 9;
pub const FRONT_SLOTS: usize = 3;
pub const SLOT_COUNT: usize = MAIN_SLOTS + FRONT_SLOTS;

/// `6 + 2 * level`; front legends are capped at 10 and scaled by 0.8.
pub fn font_size(level: u32, front: bool) -> f64 {
    let size = 6.0 + 2.0 * f64::from(level);
    if front { (size * 0.8).min(10.0) } else { size }
}

pub fn is_front_slot(index: usize) -> bool {
    (MAIN_SLOTS..SLOT_COUNT).contains(&index)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelSlot {
    pub text: String,
    pub color: Option<String>,
    pub size_level: Option<u32>,
}

impl LabelSlot {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Host-supplied geometry of one key and the labels assigned to its slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeyFace {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Inset of the label area from the outer edge.
    pub padding: f64,
    /// Height of the front legend strip at the bottom of the key.
    pub front_height: f64,
    pub rotation: Rotation,
    pub text_color: Option<String>,
    pub size_level: Option<u32>,
    pub labels: Vec<Option<LabelSlot>>,
}

impl Default for KeyFace {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 54.0,
            height: 54.0,
            padding: 3.0,
            front_height: 12.0,
            rotation: Rotation::NONE,
            text_color: None,
            size_level: None,
            labels: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAnchor {
    pub x: f64,
    pub y: f64,
    pub align: Align,
    pub baseline: Baseline,
    pub max_width: f64,
    pub max_height: f64,
}

impl SlotAnchor {
    /// Layout request for this slot with the configured font at `font_size`.
    pub fn request(&self, config: &LabelConfig, font_size: f64) -> LayoutRequest {
        LayoutRequest {
            x: self.x,
            y: self.y,
            max_width: self.max_width,
            max_height: self.max_height,
            align: self.align,
            baseline: self.baseline,
            ..LayoutRequest::from_config(config, font_size)
        }
    }
}

impl KeyFace {
    pub fn with_label(mut self, index: usize, slot: LabelSlot) -> Self {
        if index < SLOT_COUNT {
            if self.labels.len() <= index {
                self.labels.resize(index + 1, None);
            }
            self.labels[index] = Some(slot);
        }
        self
    }

    pub fn main_area(&self) -> BoxRect {
        BoxRect::new(
            self.x + self.padding,
            self.y + self.padding,
            (self.width - 2.0 * self.padding).max(0.0),
            (self.height - 2.0 * self.padding - self.front_height).max(0.0),
        )
    }

    pub fn front_area(&self) -> BoxRect {
        BoxRect::new(
            self.x + self.padding,
            self.y + self.height - self.front_height,
            (self.width - 2.0 * self.padding).max(0.0),
            self.front_height.max(0.0),
        )
    }

    /// Anchor point, alignment and bounds for slot `index`; `None` past the last slot.
    pub fn slot_anchor(&self, index: usize) -> Option<SlotAnchor> {
        if index >= SLOT_COUNT {
            return None;
        }
        let (area, row, col) = if is_front_slot(index) {
            (self.front_area(), None, index - MAIN_SLOTS)
        } else {
            (self.main_area(), Some(index / 3), index % 3)
        };

        let (x, align) = match col {
            0 => (area.x, Align::Left),
            1 => (area.x + area.width / 2.0, Align::Center),
            _ => (area.x + area.width, Align::Right),
        };
        let (y, baseline) = match row {
            Some(0) => (area.y, Baseline::Hanging),
            Some(2) => (area.y + area.height, Baseline::Alphabetic),
            // Middle row and the single front row are centered vertically.
            _ => (area.y + area.height / 2.0, Baseline::Middle),
        };

        Some(SlotAnchor {
            x,
            y,
            align,
            baseline,
            max_width: area.width,
            max_height: area.height,
        })
    }

    /// Effective size level for slot `index`.
    pub fn slot_level(&self, index: usize, config: &LabelConfig) -> u32 {
        self.labels
            .get(index)
            .and_then(|s| s.as_ref())
            .and_then(|s| s.size_level)
            .or(self.size_level)
            .unwrap_or(config.default_size_level)
    }

    pub fn slot_font_size(&self, index: usize, config: &LabelConfig) -> f64 {
        font_size(self.slot_level(index, config), is_front_slot(index))
    }

    /// Non-empty labels with their slot index.
    pub fn filled_slots(&self) -> impl Iterator<Item = (usize, &LabelSlot)> {
        self.labels
            .iter()
            .take(SLOT_COUNT)
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().filter(|s| !s.text.is_empty()).map(|s| (i, s)))
    }
}
