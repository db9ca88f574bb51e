#![forbid(unsafe_code)]

//! Layout and rendering of keycap labels.
//!
//! Parsed label nodes are wrapped into aligned lines ([`layout::layout`]), drawn onto a
//! [`Surface`] by the [`LabelRenderer`], and clickable link regions are tracked for hit testing
//! ([`LinkTracker`]). Media assets go through the caches in [`resources`].

pub mod frame;
pub mod key;
pub mod layout;
pub mod links;
pub mod model;
pub mod raster;
pub mod render;
pub mod resources;
pub mod surface;
pub mod svg;
pub mod text;

pub use frame::FrameQueue;
pub use key::{KeyFace, LabelSlot, SlotAnchor, font_size};
pub use layout::{Align, Baseline, LabelLayout, LayoutRequest, Line, layout};
pub use links::{LinkRecord, LinkTracker};
pub use model::{BoxRect, Rotation, StyleContext};
pub use raster::RasterHandle;
pub use render::{LabelContent, LabelRenderer};
pub use resources::{AssetCache, AssetLoader, AssetState, QueuedLoader, VectorRasterCache};
pub use surface::{DrawOp, RecordingSurface, Surface};
pub use svg::SvgSurface;
pub use text::{DeterministicTextMeasurer, TextMeasurer, TextMetrics, TextStyle};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to parse SVG")]
    SvgParse,
    #[error("failed to allocate pixmap")]
    PixmapAlloc,
    #[error("failed to decode image: {message}")]
    ImageDecode { message: String },
    #[error("failed to encode PNG")]
    PngEncode,
    #[error(transparent)]
    Core(#[from] keycap_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
