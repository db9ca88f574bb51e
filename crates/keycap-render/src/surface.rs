use crate::layout::Baseline;
use crate::model::BoxRect;
use crate::raster::RasterHandle;
use crate::text::TextStyle;
use serde::Serialize;

/// Drawing target for the renderer.
///
/// Coordinates are local; the renderer brackets rotated content in `save`/`rotate`/`restore`.
pub trait Surface {
    fn save(&mut self);
    fn restore(&mut self);
    /// Rotates subsequent drawing by `angle_deg` about `(origin_x, origin_y)`.
    fn rotate(&mut self, angle_deg: f64, origin_x: f64, origin_y: f64);
    fn fill_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        style: &TextStyle,
        color: &str,
        baseline: Baseline,
    );
    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: &str, width: f64);
    fn stroke_rect(&mut self, rect: BoxRect, color: &str, width: f64);
    fn draw_raster(&mut self, raster: &RasterHandle, rect: BoxRect);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawOp {
    Save,
    Restore,
    #[serde(rename_all = "camelCase")]
    Rotate {
        angle: f64,
        origin_x: f64,
        origin_y: f64,
    },
    Text {
        text: String,
        x: f64,
        y: f64,
        font: String,
        color: String,
        baseline: Baseline,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        color: String,
        width: f64,
    },
    StrokeRect {
        rect: BoxRect,
        color: String,
        width: f64,
    },
    Raster {
        rect: BoxRect,
        pixels: (u32, u32),
    },
}

/// Surface that records every call; used by tests and the CLI's JSON output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordingSurface {
    pub ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn save(&mut self) {
        self.ops.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        self.ops.push(DrawOp::Restore);
    }

    fn rotate(&mut self, angle: f64, origin_x: f64, origin_y: f64) {
        self.ops.push(DrawOp::Rotate {
            angle,
            origin_x,
            origin_y,
        });
    }

    fn fill_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        style: &TextStyle,
        color: &str,
        baseline: Baseline,
    ) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            font: style.css_font(),
            color: color.to_string(),
            baseline,
        });
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: &str, width: f64) {
        self.ops.push(DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            color: color.to_string(),
            width,
        });
    }

    fn stroke_rect(&mut self, rect: BoxRect, color: &str, width: f64) {
        self.ops.push(DrawOp::StrokeRect {
            rect,
            color: color.to_string(),
            width,
        });
    }

    fn draw_raster(&mut self, raster: &RasterHandle, rect: BoxRect) {
        self.ops.push(DrawOp::Raster {
            rect,
            pixels: (raster.pixmap().width(), raster.pixmap().height()),
        });
    }
}
