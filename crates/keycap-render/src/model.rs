use keycap_core::LabelConfig;
use keycap_core::geom::{self, Point, Rect};
use serde::{Deserialize, Serialize};

/// Axis-aligned box in un-rotated local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoxRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoxRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Inclusive on every edge.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    pub fn center(&self) -> Point {
        geom::point(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn to_rect(self) -> Rect {
        geom::rect(self.x, self.y, self.width, self.height)
    }
}

/// Rotation in degrees about an explicit origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Rotation {
    pub angle: f64,
    pub origin_x: f64,
    pub origin_y: f64,
}

impl Rotation {
    pub const NONE: Rotation = Rotation {
        angle: 0.0,
        origin_x: 0.0,
        origin_y: 0.0,
    };

    pub fn new(angle: f64, origin_x: f64, origin_y: f64) -> Self {
        Self {
            angle,
            origin_x,
            origin_y,
        }
    }

    pub fn origin(&self) -> Point {
        geom::point(self.origin_x, self.origin_y)
    }

    pub fn is_identity(&self) -> bool {
        self.angle == 0.0
    }
}

/// Colors the host supplies for one draw call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleContext {
    pub text_color: String,
    pub link_color: String,
    pub placeholder_color: String,
}

impl Default for StyleContext {
    fn default() -> Self {
        Self::from_config(&LabelConfig::default())
    }
}

impl StyleContext {
    pub fn from_config(config: &LabelConfig) -> Self {
        Self {
            text_color: config.text_color.clone(),
            link_color: config.link_color.clone(),
            placeholder_color: config.placeholder_color.clone(),
        }
    }

    pub fn with_text_color(&self, color: &str) -> Self {
        Self {
            text_color: color.to_string(),
            ..self.clone()
        }
    }
}
