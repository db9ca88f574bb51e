use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tunables for label parsing, layout and rendering.
///
/// Deserializes from camelCase JSON; every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelConfig {
    pub parse_cache_capacity: usize,
    pub raster_cache_capacity: usize,
    pub asset_cache_capacity: usize,
    /// Pending asset loads older than this fail on the next expiry sweep.
    pub asset_timeout_ms: u64,
    /// Size level used when a slot does not specify one.
    pub default_size_level: u32,
    pub line_height_factor: f64,
    pub font_family: String,
    pub text_color: String,
    pub link_color: String,
    pub placeholder_color: String,
    pub ellipsis: String,
    /// Device pixel ratio applied when rasterizing inline graphics.
    pub raster_scale: f32,
    /// Horizontal indent per list nesting level.
    pub list_indent: f64,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            parse_cache_capacity: 1000,
            raster_cache_capacity: 100,
            asset_cache_capacity: 200,
            asset_timeout_ms: 10_000,
            default_size_level: 3,
            line_height_factor: 1.2,
            font_family: "\"Helvetica Neue\", Helvetica, Arial, sans-serif".to_string(),
            text_color: "#000000".to_string(),
            link_color: "#0066cc".to_string(),
            placeholder_color: "#999999".to_string(),
            ellipsis: "\u{2026}".to_string(),
            raster_scale: 2.0,
            list_indent: 10.0,
        }
    }
}

impl LabelConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::InvalidConfig {
                message: "expected a JSON object".to_string(),
            });
        }
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns a copy with `overrides` deep-merged on top of this config.
    pub fn with_overrides(&self, overrides: &Value) -> Result<Self> {
        let mut base = serde_json::to_value(self)?;
        deep_merge_value(&mut base, overrides);
        Self::from_value(base)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.line_height_factor.is_finite() && self.line_height_factor > 0.0) {
            return Err(Error::InvalidConfig {
                message: format!(
                    "lineHeightFactor must be a positive number, got {}",
                    self.line_height_factor
                ),
            });
        }
        if !(self.raster_scale.is_finite() && self.raster_scale > 0.0) {
            return Err(Error::InvalidConfig {
                message: format!(
                    "rasterScale must be a positive number, got {}",
                    self.raster_scale
                ),
            });
        }
        Ok(())
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}
