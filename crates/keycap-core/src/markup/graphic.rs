//! Intrinsic size of inline `<svg>` blocks.

use super::scanner::{Attr, attr};
use std::str::FromStr;

/// Reads `width`/`height` from the root element, falling back to the `viewBox` size.
///
/// Returns `(None, None)` unless one of the two sources yields both dimensions.
pub(crate) fn graphic_dimensions(attrs: &[Attr]) -> (Option<f64>, Option<f64>) {
    let width = attr(attrs, "width").and_then(parse_absolute_length);
    let height = attr(attrs, "height").and_then(parse_absolute_length);
    if let (Some(w), Some(h)) = (width, height) {
        return (Some(w), Some(h));
    }

    match attr(attrs, "viewbox").map(svgtypes::ViewBox::from_str) {
        Some(Ok(vb)) => (Some(vb.w), Some(vb.h)),
        _ => (None, None),
    }
}

fn parse_absolute_length(raw: &str) -> Option<f64> {
    let len = svgtypes::Length::from_str(raw.trim()).ok()?;
    match len.unit {
        svgtypes::LengthUnit::None | svgtypes::LengthUnit::Px => {
            Some(len.number).filter(|n| n.is_finite() && *n >= 0.0)
        }
        _ => None,
    }
}

/// Leading decimal number of an attribute value (`"32px"` → `32`).
pub(crate) fn parse_leading_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    let b = s.as_bytes();
    let mut end = 0usize;
    let mut seen_digit = false;
    let mut seen_dot = false;
    while end < b.len() {
        match b[end] {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            b'+' | b'-' if end == 0 => {}
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return None;
    }
    s[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}
