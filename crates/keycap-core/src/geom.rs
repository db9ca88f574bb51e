#![forbid(unsafe_code)]

//! Geometry shared by layout, hit testing and the interactive rotate/mirror tools.
//!
//! Angles are in degrees, clockwise in a y-down coordinate system (the same convention as a
//! canvas `rotate()` call). Every coordinate produced here is rounded to
//! [`COORDINATE_PRECISION`] decimals so that repeated incremental edits do not accumulate
//! floating-point drift.

pub type Unit = euclid::UnknownUnit;

pub type Point = euclid::Point2D<f64, Unit>;
pub type Vector = euclid::Vector2D<f64, Unit>;
pub type Size = euclid::Size2D<f64, Unit>;
pub type Rect = euclid::Rect<f64, Unit>;

/// Decimal places kept on layout-relevant coordinates.
pub const COORDINATE_PRECISION: u32 = 6;

pub fn point(x: f64, y: f64) -> Point {
    euclid::point2(x, y)
}

pub fn vector(x: f64, y: f64) -> Vector {
    euclid::vec2(x, y)
}

pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Rect {
    euclid::rect(x, y, width, height)
}

/// Rounds `v` to `decimals` fractional digits (half away from zero).
///
/// Non-finite inputs collapse to `0.0`; `-0.0` is normalized to `0.0`.
pub fn round_to(v: f64, decimals: u32) -> f64 {
    if !v.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals as i32);
    let r = (v * factor).round() / factor;
    if r == 0.0 { 0.0 } else { r }
}

pub fn round_coord(v: f64) -> f64 {
    round_to(v, COORDINATE_PRECISION)
}

pub fn round_point(p: Point) -> Point {
    point(round_coord(p.x), round_coord(p.y))
}

/// Rotates `p` about `origin` by `angle_deg`.
pub fn rotate_point(p: Point, origin: Point, angle_deg: f64) -> Point {
    if angle_deg == 0.0 {
        return round_point(p);
    }
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let dx = p.x - origin.x;
    let dy = p.y - origin.y;
    point(
        round_coord(origin.x + dx * cos - dy * sin),
        round_coord(origin.y + dx * sin + dy * cos),
    )
}

/// Reflects a span `[position, position + extent]` across the axis at `line`.
///
/// Returns the new start coordinate: `2 * line - position - extent`.
pub fn mirror_coordinate(line: f64, position: f64, extent: f64) -> f64 {
    round_coord(2.0 * line - position - extent)
}

/// Corners of `r` after rotation, in top-left, top-right, bottom-right, bottom-left order.
pub fn rotated_corners(r: &Rect, origin: Point, angle_deg: f64) -> [Point; 4] {
    let min = r.min();
    let max = r.max();
    [
        rotate_point(point(min.x, min.y), origin, angle_deg),
        rotate_point(point(max.x, min.y), origin, angle_deg),
        rotate_point(point(max.x, max.y), origin, angle_deg),
        rotate_point(point(min.x, max.y), origin, angle_deg),
    ]
}

/// Axis-aligned bounds of `r` rotated about `origin`.
pub fn rotated_bounds(r: &Rect, origin: Point, angle_deg: f64) -> Rect {
    let corners = rotated_corners(r, origin, angle_deg);
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for c in corners {
        min_x = min_x.min(c.x);
        min_y = min_y.min(c.y);
        max_x = max_x.max(c.x);
        max_y = max_y.max(c.y);
    }
    rect(min_x, min_y, max_x - min_x, max_y - min_y)
}

/// Canvas-space position of the rotation handle drawn above a key.
///
/// The handle sits `offset` units above the top edge midpoint of `r` and follows the key's
/// rotation about `origin`.
pub fn rotation_control_point(r: &Rect, origin: Point, angle_deg: f64, offset: f64) -> Point {
    let local = point(r.origin.x + r.size.width / 2.0, r.origin.y - offset);
    rotate_point(local, origin, angle_deg)
}
