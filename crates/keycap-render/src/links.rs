use crate::model::{BoxRect, Rotation};
use keycap_core::geom::{point, rotate_point};
use serde::Serialize;

/// A clickable link region recorded during one render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    pub id: u64,
    pub href: String,
    pub display_text: String,
    pub local_x: f64,
    pub local_y: f64,
    pub local_width: f64,
    pub local_height: f64,
    pub rotation_angle: f64,
    pub rotation_origin_x: f64,
    pub rotation_origin_y: f64,
}

impl LinkRecord {
    pub fn local_box(&self) -> BoxRect {
        BoxRect::new(
            self.local_x,
            self.local_y,
            self.local_width,
            self.local_height,
        )
    }

    pub fn rotation(&self) -> Rotation {
        Rotation::new(
            self.rotation_angle,
            self.rotation_origin_x,
            self.rotation_origin_y,
        )
    }

    /// Whether canvas point `(px, py)` falls inside the (rotated) region.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        let (x, y) = if self.rotation_angle != 0.0 {
            let p = rotate_point(
                point(px, py),
                self.rotation().origin(),
                -self.rotation_angle,
            );
            (p.x, p.y)
        } else {
            (px, py)
        };
        self.local_box().contains(x, y)
    }
}

/// Clickable regions of the current render pass.
///
/// Ids keep increasing across [`LinkTracker::clear`], so a stale id never names a new record.
#[derive(Debug, Default)]
pub struct LinkTracker {
    records: Vec<LinkRecord>,
    next_id: u64,
}

impl LinkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn register(
        &mut self,
        href: &str,
        display_text: &str,
        local: BoxRect,
        rotation: Rotation,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.records.push(LinkRecord {
            id,
            href: href.to_string(),
            display_text: display_text.to_string(),
            local_x: local.x,
            local_y: local.y,
            local_width: local.width,
            local_height: local.height,
            rotation_angle: rotation.angle,
            rotation_origin_x: rotation.origin_x,
            rotation_origin_y: rotation.origin_y,
        });
        id
    }

    /// Topmost (last registered) record containing the point.
    pub fn hit_test(&self, px: f64, py: f64) -> Option<&LinkRecord> {
        self.records.iter().rev().find(|r| r.contains(px, py))
    }

    pub fn records(&self) -> &[LinkRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_records_win_overlaps() {
        let mut t = LinkTracker::new();
        t.register("a", "A", BoxRect::new(0.0, 0.0, 10.0, 10.0), Rotation::NONE);
        let top = t.register("b", "B", BoxRect::new(5.0, 5.0, 10.0, 10.0), Rotation::NONE);
        assert_eq!(t.hit_test(7.0, 7.0).map(|r| r.id), Some(top));
        assert_eq!(t.hit_test(1.0, 1.0).map(|r| r.href.as_str()), Some("a"));
        assert!(t.hit_test(30.0, 30.0).is_none());
    }

    #[test]
    fn box_edges_are_inclusive() {
        let mut t = LinkTracker::new();
        t.register("a", "A", BoxRect::new(0.0, 0.0, 10.0, 10.0), Rotation::NONE);
        assert!(t.hit_test(10.0, 10.0).is_some());
        assert!(t.hit_test(0.0, 0.0).is_some());
    }

    #[test]
    fn ids_keep_increasing_after_clear() {
        let mut t = LinkTracker::new();
        let first = t.register("a", "A", BoxRect::new(0.0, 0.0, 1.0, 1.0), Rotation::NONE);
        t.clear();
        assert!(t.is_empty());
        assert!(t.hit_test(0.5, 0.5).is_none());
        let second = t.register("a", "A", BoxRect::new(0.0, 0.0, 1.0, 1.0), Rotation::NONE);
        assert!(second > first);
    }
}
