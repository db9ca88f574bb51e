use super::{Align, LayoutRequest, NodeMeasure};
use crate::model::BoxRect;
use keycap_core::Node;
use keycap_core::geom::round_coord;
use serde::Serialize;

/// A media-only label placed directly in its slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaPlacement {
    pub node: Node,
    #[serde(rename = "box")]
    pub bounds: BoxRect,
}

/// Positions a lone image or graphic against the slot anchor, skipping text layout.
///
/// The box keeps its measured aspect ratio and shrinks to fit the slot when it is larger.
pub fn place_media(node: Node, request: &LayoutRequest, m: &NodeMeasure<'_>) -> MediaPlacement {
    let (mut width, mut height) = m.media_box(&node);

    let mut scale: f64 = 1.0;
    if width > 0.0 && request.max_width.is_finite() && request.max_width > 0.0 {
        scale = scale.min(request.max_width / width);
    }
    if height > 0.0 && request.max_height.is_finite() && request.max_height > 0.0 {
        scale = scale.min(request.max_height / height);
    }
    width *= scale;
    height *= scale;

    let x = match request.align {
        Align::Left => request.x,
        Align::Center => request.x - width / 2.0,
        Align::Right => request.x - width,
    };
    let y = request.baseline.box_top(request.y, height);

    MediaPlacement {
        node,
        bounds: BoxRect::new(round_coord(x), round_coord(y), width, height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Baseline, NoMediaSizes};
    use crate::text::DeterministicTextMeasurer;

    fn img(width: Option<f64>, height: Option<f64>) -> Node {
        Node::Image {
            src: "x.png".to_string(),
            width,
            height,
        }
    }

    #[test]
    fn anchors_follow_align_and_baseline() {
        let request = LayoutRequest {
            x: 100.0,
            y: 50.0,
            align: Align::Right,
            baseline: Baseline::Alphabetic,
            ..LayoutRequest::default()
        };
        let measurer = DeterministicTextMeasurer::default();
        let m = NodeMeasure {
            measurer: &measurer,
            media: &NoMediaSizes,
            style: &request.style,
            line_height: request.line_height,
            list_indent: request.list_indent,
        };
        let placed = place_media(img(Some(20.0), Some(10.0)), &request, &m);
        assert_eq!(placed.bounds, BoxRect::new(80.0, 40.0, 20.0, 10.0));
    }

    #[test]
    fn oversized_media_shrinks_into_the_slot() {
        let request = LayoutRequest {
            max_width: 20.0,
            max_height: 40.0,
            align: Align::Center,
            baseline: Baseline::Middle,
            ..LayoutRequest::default()
        };
        let measurer = DeterministicTextMeasurer::default();
        let m = NodeMeasure {
            measurer: &measurer,
            media: &NoMediaSizes,
            style: &request.style,
            line_height: request.line_height,
            list_indent: request.list_indent,
        };
        let placed = place_media(img(Some(80.0), Some(40.0)), &request, &m);
        assert_eq!(placed.bounds, BoxRect::new(-10.0, -5.0, 20.0, 10.0));
    }
}
