use super::list::{ListRow, list_rows};
use crate::text::{TextMeasurer, TextStyle};
use keycap_core::{Node, Style};

/// Natural (intrinsic) size lookup for media nodes.
///
/// Implementations must not trigger loads; an unknown size is `None`.
pub trait MediaSizes {
    fn natural_size(&self, node: &Node) -> Option<(f64, f64)>;
}

/// Media source that knows no sizes; every unsized asset becomes a placeholder square.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMediaSizes;

impl MediaSizes for NoMediaSizes {
    fn natural_size(&self, _node: &Node) -> Option<(f64, f64)> {
        None
    }
}

/// The single per-node width function shared by wrapping and drawing.
#[derive(Clone, Copy)]
pub struct NodeMeasure<'a> {
    pub measurer: &'a dyn TextMeasurer,
    pub media: &'a dyn MediaSizes,
    pub style: &'a TextStyle,
    pub line_height: f64,
    pub list_indent: f64,
}

impl NodeMeasure<'_> {
    pub fn text_width(&self, text: &str, style: Style) -> f64 {
        if text.is_empty() {
            return 0.0;
        }
        self.measurer.measure(text, &self.style.variant(style)).width
    }

    pub fn width(&self, node: &Node) -> f64 {
        match node {
            Node::Text { text, style } | Node::Link { text, style, .. } => {
                self.text_width(text, *style)
            }
            Node::Image { .. } | Node::VectorGraphic { .. } => self.media_box(node).0,
            Node::List { ordered, items } => list_rows(*ordered, items)
                .iter()
                .map(|row| self.row_width(row))
                .fold(0.0, f64::max),
        }
    }

    /// Box height of a node inside a line; text and links occupy one line.
    pub fn height(&self, node: &Node) -> f64 {
        match node {
            Node::Image { .. } | Node::VectorGraphic { .. } => self.media_box(node).1,
            Node::List { ordered, items } => {
                list_rows(*ordered, items).len() as f64 * self.line_height
            }
            _ => self.line_height,
        }
    }

    pub fn nodes_width(&self, nodes: &[Node]) -> f64 {
        nodes.iter().map(|n| self.width(n)).sum()
    }

    /// Display size of an image or graphic.
    ///
    /// Explicit dimensions win; a single explicit dimension takes the other from the natural
    /// aspect ratio. Without a natural size the missing side mirrors the given one, and a node
    /// with no size information at all becomes a `line_height` square.
    pub fn media_box(&self, node: &Node) -> (f64, f64) {
        let (width, height) = match node {
            Node::Image { width, height, .. } | Node::VectorGraphic { width, height, .. } => {
                (*width, *height)
            }
            _ => return (0.0, 0.0),
        };
        let natural = self
            .media
            .natural_size(node)
            .filter(|(w, h)| *w > 0.0 && *h > 0.0);

        match (width, height, natural) {
            (Some(w), Some(h), _) => (w, h),
            (Some(w), None, Some((nw, nh))) => (w, w * nh / nw),
            (None, Some(h), Some((nw, nh))) => (h * nw / nh, h),
            (Some(w), None, None) => (w, w),
            (None, Some(h), None) => (h, h),
            (None, None, Some(size)) => size,
            (None, None, None) => (self.line_height, self.line_height),
        }
    }

    /// Horizontal offset of a row's marker from the list's left edge.
    pub fn row_indent(&self, row: &ListRow) -> f64 {
        (row.depth + 1) as f64 * self.list_indent
    }

    pub fn row_width(&self, row: &ListRow) -> f64 {
        self.row_indent(row)
            + self.text_width(&row.marker, Style::PLAIN)
            + self.nodes_width(&row.nodes)
    }
}
