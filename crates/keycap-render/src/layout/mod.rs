//! Line layout for parsed labels.
//!
//! Nodes are split into hard lines at `\n`, greedily word-wrapped against `max_width`, capped to
//! the lines that fit in `max_height`, then positioned around the anchor according to
//! [`Align`] and [`Baseline`].

mod list;
mod measure;
mod media;

pub use list::{BULLET_MARKER, ListRow, list_rows};
pub use measure::{MediaSizes, NoMediaSizes, NodeMeasure};
pub use media::{MediaPlacement, place_media};

use crate::text::{TextMeasurer, TextStyle};
use keycap_core::geom::round_coord;
use keycap_core::{LabelConfig, Node, Style};
use serde::{Deserialize, Serialize};

/// Slack for width comparisons that sum several measured runs.
const WIDTH_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical anchoring of the line block relative to the request's `y`.
///
/// Each line's `y` is also the baseline the surface draws text at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Baseline {
    #[default]
    Hanging,
    Middle,
    Alphabetic,
}

impl Baseline {
    /// Top edge of a box of `height` whose baseline sits at `y`.
    pub fn box_top(self, y: f64, height: f64) -> f64 {
        match self {
            Baseline::Hanging => y,
            Baseline::Middle => y - height / 2.0,
            Baseline::Alphabetic => y - height,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Baseline::Hanging => "hanging",
            Baseline::Middle => "middle",
            Baseline::Alphabetic => "alphabetic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutRequest {
    pub x: f64,
    pub y: f64,
    pub max_width: f64,
    pub max_height: f64,
    pub align: Align,
    pub baseline: Baseline,
    pub line_height: f64,
    pub style: TextStyle,
    pub ellipsis: String,
    pub list_indent: f64,
}

impl Default for LayoutRequest {
    fn default() -> Self {
        Self::from_config(&LabelConfig::default(), crate::text::DEFAULT_FONT_SIZE)
    }
}

impl LayoutRequest {
    /// Unbounded request at the origin using the configured font and line height factor.
    pub fn from_config(config: &LabelConfig, font_size: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            max_width: f64::INFINITY,
            max_height: f64::INFINITY,
            align: Align::Left,
            baseline: Baseline::Hanging,
            line_height: font_size * config.line_height_factor,
            style: TextStyle::with_size(Some(config.font_family.clone()), font_size),
            ellipsis: config.ellipsis.clone(),
            list_indent: config.list_indent,
        }
    }

    pub fn max_lines(&self) -> usize {
        if self.line_height > 0.0 {
            // Saturating cast: an unbounded height keeps every line.
            (self.max_height / self.line_height).floor().max(0.0) as usize
        } else {
            usize::MAX
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub nodes: Vec<Node>,
    pub width: f64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelLayout {
    pub lines: Vec<Line>,
    pub line_height: f64,
    pub align: Align,
    pub baseline: Baseline,
    pub style: TextStyle,
    pub list_indent: f64,
    /// Rows dropped by the height cap; a list counts one per row.
    pub dropped_lines: usize,
}

impl LabelLayout {
    /// The measure used to produce this layout; drawing must advance with the same one.
    pub fn measure<'a>(
        &'a self,
        measurer: &'a dyn TextMeasurer,
        media: &'a dyn MediaSizes,
    ) -> NodeMeasure<'a> {
        NodeMeasure {
            measurer,
            media,
            style: &self.style,
            line_height: self.line_height,
            list_indent: self.list_indent,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.nodes.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Run {
    text: String,
    style: Style,
    href: Option<String>,
}

impl Run {
    fn space(style: Style, href: Option<String>) -> Self {
        Self {
            text: " ".to_string(),
            style,
            href,
        }
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone)]
enum Unit {
    /// One word, possibly made of several glued runs with different styles.
    Word(Vec<Run>),
    Block(Node),
}

#[derive(Debug, Clone)]
struct Placed {
    unit: Unit,
    /// Whitespace that separated this unit from the previous one in the source.
    space: Option<Run>,
}

#[derive(Debug, Clone, Default)]
struct LineBuf {
    nodes: Vec<Node>,
}

impl LineBuf {
    fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push_run(&mut self, run: &Run) {
        match (self.nodes.last_mut(), &run.href) {
            (Some(Node::Text { text, style }), None) if *style == run.style => {
                text.push_str(&run.text);
            }
            (Some(Node::Link { href, text, style }), Some(h))
                if href == h && *style == run.style =>
            {
                text.push_str(&run.text);
            }
            (_, None) => self.nodes.push(Node::text(run.text.clone(), run.style)),
            (_, Some(h)) => self
                .nodes
                .push(Node::link(h.clone(), run.text.clone(), run.style)),
        }
    }

    fn push_unit(&mut self, unit: &Unit) {
        match unit {
            Unit::Word(runs) => runs.iter().for_each(|r| self.push_run(r)),
            Unit::Block(node) => self.nodes.push(node.clone()),
        }
    }
}

fn is_word_break(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\u{c}')
}

fn hard_lines(nodes: &[Node]) -> Vec<Vec<Node>> {
    let mut lines: Vec<Vec<Node>> = vec![Vec::new()];
    for node in nodes {
        match node {
            Node::Text { text, style } if text.contains('\n') => {
                for (i, part) in text.split('\n').enumerate() {
                    if i > 0 {
                        lines.push(Vec::new());
                    }
                    if !part.is_empty() {
                        if let Some(line) = lines.last_mut() {
                            line.push(Node::text(part, *style));
                        }
                    }
                }
            }
            other => {
                if let Some(line) = lines.last_mut() {
                    line.push(other.clone());
                }
            }
        }
    }
    lines
}

fn units(line: &[Node]) -> Vec<Placed> {
    let mut out = Vec::new();
    let mut word: Vec<Run> = Vec::new();
    let mut word_space: Option<Run> = None;
    let mut gap: Option<Run> = None;

    fn flush(word: &mut Vec<Run>, space: &mut Option<Run>, out: &mut Vec<Placed>) {
        if !word.is_empty() {
            out.push(Placed {
                unit: Unit::Word(std::mem::take(word)),
                space: space.take(),
            });
        }
    }

    for node in line {
        let (text, style, href) = match node {
            Node::Text { text, style } => (text, *style, None),
            Node::Link { href, text, style } => (text, *style, Some(href)),
            block => {
                flush(&mut word, &mut word_space, &mut out);
                out.push(Placed {
                    unit: Unit::Block(block.clone()),
                    space: Some(gap.take().unwrap_or_else(|| Run::space(Style::PLAIN, None))),
                });
                gap = Some(Run::space(Style::PLAIN, None));
                continue;
            }
        };

        for (i, seg) in text.split(is_word_break).enumerate() {
            if i > 0 {
                flush(&mut word, &mut word_space, &mut out);
                gap = Some(Run::space(style, href.cloned()));
            }
            if seg.is_empty() {
                continue;
            }
            if word.is_empty() {
                word_space = gap.take();
            }
            word.push(Run {
                text: seg.to_string(),
                style,
                href: href.cloned(),
            });
        }
    }
    flush(&mut word, &mut word_space, &mut out);
    out
}

fn runs_width(runs: &[Run], m: &NodeMeasure<'_>) -> f64 {
    let mut buf = LineBuf::default();
    runs.iter().for_each(|r| buf.push_run(r));
    m.nodes_width(&buf.nodes)
}

/// Drops trailing characters (across glued runs) until `kept + ellipsis` fits.
///
/// When not even the bare ellipsis fits, the word is returned untouched and overflows.
fn truncate_word(runs: Vec<Run>, ellipsis: &str, max_width: f64, m: &NodeMeasure<'_>) -> Vec<Run> {
    let total: usize = runs.iter().map(Run::char_count).sum();
    for keep in (0..total).rev() {
        let mut out: Vec<Run> = Vec::new();
        let mut left = keep;
        for run in &runs {
            if left == 0 {
                break;
            }
            let n = run.char_count().min(left);
            out.push(Run {
                text: run.text.chars().take(n).collect(),
                ..run.clone()
            });
            left -= n;
        }
        match out.last_mut() {
            Some(last) => last.text.push_str(ellipsis),
            None => {
                if let Some(first) = runs.first() {
                    out.push(Run {
                        text: ellipsis.to_string(),
                        ..first.clone()
                    });
                }
            }
        }
        if runs_width(&out, m) <= max_width + WIDTH_EPSILON {
            return out;
        }
    }
    runs
}

fn wrap_line(hard: &[Node], request: &LayoutRequest, m: &NodeMeasure<'_>) -> Vec<Vec<Node>> {
    let mut lines = Vec::new();
    let mut current = LineBuf::default();

    for placed in units(hard) {
        if !current.is_empty() {
            let mut trial = current.clone();
            if let Some(space) = &placed.space {
                trial.push_run(space);
            }
            trial.push_unit(&placed.unit);
            if m.nodes_width(&trial.nodes) <= request.max_width + WIDTH_EPSILON {
                current = trial;
                continue;
            }
            lines.push(std::mem::take(&mut current).nodes);
        }

        let unit = match placed.unit {
            Unit::Word(runs) if runs_width(&runs, m) > request.max_width + WIDTH_EPSILON => {
                Unit::Word(truncate_word(runs, &request.ellipsis, request.max_width, m))
            }
            unit => unit,
        };
        current.push_unit(&unit);
    }

    lines.push(current.nodes);
    lines
}

/// Rows a wrapped line occupies: one, or the row count of its tallest list.
fn line_span(nodes: &[Node]) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            Node::List { items, .. } => list::row_count(items),
            _ => 1,
        })
        .fold(1, usize::max)
}

/// Keeps the leading lines whose rows fit in `max_rows`, each paired with its span.
///
/// A list line that only partly fits keeps its first rows. Returns the kept lines and the number
/// of rows dropped.
fn cap_lines(wrapped: Vec<Vec<Node>>, max_rows: usize) -> (Vec<(Vec<Node>, usize)>, usize) {
    let mut kept = Vec::new();
    let mut used = 0usize;
    let mut dropped = 0usize;
    for nodes in wrapped {
        let span = line_span(&nodes);
        let left = max_rows.saturating_sub(used);
        if span <= left {
            used += span;
            kept.push((nodes, span));
        } else if left > 0 && span > 1 {
            let nodes = nodes
                .into_iter()
                .map(|node| match node {
                    Node::List { ordered, items } if list::row_count(&items) > left => {
                        Node::List {
                            ordered,
                            items: list::truncate_rows(&items, left),
                        }
                    }
                    other => other,
                })
                .collect();
            used += left;
            dropped += span - left;
            kept.push((nodes, left));
        } else {
            dropped += span;
        }
    }
    (kept, dropped)
}

/// Wraps and positions `nodes` inside the request's box.
pub fn layout(
    nodes: &[Node],
    request: &LayoutRequest,
    measurer: &dyn TextMeasurer,
    media: &dyn MediaSizes,
) -> LabelLayout {
    let m = NodeMeasure {
        measurer,
        media,
        style: &request.style,
        line_height: request.line_height,
        list_indent: request.list_indent,
    };

    let mut wrapped: Vec<Vec<Node>> = Vec::new();
    if !nodes.is_empty() {
        for hard in hard_lines(nodes) {
            wrapped.extend(wrap_line(&hard, request, &m));
        }
    }

    let (kept, dropped_lines) = cap_lines(wrapped, request.max_lines());

    let total: usize = kept.iter().map(|(_, span)| span).sum();
    let lh = request.line_height;
    let mut first_row = 0usize;
    let lines = kept
        .into_iter()
        .map(|(nodes, span)| {
            let row = first_row;
            first_row += span;
            let width = m.nodes_width(&nodes);
            let x = match request.align {
                Align::Left => request.x,
                Align::Center => request.x - width / 2.0,
                Align::Right => request.x - width,
            };
            let y = match request.baseline {
                Baseline::Hanging => request.y + row as f64 * lh,
                Baseline::Middle => request.y - (total - 1) as f64 * lh / 2.0 + row as f64 * lh,
                Baseline::Alphabetic => request.y - (total - 1 - row) as f64 * lh,
            };
            Line {
                nodes,
                width,
                x: round_coord(x),
                y: round_coord(y),
            }
        })
        .collect();

    LabelLayout {
        lines,
        line_height: lh,
        align: request.align,
        baseline: request.baseline,
        style: request.style.clone(),
        list_indent: request.list_indent,
        dropped_lines,
    }
}
