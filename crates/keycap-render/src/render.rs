//! The label renderer: owns the caches, lays labels out and paints them onto a [`Surface`].

use crate::Result;
use crate::frame::FrameQueue;
use crate::key::KeyFace;
use crate::layout::{
    Baseline, LabelLayout, LayoutRequest, MediaPlacement, MediaSizes, NodeMeasure, layout,
    place_media,
};
use crate::links::{LinkRecord, LinkTracker};
use crate::model::{BoxRect, Rotation, StyleContext};
use crate::raster::{self, RasterHandle};
use crate::resources::{
    AssetCache, AssetCallback, AssetLoader, AssetState, QueuedLoader, RasterLookup,
    VectorRasterCache,
};
use crate::surface::Surface;
use crate::text::{DeterministicTextMeasurer, TextMeasurer};
use keycap_core::entities::decode_entities;
use keycap_core::{LabelConfig, Node, ParseCache, Style, has_formatting, single_media};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

const PLACEHOLDER_STROKE: f64 = 1.0;
const UNDERLINE_STROKE: f64 = 1.0;

/// A label after layout: wrapped lines, or a lone image/graphic placed in its slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LabelContent {
    Lines(LabelLayout),
    Media(MediaPlacement),
}

/// Inline graphics resolved for the current pass, keyed by source; `None` marks invalid SVG.
type PassRasters = FxHashMap<String, Option<RasterHandle>>;

struct CachedMediaSizes<'a> {
    pass: &'a PassRasters,
    rasters: &'a VectorRasterCache,
    assets: &'a AssetCache,
}

impl MediaSizes for CachedMediaSizes<'_> {
    fn natural_size(&self, node: &Node) -> Option<(f64, f64)> {
        match node {
            Node::Image { src, .. } => self.assets.loaded(src).map(|h| (h.width(), h.height())),
            Node::VectorGraphic { content, .. } => match self.pass.get(content) {
                Some(handle) => handle.as_ref().map(|h| (h.width(), h.height())),
                None => self.rasters.natural_size(content),
            },
            _ => None,
        }
    }
}

/// One positioned draw, computed before painting so measuring never overlaps cache mutation.
enum Paint {
    Run {
        text: String,
        style: Style,
        href: Option<String>,
        x: f64,
        y: f64,
        width: f64,
    },
    Media {
        node: Node,
        rect: BoxRect,
    },
}

fn plan_line_nodes(
    nodes: &[Node],
    mut x: f64,
    y: f64,
    baseline: Baseline,
    m: &NodeMeasure<'_>,
    out: &mut Vec<Paint>,
) {
    for node in nodes {
        let width = m.width(node);
        match node {
            Node::Text { text, style } => out.push(Paint::Run {
                text: text.clone(),
                style: *style,
                href: None,
                x,
                y,
                width,
            }),
            Node::Link { href, text, style } => out.push(Paint::Run {
                text: text.clone(),
                style: *style,
                href: Some(href.clone()),
                x,
                y,
                width,
            }),
            Node::Image { .. } | Node::VectorGraphic { .. } => {
                let height = m.height(node);
                out.push(Paint::Media {
                    node: node.clone(),
                    rect: BoxRect::new(x, baseline.box_top(y, height), width, height),
                });
            }
            Node::List { ordered, items } => {
                for (i, row) in crate::layout::list_rows(*ordered, items).iter().enumerate() {
                    let row_y = y + i as f64 * m.line_height;
                    let marker_x = x + m.row_indent(row);
                    let marker_width = m.text_width(&row.marker, Style::PLAIN);
                    out.push(Paint::Run {
                        text: row.marker.clone(),
                        style: Style::PLAIN,
                        href: None,
                        x: marker_x,
                        y: row_y,
                        width: marker_width,
                    });
                    plan_line_nodes(&row.nodes, marker_x + marker_width, row_y, baseline, m, out);
                }
            }
        }
        x += width;
    }
}

fn plan(layout: &LabelLayout, m: &NodeMeasure<'_>) -> Vec<Paint> {
    let mut out = Vec::new();
    for line in &layout.lines {
        plan_line_nodes(&line.nodes, line.x, line.y, layout.baseline, m, &mut out);
    }
    out
}

/// Renders labels with caches owned by this instance.
///
/// Image assets are fetched through `L`; when a load finishes the host calls
/// [`LabelRenderer::complete_asset`] and, on its next tick, [`LabelRenderer::flush_frame`],
/// which reports whether labels need to be rendered again.
pub struct LabelRenderer<L: AssetLoader = QueuedLoader> {
    config: LabelConfig,
    measurer: Arc<dyn TextMeasurer + Send + Sync>,
    parse_cache: ParseCache,
    rasters: VectorRasterCache,
    pass_rasters: PassRasters,
    assets: AssetCache,
    loader: L,
    frames: FrameQueue,
    links: LinkTracker,
    active_href: Option<String>,
    needs_render: Rc<Cell<bool>>,
}

impl LabelRenderer<QueuedLoader> {
    pub fn new(config: LabelConfig) -> Result<Self> {
        Self::with_loader(config, QueuedLoader::new())
    }
}

impl<L: AssetLoader> LabelRenderer<L> {
    pub fn with_loader(config: LabelConfig, loader: L) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            parse_cache: ParseCache::new(config.parse_cache_capacity),
            rasters: VectorRasterCache::new(config.raster_cache_capacity, config.raster_scale),
            pass_rasters: PassRasters::default(),
            assets: AssetCache::new(
                config.asset_cache_capacity,
                Duration::from_millis(config.asset_timeout_ms),
            ),
            config,
            measurer: Arc::new(DeterministicTextMeasurer::default()),
            loader,
            frames: FrameQueue::new(),
            links: LinkTracker::new(),
            active_href: None,
            needs_render: Rc::new(Cell::new(false)),
        })
    }

    pub fn with_measurer(mut self, measurer: Arc<dyn TextMeasurer + Send + Sync>) -> Self {
        self.measurer = measurer;
        self
    }

    pub fn config(&self) -> &LabelConfig {
        &self.config
    }

    pub fn measurer(&self) -> &dyn TextMeasurer {
        self.measurer.as_ref()
    }

    pub fn parse_cache(&self) -> &ParseCache {
        &self.parse_cache
    }

    pub fn rasters(&self) -> &VectorRasterCache {
        &self.rasters
    }

    pub fn assets(&self) -> &AssetCache {
        &self.assets
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    pub fn frames(&self) -> &FrameQueue {
        &self.frames
    }

    pub fn links(&self) -> &LinkTracker {
        &self.links
    }

    pub fn set_active_href(&mut self, href: Option<String>) {
        self.active_href = href;
    }

    pub fn active_href(&self) -> Option<&str> {
        self.active_href.as_deref()
    }

    /// Topmost link drawn at canvas point `(px, py)` during the last render pass.
    pub fn hit_test(&self, px: f64, py: f64) -> Option<&LinkRecord> {
        self.links.hit_test(px, py)
    }

    /// Parsed nodes for `text`. Labels without markup skip the parser and its cache.
    pub fn parse(&mut self, text: &str) -> Arc<[Node]> {
        if has_formatting(text) {
            return self.parse_cache.parse(text);
        }
        if text.is_empty() {
            return Arc::from(Vec::new());
        }
        Arc::from(vec![Node::text(decode_entities(text), Style::PLAIN)])
    }

    /// Resolves every inline graphic in `nodes` and holds the handles until the next layout.
    ///
    /// Drawing reads these handles, so a pass with more graphics than the raster cache holds
    /// still draws each of them without rasterizing again.
    fn prepare_graphics(&mut self, nodes: &[Node]) {
        self.pass_rasters.clear();
        for node in nodes {
            let Node::VectorGraphic { content, .. } = node else {
                continue;
            };
            if self.pass_rasters.contains_key(content) {
                continue;
            }
            let handle = match self.rasters.lookup(content) {
                RasterLookup::Hit(handle) => Some(handle),
                RasterLookup::Invalid => None,
                RasterLookup::Miss => self.rasters.rasterize(content),
            };
            self.pass_rasters.insert(content.clone(), handle);
        }
    }

    fn media_sizes(&self) -> CachedMediaSizes<'_> {
        CachedMediaSizes {
            pass: &self.pass_rasters,
            rasters: &self.rasters,
            assets: &self.assets,
        }
    }

    pub fn layout_nodes(&mut self, nodes: &[Node], request: &LayoutRequest) -> LabelLayout {
        self.prepare_graphics(nodes);
        layout(nodes, request, self.measurer.as_ref(), &self.media_sizes())
    }

    /// Lays out `text` in the request's box, taking the media-only path when it applies.
    pub fn layout_label(&mut self, text: &str, request: &LayoutRequest) -> LabelContent {
        if let Some(node) = single_media(text) {
            self.prepare_graphics(std::slice::from_ref(&node));
            let sizes = self.media_sizes();
            let m = NodeMeasure {
                measurer: self.measurer.as_ref(),
                media: &sizes,
                style: &request.style,
                line_height: request.line_height,
                list_indent: request.list_indent,
            };
            return LabelContent::Media(place_media(node, request, &m));
        }
        let nodes = self.parse(text);
        LabelContent::Lines(self.layout_nodes(&nodes, request))
    }

    /// Draws `layout` inside one rotation about `rotation`'s origin. Starts a new link pass.
    pub fn render(
        &mut self,
        surface: &mut dyn Surface,
        layout: &LabelLayout,
        rotation: Rotation,
        ctx: &StyleContext,
    ) {
        self.links.clear();
        begin_rotated(surface, rotation);
        self.draw_layout(surface, layout, rotation, ctx);
        surface.restore();
    }

    /// Lays out and draws one label; starts a new link pass.
    pub fn render_label(
        &mut self,
        surface: &mut dyn Surface,
        text: &str,
        request: &LayoutRequest,
        rotation: Rotation,
        ctx: &StyleContext,
    ) -> LabelContent {
        self.links.clear();
        let content = self.layout_label(text, request);
        begin_rotated(surface, rotation);
        self.draw_content(surface, &content, rotation, ctx);
        surface.restore();
        content
    }

    /// Draws every non-empty slot of `face` under the key's rotation; starts a new link pass.
    pub fn render_key(&mut self, surface: &mut dyn Surface, face: &KeyFace) {
        self.links.clear();
        begin_rotated(surface, face.rotation);
        let base_ctx = StyleContext::from_config(&self.config);
        for (index, slot) in face.filled_slots() {
            let Some(anchor) = face.slot_anchor(index) else {
                continue;
            };
            let request = anchor.request(&self.config, face.slot_font_size(index, &self.config));
            let color = slot
                .color
                .as_deref()
                .or(face.text_color.as_deref())
                .unwrap_or(&self.config.text_color);
            let ctx = base_ctx.with_text_color(color);
            let content = self.layout_label(&slot.text, &request);
            tracing::trace!(slot = index, "drawing key label");
            self.draw_content(surface, &content, face.rotation, &ctx);
        }
        surface.restore();
    }

    fn draw_content(
        &mut self,
        surface: &mut dyn Surface,
        content: &LabelContent,
        rotation: Rotation,
        ctx: &StyleContext,
    ) {
        match content {
            LabelContent::Lines(layout) => self.draw_layout(surface, layout, rotation, ctx),
            LabelContent::Media(placed) => {
                self.draw_media(surface, &placed.node, placed.bounds, ctx)
            }
        }
    }

    fn draw_layout(
        &mut self,
        surface: &mut dyn Surface,
        layout: &LabelLayout,
        rotation: Rotation,
        ctx: &StyleContext,
    ) {
        let paints = {
            let sizes = self.media_sizes();
            let m = layout.measure(self.measurer.as_ref(), &sizes);
            plan(layout, &m)
        };

        for paint in paints {
            match paint {
                Paint::Run {
                    text,
                    style,
                    href: None,
                    x,
                    y,
                    ..
                } => {
                    let font = layout.style.variant(style);
                    surface.fill_text(&text, x, y, &font, &ctx.text_color, layout.baseline);
                }
                Paint::Run {
                    text,
                    style,
                    href: Some(href),
                    x,
                    y,
                    width,
                } => {
                    let font = layout.style.variant(style);
                    surface.fill_text(&text, x, y, &font, &ctx.link_color, layout.baseline);

                    let top = layout.baseline.box_top(y, layout.line_height);
                    let area = BoxRect::new(x, top, width, layout.line_height);
                    self.links.register(&href, &text, area, rotation);

                    if self.active_href.as_deref() == Some(href.as_str()) {
                        let underline_y = layout.baseline.box_top(y, font.font_size)
                            + font.font_size
                            + UNDERLINE_STROKE;
                        surface.line(
                            x,
                            underline_y,
                            x + width,
                            underline_y,
                            &ctx.link_color,
                            UNDERLINE_STROKE,
                        );
                    }
                }
                Paint::Media { node, rect } => self.draw_media(surface, &node, rect, ctx),
            }
        }
    }

    fn draw_media(
        &mut self,
        surface: &mut dyn Surface,
        node: &Node,
        rect: BoxRect,
        ctx: &StyleContext,
    ) {
        match node {
            Node::VectorGraphic { content, .. } => {
                if let Some(prepared) = self.pass_rasters.get(content) {
                    if let Some(handle) = prepared {
                        surface.draw_raster(handle, rect);
                    }
                    return;
                }
                self.draw_uncached_graphic(surface, content, rect, ctx);
            }
            Node::Image { src, .. } => {
                // One redraw callback per load; later passes join the pending request.
                let callback = (!self.assets.is_pending(src)).then(|| self.redraw_callback());
                let state = self
                    .assets
                    .request(src, Instant::now(), &mut self.loader, callback);
                match state {
                    AssetState::Loaded(handle) => surface.draw_raster(&handle, rect),
                    AssetState::Pending => {
                        surface.stroke_rect(rect, &ctx.placeholder_color, PLACEHOLDER_STROKE)
                    }
                    AssetState::Failed => {}
                }
            }
            _ => {}
        }
    }

    /// Graphics drawn from a layout this renderer did not prepare.
    fn draw_uncached_graphic(
        &mut self,
        surface: &mut dyn Surface,
        content: &str,
        rect: BoxRect,
        ctx: &StyleContext,
    ) {
        match self.rasters.lookup(content) {
            RasterLookup::Hit(handle) => surface.draw_raster(&handle, rect),
            RasterLookup::Invalid => {}
            RasterLookup::Miss => {
                surface.stroke_rect(rect, &ctx.placeholder_color, PLACEHOLDER_STROKE);
                // Nothing to redraw when the cache cannot hold the result.
                if self.rasters.rasterize(content).is_some() && self.rasters.contains(content) {
                    self.schedule_render();
                }
            }
        }
    }

    fn redraw_callback(&self) -> AssetCallback {
        let flag = Rc::clone(&self.needs_render);
        Box::new(move |_state: &AssetState| flag.set(true))
    }

    fn schedule_render(&mut self) {
        let flag = Rc::clone(&self.needs_render);
        self.frames.schedule(Box::new(move || flag.set(true)));
    }

    /// Starts (or joins) a load for `url`; `callback` fires on the frame after it settles.
    pub fn request_asset(&mut self, url: &str, callback: Option<AssetCallback>) -> AssetState {
        self.assets
            .request(url, Instant::now(), &mut self.loader, callback)
    }

    /// Reports the outcome of a load started through the loader.
    ///
    /// Bytes are decoded here; undecodable data settles the asset as failed. Returns `true` when
    /// the frame queue was armed and the host should schedule a tick.
    pub fn complete_asset(
        &mut self,
        url: &str,
        outcome: std::result::Result<Vec<u8>, String>,
    ) -> bool {
        let handle = match outcome {
            Ok(bytes) => match raster::decode_asset(&bytes, self.config.raster_scale) {
                Ok(handle) => Some(handle),
                Err(err) => {
                    tracing::warn!(url, error = %err, "asset could not be decoded");
                    None
                }
            },
            Err(message) => {
                tracing::warn!(url, error = %message, "asset load failed");
                None
            }
        };
        self.assets
            .complete(url, handle)
            .is_some_and(|done| done.schedule_on(&mut self.frames))
    }

    /// Fails loads pending past the configured timeout.
    pub fn expire_overdue(&mut self, now: Instant) -> bool {
        let mut armed = false;
        for done in self.assets.expire_overdue(now) {
            armed |= done.schedule_on(&mut self.frames);
        }
        armed
    }

    /// Runs queued frame work; returns whether labels should be laid out and rendered again.
    pub fn flush_frame(&mut self) -> bool {
        self.frames.flush();
        self.needs_render.replace(false)
    }
}

fn begin_rotated(surface: &mut dyn Surface, rotation: Rotation) {
    surface.save();
    if !rotation.is_identity() {
        surface.rotate(rotation.angle, rotation.origin_x, rotation.origin_y);
    }
}
