//! Pure-Rust rasterization of inline graphics and decoding of loaded image assets.

use crate::{Error, Result};
use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Shared, immutable pixel buffer ready to be drawn.
///
/// `width`/`height` are the logical size of the asset (SVG user units or image pixels); the
/// pixmap itself may be larger when rasterized at a device scale.
#[derive(Clone)]
pub struct RasterHandle {
    pixmap: Arc<tiny_skia::Pixmap>,
    width: f64,
    height: f64,
}

impl fmt::Debug for RasterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterHandle")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels", &(self.pixmap.width(), self.pixmap.height()))
            .finish()
    }
}

impl RasterHandle {
    pub fn from_pixmap(pixmap: tiny_skia::Pixmap, width: f64, height: f64) -> Self {
        Self {
            pixmap: Arc::new(pixmap),
            width,
            height,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn pixmap(&self) -> &tiny_skia::Pixmap {
        &self.pixmap
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap.encode_png().map_err(|_| Error::PngEncode)
    }
}

/// System fonts, scanned on first use and shared by every rasterization after that.
fn font_database() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            tracing::debug!(faces = db.len(), "loaded system fonts");
            Arc::new(db)
        })
        .clone()
}

fn svg_options() -> usvg::Options<'static> {
    let mut opt = usvg::Options::default();
    opt.fontdb = font_database();
    // Keep output stable-ish across environments while still using system fonts.
    opt.font_family = "Arial".to_string();
    opt
}

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Inline label graphics are often written without a namespace; the SVG parser requires one.
fn with_svg_namespace(svg: &str) -> Cow<'_, str> {
    let trimmed = svg.trim_start();
    if !trimmed.starts_with("<svg") || svg.contains("xmlns=") {
        return Cow::Borrowed(svg);
    }
    let at = svg.len() - trimmed.len() + "<svg".len();
    Cow::Owned(format!("{} xmlns=\"{SVG_NS}\"{}", &svg[..at], &svg[at..]))
}

/// Rasterizes SVG source at `scale` device pixels per user unit.
pub fn rasterize_svg(svg: &str, scale: f32) -> Result<RasterHandle> {
    let svg = with_svg_namespace(svg);
    let tree = usvg::Tree::from_str(&svg, &svg_options()).map_err(|_| Error::SvgParse)?;
    let size = tree.size();

    let width_px = (size.width() * scale).ceil().max(1.0) as u32;
    let height_px = (size.height() * scale).ceil().max(1.0) as u32;
    let mut pixmap = tiny_skia::Pixmap::new(width_px, height_px).ok_or(Error::PixmapAlloc)?;

    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    tracing::trace!(width_px, height_px, "rasterized inline graphic");
    Ok(RasterHandle::from_pixmap(
        pixmap,
        f64::from(size.width()),
        f64::from(size.height()),
    ))
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start_matches('\u{feff}').trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

/// Decodes a fetched asset (SVG or any bitmap format `image` was built with).
pub fn decode_asset(bytes: &[u8], scale: f32) -> Result<RasterHandle> {
    if looks_like_svg(bytes) {
        let svg = std::str::from_utf8(bytes).map_err(|_| Error::SvgParse)?;
        return rasterize_svg(svg, scale);
    }

    let img = image::load_from_memory(bytes)
        .map_err(|e| Error::ImageDecode {
            message: e.to_string(),
        })?
        .to_rgba8();
    let (w, h) = img.dimensions();
    let size = tiny_skia::IntSize::from_wh(w, h).ok_or(Error::PixmapAlloc)?;

    // tiny-skia stores premultiplied RGBA.
    let mut data = img.into_raw();
    for px in data.chunks_exact_mut(4) {
        let c = tiny_skia::ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
        px[0] = c.red();
        px[1] = c.green();
        px[2] = c.blue();
    }
    let pixmap = tiny_skia::Pixmap::from_vec(data, size).ok_or(Error::PixmapAlloc)?;
    Ok(RasterHandle::from_pixmap(pixmap, f64::from(w), f64::from(h)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="20"><rect width="10" height="20" fill="black"/></svg>"#;

    #[test]
    fn rasterize_svg_reports_logical_size_and_scales_pixels() {
        let r = rasterize_svg(SQUARE, 2.0).unwrap();
        assert_eq!((r.width(), r.height()), (10.0, 20.0));
        assert_eq!((r.pixmap().width(), r.pixmap().height()), (20, 40));
    }

    #[test]
    fn namespace_is_added_to_bare_inline_graphics() {
        let bare = r#"<svg width="4" height="4"><rect width="4" height="4"/></svg>"#;
        assert_eq!(
            with_svg_namespace(bare),
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"><rect width="4" height="4"/></svg>"#
        );
        assert!(matches!(with_svg_namespace(SQUARE), Cow::Borrowed(_)));
        assert_eq!(rasterize_svg(bare, 1.0).unwrap().width(), 4.0);
    }

    #[test]
    fn font_database_is_loaded_once_and_shared() {
        assert!(Arc::ptr_eq(&font_database(), &font_database()));
        assert!(Arc::ptr_eq(&svg_options().fontdb, &svg_options().fontdb));
    }

    #[test]
    fn rasterize_svg_rejects_garbage() {
        assert!(matches!(
            rasterize_svg("<svg", 1.0),
            Err(Error::SvgParse)
        ));
    }

    #[test]
    fn decode_asset_round_trips_png() {
        let png = rasterize_svg(SQUARE, 1.0).unwrap().encode_png().unwrap();
        assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"));
        let decoded = decode_asset(&png, 1.0).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10.0, 20.0));
    }

    #[test]
    fn decode_asset_handles_svg_bytes() {
        let r = decode_asset(SQUARE.as_bytes(), 1.0).unwrap();
        assert_eq!(r.width(), 10.0);
    }

    #[test]
    fn decode_asset_reports_undecodable_bytes() {
        assert!(matches!(
            decode_asset(b"not an image", 1.0),
            Err(Error::ImageDecode { .. })
        ));
    }
}
