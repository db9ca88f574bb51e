use keycap_core::LabelConfig;
use keycap_core::geom::{point, rotate_point};
use keycap_render::raster::rasterize_svg;
use keycap_render::{
    DrawOp, KeyFace, LabelContent, LabelRenderer, LabelSlot, LayoutRequest, RecordingSurface,
    Rotation, StyleContext, SvgSurface, TextMeasurer,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};

const DOT: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"><rect width="8" height="8"/></svg>"#;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn fixture(name: &str) -> String {
    let path = workspace_root().join("fixtures").join("labels").join(name);
    let text = std::fs::read_to_string(&path).expect("fixture");
    text.trim_end_matches('\n').to_string()
}

fn renderer() -> LabelRenderer {
    LabelRenderer::new(LabelConfig::default()).expect("default config is valid")
}

fn request(r: &LabelRenderer) -> LayoutRequest {
    LayoutRequest::from_config(r.config(), 12.0)
}

fn draw(r: &mut LabelRenderer, text: &str, rotation: Rotation) -> RecordingSurface {
    let mut surface = RecordingSurface::new();
    let req = request(r);
    r.render_label(&mut surface, text, &req, rotation, &StyleContext::default());
    surface
}

fn png_dot() -> Vec<u8> {
    rasterize_svg(DOT, 1.0).unwrap().encode_png().unwrap()
}

#[test]
fn plain_label_draws_one_run_inside_save_restore() {
    let mut r = renderer();
    let surface = draw(&mut r, "Hello world", Rotation::NONE);
    assert_eq!(surface.ops.first(), Some(&DrawOp::Save));
    assert_eq!(surface.ops.last(), Some(&DrawOp::Restore));
    assert_eq!(surface.texts(), ["Hello world"]);
    assert!(!surface.ops.iter().any(|op| matches!(op, DrawOp::Rotate { .. })));
    // Plain labels never reach the parse cache.
    assert_eq!(r.parse_cache().parse_count(), 0);
}

#[test]
fn formatted_labels_are_parsed_once() {
    let mut r = renderer();
    let label = fixture("styled.txt");
    draw(&mut r, &label, Rotation::NONE);
    draw(&mut r, &label, Rotation::NONE);
    assert_eq!(r.parse_cache().parse_count(), 1);
    assert_eq!(r.parse_cache().stats().hits, 1);
}

#[test]
fn cursor_advances_by_the_measured_width() {
    let mut r = renderer();
    let surface = draw(&mut r, &fixture("link.txt"), Rotation::NONE);
    let runs: Vec<_> = surface
        .ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::Text { text, x, color, .. } => Some((text.as_str(), *x, color.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(runs.len(), 2);
    let style = request(&r).style;
    let docs_width = r.measurer().measure("Docs", &style).width;
    assert_eq!(runs[0], ("Docs", 0.0, "#0066cc"));
    assert_eq!(runs[1].0, " here");
    assert!((runs[1].1 - docs_width).abs() < 1e-9);
    assert_eq!(runs[1].2, "#000000");
}

#[test]
fn links_are_hit_testable_after_render() {
    let mut r = renderer();
    draw(&mut r, &fixture("link.txt"), Rotation::NONE);
    let hit = r.hit_test(5.0, 5.0).expect("link hit");
    assert_eq!(hit.href, "https://example.com/docs");
    assert_eq!(hit.display_text, "Docs");
    assert!(r.hit_test(60.0, 5.0).is_none());

    // A new pass replaces the previous records.
    draw(&mut r, "no links", Rotation::NONE);
    assert!(r.hit_test(5.0, 5.0).is_none());
}

#[test]
fn rotated_links_hit_at_their_canvas_position() {
    let mut r = renderer();
    let rotation = Rotation::new(90.0, 0.0, 0.0);
    let surface = draw(&mut r, &fixture("link.txt"), rotation);
    assert_eq!(
        surface.ops[1],
        DrawOp::Rotate {
            angle: 90.0,
            origin_x: 0.0,
            origin_y: 0.0
        }
    );
    let record = r.links().records()[0].clone();
    let center = record.local_box().center();
    let canvas = rotate_point(center, point(0.0, 0.0), 90.0);
    assert_eq!(r.hit_test(canvas.x, canvas.y).map(|rec| rec.id), Some(record.id));
    assert!(r.hit_test(center.x, center.y).is_none());
}

#[test]
fn active_link_is_underlined() {
    let mut r = renderer();
    let has_line = |s: &RecordingSurface| s.ops.iter().any(|op| matches!(op, DrawOp::Line { .. }));

    assert!(!has_line(&draw(&mut r, &fixture("link.txt"), Rotation::NONE)));
    r.set_active_href(Some("https://example.com/docs".to_string()));
    assert!(has_line(&draw(&mut r, &fixture("link.txt"), Rotation::NONE)));
    r.set_active_href(Some("https://elsewhere.example".to_string()));
    assert!(!has_line(&draw(&mut r, &fixture("link.txt"), Rotation::NONE)));
}

#[test]
fn missing_image_draws_a_placeholder_until_loaded() {
    let mut r = renderer();
    let label = r#"<img src="dot.png" width="8" height="8">"#;

    let first = draw(&mut r, label, Rotation::NONE);
    assert!(first.ops.iter().any(|op| matches!(op, DrawOp::StrokeRect { .. })));
    assert_eq!(r.loader().requested(), ["dot.png".to_string()]);
    assert!(!r.flush_frame());

    assert!(r.complete_asset("dot.png", Ok(png_dot())));
    assert!(r.flush_frame());
    assert!(!r.flush_frame());

    let second = draw(&mut r, label, Rotation::NONE);
    assert!(second.ops.iter().any(|op| matches!(op, DrawOp::Raster { .. })));
    assert!(!second.ops.iter().any(|op| matches!(op, DrawOp::StrokeRect { .. })));
    assert_eq!(r.assets().loads_started(), 1);
}

#[test]
fn failed_images_are_skipped() {
    let mut r = renderer();
    let label = r#"<img src="gone.png">"#;
    draw(&mut r, label, Rotation::NONE);
    assert!(r.complete_asset("gone.png", Err("404".to_string())));
    assert!(r.flush_frame());
    let surface = draw(&mut r, label, Rotation::NONE);
    assert_eq!(surface.ops, vec![DrawOp::Save, DrawOp::Restore]);
}

#[test]
fn undecodable_bytes_fail_the_asset() {
    let mut r = renderer();
    draw(&mut r, r#"<img src="junk.png">"#, Rotation::NONE);
    r.complete_asset("junk.png", Ok(b"not an image".to_vec()));
    assert!(r.assets().loaded("junk.png").is_none());
    assert!(!r.assets().is_pending("junk.png"));
}

#[test]
fn repeated_images_share_one_load() {
    let mut r = renderer();
    draw(
        &mut r,
        r#"<img src="a.png" width="4" height="4"> and <img src="a.png" width="4" height="4">"#,
        Rotation::NONE,
    );
    assert_eq!(r.loader().requested().len(), 1);
    assert!(r.complete_asset("a.png", Ok(png_dot())));
    assert!(r.flush_frame());
}

#[test]
fn overdue_loads_time_out() {
    let mut r = renderer();
    draw(&mut r, r#"<img src="slow.png">"#, Rotation::NONE);
    assert!(!r.expire_overdue(Instant::now()));
    assert!(r.expire_overdue(Instant::now() + Duration::from_millis(10_001)));
    assert!(r.flush_frame());
    assert!(!r.assets().is_pending("slow.png"));
}

#[test]
fn lone_graphic_takes_the_media_path_with_its_own_size() {
    let mut r = renderer();
    let label = fixture("graphic.txt");
    let req = request(&r);
    let mut surface = RecordingSurface::new();
    let content = r.render_label(
        &mut surface,
        &label,
        &req,
        Rotation::NONE,
        &StyleContext::default(),
    );
    let LabelContent::Media(placed) = content else {
        panic!("expected media placement");
    };
    assert_eq!((placed.bounds.width, placed.bounds.height), (12.0, 8.0));
    let raster = surface
        .ops
        .iter()
        .find_map(|op| match op {
            DrawOp::Raster { pixels, .. } => Some(*pixels),
            _ => None,
        })
        .expect("graphic drawn");
    assert_eq!(raster, (24, 16));
}

#[test]
fn icon_markers_are_hidden() {
    let mut r = renderer();
    let surface = draw(&mut r, &fixture("icon.txt"), Rotation::NONE);
    assert_eq!(surface.texts(), ["Shift", "\u{2191}"]);
}

#[test]
fn list_rows_draw_markers_and_text() {
    let mut r = renderer();
    let surface = draw(&mut r, &fixture("list.txt"), Rotation::NONE);
    assert_eq!(
        surface.texts(),
        ["\u{2022} ", "Copy", "\u{2022} ", "Paste", "1. ", "plain"]
    );
}

#[test]
fn render_key_draws_every_slot_under_one_rotation() {
    let mut r = renderer();
    let face = KeyFace {
        rotation: Rotation::new(15.0, 27.0, 27.0),
        ..KeyFace::default()
    }
    .with_label(0, LabelSlot::new("A"))
    .with_label(
        8,
        LabelSlot {
            color: Some("#ff0000".to_string()),
            ..LabelSlot::new("<b>Z</b>")
        },
    )
    .with_label(10, LabelSlot::new("fn"));

    let mut surface = RecordingSurface::new();
    r.render_key(&mut surface, &face);

    let rotates = surface
        .ops
        .iter()
        .filter(|op| matches!(op, DrawOp::Rotate { .. }))
        .count();
    assert_eq!(rotates, 1);
    assert_eq!(surface.texts(), ["A", "Z", "fn"]);

    let texts: Vec<_> = surface
        .ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::Text { x, y, color, font, .. } => Some((*x, *y, color.clone(), font.clone())),
            _ => None,
        })
        .collect();
    assert_eq!((texts[0].0, texts[0].1), (3.0, 3.0));
    assert!(texts[0].3.starts_with("12px "));
    assert_eq!(texts[1].2, "#ff0000");
    assert!(texts[1].3.starts_with("bold 12px "));
    assert!(texts[2].3.starts_with("9.6"));
}

#[test]
fn svg_surface_writes_a_document() {
    let mut r = renderer();
    let mut surface = SvgSurface::new(54.0, 54.0);
    let req = request(&r);
    r.render_label(
        &mut surface,
        "<b>Esc</b> &amp; more",
        &req,
        Rotation::new(-30.0, 27.0, 27.0),
        &StyleContext::default(),
    );
    let svg = surface.finish();
    assert!(svg.contains(r#"<g transform="rotate(-30 27 27)">"#));
    assert!(svg.contains(r#"font-weight="bold""#));
    assert!(svg.contains("&amp; more</text>"));
    assert!(svg.ends_with("</g></svg>"));
}

fn text_rows(surface: &RecordingSurface) -> Vec<(String, f64)> {
    surface
        .ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::Text { text, y, .. } => Some((text.clone(), *y)),
            _ => None,
        })
        .collect()
}

#[test]
fn text_after_a_list_is_drawn_below_every_row() {
    let mut r = renderer();
    let lh = request(&r).line_height;
    let surface = draw(
        &mut r,
        "<ul><li>a</li><li>b</li><li>c</li></ul><br>after",
        Rotation::NONE,
    );
    let rows = text_rows(&surface);
    let y_of = |needle: &str| {
        rows.iter()
            .find(|(t, _)| t == needle)
            .map(|(_, y)| *y)
            .expect("text drawn")
    };
    assert!((y_of("c") - 2.0 * lh).abs() < 1e-6);
    assert!((y_of("after") - 3.0 * lh).abs() < 1e-6);
}

#[test]
fn tall_lists_are_clipped_to_the_slot_height() {
    let mut r = renderer();
    let req = request(&r);
    let req = LayoutRequest {
        max_height: req.line_height,
        ..req
    };
    let mut surface = RecordingSurface::new();
    r.render_label(
        &mut surface,
        "<ul><li>a</li><li>b</li><li>c</li><li>d</li></ul>",
        &req,
        Rotation::NONE,
        &StyleContext::default(),
    );
    assert_eq!(surface.texts(), ["\u{2022} ", "a"]);
    assert!(text_rows(&surface).iter().all(|(_, y)| *y < req.line_height));
}

#[test]
fn more_graphics_than_the_raster_cache_holds_settle_after_one_pass() {
    let config = LabelConfig {
        raster_cache_capacity: 1,
        ..LabelConfig::default()
    };
    let mut r = LabelRenderer::new(config).expect("valid config");
    let wide = r#"<svg xmlns="http://www.w3.org/2000/svg" width="6" height="4"><rect width="6" height="4"/></svg>"#;
    let label = format!("{DOT} {wide}");

    for _ in 0..5 {
        let surface = draw(&mut r, &label, Rotation::NONE);
        let rasters = surface
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Raster { .. }))
            .count();
        assert_eq!(rasters, 2);
        assert!(!surface.ops.iter().any(|op| matches!(op, DrawOp::StrokeRect { .. })));
        assert!(!r.flush_frame());
    }
}

#[test]
fn pending_images_attach_one_redraw_callback() {
    let mut r = renderer();
    let label = r#"<img src="dot.png" width="8" height="8">"#;
    for _ in 0..3 {
        draw(&mut r, label, Rotation::NONE);
    }
    assert!(r.complete_asset("dot.png", Ok(png_dot())));
    assert_eq!(r.frames().pending(), 1);
    assert!(r.flush_frame());
}
