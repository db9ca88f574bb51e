use crate::*;

fn t(text: &str, style: Style) -> Node {
    Node::text(text, style)
}

fn bold() -> Style {
    Style::PLAIN.with_bold()
}

fn italic() -> Style {
    Style::PLAIN.with_italic()
}

#[test]
fn nested_styles_inherit_top_down() {
    assert_eq!(
        parse("A <b>B <i>C</i> D</b> E"),
        vec![
            t("A ", Style::PLAIN),
            t("B ", bold()),
            t("C", bold().with_italic()),
            t(" D", bold()),
            t(" E", Style::PLAIN),
        ]
    );
}

#[test]
fn strong_and_em_are_aliases() {
    assert_eq!(
        parse("<STRONG>x</STRONG><Em>y</Em>"),
        vec![t("x", bold()), t("y", italic())]
    );
}

#[test]
fn br_variants_become_newline_text() {
    for input in ["a<br>b", "a<br/>b", "a<br />b", "a<BR class=\"x\">b", "a<br></br>b"] {
        assert_eq!(
            plain_text(&parse(input)),
            "a\nb",
            "input: {input}"
        );
    }
    assert_eq!(plain_text(&parse("Line 1<br>Line 2")), "Line 1\nLine 2");
}

#[test]
fn br_inherits_style() {
    assert_eq!(
        parse("<b>x<br>y</b>"),
        vec![t("x", bold()), t("\n", bold()), t("y", bold())]
    );
}

#[test]
fn empty_elements_are_suppressed() {
    assert_eq!(parse(r#"<i class="fa fa-icon"></i>"#), Vec::<Node>::new());
    assert_eq!(
        parse(r#"<i class="fa">icon text</i>"#),
        vec![t("icon text", italic())]
    );
    assert_eq!(parse("<span></span><b></b>"), Vec::<Node>::new());
}

#[test]
fn plain_text_without_tags_falls_back_to_single_node() {
    assert_eq!(parse("Esc"), vec![t("Esc", Style::PLAIN)]);
    assert_eq!(parse(""), vec![t("", Style::PLAIN)]);
    assert_eq!(parse("1 < 2"), vec![t("1 < 2", Style::PLAIN)]);
}

#[test]
fn image_attributes() {
    assert_eq!(
        parse(r#"<img src="x.png" width="32" height="32">"#),
        vec![Node::Image {
            src: "x.png".to_string(),
            width: Some(32.0),
            height: Some(32.0),
        }]
    );
    assert_eq!(
        parse(r#"<img src="x.png">"#),
        vec![Node::Image {
            src: "x.png".to_string(),
            width: None,
            height: None,
        }]
    );
    assert_eq!(parse("<img>"), Vec::<Node>::new());
}

#[test]
fn links_carry_full_text_content() {
    assert_eq!(
        parse(r#"<a href="https://example.com" target="_blank">go <b>here</b></a>"#),
        vec![Node::link("https://example.com", "go here", Style::PLAIN)]
    );
    assert_eq!(parse(r#"<a href="x"></a>"#), Vec::<Node>::new());
    assert_eq!(
        parse("<b><a href='x'>y</a></b>"),
        vec![Node::link("x", "y", bold())]
    );
}

#[test]
fn anchor_without_href_is_transparent() {
    assert_eq!(parse("<a name=\"top\">x</a>"), vec![t("x", Style::PLAIN)]);
}

#[test]
fn inline_graphic_keeps_raw_markup_and_size() {
    let svg = r#"<svg width="24" height="12"><rect width="24" height="12"/></svg>"#;
    assert_eq!(
        parse(&format!("a{svg}b")),
        vec![
            t("a", Style::PLAIN),
            Node::VectorGraphic {
                content: svg.to_string(),
                width: Some(24.0),
                height: Some(12.0),
            },
            t("b", Style::PLAIN),
        ]
    );
}

#[test]
fn inline_graphic_view_box_fallback_and_nesting() {
    let svg = r#"<svg viewBox="0 0 16 8"><svg><g/></svg><text>hi</text></svg>"#;
    assert_eq!(
        parse(svg),
        vec![Node::VectorGraphic {
            content: svg.to_string(),
            width: Some(16.0),
            height: Some(8.0),
        }]
    );

    let bare = "<svg><path d=\"M0 0\"/></svg>";
    assert_eq!(
        parse(bare),
        vec![Node::VectorGraphic {
            content: bare.to_string(),
            width: None,
            height: None,
        }]
    );
}

#[test]
fn transparent_elements_pass_style_through() {
    assert_eq!(
        parse("<b><span style=\"color:red\">x</span></b><div>y</div>"),
        vec![t("x", bold()), t("y", Style::PLAIN)]
    );
}

#[test]
fn malformed_markup_degrades_gracefully() {
    // Unclosed element closes at end of input.
    assert_eq!(parse("<b>bold"), vec![t("bold", bold())]);
    // Stray end tag is ignored.
    assert_eq!(parse("a</i>b"), vec![t("a", Style::PLAIN), t("b", Style::PLAIN)]);
    // An end tag closes everything opened inside it.
    assert_eq!(
        parse("<b><i>x</b>y"),
        vec![t("x", bold().with_italic()), t("y", Style::PLAIN)]
    );
}

#[test]
fn entities_are_decoded_in_text_and_attributes() {
    assert_eq!(parse("&lt;b&gt; &amp;"), vec![t("<b> &", Style::PLAIN)]);
    assert_eq!(
        parse("<a href=\"?a=1&amp;b=2\">q</a>"),
        vec![Node::link("?a=1&b=2", "q", Style::PLAIN)]
    );
}

#[test]
fn parse_is_deterministic() {
    let s = "x <b>y</b><ul><li>z</li></ul><img src=a.png>";
    assert_eq!(parse(s), parse(s));
}

#[test]
fn has_formatting_detects_any_element() {
    assert!(!has_formatting("plain"));
    assert!(!has_formatting("1 < 2"));
    assert!(!has_formatting("a</b>"));
    assert!(has_formatting("<b>x</b>"));
    assert!(has_formatting("<span>x</span>"));
    assert!(has_formatting("a<br>b"));
}

#[test]
fn strip_formatting_tags_only_removes_bold_and_italic() {
    assert_eq!(
        strip_formatting_tags(r#"<b>A</b> <I class="x">B</I> <strong>C</strong><em>D</em>"#),
        "A B CD"
    );
    assert_eq!(
        strip_formatting_tags(r#"<b><img src="x.png"></b><a href="y">z</a><br>"#),
        r#"<img src="x.png"><a href="y">z</a><br>"#
    );
}

#[test]
fn plain_text_skips_media() {
    let nodes = parse(r#"a<img src="x.png">b<svg width="1" height="1"></svg><a href="u">c</a>"#);
    assert_eq!(plain_text(&nodes), "abc");
}

#[test]
fn single_media_fast_path_detection() {
    assert!(matches!(
        single_media(r#"  <img src="x.png">  "#),
        Some(Node::Image { .. })
    ));
    assert!(matches!(
        single_media(r#"<svg viewBox="0 0 1 1"></svg>"#),
        Some(Node::VectorGraphic { .. })
    ));
    assert!(single_media(r#"<img src="x.png"> caption"#).is_none());
    assert!(single_media(r#"<img src="a.png"><img src="b.png">"#).is_none());
    assert!(single_media("text").is_none());
}

#[test]
fn deeply_nested_markup_is_flattened_past_the_depth_cap() {
    assert!(parse(&"<span>".repeat(5_000)).is_empty());
    assert_eq!(
        parse(&format!("{}x", "<span>".repeat(5_000))),
        vec![t("x", Style::PLAIN)]
    );

    let bold_run = format!("{}x{}", "<b>".repeat(5_000), "</b>".repeat(5_000));
    assert_eq!(parse(&bold_run), vec![t("x", bold())]);

    let lists = format!("{}deep", "<ul><li>".repeat(2_000));
    assert_eq!(plain_text(&parse(&lists)).trim_end(), "deep");
}
