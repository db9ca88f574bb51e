//! Label markup parser.
//!
//! Labels use a small, closed HTML-like vocabulary: `<b>`/`<strong>`, `<i>`/`<em>`, `<br>`,
//! `<a href>`, `<img>`, inline `<svg>` blocks and `<ul>`/`<ol>`/`<li>` lists. Every other element
//! is transparent. Parsing never fails: malformed markup degrades to literal text.

mod graphic;
mod scanner;

use crate::entities::decode_entities;
use crate::model::{ListItem, Node, Style};
use regex::Regex;
use scanner::{Attr, Scanner, Token, attr};
use std::sync::OnceLock;

const VOID_ELEMENTS: &[&str] = &[
    "area", "br", "col", "hr", "img", "input", "link", "meta", "source", "wbr",
];

#[derive(Debug)]
struct Element {
    name: String,
    attrs: Vec<Attr>,
    children: Vec<Content>,
}

#[derive(Debug)]
enum Content {
    Text(String),
    Element(Element),
    Graphic {
        raw: String,
        width: Option<f64>,
        height: Option<f64>,
    },
}

struct Document {
    children: Vec<Content>,
    saw_tag: bool,
}

/// Deepest element nesting kept in the tree. Start tags past it are transparent, so their
/// content joins the innermost open element.
const MAX_DEPTH: usize = 256;

fn build_document(text: &str) -> Document {
    let mut scanner = Scanner::new(text);
    let mut root: Vec<Content> = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut saw_tag = false;

    fn push(stack: &mut [Element], root: &mut Vec<Content>, c: Content) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(c),
            None => root.push(c),
        }
    }

    let mut prev_was_text = false;
    while let Some(tok) = scanner.next() {
        let was_text = std::mem::replace(&mut prev_was_text, matches!(tok, Token::Text(_)));
        match tok {
            Token::Text(raw) => {
                if raw.is_empty() {
                    continue;
                }
                let decoded = decode_entities(raw);
                let siblings = match stack.last_mut() {
                    Some(parent) => &mut parent.children,
                    None => &mut root,
                };
                // A literal `<` splits the scanner's text runs; join them back up.
                match siblings.last_mut() {
                    Some(Content::Text(prev)) if was_text => prev.push_str(&decoded),
                    _ => siblings.push(Content::Text(decoded.into_owned())),
                }
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
                span,
            } => {
                saw_tag = true;
                if name == "svg" {
                    let end = if self_closing {
                        span.end
                    } else {
                        scanner
                            .skip_to_matching_end("svg")
                            .unwrap_or(scanner.source().len())
                    };
                    let (width, height) = graphic::graphic_dimensions(&attrs);
                    let raw = text[span.start..end].to_string();
                    push(
                        &mut stack,
                        &mut root,
                        Content::Graphic { raw, width, height },
                    );
                    continue;
                }

                let el = Element {
                    name,
                    attrs,
                    children: Vec::new(),
                };
                if self_closing || VOID_ELEMENTS.contains(&el.name.as_str()) {
                    push(&mut stack, &mut root, Content::Element(el));
                } else if stack.len() < MAX_DEPTH {
                    stack.push(el);
                }
            }
            Token::EndTag { name, .. } => {
                saw_tag = true;
                // Stray end tags are ignored; a matching one closes everything opened after it.
                let Some(idx) = stack.iter().rposition(|el| el.name == name) else {
                    continue;
                };
                while stack.len() > idx {
                    let Some(el) = stack.pop() else { break };
                    push(&mut stack, &mut root, Content::Element(el));
                }
            }
        }
    }

    // Unclosed elements close implicitly at end of input.
    while let Some(el) = stack.pop() {
        push(&mut stack, &mut root, Content::Element(el));
    }

    Document {
        children: root,
        saw_tag,
    }
}

fn text_content(children: &[Content], out: &mut String) {
    for c in children {
        match c {
            Content::Text(t) => out.push_str(t),
            Content::Element(el) => text_content(&el.children, out),
            Content::Graphic { .. } => {}
        }
    }
}

fn convert_children(children: &[Content], style: Style, out: &mut Vec<Node>) {
    for c in children {
        match c {
            Content::Text(t) => {
                if !t.is_empty() {
                    out.push(Node::text(t.clone(), style));
                }
            }
            Content::Graphic { raw, width, height } => out.push(Node::VectorGraphic {
                content: raw.clone(),
                width: *width,
                height: *height,
            }),
            Content::Element(el) => convert_element(el, style, out),
        }
    }
}

fn convert_element(el: &Element, style: Style, out: &mut Vec<Node>) {
    match el.name.as_str() {
        "b" | "strong" => convert_children(&el.children, style.with_bold(), out),
        "i" | "em" => convert_children(&el.children, style.with_italic(), out),
        "br" => out.push(Node::text("\n", style)),
        "a" => match attr(&el.attrs, "href") {
            Some(href) => {
                let mut text = String::new();
                text_content(&el.children, &mut text);
                if !text.is_empty() {
                    out.push(Node::link(href, text, style));
                }
            }
            None => convert_children(&el.children, style, out),
        },
        "img" => {
            let Some(src) = attr(&el.attrs, "src").filter(|s| !s.is_empty()) else {
                return;
            };
            out.push(Node::Image {
                src: src.to_string(),
                width: attr(&el.attrs, "width").and_then(graphic::parse_leading_number),
                height: attr(&el.attrs, "height").and_then(graphic::parse_leading_number),
            });
        }
        "ul" | "ol" => {
            let items = convert_list_items(&el.children, style);
            if !items.is_empty() {
                out.push(Node::List {
                    ordered: el.name == "ol",
                    items,
                });
            }
        }
        _ => convert_children(&el.children, style, out),
    }
}

fn convert_list_items(children: &[Content], style: Style) -> Vec<ListItem> {
    let mut items = Vec::new();
    for c in children {
        let Content::Element(el) = c else {
            continue;
        };
        if el.name != "li" {
            continue;
        }
        let mut nodes = Vec::new();
        convert_children(&el.children, style, &mut nodes);
        // Media is not rendered inside list items.
        nodes.retain(|n| !n.is_media());
        if !nodes.is_empty() {
            items.push(ListItem { children: nodes });
        }
    }
    items
}

/// Parses label markup into an ordered node tree.
///
/// Plain text without any tags comes back as a single unstyled text node. Markup whose elements
/// all resolve to nothing (e.g. icon markers like `<i class="fa fa-x"></i>`) yields no nodes.
pub fn parse(text: &str) -> Vec<Node> {
    let doc = build_document(text);
    let mut out = Vec::new();
    convert_children(&doc.children, Style::PLAIN, &mut out);
    if out.is_empty() && !doc.saw_tag {
        return vec![Node::text(text, Style::PLAIN)];
    }
    out
}

/// True when `text` contains at least one element.
pub fn has_formatting(text: &str) -> bool {
    if !text.contains('<') {
        return false;
    }
    Scanner::new(text).any(|t| matches!(t, Token::StartTag { .. }))
}

fn formatting_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)</?(?:b|strong|i|em)(?:\s[^>]*)?/?>").expect("valid regex")
    })
}

/// Removes bold/italic tags, leaving every other piece of markup untouched.
pub fn strip_formatting_tags(text: &str) -> String {
    formatting_tag_regex().replace_all(text, "").into_owned()
}

/// Concatenated text of `nodes`; list items each end with a newline, media is skipped.
pub fn plain_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    plain_text_into(nodes, &mut out);
    out
}

fn plain_text_into(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text { text, .. } | Node::Link { text, .. } => out.push_str(text),
            Node::List { items, .. } => {
                for item in items {
                    plain_text_into(&item.children, out);
                    out.push('\n');
                }
            }
            Node::Image { .. } | Node::VectorGraphic { .. } => {}
        }
    }
}

/// Recognizes labels that consist of exactly one `<img>` or one `<svg>` block.
///
/// Such labels skip text layout entirely and are placed directly in their slot.
pub fn single_media(text: &str) -> Option<Node> {
    let trimmed = text.trim();
    if !trimmed.starts_with('<') {
        return None;
    }
    let mut nodes = parse(trimmed);
    if nodes.len() != 1 || !nodes[0].is_media() {
        return None;
    }
    nodes.pop()
}
