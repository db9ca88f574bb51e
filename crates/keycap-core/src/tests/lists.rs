use crate::*;

fn item(text: &str) -> ListItem {
    ListItem {
        children: vec![Node::text(text, Style::PLAIN)],
    }
}

#[test]
fn unordered_and_ordered_lists() {
    assert_eq!(
        parse("<ul>\n  <li>a</li>\n  <li>b</li>\n</ul>"),
        vec![Node::List {
            ordered: false,
            items: vec![item("a"), item("b")],
        }]
    );
    assert!(matches!(
        parse("<OL><li>x</li></OL>").as_slice(),
        [Node::List { ordered: true, .. }]
    ));
}

#[test]
fn nested_lists_recurse() {
    let nodes = parse("<ul><li>a<ol><li>b</li></ol></li></ul>");
    assert_eq!(
        nodes,
        vec![Node::List {
            ordered: false,
            items: vec![ListItem {
                children: vec![
                    Node::text("a", Style::PLAIN),
                    Node::List {
                        ordered: true,
                        items: vec![item("b")],
                    },
                ],
            }],
        }]
    );
}

#[test]
fn empty_lists_and_media_only_items_vanish() {
    assert_eq!(parse("<ul></ul>"), Vec::<Node>::new());
    assert_eq!(parse("<ul><li></li></ul>"), Vec::<Node>::new());
    assert_eq!(parse("<ul><li><img src=\"x.png\"></li></ul>"), Vec::<Node>::new());
    assert_eq!(
        parse("<ul><li><img src=\"x.png\">cap</li></ul>"),
        vec![Node::List {
            ordered: false,
            items: vec![item("cap")],
        }]
    );
}

#[test]
fn list_items_keep_links_and_styles() {
    assert_eq!(
        parse("<ul><li><b>x</b> <a href=\"u\">y</a></li></ul>"),
        vec![Node::List {
            ordered: false,
            items: vec![ListItem {
                children: vec![
                    Node::text("x", Style::PLAIN.with_bold()),
                    Node::text(" ", Style::PLAIN),
                    Node::link("u", "y", Style::PLAIN),
                ],
            }],
        }]
    );
}

#[test]
fn plain_text_puts_each_item_on_its_own_line() {
    let nodes = parse("Keys:<ul><li>a</li><li>b<ul><li>c</li></ul></li></ul>");
    assert_eq!(plain_text(&nodes), "Keys:a\nbc\n\n");
}
