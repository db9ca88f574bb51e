use keycap_core::{ListItem, Node};

pub const BULLET_MARKER: &str = "\u{2022} ";

/// One drawn row of a (possibly nested) list.
///
/// `nodes` holds only text and link runs; breaks inside an item are flattened to spaces.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRow {
    pub depth: usize,
    pub marker: String,
    pub nodes: Vec<Node>,
}

pub fn list_rows(ordered: bool, items: &[ListItem]) -> Vec<ListRow> {
    let mut rows = Vec::new();
    push_rows(ordered, items, 0, &mut rows);
    rows
}

fn push_rows(ordered: bool, items: &[ListItem], depth: usize, rows: &mut Vec<ListRow>) {
    for (idx, item) in items.iter().enumerate() {
        let marker = if ordered {
            format!("{}. ", idx + 1)
        } else {
            BULLET_MARKER.to_string()
        };
        let row_at = rows.len();
        rows.push(ListRow {
            depth,
            marker,
            nodes: Vec::new(),
        });

        for child in &item.children {
            match child {
                Node::Text { text, style } => {
                    push_run(&mut rows[row_at].nodes, Node::text(flatten(text), *style))
                }
                Node::Link { href, text, style } => push_run(
                    &mut rows[row_at].nodes,
                    Node::link(href.clone(), flatten(text), *style),
                ),
                Node::List { ordered, items } => push_rows(*ordered, items, depth + 1, rows),
                Node::Image { .. } | Node::VectorGraphic { .. } => {}
            }
        }
    }
}

/// Number of rows `items` draws, nested lists included.
pub fn row_count(items: &[ListItem]) -> usize {
    items
        .iter()
        .map(|item| {
            1 + item
                .children
                .iter()
                .map(|child| match child {
                    Node::List { items, .. } => row_count(items),
                    _ => 0,
                })
                .sum::<usize>()
        })
        .sum()
}

/// The leading items of a list that draw at most `max_rows` rows, in row order.
pub fn truncate_rows(items: &[ListItem], max_rows: usize) -> Vec<ListItem> {
    let mut budget = max_rows;
    take_rows(items, &mut budget)
}

fn take_rows(items: &[ListItem], budget: &mut usize) -> Vec<ListItem> {
    let mut out = Vec::new();
    for item in items {
        if *budget == 0 {
            break;
        }
        *budget -= 1;
        let mut children = Vec::new();
        for child in &item.children {
            match child {
                Node::List { ordered, items } => {
                    let kept = take_rows(items, budget);
                    if !kept.is_empty() {
                        children.push(Node::List {
                            ordered: *ordered,
                            items: kept,
                        });
                    }
                }
                other => children.push(other.clone()),
            }
        }
        out.push(ListItem { children });
    }
    out
}

fn flatten(text: &str) -> String {
    text.replace('\n', " ")
}

fn push_run(nodes: &mut Vec<Node>, node: Node) {
    if let (Some(Node::Text { text, style }), Node::Text { text: more, style: s }) =
        (nodes.last_mut(), &node)
    {
        if style == s {
            text.push_str(more);
            return;
        }
    }
    nodes.push(node);
}

#[cfg(test)]
mod tests {
    use super::*;
    use keycap_core::{Style, parse};

    fn rows_of(markup: &str) -> Vec<ListRow> {
        match parse(markup).as_slice() {
            [Node::List { ordered, items }] => list_rows(*ordered, items),
            other => panic!("expected a single list, got {other:?}"),
        }
    }

    #[test]
    fn ordered_rows_are_numbered() {
        let rows = rows_of("<ol><li>one</li><li>two</li></ol>");
        let markers: Vec<_> = rows.iter().map(|r| r.marker.as_str()).collect();
        assert_eq!(markers, ["1. ", "2. "]);
        assert_eq!(rows[1].nodes, vec![Node::text("two", Style::PLAIN)]);
    }

    #[test]
    fn nested_lists_follow_their_parent_row() {
        let rows = rows_of("<ul><li>a<ol><li>x</li></ol></li><li>b</li></ul>");
        let shape: Vec<_> = rows
            .iter()
            .map(|r| (r.depth, r.marker.as_str()))
            .collect();
        assert_eq!(shape, [(0, BULLET_MARKER), (1, "1. "), (0, BULLET_MARKER)]);
    }

    #[test]
    fn row_count_includes_nested_rows() {
        let nodes = parse("<ul><li>a<ol><li>x</li><li>y</li></ol></li><li>b</li></ul>");
        let [Node::List { items, .. }] = nodes.as_slice() else {
            panic!("expected a list");
        };
        assert_eq!(row_count(items), 4);
    }

    #[test]
    fn truncated_rows_keep_row_order() {
        let nodes = parse("<ul><li>a<ol><li>x</li><li>y</li></ol></li><li>b</li></ul>");
        let [Node::List { ordered, items }] = nodes.as_slice() else {
            panic!("expected a list");
        };
        let kept = truncate_rows(items, 2);
        assert_eq!(row_count(&kept), 2);
        let texts: Vec<_> = list_rows(*ordered, &kept)
            .iter()
            .map(|r| keycap_core::plain_text(&r.nodes))
            .collect();
        assert_eq!(texts, ["a", "x"]);
        assert!(truncate_rows(items, 0).is_empty());
        assert_eq!(truncate_rows(items, 10), items.to_vec());
    }

    #[test]
    fn breaks_inside_items_become_spaces() {
        let rows = rows_of("<ul><li>a<br>b</li></ul>");
        assert_eq!(rows[0].nodes, vec![Node::text("a b", Style::PLAIN)]);
    }
}
