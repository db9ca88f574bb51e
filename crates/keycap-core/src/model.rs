use serde::{Deserialize, Serialize};

/// Inline styling inherited from `<b>`/`<strong>` and `<i>`/`<em>` ancestors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Style {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
}

impl Style {
    pub const PLAIN: Style = Style {
        bold: false,
        italic: false,
    };

    pub fn with_bold(self) -> Self {
        Self { bold: true, ..self }
    }

    pub fn with_italic(self) -> Self {
        Self {
            italic: true,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Text {
        text: String,
        #[serde(default)]
        style: Style,
    },
    Link {
        href: String,
        text: String,
        #[serde(default)]
        style: Style,
    },
    Image {
        src: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<f64>,
    },
    VectorGraphic {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<f64>,
    },
    List {
        ordered: bool,
        items: Vec<ListItem>,
    },
}

/// One `<li>`. Children are only ever `Text`, `Link` or `List` nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub children: Vec<Node>,
}

impl Node {
    pub fn text(text: impl Into<String>, style: Style) -> Self {
        Node::Text {
            text: text.into(),
            style,
        }
    }

    pub fn link(href: impl Into<String>, text: impl Into<String>, style: Style) -> Self {
        Node::Link {
            href: href.into(),
            text: text.into(),
            style,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Text { .. } => NodeKind::Text,
            Node::Link { .. } => NodeKind::Link,
            Node::Image { .. } => NodeKind::Image,
            Node::VectorGraphic { .. } => NodeKind::VectorGraphic,
            Node::List { .. } => NodeKind::List,
        }
    }

    pub fn style(&self) -> Style {
        match self {
            Node::Text { style, .. } | Node::Link { style, .. } => *style,
            _ => Style::PLAIN,
        }
    }

    /// True for nodes that are laid out as a single box (images, graphics, lists).
    pub fn is_atomic(&self) -> bool {
        matches!(
            self,
            Node::Image { .. } | Node::VectorGraphic { .. } | Node::List { .. }
        )
    }

    pub fn is_media(&self) -> bool {
        matches!(self, Node::Image { .. } | Node::VectorGraphic { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Text,
    Link,
    Image,
    VectorGraphic,
    List,
}
