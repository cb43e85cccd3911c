//! Typed document tree.
//!
//! The rich-text editor framework owns the live document and speaks in loosely typed nodes
//! (`{"type": "heading", "attrs": {...}, "content": [...]}`). This module is the checked
//! mirror of that shape: node and mark kinds are closed enums, known attributes are typed
//! fields, and anything the kernel does not understand is carried verbatim so it survives a
//! round-trip back into the editor.
//!
//! Conversion from/to the editor's JSON lives in `folio-io`.

use serde::{Deserialize, Serialize};

/// A logical region of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    /// The rendered table of contents.
    Toc,
    /// Introduction / front matter.
    Intro,
    /// Main text. Headings in this zone feed the table of contents.
    #[serde(rename = "maintext")]
    MainText,
    /// Bibliography / back matter.
    Bibliography,
}

impl Zone {
    /// All zones, in canonical document order.
    pub const ALL: [Zone; 4] = [Zone::Toc, Zone::Intro, Zone::MainText, Zone::Bibliography];

    /// The marker string stored in `attrs.sectionType`.
    pub fn as_marker(self) -> &'static str {
        match self {
            Zone::Toc => "toc",
            Zone::Intro => "intro",
            Zone::MainText => "maintext",
            Zone::Bibliography => "bibliography",
        }
    }

    /// Parse a marker string (ASCII case-insensitive, `main_text`/`main-text` accepted).
    pub fn from_marker(marker: &str) -> Option<Self> {
        let normalized: String = marker
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "toc" => Some(Zone::Toc),
            "intro" | "introduction" => Some(Zone::Intro),
            "maintext" => Some(Zone::MainText),
            "bibliography" => Some(Zone::Bibliography),
            _ => None,
        }
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_marker())
    }
}

/// A zone marker as found on a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ZoneMarker {
    /// A recognized zone.
    Zone(Zone),
    /// A marker string that names no known zone. Extraction treats such nodes as malformed.
    Unrecognized(String),
}

impl ZoneMarker {
    /// Parse a raw marker string.
    pub fn parse(marker: &str) -> Self {
        match Zone::from_marker(marker) {
            Some(zone) => ZoneMarker::Zone(zone),
            None => ZoneMarker::Unrecognized(marker.to_string()),
        }
    }

    /// The marker string to write back to the editor.
    pub fn as_str(&self) -> &str {
        match self {
            ZoneMarker::Zone(zone) => zone.as_marker(),
            ZoneMarker::Unrecognized(raw) => raw,
        }
    }

    /// The recognized zone, if any.
    pub fn zone(&self) -> Option<Zone> {
        match self {
            ZoneMarker::Zone(zone) => Some(*zone),
            ZoneMarker::Unrecognized(_) => None,
        }
    }
}

/// A node kind tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Document root.
    Doc,
    /// A paragraph block.
    Paragraph,
    /// A heading block (`attrs.level` is 1..=6).
    Heading,
    /// An inline text run.
    Text,
    /// An inline hard line break.
    HardBreak,
    /// A block quotation container.
    Blockquote,
    /// An unordered list container.
    BulletList,
    /// An ordered list container.
    OrderedList,
    /// A list item container.
    ListItem,
    /// An inline page-number placeholder (`attrs.target` names the referenced node).
    PageRef,
    /// An editor-defined kind this kernel does not interpret.
    Custom(String),
}

impl NodeKind {
    /// Convert an editor `type` string into a [`NodeKind`].
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "doc" => Self::Doc,
            "paragraph" => Self::Paragraph,
            "heading" => Self::Heading,
            "text" => Self::Text,
            "hardBreak" => Self::HardBreak,
            "blockquote" => Self::Blockquote,
            "bulletList" => Self::BulletList,
            "orderedList" => Self::OrderedList,
            "listItem" => Self::ListItem,
            "pageRef" => Self::PageRef,
            other => Self::Custom(other.to_string()),
        }
    }

    /// The editor `type` string for this kind.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Doc => "doc",
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::Text => "text",
            Self::HardBreak => "hardBreak",
            Self::Blockquote => "blockquote",
            Self::BulletList => "bulletList",
            Self::OrderedList => "orderedList",
            Self::ListItem => "listItem",
            Self::PageRef => "pageRef",
            Self::Custom(name) => name,
        }
    }

    /// Returns `true` for inline kinds (text runs, breaks, page refs).
    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Text | Self::HardBreak | Self::PageRef)
    }
}

/// An inline mark applied to a text run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Mark {
    /// Bold.
    Bold,
    /// Italic.
    Italic,
    /// Underline.
    Underline,
    /// Strike-through.
    Strike,
    /// Superscript.
    Superscript,
    /// Subscript.
    Subscript,
    /// Small capitals.
    SmallCaps,
    /// Hyperlink.
    Link {
        /// Link target.
        href: String,
        /// Remaining link attributes (`target`, `rel`, ...) as a raw JSON object.
        extra_json: Option<String>,
    },
    /// Comment anchor.
    Comment {
        /// Comment id (see [`crate::comments`]).
        id: String,
        /// Remaining attributes as a raw JSON object.
        extra_json: Option<String>,
    },
    /// Bookmark anchor.
    Bookmark {
        /// Bookmark id (see [`crate::bookmarks`]).
        id: String,
        /// Remaining attributes as a raw JSON object.
        extra_json: Option<String>,
    },
    /// An editor-defined mark this kernel does not interpret (`textStyle`, `highlight`, ...).
    Custom {
        /// Editor mark type.
        name: String,
        /// Mark attributes as a raw JSON object.
        attrs_json: Option<String>,
    },
}

impl Mark {
    /// The editor `type` string for this mark.
    pub fn type_name(&self) -> &str {
        match self {
            Mark::Bold => "bold",
            Mark::Italic => "italic",
            Mark::Underline => "underline",
            Mark::Strike => "strike",
            Mark::Superscript => "superscript",
            Mark::Subscript => "subscript",
            Mark::SmallCaps => "smallCaps",
            Mark::Link { .. } => "link",
            Mark::Comment { .. } => "comment",
            Mark::Bookmark { .. } => "bookmark",
            Mark::Custom { name, .. } => name,
        }
    }

    /// A link mark without extra attributes.
    pub fn link(href: impl Into<String>) -> Self {
        Mark::Link {
            href: href.into(),
            extra_json: None,
        }
    }

    /// A comment anchor without extra attributes.
    pub fn comment(id: impl Into<String>) -> Self {
        Mark::Comment {
            id: id.into(),
            extra_json: None,
        }
    }

    /// A bookmark anchor without extra attributes.
    pub fn bookmark(id: impl Into<String>) -> Self {
        Mark::Bookmark {
            id: id.into(),
            extra_json: None,
        }
    }

    /// Returns `true` if both marks are of the same kind, ignoring payloads.
    pub fn same_kind(&self, other: &Mark) -> bool {
        self.type_name() == other.type_name()
    }
}

/// Attributes known to the kernel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeAttrs {
    /// Stable node identifier.
    pub id: Option<String>,
    /// Heading level.
    pub level: Option<u8>,
    /// Zone marker (`sectionType`).
    pub section: Option<ZoneMarker>,
    /// Indentation step count.
    pub indent: Option<u8>,
    /// Text alignment (`left`, `center`, `right`, `justify`).
    pub text_align: Option<String>,
    /// Target node id for page references.
    pub target: Option<String>,
    /// Attributes the kernel does not interpret, encoded as a JSON object text.
    pub extra_json: Option<String>,
}

impl NodeAttrs {
    /// Returns `true` if no attribute is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A single node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocNode {
    /// Node kind.
    pub kind: NodeKind,
    /// Node attributes.
    pub attrs: NodeAttrs,
    /// Text payload (text runs only).
    pub text: Option<String>,
    /// Inline marks (text runs only).
    pub marks: Vec<Mark>,
    /// Child nodes.
    pub content: Vec<DocNode>,
}

impl DocNode {
    /// Create an empty node of the given kind.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attrs: NodeAttrs::default(),
            text: None,
            marks: Vec::new(),
            content: Vec::new(),
        }
    }

    /// Create a text run.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(NodeKind::Text)
        }
    }

    /// Create a paragraph holding a single text run (or nothing, for empty text).
    pub fn paragraph(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut node = Self::new(NodeKind::Paragraph);
        if !text.is_empty() {
            node.content.push(Self::text(text));
        }
        node
    }

    /// Create a heading of `level` holding a single text run.
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        let mut node = Self::paragraph(text);
        node.kind = NodeKind::Heading;
        node.attrs.level = Some(level);
        node
    }

    /// Set the stable id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.attrs.id = Some(id.into());
        self
    }

    /// Tag the node with a zone marker.
    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.attrs.section = Some(ZoneMarker::Zone(zone));
        self
    }

    /// Replace the node's marks.
    pub fn with_marks(mut self, marks: Vec<Mark>) -> Self {
        self.marks = marks;
        self
    }

    /// Replace the node's children.
    pub fn with_content(mut self, content: Vec<DocNode>) -> Self {
        self.content = content;
        self
    }

    /// The stable id, if any.
    pub fn id(&self) -> Option<&str> {
        self.attrs.id.as_deref()
    }

    /// The heading level, if this node is a heading.
    pub fn heading_level(&self) -> Option<u8> {
        match self.kind {
            NodeKind::Heading => self.attrs.level,
            _ => None,
        }
    }

    /// Concatenated text of this node and all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        if self.kind == NodeKind::HardBreak {
            out.push('\n');
        }
        for child in &self.content {
            child.push_text(out);
        }
    }

    /// Returns `true` if this node or any descendant carries non-whitespace text.
    pub fn has_text(&self) -> bool {
        self.text
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
            || self.content.iter().any(DocNode::has_text)
    }

    /// Collect this node and all descendants in pre-order.
    pub fn flatten_preorder<'a>(&'a self, out: &mut Vec<&'a DocNode>) {
        out.push(self);
        for child in &self.content {
            child.flatten_preorder(out);
        }
    }

    /// Find a node (this one or a descendant) by stable id.
    pub fn find_by_id(&self, id: &str) -> Option<&DocNode> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.content.iter().find_map(|child| child.find_by_id(id))
    }

    /// Mutable variant of [`DocNode::find_by_id`].
    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut DocNode> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.content
            .iter_mut()
            .find_map(|child| child.find_by_id_mut(id))
    }

    /// Visit every text run in this subtree.
    pub fn walk_text_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut DocNode),
    {
        if self.kind == NodeKind::Text {
            f(self);
        }
        for child in &mut self.content {
            child.walk_text_mut(f);
        }
    }
}

/// A whole document: the ordered top-level blocks under the root `doc` node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    /// Top-level blocks.
    pub content: Vec<DocNode>,
}

impl Document {
    /// Create a document from top-level blocks.
    pub fn new(content: Vec<DocNode>) -> Self {
        Self { content }
    }

    /// Returns `true` if there are no top-level blocks.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns `true` if any block carries non-whitespace text.
    pub fn has_text(&self) -> bool {
        self.content.iter().any(DocNode::has_text)
    }

    /// Concatenated text of all blocks, one line per top-level block.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .map(DocNode::text_content)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Flatten all nodes in pre-order.
    pub fn flatten_preorder(&self) -> Vec<&DocNode> {
        let mut out = Vec::new();
        for node in &self.content {
            node.flatten_preorder(&mut out);
        }
        out
    }

    /// Find a node by stable id.
    pub fn find_by_id(&self, id: &str) -> Option<&DocNode> {
        self.content.iter().find_map(|node| node.find_by_id(id))
    }

    /// Find a node by stable id, mutably.
    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut DocNode> {
        self.content
            .iter_mut()
            .find_map(|node| node.find_by_id_mut(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_markers() {
        assert_eq!(Zone::from_marker("maintext"), Some(Zone::MainText));
        assert_eq!(Zone::from_marker("mainText"), Some(Zone::MainText));
        assert_eq!(Zone::from_marker("main_text"), Some(Zone::MainText));
        assert_eq!(Zone::from_marker("Bibliography"), Some(Zone::Bibliography));
        assert_eq!(Zone::from_marker("appendix"), None);

        assert_eq!(
            ZoneMarker::parse("appendix"),
            ZoneMarker::Unrecognized("appendix".to_string())
        );
        assert_eq!(ZoneMarker::parse("toc").zone(), Some(Zone::Toc));
    }

    #[test]
    fn test_node_kind_names() {
        assert_eq!(NodeKind::from_type_name("heading"), NodeKind::Heading);
        assert_eq!(
            NodeKind::from_type_name("footnote"),
            NodeKind::Custom("footnote".to_string())
        );
        assert_eq!(NodeKind::Custom("footnote".to_string()).type_name(), "footnote");
        assert!(NodeKind::PageRef.is_inline());
        assert!(!NodeKind::Paragraph.is_inline());
    }

    #[test]
    fn test_text_content_and_lookup() {
        let doc = Document::new(vec![
            DocNode::heading(1, "Intro").with_id("h1"),
            DocNode::new(NodeKind::Paragraph)
                .with_id("p1")
                .with_content(vec![
                    DocNode::text("one"),
                    DocNode::new(NodeKind::HardBreak),
                    DocNode::text("two"),
                ]),
        ]);

        assert_eq!(doc.text_content(), "Intro\none\ntwo");
        assert_eq!(doc.find_by_id("p1").map(DocNode::text_content).as_deref(), Some("one\ntwo"));
        assert!(doc.find_by_id("missing").is_none());
        assert_eq!(doc.flatten_preorder().len(), 6);
        assert_eq!(doc.content[0].heading_level(), Some(1));
        assert_eq!(doc.content[1].heading_level(), None);
    }

    #[test]
    fn test_has_text_ignores_whitespace() {
        assert!(!Document::new(vec![DocNode::paragraph("   ")]).has_text());
        assert!(!Document::new(vec![DocNode::paragraph("")]).has_text());
        assert!(Document::new(vec![DocNode::paragraph(" x ")]).has_text());
    }
}
