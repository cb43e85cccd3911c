//! Rendering a [`TocTree`] back into document nodes.
//!
//! The output is a literal fragment (title paragraph plus one paragraph per entry) tagged with
//! the [`Zone::Toc`] marker, ready to replace the previous table of contents in the document.
//! Rendering is pure: the same tree, settings and width always produce the same fragment.

use crate::node::{DocNode, Mark, NodeKind, Zone};
use crate::toc::{TocItem, TocSettings, TocTree};
use unicode_width::UnicodeWidthStr;

/// Id of the rendered title paragraph.
pub const TOC_TITLE_ID: &str = "toc-title";

/// Display cells reserved for a page number placeholder.
pub const PAGE_NUMBER_CELLS: usize = 3;

/// Display cells per indentation step.
pub const INDENT_CELLS: usize = 2;

/// Id of the rendered paragraph for the entry pointing at heading `heading_id`.
pub fn entry_id(heading_id: &str) -> String {
    format!("toc-entry-{heading_id}")
}

/// Number of leader characters for an entry whose text occupies `used` cells.
///
/// One space separates the text from the leader and the leader from the page number; the
/// leader itself is never shorter than one character.
pub fn leader_len(width: usize, used: usize) -> usize {
    width.saturating_sub(used + 2 + PAGE_NUMBER_CELLS).max(1)
}

fn render_entry(item: &TocItem, settings: &TocSettings, width: usize) -> DocNode {
    let indent = if settings.indent_levels {
        item.level.saturating_sub(1)
    } else {
        0
    };

    let mut content = Vec::new();
    let mut used = usize::from(indent) * INDENT_CELLS;

    if !item.number_label.is_empty() {
        let label = format!("{} ", item.number_label);
        used += label.width();
        content.push(DocNode::text(label));
    }

    used += item.title.width();
    content.push(
        DocNode::text(item.title.clone()).with_marks(vec![Mark::link(format!("#{}", item.id))]),
    );

    if settings.show_page_numbers {
        let fill: String =
            std::iter::repeat_n(settings.tab_leader.fill_char(), leader_len(width, used)).collect();
        content.push(DocNode::text(format!(" {fill} ")));

        let mut page = DocNode::new(NodeKind::PageRef);
        page.attrs.target = Some(item.id.clone());
        content.push(page);
    }

    let mut node = DocNode::new(NodeKind::Paragraph)
        .with_id(entry_id(&item.id))
        .with_zone(Zone::Toc)
        .with_content(content);
    if indent > 0 {
        node.attrs.indent = Some(indent);
    }
    node
}

/// Render the table of contents as document nodes.
///
/// `width` is the available line width in display cells, used to size the leader fill.
pub fn render_toc(tree: &TocTree, settings: &TocSettings, width: usize) -> Vec<DocNode> {
    let mut out = Vec::with_capacity(tree.len() + 1);

    if !settings.title.trim().is_empty() {
        out.push(
            DocNode::new(NodeKind::Paragraph)
                .with_id(TOC_TITLE_ID)
                .with_zone(Zone::Toc)
                .with_content(vec![
                    DocNode::text(settings.title.trim()).with_marks(vec![Mark::Bold]),
                ]),
        );
    }

    for item in tree.flatten_preorder() {
        out.push(render_entry(item, settings, width));
    }

    out
}
