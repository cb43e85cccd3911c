//! Zone extraction.
//!
//! A document is partitioned into zones ([`Zone`]) by `sectionType` markers on its nodes. A node
//! belongs to the zone named by its own marker or, failing that, by its nearest marked ancestor.
//! Extraction never fails: nodes carrying an unrecognized marker are skipped together with
//! their subtree, and a document without a given zone simply yields no nodes for it.

use crate::node::{DocNode, Document, NodeKind, Zone, ZoneMarker};
use std::ops::Range;

/// All zones of a document, extracted in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections<'a> {
    /// Table of contents nodes.
    pub toc: Vec<&'a DocNode>,
    /// Introduction nodes.
    pub intro: Vec<&'a DocNode>,
    /// Main text nodes.
    pub maintext: Vec<&'a DocNode>,
    /// Bibliography nodes.
    pub bibliography: Vec<&'a DocNode>,
}

impl<'a> Sections<'a> {
    /// Nodes of one zone.
    pub fn zone(&self, zone: Zone) -> &[&'a DocNode] {
        match zone {
            Zone::Toc => &self.toc,
            Zone::Intro => &self.intro,
            Zone::MainText => &self.maintext,
            Zone::Bibliography => &self.bibliography,
        }
    }

    fn zone_mut(&mut self, zone: Zone) -> &mut Vec<&'a DocNode> {
        match zone {
            Zone::Toc => &mut self.toc,
            Zone::Intro => &mut self.intro,
            Zone::MainText => &mut self.maintext,
            Zone::Bibliography => &mut self.bibliography,
        }
    }
}

/// Resolve the zone a node belongs to, given the zone inherited from its ancestors.
///
/// Returns `Err(())` for a malformed marker: the node and its subtree belong to no zone.
fn effective_zone(node: &DocNode, inherited: Option<Zone>) -> Result<Option<Zone>, ()> {
    match &node.attrs.section {
        Some(ZoneMarker::Zone(zone)) => Ok(Some(*zone)),
        Some(ZoneMarker::Unrecognized(raw)) => {
            log::debug!(
                "skipping node {:?} with unrecognized section marker {raw:?}",
                node.attrs.id
            );
            Err(())
        }
        None => Ok(inherited),
    }
}

fn collect<'a, F>(node: &'a DocNode, inherited: Option<Zone>, sink: &mut F)
where
    F: FnMut(Zone, &'a DocNode),
{
    let Ok(zone) = effective_zone(node, inherited) else {
        return;
    };

    // A node that resolves to a zone is taken whole, unless it is a wrapper whose children
    // carry their own markers.
    if let Some(zone) = zone
        && !node.content.iter().any(|c| c.attrs.section.is_some())
    {
        sink(zone, node);
        return;
    }

    if node.kind.is_inline() {
        return;
    }

    for child in &node.content {
        collect(child, zone, sink);
    }
}

/// Return the nodes belonging to `zone`, in document order.
///
/// The returned nodes are references into `doc`, so ids and attributes are preserved exactly.
pub fn extract<'a>(doc: &'a Document, zone: Zone) -> Vec<&'a DocNode> {
    let mut out = Vec::new();
    for node in &doc.content {
        collect(node, None, &mut |z: Zone, n: &'a DocNode| {
            if z == zone {
                out.push(n);
            }
        });
    }
    out
}

/// Extract every zone in a single pass.
pub fn partition<'a>(doc: &'a Document) -> Sections<'a> {
    let mut sections = Sections::default();
    for node in &doc.content {
        collect(node, None, &mut |z: Zone, n: &'a DocNode| sections.zone_mut(z).push(n));
    }
    sections
}

/// The top-level index span occupied by `zone`.
///
/// A top-level node counts if it, or anything inside it, belongs to the zone. Zones are
/// expected to be contiguous; if they are not, the span covers the first to the last
/// occurrence and a warning is logged.
pub fn zone_span(doc: &Document, zone: Zone) -> Option<Range<usize>> {
    let hits: Vec<usize> = doc
        .content
        .iter()
        .enumerate()
        .filter_map(|(idx, node)| {
            let mut found = false;
            collect(node, None, &mut |z: Zone, _: &DocNode| found |= z == zone);
            found.then_some(idx)
        })
        .collect();

    let (first, last) = (*hits.first()?, *hits.last()?);
    if last - first + 1 != hits.len() {
        log::warn!("zone {zone} is not contiguous ({} blocks over {first}..={last})", hits.len());
    }
    Some(first..last + 1)
}

/// Every heading under `nodes`, in document order, paired with its level.
///
/// Container blocks (lists, quotes, custom wrappers) are searched; headings nested inside
/// other headings are not.
pub fn headings<'a>(nodes: &[&'a DocNode]) -> Vec<(u8, &'a DocNode)> {
    fn walk<'a>(node: &'a DocNode, out: &mut Vec<(u8, &'a DocNode)>) {
        if node.kind == NodeKind::Heading {
            match node.attrs.level {
                Some(level) => out.push((level, node)),
                None => log::debug!("heading {:?} has no level; skipped", node.attrs.id),
            }
            return;
        }
        if node.kind.is_inline() {
            return;
        }
        for child in &node.content {
            walk(child, out);
        }
    }

    let mut out = Vec::new();
    for &node in nodes {
        walk(node, &mut out);
    }
    out
}
