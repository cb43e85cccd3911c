//! The editor-framework boundary.
//!
//! The rich-text engine is an external collaborator. The kernel talks to it through
//! [`EditorHost`]: read the document, apply a batch of [`EditOp`]s as one transaction, and get
//! the resulting [`Transaction`] back for observers (history, derived views).
//!
//! [`MemoryEditor`] is a small in-memory host that applies ops at node granularity. It backs the
//! tests and any host that has no live editor attached (batch tools, previews).
//!
//! # Example
//!
//! ```rust
//! use folio_core::{CaseChange, DocNode, Document, EditorHost, HistoryActionType, MemoryEditor};
//!
//! let doc = Document::new(vec![DocNode::paragraph("hello").with_id("p")]);
//! let mut editor = MemoryEditor::new(doc);
//! let tx = editor
//!     .chain()
//!     .set_case("p", CaseChange::Upper)
//!     .tracked(HistoryActionType::Capitalization(CaseChange::Upper), "Changed case", "hello")
//!     .run()
//!     .unwrap();
//!
//! assert!(tx.doc_changed);
//! assert_eq!(editor.document().text_content(), "HELLO");
//! ```

use crate::case::{CaseChange, CaseState, apply_case};
use crate::history::HistoryActionType;
use crate::node::{DocNode, Document, Mark};
use std::ops::Range;
use thiserror::Error;

/// A single programmatic edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    /// Insert top-level nodes before `index`.
    InsertNodes {
        /// Top-level insertion index (`0..=len`).
        index: usize,
        /// Nodes to insert.
        nodes: Vec<DocNode>,
    },
    /// Replace a top-level range with new nodes.
    ReplaceRange {
        /// Top-level range to replace.
        range: Range<usize>,
        /// Replacement nodes.
        nodes: Vec<DocNode>,
    },
    /// Remove a top-level range.
    RemoveRange {
        /// Top-level range to remove.
        range: Range<usize>,
    },
    /// Change capitalization of every text run under a node.
    SetCase {
        /// Target node id.
        node_id: String,
        /// Capitalization change.
        case: CaseChange,
    },
    /// Toggle a mark on every text run under a node.
    ToggleMark {
        /// Target node id.
        node_id: String,
        /// Mark to toggle.
        mark: Mark,
    },
    /// Add or remove a mark on every text run under a node.
    SetMark {
        /// Target node id.
        node_id: String,
        /// Mark to set.
        mark: Mark,
        /// `true` adds the mark, `false` removes it.
        enabled: bool,
    },
    /// Overwrite the text of every text run under a node, in document order.
    ///
    /// `runs` must hold one entry per run that has text.
    SetText {
        /// Target node id.
        node_id: String,
        /// New run texts.
        runs: Vec<String>,
    },
    /// Set the indentation step of a block.
    SetIndent {
        /// Target node id.
        node_id: String,
        /// Indentation steps (0 clears).
        indent: u8,
    },
    /// Set the alignment of a block.
    SetAlignment {
        /// Target node id.
        node_id: String,
        /// Alignment name (`left`, `center`, `right`, `justify`).
        align: String,
    },
    /// Place the selection on a node (or clear it).
    SetSelection {
        /// Target node id.
        node_id: Option<String>,
    },
    /// Give the editor keyboard focus.
    Focus,
}

impl EditOp {
    /// Returns `true` if the op can change document content or attributes.
    pub fn changes_document(&self) -> bool {
        !matches!(self, EditOp::SetSelection { .. } | EditOp::Focus)
    }
}

/// History metadata attached to a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEdit {
    /// Action kind.
    pub action_type: HistoryActionType,
    /// Human-readable description.
    pub description: String,
    /// The affected text.
    pub content: String,
}

/// The result of applying a batch of ops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Document version after the transaction.
    pub version: u64,
    /// Ops applied, in order.
    pub ops: Vec<EditOp>,
    /// Whether document content or attributes changed.
    pub doc_changed: bool,
    /// History metadata, if the edit should appear in the history list.
    pub tracked: Option<TrackedEdit>,
}

/// Errors reported by an editor host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// No node with this id exists.
    #[error("node not found: {0}")]
    NodeNotFound(String),
    /// A top-level range or index is outside the document.
    #[error("range {start}..{end} is out of bounds for {len} blocks")]
    RangeOutOfBounds {
        /// Range start.
        start: usize,
        /// Range end.
        end: usize,
        /// Top-level block count.
        len: usize,
    },
    /// The host rejected a node (schema violation).
    #[error("invalid node: {0}")]
    InvalidNode(String),
    /// The host is not available (closed, detached, or the call failed).
    #[error("editor host unavailable: {0}")]
    Unavailable(String),
}

/// The contract consumed from the rich-text editor framework.
pub trait EditorHost {
    /// The current document.
    fn document(&self) -> &Document;

    /// The current document version (bumped by every applied transaction).
    fn version(&self) -> u64;

    /// Id of the node holding the selection, if any.
    fn selection(&self) -> Option<&str>;

    /// Whether the editor has keyboard focus.
    fn is_focused(&self) -> bool;

    /// Replace the whole document (e.g. on load).
    fn set_document(&mut self, doc: Document) -> Transaction;

    /// Apply `ops` atomically as one transaction.
    ///
    /// On error no op is applied.
    fn apply(
        &mut self,
        ops: Vec<EditOp>,
        tracked: Option<TrackedEdit>,
    ) -> Result<Transaction, HostError>;

    /// Start a command chain.
    fn chain(&mut self) -> CommandChain<'_, Self>
    where
        Self: Sized,
    {
        CommandChain::new(self)
    }
}

/// Builder collecting ops into one transaction.
#[must_use = "a command chain does nothing until `run` is called"]
pub struct CommandChain<'h, H: EditorHost + ?Sized> {
    host: &'h mut H,
    ops: Vec<EditOp>,
    tracked: Option<TrackedEdit>,
}

impl<'h, H: EditorHost + ?Sized> CommandChain<'h, H> {
    /// Start an empty chain against `host`.
    pub fn new(host: &'h mut H) -> Self {
        Self {
            host,
            ops: Vec::new(),
            tracked: None,
        }
    }

    /// Append an arbitrary op.
    pub fn op(mut self, op: EditOp) -> Self {
        self.ops.push(op);
        self
    }

    /// Insert top-level nodes before `index`.
    pub fn insert_nodes(self, index: usize, nodes: Vec<DocNode>) -> Self {
        self.op(EditOp::InsertNodes { index, nodes })
    }

    /// Replace a top-level range.
    pub fn replace_range(self, range: Range<usize>, nodes: Vec<DocNode>) -> Self {
        self.op(EditOp::ReplaceRange { range, nodes })
    }

    /// Change capitalization under a node.
    pub fn set_case(self, node_id: impl Into<String>, case: CaseChange) -> Self {
        self.op(EditOp::SetCase {
            node_id: node_id.into(),
            case,
        })
    }

    /// Toggle a mark under a node.
    pub fn toggle_mark(self, node_id: impl Into<String>, mark: Mark) -> Self {
        self.op(EditOp::ToggleMark {
            node_id: node_id.into(),
            mark,
        })
    }

    /// Add or remove a mark under a node.
    pub fn set_mark(self, node_id: impl Into<String>, mark: Mark, enabled: bool) -> Self {
        self.op(EditOp::SetMark {
            node_id: node_id.into(),
            mark,
            enabled,
        })
    }

    /// Overwrite the text runs under a node.
    pub fn set_text(self, node_id: impl Into<String>, runs: Vec<String>) -> Self {
        self.op(EditOp::SetText {
            node_id: node_id.into(),
            runs,
        })
    }

    /// Set a block's indentation.
    pub fn set_indent(self, node_id: impl Into<String>, indent: u8) -> Self {
        self.op(EditOp::SetIndent {
            node_id: node_id.into(),
            indent,
        })
    }

    /// Set a block's alignment.
    pub fn set_alignment(self, node_id: impl Into<String>, align: impl Into<String>) -> Self {
        self.op(EditOp::SetAlignment {
            node_id: node_id.into(),
            align: align.into(),
        })
    }

    /// Select a node.
    pub fn set_selection(self, node_id: impl Into<String>) -> Self {
        self.op(EditOp::SetSelection {
            node_id: Some(node_id.into()),
        })
    }

    /// Focus the editor.
    pub fn focus(self) -> Self {
        self.op(EditOp::Focus)
    }

    /// Attach history metadata.
    pub fn tracked(
        mut self,
        action_type: HistoryActionType,
        description: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        self.tracked = Some(TrackedEdit {
            action_type,
            description: description.into(),
            content: content.into(),
        });
        self
    }

    /// Apply the collected ops as one transaction.
    pub fn run(self) -> Result<Transaction, HostError> {
        self.host.apply(self.ops, self.tracked)
    }
}

/// An in-memory editor host.
#[derive(Debug, Clone, Default)]
pub struct MemoryEditor {
    doc: Document,
    version: u64,
    selection: Option<String>,
    focused: bool,
}

fn check_range(range: &Range<usize>, len: usize) -> Result<(), HostError> {
    if range.start > range.end || range.end > len {
        return Err(HostError::RangeOutOfBounds {
            start: range.start,
            end: range.end,
            len,
        });
    }
    Ok(())
}

fn check_nodes(nodes: &[DocNode]) -> Result<(), HostError> {
    if let Some(inline) = nodes.iter().find(|n| n.kind.is_inline()) {
        return Err(HostError::InvalidNode(format!(
            "inline `{}` node cannot be a top-level block",
            inline.kind.type_name()
        )));
    }
    Ok(())
}

fn target<'d>(doc: &'d mut Document, node_id: &str) -> Result<&'d mut DocNode, HostError> {
    doc.find_by_id_mut(node_id)
        .ok_or_else(|| HostError::NodeNotFound(node_id.to_string()))
}

impl MemoryEditor {
    /// Create a host holding `doc`.
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            ..Self::default()
        }
    }

    /// Create a host with an empty document.
    pub fn empty() -> Self {
        Self::default()
    }

    fn apply_one(
        doc: &mut Document,
        selection: &mut Option<String>,
        focused: &mut bool,
        op: &EditOp,
    ) -> Result<bool, HostError> {
        match op {
            EditOp::InsertNodes { index, nodes } => {
                check_range(&(*index..*index), doc.content.len())?;
                check_nodes(nodes)?;
                doc.content.splice(*index..*index, nodes.iter().cloned());
                Ok(!nodes.is_empty())
            }
            EditOp::ReplaceRange { range, nodes } => {
                check_range(range, doc.content.len())?;
                check_nodes(nodes)?;
                let removed: Vec<DocNode> =
                    doc.content.splice(range.clone(), nodes.iter().cloned()).collect();
                Ok(removed != *nodes)
            }
            EditOp::RemoveRange { range } => {
                check_range(range, doc.content.len())?;
                doc.content.drain(range.clone());
                Ok(!range.is_empty())
            }
            EditOp::SetCase { node_id, case } => {
                let node = target(doc, node_id)?;
                let mut state = CaseState::default();
                let mut changed = false;
                node.walk_text_mut(&mut |run| {
                    if let Some(text) = run.text.as_mut() {
                        let next = apply_case(*case, text, &mut state);
                        changed |= next != *text;
                        *text = next;
                    }
                });
                Ok(changed)
            }
            EditOp::ToggleMark { node_id, mark } => {
                let node = target(doc, node_id)?;
                let mut runs = Vec::new();
                node.walk_text_mut(&mut |run| runs.push(run.marks.iter().any(|m| m == mark)));
                if runs.is_empty() {
                    return Ok(false);
                }
                let remove = runs.iter().all(|has| *has);
                node.walk_text_mut(&mut |run| {
                    if remove {
                        run.marks.retain(|m| m != mark);
                    } else if !run.marks.contains(mark) {
                        run.marks.push(mark.clone());
                    }
                });
                Ok(true)
            }
            EditOp::SetMark {
                node_id,
                mark,
                enabled,
            } => {
                let node = target(doc, node_id)?;
                let mut changed = false;
                node.walk_text_mut(&mut |run| {
                    let has = run.marks.contains(mark);
                    if *enabled && !has {
                        run.marks.push(mark.clone());
                        changed = true;
                    } else if !*enabled && has {
                        run.marks.retain(|m| m != mark);
                        changed = true;
                    }
                });
                Ok(changed)
            }
            EditOp::SetText { node_id, runs } => {
                let node = target(doc, node_id)?;
                let mut count = 0;
                node.walk_text_mut(&mut |run| count += usize::from(run.text.is_some()));
                if count != runs.len() {
                    return Err(HostError::InvalidNode(format!(
                        "{node_id} has {count} text runs, got {}",
                        runs.len()
                    )));
                }
                let mut next = runs.iter();
                let mut changed = false;
                node.walk_text_mut(&mut |run| {
                    if let Some(text) = run.text.as_mut()
                        && let Some(new) = next.next()
                        && text != new
                    {
                        text.clone_from(new);
                        changed = true;
                    }
                });
                Ok(changed)
            }
            EditOp::SetIndent { node_id, indent } => {
                let node = target(doc, node_id)?;
                let next = (*indent > 0).then_some(*indent);
                let changed = node.attrs.indent != next;
                node.attrs.indent = next;
                Ok(changed)
            }
            EditOp::SetAlignment { node_id, align } => {
                let node = target(doc, node_id)?;
                let changed = node.attrs.text_align.as_deref() != Some(align.as_str());
                node.attrs.text_align = Some(align.clone());
                Ok(changed)
            }
            EditOp::SetSelection { node_id } => {
                if let Some(id) = node_id
                    && doc.find_by_id(id).is_none()
                {
                    return Err(HostError::NodeNotFound(id.clone()));
                }
                *selection = node_id.clone();
                Ok(false)
            }
            EditOp::Focus => {
                *focused = true;
                Ok(false)
            }
        }
    }
}

impl EditorHost for MemoryEditor {
    fn document(&self) -> &Document {
        &self.doc
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    fn is_focused(&self) -> bool {
        self.focused
    }

    fn set_document(&mut self, doc: Document) -> Transaction {
        self.doc = doc;
        self.selection = None;
        self.version = self.version.saturating_add(1);
        Transaction {
            version: self.version,
            ops: Vec::new(),
            doc_changed: true,
            tracked: None,
        }
    }

    fn apply(
        &mut self,
        ops: Vec<EditOp>,
        tracked: Option<TrackedEdit>,
    ) -> Result<Transaction, HostError> {
        let mut doc = self.doc.clone();
        let mut selection = self.selection.clone();
        let mut focused = self.focused;
        let mut doc_changed = false;

        for op in &ops {
            doc_changed |= Self::apply_one(&mut doc, &mut selection, &mut focused, op)?;
        }

        self.doc = doc;
        self.selection = selection;
        self.focused = focused;
        if !ops.is_empty() {
            self.version = self.version.saturating_add(1);
        }

        Ok(Transaction {
            version: self.version,
            ops,
            doc_changed,
            tracked,
        })
    }
}
