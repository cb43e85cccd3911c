//! Document session: the glue between the editor host, the store and the history list.
//!
//! A [`DocumentSession`] owns one editor host, the [`Store`], the [`HistoryTracker`] and the
//! [`PostCommitQueue`] for that host. Edits flow in one direction:
//!
//! ```text
//! execute(ops) ──► host.apply ──► Transaction
//!                                   │
//!                    ┌──────────────┼────────────────┐
//!                    ▼              ▼                ▼
//!             history.observe  recompute_toc   post-commit flush
//!                                   │
//!                                   ▼
//!                       store: EditorAction::SetToc
//! ```
//!
//! The rendered table of contents is only written back into the document on an explicit
//! [`DocumentSession::update_table_of_contents`] call, so recomputation never moves the
//! user's cursor.
//!
//! # Example
//!
//! ```rust
//! use folio_core::{DocNode, Document, DocumentSession, EditorHost, FolioConfig, MemoryEditor, Zone};
//!
//! let doc = Document::new(vec![
//!     DocNode::heading(1, "Intro").with_id("h1").with_zone(Zone::MainText),
//!     DocNode::paragraph("Body").with_zone(Zone::MainText),
//! ]);
//! let mut session = DocumentSession::new(MemoryEditor::new(doc), &FolioConfig::default());
//! assert_eq!(session.toc().len(), 1);
//!
//! session.update_table_of_contents().unwrap();
//! let first = session.host().document().content.first().and_then(|n| n.id());
//! assert_eq!(first, Some("toc-title"));
//! assert_eq!(session.host().selection(), Some("toc-entry-h1"));
//! ```

use crate::apparatus::{Apparatus, ApparatusRegistry};
use crate::bookmarks::{Bookmark, Bookmarks};
use crate::case::CaseChange;
use crate::comments::{Comment, Comments};
use crate::config::FolioConfig;
use crate::history::{ActionId, HistoryTracker};
use crate::host::{EditOp, EditorHost, HostError, TrackedEdit, Transaction};
use crate::layout::PageSetup;
use crate::node::{DocNode, Document, Mark, NodeKind, Zone};
use crate::scheduler::PostCommitQueue;
use crate::sections::{self, Sections};
use crate::store::{Action, AppState, Dispatched, EditorAction, Store, StoreError, TextStyle};
use crate::toc::{TocSettings, TocTree, build_toc};
use crate::toc_render::{entry_id, render_toc};
use std::collections::BTreeMap;

/// A run of consecutive top-level nodes sharing the same zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneFragment {
    /// Zone of the run (`None` for nodes outside every zone).
    pub zone: Option<Zone>,
    /// Nodes, in document order.
    pub nodes: Vec<DocNode>,
}

/// Everything needed to persist and later restore a document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    /// Document content, grouped into zone runs. Concatenated, they give the document back.
    pub fragments: Vec<ZoneFragment>,
    /// Table-of-contents settings.
    pub toc_settings: TocSettings,
    /// Page setup.
    pub page_setup: PageSetup,
    /// Apparatus panels in stacking order.
    pub apparatus: Vec<Apparatus>,
    /// Named styles.
    pub styles: BTreeMap<String, TextStyle>,
    /// Comment threads.
    pub comments: Vec<Comment>,
    /// Bookmarks.
    pub bookmarks: Vec<Bookmark>,
}

impl DocumentSnapshot {
    /// Capture `doc` and the persistent parts of `state`.
    pub fn capture(doc: &Document, state: &AppState) -> Self {
        Self {
            fragments: fragments(doc),
            toc_settings: state.editor.toc_settings.clone(),
            page_setup: state.editor.page_setup,
            apparatus: state.apparatus.iter().cloned().collect(),
            styles: state.editor.styles.clone(),
            comments: state.comments.iter().cloned().collect(),
            bookmarks: state.bookmarks.iter().cloned().collect(),
        }
    }

    /// Reassemble the document.
    pub fn document(&self) -> Document {
        Document::new(
            self.fragments
                .iter()
                .flat_map(|f| f.nodes.iter().cloned())
                .collect(),
        )
    }

    /// Top-level nodes stored under `zone`.
    pub fn zone(&self, zone: Zone) -> Vec<&DocNode> {
        self.fragments
            .iter()
            .filter(|f| f.zone == Some(zone))
            .flat_map(|f| f.nodes.iter())
            .collect()
    }

    /// Check the stored settings (see [`AppState::validate`]).
    pub fn validate(&self) -> Result<(), StoreError> {
        self.app_state().validate()
    }

    /// Rebuild the application state. Derived views (the TOC) start empty.
    pub fn app_state(&self) -> AppState {
        let mut state = AppState {
            apparatus: ApparatusRegistry::from_entries(self.apparatus.clone()),
            comments: Comments::from_comments(self.comments.clone()),
            bookmarks: Bookmarks::from_bookmarks(self.bookmarks.clone()),
            ..AppState::default()
        };
        state.editor.toc_settings = self.toc_settings.clone();
        state.editor.page_setup = self.page_setup;
        state.editor.styles = self.styles.clone();
        state
    }
}

fn fragments(doc: &Document) -> Vec<ZoneFragment> {
    let mut out: Vec<ZoneFragment> = Vec::new();
    for node in &doc.content {
        let zone = node.attrs.section.as_ref().and_then(|m| m.zone());
        match out.last_mut() {
            Some(last) if last.zone == zone => last.nodes.push(node.clone()),
            _ => out.push(ZoneFragment {
                zone,
                nodes: vec![node.clone()],
            }),
        }
    }
    out
}

fn has_mark(node: &DocNode, mark: &Mark) -> bool {
    let mut nodes = Vec::new();
    node.flatten_preorder(&mut nodes);
    nodes
        .iter()
        .any(|n| n.kind == NodeKind::Text && n.marks.contains(mark))
}

fn text_runs(node: &DocNode) -> Vec<String> {
    let mut nodes = Vec::new();
    node.flatten_preorder(&mut nodes);
    nodes
        .iter()
        .filter(|n| n.kind == NodeKind::Text)
        .filter_map(|n| n.text.clone())
        .collect()
}

/// Rewrite toggles as explicit ops reproducing the committed state.
///
/// A mark toggle becomes a set-mark; a case toggle becomes the resulting run texts.
fn resolve_toggles(ops: &[EditOp], doc: &Document) -> Vec<EditOp> {
    ops.iter()
        .map(|op| match op {
            EditOp::SetCase {
                node_id,
                case: CaseChange::Toggle,
            } => match doc.find_by_id(node_id) {
                Some(node) => EditOp::SetText {
                    node_id: node_id.clone(),
                    runs: text_runs(node),
                },
                None => op.clone(),
            },
            EditOp::ToggleMark { node_id, mark } => match doc.find_by_id(node_id) {
                Some(node) => EditOp::SetMark {
                    node_id: node_id.clone(),
                    mark: mark.clone(),
                    enabled: has_mark(node, mark),
                },
                None => op.clone(),
            },
            _ => op.clone(),
        })
        .collect()
}

/// One open document.
pub struct DocumentSession<H: EditorHost> {
    host: H,
    store: Store,
    history: HistoryTracker,
    post_commit: PostCommitQueue<H>,
}

impl<H: EditorHost + std::fmt::Debug> std::fmt::Debug for DocumentSession<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSession")
            .field("host", &self.host)
            .field("store", &self.store)
            .field("history", &self.history)
            .field("post_commit", &self.post_commit)
            .finish()
    }
}

impl<H: EditorHost + 'static> DocumentSession<H> {
    /// Open a session on `host` with configuration defaults.
    pub fn new(host: H, config: &FolioConfig) -> Self {
        Self::with_parts(
            host,
            Store::new(AppState::from_config(config)),
            HistoryTracker::new(config.history_capacity),
        )
    }

    /// Open a session from explicit parts (custom clock, preloaded state).
    pub fn with_parts(host: H, store: Store, history: HistoryTracker) -> Self {
        let mut session = Self {
            host,
            store,
            history,
            post_commit: PostCommitQueue::new(),
        };
        session.recompute_toc();
        session
    }

    /// The editor host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The editor host, mutably. Edits made here bypass history and TOC recomputation.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The application store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The application store, mutably (for subscriptions).
    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    /// The history list.
    pub fn history(&self) -> &HistoryTracker {
        &self.history
    }

    /// Tasks waiting for the next commit.
    pub fn post_commit(&mut self) -> &mut PostCommitQueue<H> {
        &mut self.post_commit
    }

    /// The last computed table of contents.
    pub fn toc(&self) -> &TocTree {
        &self.store.state().editor.toc
    }

    /// The zones of the current document.
    pub fn sections(&self) -> Sections<'_> {
        sections::partition(self.host.document())
    }

    /// Dispatch a store action. TOC settings changes trigger a recomputation.
    pub fn dispatch(&mut self, action: Action) -> Result<Dispatched, StoreError> {
        let recompute = matches!(action, Action::Editor(EditorAction::SetTocSettings(_)));
        let outcome = self.store.dispatch(action)?;
        if recompute && outcome.changed {
            self.recompute_toc();
        }
        Ok(outcome)
    }

    /// Apply `ops` as one transaction, record it, refresh derived views and run
    /// post-commit tasks.
    pub fn execute(
        &mut self,
        ops: Vec<EditOp>,
        tracked: Option<TrackedEdit>,
    ) -> Result<Transaction, HostError> {
        let tx = self.commit(ops, tracked)?;
        self.post_commit.flush(&mut self.host);
        Ok(tx)
    }

    fn commit(
        &mut self,
        ops: Vec<EditOp>,
        tracked: Option<TrackedEdit>,
    ) -> Result<Transaction, HostError> {
        let tx = self.host.apply(ops, tracked).map_err(|err| {
            log::warn!("edit rejected by host: {err}");
            err
        })?;

        if tx.tracked.is_some() {
            let recorded = Transaction {
                ops: resolve_toggles(&tx.ops, self.host.document()),
                ..tx.clone()
            };
            self.history.observe(&recorded);
        }
        if tx.doc_changed {
            self.recompute_toc();
        }
        Ok(tx)
    }

    /// Rebuild the table of contents from the main-text zone and store it.
    pub fn recompute_toc(&mut self) -> &TocTree {
        let settings = self.store.state().editor.toc_settings.clone();
        let main = sections::extract(self.host.document(), Zone::MainText);
        let toc = build_toc(&main, &settings);
        if let Err(err) = self.store.dispatch(Action::Editor(EditorAction::SetToc(toc))) {
            log::warn!("failed to store table of contents: {err}");
        }
        self.toc()
    }

    /// Render the table of contents into the document.
    ///
    /// The rendered fragment replaces the current TOC zone, or is inserted at the top of the
    /// document if there is none. Once committed, the selection moves to the first entry.
    pub fn update_table_of_contents(&mut self) -> Result<Transaction, HostError> {
        self.recompute_toc();
        let state = self.store.state();
        let width = state.editor.page_setup.text_columns();
        let toc = state.editor.toc.clone();
        let nodes = render_toc(&toc, &state.editor.toc_settings, width);

        let op = match sections::zone_span(self.host.document(), Zone::Toc) {
            Some(range) => EditOp::ReplaceRange { range, nodes },
            None => EditOp::InsertNodes { index: 0, nodes },
        };

        let tx = self.commit(vec![op], None)?;
        log::info!("table of contents updated: {} entries", toc.len());

        if let Some(first) = toc.flatten_preorder().first() {
            let target = entry_id(&first.id);
            self.post_commit.defer("focus table of contents", move |host: &mut H| {
                if let Err(err) = host.chain().set_selection(target).focus().run() {
                    log::warn!("could not focus table of contents: {err}");
                }
            });
        }
        self.post_commit.flush(&mut self.host);
        Ok(tx)
    }

    /// Jump back to a history action and re-apply its ops.
    ///
    /// Newer actions are dropped from the list. This re-applies the recorded edit; it does not
    /// restore the document to the exact state it had when the action was recorded. Returns
    /// `Ok(None)` (no-op) for an unknown id.
    ///
    /// If the host rejects the ops, the document and the history list are left as they were.
    pub fn revert_to(&mut self, id: ActionId) -> Result<Option<Transaction>, HostError> {
        let Some(action) = self.history.get(id).cloned() else {
            log::info!("revert to unknown history action {}; ignored", id.get());
            return Ok(None);
        };
        let tx = if action.ops.is_empty() {
            None
        } else {
            log::debug!("re-applying `{}`", action.description);
            Some(self.execute(action.ops, None)?)
        };
        self.history.revert_to(id);
        Ok(tx)
    }

    /// Capture the document and persistent state.
    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot::capture(self.host.document(), self.store.state())
    }

    /// Replace the document and state with a snapshot.
    ///
    /// History and pending post-commit tasks are discarded. A snapshot with settings the store
    /// would reject is refused before anything changes.
    pub fn restore(&mut self, snapshot: &DocumentSnapshot) -> Result<(), StoreError> {
        let state = snapshot.app_state();
        state.validate()?;
        self.post_commit.clear();
        self.history.clear();
        self.host.set_document(snapshot.document());
        self.store.replace_state(state)?;
        self.recompute_toc();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{HistoryActionType, ManualClock};
    use crate::host::MemoryEditor;
    use crate::toc_render::TOC_TITLE_ID;
    use pretty_assertions::assert_eq;

    fn doc() -> Document {
        Document::new(vec![
            DocNode::paragraph("Preface").with_id("i1").with_zone(Zone::Intro),
            DocNode::heading(1, "Intro").with_id("h1").with_zone(Zone::MainText),
            DocNode::paragraph("text").with_id("p1").with_zone(Zone::MainText),
            DocNode::heading(2, "Background").with_id("h2").with_zone(Zone::MainText),
            DocNode::paragraph("Works cited").with_zone(Zone::Bibliography),
        ])
    }

    fn session() -> DocumentSession<MemoryEditor> {
        DocumentSession::with_parts(
            MemoryEditor::new(doc()),
            Store::default(),
            HistoryTracker::with_clock(10, ManualClock::new(0)),
        )
    }

    fn tracked(description: &str) -> Option<TrackedEdit> {
        Some(TrackedEdit {
            action_type: HistoryActionType::Format,
            description: description.to_string(),
            content: String::new(),
        })
    }

    #[test]
    fn test_toc_follows_edits() {
        let mut session = session();
        assert_eq!(session.toc().len(), 2);

        session
            .execute(
                vec![EditOp::InsertNodes {
                    index: 4,
                    nodes: vec![DocNode::heading(1, "Method").with_zone(Zone::MainText)],
                }],
                None,
            )
            .unwrap();
        let labels: Vec<_> = session
            .toc()
            .flatten_preorder()
            .iter()
            .map(|i| i.number_label.clone())
            .collect();
        assert_eq!(labels, vec!["1", "1.1", "2"]);
    }

    #[test]
    fn test_update_toc_replaces_previous_render() {
        let mut session = session();
        session.update_table_of_contents().unwrap();
        let len_after_first = session.host().document().content.len();
        assert_eq!(
            session.host().document().content[0].id(),
            Some(TOC_TITLE_ID)
        );

        session.update_table_of_contents().unwrap();
        assert_eq!(session.host().document().content.len(), len_after_first);
        // title + two entries + original five blocks
        assert_eq!(len_after_first, 8);
        assert_eq!(session.host().selection(), Some("toc-entry-h1"));
        assert!(session.host().is_focused());
        assert!(session.post_commit().is_empty());
    }

    #[test]
    fn test_toc_settings_change_recomputes() {
        let mut session = session();
        let settings = TocSettings {
            levels: 1,
            ..TocSettings::default()
        };
        session
            .dispatch(Action::Editor(EditorAction::SetTocSettings(settings)))
            .unwrap();
        assert_eq!(session.toc().len(), 1);
    }

    #[test]
    fn test_tracked_edits_are_recorded_and_revertible() {
        let mut session = session();
        session
            .execute(
                vec![EditOp::SetCase {
                    node_id: "p1".into(),
                    case: CaseChange::Upper,
                }],
                tracked("upper"),
            )
            .unwrap();
        session
            .execute(
                vec![EditOp::ToggleMark {
                    node_id: "p1".into(),
                    mark: Mark::Bold,
                }],
                tracked("bold"),
            )
            .unwrap();
        // untracked edits stay out of the list
        session
            .execute(vec![EditOp::SetIndent { node_id: "p1".into(), indent: 1 }], None)
            .unwrap();
        assert_eq!(session.history().len(), 2);

        let bold = session.history().latest().map(|a| a.id).unwrap();
        assert!(matches!(
            session.history().latest().map(|a| &a.ops[0]),
            Some(EditOp::SetMark { enabled: true, .. })
        ));

        // Unbold by hand, then jump back to the bold action: it is re-applied, not toggled.
        session
            .execute(
                vec![EditOp::ToggleMark {
                    node_id: "p1".into(),
                    mark: Mark::Bold,
                }],
                tracked("unbold"),
            )
            .unwrap();
        let tx = session.revert_to(bold).unwrap().unwrap();
        assert!(tx.doc_changed);
        assert_eq!(session.history().len(), 2);
        let p1 = session.host().document().find_by_id("p1").unwrap();
        assert_eq!(p1.content[0].marks, vec![Mark::Bold]);
    }

    #[test]
    fn test_revert_unknown_id_is_noop() {
        let mut session = session();
        session
            .execute(
                vec![EditOp::SetIndent { node_id: "p1".into(), indent: 2 }],
                tracked("indent"),
            )
            .unwrap();
        let id = session.history().latest().map(|a| a.id).unwrap();
        let version = session.host().version();

        session.history.clear();
        assert_eq!(session.revert_to(id).unwrap(), None);
        assert_eq!(session.host().version(), version);
    }

    #[test]
    fn test_host_errors_leave_everything_untouched() {
        let mut session = session();
        let before = session.host().document().clone();
        let err = session
            .execute(
                vec![EditOp::SetCase {
                    node_id: "nope".into(),
                    case: CaseChange::Lower,
                }],
                tracked("lower"),
            )
            .unwrap_err();
        assert_eq!(err, HostError::NodeNotFound("nope".into()));
        assert_eq!(session.host().document(), &before);
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut session = session();
        let snapshot = session.snapshot();
        assert_eq!(
            snapshot.fragments.iter().map(|f| f.zone).collect::<Vec<_>>(),
            vec![Some(Zone::Intro), Some(Zone::MainText), Some(Zone::Bibliography)]
        );
        assert_eq!(snapshot.zone(Zone::MainText).len(), 3);

        session
            .execute(vec![EditOp::RemoveRange { range: 0..5 }], None)
            .unwrap();
        assert!(session.toc().is_empty());

        session.restore(&snapshot).unwrap();
        assert_eq!(session.host().document(), &doc());
        assert_eq!(session.toc().len(), 2);
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_toggle_case_reverts_to_recorded_text() {
        let mut session = session();
        session
            .execute(
                vec![EditOp::InsertNodes {
                    index: 5,
                    nodes: vec![DocNode::paragraph("aBc").with_id("t1")],
                }],
                None,
            )
            .unwrap();
        session
            .execute(
                vec![EditOp::SetCase {
                    node_id: "t1".into(),
                    case: CaseChange::Toggle,
                }],
                tracked("toggle case"),
            )
            .unwrap();
        let toggled = session.history().latest().map(|a| a.id).unwrap();
        assert_eq!(
            session.history().latest().map(|a| a.ops.clone()),
            Some(vec![EditOp::SetText {
                node_id: "t1".into(),
                runs: vec!["AbC".into()],
            }])
        );

        // Jumping back twice leaves the text as it was after the toggle.
        session.revert_to(toggled).unwrap();
        assert_eq!(session.host().document().find_by_id("t1").unwrap().text_content(), "AbC");
        session.revert_to(toggled).unwrap();
        assert_eq!(session.host().document().find_by_id("t1").unwrap().text_content(), "AbC");
    }

    #[test]
    fn test_failed_revert_keeps_history() {
        let mut session = session();
        session
            .execute(
                vec![EditOp::SetIndent { node_id: "h2".into(), indent: 1 }],
                tracked("indent"),
            )
            .unwrap();
        let indent = session.history().latest().map(|a| a.id).unwrap();
        session
            .execute(
                vec![EditOp::SetCase {
                    node_id: "p1".into(),
                    case: CaseChange::Upper,
                }],
                tracked("upper"),
            )
            .unwrap();
        session
            .execute(vec![EditOp::RemoveRange { range: 3..4 }], None)
            .unwrap();
        let before = session.host().document().clone();

        let err = session.revert_to(indent).unwrap_err();
        assert_eq!(err, HostError::NodeNotFound("h2".into()));
        assert_eq!(session.history().len(), 2);
        assert_eq!(
            session.history().latest().map(|a| a.description.as_str()),
            Some("upper")
        );
        assert_eq!(session.host().document(), &before);
    }

    #[test]
    fn test_restore_rejects_invalid_settings() {
        let mut session = session();
        session
            .execute(
                vec![EditOp::SetIndent { node_id: "p1".into(), indent: 1 }],
                tracked("indent"),
            )
            .unwrap();
        let mut snapshot = session.snapshot();
        snapshot.toc_settings.levels = 0;
        snapshot.fragments.clear();

        let err = session.restore(&snapshot).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTocSettings(_)));
        assert_eq!(session.host().document().content.len(), 5);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.store().state().editor.toc_settings.levels, 3);
    }
}
