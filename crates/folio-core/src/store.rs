//! Application state container.
//!
//! [`Store`] owns the [`AppState`] slices (editor, apparatus, comments, bookmarks) and changes
//! them only through typed [`Action`]s. Every dispatch runs the slice reducer synchronously:
//!
//! 1. a rejected action returns a [`StoreError`] and leaves the state untouched;
//! 2. an accepted action that changes nothing returns normally without a version bump;
//! 3. otherwise the version is incremented and every subscriber receives a [`StoreChange`].
//!
//! The store is an ordinary value: create one per document session and pass it explicitly.
//!
//! # Example
//!
//! ```rust
//! use folio_core::{Action, ApparatusAction, ApparatusType, Store};
//! use std::sync::{Arc, Mutex};
//!
//! let mut store = Store::default();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//! store.subscribe(move |change| sink.lock().unwrap().push(change.slice));
//!
//! store
//!     .dispatch(Action::Apparatus(ApparatusAction::Add(ApparatusType::InnerMargin)))
//!     .unwrap();
//! // A second inner margin is rejected and nothing is published.
//! assert!(
//!     store
//!         .dispatch(Action::Apparatus(ApparatusAction::Add(ApparatusType::InnerMargin)))
//!         .is_err()
//! );
//!
//! assert_eq!(store.version(), 1);
//! assert_eq!(seen.lock().unwrap().len(), 1);
//! ```

use crate::apparatus::{ApparatusError, ApparatusId, ApparatusRegistry, ApparatusType};
use crate::bookmarks::{BookmarkError, Bookmarks};
use crate::comments::{CommentError, CommentId, Comments};
use crate::config::FolioConfig;
use crate::layout::PageSetup;
use crate::node::Document;
use crate::toc::{MAX_HEADING_LEVEL, TocSettings, TocTree};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// A named character/paragraph style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextStyle {
    /// Font family.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Font size in points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size_pt: Option<f64>,
    /// Bold.
    pub bold: bool,
    /// Italic.
    pub italic: bool,
    /// Small capitals.
    pub small_caps: bool,
    /// CSS-style color (`#rrggbb`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Paragraph alignment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,
}

/// Editor-level state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorSlice {
    /// Table-of-contents settings.
    pub toc_settings: TocSettings,
    /// Page setup.
    pub page_setup: PageSetup,
    /// Last computed table of contents.
    pub toc: TocTree,
    /// Named styles.
    pub styles: BTreeMap<String, TextStyle>,
    /// Heading id currently selected in the outline.
    pub selected_heading: Option<String>,
}

/// The full application state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    /// Editor settings and derived views.
    pub editor: EditorSlice,
    /// Apparatus panels.
    pub apparatus: ApparatusRegistry,
    /// Review comments.
    pub comments: Comments,
    /// Bookmarks.
    pub bookmarks: Bookmarks,
}

impl AppState {
    /// Initial state from configuration defaults.
    pub fn from_config(config: &FolioConfig) -> Self {
        Self {
            editor: EditorSlice {
                toc_settings: config.toc.clone(),
                page_setup: config.page,
                styles: config.styles.clone(),
                ..EditorSlice::default()
            },
            apparatus: ApparatusRegistry::with_types(&config.apparatus),
            comments: Comments::default(),
            bookmarks: Bookmarks::default(),
        }
    }

    /// Check the settings a dispatched action would have rejected.
    ///
    /// State built outside [`Store::dispatch`] (a loaded file, a configuration) goes through
    /// this before it reaches a store.
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_toc(&self.editor.toc_settings)?;
        validate_page(&self.editor.page_setup)?;
        if self.editor.styles.keys().any(|name| name.trim().is_empty()) {
            return Err(StoreError::EmptyStyleName);
        }
        Ok(())
    }
}

/// Editor slice actions.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    /// Replace the TOC settings.
    SetTocSettings(TocSettings),
    /// Replace the page setup.
    SetPageSetup(PageSetup),
    /// Store a freshly computed table of contents.
    SetToc(TocTree),
    /// Define or replace a named style.
    SetStyle {
        /// Style name.
        name: String,
        /// Style definition.
        style: TextStyle,
    },
    /// Remove a named style.
    RemoveStyle(String),
    /// Select a heading in the outline (or clear the selection).
    SelectHeading(Option<String>),
}

/// Apparatus slice actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApparatusAction {
    /// Append a panel.
    Add(ApparatusType),
    /// Remove a panel.
    Remove(ApparatusId),
    /// Flip a panel's visibility.
    ToggleVisibility(ApparatusId),
    /// Replace the stacking order.
    Reorder(Vec<ApparatusId>),
    /// Change a panel's type.
    ChangeType {
        /// Panel.
        id: ApparatusId,
        /// New type.
        kind: ApparatusType,
    },
    /// Rename a panel.
    Rename {
        /// Panel.
        id: ApparatusId,
        /// New title.
        title: String,
    },
    /// Enable or disable editing in a panel.
    SetDisabled {
        /// Panel.
        id: ApparatusId,
        /// Disabled flag.
        disabled: bool,
    },
    /// Replace a panel's content.
    SetContent {
        /// Panel.
        id: ApparatusId,
        /// New content.
        content: Document,
    },
}

/// Comment slice actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentAction {
    /// Start a thread.
    Add {
        /// Anchor node id.
        node_id: String,
        /// Author.
        author: String,
        /// Text.
        body: String,
        /// Creation time (ms since the epoch).
        created_at: i64,
    },
    /// Edit a thread's body.
    Edit {
        /// Thread.
        id: CommentId,
        /// New text.
        body: String,
    },
    /// Reply to a thread.
    Reply {
        /// Thread.
        id: CommentId,
        /// Author.
        author: String,
        /// Text.
        body: String,
        /// Creation time (ms since the epoch).
        created_at: i64,
    },
    /// Resolve or reopen a thread.
    SetResolved {
        /// Thread.
        id: CommentId,
        /// Resolved flag.
        resolved: bool,
    },
    /// Delete a thread.
    Delete(CommentId),
}

/// Bookmark slice actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkAction {
    /// Add a bookmark.
    Add {
        /// Unique name.
        name: String,
        /// Bookmarked node id.
        node_id: String,
    },
    /// Rename a bookmark.
    Rename {
        /// Bookmark id.
        id: String,
        /// New unique name.
        name: String,
    },
    /// Remove a bookmark.
    Remove(String),
}

/// A store action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Editor slice action.
    Editor(EditorAction),
    /// Apparatus slice action.
    Apparatus(ApparatusAction),
    /// Comment slice action.
    Comments(CommentAction),
    /// Bookmark slice action.
    Bookmarks(BookmarkAction),
}

/// State slice touched by a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slice {
    /// Editor slice.
    Editor,
    /// Apparatus slice.
    Apparatus,
    /// Comments slice.
    Comments,
    /// Bookmarks slice.
    Bookmarks,
    /// The whole state was replaced.
    All,
}

impl Action {
    /// The slice this action targets.
    pub fn slice(&self) -> Slice {
        match self {
            Action::Editor(_) => Slice::Editor,
            Action::Apparatus(_) => Slice::Apparatus,
            Action::Comments(_) => Slice::Comments,
            Action::Bookmarks(_) => Slice::Bookmarks,
        }
    }
}

/// Change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    /// Slice that changed.
    pub slice: Slice,
    /// Version before the change.
    pub old_version: u64,
    /// Version after the change.
    pub new_version: u64,
}

/// An id created by a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatedId {
    /// New apparatus panel.
    Apparatus(ApparatusId),
    /// New comment thread or reply.
    Comment(CommentId),
    /// New bookmark.
    Bookmark(String),
}

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    /// Whether state changed (and the version was bumped).
    pub changed: bool,
    /// Id created by the action, if any.
    pub created: Option<CreatedId>,
}

impl Dispatched {
    fn changed(changed: bool) -> Self {
        Self {
            changed,
            created: None,
        }
    }

    fn created(id: CreatedId) -> Self {
        Self {
            changed: true,
            created: Some(id),
        }
    }
}

/// Rejected actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Apparatus constraint violation.
    #[error(transparent)]
    Apparatus(#[from] ApparatusError),
    /// Comment error.
    #[error(transparent)]
    Comment(#[from] CommentError),
    /// Bookmark error.
    #[error(transparent)]
    Bookmark(#[from] BookmarkError),
    /// TOC settings out of range.
    #[error("invalid table-of-contents settings: {0}")]
    InvalidTocSettings(String),
    /// Page geometry out of range.
    #[error("invalid page setup: {0}")]
    InvalidPageSetup(String),
    /// Style names must contain text.
    #[error("style name is empty")]
    EmptyStyleName,
}

/// Subscriber callback.
pub type StoreCallback = Box<dyn FnMut(&StoreChange) + Send>;

fn validate_toc(settings: &TocSettings) -> Result<(), StoreError> {
    if settings.levels == 0 || settings.levels > MAX_HEADING_LEVEL {
        return Err(StoreError::InvalidTocSettings(format!(
            "levels must be within 1..={MAX_HEADING_LEVEL}, got {}",
            settings.levels
        )));
    }
    Ok(())
}

fn validate_page(page: &PageSetup) -> Result<(), StoreError> {
    let (width, height) = page.paper.size_mm();
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(StoreError::InvalidPageSetup(format!(
            "paper size {width}x{height} mm"
        )));
    }
    let m = &page.margins;
    if [m.top, m.bottom, m.inner, m.outer]
        .iter()
        .any(|v| !v.is_finite() || *v < 0.0)
    {
        return Err(StoreError::InvalidPageSetup("negative margin".to_string()));
    }
    if !(page.font_size_pt.is_finite() && page.font_size_pt > 0.0) {
        return Err(StoreError::InvalidPageSetup(format!(
            "font size {}pt",
            page.font_size_pt
        )));
    }
    Ok(())
}

fn reduce_editor(slice: &mut EditorSlice, action: EditorAction) -> Result<Dispatched, StoreError> {
    let changed = match action {
        EditorAction::SetTocSettings(settings) => {
            validate_toc(&settings)?;
            let changed = slice.toc_settings != settings;
            slice.toc_settings = settings;
            changed
        }
        EditorAction::SetPageSetup(page) => {
            validate_page(&page)?;
            let changed = slice.page_setup != page;
            slice.page_setup = page;
            changed
        }
        EditorAction::SetToc(toc) => {
            let changed = slice.toc != toc;
            slice.toc = toc;
            changed
        }
        EditorAction::SetStyle { name, style } => {
            if name.trim().is_empty() {
                return Err(StoreError::EmptyStyleName);
            }
            slice.styles.insert(name, style.clone()) != Some(style)
        }
        EditorAction::RemoveStyle(name) => slice.styles.remove(&name).is_some(),
        EditorAction::SelectHeading(id) => {
            let changed = slice.selected_heading != id;
            slice.selected_heading = id;
            changed
        }
    };
    Ok(Dispatched::changed(changed))
}

fn reduce_apparatus(
    registry: &mut ApparatusRegistry,
    action: ApparatusAction,
) -> Result<Dispatched, StoreError> {
    let result = match action {
        ApparatusAction::Add(kind) => {
            Dispatched::created(CreatedId::Apparatus(registry.add(kind)?))
        }
        ApparatusAction::Remove(id) => {
            registry.remove(id)?;
            Dispatched::changed(true)
        }
        ApparatusAction::ToggleVisibility(id) => {
            registry.toggle_visibility(id)?;
            Dispatched::changed(true)
        }
        ApparatusAction::Reorder(order) => {
            let before: Vec<ApparatusId> = registry.iter().map(|a| a.id).collect();
            registry.reorder(&order)?;
            Dispatched::changed(before != order)
        }
        ApparatusAction::ChangeType { id, kind } => {
            let before = registry.get(id).map(|a| a.kind);
            registry.change_type(id, kind)?;
            Dispatched::changed(before != Some(kind))
        }
        ApparatusAction::Rename { id, title } => {
            let changed = registry.get(id).is_some_and(|a| a.title != title);
            registry.rename(id, title)?;
            Dispatched::changed(changed)
        }
        ApparatusAction::SetDisabled { id, disabled } => {
            let changed = registry.get(id).is_some_and(|a| a.disabled != disabled);
            registry.set_disabled(id, disabled)?;
            Dispatched::changed(changed)
        }
        ApparatusAction::SetContent { id, content } => {
            let changed = registry.get(id).is_some_and(|a| a.content != content);
            registry.set_content(id, content)?;
            Dispatched::changed(changed)
        }
    };
    Ok(result)
}

fn reduce_comments(
    comments: &mut Comments,
    action: CommentAction,
) -> Result<Dispatched, StoreError> {
    let result = match action {
        CommentAction::Add {
            node_id,
            author,
            body,
            created_at,
        } => Dispatched::created(CreatedId::Comment(
            comments.add(node_id, author, body, created_at)?,
        )),
        CommentAction::Edit { id, body } => Dispatched::changed(comments.edit(id, body)?),
        CommentAction::Reply {
            id,
            author,
            body,
            created_at,
        } => Dispatched::created(CreatedId::Comment(
            comments.reply(id, author, body, created_at)?,
        )),
        CommentAction::SetResolved { id, resolved } => {
            Dispatched::changed(comments.set_resolved(id, resolved)?)
        }
        CommentAction::Delete(id) => {
            comments.delete(id)?;
            Dispatched::changed(true)
        }
    };
    Ok(result)
}

fn reduce_bookmarks(
    bookmarks: &mut Bookmarks,
    action: BookmarkAction,
) -> Result<Dispatched, StoreError> {
    let result = match action {
        BookmarkAction::Add { name, node_id } => {
            Dispatched::created(CreatedId::Bookmark(bookmarks.add(name, node_id)?))
        }
        BookmarkAction::Rename { id, name } => Dispatched::changed(bookmarks.rename(&id, name)?),
        BookmarkAction::Remove(id) => {
            bookmarks.remove(&id)?;
            Dispatched::changed(true)
        }
    };
    Ok(result)
}

/// Versioned, observable application state.
pub struct Store {
    state: AppState,
    version: u64,
    callbacks: Vec<StoreCallback>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("version", &self.version)
            .field("subscribers", &self.callbacks.len())
            .finish()
    }
}

impl Store {
    /// Create a store holding `state` at version 0.
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            version: 0,
            callbacks: Vec::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Current version (incremented on every effective change).
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Check if state has changed since a version.
    pub fn has_changed_since(&self, version: u64) -> bool {
        self.version > version
    }

    /// Subscribe to change notifications.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&StoreChange) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Apply an action.
    pub fn dispatch(&mut self, action: Action) -> Result<Dispatched, StoreError> {
        let slice = action.slice();
        let outcome = match action {
            Action::Editor(a) => reduce_editor(&mut self.state.editor, a),
            Action::Apparatus(a) => reduce_apparatus(&mut self.state.apparatus, a),
            Action::Comments(a) => reduce_comments(&mut self.state.comments, a),
            Action::Bookmarks(a) => reduce_bookmarks(&mut self.state.bookmarks, a),
        };

        match outcome {
            Ok(outcome) => {
                if outcome.changed {
                    self.bump(slice);
                }
                Ok(outcome)
            }
            Err(err) => {
                log::debug!("{slice:?} action rejected: {err}");
                Err(err)
            }
        }
    }

    /// Replace the whole state (document load / restore).
    ///
    /// Invalid state is rejected and the current state kept.
    pub fn replace_state(&mut self, state: AppState) -> Result<(), StoreError> {
        state.validate()?;
        if self.state != state {
            self.state = state;
            self.bump(Slice::All);
        }
        Ok(())
    }

    fn bump(&mut self, slice: Slice) {
        let old_version = self.version;
        self.version += 1;
        let change = StoreChange {
            slice,
            old_version,
            new_version: self.version,
        };
        for callback in &mut self.callbacks {
            callback(&change);
        }
    }
}
