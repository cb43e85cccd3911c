#![warn(missing_docs)]
//! Folio Core - Headless Document-Structure Kernel for Critical Editions
//!
//! # Overview
//!
//! `folio-core` keeps the bookkeeping that sits next to a rich-text editor in a critical-edition
//! word processor: which part of the document is the introduction or the main text, what the
//! table of contents looks like, which edits appear in the history popover, and which
//! apparatus panels are open. The rich-text engine itself is an external collaborator reached
//! through the [`EditorHost`] trait.
//!
//! # Core Features
//!
//! - **Typed document tree**: node and mark kinds are closed enums, converted once at the boundary
//! - **Zone extraction**: `toc` / `intro` / `maintext` / `bibliography` partitioning
//! - **Table of contents**: numbered heading tree with per-level formats, rendered back to nodes
//! - **History list**: bounded, timestamped, human-readable actions with "revert to"
//! - **Apparatus registry**: panel set with singleton and visibility constraints
//! - **Store**: versioned, observable application state with typed actions
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  DocumentSession                            │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Store (editor / apparatus / comments /     │  ← Application State
//! │         bookmarks) + HistoryTracker         │
//! ├─────────────────────────────────────────────┤
//! │  TOC Builder + Renderer, Page Layout        │  ← Derived Views
//! ├─────────────────────────────────────────────┤
//! │  Section Extractor                          │  ← Zones
//! ├─────────────────────────────────────────────┤
//! │  Document Tree + EditorHost                 │  ← Editor Boundary
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use folio_core::{DocNode, Document, TocSettings, Zone, build_toc, extract};
//!
//! let doc = Document::new(vec![
//!     DocNode::paragraph("Preface").with_zone(Zone::Intro),
//!     DocNode::heading(1, "Intro").with_zone(Zone::MainText),
//!     DocNode::heading(2, "Background").with_zone(Zone::MainText),
//!     DocNode::heading(1, "Method").with_zone(Zone::MainText),
//! ]);
//!
//! let main = extract(&doc, Zone::MainText);
//! let toc = build_toc(&main, &TocSettings::default());
//!
//! assert_eq!(toc.items.len(), 2);
//! assert_eq!(toc.items[0].children[0].number_label, "1.1");
//! assert!(extract(&doc, Zone::Bibliography).is_empty());
//! ```
//!
//! # Module Description
//!
//! - [`node`] - Typed document tree
//! - [`sections`] - Zone extraction
//! - [`toc`] - Table-of-contents settings and builder
//! - [`toc_render`] - Table-of-contents renderer
//! - [`history`] - Human-readable edit history
//! - [`apparatus`] - Apparatus panel registry
//! - [`store`] - Application state container
//! - [`comments`] / [`bookmarks`] - Annotation slices
//! - [`layout`] - Page setup and text width
//! - [`case`] - Case conversion
//! - [`host`] - Editor framework boundary and in-memory host
//! - [`scheduler`] - Post-commit task queue
//! - [`config`] - Configuration defaults
//! - [`session`] - Document session orchestration
//!
//! # Unicode Support
//!
//! - Leader fills are sized by display width (CJK glyphs take two cells)
//! - Case conversion works on grapheme clusters
//!
//! JSON conversion of editor trees, the persisted document layout and TOML configuration live
//! in the `folio-io` crate.

pub mod apparatus;
pub mod bookmarks;
pub mod case;
pub mod comments;
pub mod config;
pub mod history;
pub mod host;
pub mod layout;
pub mod node;
pub mod scheduler;
pub mod sections;
pub mod session;
pub mod store;
pub mod toc;
pub mod toc_render;

pub use apparatus::{
    Apparatus, ApparatusError, ApparatusId, ApparatusRegistry, ApparatusType, MenuItem,
};
pub use bookmarks::{Bookmark, BookmarkError, Bookmarks};
pub use case::{CaseChange, CaseState, apply_case};
pub use comments::{Comment, CommentError, CommentId, Comments, Reply};
pub use config::FolioConfig;
pub use history::{
    ActionId, Clock, DEFAULT_HISTORY_CAPACITY, HistoryAction, HistoryActionType, HistoryTracker,
    ManualClock, SystemClock,
};
pub use host::{CommandChain, EditOp, EditorHost, HostError, MemoryEditor, TrackedEdit, Transaction};
pub use layout::{Margins, Orientation, PageSetup, Paper};
pub use node::{DocNode, Document, Mark, NodeAttrs, NodeKind, Zone, ZoneMarker};
pub use scheduler::{PostCommitQueue, PostCommitTask};
pub use sections::{Sections, extract, headings, partition, zone_span};
pub use session::{DocumentSession, DocumentSnapshot, ZoneFragment};
pub use store::{
    Action, AppState, ApparatusAction, BookmarkAction, CommentAction, CreatedId, Dispatched,
    EditorAction, EditorSlice, Slice, Store, StoreCallback, StoreChange, StoreError, TextStyle,
};
pub use toc::{
    LevelFormat, MAX_HEADING_LEVEL, NumberStyle, TabLeader, TocItem, TocSettings, TocTree,
    build_toc,
};
pub use toc_render::{TOC_TITLE_ID, render_toc};
