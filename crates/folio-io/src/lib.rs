#![warn(missing_docs)]
//! `folio-io` - serialization boundary for `folio-core`.
//!
//! This crate converts between the editor framework's JSON node trees and the typed
//! `folio_core::DocNode` tree, reads and writes the persisted document layout, and loads
//! `folio_core::FolioConfig` from TOML. It never touches the editing session itself.
//!
//! # Example
//!
//! ```rust
//! use folio_core::{AppState, DocumentSnapshot, Zone};
//! use folio_io::{load_from_str, parse_document, save_to_string};
//! use serde_json::json;
//!
//! let doc = parse_document(&json!({
//!     "type": "doc",
//!     "content": [
//!         { "type": "heading", "attrs": { "level": 1, "sectionType": "maintext" },
//!           "content": [{ "type": "text", "text": "Intro" }] }
//!     ]
//! }));
//!
//! let snapshot = DocumentSnapshot::capture(&doc, &AppState::default());
//! let text = save_to_string(&snapshot).unwrap();
//! let loaded = load_from_str(&text).unwrap();
//! assert_eq!(loaded.zone(Zone::MainText).len(), 1);
//! ```

mod error;

pub mod config;
pub mod persist;
pub mod tree;

pub use config::{load_config_file, load_config_str};
pub use error::{FolioIoError, Result};
pub use persist::{FORMAT_VERSION, load_from_str, load_snapshot, save_snapshot, save_to_string};
pub use tree::{document_to_value, node_to_value, nodes_to_value, parse_document, parse_node};
