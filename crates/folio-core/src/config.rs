//! Session configuration.
//!
//! [`FolioConfig`] carries the defaults a new document session starts from. It derives serde
//! with camelCase keys and tolerates missing fields, so a configuration file only needs to name
//! the values it overrides. Loading from disk lives in `folio-io`.

use crate::apparatus::ApparatusType;
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::layout::PageSetup;
use crate::store::{AppState, StoreError, TextStyle};
use crate::toc::TocSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Defaults for new document sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FolioConfig {
    /// Number of actions kept in the history list.
    pub history_capacity: usize,
    /// Initial table-of-contents settings.
    pub toc: TocSettings,
    /// Initial page setup.
    pub page: PageSetup,
    /// Apparatus panels created for a new document.
    pub apparatus: Vec<ApparatusType>,
    /// Predefined named styles.
    pub styles: BTreeMap<String, TextStyle>,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            toc: TocSettings::default(),
            page: PageSetup::default(),
            apparatus: vec![ApparatusType::Critical],
            styles: BTreeMap::new(),
        }
    }
}

impl FolioConfig {
    /// Reject settings the store would refuse (zero TOC levels, negative margins, ...).
    pub fn validate(&self) -> Result<(), StoreError> {
        AppState::from_config(self).validate()
    }
}
