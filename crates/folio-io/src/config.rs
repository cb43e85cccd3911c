//! TOML configuration loading.
//!
//! Every field is optional; anything not named in the file keeps its default:
//!
//! ```toml
//! historyCapacity = 100
//! apparatus = ["CRITICAL", "OUTER_MARGIN"]
//!
//! [toc]
//! levels = 2
//! level1Format = "Chapter I."
//!
//! [page]
//! paper = "a5"
//! fontSizePt = 11.0
//! ```

use crate::error::Result;
use folio_core::FolioConfig;
use std::path::Path;

/// Parse a configuration from TOML text.
pub fn load_config_str(text: &str) -> Result<FolioConfig> {
    let config: FolioConfig = toml::from_str(text)?;
    config.validate()?;
    if config.history_capacity == 0 {
        log::warn!("historyCapacity = 0 keeps a single history entry");
    }
    Ok(config)
}

/// Read and parse a configuration file.
pub fn load_config_file(path: impl AsRef<Path>) -> Result<FolioConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    log::debug!("loading configuration from {}", path.display());
    load_config_str(&text)
}
