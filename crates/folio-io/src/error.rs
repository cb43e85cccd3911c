use thiserror::Error;

/// Errors reported while loading or saving documents and configuration.
#[derive(Debug, Error)]
pub enum FolioIoError {
    #[error("JSON error: {0}")]
    /// The input is not valid JSON (or a value failed to (de)serialize).
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    /// The configuration is not valid TOML or has mistyped fields.
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    /// Reading a file failed.
    Io(#[from] std::io::Error),

    #[error("unsupported document version {0}")]
    /// The persisted layout was written by a newer format version.
    UnsupportedVersion(u64),

    #[error("malformed document: {0}")]
    /// A required field is missing or has the wrong shape.
    Malformed(String),

    #[error("invalid document settings: {0}")]
    /// Settings parse but are out of range (zero TOC levels, negative margins, ...).
    Invalid(#[from] folio_core::StoreError),
}

/// Result alias for `folio-io` operations.
pub type Result<T> = std::result::Result<T, FolioIoError>;
