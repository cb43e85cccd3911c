//! The persisted document layout.
//!
//! A saved document is one JSON object:
//!
//! ```json
//! {
//!   "version": 1,
//!   "zones": [
//!     { "zone": "intro", "content": [ ... ] },
//!     { "zone": "maintext", "content": [ ... ] }
//!   ],
//!   "tocSettings": { "levels": 3, ... },
//!   "pageSetup": { "paper": "a4", ... },
//!   "apparatus": [ { "id": 0, "title": "Critical Apparatus", "type": "CRITICAL",
//!                    "visible": true, "disabled": false, "content": { "type": "doc", ... } } ],
//!   "styles": { "Quote": { "italic": true } },
//!   "comments": [ ... ],
//!   "bookmarks": [ ... ]
//! }
//! ```
//!
//! `zones` holds the document as consecutive runs of top-level nodes grouped by zone
//! (`"zone": null` for nodes outside every zone), so concatenating the runs gives the document
//! back. Nodes without a zone marker of their own take the marker of the run they are stored in.
//! Missing sections load as their defaults; settings out of range are rejected.

use crate::error::{FolioIoError, Result};
use crate::tree::{document_to_value, nodes_to_value, parse_document};
use folio_core::{
    Apparatus, ApparatusId, ApparatusType, DocumentSnapshot, TocSettings, Zone, ZoneFragment,
    ZoneMarker,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

/// Current layout version.
pub const FORMAT_VERSION: u64 = 1;

fn apparatus_to_value(entry: &Apparatus) -> Result<Value> {
    Ok(json!({
        "id": entry.id.get(),
        "title": entry.title,
        "type": serde_json::to_value(entry.kind)?,
        "visible": entry.visible,
        "disabled": entry.disabled,
        "content": document_to_value(&entry.content),
    }))
}

fn parse_apparatus(value: &Value) -> Option<Apparatus> {
    let id = ApparatusId::new(value.get("id")?.as_u64()?);
    let kind: ApparatusType = serde_json::from_value(value.get("type")?.clone()).ok()?;
    let title = value
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(kind.default_title());

    let mut entry = Apparatus::new(id, kind, title);
    entry.visible = value.get("visible").and_then(Value::as_bool).unwrap_or(true);
    entry.disabled = value
        .get("disabled")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if let Some(content) = value.get("content") {
        entry.content = parse_document(content);
    }
    Some(entry)
}

/// Serialize a snapshot to the persisted layout.
pub fn save_snapshot(snapshot: &DocumentSnapshot) -> Result<Value> {
    let zones: Vec<Value> = snapshot
        .fragments
        .iter()
        .map(|fragment| -> Result<Value> {
            Ok(json!({
                "zone": serde_json::to_value(fragment.zone)?,
                "content": nodes_to_value(&fragment.nodes),
            }))
        })
        .collect::<Result<_>>()?;

    let apparatus: Vec<Value> = snapshot
        .apparatus
        .iter()
        .map(apparatus_to_value)
        .collect::<Result<_>>()?;

    Ok(json!({
        "version": FORMAT_VERSION,
        "zones": zones,
        "tocSettings": serde_json::to_value(&snapshot.toc_settings)?,
        "pageSetup": serde_json::to_value(snapshot.page_setup)?,
        "apparatus": apparatus,
        "styles": serde_json::to_value(&snapshot.styles)?,
        "comments": serde_json::to_value(&snapshot.comments)?,
        "bookmarks": serde_json::to_value(&snapshot.bookmarks)?,
    }))
}

/// Serialize a snapshot to pretty-printed JSON text.
pub fn save_to_string(snapshot: &DocumentSnapshot) -> Result<String> {
    Ok(serde_json::to_string_pretty(&save_snapshot(snapshot)?)?)
}

fn field<T>(obj: &Map<String, Value>, key: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match obj.get(key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => Ok(serde_json::from_value(value.clone())?),
    }
}

fn parse_fragment(value: &Value) -> Result<ZoneFragment> {
    let zone: Option<Zone> = match value.get("zone") {
        None | Some(Value::Null) => None,
        Some(Value::String(marker)) => {
            let zone = Zone::from_marker(marker);
            if zone.is_none() {
                log::warn!("unknown zone `{marker}` loaded as unzoned content");
            }
            zone
        }
        Some(other) => {
            return Err(FolioIoError::Malformed(format!(
                "zone must be a string, got {other}"
            )));
        }
    };
    let mut nodes = value
        .get("content")
        .map(|content| parse_document(content).content)
        .unwrap_or_default();
    if let Some(zone) = zone {
        for node in &mut nodes {
            match &node.attrs.section {
                None => node.attrs.section = Some(ZoneMarker::Zone(zone)),
                Some(marker) if marker.zone() != Some(zone) => log::warn!(
                    "node marked `{}` stored under zone `{zone}`; keeping its own marker",
                    marker.as_str()
                ),
                Some(_) => {}
            }
        }
    }
    Ok(ZoneFragment { zone, nodes })
}

/// Load a snapshot from the persisted layout.
pub fn load_snapshot(value: &Value) -> Result<DocumentSnapshot> {
    let obj = value
        .as_object()
        .ok_or_else(|| FolioIoError::Malformed("document must be a JSON object".to_string()))?;

    let version = match obj.get("version") {
        None => {
            log::debug!("document has no version; assuming {FORMAT_VERSION}");
            FORMAT_VERSION
        }
        Some(v) => v
            .as_u64()
            .ok_or_else(|| FolioIoError::Malformed(format!("invalid version {v}")))?,
    };
    if version > FORMAT_VERSION {
        return Err(FolioIoError::UnsupportedVersion(version));
    }

    let fragments = match obj.get("zones") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(zones)) => zones
            .iter()
            .map(parse_fragment)
            .collect::<Result<Vec<_>>>()?,
        Some(_) => return Err(FolioIoError::Malformed("zones must be an array".to_string())),
    };

    let apparatus = obj
        .get("apparatus")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let parsed = parse_apparatus(entry);
                    if parsed.is_none() {
                        log::warn!("skipping malformed apparatus entry: {entry}");
                    }
                    parsed
                })
                .collect()
        })
        .unwrap_or_default();

    let snapshot = DocumentSnapshot {
        fragments,
        toc_settings: field::<TocSettings>(obj, "tocSettings")?,
        page_setup: field(obj, "pageSetup")?,
        apparatus,
        styles: field(obj, "styles")?,
        comments: field(obj, "comments")?,
        bookmarks: field(obj, "bookmarks")?,
    };
    snapshot.validate()?;
    Ok(snapshot)
}

/// Load a snapshot from JSON text.
pub fn load_from_str(text: &str) -> Result<DocumentSnapshot> {
    let value: Value = serde_json::from_str(text)?;
    load_snapshot(&value)
}
