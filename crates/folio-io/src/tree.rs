//! Conversion between the editor framework's JSON node trees and [`folio_core::DocNode`].
//!
//! The editor speaks ProseMirror-style JSON:
//!
//! ```json
//! { "type": "heading", "attrs": { "level": 1, "id": "h1", "sectionType": "maintext" },
//!   "content": [ { "type": "text", "text": "Intro", "marks": [ { "type": "bold" } ] } ] }
//! ```
//!
//! Parsing is lenient. A node without a string `type` is skipped (with its subtree). Attributes
//! the kernel does not interpret are kept verbatim in [`NodeAttrs::extra_json`] and written back
//! on serialization, so a load/save cycle does not lose editor-specific data. Marks work the
//! same way: link, comment and bookmark marks keep their other attributes raw, and unknown
//! marks (`textStyle`, `highlight`, ...) become [`Mark::Custom`] with their attributes intact.

use folio_core::{DocNode, Document, Mark, NodeAttrs, NodeKind, ZoneMarker};
use serde_json::{Map, Value, json};

fn small_int(value: &Value) -> Option<u8> {
    value.as_u64().and_then(|n| u8::try_from(n).ok())
}

fn owned_str(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn raw_object(map: &Map<String, Value>) -> Option<String> {
    (!map.is_empty()).then(|| Value::Object(map.clone()).to_string())
}

/// Parse node attributes.
///
/// A known attribute whose value does not fit its typed field (a level above 255, an
/// explicit `indent: 0`, a non-string alignment) is kept raw in `extra_json` instead.
fn parse_attrs(value: Option<&Value>) -> NodeAttrs {
    let Some(obj) = value.and_then(Value::as_object) else {
        return NodeAttrs::default();
    };

    let mut attrs = NodeAttrs::default();
    let mut extra = Map::new();
    for (key, value) in obj {
        let typed = match key.as_str() {
            "id" => {
                attrs.id = match value {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                };
                attrs.id.is_some()
            }
            "level" => {
                attrs.level = small_int(value);
                attrs.level.is_some()
            }
            "sectionType" => {
                attrs.section = value.as_str().map(ZoneMarker::parse);
                attrs.section.is_some()
            }
            "indent" => {
                attrs.indent = small_int(value).filter(|n| *n > 0);
                attrs.indent.is_some()
            }
            "textAlign" => {
                attrs.text_align = owned_str(value);
                attrs.text_align.is_some()
            }
            "target" => {
                attrs.target = owned_str(value);
                attrs.target.is_some()
            }
            _ => false,
        };
        if !typed {
            extra.insert(key.clone(), value.clone());
        }
    }
    attrs.extra_json = raw_object(&extra);
    attrs
}

fn take_str(attrs: &mut Map<String, Value>, key: &str) -> Option<String> {
    let value = owned_str(attrs.get(key)?)?;
    attrs.remove(key);
    Some(value)
}

fn parse_mark(value: &Value) -> Option<Mark> {
    let kind = value.get("type")?.as_str()?;
    let raw_attrs = value.get("attrs");
    let mut attrs = raw_attrs
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let plain = match kind {
        "bold" => Some(Mark::Bold),
        "italic" => Some(Mark::Italic),
        "underline" => Some(Mark::Underline),
        "strike" => Some(Mark::Strike),
        "superscript" => Some(Mark::Superscript),
        "subscript" => Some(Mark::Subscript),
        "smallCaps" => Some(Mark::SmallCaps),
        _ => None,
    };
    if let Some(mark) = &plain
        && attrs.is_empty()
    {
        return Some(mark.clone());
    }

    let typed = match kind {
        "link" => take_str(&mut attrs, "href").map(|href| Mark::Link {
            href,
            extra_json: raw_object(&attrs),
        }),
        "comment" => take_str(&mut attrs, "commentId").map(|id| Mark::Comment {
            id,
            extra_json: raw_object(&attrs),
        }),
        "bookmark" => take_str(&mut attrs, "id").map(|id| Mark::Bookmark {
            id,
            extra_json: raw_object(&attrs),
        }),
        _ => None,
    };

    // Anything the typed variants cannot hold is carried verbatim.
    Some(typed.unwrap_or_else(|| {
        if plain.is_some() || matches!(kind, "link" | "comment" | "bookmark") {
            log::debug!("mark `{kind}` has unexpected attributes; kept as an opaque mark");
        }
        Mark::Custom {
            name: kind.to_string(),
            attrs_json: raw_attrs.map(Value::to_string),
        }
    }))
}

/// Parse one editor node. Returns `None` if the value has no string `type`.
pub fn parse_node(value: &Value) -> Option<DocNode> {
    let Some(type_name) = value.get("type").and_then(Value::as_str) else {
        log::debug!("skipping node without a type: {value}");
        return None;
    };

    let marks = value
        .get("marks")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(parse_mark).collect())
        .unwrap_or_default();

    let content = value
        .get("content")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(parse_node).collect())
        .unwrap_or_default();

    Some(DocNode {
        kind: NodeKind::from_type_name(type_name),
        attrs: parse_attrs(value.get("attrs")),
        text: value.get("text").and_then(Value::as_str).map(|s| s.to_string()),
        marks,
        content,
    })
}

/// Parse a document.
///
/// Accepts a `doc` root node, a bare array of top-level nodes, or a single block node.
pub fn parse_document(value: &Value) -> Document {
    let nodes = match value {
        Value::Array(arr) => arr.iter().filter_map(parse_node).collect(),
        Value::Object(_) => match parse_node(value) {
            Some(root) if root.kind == NodeKind::Doc => root.content,
            Some(block) => vec![block],
            None => Vec::new(),
        },
        _ => {
            log::warn!("document is neither an object nor an array");
            Vec::new()
        }
    };
    Document::new(nodes)
}

fn extra_object(raw: Option<&str>, owner: &str) -> Map<String, Value> {
    match raw.map(serde_json::from_str::<Value>) {
        Some(Ok(Value::Object(extra))) => extra,
        Some(_) => {
            log::warn!("dropping unparseable extra attributes on {owner}");
            Map::new()
        }
        None => Map::new(),
    }
}

fn attrs_to_value(attrs: &NodeAttrs) -> Option<Value> {
    if attrs.is_empty() {
        return None;
    }

    let owner = format!("node {:?}", attrs.id);
    let mut obj = extra_object(attrs.extra_json.as_deref(), &owner);

    if let Some(id) = &attrs.id {
        obj.insert("id".into(), json!(id));
    }
    if let Some(level) = attrs.level {
        obj.insert("level".into(), json!(level));
    }
    if let Some(section) = &attrs.section {
        obj.insert("sectionType".into(), json!(section.as_str()));
    }
    if let Some(indent) = attrs.indent {
        obj.insert("indent".into(), json!(indent));
    }
    if let Some(align) = &attrs.text_align {
        obj.insert("textAlign".into(), json!(align));
    }
    if let Some(target) = &attrs.target {
        obj.insert("target".into(), json!(target));
    }
    (!obj.is_empty()).then_some(Value::Object(obj))
}

fn mark_to_value(mark: &Mark) -> Value {
    let (key, typed, extra) = match mark {
        Mark::Link { href, extra_json } => ("href", href, extra_json),
        Mark::Comment { id, extra_json } => ("commentId", id, extra_json),
        Mark::Bookmark { id, extra_json } => ("id", id, extra_json),
        Mark::Custom { name, attrs_json } => {
            return match attrs_json.as_deref().map(serde_json::from_str::<Value>) {
                Some(Ok(attrs)) => json!({ "type": name, "attrs": attrs }),
                Some(Err(err)) => {
                    log::warn!("dropping unparseable attributes on mark `{name}`: {err}");
                    json!({ "type": name })
                }
                None => json!({ "type": name }),
            };
        }
        other => return json!({ "type": other.type_name() }),
    };

    let mut attrs = extra_object(extra.as_deref(), mark.type_name());
    attrs.insert(key.into(), json!(typed));
    json!({ "type": mark.type_name(), "attrs": attrs })
}

/// Serialize one node to editor JSON. Empty fields are omitted.
pub fn node_to_value(node: &DocNode) -> Value {
    let mut obj = Map::new();
    obj.insert("type".into(), json!(node.kind.type_name()));
    if let Some(attrs) = attrs_to_value(&node.attrs) {
        obj.insert("attrs".into(), attrs);
    }
    if let Some(text) = &node.text {
        obj.insert("text".into(), json!(text));
    }
    if !node.marks.is_empty() {
        obj.insert(
            "marks".into(),
            Value::Array(node.marks.iter().map(mark_to_value).collect()),
        );
    }
    if !node.content.is_empty() {
        obj.insert("content".into(), nodes_to_value(&node.content));
    }
    Value::Object(obj)
}

/// Serialize a list of nodes to a JSON array.
pub fn nodes_to_value(nodes: &[DocNode]) -> Value {
    Value::Array(nodes.iter().map(node_to_value).collect())
}

/// Serialize a document as a `doc` root node.
pub fn document_to_value(doc: &Document) -> Value {
    json!({ "type": "doc", "content": nodes_to_value(&doc.content) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Zone;

    #[test]
    fn test_parse_heading_with_marks() {
        let value = json!({
            "type": "heading",
            "attrs": { "level": 2, "id": "h", "sectionType": "maintext" },
            "content": [
                { "type": "text", "text": "Intro", "marks": [{ "type": "italic" }] }
            ]
        });
        let node = parse_node(&value).unwrap();
        assert_eq!(node.kind, NodeKind::Heading);
        assert_eq!(node.heading_level(), Some(2));
        assert_eq!(node.attrs.section, Some(ZoneMarker::Zone(Zone::MainText)));
        assert_eq!(node.content[0].marks, vec![Mark::Italic]);
        assert_eq!(node.attrs.extra_json, None);
    }

    #[test]
    fn test_untyped_children_are_skipped() {
        let value = json!({
            "type": "paragraph",
            "content": [ { "text": "no type" }, { "type": "text", "text": "kept" } ]
        });
        let node = parse_node(&value).unwrap();
        assert_eq!(node.content.len(), 1);
        assert!(parse_node(&json!({ "text": "x" })).is_none());
    }

    #[test]
    fn test_unknown_attrs_round_trip() {
        let value = json!({
            "type": "paragraph",
            "attrs": { "id": "p", "dataColor": "red", "lineHeight": 1.5 }
        });
        let node = parse_node(&value).unwrap();
        assert!(node.attrs.extra_json.is_some());
        assert_eq!(node_to_value(&node), value);
    }

    #[test]
    fn test_mark_attributes_round_trip() {
        let value = json!({
            "type": "text",
            "text": "Gallia",
            "marks": [
                { "type": "textStyle",
                  "attrs": { "color": "#ff0000", "fontFamily": "Garamond" } },
                { "type": "link",
                  "attrs": { "href": "https://a", "target": "_blank", "rel": null } },
                { "type": "comment", "attrs": { "commentId": "c1", "resolved": false } },
                { "type": "bold" }
            ]
        });
        let node = parse_node(&value).unwrap();
        assert_eq!(node.marks[0].type_name(), "textStyle");
        assert!(matches!(&node.marks[1], Mark::Link { href, .. } if href == "https://a"));
        assert!(matches!(&node.marks[2], Mark::Comment { id, .. } if id == "c1"));
        assert_eq!(node.marks[3], Mark::Bold);
        assert_eq!(node_to_value(&node), value);
    }

    #[test]
    fn test_marks_missing_their_key_are_kept_opaque() {
        let value = json!({
            "type": "text",
            "text": "x",
            "marks": [
                { "type": "bookmark", "attrs": { "name": "no id" } },
                { "type": "italic", "attrs": { "variant": "oblique" } }
            ]
        });
        let node = parse_node(&value).unwrap();
        assert!(node.marks.iter().all(|m| matches!(m, Mark::Custom { .. })));
        assert_eq!(node_to_value(&node), value);
    }

    #[test]
    fn test_out_of_range_attrs_stay_raw() {
        let value = json!({
            "type": "heading",
            "attrs": { "level": 300, "indent": 0, "textAlign": 5 }
        });
        let node = parse_node(&value).unwrap();
        assert_eq!(node.attrs.level, None);
        assert_eq!(node.attrs.indent, None);
        assert_eq!(node.attrs.text_align, None);
        assert_eq!(node_to_value(&node), value);

        let fits = parse_node(&json!({ "type": "paragraph", "attrs": { "indent": 2 } })).unwrap();
        assert_eq!(fits.attrs.indent, Some(2));
        assert_eq!(fits.attrs.extra_json, None);
    }

    #[test]
    fn test_parse_document_shapes() {
        let root = json!({ "type": "doc", "content": [{ "type": "paragraph" }] });
        assert_eq!(parse_document(&root).content.len(), 1);

        let bare = json!([{ "type": "paragraph" }, { "type": "paragraph" }, 3]);
        assert_eq!(parse_document(&bare).content.len(), 2);

        assert!(parse_document(&json!("nope")).is_empty());
    }
}
