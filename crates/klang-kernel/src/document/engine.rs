//! Select/edit/delete over JSON and YAML documents.
//!
//! YAML streams are split on `\n---\n` and handled document-wise: edited
//! documents are re-serialized (block style, 2-space indent, alphabetical
//! keys from the JSON intermediate), untouched documents are preserved
//! byte-for-byte, and the stream is rejoined with the same separator. A
//! single-document input is never promoted to a stream.
//!
//! The `kube_*` operations understand three container shapes: a Kubernetes
//! `List` envelope (selection over `items`), a multi-document stream
//! (selection per document), and a plain object. The optional filter is a
//! resource key (`group/Kind/namespace/name`); the optional path addresses
//! a node inside each selected object.

use klang_types::{ResourceKey, Value};
use serde_json::Value as JsonValue;

use super::path;
use crate::error::RuntimeError;

/// Separator between documents in a YAML stream.
pub const YAML_SEPARATOR: &str = "\n---\n";

fn parse_json(doc: &str) -> Result<JsonValue, RuntimeError> {
    serde_json::from_str(doc).map_err(|e| RuntimeError::Document(format!("invalid JSON: {e}")))
}

fn parse_yaml(doc: &str) -> Result<JsonValue, RuntimeError> {
    serde_yaml::from_str(doc).map_err(|e| RuntimeError::Document(format!("invalid YAML: {e}")))
}

/// Parse a document of either wire format, JSON first.
fn parse_any(doc: &str) -> Result<JsonValue, RuntimeError> {
    serde_json::from_str(doc).or_else(|_| parse_yaml(doc))
}

fn to_yaml(value: &JsonValue) -> Result<String, RuntimeError> {
    serde_yaml::to_string(value)
        .map_err(|e| RuntimeError::Document(format!("cannot serialize YAML: {e}")))
}

/// The JSON node inserted by an edit.
fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Int(i) => JsonValue::from(*i),
        Value::Float(x) => serde_json::Number::from_f64(*x)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Str(s) => JsonValue::String(s.clone()),
        Value::Bool(b) => JsonValue::Bool(*b),
    }
}

fn split_docs(doc: &str) -> Vec<&str> {
    doc.split(YAML_SEPARATOR).collect()
}

/// Resolve `path` over a JSON document. Scalars come back as bare text,
/// sub-documents as compact JSON; an absent path is the empty string.
pub fn json_select(doc: &str, path_expr: &str) -> Result<String, RuntimeError> {
    let root = parse_json(doc)?;
    Ok(match path::get(&root, path_expr)? {
        Some(found) => path::scalar_text(found),
        None => String::new(),
    })
}

/// Set `path` in a JSON document. The result is JSON with canonical
/// (alphabetical) key order.
pub fn json_edit(doc: &str, path_expr: &str, value: &Value) -> Result<String, RuntimeError> {
    let mut root = parse_json(doc)?;
    path::set(&mut root, path_expr, value_to_json(value))?;
    Ok(root.to_string())
}

/// Resolve `path` over one document of a YAML stream (`index` selects the
/// document, default 0).
pub fn yaml_select(doc: &str, path_expr: &str, index: usize) -> Result<String, RuntimeError> {
    let docs = split_docs(doc);
    let selected = docs.get(index).ok_or_else(|| {
        RuntimeError::Document(format!(
            "document index {index} out of range ({} documents)",
            docs.len()
        ))
    })?;
    let root = parse_yaml(selected)?;
    Ok(match path::get(&root, path_expr)? {
        Some(found) => path::scalar_text(found),
        None => String::new(),
    })
}

/// Set `path` in one document of a YAML stream. The edited document is
/// re-serialized; its siblings are preserved verbatim.
pub fn yaml_edit(
    doc: &str,
    path_expr: &str,
    value: &Value,
    index: usize,
) -> Result<String, RuntimeError> {
    let mut docs: Vec<String> = split_docs(doc).into_iter().map(str::to_string).collect();
    if index >= docs.len() {
        return Err(RuntimeError::Document(format!(
            "document index {index} out of range ({} documents)",
            docs.len()
        )));
    }
    let mut root = parse_yaml(&docs[index])?;
    path::set(&mut root, path_expr, value_to_json(value))?;
    let mut rendered = to_yaml(&root)?;
    if index + 1 < docs.len() {
        // Keep the separator tight between documents.
        while rendered.ends_with('\n') {
            rendered.pop();
        }
    }
    docs[index] = rendered;
    Ok(docs.join(YAML_SEPARATOR))
}

// --- Kubernetes-aware operations ---

#[derive(Clone, Copy)]
enum DocOp<'a> {
    Edit(&'a Value),
    Delete,
}

/// Outcome of applying a filtered operation to one document.
enum Applied {
    Kept(JsonValue),
    Removed,
}

fn is_list(root: &JsonValue) -> bool {
    root.get("kind").and_then(JsonValue::as_str) == Some("List")
        && root.get("items").is_some_and(JsonValue::is_array)
}

fn apply_path(root: &mut JsonValue, path_expr: &str, op: DocOp) -> Result<(), RuntimeError> {
    match op {
        DocOp::Edit(value) => path::set(root, path_expr, value_to_json(value)),
        DocOp::Delete => path::delete(root, path_expr),
    }
}

fn apply_to_doc(
    mut root: JsonValue,
    filter: Option<&ResourceKey>,
    path_expr: Option<&str>,
    op: DocOp,
) -> Result<Applied, RuntimeError> {
    if is_list(&root) {
        apply_to_list(&mut root, filter, path_expr, op)?;
        return Ok(Applied::Kept(root));
    }
    let selected = match filter {
        Some(key) => ResourceKey::from_object(&root) == *key,
        None => true,
    };
    if !selected {
        return Ok(Applied::Kept(root));
    }
    match path_expr {
        Some(path_expr) => {
            apply_path(&mut root, path_expr, op)?;
            Ok(Applied::Kept(root))
        }
        None => match op {
            DocOp::Delete => Ok(Applied::Removed),
            DocOp::Edit(_) => Err(RuntimeError::Path("edit requires a path".into())),
        },
    }
}

fn apply_to_list(
    root: &mut JsonValue,
    filter: Option<&ResourceKey>,
    path_expr: Option<&str>,
    op: DocOp,
) -> Result<(), RuntimeError> {
    let items = root
        .get_mut("items")
        .and_then(JsonValue::as_array_mut)
        .expect("checked by is_list");
    let mut kept = Vec::with_capacity(items.len());
    for mut item in items.drain(..) {
        let selected = match filter {
            Some(key) => ResourceKey::from_object(&item) == *key,
            None => true,
        };
        if !selected {
            kept.push(item);
            continue;
        }
        match path_expr {
            Some(path_expr) => {
                apply_path(&mut item, path_expr, op)?;
                kept.push(item);
            }
            None => match op {
                DocOp::Delete => {}
                DocOp::Edit(_) => {
                    return Err(RuntimeError::Path("edit requires a path".into()));
                }
            },
        }
    }
    *items = kept;
    Ok(())
}

fn parse_key_filter(filter: &str) -> Result<Option<ResourceKey>, RuntimeError> {
    if filter.is_empty() {
        return Ok(None);
    }
    ResourceKey::parse(filter)
        .map(Some)
        .map_err(|e| RuntimeError::Document(e.to_string()))
}

fn optional(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn kube_json(doc: &str, filter: &str, path_expr: &str, op: DocOp) -> Result<String, RuntimeError> {
    let filter = parse_key_filter(filter)?;
    let root = parse_json(doc)?;
    match apply_to_doc(root, filter.as_ref(), optional(path_expr), op)? {
        Applied::Kept(root) => Ok(root.to_string()),
        Applied::Removed => Ok(String::new()),
    }
}

fn kube_yaml(doc: &str, filter: &str, path_expr: &str, op: DocOp) -> Result<String, RuntimeError> {
    let filter = parse_key_filter(filter)?;
    let path_expr = optional(path_expr);
    let mut out: Vec<String> = Vec::new();
    for raw in split_docs(doc) {
        let before = parse_yaml(raw)?;
        match apply_to_doc(before.clone(), filter.as_ref(), path_expr, op)? {
            Applied::Removed => {}
            Applied::Kept(after) => {
                if after == before {
                    out.push(raw.to_string());
                } else {
                    out.push(to_yaml(&after)?);
                }
            }
        }
    }
    let count = out.len();
    for (i, rendered) in out.iter_mut().enumerate() {
        if i + 1 < count {
            while rendered.ends_with('\n') {
                rendered.pop();
            }
        }
    }
    Ok(out.join(YAML_SEPARATOR))
}

/// Edit `path` inside the items a resource-key `filter` selects, over a
/// JSON `List`, stream, or single object. Empty strings stand for an
/// absent filter or path.
pub fn kube_json_edit(
    doc: &str,
    filter: &str,
    path_expr: &str,
    value: &Value,
) -> Result<String, RuntimeError> {
    kube_json(doc, filter, path_expr, DocOp::Edit(value))
}

/// Delete `path` inside selected items; with no path, delete the selected
/// items themselves.
pub fn kube_json_delete(doc: &str, filter: &str, path_expr: &str) -> Result<String, RuntimeError> {
    kube_json(doc, filter, path_expr, DocOp::Delete)
}

/// YAML counterpart of [`kube_json_edit`]; multi-doc streams stay streams.
pub fn kube_yaml_edit(
    doc: &str,
    filter: &str,
    path_expr: &str,
    value: &Value,
) -> Result<String, RuntimeError> {
    kube_yaml(doc, filter, path_expr, DocOp::Edit(value))
}

/// YAML counterpart of [`kube_json_delete`]. A filter-only delete drops
/// matching documents from the stream entirely.
pub fn kube_yaml_delete(doc: &str, filter: &str, path_expr: &str) -> Result<String, RuntimeError> {
    kube_yaml(doc, filter, path_expr, DocOp::Delete)
}

/// Merge an update overlay into the manifest it names, for `kubectl apply -u`.
///
/// The overlay has the shape `{metadata: {name, [namespace]}, update: {...}}`;
/// its `update` subtree deep-merges into the manifest document whose
/// `metadata.name` (and namespace, when given) matches. Non-matching
/// documents pass through untouched.
pub fn apply_update_overlay(manifest: &str, overlay: &str) -> Result<String, RuntimeError> {
    let overlay_root = parse_any(overlay)?;
    let name = overlay_root
        .pointer("/metadata/name")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| {
            RuntimeError::Document("update overlay missing metadata.name".into())
        })?;
    let namespace = overlay_root
        .pointer("/metadata/namespace")
        .and_then(JsonValue::as_str);
    let update = overlay_root
        .get("update")
        .ok_or_else(|| RuntimeError::Document("update overlay missing update section".into()))?;

    if let Ok(mut root) = serde_json::from_str::<JsonValue>(manifest) {
        if overlay_matches(&root, name, namespace) {
            deep_merge(&mut root, update);
        }
        return Ok(root.to_string());
    }

    let mut out: Vec<String> = Vec::new();
    for raw in split_docs(manifest) {
        let mut root = parse_yaml(raw)?;
        if overlay_matches(&root, name, namespace) {
            deep_merge(&mut root, update);
            out.push(to_yaml(&root)?);
        } else {
            out.push(raw.to_string());
        }
    }
    let count = out.len();
    for (i, rendered) in out.iter_mut().enumerate() {
        if i + 1 < count {
            while rendered.ends_with('\n') {
                rendered.pop();
            }
        }
    }
    Ok(out.join(YAML_SEPARATOR))
}

fn overlay_matches(doc: &JsonValue, name: &str, namespace: Option<&str>) -> bool {
    doc.pointer("/metadata/name").and_then(JsonValue::as_str) == Some(name)
        && namespace.map_or(true, |ns| {
            doc.pointer("/metadata/namespace").and_then(JsonValue::as_str) == Some(ns)
        })
}

/// Recursive merge: objects merge key-wise, anything else overwrites.
fn deep_merge(dst: &mut JsonValue, src: &JsonValue) {
    match (dst, src) {
        (JsonValue::Object(dst_map), JsonValue::Object(src_map)) => {
            for (key, value) in src_map {
                match dst_map.get_mut(key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        dst_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (dst, src) => *dst = src.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const JSON_LIST: &str = r#"{"apiVersion": "v1", "kind": "List", "items":[{"apiVersion": "v1", "kind": "service", "metadata": {"name": "abc", "namespace": "abc"}, "data": {"school": "abc"}}, {"apiVersion": "v1", "kind": "service", "metadata": {"name": "def", "namespace": "abc"}, "data": {"school": "def"}}]}"#;
    const JSON_OBJECT: &str = r#"{"apiVersion": "v1", "kind": "service", "metadata": {"name": "def", "namespace": "abc"}, "data": {"school": "def"}}"#;
    const FILTER: &str = "/service/abc/def";
    const PATTERN: &str = "data.school";

    const YAML_LIST: &str = "\napiVersion: v1\nkind: List\nitems:\n- apiVersion: v1\n  kind: service\n  metadata:\n    name: abc\n    namespace: abc\n  data:\n    school: abc\n- apiVersion: v1\n  kind: service\n  metadata:\n    name: def\n    namespace: abc\n  data:\n    school: def";
    const YAML_STREAM: &str = "\napiVersion: v1\nkind: service\nmetadata:\n  name: abc\n  namespace: abc\ndata:\n  school: abc\n---\napiVersion: v1\nkind: service\nmetadata:\n  name: def\n  namespace: abc\ndata:\n  school: def\n";
    const YAML_OBJECT: &str = "\napiVersion: v1\nkind: service\nmetadata:\n  name: def\n  namespace: abc\ndata:\n  school: def";

    fn parsed(doc: &str) -> JsonValue {
        parse_any(doc).unwrap()
    }

    /// Parse a (possibly multi-doc) YAML result into comparable JSON: a
    /// stream becomes a List envelope, mirroring how the operations treat
    /// streams and lists interchangeably.
    fn yaml_result_as_json(doc: &str) -> JsonValue {
        let docs = split_docs(doc);
        if docs.len() == 1 {
            return parse_yaml(docs[0]).unwrap();
        }
        let items: Vec<JsonValue> = docs.into_iter().map(|d| parse_yaml(d).unwrap()).collect();
        json!({"apiVersion": "v1", "kind": "List", "items": items})
    }

    #[test]
    fn json_select_scalar() {
        let doc = r#"{"name":{"first":"abc","last":"def"}}"#;
        assert_eq!(json_select(doc, "name.last").unwrap(), "def");
    }

    #[test]
    fn json_select_subdocument_is_compact_json() {
        let doc = r#"{"name":{"first":"abc","last":"def"}}"#;
        assert_eq!(
            json_select(doc, "name").unwrap(),
            r#"{"first":"abc","last":"def"}"#
        );
    }

    #[test]
    fn json_select_missing_is_empty() {
        let doc = r#"{"name":{}}"#;
        assert_eq!(json_select(doc, "name.last").unwrap(), "");
    }

    #[test]
    fn json_select_rejects_non_document() {
        assert!(matches!(
            json_select("not json", "a"),
            Err(RuntimeError::Document(_))
        ));
    }

    #[test]
    fn json_edit_roundtrips_exactly() {
        let doc = r#"{"name":{"first":"abc","last":"def"}}"#;
        let edited = json_edit(doc, "name.first", &Value::Str("xyz".into())).unwrap();
        assert_eq!(edited, r#"{"name":{"first":"xyz","last":"def"}}"#);
    }

    #[test]
    fn json_edit_creates_missing_keys() {
        let edited = json_edit("{}", "a.b", &Value::Int(3)).unwrap();
        assert_eq!(json_select(&edited, "a.b").unwrap(), "3");
    }

    #[test]
    fn json_edit_then_select_returns_value() {
        let doc = r#"{"spec":{"replicas":1}}"#;
        let edited = json_edit(doc, "spec.replicas", &Value::Int(5)).unwrap();
        assert_eq!(json_select(&edited, "spec.replicas").unwrap(), "5");
    }

    #[test]
    fn yaml_select_single_doc() {
        let doc = "\nname:\n  first: abc\n  last: def\n";
        assert_eq!(yaml_select(doc, "name.last", 0).unwrap(), "def");
    }

    #[test]
    fn yaml_select_multi_doc_by_index() {
        let doc = "\nname:\n  first: ghi\n  last: jkl\n---\nname:\n  first: abc\n  last: def\n";
        assert_eq!(yaml_select(doc, "name.last", 1).unwrap(), "def");
        assert_eq!(yaml_select(doc, "name.last", 0).unwrap(), "jkl");
    }

    #[test]
    fn yaml_select_index_out_of_range() {
        let doc = "name: x\n";
        assert!(matches!(
            yaml_select(doc, "name", 1),
            Err(RuntimeError::Document(_))
        ));
    }

    #[test]
    fn yaml_edit_reserializes_single_doc() {
        let doc = "\nname:\n  first: abc\n  last: def\n";
        let edited = yaml_edit(doc, "name.first", &Value::Str("xyz".into()), 0).unwrap();
        assert_eq!(edited, "name:\n  first: xyz\n  last: def\n");
    }

    #[test]
    fn yaml_edit_preserves_untouched_stream_docs() {
        let doc = "\nname:\n  first: efg\n  last: hij\n---\nname:\n  first: abc\n  last: def\n";
        let edited = yaml_edit(doc, "name.first", &Value::Str("xyz".into()), 1).unwrap();
        assert_eq!(
            edited,
            "\nname:\n  first: efg\n  last: hij\n---\nname:\n  first: xyz\n  last: def\n"
        );
    }

    #[test]
    fn yaml_edit_roundtrips_through_select() {
        let doc = "a:\n  b: old\n";
        let edited = yaml_edit(doc, "a.b", &Value::Str("new".into()), 0).unwrap();
        assert_eq!(yaml_select(&edited, "a.b", 0).unwrap(), "new");
    }

    // --- kube delete over JSON ---

    #[test]
    fn kube_json_delete_list_filter_and_pattern() {
        let got = kube_json_delete(JSON_LIST, FILTER, PATTERN).unwrap();
        let want = r#"{"apiVersion": "v1", "kind": "List", "items":[{"apiVersion": "v1", "kind": "service", "metadata": {"name": "abc", "namespace": "abc"}, "data": {"school": "abc"}}, {"apiVersion": "v1", "kind": "service", "metadata": {"name": "def", "namespace": "abc"}, "data": {}}]}"#;
        assert_eq!(parsed(&got), parsed(want));
    }

    #[test]
    fn kube_json_delete_list_filter_only_drops_item() {
        let got = kube_json_delete(JSON_LIST, FILTER, "").unwrap();
        let want = r#"{"apiVersion":"v1","items":[{"apiVersion":"v1","data":{"school":"abc"},"kind":"service","metadata":{"name":"abc","namespace":"abc"}}],"kind":"List"}"#;
        assert_eq!(parsed(&got), parsed(want));
    }

    #[test]
    fn kube_json_delete_list_pattern_only_hits_every_item() {
        let got = kube_json_delete(JSON_LIST, "", PATTERN).unwrap();
        let want = r#"{"apiVersion":"v1","items":[{"apiVersion":"v1","data":{},"kind":"service","metadata":{"name":"abc","namespace":"abc"}},{"apiVersion":"v1","data":{},"kind":"service","metadata":{"name":"def","namespace":"abc"}}],"kind":"List"}"#;
        assert_eq!(parsed(&got), parsed(want));
    }

    #[test]
    fn kube_json_delete_object_filter_and_pattern() {
        let got = kube_json_delete(JSON_OBJECT, FILTER, PATTERN).unwrap();
        let want = r#"{"apiVersion": "v1", "kind": "service", "metadata": {"name": "def", "namespace": "abc"}, "data": {}}"#;
        assert_eq!(parsed(&got), parsed(want));
    }

    #[test]
    fn kube_json_delete_object_pattern_only() {
        let got = kube_json_delete(JSON_OBJECT, "", PATTERN).unwrap();
        let want = r#"{"apiVersion": "v1", "kind": "service", "metadata": {"name": "def", "namespace": "abc"}, "data": {}}"#;
        assert_eq!(parsed(&got), parsed(want));
    }

    #[test]
    fn kube_json_delete_object_filter_mismatch_is_noop() {
        let got = kube_json_delete(JSON_OBJECT, "/service/abc/other", PATTERN).unwrap();
        assert_eq!(parsed(&got), parsed(JSON_OBJECT));
    }

    // --- kube edit over JSON ---

    #[test]
    fn kube_json_edit_list_filter_and_pattern() {
        let got = kube_json_edit(JSON_LIST, FILTER, PATTERN, &Value::Str("ghi".into())).unwrap();
        let want = r#"{"apiVersion": "v1", "kind": "List", "items":[{"apiVersion": "v1", "kind": "service", "metadata": {"name": "abc", "namespace": "abc"}, "data": {"school": "abc"}}, {"apiVersion": "v1", "kind": "service", "metadata": {"name": "def", "namespace": "abc"}, "data": {"school": "ghi"}}]}"#;
        assert_eq!(parsed(&got), parsed(want));
    }

    #[test]
    fn kube_json_edit_list_pattern_only_hits_every_item() {
        let got = kube_json_edit(JSON_LIST, "", PATTERN, &Value::Str("ghi".into())).unwrap();
        let want = r#"{"apiVersion":"v1","items":[{"apiVersion":"v1","data":{"school": "ghi"},"kind":"service","metadata":{"name":"abc","namespace":"abc"}}, {"apiVersion": "v1", "kind": "service", "metadata": {"name": "def", "namespace": "abc"}, "data": {"school": "ghi"}}],"kind":"List"}"#;
        assert_eq!(parsed(&got), parsed(want));
    }

    #[test]
    fn kube_json_edit_object() {
        let got = kube_json_edit(JSON_OBJECT, FILTER, PATTERN, &Value::Str("ghi".into())).unwrap();
        let want = r#"{"apiVersion": "v1", "kind": "service", "metadata": {"name": "def", "namespace": "abc"}, "data": {"school": "ghi"}}"#;
        assert_eq!(parsed(&got), parsed(want));
    }

    #[test]
    fn kube_json_edit_without_path_is_error() {
        assert!(matches!(
            kube_json_edit(JSON_LIST, FILTER, "", &Value::Str("x".into())),
            Err(RuntimeError::Path(_))
        ));
    }

    // --- kube ops over YAML ---

    #[test]
    fn kube_yaml_delete_list_filter_and_pattern() {
        let got = kube_yaml_delete(YAML_LIST, FILTER, PATTERN).unwrap();
        let want = r#"{"apiVersion": "v1", "kind": "List", "items":[{"apiVersion": "v1", "kind": "service", "metadata": {"name": "abc", "namespace": "abc"}, "data": {"school": "abc"}}, {"apiVersion": "v1", "kind": "service", "metadata": {"name": "def", "namespace": "abc"}, "data": {}}]}"#;
        assert_eq!(yaml_result_as_json(&got), parsed(want));
    }

    #[test]
    fn kube_yaml_delete_stream_filter_and_pattern_stays_a_stream() {
        let got = kube_yaml_delete(YAML_STREAM, FILTER, PATTERN).unwrap();
        assert_eq!(split_docs(&got).len(), 2);
        let want = r#"{"apiVersion": "v1", "kind": "List", "items":[{"apiVersion": "v1", "kind": "service", "metadata": {"name": "abc", "namespace": "abc"}, "data": {"school": "abc"}}, {"apiVersion": "v1", "kind": "service", "metadata": {"name": "def", "namespace": "abc"}, "data": {}}]}"#;
        assert_eq!(yaml_result_as_json(&got), parsed(want));
    }

    #[test]
    fn kube_yaml_delete_stream_filter_only_drops_matching_doc() {
        let got = kube_yaml_delete(YAML_STREAM, FILTER, "").unwrap();
        assert_eq!(split_docs(&got).len(), 1);
        let want = r#"{"apiVersion":"v1","data":{"school":"abc"},"kind":"service","metadata":{"name":"abc","namespace":"abc"}}"#;
        assert_eq!(yaml_result_as_json(&got), parsed(want));
    }

    #[test]
    fn kube_yaml_delete_stream_untouched_doc_is_byte_identical() {
        let got = kube_yaml_delete(YAML_STREAM, FILTER, "").unwrap();
        assert_eq!(
            got,
            "\napiVersion: v1\nkind: service\nmetadata:\n  name: abc\n  namespace: abc\ndata:\n  school: abc"
        );
    }

    #[test]
    fn kube_yaml_delete_object_pattern_only() {
        let got = kube_yaml_delete(YAML_OBJECT, "", PATTERN).unwrap();
        let want = r#"{"apiVersion": "v1", "kind": "service", "metadata": {"name": "def", "namespace": "abc"}, "data": {}}"#;
        assert_eq!(yaml_result_as_json(&got), parsed(want));
    }

    #[test]
    fn kube_yaml_edit_list_filter_and_pattern() {
        let got = kube_yaml_edit(YAML_LIST, FILTER, PATTERN, &Value::Str("ghi".into())).unwrap();
        let want = r#"{"apiVersion": "v1", "kind": "List", "items":[{"apiVersion": "v1", "kind": "service", "metadata": {"name": "abc", "namespace": "abc"}, "data": {"school": "abc"}}, {"apiVersion": "v1", "kind": "service", "metadata": {"name": "def", "namespace": "abc"}, "data": {"school": "ghi"}}]}"#;
        assert_eq!(yaml_result_as_json(&got), parsed(want));
    }

    #[test]
    fn kube_yaml_edit_stream_pattern_only_edits_every_doc() {
        let got = kube_yaml_edit(YAML_STREAM, "", PATTERN, &Value::Str("ghi".into())).unwrap();
        assert_eq!(split_docs(&got).len(), 2);
        for raw in split_docs(&got) {
            let doc = parse_yaml(raw).unwrap();
            assert_eq!(doc.pointer("/data/school"), Some(&json!("ghi")));
        }
    }

    #[test]
    fn kube_yaml_edit_object_filter_mismatch_is_noop() {
        let got =
            kube_yaml_edit(YAML_OBJECT, "/service/abc/other", PATTERN, &Value::Str("x".into()))
                .unwrap();
        assert_eq!(got, YAML_OBJECT);
    }

    // --- apply overlay ---

    #[test]
    fn overlay_merges_into_named_doc_only() {
        let manifest = "\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: test-cm\n  namespace: dev\ndata:\n  name: abc\n---\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: test-cm2\n  namespace: dev\ndata:\n  name: def\n";
        let overlay = "\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: test-cm2\nupdate:\n  data:\n    name: xyz\n";
        let merged = apply_update_overlay(manifest, overlay).unwrap();
        let docs = split_docs(&merged);
        assert_eq!(docs.len(), 2);
        // First doc untouched, byte for byte.
        assert_eq!(
            docs[0],
            "\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: test-cm\n  namespace: dev\ndata:\n  name: abc"
        );
        let second = parse_yaml(docs[1]).unwrap();
        assert_eq!(second.pointer("/data/name"), Some(&json!("xyz")));
        // Merge is additive: untouched siblings survive.
        assert_eq!(second.pointer("/metadata/namespace"), Some(&json!("dev")));
    }

    #[test]
    fn overlay_requires_name_and_update() {
        assert!(apply_update_overlay("a: 1\n", "metadata: {}\nupdate: {}\n").is_err());
        assert!(apply_update_overlay("a: 1\n", "metadata:\n  name: x\n").is_err());
    }

    #[test]
    fn deep_merge_overwrites_scalars_and_merges_maps() {
        let mut dst = json!({"data": {"a": "1", "b": "2"}, "kind": "ConfigMap"});
        deep_merge(&mut dst, &json!({"data": {"b": "3", "c": "4"}}));
        assert_eq!(
            dst,
            json!({"data": {"a": "1", "b": "3", "c": "4"}, "kind": "ConfigMap"})
        );
    }
}
