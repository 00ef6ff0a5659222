//! Path resolution over JSON trees.
//!
//! The query dialect scripts use: dot-separated keys, backslash-escaped
//! dots inside keys (`app\.kubernetes\.io/name`), numeric segments indexing
//! arrays, and first-match array filters `#(sub.path=="literal")`. The
//! legacy single `=` comparison is accepted alongside `==`.
//!
//! Reads on a missing path yield `None`. Writes create missing intermediate
//! map keys; a structurally impossible step (descending into a scalar,
//! indexing past the end of an array) is a path error. Deletes are
//! tolerant: removing an absent node is a no-op, and removing the sole
//! child of a map leaves `{}` behind.

use serde_json::{Map, Value as JsonValue};

use crate::error::RuntimeError;

/// One step of a parsed path.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Object key, or array index when the current node is an array.
    Key(String),
    /// First array element whose sub-path stringifies to `value`.
    Filter { path: String, value: String },
}

/// Parse a path expression into segments.
pub fn parse(path: &str) -> Result<Vec<Segment>, RuntimeError> {
    if path.is_empty() {
        return Err(RuntimeError::Path("empty path".into()));
    }
    let mut segments = Vec::new();
    let mut buf = String::new();
    let mut chars = path.chars().peekable();
    loop {
        match chars.next() {
            None => {
                if !buf.is_empty() {
                    segments.push(Segment::Key(std::mem::take(&mut buf)));
                }
                break;
            }
            Some('\\') => match chars.next() {
                Some(c) => buf.push(c),
                None => {
                    return Err(RuntimeError::Path(format!("dangling escape in {path:?}")));
                }
            },
            Some('.') => {
                if buf.is_empty() {
                    return Err(RuntimeError::Path(format!("empty segment in {path:?}")));
                }
                segments.push(Segment::Key(std::mem::take(&mut buf)));
            }
            Some('#') if buf.is_empty() && chars.peek() == Some(&'(') => {
                chars.next();
                let mut inner = String::new();
                let mut depth = 1usize;
                let mut in_quotes = false;
                loop {
                    match chars.next() {
                        None => {
                            return Err(RuntimeError::Path(format!(
                                "unbalanced filter in {path:?}"
                            )));
                        }
                        Some('"') => {
                            in_quotes = !in_quotes;
                            inner.push('"');
                        }
                        Some('(') if !in_quotes => {
                            depth += 1;
                            inner.push('(');
                        }
                        Some(')') if !in_quotes => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                            inner.push(')');
                        }
                        Some(c) => inner.push(c),
                    }
                }
                segments.push(parse_filter(&inner, path)?);
                match chars.next() {
                    None => break,
                    Some('.') => {}
                    Some(c) => {
                        return Err(RuntimeError::Path(format!(
                            "unexpected {c:?} after filter in {path:?}"
                        )));
                    }
                }
            }
            Some(c) => buf.push(c),
        }
    }
    if segments.is_empty() {
        return Err(RuntimeError::Path(format!("empty path {path:?}")));
    }
    Ok(segments)
}

fn parse_filter(inner: &str, path: &str) -> Result<Segment, RuntimeError> {
    let (sub, value) = if let Some(idx) = inner.find("==") {
        (&inner[..idx], &inner[idx + 2..])
    } else if let Some(idx) = inner.find('=') {
        (&inner[..idx], &inner[idx + 1..])
    } else {
        return Err(RuntimeError::Path(format!(
            "filter without comparison in {path:?}"
        )));
    };
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    Ok(Segment::Filter {
        path: sub.trim().to_string(),
        value: value.to_string(),
    })
}

/// Resolve a path to a node, if present.
pub fn get<'a>(root: &'a JsonValue, path: &str) -> Result<Option<&'a JsonValue>, RuntimeError> {
    let segments = parse(path)?;
    let mut current = root;
    for segment in &segments {
        let next = match segment {
            Segment::Key(key) => match current {
                JsonValue::Object(map) => map.get(key),
                JsonValue::Array(items) => key
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index)),
                _ => None,
            },
            Segment::Filter { path: sub, value } => match current {
                JsonValue::Array(items) => {
                    items.iter().find(|item| filter_matches(item, sub, value))
                }
                _ => None,
            },
        };
        match next {
            Some(node) => current = node,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

fn filter_matches(item: &JsonValue, sub: &str, want: &str) -> bool {
    matches!(get(item, sub), Ok(Some(found)) if scalar_text(found) == want)
}

/// Text form of a node: strings unquoted, scalars via their JSON rendering,
/// sub-documents as compact JSON.
pub fn scalar_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Write a node at a path, creating missing intermediate map keys.
pub fn set(root: &mut JsonValue, path: &str, new: JsonValue) -> Result<(), RuntimeError> {
    let segments = parse(path)?;
    set_at(root, &segments, new, path)
}

fn set_at(
    current: &mut JsonValue,
    segments: &[Segment],
    new: JsonValue,
    full: &str,
) -> Result<(), RuntimeError> {
    let Some((head, rest)) = segments.split_first() else {
        *current = new;
        return Ok(());
    };
    match head {
        Segment::Key(key) => match current {
            JsonValue::Object(map) => {
                let slot = map.entry(key.clone()).or_insert(JsonValue::Null);
                set_at(slot, rest, new, full)
            }
            JsonValue::Array(items) => {
                let index = key.parse::<usize>().map_err(|_| {
                    RuntimeError::Path(format!("cannot key into array with {key:?} in {full:?}"))
                })?;
                match items.get_mut(index) {
                    Some(slot) => set_at(slot, rest, new, full),
                    None => Err(RuntimeError::Path(format!(
                        "index {index} out of range in {full:?}"
                    ))),
                }
            }
            JsonValue::Null => {
                *current = JsonValue::Object(Map::new());
                set_at(current, segments, new, full)
            }
            _ => Err(RuntimeError::Path(format!(
                "cannot descend into scalar at {key:?} in {full:?}"
            ))),
        },
        Segment::Filter { path: sub, value } => match current {
            JsonValue::Array(items) => {
                let position = items.iter().position(|item| filter_matches(item, sub, value));
                match position {
                    Some(index) => set_at(&mut items[index], rest, new, full),
                    None => Err(RuntimeError::Path(format!(
                        "no array element matches filter in {full:?}"
                    ))),
                }
            }
            _ => Err(RuntimeError::Path(format!(
                "filter applied to non-array in {full:?}"
            ))),
        },
    }
}

/// Remove the node at a path. Absent nodes are a no-op; the parent
/// container is kept even when it becomes empty.
pub fn delete(root: &mut JsonValue, path: &str) -> Result<(), RuntimeError> {
    let segments = parse(path)?;
    delete_at(root, &segments);
    Ok(())
}

fn delete_at(current: &mut JsonValue, segments: &[Segment]) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        match head {
            Segment::Key(key) => match current {
                JsonValue::Object(map) => {
                    map.remove(key);
                }
                JsonValue::Array(items) => {
                    if let Some(index) = key.parse::<usize>().ok().filter(|i| *i < items.len()) {
                        items.remove(index);
                    }
                }
                _ => {}
            },
            Segment::Filter { path: sub, value } => {
                if let JsonValue::Array(items) = current {
                    if let Some(index) =
                        items.iter().position(|item| filter_matches(item, sub, value))
                    {
                        items.remove(index);
                    }
                }
            }
        }
        return;
    }
    match head {
        Segment::Key(key) => match current {
            JsonValue::Object(map) => {
                if let Some(slot) = map.get_mut(key) {
                    delete_at(slot, rest);
                }
            }
            JsonValue::Array(items) => {
                if let Some(slot) = key.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                    delete_at(slot, rest);
                }
            }
            _ => {}
        },
        Segment::Filter { path: sub, value } => {
            if let JsonValue::Array(items) = current {
                if let Some(index) =
                    items.iter().position(|item| filter_matches(item, sub, value))
                {
                    delete_at(&mut items[index], rest);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_dotted_keys() {
        assert_eq!(
            parse("a.b.c").unwrap(),
            vec![
                Segment::Key("a".into()),
                Segment::Key("b".into()),
                Segment::Key("c".into()),
            ]
        );
    }

    #[test]
    fn parse_escaped_dots() {
        assert_eq!(
            parse(r"metadata.labels.app\.kubernetes\.io/name").unwrap(),
            vec![
                Segment::Key("metadata".into()),
                Segment::Key("labels".into()),
                Segment::Key("app.kubernetes.io/name".into()),
            ]
        );
    }

    #[test]
    fn parse_filter_double_equals() {
        assert_eq!(
            parse(r#"items.#(metadata.name=="test-cm2").data.age"#).unwrap(),
            vec![
                Segment::Key("items".into()),
                Segment::Filter {
                    path: "metadata.name".into(),
                    value: "test-cm2".into(),
                },
                Segment::Key("data".into()),
                Segment::Key("age".into()),
            ]
        );
    }

    #[test]
    fn parse_filter_legacy_single_equals() {
        assert_eq!(
            parse(r#"items.#(metadata.name="test-cm2").data.age"#).unwrap(),
            parse(r#"items.#(metadata.name=="test-cm2").data.age"#).unwrap(),
        );
    }

    #[test]
    fn parse_rejects_empty_and_malformed() {
        assert!(parse("").is_err());
        assert!(parse("a..b").is_err());
        assert!(parse("items.#(noequals)").is_err());
        assert!(parse("items.#(a==\"b\"").is_err());
    }

    #[test]
    fn get_nested_scalar() {
        let doc = json!({"name": {"first": "abc", "last": "def"}});
        let found = get(&doc, "name.last").unwrap().unwrap();
        assert_eq!(found, &json!("def"));
    }

    #[test]
    fn get_missing_is_none() {
        let doc = json!({"name": {}});
        assert_eq!(get(&doc, "name.last").unwrap(), None);
        assert_eq!(get(&doc, "other.deep.path").unwrap(), None);
    }

    #[test]
    fn get_array_index() {
        let doc = json!({"items": [{"v": 1}, {"v": 2}]});
        assert_eq!(get(&doc, "items.1.v").unwrap(), Some(&json!(2)));
        assert_eq!(get(&doc, "items.5.v").unwrap(), None);
    }

    #[test]
    fn get_with_filter_picks_first_match() {
        let doc = json!({"items": [
            {"metadata": {"name": "a"}, "data": {"age": "1"}},
            {"metadata": {"name": "b"}, "data": {"age": "2"}},
            {"metadata": {"name": "b"}, "data": {"age": "3"}},
        ]});
        let found = get(&doc, r#"items.#(metadata.name=="b").data.age"#)
            .unwrap()
            .unwrap();
        assert_eq!(found, &json!("2"));
    }

    #[test]
    fn get_with_escaped_dot_key() {
        let doc = json!({"items": [
            {"metadata": {"labels": {"app.kubernetes.io/name": "argocd-server"},
                          "name": "argo"}},
        ]});
        let path = r#"items.#(metadata.labels.app\.kubernetes\.io/name=="argocd-server").metadata.name"#;
        assert_eq!(get(&doc, path).unwrap(), Some(&json!("argo")));
    }

    #[test]
    fn set_overwrites_scalar() {
        let mut doc = json!({"name": {"first": "abc", "last": "def"}});
        set(&mut doc, "name.first", json!("xyz")).unwrap();
        assert_eq!(doc, json!({"name": {"first": "xyz", "last": "def"}}));
    }

    #[test]
    fn set_creates_intermediate_maps() {
        let mut doc = json!({});
        set(&mut doc, "a.b.c", json!("v")).unwrap();
        assert_eq!(doc, json!({"a": {"b": {"c": "v"}}}));
    }

    #[test]
    fn set_through_filter() {
        let mut doc = json!({"items": [{"metadata": {"name": "a"}}, {"metadata": {"name": "b"}}]});
        set(&mut doc, r#"items.#(metadata.name=="b").spec"#, json!(1)).unwrap();
        assert_eq!(
            doc,
            json!({"items": [{"metadata": {"name": "a"}}, {"metadata": {"name": "b"}, "spec": 1}]})
        );
    }

    #[test]
    fn set_into_scalar_is_path_error() {
        let mut doc = json!({"a": 1});
        assert!(matches!(
            set(&mut doc, "a.b", json!(2)),
            Err(RuntimeError::Path(_))
        ));
    }

    #[test]
    fn set_array_index_out_of_range_is_path_error() {
        let mut doc = json!({"items": []});
        assert!(matches!(
            set(&mut doc, "items.0", json!(1)),
            Err(RuntimeError::Path(_))
        ));
    }

    #[test]
    fn delete_sole_child_leaves_empty_map() {
        let mut doc = json!({"data": {"school": "abc"}});
        delete(&mut doc, "data.school").unwrap();
        assert_eq!(doc, json!({"data": {}}));
    }

    #[test]
    fn delete_absent_is_noop() {
        let mut doc = json!({"data": {}});
        delete(&mut doc, "data.school").unwrap();
        delete(&mut doc, "missing.path").unwrap();
        assert_eq!(doc, json!({"data": {}}));
    }

    #[test]
    fn delete_filtered_item_removes_it() {
        let mut doc = json!({"items": [{"metadata": {"name": "a"}}, {"metadata": {"name": "b"}}]});
        delete(&mut doc, r#"items.#(metadata.name=="a")"#).unwrap();
        assert_eq!(doc, json!({"items": [{"metadata": {"name": "b"}}]}));
    }

    #[test]
    fn scalar_text_forms() {
        assert_eq!(scalar_text(&json!("s")), "s");
        assert_eq!(scalar_text(&json!(36)), "36");
        assert_eq!(scalar_text(&json!(true)), "true");
        assert_eq!(scalar_text(&json!(null)), "null");
        assert_eq!(scalar_text(&json!({"a": 1})), r#"{"a":1}"#);
    }
}
