//! Canonical identity of an unstructured Kubernetes object.

use std::fmt;

use serde_json::Value as JsonValue;
use thiserror::Error;

/// Error parsing a resource key from its string form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid resource key {input:?}: expected group/Kind/namespace/name")]
pub struct ResourceKeyError {
    pub input: String,
}

/// The identity of a Kubernetes object: `group/Kind/namespace/name`.
///
/// The core API group renders as an empty group segment, so a v1 Service
/// `abc` in namespace `dev` is `/Service/dev/abc`. Cluster-scoped objects
/// carry an empty namespace segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub group: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(
        group: impl Into<String>,
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Derive the key from an unstructured object.
    ///
    /// `apiVersion` of the form `group/version` yields the group; a bare
    /// version (`v1`) is the core group. Missing fields become empty
    /// segments rather than errors so that partially-formed manifests still
    /// produce a comparable key.
    pub fn from_object(obj: &JsonValue) -> Self {
        let api_version = obj
            .get("apiVersion")
            .and_then(JsonValue::as_str)
            .unwrap_or_default();
        let group = match api_version.split_once('/') {
            Some((group, _version)) => group,
            None => "",
        };
        let kind = obj.get("kind").and_then(JsonValue::as_str).unwrap_or_default();
        let metadata = obj.get("metadata");
        let field = |key: &str| {
            metadata
                .and_then(|m| m.get(key))
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
        };
        Self::new(group, kind, field("namespace"), field("name"))
    }

    /// Parse the canonical `group/Kind/namespace/name` form.
    pub fn parse(s: &str) -> Result<Self, ResourceKeyError> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [group, kind, namespace, name] => Ok(Self::new(*group, *kind, *namespace, *name)),
            _ => Err(ResourceKeyError {
                input: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.group, self.kind, self.namespace, self.name
        )
    }
}
