//! kubectl verb dispatch and argument splicing.
//!
//! Arguments arrive from the parser as barewords and quoted literals. A
//! bareword bound in the store splices its value as a single token (never
//! re-split on whitespace); an unbound bareword is used verbatim; quoted
//! literals are never resolved. Flags: `-n NAMESPACE`, `-p PAYLOAD`,
//! `-u UPDATE_DOC`, `--type PATCH_TYPE`.
//!
//! `get` yields a STRING document; `apply`, `patch`, and `delete` yield
//! BOOLEAN true. Only failures crossing the Cluster Client seam become
//! [`RuntimeError::Command`]; the evaluator coerces those to BOOLEAN false
//! in statement position, and cancellation propagates. Malformed usage —
//! an unknown verb or flag, missing arguments, mixed kinds — is the script
//! author's error and raises a name or type error, the same way
//! builtin-function misuse is reported.

use klang_types::Value;

use crate::ast::{KubeArg, KubectlCmd};
use crate::document::engine;
use crate::error::RuntimeError;
use crate::interpreter::Store;

use super::client::{CancelToken, ClientError, ClusterClient};

const DEFAULT_PATCH_TYPE: &str = "application/strategic-merge-patch+json";

/// Parsed form of a kubectl statement's arguments.
#[derive(Debug, Default, PartialEq)]
struct KubectlArgs {
    namespace: String,
    payload: Option<String>,
    patch_type: Option<String>,
    update: Option<String>,
    positional: Vec<String>,
}

/// Execute a kubectl command against the injected client.
pub fn run_kubectl(
    cmd: &KubectlCmd,
    store: &Store,
    client: &dyn ClusterClient,
    cancel: &CancelToken,
) -> Result<Value, RuntimeError> {
    let args = parse_args(&cmd.args, store)?;
    match cmd.verb.as_str() {
        "get" => dispatch_get(&args, client, cancel),
        "apply" => dispatch_apply(&args, client, cancel),
        "patch" => dispatch_patch(&args, client, cancel),
        "delete" => dispatch_delete(&args, client, cancel),
        other => Err(RuntimeError::Name(format!(
            "unknown kubectl verb: {other}"
        ))),
    }
}

/// Resolve one argument token against the store.
fn splice(arg: &KubeArg, store: &Store) -> String {
    match arg {
        KubeArg::Word(word) => match store.get(word) {
            Some(value) => value.render(),
            None => word.clone(),
        },
        KubeArg::Literal(text) => text.clone(),
    }
}

fn parse_args(args: &[KubeArg], store: &Store) -> Result<KubectlArgs, RuntimeError> {
    let mut parsed = KubectlArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let flag = match arg {
            KubeArg::Word(word) if word.starts_with('-') => Some(word.as_str()),
            _ => None,
        };
        match flag {
            Some("-n") => parsed.namespace = take_value("-n", &mut iter, store)?,
            Some("-p") => parsed.payload = Some(take_value("-p", &mut iter, store)?),
            Some("-u") => parsed.update = Some(take_value("-u", &mut iter, store)?),
            Some("--type") => parsed.patch_type = Some(take_value("--type", &mut iter, store)?),
            Some(other) => {
                return Err(RuntimeError::Name(format!(
                    "unknown kubectl flag: {other}"
                )));
            }
            None => parsed.positional.push(splice(arg, store)),
        }
    }
    Ok(parsed)
}

fn take_value(
    flag: &str,
    iter: &mut std::slice::Iter<'_, KubeArg>,
    store: &Store,
) -> Result<String, RuntimeError> {
    iter.next()
        .map(|arg| splice(arg, store))
        .ok_or_else(|| RuntimeError::Type(format!("kubectl {flag} requires a value")))
}

fn dispatch_get(
    args: &KubectlArgs,
    client: &dyn ClusterClient,
    cancel: &CancelToken,
) -> Result<Value, RuntimeError> {
    let (namespace_override, kind, names) = parse_targets(&args.positional)?;
    let namespace = namespace_override.unwrap_or_else(|| args.namespace.clone());
    let doc = client
        .get(cancel, &namespace, &kind, &names)
        .map_err(client_error)?;
    Ok(Value::Str(doc))
}

/// Split `get` targets into a kind and names.
///
/// Accepted forms: a bare kind (`po`), a kind followed by names
/// (`cm test-cm`), `kind/name` references (`cm/test-cm`), or
/// `namespace/kind/name` references. References must agree on kind (and
/// namespace) since the client takes one kind per call.
fn parse_targets(
    positional: &[String],
) -> Result<(Option<String>, String, Vec<String>), RuntimeError> {
    if positional.is_empty() {
        return Err(RuntimeError::Type("kubectl get requires a resource".into()));
    }
    if !positional.iter().all(|t| t.contains('/')) {
        return Ok((None, positional[0].clone(), positional[1..].to_vec()));
    }
    let mut namespace: Option<String> = None;
    let mut kind: Option<String> = None;
    let mut names = Vec::new();
    for token in positional {
        let parts: Vec<&str> = token.split('/').collect();
        let (ns, k, name) = match parts.as_slice() {
            [k, name] => (None, *k, *name),
            [ns, k, name] => (Some(ns.to_string()), *k, *name),
            _ => {
                return Err(RuntimeError::Type(format!(
                    "invalid resource reference: {token}"
                )));
            }
        };
        if let Some(ns) = ns {
            match &namespace {
                None => namespace = Some(ns),
                Some(existing) if *existing == ns => {}
                Some(existing) => {
                    return Err(RuntimeError::Type(format!(
                        "mixed namespaces in get: {existing} and {ns}"
                    )));
                }
            }
        }
        match &kind {
            None => kind = Some(k.to_string()),
            Some(existing) if existing == k => {}
            Some(existing) => {
                return Err(RuntimeError::Type(format!(
                    "mixed kinds in get: {existing} and {k}"
                )));
            }
        }
        names.push(name.to_string());
    }
    Ok((namespace, kind.expect("at least one target"), names))
}

fn dispatch_apply(
    args: &KubectlArgs,
    client: &dyn ClusterClient,
    cancel: &CancelToken,
) -> Result<Value, RuntimeError> {
    let manifest = args
        .positional
        .first()
        .ok_or_else(|| RuntimeError::Type("kubectl apply requires a manifest".into()))?;
    let manifest = match &args.update {
        Some(overlay) => engine::apply_update_overlay(manifest, overlay)?,
        None => manifest.clone(),
    };
    client.apply(cancel, &manifest).map_err(client_error)?;
    Ok(Value::Bool(true))
}

fn dispatch_patch(
    args: &KubectlArgs,
    client: &dyn ClusterClient,
    cancel: &CancelToken,
) -> Result<Value, RuntimeError> {
    let [kind, name] = args.positional.as_slice() else {
        return Err(RuntimeError::Type(
            "kubectl patch requires a kind and a name".into(),
        ));
    };
    let payload = args
        .payload
        .as_deref()
        .ok_or_else(|| RuntimeError::Type("kubectl patch requires -p PAYLOAD".into()))?;
    let patch_type = args.patch_type.as_deref().unwrap_or(DEFAULT_PATCH_TYPE);
    client
        .patch(cancel, &args.namespace, kind, name, patch_type, payload)
        .map_err(client_error)?;
    Ok(Value::Bool(true))
}

fn dispatch_delete(
    args: &KubectlArgs,
    client: &dyn ClusterClient,
    cancel: &CancelToken,
) -> Result<Value, RuntimeError> {
    let Some((kind, names)) = args.positional.split_first() else {
        return Err(RuntimeError::Type("kubectl delete requires a kind".into()));
    };
    if names.is_empty() {
        return Err(RuntimeError::Type(
            "kubectl delete requires at least one name".into(),
        ));
    }
    client
        .delete(cancel, &args.namespace, kind, names)
        .map_err(client_error)?;
    Ok(Value::Bool(true))
}

/// Convert a Cluster Client failure crossing the seam. This is the only
/// source of [`RuntimeError::Command`] in the engine.
fn client_error(error: ClientError) -> RuntimeError {
    match error {
        ClientError::Cancelled => RuntimeError::Cancelled,
        other => RuntimeError::Command(other.to_string()),
    }
}
