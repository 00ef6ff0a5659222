//! The injected cluster seam.

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Cooperative cancellation flag threaded through external calls.
///
/// Clones share the flag. The interpreter checks it between statements;
/// client and shell implementations check it before spawning work.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result type for cluster calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Cluster call errors.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("cluster call failed: {0}")]
    Call(String),
    #[error("{command} exited with status {status}: {stderr}")]
    NonZero {
        command: String,
        status: i32,
        stderr: String,
    },
    #[error("cancelled")]
    Cancelled,
}

/// Synchronous cluster access.
///
/// `get` returns a JSON document: a single object when one name resolves
/// to one resource, otherwise a `List` envelope. Implementations may shell
/// out to kubectl or speak the API server directly; both produce the same
/// JSON shapes on read. The client may be shared across interpreters but
/// is only ever called serially within one script.
pub trait ClusterClient: Send + Sync {
    fn get(
        &self,
        ctx: &CancelToken,
        namespace: &str,
        kind: &str,
        names: &[String],
    ) -> ClientResult<String>;

    fn apply(&self, ctx: &CancelToken, manifest: &str) -> ClientResult<()>;

    fn patch(
        &self,
        ctx: &CancelToken,
        namespace: &str,
        kind: &str,
        name: &str,
        patch_type: &str,
        payload: &str,
    ) -> ClientResult<()>;

    fn delete(
        &self,
        ctx: &CancelToken,
        namespace: &str,
        kind: &str,
        names: &[String],
    ) -> ClientResult<()>;
}

/// [`ClusterClient`] backed by the kubectl binary.
pub struct KubectlCli {
    binary: String,
}

impl KubectlCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run(&self, ctx: &CancelToken, args: &[&str], stdin: Option<&str>) -> ClientResult<String> {
        if ctx.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });
        let mut child = command
            .spawn()
            .map_err(|e| ClientError::Call(format!("{}: {e}", self.binary)))?;
        if let Some(input) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input.as_bytes())
                    .map_err(|e| ClientError::Call(e.to_string()))?;
            }
        }
        let output = child
            .wait_with_output()
            .map_err(|e| ClientError::Call(e.to_string()))?;
        if !output.status.success() {
            return Err(ClientError::NonZero {
                command: format!("{} {}", self.binary, args.join(" ")),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for KubectlCli {
    fn default() -> Self {
        Self::new("kubectl")
    }
}

impl ClusterClient for KubectlCli {
    fn get(
        &self,
        ctx: &CancelToken,
        namespace: &str,
        kind: &str,
        names: &[String],
    ) -> ClientResult<String> {
        let mut args: Vec<&str> = vec!["get"];
        if !namespace.is_empty() {
            args.extend(["-n", namespace]);
        }
        args.push(kind);
        for name in names {
            args.push(name);
        }
        args.extend(["-o", "json"]);
        self.run(ctx, &args, None)
    }

    fn apply(&self, ctx: &CancelToken, manifest: &str) -> ClientResult<()> {
        self.run(ctx, &["apply", "-f", "-"], Some(manifest)).map(|_| ())
    }

    fn patch(
        &self,
        ctx: &CancelToken,
        namespace: &str,
        kind: &str,
        name: &str,
        patch_type: &str,
        payload: &str,
    ) -> ClientResult<()> {
        let patch_type = kubectl_patch_type(patch_type);
        let mut args: Vec<&str> = vec!["patch"];
        if !namespace.is_empty() {
            args.extend(["-n", namespace]);
        }
        args.extend([kind, name, "--type", patch_type, "-p", payload]);
        self.run(ctx, &args, None).map(|_| ())
    }

    fn delete(
        &self,
        ctx: &CancelToken,
        namespace: &str,
        kind: &str,
        names: &[String],
    ) -> ClientResult<()> {
        let mut args: Vec<&str> = vec!["delete"];
        if !namespace.is_empty() {
            args.extend(["-n", namespace]);
        }
        args.push(kind);
        for name in names {
            args.push(name);
        }
        self.run(ctx, &args, None).map(|_| ())
    }
}

/// Map a content-type style patch name onto kubectl's `--type` values.
fn kubectl_patch_type(patch_type: &str) -> &'static str {
    match patch_type {
        "application/json-patch+json" | "json" => "json",
        "application/strategic-merge-patch+json" | "strategic" => "strategic",
        _ => "merge",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_is_shared_across_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn cancelled_token_short_circuits_before_spawning() {
        let client = KubectlCli::new("definitely-not-a-real-binary");
        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(
            client.get(&token, "dev", "cm", &[]),
            Err(ClientError::Cancelled)
        ));
    }

    #[test]
    fn missing_binary_is_a_call_error() {
        let client = KubectlCli::new("definitely-not-a-real-binary");
        let token = CancelToken::new();
        assert!(matches!(
            client.get(&token, "dev", "cm", &[]),
            Err(ClientError::Call(_))
        ));
    }

    #[test]
    fn patch_type_mapping() {
        assert_eq!(kubectl_patch_type("application/merge-patch+json"), "merge");
        assert_eq!(
            kubectl_patch_type("application/strategic-merge-patch+json"),
            "strategic"
        );
        assert_eq!(kubectl_patch_type("application/json-patch+json"), "json");
        assert_eq!(kubectl_patch_type("anything-else"), "merge");
    }
}
