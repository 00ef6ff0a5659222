//! The injected shell seam.

use std::process::Command;

use thiserror::Error;

use super::client::CancelToken;

/// Shell invocation errors.
#[derive(Debug, Clone, Error)]
pub enum ShellError {
    #[error("shell invocation failed: {0}")]
    Io(String),
    #[error("shell exited with status {status}: {stderr}")]
    NonZero { status: i32, stderr: String },
    #[error("cancelled")]
    Cancelled,
}

/// Runs a script block and returns its stdout verbatim, trailing newline
/// included.
pub trait ShellRunner: Send + Sync {
    fn run(&self, ctx: &CancelToken, script: &str) -> Result<String, ShellError>;
}

/// [`ShellRunner`] backed by `sh -c`.
pub struct LocalShell {
    shell: String,
}

impl LocalShell {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for LocalShell {
    fn default() -> Self {
        Self::new("/bin/sh")
    }
}

impl ShellRunner for LocalShell {
    fn run(&self, ctx: &CancelToken, script: &str) -> Result<String, ShellError> {
        if ctx.is_cancelled() {
            return Err(ShellError::Cancelled);
        }
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(script)
            .output()
            .map_err(|e| ShellError::Io(e.to_string()))?;
        if !output.status.success() {
            return Err(ShellError::NonZero {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdout_is_verbatim_including_trailing_newline() {
        let shell = LocalShell::default();
        let out = shell.run(&CancelToken::new(), "echo hello").unwrap();
        assert_eq!(out, "hello\n");
    }

    #[test]
    fn pipelines_run_whole() {
        let shell = LocalShell::default();
        let out = shell.run(&CancelToken::new(), "echo 'hello' | cat").unwrap();
        assert_eq!(out, "hello\n");
    }

    #[test]
    fn shebang_line_is_tolerated() {
        let shell = LocalShell::default();
        let out = shell
            .run(&CancelToken::new(), "#!/bin/bash\necho hi")
            .unwrap();
        assert_eq!(out, "hi\n");
    }

    #[test]
    fn nonzero_exit_is_an_error() {
        let shell = LocalShell::default();
        assert!(matches!(
            shell.run(&CancelToken::new(), "exit 3"),
            Err(ShellError::NonZero { status: 3, .. })
        ));
    }

    #[test]
    fn cancelled_token_short_circuits() {
        let shell = LocalShell::default();
        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(
            shell.run(&token, "echo hi"),
            Err(ShellError::Cancelled)
        ));
    }
}
