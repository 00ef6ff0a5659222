//! klang — run a klang script against a cluster.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use klang_kernel::{Interpreter, KubectlCli, LocalShell};

#[derive(Parser, Debug)]
#[command(name = "klang", version, about = "Interpreter for klang scripts")]
struct Cli {
    /// Path to the script to execute.
    script: PathBuf,

    /// kubectl binary used for cluster commands.
    #[arg(long, default_value = "kubectl", env = "KLANG_KUBECTL")]
    kubectl: String,

    /// Shell used for shellScript blocks.
    #[arg(long, default_value = "/bin/sh", env = "KLANG_SHELL")]
    shell: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let source = fs::read_to_string(&cli.script)
        .with_context(|| format!("failed to read {}", cli.script.display()))?;

    let mut interpreter = Interpreter::new(
        Arc::new(KubectlCli::new(cli.kubectl)),
        Arc::new(LocalShell::new(cli.shell)),
    );
    interpreter
        .run(&source)
        .with_context(|| format!("script {} failed", cli.script.display()))?;

    for (name, value) in interpreter.store().snapshot() {
        tracing::debug!(%name, kind = %value.data_type(), %value, "final binding");
    }
    Ok(())
}
