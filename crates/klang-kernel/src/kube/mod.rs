//! Cluster and shell seams plus the kubectl verb dispatcher.
//!
//! The interpreter never talks to a cluster directly: it goes through the
//! injected [`ClusterClient`] and [`ShellRunner`] traits, so tests can
//! substitute in-memory fakes and embedders can cancel in-flight work
//! through the shared [`CancelToken`].

pub mod client;
pub mod command;
pub mod shell;

pub use client::{CancelToken, ClientError, ClientResult, ClusterClient, KubectlCli};
pub use shell::{LocalShell, ShellError, ShellRunner};
