//! klang-kernel: the core of klang.
//!
//! Klang is a small imperative scripting language for working with
//! structured configuration documents (JSON, YAML) and a Kubernetes
//! cluster. This crate provides:
//!
//! - **Lexer**: tokenizes klang source using logos
//! - **Parser**: builds the AST from tokens (recursive descent)
//! - **AST**: type definitions for programs, statements, and expressions
//! - **Interpreter**: the tree-walking evaluator and its flat variable store
//! - **Document**: path-based select/edit/delete over JSON and YAML,
//!   including multi-document streams and Kubernetes `List` containers
//! - **Kube**: the `kubectl` verb dispatcher plus the injected
//!   `ClusterClient` and `ShellRunner` seams

pub mod ast;
pub mod document;
pub mod error;
pub mod interpreter;
pub mod kube;
pub mod lexer;
pub mod parser;

pub use error::{KlangError, ParseError, RuntimeError};
pub use interpreter::{Interpreter, Store};
pub use kube::{
    CancelToken, ClientError, ClusterClient, KubectlCli, LocalShell, ShellError, ShellRunner,
};
pub use parser::parse;
