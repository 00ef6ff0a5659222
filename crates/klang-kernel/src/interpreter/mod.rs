//! The klang interpreter.
//!
//! A pure tree walk over the AST, layered as:
//!
//! - **Store**: the flat variable table (`store`)
//! - **Expression engine**: reduces expressions to values (`eval`)
//! - **Interpreter**: statement walk, builtin dispatch, and the injected
//!   cluster/shell seams
//!
//! Statements execute strictly in source order. Document-edit builtins
//! mutate the store entry holding the document, so the effect is visible to
//! the next statement. Cancellation is checked between statements; a
//! cancelled run surfaces [`RuntimeError::Cancelled`] and leaves the store
//! at the last completed statement.

mod eval;
mod store;

pub use eval::{apply_binary, apply_unary, compare_values, values_equal};
pub use store::Store;

use std::sync::Arc;

use klang_types::Value;

use crate::ast::{Expr, FunctionCall, Program, Stmt, UnaryOp};
use crate::document::engine;
use crate::error::{KlangError, RuntimeError};
use crate::kube::command::run_kubectl;
use crate::kube::{CancelToken, ClusterClient, ShellError, ShellRunner};
use crate::parser;

/// The tree-walking evaluator.
pub struct Interpreter {
    store: Store,
    client: Arc<dyn ClusterClient>,
    shell: Arc<dyn ShellRunner>,
    cancel: CancelToken,
}

impl Interpreter {
    pub fn new(client: Arc<dyn ClusterClient>, shell: Arc<dyn ShellRunner>) -> Self {
        Self::with_cancel(client, shell, CancelToken::new())
    }

    /// Build an interpreter sharing a caller-owned cancellation token.
    pub fn with_cancel(
        client: Arc<dyn ClusterClient>,
        shell: Arc<dyn ShellRunner>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            store: Store::new(),
            client,
            shell,
            cancel,
        }
    }

    /// The variable store, for inspecting results after a run.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// A handle on the cancellation token driving this interpreter.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Parse and execute a script.
    pub fn run(&mut self, source: &str) -> Result<(), KlangError> {
        let program = parser::parse(source)?;
        self.execute(&program)?;
        Ok(())
    }

    /// Execute an already-parsed program.
    pub fn execute(&mut self, program: &Program) -> Result<(), RuntimeError> {
        for stmt in &program.statements {
            self.execute_stmt(stmt)?;
        }
        Ok(())
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> Result<(), RuntimeError> {
        if self.cancel.is_cancelled() {
            return Err(RuntimeError::Cancelled);
        }
        match stmt {
            Stmt::Assign(assign) => {
                let value = self.eval_statement_value(&assign.value)?;
                self.store.set(&assign.name, value);
                Ok(())
            }
            Stmt::If(stmt) => {
                if self.eval_condition(&stmt.condition)? {
                    self.execute_block(&stmt.then_branch)
                } else if let Some(else_branch) = &stmt.else_branch {
                    self.execute_block(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::While(stmt) => {
                while self.eval_condition(&stmt.condition)? {
                    self.execute_block(&stmt.body)?;
                    if self.cancel.is_cancelled() {
                        return Err(RuntimeError::Cancelled);
                    }
                }
                Ok(())
            }
            Stmt::Expr(expr) => {
                self.eval_statement_value(expr)?;
                Ok(())
            }
        }
    }

    /// Evaluate an expression in statement position (assignment RHS or a
    /// bare statement). This is the BOOLEAN-coercing position: a command
    /// failure from the cluster or shell seam becomes `false`, logged, so
    /// scripts can probe with `if !x`. Every other error propagates.
    fn eval_statement_value(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match self.eval(expr) {
            Err(RuntimeError::Command(message))
                if matches!(expr, Expr::Kubectl(_) | Expr::ShellScript(_)) =>
            {
                tracing::warn!(%message, "command failed");
                Ok(Value::Bool(false))
            }
            other => other,
        }
    }

    fn execute_block(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        for stmt in statements {
            self.execute_stmt(stmt)?;
        }
        Ok(())
    }

    /// Evaluate an `if`/`while` condition. A bare unbound identifier is
    /// false; any other non-boolean result is a type error.
    fn eval_condition(&mut self, expr: &Expr) -> Result<bool, RuntimeError> {
        if let Expr::Ident(name) = expr {
            return match self.store.get(name) {
                Some(Value::Bool(b)) => Ok(*b),
                Some(other) => Err(RuntimeError::Type(format!(
                    "condition must be boolean, got {}",
                    other.type_name()
                ))),
                None => Ok(false),
            };
        }
        match self.eval(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(RuntimeError::Type(format!(
                "condition must be boolean, got {}",
                other.type_name()
            ))),
        }
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Ident(name) => self
                .store
                .get(name)
                .cloned()
                .ok_or_else(|| RuntimeError::Name(format!("undefined variable: {name}"))),
            Expr::Unary { op, operand } => {
                // `!x` on an unbound name is the missingness probe.
                if *op == UnaryOp::Not {
                    if let Expr::Ident(name) = operand.as_ref() {
                        if !self.store.contains(name) {
                            return Ok(Value::Bool(true));
                        }
                    }
                }
                let value = self.eval(operand)?;
                apply_unary(*op, &value)
            }
            Expr::Binary { left, op, right } => match op {
                crate::ast::BinaryOp::And => {
                    if !self.eval_bool_operand(left)? {
                        return Ok(Value::Bool(false));
                    }
                    Ok(Value::Bool(self.eval_bool_operand(right)?))
                }
                crate::ast::BinaryOp::Or => {
                    if self.eval_bool_operand(left)? {
                        return Ok(Value::Bool(true));
                    }
                    Ok(Value::Bool(self.eval_bool_operand(right)?))
                }
                _ => {
                    let lhs = self.eval(left)?;
                    let rhs = self.eval(right)?;
                    apply_binary(*op, &lhs, &rhs)
                }
            },
            Expr::Call(call) => self.call_builtin(call),
            Expr::Kubectl(cmd) => {
                run_kubectl(cmd, &self.store, self.client.as_ref(), &self.cancel)
            }
            Expr::ShellScript(body) => self.exec_shell(body),
        }
    }

    fn eval_bool_operand(&mut self, expr: &Expr) -> Result<bool, RuntimeError> {
        match self.eval(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(RuntimeError::Type(format!(
                "logical operators require boolean operands, got {}",
                other.type_name()
            ))),
        }
    }

    fn exec_shell(&mut self, body: &str) -> Result<Value, RuntimeError> {
        match self.shell.run(&self.cancel, body) {
            Ok(stdout) => Ok(Value::Str(stdout)),
            Err(ShellError::Cancelled) => Err(RuntimeError::Cancelled),
            Err(error) => Err(RuntimeError::Command(error.to_string())),
        }
    }

    // --- Builtin dispatch ---

    fn call_builtin(&mut self, call: &FunctionCall) -> Result<Value, RuntimeError> {
        match call.name.as_str() {
            "jsonSelect" => {
                let args = self.eval_args(call, 2, 2)?;
                let doc = require_str(&args[0], "jsonSelect", "document")?;
                let path = require_str(&args[1], "jsonSelect", "path")?;
                Ok(Value::Str(engine::json_select(doc, path)?))
            }
            "jsonEdit" => {
                let args = self.eval_args(call, 3, 3)?;
                let doc = require_str(&args[0], "jsonEdit", "document")?;
                let path = require_str(&args[1], "jsonEdit", "path")?;
                let edited = engine::json_edit(doc, path, &args[2])?;
                Ok(self.write_back(&call.args[0], edited))
            }
            "yamlSelect" => {
                let args = self.eval_args(call, 2, 3)?;
                let doc = require_str(&args[0], "yamlSelect", "document")?;
                let path = require_str(&args[1], "yamlSelect", "path")?;
                let index = doc_index(args.get(2))?;
                Ok(Value::Str(engine::yaml_select(doc, path, index)?))
            }
            "yamlEdit" => {
                let args = self.eval_args(call, 3, 4)?;
                let doc = require_str(&args[0], "yamlEdit", "document")?;
                let path = require_str(&args[1], "yamlEdit", "path")?;
                let index = doc_index(args.get(3))?;
                let edited = engine::yaml_edit(doc, path, &args[2], index)?;
                Ok(self.write_back(&call.args[0], edited))
            }
            "handleKubeJsonEdit" => {
                let args = self.eval_args(call, 4, 4)?;
                let doc = require_str(&args[0], "handleKubeJsonEdit", "document")?;
                let filter = require_str(&args[1], "handleKubeJsonEdit", "filter")?;
                let path = require_str(&args[2], "handleKubeJsonEdit", "path")?;
                let edited = engine::kube_json_edit(doc, filter, path, &args[3])?;
                Ok(self.write_back(&call.args[0], edited))
            }
            "handleKubeJsonDelete" => {
                let args = self.eval_args(call, 3, 3)?;
                let doc = require_str(&args[0], "handleKubeJsonDelete", "document")?;
                let filter = require_str(&args[1], "handleKubeJsonDelete", "filter")?;
                let path = require_str(&args[2], "handleKubeJsonDelete", "path")?;
                let edited = engine::kube_json_delete(doc, filter, path)?;
                Ok(self.write_back(&call.args[0], edited))
            }
            "handleKubeYamlEdit" => {
                let args = self.eval_args(call, 4, 4)?;
                let doc = require_str(&args[0], "handleKubeYamlEdit", "document")?;
                let filter = require_str(&args[1], "handleKubeYamlEdit", "filter")?;
                let path = require_str(&args[2], "handleKubeYamlEdit", "path")?;
                let edited = engine::kube_yaml_edit(doc, filter, path, &args[3])?;
                Ok(self.write_back(&call.args[0], edited))
            }
            "handleKubeYamlDelete" => {
                let args = self.eval_args(call, 3, 3)?;
                let doc = require_str(&args[0], "handleKubeYamlDelete", "document")?;
                let filter = require_str(&args[1], "handleKubeYamlDelete", "filter")?;
                let path = require_str(&args[2], "handleKubeYamlDelete", "path")?;
                let edited = engine::kube_yaml_delete(doc, filter, path)?;
                Ok(self.write_back(&call.args[0], edited))
            }
            "log" => {
                let args = self.eval_args(call, 1, 1)?;
                tracing::info!(target: "klang::script", "{}", args[0].render());
                Ok(args[0].clone())
            }
            other => Err(RuntimeError::Name(format!("unknown function: {other}"))),
        }
    }

    fn eval_args(
        &mut self,
        call: &FunctionCall,
        min: usize,
        max: usize,
    ) -> Result<Vec<Value>, RuntimeError> {
        if call.args.len() < min || call.args.len() > max {
            let expected = if min == max {
                min.to_string()
            } else {
                format!("{min} to {max}")
            };
            return Err(RuntimeError::Type(format!(
                "{} expects {expected} arguments, got {}",
                call.name,
                call.args.len()
            )));
        }
        call.args.iter().map(|arg| self.eval(arg)).collect()
    }

    /// Edit builtins mutate the variable holding the document when the
    /// first argument is an identifier; the edited text is also the call
    /// value.
    fn write_back(&mut self, target: &Expr, edited: String) -> Value {
        if let Expr::Ident(name) = target {
            self.store.set(name, Value::Str(edited.clone()));
        }
        Value::Str(edited)
    }
}

fn require_str<'a>(value: &'a Value, func: &str, what: &str) -> Result<&'a str, RuntimeError> {
    value.as_str().ok_or_else(|| {
        RuntimeError::Type(format!(
            "{func} {what} must be a string, got {}",
            value.type_name()
        ))
    })
}

fn doc_index(value: Option<&Value>) -> Result<usize, RuntimeError> {
    match value {
        None => Ok(0),
        Some(Value::Int(i)) if *i >= 0 => Ok(*i as usize),
        Some(other) => Err(RuntimeError::Type(format!(
            "document index must be a non-negative integer, got {}",
            other.render()
        ))),
    }
}
