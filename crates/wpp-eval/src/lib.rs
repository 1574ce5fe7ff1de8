//! wpp-eval - The Wot++ tree-walking evaluator.
//!
//! An [`Evaluator`] owns the AST store, the source map, and the environment
//! for one run, and reduces any node to the bytes it yields. Documents
//! concatenate their statements' output; definitions mutate the environment
//! and yield nothing.
//!
//! The evaluator owns the lexer and parser as reentrant services: `source`,
//! `eval`, and codeify feed runtime bytes back through [`wpp_par::parse`] /
//! [`wpp_par::parse_fragment`] into the *same* store and evaluate the result
//! in the *same* environment, so definitions made by meta-evaluated code
//! persist. A shared depth counter guards user-function calls and
//! meta-evaluation against runaway recursion.
//!
//! Because the store grows mid-walk, the walk never holds a node borrow
//! across child evaluation: each step clones the (small) payload out of the
//! store first and works from the clone.

pub mod env;
pub mod intrinsic;

mod edge_cases;

pub use env::Env;

use wpp_par::{Ast, Node, NodeId, NodeKind};
use wpp_util::{Diagnostic, Result, SourceMap, Span, Symbol};

/// Shared recursion limit for calls and meta-evaluation.
pub const MAX_DEPTH: usize = 1024;

/// Evaluator configuration.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Whether the `run` and `pipe` intrinsics may spawn subprocesses.
    pub allow_exec: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { allow_exec: true }
    }
}

/// The tree-walking evaluator.
///
/// # Example
///
/// ```
/// use wpp_eval::{Config, Evaluator};
///
/// let mut evaluator = Evaluator::new(Config::default());
/// let out = evaluator
///     .eval_source("<doc>", b"let greet(x) \"hello \" .. x greet(\"world\")".to_vec())
///     .unwrap();
/// assert_eq!(out, b"hello world");
/// ```
pub struct Evaluator {
    ast: Ast,
    sources: SourceMap,
    env: Env,
    config: Config,
    depth: usize,
}

impl Evaluator {
    pub fn new(config: Config) -> Self {
        Self {
            ast: Ast::new(),
            sources: SourceMap::new(),
            env: Env::new(),
            config,
            depth: 0,
        }
    }

    /// The source map, for rendering diagnostics against.
    pub fn sources(&self) -> &SourceMap {
        &self.sources
    }

    /// Snapshot the environment (the REPL rolls back to this on error).
    pub fn snapshot(&self) -> Env {
        self.env.clone()
    }

    pub fn restore(&mut self, env: Env) {
        self.env = env;
    }

    /// Parse `src` as a document and evaluate it in the current
    /// environment, returning the document's output bytes.
    pub fn eval_source(&mut self, name: &str, src: Vec<u8>) -> Result<Vec<u8>> {
        let file = self.sources.add_file(name, src);
        let text = self.sources.source(file).to_vec();
        let root = wpp_par::parse(&text, file, &mut self.ast)?;
        self.eval(root)
    }

    /// Evaluate one node to the bytes it yields.
    pub fn eval(&mut self, node: NodeId) -> Result<Vec<u8>> {
        // Clone the payload out of the store: children added during this
        // step (codeify, source) must not invalidate what we walk.
        let Node { span, kind } = self.ast.get(node).clone();

        match kind {
            NodeKind::Document(stmts) => {
                let mut out = Vec::new();
                for stmt in stmts {
                    out.extend_from_slice(&self.eval(stmt)?);
                }
                Ok(out)
            }

            NodeKind::Str(bytes) => Ok(bytes),

            NodeKind::Cat { lhs, rhs } => {
                let mut out = self.eval(lhs)?;
                out.extend_from_slice(&self.eval(rhs)?);
                Ok(out)
            }

            NodeKind::Block { stmts, expr } => {
                self.env.push_frame();
                let result = self.eval_block_body(&stmts, expr);
                self.env.pop_frame();
                result
            }

            NodeKind::Fn { name, params, .. } => {
                let qualified = self.env.qualify(name);
                self.env.define_fn(qualified, params.len(), node);
                Ok(Vec::new())
            }

            NodeKind::Var { name, body } => {
                let value = self.eval(body)?;
                let qualified = self.env.qualify(name);
                self.env.define_var(qualified, value);
                Ok(Vec::new())
            }

            NodeKind::Drop { target } => self.eval_drop(target, span),

            NodeKind::Prefix { exprs, stmts } => {
                let mut segment = Vec::new();
                for expr in exprs {
                    segment.extend_from_slice(&self.eval(expr)?);
                }
                self.env.push_prefix(segment);
                let result = self.eval_stmts_for_effect(&stmts);
                self.env.pop_prefix();
                result?;
                Ok(Vec::new())
            }

            NodeKind::Map {
                scrutinee,
                arms,
                default,
            } => {
                let value = self.eval(scrutinee)?;
                // Patterns evaluate eagerly, in declaration order, until one
                // matches; arms evaluate only when chosen.
                for (pattern, arm) in arms {
                    if self.eval(pattern)? == value {
                        return self.eval(arm);
                    }
                }
                match default {
                    Some(arm) => self.eval(arm),
                    None => Ok(Vec::new()),
                }
            }

            NodeKind::FnInvoke { name, args } => self.eval_invoke(name, &args, span),

            NodeKind::Intrinsic { kind, args } => self.eval_intrinsic(kind, &args, span),

            NodeKind::Codeify { expr } => {
                let bytes = self.eval(expr)?;
                self.eval_codeified(bytes, span)
            }
        }
    }

    fn eval_block_body(&mut self, stmts: &[NodeId], expr: NodeId) -> Result<Vec<u8>> {
        // Inner statements run for their side effects only; the trailing
        // expression is the block's value.
        for &stmt in stmts {
            self.eval(stmt)?;
        }
        self.eval(expr)
    }

    fn eval_stmts_for_effect(&mut self, stmts: &[NodeId]) -> Result<()> {
        for &stmt in stmts {
            self.eval(stmt)?;
        }
        Ok(())
    }

    fn eval_invoke(&mut self, name: Symbol, args: &[NodeId], span: Span) -> Result<Vec<u8>> {
        let arity = args.len();

        if let Some(def) = self.env.lookup_fn(name, arity) {
            // Arguments evaluate eagerly, left to right, in the caller's
            // environment; the body is lazy and sees the callee frame.
            let mut values = Vec::with_capacity(arity);
            for &arg in args {
                values.push(self.eval(arg)?);
            }

            let (params, body) = match self.ast.get(def).kind.clone() {
                NodeKind::Fn { params, body, .. } => (params, body),
                _ => return Err(Diagnostic::eval("malformed function definition", span)),
            };

            if self.depth >= MAX_DEPTH {
                return Err(Diagnostic::eval("recursion limit exceeded", span));
            }
            self.depth += 1;
            self.env.push_frame();
            for (param, value) in params.into_iter().zip(values) {
                self.env.define_var(param, value);
            }
            let result = self.eval(body);
            self.env.pop_frame();
            self.depth -= 1;
            return result;
        }

        // A nullary call falls back to a variable of the same name.
        if arity == 0 {
            if let Some(value) = self.env.lookup_var(name) {
                return Ok(value.to_vec());
            }
            return Err(Diagnostic::eval(
                format!("undefined function or variable '{}'", name),
                span,
            ));
        }

        Err(Diagnostic::eval(
            format!("undefined function '{}' taking {} argument(s)", name, arity),
            span,
        ))
    }

    fn eval_drop(&mut self, target: NodeId, span: Span) -> Result<Vec<u8>> {
        let (name, arity) = match self.ast.get(target).kind.clone() {
            NodeKind::FnInvoke { name, args } => (name, args.len()),
            _ => return Err(Diagnostic::eval("malformed drop target", span)),
        };

        if self.env.drop_fn(name, arity) {
            return Ok(Vec::new());
        }
        // No function matched; a nullary drop may still remove a variable.
        if arity == 0 && self.env.drop_var(name) {
            return Ok(Vec::new());
        }

        Err(Diagnostic::eval(
            format!(
                "cannot drop '{}': no definition taking {} argument(s)",
                name, arity
            ),
            span,
        ))
    }

    /// Evaluate runtime bytes as a whole document (`source` / `eval`).
    /// Shares the environment, so definitions persist.
    pub(crate) fn eval_meta(&mut self, src: Vec<u8>, span: Span) -> Result<Vec<u8>> {
        if self.depth >= MAX_DEPTH {
            return Err(Diagnostic::eval("recursion limit exceeded", span));
        }
        let file = self.sources.add_file("<source>", src);
        let text = self.sources.source(file).to_vec();
        let root = wpp_par::parse(&text, file, &mut self.ast)?;

        self.depth += 1;
        let result = self.eval(root);
        self.depth -= 1;
        result
    }

    /// Evaluate runtime bytes as a single expression (codeify).
    fn eval_codeified(&mut self, src: Vec<u8>, span: Span) -> Result<Vec<u8>> {
        if self.depth >= MAX_DEPTH {
            return Err(Diagnostic::eval("recursion limit exceeded", span));
        }
        let file = self.sources.add_file("<codeify>", src);
        let text = self.sources.source(file).to_vec();
        let expr = wpp_par::parse_fragment(&text, file, &mut self.ast)?;

        self.depth += 1;
        let result = self.eval(expr);
        self.depth -= 1;
        result
    }
}
