//! The AST store.
//!
//! Nodes live in a single append-only container addressed by [`NodeId`].
//! Parent-to-child edges are stored as ids, never references, so growing the
//! store never invalidates an edge and nodes parsed at different times (the
//! initial document, later `source` fragments, codeified expressions) share
//! one address space for the whole compilation.
//!
//! Nothing is ever removed. The one permitted mutation besides appending is
//! [`Ast::replace`], which the parser uses to rewrite a `FnInvoke` into an
//! `Intrinsic` once it has seen the callee. The rule for walking the store
//! while adding to it: resolve a node to an owned value first, then add
//! children, then write edges back through the id — never hold a borrow
//! across an `add`.

use wpp_lex::IntrinsicKind;
use wpp_util::{define_idx, IndexVec, Span, Symbol};

define_idx!(NodeId);

/// One syntax node: its source span plus the variant payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub span: Span,
    pub kind: NodeKind,
}

/// The syntactic forms of the language, one variant per form.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// A whole source buffer: its top-level statements in order.
    Document(Vec<NodeId>),

    /// `let name(params…) body` — a lazy function definition.
    Fn {
        name: Symbol,
        params: Vec<Symbol>,
        body: NodeId,
    },

    /// `var name body` — body evaluated at definition time.
    Var { name: Symbol, body: NodeId },

    /// `drop target` — target is a structural `FnInvoke` giving name and
    /// arity; its arguments are placeholders and are never evaluated.
    Drop { target: NodeId },

    /// `prefix expr { stmts… }` — the expressions concatenate into the
    /// prefix segment pushed around the statements.
    Prefix {
        exprs: Vec<NodeId>,
        stmts: Vec<NodeId>,
    },

    /// `{ stmts… expr }` — the trailing expression is the block's value.
    Block { stmts: Vec<NodeId>, expr: NodeId },

    /// `map expr { pat -> arm … * -> default }`
    Map {
        scrutinee: NodeId,
        arms: Vec<(NodeId, NodeId)>,
        default: Option<NodeId>,
    },

    /// `name(args…)` or a bare `name`.
    FnInvoke { name: Symbol, args: Vec<NodeId> },

    /// A built-in invocation; rewritten in place from `FnInvoke`.
    Intrinsic {
        kind: IntrinsicKind,
        args: Vec<NodeId>,
    },

    /// `= expr` — the value is re-parsed as code and evaluated.
    Codeify { expr: NodeId },

    /// A fully decoded string literal.
    Str(Vec<u8>),

    /// `lhs .. rhs`
    Cat { lhs: NodeId, rhs: NodeId },
}

impl NodeKind {
    /// Whether this form yields a value (as opposed to a definition that
    /// only mutates the environment).
    pub fn is_expression(&self) -> bool {
        !matches!(
            self,
            NodeKind::Document(_)
                | NodeKind::Fn { .. }
                | NodeKind::Var { .. }
                | NodeKind::Drop { .. }
                | NodeKind::Prefix { .. }
        )
    }
}

/// Append-only node container.
///
/// # Example
///
/// ```
/// use wpp_par::ast::{Ast, NodeKind};
/// use wpp_util::Span;
///
/// let mut ast = Ast::new();
/// let hello = ast.add(Span::DUMMY, NodeKind::Str(b"hello".to_vec()));
/// let world = ast.add(Span::DUMMY, NodeKind::Str(b"world".to_vec()));
/// let cat = ast.add(Span::DUMMY, NodeKind::Cat { lhs: hello, rhs: world });
///
/// assert!(ast.get(cat).kind.is_expression());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Ast {
    nodes: IndexVec<NodeId, Node>,
}

impl Ast {
    pub fn new() -> Self {
        Self {
            nodes: IndexVec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a node and return its id.
    pub fn add(&mut self, span: Span, kind: NodeKind) -> NodeId {
        self.nodes.push(Node { span, kind })
    }

    /// The node behind `id`.
    ///
    /// Panics on an id that was never handed out by this store; that is a
    /// caller bug, not a recoverable condition.
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Replace the payload of `id`, keeping its span.
    pub fn replace(&mut self, id: NodeId, kind: NodeKind) {
        self.nodes[id].kind = kind;
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id].span
    }
}
