//! wpp-par - The Wot++ parser.
//!
//! Recursive descent with a single token of lookahead over the moded lexer.
//! The parser emits node ids into an [`Ast`] store as it goes; the grammar:
//!
//! ```text
//! document   := statement* EOF
//! statement  := 'let' ident ('(' ident (',' ident)* ')')? expression
//!             | 'var' ident expression
//!             | 'drop' ident ('(' ident (',' ident)* ')')?
//!             | 'prefix' expression '{' statement* '}'
//!             | expression
//! expression := primary ('..' expression)?
//! primary    := fninvoke | string | block | map | codeify | '!' ident
//! block      := '{' statement* expression '}'
//! map        := 'map' expression '{' (expression '->' expression)*
//!                                    ('*' '->' expression)? '}'
//! codeify    := '=' expression
//! fninvoke   := ident ('(' (expression (',' expression)*)? ')')?
//! ```
//!
//! String literals are decoded here: the parser drives the lexer's string
//! mode (or char mode for hex/bin digit bodies), assembles the decoded
//! bytes, and applies the per-kind post-processor from [`strings`].
//!
//! Both entry points — [`parse`] for documents and [`parse_fragment`] for
//! codeified expressions — append into a caller-supplied store, so code
//! parsed at evaluation time lives alongside the original document and
//! definitions made by meta-evaluated fragments stay valid.

pub mod ast;
pub mod strings;

mod edge_cases;

pub use ast::{Ast, Node, NodeId, NodeKind};
pub use wpp_lex::IntrinsicKind;

use wpp_lex::{Lexer, Mode, StrKind, Token, TokenKind};
use wpp_util::{Diagnostic, FileId, Result, Span, Symbol};

/// Parse a complete document into `ast`, returning the `Document` node.
pub fn parse(source: &[u8], file: FileId, ast: &mut Ast) -> Result<NodeId> {
    let mut parser = Parser::new(source, file, ast);
    parser.parse_document()
}

/// Parse a single expression, requiring the whole input to be consumed.
///
/// This is the reentrant service behind codeify: the evaluator feeds it
/// runtime bytes and splices the resulting expression into the same store.
pub fn parse_fragment(source: &[u8], file: FileId, ast: &mut Ast) -> Result<NodeId> {
    let mut parser = Parser::new(source, file, ast);
    let expr = parser.parse_expression()?;
    parser.expect_eof()?;
    Ok(expr)
}

/// The recursive descent parser.
pub struct Parser<'src, 'ast> {
    lexer: Lexer<'src>,
    ast: &'ast mut Ast,
}

impl<'src, 'ast> Parser<'src, 'ast> {
    pub fn new(source: &'src [u8], file: FileId, ast: &'ast mut Ast) -> Self {
        Self {
            lexer: Lexer::new(source, file),
            ast,
        }
    }

    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    fn peek(&mut self) -> Result<Token> {
        self.lexer.peek(Mode::Normal)
    }

    fn next(&mut self) -> Result<Token> {
        self.lexer.next(Mode::Normal)
    }

    fn expect(&mut self, kind: TokenKind, context: &str) -> Result<Token> {
        let token = self.next()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(Diagnostic::parse(
                format!(
                    "expected {} {}, found {}",
                    kind.describe(),
                    context,
                    token.kind.describe()
                ),
                token.span,
            ))
        }
    }

    fn expect_ident(&mut self, context: &str) -> Result<(Symbol, Span)> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Ident(sym) => Ok((sym, token.span)),
            kind => Err(Diagnostic::parse(
                format!(
                    "expected identifier {}, found {}",
                    context,
                    kind.describe()
                ),
                token.span,
            )),
        }
    }

    fn expect_eof(&mut self) -> Result<()> {
        let token = self.peek()?;
        if token.kind == TokenKind::Eof {
            Ok(())
        } else {
            Err(Diagnostic::parse(
                format!("expected end of input, found {}", token.kind.describe()),
                token.span,
            ))
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    pub fn parse_document(&mut self) -> Result<NodeId> {
        let start = self.peek()?.span;
        let mut stmts = Vec::new();

        loop {
            let token = self.peek()?;
            if token.kind == TokenKind::Eof {
                let span = start.to(token.span);
                return Ok(self.ast.add(span, NodeKind::Document(stmts)));
            }
            stmts.push(self.parse_statement()?);
        }
    }

    fn parse_statement(&mut self) -> Result<NodeId> {
        match self.peek()?.kind {
            TokenKind::Let => self.parse_let(),
            TokenKind::Var => self.parse_var(),
            TokenKind::Drop => self.parse_drop(),
            TokenKind::Prefix => self.parse_prefix(),
            _ => self.parse_expression(),
        }
    }

    fn parse_let(&mut self) -> Result<NodeId> {
        let kw = self.next()?;
        let (name, _) = self.expect_ident("after 'let'")?;

        let mut params = Vec::new();
        if self.peek()?.kind == TokenKind::LParen {
            self.next()?;
            if self.peek()?.kind != TokenKind::RParen {
                loop {
                    let param = self.parse_param(&params)?;
                    params.push(param);
                    if self.peek()?.kind == TokenKind::Comma {
                        self.next()?;
                    } else {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RParen, "after parameters")?;
        }

        let body = self.parse_expression()?;
        let span = kw.span.to(self.ast.span(body));
        Ok(self.ast.add(span, NodeKind::Fn { name, params, body }))
    }

    fn parse_param(&mut self, seen: &[Symbol]) -> Result<Symbol> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Ident(sym) => {
                if seen.contains(&sym) {
                    return Err(Diagnostic::parse(
                        format!("duplicate parameter name '{}'", sym),
                        token.span,
                    ));
                }
                Ok(sym)
            }
            kind if kind.is_keyword() => Err(Diagnostic::parse(
                format!("{} cannot be used as a parameter name", kind.describe()),
                token.span,
            )),
            kind => Err(Diagnostic::parse(
                format!("expected parameter name, found {}", kind.describe()),
                token.span,
            )),
        }
    }

    fn parse_var(&mut self) -> Result<NodeId> {
        let kw = self.next()?;
        let (name, _) = self.expect_ident("after 'var'")?;
        let body = self.parse_expression()?;
        let span = kw.span.to(self.ast.span(body));
        Ok(self.ast.add(span, NodeKind::Var { name, body }))
    }

    /// `drop name(placeholders…)` — the target is stored structurally as a
    /// `FnInvoke` whose argument count gives the arity to remove. The
    /// placeholders themselves are never evaluated.
    fn parse_drop(&mut self) -> Result<NodeId> {
        let kw = self.next()?;

        let callee = self.next()?;
        let name = match callee.kind {
            TokenKind::Ident(sym) => sym,
            TokenKind::Intrinsic(kind) => {
                return Err(Diagnostic::parse(
                    format!("cannot drop intrinsic '{}'", kind.name()),
                    callee.span,
                ))
            }
            kind => {
                return Err(Diagnostic::parse(
                    format!("expected identifier after 'drop', found {}", kind.describe()),
                    callee.span,
                ))
            }
        };

        let mut args = Vec::new();
        let mut end = callee.span;
        if self.peek()?.kind == TokenKind::LParen {
            self.next()?;
            if self.peek()?.kind != TokenKind::RParen {
                loop {
                    let token = self.next()?;
                    match token.kind {
                        TokenKind::Ident(sym) => {
                            let placeholder = self.ast.add(
                                token.span,
                                NodeKind::FnInvoke {
                                    name: sym,
                                    args: Vec::new(),
                                },
                            );
                            args.push(placeholder);
                        }
                        kind => {
                            return Err(Diagnostic::parse(
                                format!(
                                    "expected parameter placeholder, found {}",
                                    kind.describe()
                                ),
                                token.span,
                            ))
                        }
                    }
                    if self.peek()?.kind == TokenKind::Comma {
                        self.next()?;
                    } else {
                        break;
                    }
                }
            }
            end = self.expect(TokenKind::RParen, "after drop placeholders")?.span;
        }

        let target = self
            .ast
            .add(callee.span.to(end), NodeKind::FnInvoke { name, args });
        Ok(self.ast.add(kw.span.to(end), NodeKind::Drop { target }))
    }

    fn parse_prefix(&mut self) -> Result<NodeId> {
        let kw = self.next()?;
        let exprs = vec![self.parse_expression()?];
        self.expect(TokenKind::LBrace, "after prefix expression")?;

        let mut stmts = Vec::new();
        loop {
            let token = self.peek()?;
            match token.kind {
                TokenKind::RBrace => break,
                TokenKind::Eof => {
                    return Err(Diagnostic::parse(
                        "expected '}' to close prefix block",
                        token.span,
                    ))
                }
                _ => stmts.push(self.parse_statement()?),
            }
        }
        let close = self.next()?;

        Ok(self
            .ast
            .add(kw.span.to(close.span), NodeKind::Prefix { exprs, stmts }))
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Concatenation is right-associative: one recursive call parses the
    /// whole right-hand side.
    pub fn parse_expression(&mut self) -> Result<NodeId> {
        let lhs = self.parse_primary()?;

        if self.peek()?.kind == TokenKind::Cat {
            self.next()?;
            let rhs = self.parse_expression()?;
            let span = self.ast.span(lhs).to(self.ast.span(rhs));
            return Ok(self.ast.add(span, NodeKind::Cat { lhs, rhs }));
        }

        Ok(lhs)
    }

    fn parse_primary(&mut self) -> Result<NodeId> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::Quote(kind) => self.parse_string(kind),
            TokenKind::Bang => self.parse_stringify(),
            TokenKind::LBrace => self.parse_block(),
            TokenKind::Map => self.parse_map(),
            TokenKind::Equal => self.parse_codeify(),
            TokenKind::Ident(_) | TokenKind::Intrinsic(_) => self.parse_invoke(),
            TokenKind::Arrow => Err(Diagnostic::parse("'->' outside a map body", token.span)),
            kind => Err(Diagnostic::parse(
                format!("expected expression, found {}", kind.describe()),
                token.span,
            )),
        }
    }

    /// `!ident` — the value is the identifier's own bytes.
    fn parse_stringify(&mut self) -> Result<NodeId> {
        let bang = self.next()?;
        let token = self.next()?;
        let bytes = match token.kind {
            TokenKind::Ident(sym) => sym.as_bytes().to_vec(),
            TokenKind::Intrinsic(kind) => kind.name().as_bytes().to_vec(),
            kind => {
                return Err(Diagnostic::parse(
                    format!("expected identifier after '!', found {}", kind.describe()),
                    token.span,
                ))
            }
        };
        Ok(self
            .ast
            .add(bang.span.to(token.span), NodeKind::Str(bytes)))
    }

    fn parse_block(&mut self) -> Result<NodeId> {
        let open = self.next()?;

        let mut stmts = Vec::new();
        loop {
            let token = self.peek()?;
            match token.kind {
                TokenKind::RBrace => break,
                TokenKind::Eof => {
                    return Err(Diagnostic::parse("expected '}' to close block", token.span))
                }
                _ => stmts.push(self.parse_statement()?),
            }
        }
        let close = self.next()?;

        // The last statement that is an expression becomes the block value.
        let expr = match stmts.pop() {
            Some(id) if self.ast.get(id).kind.is_expression() => id,
            Some(id) => {
                return Err(Diagnostic::parse(
                    "block must end with an expression",
                    self.ast.span(id),
                ))
            }
            None => {
                return Err(Diagnostic::parse(
                    "block must end with an expression",
                    close.span,
                ))
            }
        };

        Ok(self
            .ast
            .add(open.span.to(close.span), NodeKind::Block { stmts, expr }))
    }

    fn parse_map(&mut self) -> Result<NodeId> {
        let kw = self.next()?;

        let token = self.peek()?;
        if token.kind == TokenKind::LBrace {
            return Err(Diagnostic::parse(
                "expected an expression to test after 'map'",
                token.span,
            ));
        }
        let scrutinee = self.parse_expression()?;
        self.expect(TokenKind::LBrace, "to open map body")?;

        let mut arms = Vec::new();
        let mut default = None;
        loop {
            let token = self.peek()?;
            match token.kind {
                TokenKind::RBrace => break,
                TokenKind::Eof => {
                    return Err(Diagnostic::parse(
                        "expected '}' to close map body",
                        token.span,
                    ))
                }
                TokenKind::Star => {
                    self.next()?;
                    self.expect(TokenKind::Arrow, "after '*'")?;
                    let arm = self.parse_expression()?;
                    if default.is_some() {
                        return Err(Diagnostic::parse(
                            "map already has a default arm",
                            token.span,
                        ));
                    }
                    default = Some(arm);
                }
                _ => {
                    let pattern = self.parse_expression()?;
                    self.expect(TokenKind::Arrow, "after map pattern")?;
                    let arm = self.parse_expression()?;
                    arms.push((pattern, arm));
                }
            }
        }
        let close = self.next()?;

        Ok(self.ast.add(
            kw.span.to(close.span),
            NodeKind::Map {
                scrutinee,
                arms,
                default,
            },
        ))
    }

    fn parse_codeify(&mut self) -> Result<NodeId> {
        let eq = self.next()?;
        let expr = self.parse_expression()?;
        let span = eq.span.to(self.ast.span(expr));
        Ok(self.ast.add(span, NodeKind::Codeify { expr }))
    }

    fn parse_invoke(&mut self) -> Result<NodeId> {
        let callee = self.next()?;
        let (name, intrinsic) = match callee.kind {
            TokenKind::Ident(sym) => (sym, None),
            TokenKind::Intrinsic(kind) => (Symbol::intern(kind.name().as_bytes()), Some(kind)),
            kind => {
                return Err(Diagnostic::parse(
                    format!("expected a callee, found {}", kind.describe()),
                    callee.span,
                ))
            }
        };

        let mut args = Vec::new();
        let mut end = callee.span;
        if self.peek()?.kind == TokenKind::LParen {
            self.next()?;
            if self.peek()?.kind != TokenKind::RParen {
                loop {
                    args.push(self.parse_expression()?);
                    if self.peek()?.kind == TokenKind::Comma {
                        self.next()?;
                    } else {
                        break;
                    }
                }
            }
            end = self.expect(TokenKind::RParen, "after arguments")?.span;
        }

        let span = callee.span.to(end);
        if let Some(kind) = intrinsic {
            // The callee is a built-in: create the invocation, then rewrite
            // it in place now that the callee is known.
            let node = self.ast.add(
                span,
                NodeKind::FnInvoke {
                    name,
                    args: args.clone(),
                },
            );
            self.ast.replace(node, NodeKind::Intrinsic { kind, args });
            Ok(node)
        } else {
            Ok(self.ast.add(span, NodeKind::FnInvoke { name, args }))
        }
    }

    // ------------------------------------------------------------------
    // String literals
    // ------------------------------------------------------------------

    fn parse_string(&mut self, kind: StrKind) -> Result<NodeId> {
        let opener = self.next()?;
        match kind {
            StrKind::Hex | StrKind::Bin => self.parse_basis_body(kind, opener),
            _ => self.parse_string_body(kind, opener),
        }
    }

    /// Drive string mode until the closing quote, assembling decoded bytes.
    fn parse_string_body(&mut self, kind: StrKind, opener: Token) -> Result<NodeId> {
        let mut bytes = Vec::new();
        let close;
        loop {
            let token = self.lexer.next(Mode::String)?;
            match token.kind {
                TokenKind::Chunk => bytes.extend_from_slice(self.lexer.slice(token.span)),
                TokenKind::Escape(b) => bytes.push(b),
                TokenKind::CloseQuote => {
                    close = token;
                    break;
                }
                other => {
                    return Err(Diagnostic::parse(
                        format!("unexpected {} in string body", other.describe()),
                        token.span,
                    ))
                }
            }
        }

        let decoded = match kind {
            StrKind::Paragraph => strings::paragraph(&bytes),
            StrKind::Code => strings::code(&bytes),
            // Normal and raw bodies are already in final form.
            _ => bytes,
        };

        Ok(self
            .ast
            .add(opener.span.to(close.span), NodeKind::Str(decoded)))
    }

    /// Read a hex/bin digit body one raw byte at a time under char mode.
    fn parse_basis_body(&mut self, kind: StrKind, opener: Token) -> Result<NodeId> {
        let quote = self
            .lexer
            .slice(opener.span)
            .last()
            .copied()
            .unwrap_or(b'"');

        let mut digits = Vec::new();
        let close_span;
        loop {
            let token = self.lexer.next(Mode::Char)?;
            match token.kind {
                TokenKind::Byte(b) if b == quote => {
                    close_span = token.span;
                    break;
                }
                TokenKind::Byte(b) => {
                    let valid = b == b'_'
                        || match kind {
                            StrKind::Hex => b.is_ascii_hexdigit(),
                            _ => b == b'0' || b == b'1',
                        };
                    if !valid {
                        let label = if kind == StrKind::Hex { "hex" } else { "binary" };
                        return Err(Diagnostic::parse(
                            format!(
                                "invalid digit '{}' in {} string",
                                printable(b),
                                label
                            ),
                            token.span,
                        ));
                    }
                    digits.push(b);
                }
                _ => return Err(Diagnostic::lex("unterminated string", token.span)),
            }
        }

        let decoded = match kind {
            StrKind::Hex => strings::decode_hex(&digits),
            _ => strings::decode_bin(&digits),
        };

        Ok(self
            .ast
            .add(opener.span.to(close_span), NodeKind::Str(decoded)))
    }
}

fn printable(b: u8) -> String {
    if b.is_ascii_graphic() || b == b' ' {
        (b as char).to_string()
    } else {
        format!("\\x{:02X}", b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &[u8]) -> (Ast, NodeId) {
        let mut ast = Ast::new();
        let root = parse(source, FileId(0), &mut ast).expect("parse failure");
        (ast, root)
    }

    fn parse_err(source: &[u8]) -> Diagnostic {
        let mut ast = Ast::new();
        parse(source, FileId(0), &mut ast).expect_err("expected parse failure")
    }

    fn doc_stmts(ast: &Ast, root: NodeId) -> Vec<NodeId> {
        match &ast.get(root).kind {
            NodeKind::Document(stmts) => stmts.clone(),
            other => panic!("expected document, got {:?}", other),
        }
    }

    fn str_value(ast: &Ast, id: NodeId) -> Vec<u8> {
        match &ast.get(id).kind {
            NodeKind::Str(bytes) => bytes.clone(),
            other => panic!("expected string node, got {:?}", other),
        }
    }

    // ==================== DOCUMENTS AND STATEMENTS ====================

    #[test]
    fn test_empty_document() {
        let (ast, root) = parse_ok(b"");
        assert!(doc_stmts(&ast, root).is_empty());
    }

    #[test]
    fn test_comment_only_document() {
        let (ast, root) = parse_ok(b"#[ nothing ]");
        assert!(doc_stmts(&ast, root).is_empty());
    }

    #[test]
    fn test_let_with_params() {
        let (ast, root) = parse_ok(b"let greet(x, y) x");
        let stmts = doc_stmts(&ast, root);
        assert_eq!(stmts.len(), 1);
        match &ast.get(stmts[0]).kind {
            NodeKind::Fn { name, params, body } => {
                assert_eq!(*name, Symbol::intern(b"greet"));
                assert_eq!(params, &[Symbol::intern(b"x"), Symbol::intern(b"y")]);
                assert!(matches!(ast.get(*body).kind, NodeKind::FnInvoke { .. }));
            }
            other => panic!("expected fn, got {:?}", other),
        }
    }

    #[test]
    fn test_let_without_params_is_nullary() {
        let (ast, root) = parse_ok(b"let x \"A\"");
        let stmts = doc_stmts(&ast, root);
        match &ast.get(stmts[0]).kind {
            NodeKind::Fn { params, .. } => assert!(params.is_empty()),
            other => panic!("expected fn, got {:?}", other),
        }
    }

    #[test]
    fn test_var_statement() {
        let (ast, root) = parse_ok(b"var greeting \"hi\"");
        let stmts = doc_stmts(&ast, root);
        match &ast.get(stmts[0]).kind {
            NodeKind::Var { name, body } => {
                assert_eq!(*name, Symbol::intern(b"greeting"));
                assert_eq!(str_value(&ast, *body), b"hi");
            }
            other => panic!("expected var, got {:?}", other),
        }
    }

    #[test]
    fn test_drop_forms() {
        for (source, arity) in [
            (&b"drop x"[..], 0),
            (&b"drop x()"[..], 0),
            (&b"drop f(a)"[..], 1),
            (&b"drop f(a, b)"[..], 2),
        ] {
            let (ast, root) = parse_ok(source);
            let stmts = doc_stmts(&ast, root);
            match &ast.get(stmts[0]).kind {
                NodeKind::Drop { target } => match &ast.get(*target).kind {
                    NodeKind::FnInvoke { args, .. } => assert_eq!(args.len(), arity),
                    other => panic!("expected invoke target, got {:?}", other),
                },
                other => panic!("expected drop, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_drop_intrinsic_rejected() {
        let err = parse_err(b"drop slice(a, b, c)");
        assert!(err.message.contains("cannot drop intrinsic"));
    }

    #[test]
    fn test_drop_placeholder_must_be_ident() {
        let err = parse_err(b"drop f(\"x\")");
        assert!(err.message.contains("placeholder"));
    }

    #[test]
    fn test_prefix_statement() {
        let (ast, root) = parse_ok(b"prefix \"a/\" { let f(x) x }");
        let stmts = doc_stmts(&ast, root);
        match &ast.get(stmts[0]).kind {
            NodeKind::Prefix { exprs, stmts } => {
                assert_eq!(exprs.len(), 1);
                assert_eq!(stmts.len(), 1);
            }
            other => panic!("expected prefix, got {:?}", other),
        }
    }

    // ==================== EXPRESSIONS ====================

    #[test]
    fn test_concat_is_right_associative() {
        let (ast, root) = parse_ok(b"\"a\" .. \"b\" .. \"c\"");
        let stmts = doc_stmts(&ast, root);
        match &ast.get(stmts[0]).kind {
            NodeKind::Cat { lhs, rhs } => {
                assert_eq!(str_value(&ast, *lhs), b"a");
                // The right side is itself a concat of b and c.
                match &ast.get(*rhs).kind {
                    NodeKind::Cat { lhs, rhs } => {
                        assert_eq!(str_value(&ast, *lhs), b"b");
                        assert_eq!(str_value(&ast, *rhs), b"c");
                    }
                    other => panic!("expected nested cat, got {:?}", other),
                }
            }
            other => panic!("expected cat, got {:?}", other),
        }
    }

    #[test]
    fn test_invoke_with_arguments() {
        let (ast, root) = parse_ok(b"greet(\"world\", name)");
        let stmts = doc_stmts(&ast, root);
        match &ast.get(stmts[0]).kind {
            NodeKind::FnInvoke { name, args } => {
                assert_eq!(*name, Symbol::intern(b"greet"));
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected invoke, got {:?}", other),
        }
    }

    #[test]
    fn test_bare_ident_is_nullary_invoke() {
        let (ast, root) = parse_ok(b"name");
        let stmts = doc_stmts(&ast, root);
        match &ast.get(stmts[0]).kind {
            NodeKind::FnInvoke { args, .. } => assert!(args.is_empty()),
            other => panic!("expected invoke, got {:?}", other),
        }
    }

    #[test]
    fn test_intrinsic_callee_rewritten_in_place() {
        let (ast, root) = parse_ok(b"length(\"abc\")");
        let stmts = doc_stmts(&ast, root);
        match &ast.get(stmts[0]).kind {
            NodeKind::Intrinsic { kind, args } => {
                assert_eq!(*kind, IntrinsicKind::Length);
                assert_eq!(args.len(), 1);
            }
            other => panic!("expected intrinsic, got {:?}", other),
        }
    }

    #[test]
    fn test_block_with_trailing_expression() {
        let (ast, root) = parse_ok(b"{ let x \"A\" x }");
        let stmts = doc_stmts(&ast, root);
        match &ast.get(stmts[0]).kind {
            NodeKind::Block { stmts, expr } => {
                assert_eq!(stmts.len(), 1);
                assert!(ast.get(*expr).kind.is_expression());
            }
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn test_map_with_arms_and_default() {
        let (ast, root) = parse_ok(b"map \"b\" { \"a\" -> \"1\" \"b\" -> \"2\" * -> \"3\" }");
        let stmts = doc_stmts(&ast, root);
        match &ast.get(stmts[0]).kind {
            NodeKind::Map {
                arms, default, ..
            } => {
                assert_eq!(arms.len(), 2);
                assert!(default.is_some());
            }
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn test_map_without_default() {
        let (ast, root) = parse_ok(b"map x { \"a\" -> \"1\" }");
        let stmts = doc_stmts(&ast, root);
        match &ast.get(stmts[0]).kind {
            NodeKind::Map { default, .. } => assert!(default.is_none()),
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn test_codeify() {
        let (ast, root) = parse_ok(b"= \"f(\\\"a\\\")\"");
        let stmts = doc_stmts(&ast, root);
        assert!(matches!(ast.get(stmts[0]).kind, NodeKind::Codeify { .. }));
    }

    #[test]
    fn test_stringify() {
        let (ast, root) = parse_ok(b"!greet");
        let stmts = doc_stmts(&ast, root);
        assert_eq!(str_value(&ast, stmts[0]), b"greet");
    }

    #[test]
    fn test_stringify_qualified_name() {
        let (ast, root) = parse_ok(b"!a/f");
        let stmts = doc_stmts(&ast, root);
        assert_eq!(str_value(&ast, stmts[0]), b"a/f");
    }

    // ==================== STRING LITERALS ====================

    #[test]
    fn test_normal_string_escapes() {
        let (ast, root) = parse_ok(b"\"\\x48\\x69\"");
        let stmts = doc_stmts(&ast, root);
        assert_eq!(str_value(&ast, stmts[0]), b"Hi");
    }

    #[test]
    fn test_raw_string_no_escapes() {
        let (ast, root) = parse_ok(b"r#\"a\\nb\"#");
        let stmts = doc_stmts(&ast, root);
        assert_eq!(str_value(&ast, stmts[0]), b"a\\nb");
    }

    #[test]
    fn test_paragraph_string() {
        let (ast, root) = parse_ok(b"p\" lots \n of\t\tspace \"");
        let stmts = doc_stmts(&ast, root);
        assert_eq!(str_value(&ast, stmts[0]), b"lots of space");
    }

    #[test]
    fn test_code_string_dedents() {
        let (ast, root) = parse_ok(b"c#\"   int x = 1;\n   int y = 2;\n\"#");
        let stmts = doc_stmts(&ast, root);
        assert_eq!(str_value(&ast, stmts[0]), b"int x = 1;\nint y = 2;");
    }

    #[test]
    fn test_hex_string() {
        let (ast, root) = parse_ok(b"x\"48_69\"");
        let stmts = doc_stmts(&ast, root);
        assert_eq!(str_value(&ast, stmts[0]), b"Hi");
    }

    #[test]
    fn test_bin_string() {
        let (ast, root) = parse_ok(b"b\"0100_1000\"");
        let stmts = doc_stmts(&ast, root);
        assert_eq!(str_value(&ast, stmts[0]), b"H");
    }

    #[test]
    fn test_hex_string_invalid_digit() {
        let err = parse_err(b"x\"4G\"");
        assert!(err.message.contains("invalid digit"));
    }

    #[test]
    fn test_bin_string_invalid_digit() {
        let err = parse_err(b"b\"012\"");
        assert!(err.message.contains("invalid digit"));
    }

    // ==================== PARSE ERRORS ====================

    #[test]
    fn test_missing_ident_after_let() {
        let err = parse_err(b"let \"x\"");
        assert!(err.message.contains("expected identifier"));
    }

    #[test]
    fn test_keyword_as_param() {
        let err = parse_err(b"let f(map) x");
        assert!(err.message.contains("parameter name"));
    }

    #[test]
    fn test_duplicate_param() {
        let err = parse_err(b"let f(x, x) x");
        assert!(err.message.contains("duplicate parameter"));
    }

    #[test]
    fn test_missing_rparen() {
        let err = parse_err(b"f(\"a\"");
        assert!(err.message.contains("expected ')'"));
    }

    #[test]
    fn test_block_without_trailing_expression() {
        let err = parse_err(b"{ let x \"A\" }");
        assert!(err.message.contains("block must end with an expression"));
    }

    #[test]
    fn test_empty_block() {
        let err = parse_err(b"{ }");
        assert!(err.message.contains("block must end with an expression"));
    }

    #[test]
    fn test_map_missing_test_expression() {
        let err = parse_err(b"map { \"a\" -> \"1\" }");
        assert!(err.message.contains("expression to test"));
    }

    #[test]
    fn test_map_missing_arrow() {
        let err = parse_err(b"map x { \"a\" \"1\" }");
        assert!(err.message.contains("expected '->'"));
    }

    #[test]
    fn test_arrow_outside_map() {
        let err = parse_err(b"-> \"x\"");
        assert!(err.message.contains("'->' outside a map"));
    }

    #[test]
    fn test_duplicate_default_arm() {
        let err = parse_err(b"map x { * -> \"1\" * -> \"2\" }");
        assert!(err.message.contains("default arm"));
    }

    #[test]
    fn test_unclosed_brace() {
        let err = parse_err(b"{ \"x\" ");
        assert!(err.message.contains("close block"));
    }

    // ==================== FRAGMENTS ====================

    #[test]
    fn test_parse_fragment_expression() {
        let mut ast = Ast::new();
        let id = parse_fragment(b"\"a\" .. \"b\"", FileId(0), &mut ast).unwrap();
        assert!(matches!(ast.get(id).kind, NodeKind::Cat { .. }));
    }

    #[test]
    fn test_parse_fragment_rejects_trailing_tokens() {
        let mut ast = Ast::new();
        let err = parse_fragment(b"\"a\" \"b\"", FileId(0), &mut ast).unwrap_err();
        assert!(err.message.contains("expected end of input"));
    }

    #[test]
    fn test_fragments_share_store() {
        let mut ast = Ast::new();
        let first = parse(b"let f(x) x", FileId(0), &mut ast).unwrap();
        let before = ast.len();
        let second = parse_fragment(b"f(\"a\")", FileId(1), &mut ast).unwrap();
        assert!(ast.len() > before);
        // Earlier nodes are untouched by the later parse.
        assert!(matches!(ast.get(first).kind, NodeKind::Document(_)));
        assert!(matches!(ast.get(second).kind, NodeKind::FnInvoke { .. }));
    }
}
