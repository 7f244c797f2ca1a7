//! Recursive-descent parser producing a tree through [`talus_tree::Builder`]
//! (spec.md §4.H, component H).
//!
//! Grammar shape (`fn`/`module`/`return`, attribute lists) follows
//! `original_source/lib/src/ast/function.c` and `.../module.c`'s child-index
//! contract: a TLC's name sits at child 1, its `TYPE_FUNCTION` is searched
//! from child 2, its body from child 3. Error recovery follows spec.md
//! §4.H: every non-terminal entry point pairs `node_start`/`node_end`,
//! and a failed non-terminal becomes an `ERROR` node rather than aborting
//! the parse.

use crate::kind::{NodeKind, TokenKind};
use crate::lexer::Lexer;
use std::sync::Arc;
use talus_diag::Diagnostic;
use talus_diag::Location;
use talus_pool::Pool;
use talus_text::Source;
use talus_tree::{Builder, ElementCache, RootedElement};

/// The result of [`parse_root`]: a total syntax tree (its root is always
/// `ROOT`, spec.md §8 property 6) plus every diagnostic emitted while
/// building it, lexer diagnostics first.
pub struct Parse<'pool> {
    pub root: RootedElement<'pool>,
    pub diagnostics: Vec<Diagnostic>,
}

struct Parser<'cache> {
    lexer: Lexer,
    builder: Builder<'cache>,
    diagnostics: Vec<Diagnostic>,
    source: Arc<Source>,
}

/// Tokens that can start an expression — used to tell "expected a
/// statement" apart from "expected a primary expression" (the former
/// fires before an expression is even attempted). There is no unary
/// operator in the grammar, so a leading `-` is not among these: it falls
/// through to `parse_primary`'s "expected a binary operation" diagnostic.
fn starts_expression(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier
            | TokenKind::IntegerLiteral
            | TokenKind::CharLiteral
            | TokenKind::StringLiteral
            | TokenKind::ParenthesesLeft
    )
}

/// Binding powers for the binary operators, left-associative throughout:
/// equality binds loosest, then relational, then additive, then
/// multiplicative.
fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8)> {
    Some(match kind {
        TokenKind::EqualEqual | TokenKind::BangEqual => (1, 2),
        TokenKind::Less | TokenKind::LessEqual | TokenKind::Greater | TokenKind::GreaterEqual => {
            (3, 4)
        }
        TokenKind::Plus | TokenKind::Minus => (5, 6),
        TokenKind::Star | TokenKind::Slash => (7, 8),
        _ => return None,
    })
}

impl<'cache> Parser<'cache> {
    fn new(cache: &'cache ElementCache, source: Arc<Source>) -> Self {
        Self {
            lexer: Lexer::new(source.clone()),
            builder: Builder::new(cache),
            diagnostics: Vec::new(),
            source,
        }
    }

    fn current(&mut self) -> TokenKind {
        self.lexer.peek().kind
    }

    fn here(&mut self) -> Location {
        let span = self.lexer.peek().span;
        self.source.location(span.start, span.len())
    }

    fn bump(&mut self) {
        let token = self.lexer.advance();
        self.builder.token(token.kind.into(), token.text);
    }

    /// Emits `Expected{identifier, got}` and inserts a zero-width `ERROR`
    /// node occupying the missing-name slot, without consuming the
    /// current token — whatever the grammar expects next (a parameter
    /// list, a block) still needs it. Matches spec.md scenario S2: `fn ()
    /// { }`'s name slot is an `ERROR` node, and `(` still opens the type.
    fn missing_identifier(&mut self) {
        let at = self.here();
        let got = self.current().display_name();
        self.diagnostics.push(Diagnostic::Expected {
            expected: TokenKind::Identifier.display_name(),
            got,
            at,
        });
        self.builder.node_start(NodeKind::Error.into());
        self.builder.node_end();
    }

    /// Emits `Expected{kind, got}` for a missing terminal (a delimiter or
    /// punctuation token). No `ERROR` node: a terminal mismatch isn't a
    /// missing non-terminal, and the token is left for an outer recovery
    /// point to deal with.
    fn expected_terminal(&mut self, kind: TokenKind) {
        let at = self.here();
        let got = self.current().display_name();
        self.diagnostics
            .push(Diagnostic::Expected { expected: kind.display_name(), got, at });
    }

    /// Emits `diag` and inserts an `ERROR` node spanning exactly the
    /// current token, consuming it. Used at recovery points that must
    /// make forward progress (top-level constructs, statements, primary
    /// expressions) so the parser never loops on the same stray token.
    fn skip_one(&mut self, diag: Diagnostic) {
        self.diagnostics.push(diag);
        self.builder.node_start(NodeKind::Error.into());
        if self.current() != TokenKind::Eof {
            self.bump();
        }
        self.builder.node_end();
    }

    fn parse_tlc(&mut self) {
        self.parse_attributes();
        match self.current() {
            TokenKind::Fn => self.parse_function(),
            TokenKind::Module => self.parse_module(),
            _ => {
                let at = self.here();
                self.skip_one(Diagnostic::ExpectedTopLevel { at });
            }
        }
    }

    /// Parses zero or more `@name(arg, ...)` attributes as siblings
    /// preceding the TLC they annotate (`original_source/.../attribute.c`'s
    /// attribute-list shape, flattened: each `Attr` is its own element
    /// rather than nested inside the TLC, so the TLC's own child indices
    /// stay stable).
    fn parse_attributes(&mut self) {
        let mut seen_default = false;
        while self.current() == TokenKind::At {
            let attr_at = self.here();
            self.builder.node_start(NodeKind::Attr.into());
            self.bump(); // '@'

            let name = self.lexer.peek().text.clone();
            if self.current() == TokenKind::Identifier {
                self.bump();
            } else {
                self.missing_identifier();
            }

            if self.current() == TokenKind::ParenthesesLeft {
                self.bump();
                while !matches!(self.current(), TokenKind::ParenthesesRight | TokenKind::Eof) {
                    self.parse_attr_argument();
                    if self.current() == TokenKind::Comma {
                        self.bump();
                    } else {
                        break;
                    }
                }
                if self.current() == TokenKind::ParenthesesRight {
                    self.bump();
                } else {
                    self.expected_terminal(TokenKind::ParenthesesRight);
                }
            }

            self.builder.node_end(); // Attr

            if name.as_ref().and_then(|t| t.as_str().ok()) == Some("default") {
                if seen_default {
                    self.diagnostics.push(Diagnostic::DuplicateDefault { at: attr_at });
                }
                seen_default = true;
            }
        }
    }

    fn parse_attr_argument(&mut self) {
        match self.current() {
            TokenKind::Identifier
            | TokenKind::IntegerLiteral
            | TokenKind::StringLiteral
            | TokenKind::CharLiteral => {
                self.builder.node_start(NodeKind::AttrArgument.into());
                self.bump();
                self.builder.node_end();
            }
            _ => {
                let at = self.here();
                self.skip_one(Diagnostic::ExpectedAttributeArgument { at });
            }
        }
    }

    /// `fn` IDENT `(` params `)` (`->` IDENT)? block. Child layout: `fn`
    /// token (0), name (1), `TYPE_FUNCTION` (2), body block (3) — see
    /// `ast_node_function_{name,type,body}` in `function.c`.
    fn parse_function(&mut self) {
        self.builder.node_start(NodeKind::TlcFunction.into());
        self.bump(); // 'fn'

        if self.current() == TokenKind::Identifier {
            self.bump();
        } else {
            self.missing_identifier();
        }

        self.parse_type_function();
        self.parse_block();

        self.builder.node_end();
    }

    fn parse_type_function(&mut self) {
        self.builder.node_start(NodeKind::TypeFunction.into());

        if self.current() == TokenKind::ParenthesesLeft {
            self.bump();
        } else {
            self.expected_terminal(TokenKind::ParenthesesLeft);
        }

        self.parse_param_list();

        if self.current() == TokenKind::ParenthesesRight {
            self.bump();
        } else {
            self.expected_terminal(TokenKind::ParenthesesRight);
        }

        if self.current() == TokenKind::Arrow {
            self.bump();
            if self.current() == TokenKind::Identifier {
                self.bump();
            } else {
                self.missing_identifier();
            }
        }

        self.builder.node_end();
    }

    fn parse_param_list(&mut self) {
        self.builder.node_start(NodeKind::ParamList.into());
        while !matches!(self.current(), TokenKind::ParenthesesRight | TokenKind::Eof) {
            if self.current() != TokenKind::Identifier {
                self.missing_identifier();
                break;
            }
            self.parse_param();
            if self.current() == TokenKind::Comma {
                self.bump();
            } else {
                break;
            }
        }
        self.builder.node_end();
    }

    fn parse_param(&mut self) {
        self.builder.node_start(NodeKind::Param.into());
        self.bump(); // name, already checked by the caller

        if self.current() == TokenKind::Colon {
            self.bump();
            if self.current() == TokenKind::Identifier {
                self.bump();
            } else {
                self.missing_identifier();
            }
        } else {
            self.expected_terminal(TokenKind::Colon);
        }

        self.builder.node_end();
    }

    /// `module` IDENT `{` TLC* `}`. Child layout mirrors `parse_function`:
    /// `module` token (0), name (1), nested TLCs follow
    /// (`ast_node_module_name` in `module.c`).
    fn parse_module(&mut self) {
        self.builder.node_start(NodeKind::TlcModule.into());
        self.bump(); // 'module'

        let name = self.lexer.peek().text.clone();
        if self.current() == TokenKind::Identifier {
            self.bump();
        } else {
            self.missing_identifier();
        }

        if self.current() == TokenKind::BraceLeft {
            self.bump();
        } else {
            self.expected_terminal(TokenKind::BraceLeft);
        }

        while !matches!(self.current(), TokenKind::BraceRight | TokenKind::Eof) {
            self.parse_tlc();
        }

        if self.current() == TokenKind::BraceRight {
            self.bump();
        } else {
            let at = self.here();
            let name = name.and_then(|t| t.as_str().ok().map(str::to_owned)).unwrap_or_default();
            self.diagnostics.push(Diagnostic::UnfinishedModule { name, at });
        }

        self.builder.node_end();
    }

    fn parse_block(&mut self) {
        self.builder.node_start(NodeKind::StmtBlock.into());

        if self.current() == TokenKind::BraceLeft {
            self.bump();
        } else {
            self.expected_terminal(TokenKind::BraceLeft);
        }

        while !matches!(self.current(), TokenKind::BraceRight | TokenKind::Eof) {
            self.parse_statement();
        }

        if self.current() == TokenKind::BraceRight {
            self.bump();
        } else {
            self.expected_terminal(TokenKind::BraceRight);
        }

        self.builder.node_end();
    }

    fn parse_statement(&mut self) {
        match self.current() {
            TokenKind::Return => self.parse_return_stmt(),
            kind if starts_expression(kind) => self.parse_expr_stmt(),
            _ => {
                let at = self.here();
                self.skip_one(Diagnostic::ExpectedStatement { at });
            }
        }
    }

    fn parse_return_stmt(&mut self) {
        self.builder.node_start(NodeKind::StmtReturn.into());
        self.bump(); // 'return'

        if starts_expression(self.current()) {
            self.parse_expr(0);
        }

        if self.current() == TokenKind::Semicolon {
            self.bump();
        } else {
            self.expected_terminal(TokenKind::Semicolon);
        }

        self.builder.node_end();
    }

    fn parse_expr_stmt(&mut self) {
        self.builder.node_start(NodeKind::StmtExpr.into());
        self.parse_expr(0);

        if self.current() == TokenKind::Semicolon {
            self.bump();
        } else {
            self.expected_terminal(TokenKind::Semicolon);
        }

        self.builder.node_end();
    }

    /// Precedence-climbing binary expression parser: a checkpoint taken
    /// before the left operand lets `node_start_at` retroactively wrap it
    /// (and any already-wrapped left chain) into `EXPR_BINARY` once an
    /// operator of sufficient binding power is seen, mirroring the
    /// teacher's `parse_expression_bp` Pratt loop generalized from
    /// juxtaposition/application to this language's infix operators.
    fn parse_expr(&mut self, min_bp: u8) {
        let checkpoint = self.builder.checkpoint();
        self.parse_primary();

        while let Some((l_bp, r_bp)) = infix_binding_power(self.current()) {
            if l_bp < min_bp {
                break;
            }
            self.builder.node_start_at(checkpoint, NodeKind::ExprBinary.into());
            self.bump(); // operator
            self.parse_expr(r_bp);
            self.builder.node_end();
        }
    }

    fn parse_primary(&mut self) {
        match self.current() {
            TokenKind::Identifier => {
                let checkpoint = self.builder.checkpoint();
                self.bump();
                if self.current() == TokenKind::ParenthesesLeft {
                    self.builder.node_start_at(checkpoint, NodeKind::ExprCall.into());
                    self.bump(); // '('
                    while !matches!(self.current(), TokenKind::ParenthesesRight | TokenKind::Eof)
                    {
                        self.parse_expr(0);
                        if self.current() == TokenKind::Comma {
                            self.bump();
                        } else {
                            break;
                        }
                    }
                    if self.current() == TokenKind::ParenthesesRight {
                        self.bump();
                    } else {
                        self.expected_terminal(TokenKind::ParenthesesRight);
                    }
                    self.builder.node_end();
                } else {
                    self.builder.node_start_at(checkpoint, NodeKind::ExprIdentifier.into());
                    self.builder.node_end();
                }
            }
            TokenKind::IntegerLiteral => {
                self.builder.node_start(NodeKind::ExprLiteralNumeric.into());
                self.bump();
                self.builder.node_end();
            }
            TokenKind::CharLiteral => {
                self.builder.node_start(NodeKind::ExprLiteralChar.into());
                self.bump();
                self.builder.node_end();
            }
            TokenKind::StringLiteral => {
                self.builder.node_start(NodeKind::ExprLiteralString.into());
                self.bump();
                self.builder.node_end();
            }
            TokenKind::ParenthesesLeft => {
                self.bump();
                self.parse_expr(0);
                if self.current() == TokenKind::ParenthesesRight {
                    self.bump();
                } else {
                    self.expected_terminal(TokenKind::ParenthesesRight);
                }
            }
            kind if infix_binding_power(kind).is_some() => {
                // A binary operator where a left operand was expected:
                // missing operand, not generic garbage.
                let at = self.here();
                self.skip_one(Diagnostic::ExpectedBinaryOperation { at });
            }
            _ => {
                let at = self.here();
                self.skip_one(Diagnostic::ExpectedPrimaryExpression { at });
            }
        }
    }
}

/// Parses `source` into a total syntax tree (spec.md §8 property 6: the
/// root is always `ROOT`, and parsing never fails outright — malformed
/// input produces `ERROR` nodes and diagnostics instead).
pub fn parse_root<'pool>(
    cache: &ElementCache,
    pool: &'pool Pool,
    source: Arc<Source>,
) -> Parse<'pool> {
    let mut parser = Parser::new(cache, source);
    parser.builder.begin(NodeKind::Root.into());

    while parser.current() != TokenKind::Eof {
        parser.parse_tlc();
    }

    let Parser { lexer, builder, diagnostics, .. } = parser;
    let mut all_diagnostics = lexer.into_diagnostics();
    all_diagnostics.extend(diagnostics);

    let root = builder.finish(pool);
    Parse { root, diagnostics: all_diagnostics }
}
