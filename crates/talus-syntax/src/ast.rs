//! Thin, zero-cost AST view wrappers over [`Element`] handles (spec.md
//! §4.H, the typed layer above the untyped tree).
//!
//! Accessors search children by position, the way
//! `ast_node_function_name`/`_type`/`_body` in the original `function.c`
//! and `ast_node_module_name` in `module.c` do: a fixed-shape node
//! (`Param`, `ExprBinary`, `ExprCall`) indexes its children directly,
//! while a node that can carry recovery cruft ahead of its real children
//! (`TlcFunction`, `TlcModule`) searches by kind instead, so an inserted
//! `ERROR` node never shifts an unrelated accessor's index.

use crate::kind::{Kind, NodeKind, TokenKind};
use talus_text::Text;
use talus_tree::Element;

fn child_of_kind(element: &Element, kind: NodeKind) -> Option<Element> {
    element
        .children()
        .iter()
        .find(|c| Kind::from_raw(c.kind()) == Kind::Node(kind))
        .cloned()
}

fn token_of_kind(element: &Element, kind: TokenKind) -> Option<Element> {
    element
        .children()
        .iter()
        .find(|c| Kind::from_raw(c.kind()) == Kind::Token(kind))
        .cloned()
}

macro_rules! ast_node {
    ($name:ident, $kind:expr) => {
        #[derive(Clone)]
        pub struct $name(Element);

        impl $name {
            pub fn cast(element: Element) -> Option<Self> {
                (Kind::from_raw(element.kind()) == Kind::Node($kind)).then(|| Self(element))
            }

            pub fn syntax(&self) -> &Element {
                &self.0
            }
        }
    };
}

ast_node!(Root, NodeKind::Root);
ast_node!(TlcFunction, NodeKind::TlcFunction);
ast_node!(TlcModule, NodeKind::TlcModule);
ast_node!(TypeFunction, NodeKind::TypeFunction);
ast_node!(ParamList, NodeKind::ParamList);
ast_node!(Param, NodeKind::Param);
ast_node!(Attr, NodeKind::Attr);
ast_node!(AttrArgument, NodeKind::AttrArgument);
ast_node!(StmtBlock, NodeKind::StmtBlock);
ast_node!(StmtReturn, NodeKind::StmtReturn);
ast_node!(StmtExprNode, NodeKind::StmtExpr);
ast_node!(ExprBinary, NodeKind::ExprBinary);
ast_node!(ExprLiteralNumeric, NodeKind::ExprLiteralNumeric);
ast_node!(ExprLiteralChar, NodeKind::ExprLiteralChar);
ast_node!(ExprLiteralString, NodeKind::ExprLiteralString);
ast_node!(ExprIdentifier, NodeKind::ExprIdentifier);
ast_node!(ExprCall, NodeKind::ExprCall);
ast_node!(ErrorNode, NodeKind::Error);

/// A top-level construct: a function, a module, or a recovery `ERROR`
/// node standing in for a construct that failed to parse.
#[derive(Clone)]
pub enum Tlc {
    Function(TlcFunction),
    Module(TlcModule),
    Error(ErrorNode),
}

#[derive(Clone)]
pub enum Stmt {
    Return(StmtReturn),
    Expr(StmtExprNode),
    Error(ErrorNode),
}

#[derive(Clone)]
pub enum Expr {
    Binary(ExprBinary),
    LiteralNumeric(ExprLiteralNumeric),
    LiteralChar(ExprLiteralChar),
    LiteralString(ExprLiteralString),
    Identifier(ExprIdentifier),
    Call(ExprCall),
    Error(ErrorNode),
}

fn cast_tlc(element: Element) -> Option<Tlc> {
    match Kind::from_raw(element.kind()) {
        Kind::Node(NodeKind::TlcFunction) => Some(Tlc::Function(TlcFunction(element))),
        Kind::Node(NodeKind::TlcModule) => Some(Tlc::Module(TlcModule(element))),
        Kind::Node(NodeKind::Error) => Some(Tlc::Error(ErrorNode(element))),
        _ => None,
    }
}

fn cast_stmt(element: Element) -> Option<Stmt> {
    match Kind::from_raw(element.kind()) {
        Kind::Node(NodeKind::StmtReturn) => Some(Stmt::Return(StmtReturn(element))),
        Kind::Node(NodeKind::StmtExpr) => Some(Stmt::Expr(StmtExprNode(element))),
        Kind::Node(NodeKind::Error) => Some(Stmt::Error(ErrorNode(element))),
        _ => None,
    }
}

fn cast_expr(element: Element) -> Option<Expr> {
    match Kind::from_raw(element.kind()) {
        Kind::Node(NodeKind::ExprBinary) => Some(Expr::Binary(ExprBinary(element))),
        Kind::Node(NodeKind::ExprLiteralNumeric) => {
            Some(Expr::LiteralNumeric(ExprLiteralNumeric(element)))
        }
        Kind::Node(NodeKind::ExprLiteralChar) => Some(Expr::LiteralChar(ExprLiteralChar(element))),
        Kind::Node(NodeKind::ExprLiteralString) => {
            Some(Expr::LiteralString(ExprLiteralString(element)))
        }
        Kind::Node(NodeKind::ExprIdentifier) => Some(Expr::Identifier(ExprIdentifier(element))),
        Kind::Node(NodeKind::ExprCall) => Some(Expr::Call(ExprCall(element))),
        Kind::Node(NodeKind::Error) => Some(Expr::Error(ErrorNode(element))),
        _ => None,
    }
}

impl Root {
    pub fn items(&self) -> impl Iterator<Item = Tlc> + '_ {
        self.0.children().iter().cloned().filter_map(cast_tlc)
    }
}

impl TlcFunction {
    pub fn name(&self) -> Option<Text> {
        token_of_kind(&self.0, TokenKind::Identifier).and_then(|t| t.text().cloned())
    }

    pub fn type_function(&self) -> Option<TypeFunction> {
        child_of_kind(&self.0, NodeKind::TypeFunction).map(TypeFunction)
    }

    pub fn body(&self) -> Option<StmtBlock> {
        child_of_kind(&self.0, NodeKind::StmtBlock).map(StmtBlock)
    }
}

impl TlcModule {
    pub fn name(&self) -> Option<Text> {
        token_of_kind(&self.0, TokenKind::Identifier).and_then(|t| t.text().cloned())
    }

    /// The module's nested top-level constructs, in source order.
    pub fn items(&self) -> impl Iterator<Item = Tlc> + '_ {
        self.0.children().iter().cloned().filter_map(cast_tlc)
    }
}

impl TypeFunction {
    pub fn params(&self) -> Option<ParamList> {
        child_of_kind(&self.0, NodeKind::ParamList).map(ParamList)
    }

    /// The identifier following `->`, if this function type names a
    /// return type.
    pub fn return_type(&self) -> Option<Text> {
        token_of_kind(&self.0, TokenKind::Identifier).and_then(|t| t.text().cloned())
    }
}

impl ParamList {
    pub fn params(&self) -> impl Iterator<Item = Param> + '_ {
        self.0.children().iter().cloned().filter_map(Param::cast)
    }
}

impl Param {
    /// The parameter's own name always occupies the first child slot —
    /// the grammar only enters `parse_param` once a leading identifier has
    /// already been confirmed.
    pub fn name(&self) -> Option<Text> {
        self.0.children().first().and_then(|c| c.text().cloned())
    }

    /// The declared type, after the `:`.
    pub fn ty(&self) -> Option<Text> {
        self.0.children().get(2).and_then(|c| c.text().cloned())
    }
}

impl Attr {
    pub fn name(&self) -> Option<Text> {
        token_of_kind(&self.0, TokenKind::Identifier).and_then(|t| t.text().cloned())
    }

    pub fn arguments(&self) -> impl Iterator<Item = AttrArgument> + '_ {
        self.0
            .children()
            .iter()
            .cloned()
            .filter_map(AttrArgument::cast)
    }
}

impl AttrArgument {
    pub fn text(&self) -> Option<Text> {
        self.0.children().first().and_then(|c| c.text().cloned())
    }
}

impl StmtBlock {
    pub fn statements(&self) -> impl Iterator<Item = Stmt> + '_ {
        self.0.children().iter().cloned().filter_map(cast_stmt)
    }
}

impl StmtReturn {
    pub fn value(&self) -> Option<Expr> {
        self.0.children().iter().find_map(|c| cast_expr(c.clone()))
    }
}

impl StmtExprNode {
    pub fn expr(&self) -> Option<Expr> {
        self.0.children().iter().find_map(|c| cast_expr(c.clone()))
    }
}

impl ExprBinary {
    /// The operator sits between the (always exactly one) left and right
    /// operand nodes — the only token among this node's direct children.
    pub fn operator(&self) -> Option<TokenKind> {
        self.0
            .children()
            .iter()
            .find_map(|c| match Kind::from_raw(c.kind()) {
                Kind::Token(t) => Some(t),
                Kind::Node(_) => None,
            })
    }

    pub fn lhs(&self) -> Option<Expr> {
        self.0.children().first().cloned().and_then(cast_expr)
    }

    pub fn rhs(&self) -> Option<Expr> {
        self.0.children().get(2).cloned().and_then(cast_expr)
    }
}

impl ExprCall {
    pub fn callee(&self) -> Option<Text> {
        self.0.children().first().and_then(|c| c.text().cloned())
    }

    pub fn arguments(&self) -> impl Iterator<Item = Expr> + '_ {
        self.0.children().iter().cloned().filter_map(cast_expr)
    }
}

impl ExprLiteralNumeric {
    pub fn text(&self) -> Option<Text> {
        self.0.children().first().and_then(|c| c.text().cloned())
    }
}

impl ExprLiteralChar {
    pub fn text(&self) -> Option<Text> {
        self.0.children().first().and_then(|c| c.text().cloned())
    }
}

impl ExprLiteralString {
    pub fn text(&self) -> Option<Text> {
        self.0.children().first().and_then(|c| c.text().cloned())
    }
}

impl ExprIdentifier {
    pub fn text(&self) -> Option<Text> {
        self.0.children().first().and_then(|c| c.text().cloned())
    }
}
