//! Token and node kind tables (spec.md §3, §6).
//!
//! Both enums are generated from a small declarative table in this file —
//! `(identifier, display name, pattern?, has_content?)` for tokens,
//! `(identifier, display name)` for nodes — so adding a kind is one line.
//! [`Kind`] packs both into `talus_tree`'s single `SyntaxKind(u16)` space
//! (tokens first, then nodes) since the element cache doesn't distinguish
//! token-space from node-space itself.

use serde::{Deserialize, Serialize};
use talus_tree::SyntaxKind;

/// A lexer pattern-table entry: `pattern` is `None` for the two sentinel
/// kinds (`Unknown`, `Eof`), which are never produced by pattern matching.
struct TokenSpec {
    display_name: &'static str,
    pattern: Option<&'static str>,
    has_content: bool,
    /// Ignored by the parser (whitespace, comments) — spec.md §4.D's
    /// `IGNORE` designation.
    ignore: bool,
}

macro_rules! token_kinds {
    ($($ident:ident { display: $display:literal $(, pattern: $pattern:literal)? $(, content: $content:expr)? $(, ignore: $ignore:expr)? }),* $(,)?) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[repr(u16)]
        pub enum TokenKind {
            $($ident,)*
        }

        impl TokenKind {
            pub const ALL: &'static [TokenKind] = &[$(TokenKind::$ident,)*];

            fn spec(self) -> &'static TokenSpec {
                const TABLE: &[TokenSpec] = &[
                    $(TokenSpec {
                        display_name: $display,
                        pattern: token_kinds!(@pattern $($pattern)?),
                        has_content: token_kinds!(@bool $($content)?),
                        ignore: token_kinds!(@bool $($ignore)?),
                    },)*
                ];
                &TABLE[self as usize]
            }
        }
    };
    (@pattern) => { None };
    (@pattern $p:literal) => { Some($p) };
    (@bool) => { false };
    (@bool $b:expr) => { $b };
}

// Ordered first-match-wins lexer spec (spec.md §4.D): the three `IGNORE`
// comment/whitespace forms come first, then the token table. Keyword
// patterns precede `Identifier` so e.g. `fn` is matched as a keyword, not
// as an identifier whose pattern would also match it.
token_kinds! {
    Whitespace { display: "whitespace", pattern: r"\A[ \t\r\n]+", ignore: true },
    LineComment { display: "line comment", pattern: r"\A//[^\n]*", ignore: true },
    BlockComment { display: "block comment", pattern: r"(?s)\A/\*.*?\*/", ignore: true },
    HashComment { display: "comment", pattern: r"\A#[^\n]*", ignore: true },

    Fn { display: "'fn'", pattern: r"\Afn\b" },
    Module { display: "'module'", pattern: r"\Amodule\b" },
    Return { display: "'return'", pattern: r"\Areturn\b" },

    Arrow { display: "'->'", pattern: r"\A->" },
    EqualEqual { display: "'=='", pattern: r"\A==" },
    BangEqual { display: "'!='", pattern: r"\A!=" },
    LessEqual { display: "'<='", pattern: r"\A<=" },
    GreaterEqual { display: "'>='", pattern: r"\A>=" },
    Equal { display: "'='", pattern: r"\A=" },
    Less { display: "'<'", pattern: r"\A<" },
    Greater { display: "'>'", pattern: r"\A>" },
    Plus { display: "'+'", pattern: r"\A\+" },
    Minus { display: "'-'", pattern: r"\A-" },
    Star { display: "'*'", pattern: r"\A\*" },
    Slash { display: "'/'", pattern: r"\A/" },
    At { display: "'@'", pattern: r"\A@" },
    Comma { display: "','", pattern: r"\A," },
    Colon { display: "':'", pattern: r"\A:" },
    Semicolon { display: "';'", pattern: r"\A;" },
    ParenthesesLeft { display: "'('", pattern: r"\A\(" },
    ParenthesesRight { display: "')'", pattern: r"\A\)" },
    BraceLeft { display: "'{'", pattern: r"\A\{" },
    BraceRight { display: "'}'", pattern: r"\A\}" },

    CharLiteral { display: "character literal", pattern: r"\A'([^'\\]|\\.)*'", content: true },
    StringLiteral { display: "string literal", pattern: r#"\A"([^"\\]|\\.)*""#, content: true },
    IntegerLiteral { display: "numeric literal", pattern: r"\A[0-9][0-9_]*", content: true },
    Identifier { display: "identifier", pattern: r"\A[A-Za-z_][A-Za-z0-9_]*", content: true },

    Unknown { display: "unknown token" },
    Eof { display: "end of file" },
}

impl TokenKind {
    pub fn display_name(self) -> &'static str {
        self.spec().display_name
    }

    pub fn pattern(self) -> Option<&'static str> {
        self.spec().pattern
    }

    pub fn has_content(self) -> bool {
        self.spec().has_content
    }

    pub fn is_ignore(self) -> bool {
        self.spec().ignore
    }

    fn from_u16(raw: u16) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }
}

macro_rules! node_kinds {
    ($($ident:ident => $display:literal),* $(,)?) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[repr(u16)]
        pub enum NodeKind {
            $($ident,)*
        }

        impl NodeKind {
            pub const ALL: &'static [NodeKind] = &[$(NodeKind::$ident,)*];

            pub fn display_name(self) -> &'static str {
                match self {
                    $(NodeKind::$ident => $display,)*
                }
            }

            fn from_u16(raw: u16) -> Option<Self> {
                Self::ALL.get(raw as usize).copied()
            }
        }
    };
}

node_kinds! {
    Root => "module root",
    TlcModule => "module",
    TlcFunction => "function",
    TypeFunction => "function type",
    ParamList => "parameter list",
    Param => "parameter",
    Attr => "attribute",
    AttrArgument => "attribute argument",
    StmtBlock => "block",
    StmtReturn => "return statement",
    StmtExpr => "expression statement",
    ExprBinary => "binary expression",
    ExprLiteralNumeric => "numeric literal",
    ExprLiteralChar => "character literal",
    ExprLiteralString => "string literal",
    ExprIdentifier => "identifier expression",
    ExprCall => "call expression",
    Error => "error",
}

/// Either a token or a node kind, packed into `talus_tree`'s flat
/// `SyntaxKind(u16)` numbering space: tokens occupy `0..TOKEN_COUNT`,
/// nodes occupy `TOKEN_COUNT..`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Token(TokenKind),
    Node(NodeKind),
}

impl Kind {
    pub fn into_raw(self) -> SyntaxKind {
        let n = TokenKind::ALL.len() as u16;
        match self {
            Kind::Token(t) => SyntaxKind::new(t as u16),
            Kind::Node(k) => SyntaxKind::new(n + k as u16),
        }
    }

    pub fn from_raw(raw: SyntaxKind) -> Self {
        let n = TokenKind::ALL.len() as u16;
        let raw = raw.into_raw();
        if raw < n {
            Kind::Token(TokenKind::from_u16(raw).expect("raw kind within token range"))
        } else {
            Kind::Node(NodeKind::from_u16(raw - n).expect("raw kind within node range"))
        }
    }

    pub fn is_node(self) -> bool {
        matches!(self, Kind::Node(_))
    }

    pub fn is_token(self) -> bool {
        matches!(self, Kind::Token(_))
    }
}

impl From<TokenKind> for Kind {
    fn from(t: TokenKind) -> Self {
        Kind::Token(t)
    }
}

impl From<NodeKind> for Kind {
    fn from(n: NodeKind) -> Self {
        Kind::Node(n)
    }
}

impl From<TokenKind> for SyntaxKind {
    fn from(t: TokenKind) -> Self {
        Kind::Token(t).into_raw()
    }
}

impl From<NodeKind> for SyntaxKind {
    fn from(n: NodeKind) -> Self {
        Kind::Node(n).into_raw()
    }
}
