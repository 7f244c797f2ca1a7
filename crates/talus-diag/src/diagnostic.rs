pub use talus_text::SourceLocation as Location;

/// A diagnostic: a kinded error value carrying a source location and a
/// kind-specific payload (spec.md §4.I, §7).
///
/// Each variant carries exactly the fields its rendering needs, resolving
/// spec.md §9's "by-value, tagged-variant form" open question in favor of
/// a plain enum over a union-with-discriminant. Locations reuse
/// `talus_text::SourceLocation` rather than redefining one here.
#[derive(Debug, Clone, thiserror::Error, miette::Diagnostic)]
pub enum Diagnostic {
    #[error("unexpected symbol")]
    #[diagnostic(code(talus::lex::unexpected_symbol))]
    UnexpectedSymbol { at: Location },

    #[error("expected {expected}, got {got}")]
    #[diagnostic(code(talus::parse::expected))]
    Expected {
        expected: &'static str,
        got: &'static str,
        at: Location,
    },

    #[error("expected a statement")]
    #[diagnostic(code(talus::parse::expected_statement))]
    ExpectedStatement { at: Location },

    #[error("expected a binary operation")]
    #[diagnostic(code(talus::parse::expected_binary_operation))]
    ExpectedBinaryOperation { at: Location },

    #[error("expected a primary expression")]
    #[diagnostic(code(talus::parse::expected_primary_expression))]
    ExpectedPrimaryExpression { at: Location },

    #[error("expected a top-level construct")]
    #[diagnostic(code(talus::parse::expected_top_level))]
    ExpectedTopLevel { at: Location },

    #[error("expected a numeric literal")]
    #[diagnostic(code(talus::parse::expected_numeric_literal))]
    ExpectedNumericLiteral { at: Location },

    #[error("expected an attribute argument")]
    #[diagnostic(code(talus::parse::expected_attribute_argument))]
    ExpectedAttributeArgument { at: Location },

    #[error("unfinished module `{name}`")]
    #[diagnostic(code(talus::parse::unfinished_module))]
    UnfinishedModule { name: String, at: Location },

    #[error("character literal holds too many characters")]
    #[diagnostic(code(talus::lex::too_large_char_literal))]
    TooLargeCharLiteral { at: Location },

    #[error("escape sequence is too large")]
    #[diagnostic(code(talus::lex::too_large_escape_sequence))]
    TooLargeEscapeSequence { at: Location },

    #[error("numeric constant is too large")]
    #[diagnostic(code(talus::lex::too_large_numeric_constant))]
    TooLargeNumericConstant { at: Location },

    #[error("character literal is empty")]
    #[diagnostic(code(talus::lex::empty_char_literal))]
    EmptyCharLiteral { at: Location },

    #[error("duplicate default")]
    #[diagnostic(code(talus::parse::duplicate_default))]
    DuplicateDefault { at: Location },

    #[error("cyclic query")]
    #[diagnostic(code(talus::query::cyclic))]
    CyclicQuery,
}

impl Diagnostic {
    /// The location this diagnostic points at, if it carries one.
    /// `CyclicQuery` has none — the query engine has no source position.
    pub fn location(&self) -> Option<&Location> {
        match self {
            Diagnostic::UnexpectedSymbol { at }
            | Diagnostic::Expected { at, .. }
            | Diagnostic::ExpectedStatement { at }
            | Diagnostic::ExpectedBinaryOperation { at }
            | Diagnostic::ExpectedPrimaryExpression { at }
            | Diagnostic::ExpectedTopLevel { at }
            | Diagnostic::ExpectedNumericLiteral { at }
            | Diagnostic::ExpectedAttributeArgument { at }
            | Diagnostic::UnfinishedModule { at, .. }
            | Diagnostic::TooLargeCharLiteral { at }
            | Diagnostic::TooLargeEscapeSequence { at }
            | Diagnostic::TooLargeNumericConstant { at }
            | Diagnostic::EmptyCharLiteral { at }
            | Diagnostic::DuplicateDefault { at } => Some(at),
            Diagnostic::CyclicQuery => None,
        }
    }
}
