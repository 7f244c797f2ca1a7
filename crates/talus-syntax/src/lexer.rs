//! Ordered, first-match-wins pattern lexer (spec.md §4.D).
//!
//! The pattern list lives in [`crate::kind::TokenKind`]'s declarative
//! table; this module only compiles it (lazily, once per process — a
//! compile failure here means a pattern in that table is malformed, which
//! is a programming error, not a runtime one) and drives the cursor.

use crate::iter::chars::Chars;
use crate::iter::peek2::Peek2;
use crate::kind::TokenKind;
use crate::span::Span;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use talus_diag::Diagnostic;
use talus_text::{Source, Text};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: Option<Text>,
}

struct CompiledPattern {
    kind: TokenKind,
    regex: Regex,
}

static PATTERNS: OnceLock<Vec<CompiledPattern>> = OnceLock::new();

fn patterns() -> &'static [CompiledPattern] {
    PATTERNS.get_or_init(|| {
        TokenKind::ALL
            .iter()
            .filter_map(|&kind| {
                let pattern = kind.pattern()?;
                let regex = Regex::new(pattern)
                    .unwrap_or_else(|e| panic!("invalid lexer pattern for {kind:?}: {e}"));
                Some(CompiledPattern { kind, regex })
            })
            .collect()
    })
}

/// A one-token-lookahead cursor over a source's tokens. Diagnostics
/// accumulate as tokens are produced; there is no backtracking beyond the
/// single buffered lookahead token.
pub struct Lexer {
    source: Arc<Source>,
    offset: usize,
    lookahead: Option<Token>,
    diagnostics: Vec<Diagnostic>,
}

impl Lexer {
    pub fn new(source: Arc<Source>) -> Self {
        Self {
            source,
            offset: 0,
            lookahead: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn peek(&mut self) -> &Token {
        if self.lookahead.is_none() {
            let token = self.scan_next();
            self.lookahead = Some(token);
        }
        self.lookahead.as_ref().unwrap()
    }

    pub fn advance(&mut self) -> Token {
        self.peek();
        self.lookahead.take().unwrap()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// `tokenize_step` (spec.md §4.D): finds the first matching pattern at
    /// the cursor, looping past ignored (whitespace/comment) matches and
    /// past unmatched bytes (each of which emits `UnexpectedSymbol` and
    /// advances by one byte), until a content token or `EOF` is produced.
    fn scan_next(&mut self) -> Token {
        let text = self.source.text().as_str().expect("source text is UTF-8");
        loop {
            if self.offset >= text.len() {
                return Token {
                    kind: TokenKind::Eof,
                    span: Span::new(self.offset, self.offset),
                    text: None,
                };
            }

            let remaining = &text[self.offset..];
            let found = patterns().iter().find_map(|p| {
                let m = p.regex.find(remaining)?;
                (!m.as_str().is_empty()).then_some((p.kind, m.end()))
            });

            let Some((kind, len)) = found else {
                let at = self.source.location(self.offset, 1);
                self.diagnostics.push(Diagnostic::UnexpectedSymbol { at });
                self.offset += 1;
                continue;
            };

            let start = self.offset;
            let end = start + len;
            self.offset = end;

            if kind.is_ignore() {
                continue;
            }

            let matched = &text[start..end];
            self.validate_literal(kind, start, matched);

            let token_text = kind.has_content().then(|| Text::from(matched));
            return Token {
                kind,
                span: Span::new(start, end),
                text: token_text,
            };
        }
    }

    fn validate_literal(&mut self, kind: TokenKind, start: usize, matched: &str) {
        match kind {
            TokenKind::CharLiteral => {
                let inner = &matched[1..matched.len() - 1];
                if inner.is_empty() {
                    let at = self.source.location(start, matched.len());
                    self.diagnostics.push(Diagnostic::EmptyCharLiteral { at });
                    return;
                }
                let logical_chars = self.validate_escapes(inner, start + 1);
                if logical_chars > 1 {
                    let at = self.source.location(start, matched.len());
                    self.diagnostics.push(Diagnostic::TooLargeCharLiteral { at });
                }
            }
            TokenKind::StringLiteral => {
                let inner = &matched[1..matched.len() - 1];
                self.validate_escapes(inner, start + 1);
            }
            TokenKind::IntegerLiteral => {
                let digits: String = matched.chars().filter(|c| *c != '_').collect();
                if digits.parse::<u64>().is_err() {
                    let at = self.source.location(start, matched.len());
                    self.diagnostics
                        .push(Diagnostic::TooLargeNumericConstant { at });
                }
            }
            _ => {}
        }
    }

    /// Walks `inner` counting logical characters (an escape sequence
    /// counts as one) and flags oversized escape bodies (`\xHH`, at most
    /// two hex digits; `\u{...}`, at most six). Returns the logical
    /// character count.
    fn validate_escapes(&mut self, inner: &str, base_offset: usize) -> usize {
        let mut chars = Peek2::new(Chars::new(inner));
        let mut logical_chars = 0;
        while let Some(c) = chars.next() {
            logical_chars += 1;
            if c.value != '\\' {
                continue;
            }
            let Some(escape_kind) = chars.next() else {
                break;
            };
            match escape_kind.value {
                'x' => {
                    let mut digits = 0;
                    while chars.next_if(|d| d.value.is_ascii_hexdigit()).is_some() {
                        digits += 1;
                    }
                    if digits > 2 {
                        let len = escape_kind.span.end - c.span.start + digits;
                        let at = self.source.location(base_offset + c.span.start, len);
                        self.diagnostics
                            .push(Diagnostic::TooLargeEscapeSequence { at });
                    }
                }
                'u' if chars.next_if_eq('{').is_some() => {
                    let mut digits = 0;
                    while chars.next_if(|d| d.value.is_ascii_hexdigit()).is_some() {
                        digits += 1;
                    }
                    chars.next_if_eq('}');
                    if digits > 6 {
                        let len = escape_kind.span.end - c.span.start + digits;
                        let at = self.source.location(base_offset + c.span.start, len);
                        self.diagnostics
                            .push(Diagnostic::TooLargeEscapeSequence { at });
                    }
                }
                _ => {}
            }
        }
        logical_chars
    }
}

/// Drains a full token stream, including the terminal `EOF` (spec.md
/// property 5, lexer totality).
pub fn tokenize(source: Arc<Source>) -> (Vec<Token>, Vec<Diagnostic>) {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.advance();
        let is_eof = token.kind == TokenKind::Eof;
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    (tokens, lexer.into_diagnostics())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src(text: &str) -> Arc<Source> {
        Arc::new(Source::new("t.tal", text))
    }

    #[test]
    fn tokenizes_a_function_signature() {
        let (tokens, diagnostics) = tokenize(src("fn main() { }"));
        assert!(diagnostics.is_empty());
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Fn,
                TokenKind::Identifier,
                TokenKind::ParenthesesLeft,
                TokenKind::ParenthesesRight,
                TokenKind::BraceLeft,
                TokenKind::BraceRight,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keyword_wins_over_identifier_pattern() {
        let (tokens, _) = tokenize(src("fn"));
        assert_eq!(tokens[0].kind, TokenKind::Fn);
        assert!(tokens[0].text.is_none());
    }

    #[test]
    fn identifier_carries_its_text() {
        let (tokens, _) = tokenize(src("main"));
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text.as_ref().unwrap().as_str().unwrap(), "main");
    }

    #[test]
    fn unmatched_byte_emits_unexpected_symbol_and_resyncs() {
        let (tokens, diagnostics) = tokenize(src("$"));
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(diagnostics[0], Diagnostic::UnexpectedSymbol { .. }));
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn totality_sizes_sum_to_input_length() {
        let text = "fn f() { return 1 + 2; } // trailing comment\n";
        let (tokens, _) = tokenize(src(text));
        let last = tokens.last().unwrap();
        assert_eq!(last.kind, TokenKind::Eof);
        assert_eq!(last.span.start, text.len());
        for token in &tokens {
            if token.kind != TokenKind::Eof {
                assert!(token.span.len() >= 1);
            }
        }
    }

    #[test]
    fn empty_char_literal_is_flagged() {
        let (_, diagnostics) = tokenize(src("''"));
        assert!(matches!(diagnostics[0], Diagnostic::EmptyCharLiteral { .. }));
    }

    #[test]
    fn oversized_char_literal_is_flagged() {
        let (_, diagnostics) = tokenize(src("'ab'"));
        assert!(matches!(diagnostics[0], Diagnostic::TooLargeCharLiteral { .. }));
    }

    #[test]
    fn single_escaped_char_literal_is_not_oversized() {
        let (_, diagnostics) = tokenize(src(r"'\n'"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn oversized_numeric_constant_is_flagged() {
        let (_, diagnostics) = tokenize(src("99999999999999999999999999"));
        assert!(matches!(
            diagnostics[0],
            Diagnostic::TooLargeNumericConstant { .. }
        ));
    }

    #[test]
    fn oversized_hex_escape_is_flagged() {
        let (_, diagnostics) = tokenize(src(r"'\x41414141'"));
        assert!(
            diagnostics
                .iter()
                .any(|d| matches!(d, Diagnostic::TooLargeEscapeSequence { .. }))
        );
    }
}
