use crate::diagnostic::Diagnostic;

const BOLD_RED: &str = "\x1b[1;31m";
const RESET: &str = "\x1b[0m";

/// Renders a diagnostic to spec.md §4.I's exact surface format:
///
/// ```text
/// <src>:<line>:<col> error: <message>
/// ```
///
/// followed by up to 3 preceding source lines, the offending line, and a
/// caret pointing at the column. `CyclicQuery` has no source location and
/// renders without the context block.
pub fn render(diagnostic: &Diagnostic) -> String {
    let message = diagnostic.to_string();

    let Some(location) = diagnostic.location() else {
        return format!("{BOLD_RED}error{RESET}: {message}");
    };

    let (line, col) = location.line_col();
    let mut out = format!(
        "{}:{}:{} {BOLD_RED}error{RESET}: {}\n",
        location.source.name(),
        line + 1,
        col + 1,
        message
    );

    let first_context_line = line.saturating_sub(3);
    for context_line in first_context_line..line {
        if let Some(text) = location.source.line_text(context_line) {
            out.push_str(&format!("{:>5} | {text}\n", context_line + 1));
        }
    }

    if let Some(text) = location.source.line_text(line) {
        out.push_str(&format!("{:>5} | {text}\n", line + 1));
    }

    out.push_str(&format!("      | {}^", " ".repeat(col)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use talus_text::Source;

    #[test]
    fn renders_the_exact_surface_format() {
        let source = Arc::new(Source::new("t.tal", "fn () {\n}\n"));
        let diag = Diagnostic::Expected {
            expected: "identifier",
            got: "'('",
            at: source.location(3, 1),
        };
        let rendered = render(&diag);
        assert!(rendered.starts_with("t.tal:1:4 "));
        assert!(rendered.contains("error: expected identifier, got '('"));
        assert!(rendered.contains("fn () {"));
        assert!(rendered.ends_with('^'));
    }

    #[test]
    fn caps_context_at_three_preceding_lines() {
        let text = "a\nb\nc\nd\ne\nf\n";
        let source = Arc::new(Source::new("t.tal", text));
        let diag = Diagnostic::ExpectedStatement {
            at: source.location(10, 1),
        };
        let rendered = render(&diag);
        // Offending line is 'f' (line 6, 1-indexed); context lines c, d, e
        // (lines 3-5) precede it, but not further back.
        assert!(rendered.contains('c'));
        assert!(!rendered.contains('a'));
    }

    #[test]
    fn cyclic_query_has_no_location_block() {
        let diag = Diagnostic::CyclicQuery;
        let rendered = render(&diag);
        assert_eq!(rendered, format!("{BOLD_RED}error{RESET}: cyclic query"));
    }
}
