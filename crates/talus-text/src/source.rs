use crate::Text;
use std::sync::Arc;

/// A named input buffer: a file path (or synthetic name) paired with its
/// complete text. Cloning is cheap.
///
/// `Hash`/`Eq` compare by value (name, text, and the derived line-start
/// table), not by address, so an `Arc<Source>` can serve directly as a
/// query-engine key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Source {
    name: Arc<str>,
    text: Text,
    line_starts: Arc<[usize]>,
}

impl Source {
    pub fn new(name: impl Into<Arc<str>>, text: impl Into<Text>) -> Self {
        let text = text.into();
        let line_starts = compute_line_starts(text.as_bytes());
        Self {
            name: name.into(),
            text,
            line_starts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &Text {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// 0-indexed line number containing `offset`.
    pub fn line_number(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        }
    }

    /// 0-indexed `(line, column)` for a byte offset, both counted in bytes.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = self.line_number(offset);
        let line_start = self.line_starts[line];
        (line, offset - line_start)
    }

    /// The raw bytes of line `line` (0-indexed), including its trailing
    /// newline if any, or `None` past the end of the source.
    pub fn line_bytes(&self, line: usize) -> Option<&[u8]> {
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.text.len());
        Some(&self.text.as_bytes()[start..end])
    }

    /// The source text of line `line` (0-indexed), trimmed of its trailing
    /// newline, for diagnostic rendering. Non-UTF-8 content renders lossily.
    pub fn line_text(&self, line: usize) -> Option<String> {
        let bytes = self.line_bytes(line)?;
        let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
        Some(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn location(self: &Arc<Self>, byte_offset: usize, byte_length: usize) -> SourceLocation {
        SourceLocation {
            source: self.clone(),
            byte_offset,
            byte_length,
        }
    }
}

fn compute_line_starts(bytes: &[u8]) -> Arc<[usize]> {
    let mut starts = vec![0];
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts.into()
}

/// A span of bytes within a [`Source`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceLocation {
    pub source: Arc<Source>,
    pub byte_offset: usize,
    pub byte_length: usize,
}

impl SourceLocation {
    pub fn end(&self) -> usize {
        self.byte_offset + self.byte_length
    }

    pub fn line_col(&self) -> (usize, usize) {
        self.source.line_col(self.byte_offset)
    }
}
