//! Immutable text storage and source-location bookkeeping.
//!
//! This crate owns the two leaf components of the front-end: an immutable,
//! length-prefixed byte sequence ([`Text`]) and a named source buffer
//! ([`Source`]) that resolves byte offsets to `(line, column)` pairs.

mod source;
mod text;

pub use source::{Source, SourceLocation};
pub use text::Text;
