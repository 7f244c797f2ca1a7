//! The compiler front-end's driver: wires the hash-consed element cache
//! (`talus-tree`), the lexer/parser (`talus-syntax`), diagnostics
//! (`talus-diag`), the scoped memory pool (`talus-pool`), and the
//! incremental query engine (`talus-query`) into one per-compilation
//! handle. Not a spec.md component itself — the glue spec.md §2's
//! dependency table implies ("E,H→J") but leaves to the embedder.

mod compilation;

pub use compilation::{Compilation, ParseResult};
