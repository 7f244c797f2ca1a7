/// A raw, interning-layer view of a token or node kind.
///
/// This crate never interprets what a kind *means* — that's the closed
/// enum one layer up (the token/node tables) — it only needs kinds to be
/// small, `Copy`, and totally ordered/hashable so they can be packed into
/// cache keys. `talus-syntax`'s `Kind` converts to and from this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SyntaxKind(pub u16);

impl SyntaxKind {
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn into_raw(self) -> u16 {
        self.0
    }
}

impl From<u16> for SyntaxKind {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}
