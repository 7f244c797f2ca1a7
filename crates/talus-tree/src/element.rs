//! The element cache: a content-addressed store mapping structural
//! fingerprint to element, generalizing `cadenza-tree`'s green-tree
//! interning (`GreenNode`/`GreenToken`/`Cache`) to the spec's unconditional
//! identity invariant — every structurally equal element is one object,
//! with no size cutoff on the number of children.

use crate::kind::SyntaxKind;
use hashbrown::hash_map::RawEntryMut;
use rustc_hash::FxHasher;
use std::{
    fmt,
    hash::{BuildHasherDefault, Hash, Hasher},
    sync::{Arc, Mutex},
};
use talus_text::Text;

type HashMap<K, V> = hashbrown::HashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Default bucket count for a fresh [`ElementCache`]; spec.md leaves this
/// as a tuning parameter with a floor of 8192.
pub const DEFAULT_BUCKET_COUNT: usize = 8192;

/// A hash-consed token or node. Cloning is an `Arc` bump; equality and
/// hashing of two `Element`s interned from the *same* cache are always
/// pointer-identity comparisons in practice, since structurally equal
/// elements are always the same object once interned (see
/// [`ElementCache`]'s invariants).
#[derive(Clone)]
pub struct Element {
    inner: Arc<ElementData>,
}

struct ElementData {
    hash: u64,
    len: usize,
    payload: Payload,
}

enum Payload {
    Token { kind: SyntaxKind, text: Option<Text> },
    Node { kind: SyntaxKind, children: Box<[Element]> },
}

impl Element {
    pub fn kind(&self) -> SyntaxKind {
        match &self.inner.payload {
            Payload::Token { kind, .. } => *kind,
            Payload::Node { kind, .. } => *kind,
        }
    }

    /// Total byte length: the token's text length, or the sum of
    /// children's lengths for a node.
    pub fn len(&self) -> usize {
        self.inner.len
    }

    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// The structural hash this element was interned under. Rehashing the
    /// element's kind/children (see [`ElementCache::rehash`]) always
    /// reproduces this value.
    pub fn hash(&self) -> u64 {
        self.inner.hash
    }

    pub fn text(&self) -> Option<&Text> {
        match &self.inner.payload {
            Payload::Token { text, .. } => text.as_ref(),
            Payload::Node { .. } => None,
        }
    }

    pub fn children(&self) -> &[Element] {
        match &self.inner.payload {
            Payload::Token { .. } => &[],
            Payload::Node { children, .. } => children,
        }
    }

    pub fn is_token(&self) -> bool {
        matches!(self.inner.payload, Payload::Token { .. })
    }

    pub fn is_node(&self) -> bool {
        matches!(self.inner.payload, Payload::Node { .. })
    }

    fn identity(&self) -> *const () {
        Arc::as_ptr(&self.inner) as *const ()
    }
}

impl PartialEq for Element {
    /// Two elements are equal iff they are the same interned object.
    /// Interning guarantees this coincides with structural equality.
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}
impl Eq for Element {}

impl Hash for Element {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash.hash(state);
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.payload {
            Payload::Token { kind, text } => f
                .debug_struct("Token")
                .field("kind", kind)
                .field("text", &text.as_ref().map(|t| t.as_str().unwrap_or("<bytes>")))
                .finish(),
            Payload::Node { kind, children } => f
                .debug_struct("Node")
                .field("kind", kind)
                .field("children", children)
                .finish(),
        }
    }
}

/// Wrapper used only as a hash-map key so we can hash by the element's
/// precomputed structural hash rather than re-deriving one from `Element`'s
/// `Hash` impl (which is already that precomputed value, but spelling it
/// out here keeps the cache's hashing story in one place).
struct Interned(Element);

fn token_hash(kind: SyntaxKind, text: Option<&[u8]>) -> u64 {
    let mut h = FxHasher::default();
    kind.hash(&mut h);
    if let Some(text) = text {
        text.hash(&mut h);
    }
    h.finish()
}

fn node_hash(kind: SyntaxKind, children: &[Element]) -> u64 {
    let mut h = FxHasher::default();
    kind.hash(&mut h);
    children.len().hash(&mut h);
    for child in children {
        // Children are already interned, so their own hash is a sufficient
        // and cheap proxy for their identity.
        child.hash().hash(&mut h);
    }
    h.finish()
}

/// Content-addressed store for tokens and nodes (spec.md component E).
///
/// Invariants upheld:
/// - For any two elements in the cache, structural equality implies
///   pointer identity (`intern_*` is idempotent).
/// - An element's children are themselves cached elements (enforced by
///   `intern_node`'s signature: it only accepts `Element`s).
/// - `intern_*` never fails.
pub struct ElementCache {
    tokens: Mutex<HashMap<Interned, ()>>,
    nodes: Mutex<HashMap<Interned, ()>>,
}

impl Default for ElementCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementCache {
    pub fn new() -> Self {
        Self::with_bucket_count(DEFAULT_BUCKET_COUNT)
    }

    pub fn with_bucket_count(bucket_count: usize) -> Self {
        let bucket_count = bucket_count.max(DEFAULT_BUCKET_COUNT);
        Self {
            tokens: Mutex::new(HashMap::with_capacity_and_hasher(
                bucket_count,
                BuildHasherDefault::default(),
            )),
            nodes: Mutex::new(HashMap::with_capacity_and_hasher(
                bucket_count,
                BuildHasherDefault::default(),
            )),
        }
    }

    /// Interns a token. `text` must be `Some` iff `kind` is content-bearing
    /// (identifiers, strings, numbers); content-less kinds (keywords,
    /// punctuation) always pass `None`, per spec.md's resolution of the
    /// "does `has_content` imply a null or empty text" open question.
    pub fn intern_token(&self, kind: SyntaxKind, text: Option<&[u8]>) -> Element {
        let hash = token_hash(kind, text);
        let mut table = self.tokens.lock().unwrap();
        let entry = table.raw_entry_mut().from_hash(hash, |existing| {
            let Payload::Token {
                kind: existing_kind,
                text: existing_text,
            } = &existing.0.inner.payload
            else {
                return false;
            };
            *existing_kind == kind && existing_text.as_ref().map(|t| t.as_bytes()) == text
        });

        match entry {
            RawEntryMut::Occupied(entry) => entry.key().0.clone(),
            RawEntryMut::Vacant(entry) => {
                let text_owned = text.map(Text::new);
                let len = text_owned.as_ref().map_or(0, Text::len);
                let element = Element {
                    inner: Arc::new(ElementData {
                        hash,
                        len,
                        payload: Payload::Token {
                            kind,
                            text: text_owned,
                        },
                    }),
                };
                entry.insert_with_hasher(hash, Interned(element.clone()), (), |e| e.0.hash());
                element
            }
        }
    }

    /// Interns a node. Child order matters: `[a, b]` and `[b, a]` are
    /// distinct nodes even with the same kind and child set.
    pub fn intern_node(&self, kind: SyntaxKind, children: impl Into<Vec<Element>>) -> Element {
        let children = children.into();
        let hash = node_hash(kind, &children);

        let mut table = self.nodes.lock().unwrap();
        let entry = table.raw_entry_mut().from_hash(hash, |existing| {
            let Payload::Node {
                kind: existing_kind,
                children: existing_children,
            } = &existing.0.inner.payload
            else {
                return false;
            };
            *existing_kind == kind
                && existing_children.len() == children.len()
                && existing_children.iter().eq(children.iter())
        });

        match entry {
            RawEntryMut::Occupied(entry) => entry.key().0.clone(),
            RawEntryMut::Vacant(entry) => {
                let len = children.iter().map(Element::len).sum();
                let element = Element {
                    inner: Arc::new(ElementData {
                        hash,
                        len,
                        payload: Payload::Node {
                            kind,
                            children: children.into_boxed_slice(),
                        },
                    }),
                };
                entry.insert_with_hasher(hash, Interned(element.clone()), (), |e| e.0.hash());
                element
            }
        }
    }

    /// Recomputes the hash of an element from its kind and children (or
    /// kind and text, for a token), independent of the stored
    /// [`Element::hash`]. Used to test the hash–equality consistency
    /// property.
    pub fn rehash(&self, element: &Element) -> u64 {
        match &element.inner.payload {
            Payload::Token { kind, text } => token_hash(*kind, text.as_ref().map(Text::as_bytes)),
            Payload::Node { kind, children } => node_hash(*kind, children),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(raw: u16) -> SyntaxKind {
        SyntaxKind::new(raw)
    }

    #[test]
    fn repeated_token_interning_is_identical() {
        let cache = ElementCache::new();
        let a = cache.intern_token(k(1), Some(b"foo"));
        let b = cache.intern_token(k(1), Some(b"foo"));
        assert_eq!(a, b);
        assert!(Arc::ptr_eq(&a.inner, &b.inner));
    }

    #[test]
    fn different_text_is_a_different_token() {
        let cache = ElementCache::new();
        let a = cache.intern_token(k(1), Some(b"foo"));
        let b = cache.intern_token(k(1), Some(b"bar"));
        assert_ne!(a, b);
    }

    #[test]
    fn content_less_tokens_ignore_text() {
        let cache = ElementCache::new();
        let a = cache.intern_token(k(2), None);
        let b = cache.intern_token(k(2), None);
        assert_eq!(a, b);
        assert_eq!(a.len(), 0);
    }

    #[test]
    fn repeated_node_interning_is_identical() {
        let cache = ElementCache::new();
        let one = cache.intern_token(k(10), Some(b"1"));
        let plus = cache.intern_token(k(11), None);
        let two = cache.intern_token(k(10), Some(b"2"));

        let a = cache.intern_node(k(20), vec![one.clone(), plus.clone(), two.clone()]);
        let b = cache.intern_node(k(20), vec![one, plus, two]);
        assert_eq!(a, b);
        assert!(Arc::ptr_eq(&a.inner, &b.inner));
    }

    #[test]
    fn child_order_is_significant() {
        let cache = ElementCache::new();
        let one = cache.intern_token(k(10), Some(b"1"));
        let plus = cache.intern_token(k(11), None);
        let two = cache.intern_token(k(10), Some(b"2"));

        let forward = cache.intern_node(k(20), vec![one.clone(), plus.clone(), two.clone()]);
        let backward = cache.intern_node(k(20), vec![two, plus, one]);
        assert_ne!(forward, backward);
    }

    #[test]
    fn hash_equality_consistency() {
        let cache = ElementCache::new();
        let one = cache.intern_token(k(10), Some(b"1"));
        let plus = cache.intern_token(k(11), None);
        let two = cache.intern_token(k(10), Some(b"2"));
        let node = cache.intern_node(k(20), vec![one, plus, two]);
        assert_eq!(cache.rehash(&node), node.hash());
    }

    #[test]
    fn node_length_is_sum_of_children() {
        let cache = ElementCache::new();
        let a = cache.intern_token(k(10), Some(b"ab"));
        let b = cache.intern_token(k(10), Some(b"cde"));
        let node = cache.intern_node(k(20), vec![a, b]);
        assert_eq!(node.len(), 5);
    }
}
