//! Push-down construction of trees into the element cache (spec.md §4.F).

use crate::element::{Element, ElementCache};
use crate::kind::SyntaxKind;
use crate::rooted::RootedElement;
use talus_pool::Pool;
use talus_text::Text;

struct Scaffold {
    kind: SyntaxKind,
    children: Vec<Element>,
}

/// Opaque marker returned by [`Builder::checkpoint`].
#[derive(Clone, Copy, Debug)]
pub struct Checkpoint(usize);

/// Transient, mutable construction scaffold that seals finished subtrees
/// into an [`ElementCache`] as it goes. Exists only during construction —
/// `finish` consumes it.
pub struct Builder<'cache> {
    cache: &'cache ElementCache,
    stack: Vec<Scaffold>,
}

impl<'cache> Builder<'cache> {
    pub fn new(cache: &'cache ElementCache) -> Self {
        Self {
            cache,
            stack: Vec::new(),
        }
    }

    /// Initializes the builder with one open scaffold of `root_kind`. Must
    /// be called exactly once, before any other operation.
    pub fn begin(&mut self, root_kind: SyntaxKind) {
        assert!(
            self.stack.is_empty(),
            "begin called on an already-started builder"
        );
        self.stack.push(Scaffold {
            kind: root_kind,
            children: Vec::new(),
        });
    }

    /// Pushes a new open scaffold under the current one.
    pub fn node_start(&mut self, kind: SyntaxKind) {
        assert!(!self.stack.is_empty(), "node_start called before begin");
        self.stack.push(Scaffold {
            kind,
            children: Vec::new(),
        });
    }

    /// Pops the top scaffold, interns it as a `Node`, and appends the
    /// result to the new top scaffold. Every `node_start` must be paired
    /// with exactly one `node_end`, including along error-recovery exits.
    pub fn node_end(&mut self) {
        let scaffold = self
            .stack
            .pop()
            .expect("node_end called with no open scaffold");
        let element = self.cache.intern_node(scaffold.kind, scaffold.children);
        let parent = self
            .stack
            .last_mut()
            .expect("node_end called once too often: no enclosing scaffold to attach to");
        parent.children.push(element);
    }

    /// Interns a token and appends it to the top scaffold. `text` must be
    /// `Some` iff `kind` is content-bearing.
    pub fn token(&mut self, kind: SyntaxKind, text: Option<Text>) {
        let bytes = text.as_ref().map(Text::as_bytes);
        let element = self.cache.intern_token(kind, bytes);
        let top = self.stack.last_mut().expect("token called before begin");
        top.children.push(element);
    }

    /// Appends an already-interned element directly to the top scaffold
    /// (used by error recovery to splice in a pre-built `ERROR` node).
    pub fn push(&mut self, element: Element) {
        let top = self.stack.last_mut().expect("push called before begin");
        top.children.push(element);
    }

    /// Marks a position in the top scaffold's children-so-far, to later
    /// retroactively wrap everything appended since with [`Self::node_start_at`].
    /// Grounds Pratt-parsed binary expressions: the left operand is built
    /// before its enclosing `ExprBinary` node is known to exist.
    pub fn checkpoint(&self) -> Checkpoint {
        let top = self.stack.last().expect("checkpoint called before begin");
        Checkpoint(top.children.len())
    }

    /// Opens a new scaffold of `kind` that immediately adopts every child
    /// the top scaffold accumulated since `checkpoint` was taken.
    pub fn node_start_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        let top = self
            .stack
            .last_mut()
            .expect("node_start_at called before begin");
        let adopted = top.children.split_off(checkpoint.0);
        self.stack.push(Scaffold {
            kind,
            children: adopted,
        });
    }

    /// Asserts the stack holds exactly one scaffold (the root), seals it,
    /// and returns a root element whose back-pointer chain is anchored in
    /// `pool`. The builder is unusable after this.
    pub fn finish<'pool>(mut self, _pool: &'pool Pool) -> RootedElement<'pool> {
        assert_eq!(
            self.stack.len(),
            1,
            "finish called with unbalanced node_start/node_end pairs"
        );
        let root = self.stack.pop().unwrap();
        let element = self.cache.intern_node(root.kind, root.children);
        RootedElement::root(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(raw: u16) -> SyntaxKind {
        SyntaxKind::new(raw)
    }

    #[test]
    fn builds_a_nested_tree() {
        let cache = ElementCache::new();
        let pool = Pool::new();
        let mut builder = Builder::new(&cache);

        builder.begin(k(1));
        builder.token(k(2), Some(Text::from("fn")));
        builder.node_start(k(3));
        builder.token(k(4), Some(Text::from("main")));
        builder.node_end();
        let root = builder.finish(&pool);

        assert_eq!(root.kind(), k(1));
        assert_eq!(root.element().children().len(), 2);
        assert_eq!(root.element().children()[1].kind(), k(3));
    }

    #[test]
    #[should_panic(expected = "unbalanced")]
    fn finish_requires_a_single_open_scaffold() {
        let cache = ElementCache::new();
        let pool = Pool::new();
        let mut builder = Builder::new(&cache);
        builder.begin(k(1));
        builder.node_start(k(2));
        let _ = builder.finish(&pool);
    }

    #[test]
    fn node_start_at_retroactively_wraps_siblings_since_checkpoint() {
        let cache = ElementCache::new();
        let pool = Pool::new();
        let mut builder = Builder::new(&cache);

        builder.begin(k(1));
        let checkpoint = builder.checkpoint();
        builder.token(k(2), Some(Text::from("1")));
        builder.token(k(3), Some(Text::from("+")));
        builder.node_start_at(checkpoint, k(4));
        builder.token(k(2), Some(Text::from("2")));
        builder.node_end();
        let root = builder.finish(&pool);

        // root has exactly one child: the wrapped node, which in turn
        // holds the two tokens recorded before the checkpoint plus the one
        // token appended after node_start_at.
        assert_eq!(root.element().children().len(), 1);
        let wrapped = &root.element().children()[0];
        assert_eq!(wrapped.kind(), k(4));
        assert_eq!(wrapped.children().len(), 3);
    }

    #[test]
    fn repeated_construction_is_interned_identically() {
        let cache = ElementCache::new();
        let pool = Pool::new();

        let mut a = Builder::new(&cache);
        a.begin(k(1));
        a.token(k(2), Some(Text::from("x")));
        let a = a.finish(&pool);

        let mut b = Builder::new(&cache);
        b.begin(k(1));
        b.token(k(2), Some(Text::from("x")));
        let b = b.finish(&pool);

        assert_eq!(a.element(), b.element());
    }
}
