//! Functional tree editing: swap a subtree, rewriting only the spine to
//! the root (spec.md §4.G, component G).

use crate::element::{Element, ElementCache};
use crate::rooted::RootedElement;

/// Returns a new `Node` identical to `element` except child `index` is
/// `new_child`. Structural sharing: if the rebuilt node already exists in
/// `cache`, the existing element is returned instead of a fresh one.
///
/// Panics if `element` is a token (tokens have no children to swap) or if
/// `index` is out of bounds.
pub fn swap_child(cache: &ElementCache, element: &Element, index: usize, new_child: Element) -> Element {
    assert!(element.is_node(), "cannot swap a child of a token");
    let mut children: Vec<Element> = element.children().to_vec();
    children[index] = new_child;
    cache.intern_node(element.kind(), children)
}

/// Walks from `rooted` up its parent chain, reconstructing each ancestor
/// with the one changed child, and returns the new root element. This is
/// the only mutation path for an already-finished tree — it never mutates
/// any interned element, it only produces new ones.
pub fn swap(cache: &ElementCache, rooted: RootedElement<'_>, new_subtree: Element) -> Element {
    let mut current = new_subtree;
    let mut frame = rooted.frame();
    while let Some(f) = frame {
        current = swap_child(cache, &f.parent, f.index, current);
        frame = f.above;
    }
    current
}

/// The root element of `rooted`'s parent chain, unmodified. Walks the
/// chain without interning anything new; `root(r) == swap(cache, r,
/// r.element().clone())` for any `r`, since re-swapping an unchanged
/// child reconstructs the identical, already-interned ancestors.
pub fn root(rooted: &RootedElement<'_>) -> Element {
    let mut top = rooted.frame();
    let mut last_parent = None;
    while let Some(f) = top {
        last_parent = Some(f.parent.clone());
        top = f.above;
    }
    last_parent.unwrap_or_else(|| rooted.element().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::SyntaxKind;
    use talus_pool::Pool;

    fn k(raw: u16) -> SyntaxKind {
        SyntaxKind::new(raw)
    }

    #[test]
    fn swap_child_identity_when_unchanged() {
        let cache = ElementCache::new();
        let a = cache.intern_token(k(1), Some(b"a"));
        let b = cache.intern_token(k(1), Some(b"b"));
        let node = cache.intern_node(k(2), vec![a.clone(), b.clone()]);

        let same = swap_child(&cache, &node, 0, a);
        assert_eq!(same, node);
    }

    #[test]
    fn swap_child_produces_a_distinct_node() {
        let cache = ElementCache::new();
        let a = cache.intern_token(k(1), Some(b"a"));
        let b = cache.intern_token(k(1), Some(b"b"));
        let c = cache.intern_token(k(1), Some(b"c"));
        let node = cache.intern_node(k(2), vec![a, b]);

        let swapped = swap_child(&cache, &node, 1, c.clone());
        assert_ne!(swapped, node);
        assert_eq!(swapped.children()[1], c);
    }

    #[test]
    fn swap_rewrites_only_the_spine() {
        let cache = ElementCache::new();
        let pool = Pool::new();

        let leaf_a = cache.intern_token(k(1), Some(b"a"));
        let leaf_b = cache.intern_token(k(1), Some(b"b"));
        let inner = cache.intern_node(k(2), vec![leaf_a.clone()]);
        let sibling = cache.intern_node(k(3), vec![leaf_b]);
        let root_node = cache.intern_node(k(4), vec![inner.clone(), sibling.clone()]);

        let rooted_root = RootedElement::root(root_node.clone());
        let rooted_inner = rooted_root.child(&pool, 0);
        let rooted_leaf = rooted_inner.child(&pool, 0);

        let new_leaf = cache.intern_token(k(1), Some(b"z"));
        let new_root = swap(&cache, rooted_leaf, new_leaf.clone());

        assert_ne!(new_root, root_node);
        assert_eq!(new_root.children()[0].children()[0], new_leaf);
        // The untouched sibling subtree is shared, not rebuilt.
        assert_eq!(new_root.children()[1], sibling);
    }

    #[test]
    fn swap_with_identical_subtree_is_identity() {
        let cache = ElementCache::new();
        let pool = Pool::new();

        let leaf = cache.intern_token(k(1), Some(b"a"));
        let inner = cache.intern_node(k(2), vec![leaf]);
        let root_node = cache.intern_node(k(3), vec![inner]);

        let rooted_root = RootedElement::root(root_node.clone());
        let rooted_inner = rooted_root.child(&pool, 0);

        let new_root = swap(&cache, rooted_inner.clone(), rooted_inner.element().clone());
        assert_eq!(new_root, root_node);
        assert_eq!(root(&rooted_root), root_node);
    }
}
