//! Rooted views: an interned [`Element`] paired with a parent chain.
//!
//! An interned element is shared and parentless — the same subtree may sit
//! under many parents at once. Editing needs a single, unambiguous parent
//! chain for the element being edited, so that chain lives on a separate,
//! transient type instead of on `Element` itself (see spec.md §9's "parent
//! back-pointers coexisting with structural sharing" design note).

use crate::element::Element;
use crate::kind::SyntaxKind;
use talus_pool::Pool;

/// One link of a rooted element's parent chain: the parent element, the
/// index of the child being viewed through it, and the frame above it
/// (`None` once the chain reaches the root). Allocated out of a [`Pool`] so
/// the whole chain's lifetime is exactly the compilation's, per spec.md
/// §4.F's `finish(pool)` contract.
pub(crate) struct Frame<'pool> {
    pub(crate) parent: Element,
    pub(crate) index: usize,
    pub(crate) above: Option<&'pool Frame<'pool>>,
}

/// An element together with its parent chain, used only while editing an
/// already-built tree (spec.md §3's "rooted element").
///
/// Invariant: the back-pointer graph a `RootedElement` traces out is a
/// tree — a given element reached through one `RootedElement` has exactly
/// one parent chain, never two competing ones, even though the underlying
/// `Element` may be shared as a child of many other trees.
#[derive(Clone)]
pub struct RootedElement<'pool> {
    element: Element,
    frame: Option<&'pool Frame<'pool>>,
}

impl<'pool> RootedElement<'pool> {
    pub(crate) fn new(element: Element, frame: Option<&'pool Frame<'pool>>) -> Self {
        Self { element, frame }
    }

    /// A rooted view of `element` with no parent: `element` is itself the
    /// root of the tree being edited.
    pub fn root(element: Element) -> Self {
        Self {
            element,
            frame: None,
        }
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn kind(&self) -> SyntaxKind {
        self.element.kind()
    }

    /// `true` for the root of the tree (no parent frame).
    pub fn is_root(&self) -> bool {
        self.frame.is_none()
    }

    pub(crate) fn frame(&self) -> Option<&'pool Frame<'pool>> {
        self.frame
    }

    /// Descends into child `index` of this element, extending the parent
    /// chain by one frame allocated from `pool`.
    pub fn child(&self, pool: &'pool Pool, index: usize) -> RootedElement<'pool> {
        let child = self.element.children()[index].clone();
        let frame = pool.alloc(Frame {
            parent: self.element.clone(),
            index,
            above: self.frame,
        });
        RootedElement {
            element: child,
            frame: Some(&*frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementCache;
    use talus_pool::Pool;

    fn k(raw: u16) -> SyntaxKind {
        SyntaxKind::new(raw)
    }

    #[test]
    fn child_extends_the_parent_chain() {
        let cache = ElementCache::new();
        let pool = Pool::new();
        let leaf = cache.intern_token(k(1), Some(b"x"));
        let node = cache.intern_node(k(2), vec![leaf.clone()]);

        let root = RootedElement::root(node.clone());
        assert!(root.is_root());

        let child = root.child(&pool, 0);
        assert!(!child.is_root());
        assert_eq!(child.element(), &leaf);
    }
}
