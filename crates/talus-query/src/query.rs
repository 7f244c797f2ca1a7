use crate::engine::Engine;
use std::hash::Hash;

/// A query descriptor (spec.md §3, §4.J): a process-lifetime value
/// identifying a family of memoisable computations sharing a key type, a
/// value type, and a `compute` function.
///
/// The C original's descriptor bundles `hash(key)`/`equals(key,key)`
/// function pointers and untyped `key_drop`/`value_drop` callbacks
/// alongside `compute`, keyed by an opaque identity. Per spec.md §9's
/// "descriptor-driven polymorphism" design note — generalise
/// `QueryDescriptor<K,V>` directly in a target with parametric
/// polymorphism — a `Query` implementor's *type* stands in for the
/// descriptor identity (one [`Engine`] may host any number of distinct
/// `Query` types, each with its own key space), `Key: Hash + Eq` replaces
/// the hand-rolled `hash`/`equals` pair, and `Key`/`Value`'s ordinary
/// `Drop` impls replace the explicit `key_drop`/`value_drop` callbacks —
/// there is nothing left to call once the engine's entry table simply
/// owns and drops them.
pub trait Query: 'static {
    /// The key type identifying one entry within this query family.
    type Key: Clone + Eq + Hash + 'static;
    /// The memoised result type.
    type Value: Clone + 'static;

    /// Computes the value for `key`. May call back into `engine.execute`
    /// for sub-queries of any `Query` type; each such re-entrant call is
    /// recorded as a dependency of this entry in the exact order
    /// discovered (spec.md §5's ordering guarantee).
    ///
    /// This must be a pure function of `key`, the engine's context, and
    /// the values of the sub-queries it executes — the engine neither
    /// checks nor enforces this (spec.md §4.J's determinism requirement).
    fn compute(engine: &Engine, key: &Self::Key) -> Result<Self::Value, crate::QueryFailure>;
}
