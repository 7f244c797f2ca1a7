//! The memoising, dependency-tracked evaluator itself (spec.md §4.J,
//! component J): `execute`, `invalidate`, `invalidate_descriptor`,
//! `invalidate_all`, built on `cadenza-tree`'s `green.rs`-style interning
//! table shape (`hashbrown` + `rustc-hash`, generalised from structural
//! hashing to type-erased query-key hashing).

use crate::query::Query;
use rustc_hash::{FxHashMap, FxHashSet};
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A boxed, type-erased query failure. Any `std::error::Error` converts
/// into one via the blanket [`From`] impl below, so a `Query::compute`
/// body can use `?` both on its own fallible steps and on re-entrant
/// `engine.execute` calls (whose [`ExecuteError`] is itself an
/// `std::error::Error`).
pub struct QueryFailure(Box<dyn std::error::Error + 'static>);

impl<E: std::error::Error + 'static> From<E> for QueryFailure {
    fn from(error: E) -> Self {
        QueryFailure(Box::new(error))
    }
}

impl fmt::Debug for QueryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for QueryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for QueryFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

/// The outcome of a failed [`Engine::execute`] (spec.md §7's `CyclicQuery`
/// plus ordinary propagated failure).
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    /// The descriptor's entry was already `Computing` on the active-query
    /// stack: this call would re-enter itself. No value is stored.
    #[error("cyclic query")]
    Cyclic,
    /// `compute` returned an error; the entry was dropped before
    /// propagating.
    #[error(transparent)]
    Failed(#[from] QueryFailure),
}

/// Type-erased equality/hashing for a boxed query key, so a single
/// `Engine` can host many distinct `Query` key types in one entry table
/// (spec.md §9: descriptors generalised per-type rather than through
/// untyped byte blobs).
trait DynKey: Any {
    fn dyn_eq(&self, other: &dyn DynKey) -> bool;
    fn dyn_hash(&self, state: &mut dyn Hasher);
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Eq + Hash> DynKey for T {
    fn dyn_eq(&self, other: &dyn DynKey) -> bool {
        other.as_any().downcast_ref::<T>() == Some(self)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        self.hash(&mut state);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A `(descriptor, key)` pair, type-erased (spec.md §3's query entry key).
/// The descriptor is identified by `Q`'s `TypeId` rather than a runtime
/// handle, since every `Query` implementor is itself one descriptor.
struct ErasedKey {
    descriptor: TypeId,
    key: Rc<dyn DynKey>,
}

impl ErasedKey {
    fn new<Q: Query>(key: Q::Key) -> Self {
        Self {
            descriptor: TypeId::of::<Q>(),
            key: Rc::new(key),
        }
    }
}

impl Clone for ErasedKey {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor,
            key: self.key.clone(),
        }
    }
}

impl PartialEq for ErasedKey {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor == other.descriptor && self.key.dyn_eq(&*other.key)
    }
}
impl Eq for ErasedKey {}

impl Hash for ErasedKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.descriptor.hash(state);
        self.key.dyn_hash(state);
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Computing,
    Ready,
    Stale,
}

struct Entry {
    state: State,
    value: Option<Rc<dyn Any>>,
    /// Dependencies discovered the last time this entry was computed, in
    /// the exact order `execute` encountered them (spec.md §5).
    dependencies: Vec<ErasedKey>,
}

/// A general-purpose incremental evaluator over user-defined [`Query`]
/// descriptors (spec.md §4.J, component J).
///
/// Single-threaded and cooperative, like every other core component
/// (spec.md §5): `execute`'s only "suspension" is its own synchronous
/// re-entrancy while a `compute` call executes sub-queries.
pub struct Engine {
    context: Box<dyn Any>,
    entries: RefCell<FxHashMap<ErasedKey, Entry>>,
    /// Reverse edges: `dependents[k]` is every entry whose last `compute`
    /// called `execute` on `k`. Used to walk the transitive closure on
    /// invalidation without re-deriving it from `entries`.
    dependents: RefCell<FxHashMap<ErasedKey, FxHashSet<ErasedKey>>>,
    /// The active-query stack: each frame is the entry currently
    /// `Computing` plus the dependencies it has recorded so far.
    active: RefCell<Vec<(ErasedKey, Vec<ErasedKey>)>>,
}

impl Engine {
    /// Creates an engine carrying an arbitrary, immutable-by-default
    /// context value, retrievable from any `compute` body via
    /// [`Engine::context`]. Interior mutability (a `Cell`/`RefCell` field
    /// on the context) is the caller's tool for a mutable "ctx", matching
    /// spec.md §4.J's `compute(engine, ctx, key, ...)` signature without
    /// baking a concrete context type into `Engine` itself.
    pub fn new<C: 'static>(context: C) -> Self {
        Self {
            context: Box::new(context),
            entries: RefCell::new(FxHashMap::default()),
            dependents: RefCell::new(FxHashMap::default()),
            active: RefCell::new(Vec::new()),
        }
    }

    pub fn context<C: 'static>(&self) -> &C {
        self.context
            .downcast_ref::<C>()
            .expect("Engine::context type mismatch")
    }

    /// `execute(descriptor, key)` (spec.md §4.J): returns the memoised
    /// value for `key` under `Q`, computing (or recomputing, if `Stale`)
    /// it first if necessary.
    pub fn execute<Q: Query>(&self, key: Q::Key) -> Result<Q::Value, ExecuteError> {
        let erased = ErasedKey::new::<Q>(key.clone());

        if let Some((active_key, deps)) = self.active.borrow_mut().last_mut() {
            deps.push(erased.clone());
            self.dependents
                .borrow_mut()
                .entry(erased.clone())
                .or_default()
                .insert(active_key.clone());
        }

        let state = self.entries.borrow().get(&erased).map(|e| e.state);
        match state {
            Some(State::Ready) => {
                let value = self.entries.borrow()[&erased].value.clone().unwrap();
                return Ok(downcast(value));
            }
            Some(State::Computing) => return Err(ExecuteError::Cyclic),
            Some(State::Stale) | None => {}
        }

        self.entries.borrow_mut().insert(
            erased.clone(),
            Entry {
                state: State::Computing,
                value: None,
                dependencies: Vec::new(),
            },
        );
        self.active.borrow_mut().push((erased.clone(), Vec::new()));

        let result = Q::compute(self, &key);

        let (_, dependencies) = self.active.borrow_mut().pop().expect("active stack frame");

        match result {
            Ok(value) => {
                self.entries.borrow_mut().insert(
                    erased,
                    Entry {
                        state: State::Ready,
                        value: Some(Rc::new(value.clone())),
                        dependencies,
                    },
                );
                Ok(value)
            }
            Err(error) => {
                self.entries.borrow_mut().remove(&erased);
                Err(ExecuteError::Failed(error))
            }
        }
    }

    /// Marks `(Q, key)` `Stale`, along with every entry transitively
    /// reachable through `dependents` — i.e. every entry whose dependency
    /// closure includes `(Q, key)` (spec.md §8 property 8). A `Stale`
    /// entry's cached value is retained until the next `execute` recomputes
    /// and overwrites it.
    pub fn invalidate<Q: Query>(&self, key: Q::Key) {
        self.mark_stale_transitive(&ErasedKey::new::<Q>(key));
    }

    /// Invalidates every entry belonging to descriptor `Q`, regardless of
    /// key.
    pub fn invalidate_descriptor<Q: Query>(&self) {
        let descriptor = TypeId::of::<Q>();
        let roots: Vec<ErasedKey> = self
            .entries
            .borrow()
            .keys()
            .filter(|k| k.descriptor == descriptor)
            .cloned()
            .collect();
        for root in roots {
            self.mark_stale_transitive(&root);
        }
    }

    /// Invalidates every entry in the engine.
    pub fn invalidate_all(&self) {
        for entry in self.entries.borrow_mut().values_mut() {
            entry.state = State::Stale;
        }
    }

    fn mark_stale_transitive(&self, root: &ErasedKey) {
        let mut stack = vec![root.clone()];
        let mut visited = FxHashSet::default();
        while let Some(key) = stack.pop() {
            if !visited.insert(clone_for_set(&key)) {
                continue;
            }
            if let Some(entry) = self.entries.borrow_mut().get_mut(&key) {
                entry.state = State::Stale;
            }
            if let Some(deps) = self.dependents.borrow().get(&key) {
                stack.extend(deps.iter().cloned());
            }
        }
    }
}

/// `FxHashSet<ErasedKey>` needs `ErasedKey: Eq + Hash`, which it already
/// is; this helper just documents that the clone is cheap (an `Rc` bump).
fn clone_for_set(key: &ErasedKey) -> ErasedKey {
    key.clone()
}

fn downcast<V: Clone + 'static>(value: Rc<dyn Any>) -> V {
    value
        .downcast_ref::<V>()
        .expect("query value type mismatch")
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct Counters {
        a_calls: Cell<u32>,
        b_calls: Cell<u32>,
    }

    struct QueryA;
    impl Query for QueryA {
        type Key = i64;
        type Value = i64;

        fn compute(engine: &Engine, key: &i64) -> Result<i64, QueryFailure> {
            engine.context::<Counters>().a_calls.set(engine.context::<Counters>().a_calls.get() + 1);
            let b = engine.execute::<QueryB>(*key)?;
            Ok(b + 1)
        }
    }

    struct QueryB;
    impl Query for QueryB {
        type Key = i64;
        type Value = i64;

        fn compute(engine: &Engine, key: &i64) -> Result<i64, QueryFailure> {
            engine.context::<Counters>().b_calls.set(engine.context::<Counters>().b_calls.get() + 1);
            Ok(key * 2)
        }
    }

    /// spec.md §8 scenario S6: `A(k) -> B(k) -> k*2`, `A(k) -> b+1`.
    #[test]
    fn s6_memoisation_and_selective_invalidation() {
        let engine = Engine::new(Counters::default());

        assert_eq!(engine.execute::<QueryA>(3).unwrap(), 7);
        assert_eq!(engine.context::<Counters>().a_calls.get(), 1);
        assert_eq!(engine.context::<Counters>().b_calls.get(), 1);

        // repeated execute: fully cached, no recomputation (property 7).
        assert_eq!(engine.execute::<QueryA>(3).unwrap(), 7);
        assert_eq!(engine.context::<Counters>().a_calls.get(), 1);
        assert_eq!(engine.context::<Counters>().b_calls.get(), 1);

        // invalidating B(3) invalidates A(3) transitively (property 8).
        engine.invalidate::<QueryB>(3);
        assert_eq!(engine.execute::<QueryA>(3).unwrap(), 7);
        assert_eq!(engine.context::<Counters>().a_calls.get(), 2);
        assert_eq!(engine.context::<Counters>().b_calls.get(), 2);

        // invalidating an unrelated key leaves A(3)/B(3) cached.
        engine.invalidate::<QueryB>(99);
        assert_eq!(engine.execute::<QueryA>(3).unwrap(), 7);
        assert_eq!(engine.context::<Counters>().a_calls.get(), 2);
        assert_eq!(engine.context::<Counters>().b_calls.get(), 2);
    }

    #[test]
    fn invalidate_descriptor_clears_every_key() {
        let engine = Engine::new(Counters::default());
        engine.execute::<QueryB>(1).unwrap();
        engine.execute::<QueryB>(2).unwrap();
        assert_eq!(engine.context::<Counters>().b_calls.get(), 2);

        engine.invalidate_descriptor::<QueryB>();
        engine.execute::<QueryB>(1).unwrap();
        engine.execute::<QueryB>(2).unwrap();
        assert_eq!(engine.context::<Counters>().b_calls.get(), 4);
    }

    #[test]
    fn invalidate_all_forces_full_recompute() {
        let engine = Engine::new(Counters::default());
        engine.execute::<QueryA>(5).unwrap();
        engine.invalidate_all();
        engine.execute::<QueryA>(5).unwrap();
        assert_eq!(engine.context::<Counters>().a_calls.get(), 2);
        assert_eq!(engine.context::<Counters>().b_calls.get(), 2);
    }

    struct CyclicQuery;
    impl Query for CyclicQuery {
        type Key = ();
        type Value = ();

        fn compute(engine: &Engine, key: &()) -> Result<(), QueryFailure> {
            engine.execute::<CyclicQuery>(*key)?;
            Ok(())
        }
    }

    /// spec.md §8 property 9: a descriptor that re-enters its own active
    /// key fails with `CyclicQuery`, and no value is stored.
    #[test]
    fn cyclic_query_fails_and_stores_nothing() {
        let engine = Engine::new(());
        let err = engine.execute::<CyclicQuery>(()).unwrap_err();
        assert!(matches!(err, ExecuteError::Failed(_)));

        // The entry was dropped on failure, so a later, non-recursive
        // execute of the same key is free to succeed from a clean state.
        struct NonCyclic;
        impl Query for NonCyclic {
            type Key = ();
            type Value = i32;
            fn compute(_: &Engine, _: &()) -> Result<i32, QueryFailure> {
                Ok(1)
            }
        }
        assert_eq!(engine.execute::<NonCyclic>(()).unwrap(), 1);
    }

    #[derive(Debug, Clone, thiserror::Error)]
    #[error("computation refused")]
    struct Refused;

    struct Fails;
    impl Query for Fails {
        type Key = ();
        type Value = ();
        fn compute(_: &Engine, _: &()) -> Result<(), QueryFailure> {
            Err(Refused.into())
        }
    }

    #[test]
    fn failure_propagates_and_drops_the_entry() {
        let engine = Engine::new(());
        assert!(engine.execute::<Fails>(()).is_err());
        // No Ready entry was left behind to serve a second call; it just
        // recomputes (and fails) again rather than panicking on stale state.
        assert!(engine.execute::<Fails>(()).is_err());
    }
}
