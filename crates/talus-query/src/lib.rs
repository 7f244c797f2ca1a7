//! A general-purpose, memoising, dependency-tracked query engine (spec.md
//! §4.J, component J).
//!
//! Per spec.md §9's "descriptor-driven polymorphism" design note, query
//! descriptors are generalised directly into a parametric [`Query`] trait
//! rather than kept as the C original's untyped key/value blobs plus
//! function pointers — each `Query` implementor's type *is* the
//! descriptor identity, and ordinary `Drop` stands in for the original's
//! explicit `key_drop`/`value_drop` callbacks.

mod engine;
mod query;

pub use engine::{Engine, ExecuteError, QueryFailure};
pub use query::Query;
