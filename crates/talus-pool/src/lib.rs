//! A scoped memory pool: a per-compilation arena owning ad-hoc allocations
//! that outlive a single call but die with the compilation that created
//! them.
//!
//! There is no hidden global allocator here — every operation takes the
//! pool as an explicit parameter (or `&self`). Callers that need "the
//! active pool" thread it through a context object, they never reach for
//! thread-local state.

mod log;
mod pool;

pub use log::{Level, set_logger};
pub use pool::{Handle, Pool};
