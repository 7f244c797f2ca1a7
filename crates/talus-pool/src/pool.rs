use crate::log;
use bumpalo::Bump;
use std::alloc::Layout;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::ptr::NonNull;

/// An identity handed back by [`Pool::allocate`]. Opaque outside this crate;
/// stands in for the "pointer" the original tracked directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    id: u64,
    len: usize,
}

impl Handle {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

struct Entry {
    ptr: NonNull<u8>,
    layout: Layout,
}

/// A per-compilation arena. Allocations are bump-allocated out of an
/// internal [`bumpalo::Bump`] and never individually returned to the
/// allocator; `free`/`release_all` only retire the pool's own bookkeeping
/// so that double-free and use-after-free of a *handle* are still caught.
/// All storage is reclaimed at once when the pool itself is dropped.
///
/// Not thread-safe: a `Pool` is meant to be owned by exactly one logical
/// thread of control for the duration of a compilation, the same way the
/// element cache, builder and query engine are.
pub struct Pool {
    bump: Bump,
    next_id: Cell<u64>,
    live: RefCell<HashMap<u64, Entry>>,
    ever_issued: RefCell<HashSet<u64>>,
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl Pool {
    pub fn new() -> Self {
        Self {
            bump: Bump::new(),
            next_id: Cell::new(0),
            live: RefCell::new(HashMap::new()),
            ever_issued: RefCell::new(HashSet::new()),
        }
    }

    /// Allocates `size` zeroed bytes and returns a handle tracking them.
    pub fn allocate(&self, size: usize) -> Handle {
        let layout = Layout::array::<u8>(size).expect("allocation size overflow");
        let ptr = self.bump.alloc_layout(layout);
        unsafe { ptr.as_ptr().write_bytes(0, size) };

        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.live.borrow_mut().insert(id, Entry { ptr, layout });
        self.ever_issued.borrow_mut().insert(id);
        Handle { id, len: size }
    }

    /// Grows or shrinks an allocation in place (conceptually); the
    /// original bytes (up to `min(old_len, new_size)`) are preserved. The
    /// old handle is retired as if `free` had been called on it.
    pub fn resize(&self, handle: Handle, new_size: usize) -> Handle {
        let old = {
            let mut live = self.live.borrow_mut();
            live.remove(&handle.id)
                .unwrap_or_else(|| self.fatal_foreign(handle))
        };

        let new_handle = self.allocate(new_size);
        let copy_len = handle.len.min(new_size);
        if copy_len > 0 {
            let live = self.live.borrow();
            let new_entry = &live[&new_handle.id];
            unsafe {
                std::ptr::copy_nonoverlapping(
                    old.ptr.as_ptr(),
                    new_entry.ptr.as_ptr(),
                    copy_len,
                );
            }
        }
        new_handle
    }

    /// Reads the bytes backing `handle`. Panics (via the fatal logging
    /// path) if `handle` is not currently live.
    pub fn bytes(&self, handle: Handle) -> &[u8] {
        let live = self.live.borrow();
        match live.get(&handle.id) {
            Some(entry) => unsafe {
                std::slice::from_raw_parts(entry.ptr.as_ptr(), handle.len)
            },
            None => self.fatal_foreign(handle),
        }
    }

    /// Writes `data` into the bytes backing `handle`. `data.len()` must
    /// equal `handle.len()`.
    pub fn write(&self, handle: Handle, data: &[u8]) {
        assert_eq!(data.len(), handle.len(), "write length mismatch");
        let live = self.live.borrow();
        match live.get(&handle.id) {
            Some(entry) => unsafe {
                std::ptr::copy_nonoverlapping(data.as_ptr(), entry.ptr.as_ptr(), data.len());
            },
            None => self.fatal_foreign(handle),
        }
    }

    /// Retires `handle`. Idempotent if `handle` was already freed;
    /// fatal if `handle` was never issued by this pool.
    pub fn free(&self, handle: Handle) {
        if self.live.borrow_mut().remove(&handle.id).is_some() {
            return;
        }
        if self.ever_issued.borrow().contains(&handle.id) {
            // already freed: idempotent.
            return;
        }
        self.fatal_foreign(handle)
    }

    /// Frees every currently live allocation.
    pub fn release_all(&self) {
        self.live.borrow_mut().clear();
    }

    /// Allocates `value` directly in the pool's underlying arena and
    /// returns a reference tied to the pool's lifetime.
    ///
    /// Unlike [`allocate`](Pool::allocate)/[`free`](Pool::free), arena
    /// values are not individually tracked or freed — they live exactly as
    /// long as the pool, matching `bumpalo`'s native typed allocation.
    /// The tree editor's parent-chain frames use this to anchor a rooted
    /// element's back-pointers in the active compilation's pool.
    pub fn alloc<T>(&self, value: T) -> &mut T {
        self.bump.alloc(value)
    }

    fn fatal_foreign(&self, handle: Handle) -> ! {
        log::fatal(format!(
            "handle {:?} is not managed by this pool (double free or foreign handle)",
            handle
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_write_read_round_trip() {
        let pool = Pool::new();
        let handle = pool.allocate(5);
        pool.write(handle, b"hello");
        assert_eq!(pool.bytes(handle), b"hello");
    }

    #[test]
    fn resize_preserves_prefix() {
        let pool = Pool::new();
        let handle = pool.allocate(3);
        pool.write(handle, b"abc");
        let grown = pool.resize(handle, 6);
        assert_eq!(&pool.bytes(grown)[..3], b"abc");
        assert_eq!(grown.len(), 6);
    }

    #[test]
    fn free_is_idempotent() {
        let pool = Pool::new();
        let handle = pool.allocate(4);
        pool.free(handle);
        pool.free(handle); // must not panic/abort
    }

    #[test]
    fn release_all_frees_everything() {
        let pool = Pool::new();
        let a = pool.allocate(4);
        let b = pool.allocate(4);
        pool.release_all();
        pool.free(a);
        pool.free(b);
    }

    #[test]
    fn double_registration_cannot_happen_through_the_safe_api() {
        // Each `allocate` mints a fresh id; there is no way to hand the
        // same handle to the pool twice through the public API, so the
        // "double registration is fatal" rule is enforced by construction
        // rather than by a runtime check.
        let pool = Pool::new();
        let a = pool.allocate(1);
        let b = pool.allocate(1);
        assert_ne!(a, b);
    }
}
