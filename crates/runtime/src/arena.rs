//! Arena allocator
//!
//! Pre-reserves one aligned region at startup and hands out chunks by
//! bumping an atomic offset, so per-cycle scratch never touches the system
//! allocator. Many threads may allocate concurrently; exactly one caller
//! may reset, and only while no allocation from the current cycle is still
//! in use.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use dexarb_core::{CoreError, CoreResult};

/// Default arena size: 64 MiB.
pub const DEFAULT_ARENA_SIZE: usize = 64 * 1024 * 1024;

/// Base alignment of the region: one cache line.
pub const BASE_ALIGN: usize = 64;

pub struct Arena {
    memory: *mut u8,
    size: usize,
    offset: AtomicUsize,
}

// The region is owned by the arena and all mutation goes through the
// atomic offset; handing out disjoint chunks from multiple threads is the
// point of the type.
unsafe impl Send for Arena {}
unsafe impl Sync for Arena {}

impl Arena {
    /// Reserve a zeroed region of `size` bytes, aligned to a cache line.
    pub fn new(size: usize) -> CoreResult<Self> {
        if size == 0 {
            return Err(CoreError::ZeroArenaSize);
        }
        let layout = Layout::from_size_align(size, BASE_ALIGN)
            .map_err(|_| CoreError::AllocationFailed { bytes: size })?;
        // Safety: layout has non-zero size.
        let memory = unsafe { alloc_zeroed(layout) };
        if memory.is_null() {
            return Err(CoreError::AllocationFailed { bytes: size });
        }
        Ok(Self {
            memory,
            size,
            offset: AtomicUsize::new(0),
        })
    }

    pub fn with_default_size() -> CoreResult<Self> {
        Self::new(DEFAULT_ARENA_SIZE)
    }

    /// Allocate `size` bytes at the given power-of-two alignment.
    ///
    /// Returns a null pointer when the arena is exhausted; never aborts.
    /// The memory is uninitialised from the caller's perspective (a reset
    /// does not re-zero it) and no destructors ever run.
    pub fn allocate(&self, size: usize, align: usize) -> *mut u8 {
        debug_assert!(align.is_power_of_two());
        let mut current = self.offset.load(Ordering::Relaxed);
        loop {
            let aligned = align_up(current, align);
            let Some(end) = aligned.checked_add(size) else {
                return ptr::null_mut();
            };
            if end > self.size {
                return ptr::null_mut();
            }
            match self.offset.compare_exchange_weak(
                current,
                end,
                Ordering::Release,
                Ordering::Relaxed,
            ) {
                // Safety: aligned < self.size, region is live.
                Ok(_) => return unsafe { self.memory.add(aligned) },
                Err(actual) => current = actual,
            }
        }
    }

    /// Allocate uninitialised storage for `len` values of `T`.
    ///
    /// The returned slice borrows the arena, so it cannot outlive it;
    /// the caller must still drop it before calling `reset`.
    pub fn alloc_slice_uninit<T>(&self, len: usize) -> Option<&mut [MaybeUninit<T>]> {
        let Some(bytes) = std::mem::size_of::<T>().checked_mul(len) else {
            return None;
        };
        let ptr = self.allocate(bytes, std::mem::align_of::<T>().max(1));
        if ptr.is_null() {
            return None;
        }
        // Safety: the region is owned, aligned for T and sized for len
        // elements; distinct calls return disjoint chunks.
        Some(unsafe { std::slice::from_raw_parts_mut(ptr as *mut MaybeUninit<T>, len) })
    }

    /// Invalidate all outstanding allocations and start over from offset
    /// zero. Must not race with allocations still in use.
    pub fn reset(&self) {
        self.offset.store(0, Ordering::Release);
    }

    pub fn used(&self) -> usize {
        self.offset.load(Ordering::Relaxed).min(self.size)
    }

    pub fn capacity(&self) -> usize {
        self.size
    }

    pub fn remaining(&self) -> usize {
        self.size - self.used()
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        // Safety: memory was allocated with this exact layout in `new`.
        unsafe {
            let layout = Layout::from_size_align_unchecked(self.size, BASE_ALIGN);
            dealloc(self.memory, layout);
        }
    }
}

#[inline]
fn align_up(n: usize, align: usize) -> usize {
    (n + align - 1) & !(align - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn rejects_zero_size() {
        assert!(Arena::new(0).is_err());
    }

    #[test]
    fn allocations_respect_alignment() {
        let arena = Arena::new(4096).unwrap();
        let a = arena.allocate(3, 1);
        let b = arena.allocate(64, 64);
        let c = arena.allocate(16, 32);
        assert!(!a.is_null() && !b.is_null() && !c.is_null());
        assert_eq!(b as usize % 64, 0);
        assert_eq!(c as usize % 32, 0);
        assert!(a < b && b < c);
    }

    #[test]
    fn exhaustion_returns_null() {
        let arena = Arena::new(128).unwrap();
        assert!(!arena.allocate(128, 1).is_null());
        assert!(arena.allocate(1, 1).is_null());
        assert_eq!(arena.remaining(), 0);
    }

    #[test]
    fn reset_recycles_the_region() {
        let arena = Arena::new(256).unwrap();
        let first = arena.allocate(200, 64);
        assert!(!first.is_null());
        assert!(arena.allocate(200, 64).is_null());
        arena.reset();
        assert_eq!(arena.used(), 0);
        let second = arena.allocate(200, 64);
        assert_eq!(first, second);
    }

    #[test]
    fn typed_slices_are_usable() {
        let arena = Arena::new(4096).unwrap();
        let slots = arena.alloc_slice_uninit::<u64>(8).unwrap();
        for (i, slot) in slots.iter_mut().enumerate() {
            slot.write(i as u64 * 3);
        }
        // Safety: every slot was just initialised.
        let values: Vec<u64> = slots.iter().map(|s| unsafe { s.assume_init() }).collect();
        assert_eq!(values, vec![0, 3, 6, 9, 12, 15, 18, 21]);
    }

    #[test]
    fn concurrent_allocations_do_not_overlap() {
        let arena = Arc::new(Arena::new(1 << 20).unwrap());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let arena = Arc::clone(&arena);
            handles.push(std::thread::spawn(move || {
                let mut ptrs = Vec::new();
                for _ in 0..500 {
                    let p = arena.allocate(48, 16);
                    assert!(!p.is_null());
                    ptrs.push(p as usize);
                }
                ptrs
            }));
        }
        let mut all: Vec<usize> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        for pair in all.windows(2) {
            assert!(pair[1] - pair[0] >= 48, "allocations overlap");
        }
    }
}
