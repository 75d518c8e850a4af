//! Lock-free single-producer single-consumer ring
//!
//! Bounded power-of-two queue with a per-slot sequence tag. The producer
//! claims a slot when its sequence equals the write position and publishes
//! `pos + 1`; the consumer takes it when the sequence equals `pos + 1` and
//! republishes `pos + capacity`, recycling the slot one lap later. A
//! successful push happens-before the matching pop via the slot's
//! release/acquire pair. Head and tail live on separate cache lines.
//!
//! The producer and consumer sides are split into endpoint handles, so the
//! single-producer/single-consumer contract is enforced by ownership
//! rather than by convention.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_utils::CachePadded;
use dexarb_core::{CoreError, CoreResult};

struct Slot<T> {
    sequence: AtomicUsize,
    value: UnsafeCell<MaybeUninit<T>>,
}

struct Shared<T> {
    buffer: Box<[Slot<T>]>,
    mask: usize,
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
}

// Values move across the ring; the slot protocol guarantees exclusive
// access to each value between publish and take.
unsafe impl<T: Send> Send for Shared<T> {}
unsafe impl<T: Send> Sync for Shared<T> {}

/// Bounded lock-free SPSC ring. Construct with [`SpscRing::with_capacity`]
/// and hand the two endpoints to their threads.
pub struct SpscRing<T>(std::marker::PhantomData<T>);

impl<T: Send> SpscRing<T> {
    /// Build a ring with `capacity` slots (a power of two, at least 2) and
    /// split it into its producer and consumer endpoints.
    pub fn with_capacity(capacity: usize) -> CoreResult<(Producer<T>, Consumer<T>)> {
        if capacity < 2 || !capacity.is_power_of_two() {
            return Err(CoreError::BadRingCapacity(capacity));
        }
        let buffer: Box<[Slot<T>]> = (0..capacity)
            .map(|i| Slot {
                sequence: AtomicUsize::new(i),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect();
        let shared = Arc::new(Shared {
            buffer,
            mask: capacity - 1,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
        });
        Ok((
            Producer {
                shared: Arc::clone(&shared),
            },
            Consumer { shared },
        ))
    }
}

/// Producer endpoint. `Send` but not clonable: exactly one producer.
pub struct Producer<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send> Producer<T> {
    /// Push a value. Wait-free; returns the value back when the ring is
    /// full.
    pub fn push(&mut self, value: T) -> Result<(), T> {
        let shared = &*self.shared;
        let pos = shared.tail.load(Ordering::Relaxed);
        let slot = &shared.buffer[pos & shared.mask];

        if slot.sequence.load(Ordering::Acquire) != pos {
            return Err(value); // full: the consumer has not recycled it yet
        }

        // Safety: the sequence check gives this thread exclusive access to
        // the slot until the release store below.
        unsafe { (*slot.value.get()).write(value) };
        slot.sequence.store(pos + 1, Ordering::Release);
        shared.tail.store(pos + 1, Ordering::Relaxed);
        Ok(())
    }

    /// Number of occupied slots, approximate under concurrency.
    pub fn len(&self) -> usize {
        let shared = &*self.shared;
        shared
            .tail
            .load(Ordering::Relaxed)
            .wrapping_sub(shared.head.load(Ordering::Relaxed))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.mask + 1
    }
}

/// Consumer endpoint. `Send` but not clonable: exactly one consumer.
pub struct Consumer<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send> Consumer<T> {
    /// Pop the oldest value, if any. Wait-free.
    pub fn pop(&mut self) -> Option<T> {
        let shared = &*self.shared;
        let pos = shared.head.load(Ordering::Relaxed);
        let slot = &shared.buffer[pos & shared.mask];

        if slot.sequence.load(Ordering::Acquire) != pos + 1 {
            return None; // empty
        }

        // Safety: the sequence check proves the producer published this
        // slot and will not touch it again until it is recycled below.
        let value = unsafe { (*slot.value.get()).assume_init_read() };
        slot.sequence
            .store(pos + shared.buffer.len(), Ordering::Release);
        shared.head.store(pos + 1, Ordering::Relaxed);
        Some(value)
    }

    /// Pop up to `max` values into `f`. Returns how many were drained.
    pub fn drain(&mut self, max: usize, mut f: impl FnMut(T)) -> usize {
        let mut drained = 0;
        while drained < max {
            match self.pop() {
                Some(value) => {
                    f(value);
                    drained += 1;
                }
                None => break,
            }
        }
        drained
    }

    pub fn len(&self) -> usize {
        let shared = &*self.shared;
        shared
            .tail
            .load(Ordering::Relaxed)
            .wrapping_sub(shared.head.load(Ordering::Relaxed))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.mask + 1
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        // Drop any values still sitting between head and tail.
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Relaxed);
        let mut pos = head;
        while pos != tail {
            let slot = &self.buffer[pos & self.mask];
            if slot.sequence.load(Ordering::Relaxed) == pos + 1 {
                // Safety: the slot holds an initialised, unconsumed value.
                unsafe { (*slot.value.get()).assume_init_drop() };
            }
            pos = pos.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_capacities() {
        assert!(SpscRing::<u64>::with_capacity(0).is_err());
        assert!(SpscRing::<u64>::with_capacity(1).is_err());
        assert!(SpscRing::<u64>::with_capacity(24).is_err());
        assert!(SpscRing::<u64>::with_capacity(8).is_ok());
    }

    #[test]
    fn full_ring_rejects_push_and_preserves_fifo() {
        let (mut tx, mut rx) = SpscRing::with_capacity(8).unwrap();
        for i in 0..8u64 {
            assert!(tx.push(i).is_ok());
        }
        assert_eq!(tx.push(99), Err(99));
        for i in 0..8u64 {
            assert_eq!(rx.pop(), Some(i));
        }
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn slots_recycle_across_laps() {
        let (mut tx, mut rx) = SpscRing::with_capacity(4).unwrap();
        for lap in 0..10u64 {
            for i in 0..4 {
                assert!(tx.push(lap * 4 + i).is_ok());
            }
            for i in 0..4 {
                assert_eq!(rx.pop(), Some(lap * 4 + i));
            }
        }
        assert!(rx.is_empty());
    }

    #[test]
    fn drain_is_bounded() {
        let (mut tx, mut rx) = SpscRing::with_capacity(16).unwrap();
        for i in 0..10u64 {
            tx.push(i).unwrap();
        }
        let mut seen = Vec::new();
        assert_eq!(rx.drain(4, |v| seen.push(v)), 4);
        assert_eq!(seen, vec![0, 1, 2, 3]);
        assert_eq!(rx.drain(usize::MAX, |v| seen.push(v)), 6);
        assert_eq!(seen.len(), 10);
    }

    #[test]
    fn cross_thread_transfer_is_fifo_and_lossless() {
        const COUNT: u64 = 200_000;
        let (mut tx, mut rx) = SpscRing::with_capacity(1024).unwrap();

        let producer = std::thread::spawn(move || {
            let mut next = 0u64;
            while next < COUNT {
                if tx.push(next).is_ok() {
                    next += 1;
                } else {
                    std::hint::spin_loop();
                }
            }
        });

        let mut expected = 0u64;
        while expected < COUNT {
            if let Some(v) = rx.pop() {
                assert_eq!(v, expected);
                expected += 1;
            } else {
                std::hint::spin_loop();
            }
        }
        producer.join().unwrap();
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn unconsumed_values_are_dropped_with_the_ring() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static DROPS: AtomicUsize = AtomicUsize::new(0);

        struct Counted;
        impl Drop for Counted {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::Relaxed);
            }
        }

        let (mut tx, rx) = SpscRing::with_capacity(8).unwrap();
        for _ in 0..5 {
            assert!(tx.push(Counted).is_ok());
        }
        drop(tx);
        drop(rx);
        assert_eq!(DROPS.load(Ordering::Relaxed), 5);
    }
}
