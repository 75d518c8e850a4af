//! Lock-free runtime primitives for the dexarb hot path
//!
//! - `Arena`: bump allocator for short-lived per-cycle scratch
//! - `SpscRing`: bounded single-producer/single-consumer queue feeding
//!   reserve updates from ingestion threads into the scanner

pub mod arena;
pub mod spsc;

pub use arena::Arena;
pub use spsc::{Consumer, Producer, SpscRing};

use dexarb_core::{PriceUpdate, RING_CAPACITY};

/// The ring instantiation used between ingestion and the scanner.
pub type PriceRing = SpscRing<PriceUpdate>;

/// Build the default-capacity price-update ring, split into its endpoint
/// handles.
pub fn price_ring() -> (Producer<PriceUpdate>, Consumer<PriceUpdate>) {
    // RING_CAPACITY is a power of two, so this cannot fail.
    SpscRing::with_capacity(RING_CAPACITY).expect("default ring capacity is valid")
}
