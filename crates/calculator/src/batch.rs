//! Batch price calculator
//!
//! Accumulates pool snapshots and prices them in one pass, so callers that
//! receive reserves in bursts amortise the per-call overhead and keep the
//! pool data contiguous for the SIMD pre-pass.

use dexarb_core::{ConfidenceBands, PoolReserves, PriceResult, BATCH_CAPACITY};

use crate::price::calculate_prices_batch_with_bands;

/// Fixed-capacity accumulation buffer over [`calculate_prices_batch`].
pub struct BatchPriceCalculator {
    pools: Box<[PoolReserves]>,
    count: usize,
    bands: ConfidenceBands,
}

impl BatchPriceCalculator {
    pub fn new() -> Self {
        Self::with_bands(ConfidenceBands::default())
    }

    pub fn with_bands(bands: ConfidenceBands) -> Self {
        Self {
            pools: vec![PoolReserves::default(); BATCH_CAPACITY].into_boxed_slice(),
            count: 0,
            bands,
        }
    }

    /// Add a pool snapshot. Returns false when the batch is full; the
    /// snapshot is dropped.
    pub fn add_pool(&mut self, reserves: &PoolReserves) -> bool {
        if self.count >= BATCH_CAPACITY {
            return false;
        }
        self.pools[self.count] = *reserves;
        self.count += 1;
        true
    }

    /// Price every accumulated pool into `out`, bounded by its capacity.
    /// Returns the number of results written. The batch is kept so it can
    /// be re-processed or cleared by the caller.
    pub fn process(&self, out: &mut [PriceResult]) -> usize {
        calculate_prices_batch_with_bands(&self.pools[..self.count], out, &self.bands)
    }

    pub fn clear(&mut self) {
        self.count = 0;
    }

    pub fn pool_count(&self) -> usize {
        self.count
    }

    pub const fn max_capacity() -> usize {
        BATCH_CAPACITY
    }

    pub fn bands(&self) -> &ConfidenceBands {
        &self.bands
    }
}

impl Default for BatchPriceCalculator {
    fn default() -> Self {
        Self::new()
    }
}
