//! Pool registry
//!
//! Flat, fixed-capacity storage for pool state, keyed by
//! `(venue_id, pool_id)` and grouped by token pair for scanning. A single
//! consumer thread owns the registry; there is no interior
//! synchronisation.

use dexarb_calculator::price::calculate_price_with_bands;
use dexarb_core::{
    ConfidenceBands, PoolReserves, PriceResult, PriceUpdate, TokenPair, MAX_PAIR_GROUPS,
    MAX_POOLS, POOLS_PER_GROUP,
};

/// One tracked pool: its latest reserves and the price cached from them.
#[derive(Debug, Clone, Copy)]
pub struct PoolEntry {
    pub reserves: PoolReserves,
    pub price: PriceResult,
    pub valid: bool,
}

impl Default for PoolEntry {
    fn default() -> Self {
        Self {
            reserves: PoolReserves::default(),
            price: PriceResult::default(),
            valid: false,
        }
    }
}

/// Pools sharing a token pair, stored as indices into the pool array.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PairGroup {
    pub pair: TokenPair,
    pub indices: [u32; POOLS_PER_GROUP],
    pub count: u8,
}

impl Default for PairGroup {
    fn default() -> Self {
        Self {
            pair: TokenPair::new(0, 0),
            indices: [0; POOLS_PER_GROUP],
            count: 0,
        }
    }
}

impl PairGroup {
    pub(crate) fn pool_indices(&self) -> &[u32] {
        &self.indices[..self.count as usize]
    }
}

/// Fixed-capacity registry of pool state.
pub struct PoolRegistry {
    pools: Box<[PoolEntry]>,
    pool_count: usize,
    groups: Box<[PairGroup]>,
    pair_count: usize,
    bands: ConfidenceBands,
    dropped: u64,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::with_bands(ConfidenceBands::default())
    }

    pub fn with_bands(bands: ConfidenceBands) -> Self {
        Self {
            pools: vec![PoolEntry::default(); MAX_POOLS].into_boxed_slice(),
            pool_count: 0,
            groups: vec![PairGroup::default(); MAX_PAIR_GROUPS].into_boxed_slice(),
            pair_count: 0,
            bands,
            dropped: 0,
        }
    }

    /// Upsert a pool snapshot and recompute its cached price.
    ///
    /// Existing pools (matched on `(venue_id, pool_id)`) are overwritten in
    /// place. New pools are appended and indexed under their token-pair
    /// group. When the pool table, the group table or the target group is
    /// full, the update is dropped whole and `false` is returned.
    pub fn update_pool(&mut self, reserves: PoolReserves) -> bool {
        let key = (reserves.venue_id, reserves.pool_id);
        let existing = self.pools[..self.pool_count]
            .iter()
            .position(|entry| (entry.reserves.venue_id, entry.reserves.pool_id) == key);

        let index = match existing {
            Some(index) => index,
            None => {
                if self.pool_count >= MAX_POOLS {
                    self.dropped += 1;
                    return false;
                }
                let index = self.pool_count;
                // Group membership must be secured before the append so a
                // full group leaves no partial state behind.
                if !self.index_in_group(reserves.token_pair(), index as u32) {
                    self.dropped += 1;
                    return false;
                }
                self.pool_count += 1;
                index
            }
        };

        let entry = &mut self.pools[index];
        entry.reserves = reserves;
        entry.price = calculate_price_with_bands(&reserves, &self.bands);
        entry.valid = true;
        true
    }

    /// Promote a ring record and apply it. Records with the reserved zero
    /// pool hash are dropped.
    pub fn apply_update(&mut self, update: &PriceUpdate) -> bool {
        if !update.is_valid() {
            self.dropped += 1;
            return false;
        }
        self.update_pool(update.to_reserves())
    }

    /// Ensure `pool_index` is listed under `pair`, creating the group when
    /// capacity allows. Membership is unique.
    fn index_in_group(&mut self, pair: TokenPair, pool_index: u32) -> bool {
        for group in self.groups[..self.pair_count].iter_mut() {
            if group.pair == pair {
                if group.pool_indices().contains(&pool_index) {
                    return true;
                }
                if (group.count as usize) < POOLS_PER_GROUP {
                    group.indices[group.count as usize] = pool_index;
                    group.count += 1;
                    return true;
                }
                return false;
            }
        }
        if self.pair_count >= MAX_PAIR_GROUPS {
            return false;
        }
        let group = &mut self.groups[self.pair_count];
        group.pair = pair;
        group.indices[0] = pool_index;
        group.count = 1;
        self.pair_count += 1;
        true
    }

    pub fn get(&self, venue_id: u32, pool_id: u32) -> Option<&PoolEntry> {
        self.pools[..self.pool_count]
            .iter()
            .find(|entry| entry.reserves.venue_id == venue_id && entry.reserves.pool_id == pool_id)
    }

    pub fn get_price(&self, venue_id: u32, pool_id: u32) -> Option<&PriceResult> {
        self.get(venue_id, pool_id).map(|entry| &entry.price)
    }

    /// Reset all state; entry storage is zeroed.
    pub fn clear(&mut self) {
        self.pools[..self.pool_count].fill(PoolEntry::default());
        self.groups[..self.pair_count].fill(PairGroup::default());
        self.pool_count = 0;
        self.pair_count = 0;
        self.dropped = 0;
    }

    pub fn pool_count(&self) -> usize {
        self.pool_count
    }

    pub fn pair_count(&self) -> usize {
        self.pair_count
    }

    /// Updates dropped due to capacity or invalid records.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub(crate) fn pair_groups(&self) -> &[PairGroup] {
        &self.groups[..self.pair_count]
    }

    pub(crate) fn entry(&self, index: u32) -> &PoolEntry {
        &self.pools[index as usize]
    }

    /// Iterate valid entries, for graph building.
    pub(crate) fn valid_entries(&self) -> impl Iterator<Item = (u32, &PoolEntry)> {
        self.pools[..self.pool_count]
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.valid)
            .map(|(i, entry)| (i as u32, entry))
    }
}

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dexarb_core::{U256, PRICE_PRECISION};

    fn reserves(pool_id: u32, venue_id: u32, r0: u64, r1: u64, t0: u64, t1: u64) -> PoolReserves {
        PoolReserves::new(
            U256::from(r0),
            U256::from(r1),
            100,
            pool_id,
            venue_id,
            t0,
            t1,
            18,
            18,
        )
    }

    #[test]
    fn updating_existing_pool_keeps_count_and_refreshes_price() {
        let mut registry = PoolRegistry::new();
        assert!(registry.update_pool(reserves(1, 1, PRICE_PRECISION, PRICE_PRECISION, 10, 20)));
        assert_eq!(registry.pool_count(), 1);

        assert!(registry.update_pool(reserves(1, 1, PRICE_PRECISION, 2 * PRICE_PRECISION, 10, 20)));
        assert_eq!(registry.pool_count(), 1);

        let price = registry.get_price(1, 1).unwrap();
        assert_eq!(price.price, U256::from_u128(2 * PRICE_PRECISION as u128));
    }

    #[test]
    fn pools_group_by_token_pair_not_by_venue() {
        let mut registry = PoolRegistry::new();
        // Same token pair across three venues, tokens in both orders.
        assert!(registry.update_pool(reserves(1, 1, 100, 200, 10, 20)));
        assert!(registry.update_pool(reserves(2, 2, 100, 210, 20, 10)));
        assert!(registry.update_pool(reserves(3, 3, 100, 190, 10, 20)));
        // A different pair.
        assert!(registry.update_pool(reserves(4, 1, 100, 100, 10, 30)));

        assert_eq!(registry.pool_count(), 4);
        assert_eq!(registry.pair_count(), 2);
        let groups = registry.pair_groups();
        assert_eq!(groups[0].pool_indices().len(), 3);
        assert_eq!(groups[1].pool_indices().len(), 1);
    }

    #[test]
    fn group_membership_is_unique_across_updates() {
        let mut registry = PoolRegistry::new();
        for _ in 0..5 {
            assert!(registry.update_pool(reserves(7, 7, 100, 200, 1, 2)));
        }
        assert_eq!(registry.pair_groups()[0].pool_indices().len(), 1);
    }

    #[test]
    fn capacity_overflow_drops_updates() {
        let mut registry = PoolRegistry::new();
        for i in 0..MAX_POOLS as u32 {
            // Unique pair per pool would exhaust groups first; share pairs.
            let pair = (i % MAX_PAIR_GROUPS as u32) as u64;
            assert!(registry.update_pool(reserves(i, 1, 100, 200, pair * 2, pair * 2 + 1)));
        }
        assert_eq!(registry.pool_count(), MAX_POOLS);
        assert!(!registry.update_pool(reserves(u32::MAX, 9, 100, 200, 1, 2)));
        assert_eq!(registry.pool_count(), MAX_POOLS);
        assert_eq!(registry.dropped(), 1);
    }

    #[test]
    fn full_group_drops_new_members_without_partial_state() {
        let mut registry = PoolRegistry::new();
        for i in 0..POOLS_PER_GROUP as u32 {
            assert!(registry.update_pool(reserves(i, 1, 100, 200, 5, 6)));
        }
        let count_before = registry.pool_count();
        assert!(!registry.update_pool(reserves(999, 1, 100, 200, 5, 6)));
        assert_eq!(registry.pool_count(), count_before);
        assert!(registry.get(1, 999).is_none());
    }

    #[test]
    fn ring_records_promote_and_reject_reserved_hash() {
        let mut registry = PoolRegistry::new();
        let mut update = PriceUpdate {
            timestamp_ns: 5_000_000,
            pool_hash: 0xfeed,
            chain_id: 1,
            venue_id: 3,
            token0: 40,
            token1: 41,
            reserve0: 1_000,
            reserve1: 2_000,
            price: 0,
        };
        assert!(registry.apply_update(&update));
        assert_eq!(registry.pool_count(), 1);

        update.pool_hash = 0;
        assert!(!registry.apply_update(&update));
        assert_eq!(registry.pool_count(), 1);
        assert_eq!(registry.dropped(), 1);
    }

    #[test]
    fn clear_resets_everything() {
        let mut registry = PoolRegistry::new();
        registry.update_pool(reserves(1, 1, 100, 200, 10, 20));
        registry.clear();
        assert_eq!(registry.pool_count(), 0);
        assert_eq!(registry.pair_count(), 0);
        assert!(registry.get(1, 1).is_none());
    }
}
