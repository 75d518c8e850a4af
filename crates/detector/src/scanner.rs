//! Opportunity scanner
//!
//! Enumerates pool pairs within each token-pair group, evaluates both
//! trade directions, sizes the profitable ones and ranks them. Groups of
//! four or more pools go through the 4-wide spread kernel with the
//! diagonal lane masked; admission is otherwise identical to the scalar
//! path.

use std::time::Instant;

use dexarb_calculator::swap::{calculate_arbitrage_profit, calculate_optimal_trade_size};
use dexarb_core::{
    simd, ArbitrageOpportunity, PoolReserves, PriceUpdate, ScannerConfig, POOLS_PER_GROUP,
    SIMD_LANES,
};

use crate::registry::{PairGroup, PoolEntry, PoolRegistry};

/// Cross-venue opportunity scanner over a pool registry it owns.
pub struct OpportunityScanner {
    registry: PoolRegistry,
    config: ScannerConfig,
    scan_count: u64,
    last_scan_ns: u64,
}

impl OpportunityScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            registry: PoolRegistry::new(),
            config,
            scan_count: 0,
            last_scan_ns: 0,
        }
    }

    /// Upsert a pool snapshot; see [`PoolRegistry::update_pool`].
    pub fn update_pool(&mut self, reserves: PoolReserves) -> bool {
        self.registry.update_pool(reserves)
    }

    /// Apply a ring record; see [`PoolRegistry::apply_update`].
    pub fn apply_update(&mut self, update: &PriceUpdate) -> bool {
        self.registry.apply_update(update)
    }

    /// Scan every token-pair group and return opportunities ranked by
    /// estimated profit (ties: spread, then timestamp, descending).
    pub fn scan(&mut self) -> Vec<ArbitrageOpportunity> {
        let started = Instant::now();
        let mut opportunities = Vec::new();

        for group in self.registry.pair_groups() {
            if group.count >= 2 {
                scan_group(&self.registry, group, &self.config, &mut |opp| {
                    opportunities.push(opp)
                });
            }
        }

        opportunities.sort_unstable_by(|a, b| {
            b.estimated_profit
                .cmp(&a.estimated_profit)
                .then(b.spread_bps.cmp(&a.spread_bps))
                .then(b.timestamp_ms.cmp(&a.timestamp_ms))
        });

        self.scan_count += 1;
        self.last_scan_ns = started.elapsed().as_nanos() as u64;
        opportunities
    }

    /// Scan and hand each admitted opportunity to `callback`, in
    /// enumeration order, without allocating. The callback must not
    /// re-enter the scanner.
    pub fn scan_streaming(&mut self, mut callback: impl FnMut(&ArbitrageOpportunity)) -> usize {
        let started = Instant::now();
        let mut count = 0usize;

        for group in self.registry.pair_groups() {
            if group.count < 2 {
                continue;
            }
            if group.count as usize >= SIMD_LANES {
                scan_group_simd(&self.registry, group, &self.config, &mut |opp| {
                    count += 1;
                    callback(&opp);
                });
            } else {
                scan_group(&self.registry, group, &self.config, &mut |opp| {
                    count += 1;
                    callback(&opp);
                });
            }
        }

        self.scan_count += 1;
        self.last_scan_ns = started.elapsed().as_nanos() as u64;
        count
    }

    /// The single best opportunity under the ranking order of [`scan`],
    /// tracked without building an output vector.
    ///
    /// [`scan`]: OpportunityScanner::scan
    pub fn get_best(&mut self) -> Option<ArbitrageOpportunity> {
        let started = Instant::now();
        let mut best: Option<ArbitrageOpportunity> = None;

        for group in self.registry.pair_groups() {
            if group.count < 2 {
                continue;
            }
            scan_group(&self.registry, group, &self.config, &mut |opp| {
                let better = match &best {
                    None => true,
                    Some(current) => {
                        (opp.estimated_profit, opp.spread_bps, opp.timestamp_ms)
                            > (current.estimated_profit, current.spread_bps, current.timestamp_ms)
                    }
                };
                if better {
                    best = Some(opp);
                }
            });
        }

        self.scan_count += 1;
        self.last_scan_ns = started.elapsed().as_nanos() as u64;
        best
    }

    pub fn clear(&mut self) {
        self.registry.clear();
    }

    pub fn pool_count(&self) -> usize {
        self.registry.pool_count()
    }

    pub fn set_config(&mut self, config: ScannerConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn registry(&self) -> &PoolRegistry {
        &self.registry
    }

    pub fn scan_count(&self) -> u64 {
        self.scan_count
    }

    pub fn last_scan_ns(&self) -> u64 {
        self.last_scan_ns
    }
}

/// Scalar pair enumeration: every unordered pool pair, both directions.
fn scan_group(
    registry: &PoolRegistry,
    group: &PairGroup,
    config: &ScannerConfig,
    emit: &mut dyn FnMut(ArbitrageOpportunity),
) {
    let indices = group.pool_indices();
    for (slot, &index_a) in indices.iter().enumerate() {
        for &index_b in &indices[slot + 1..] {
            let pool_a = registry.entry(index_a);
            let pool_b = registry.entry(index_b);
            if !pool_a.valid || !pool_b.valid {
                continue;
            }

            if let Some(opp) = evaluate_direction(pool_a, pool_b, config, None) {
                emit(opp);
            }
            if let Some(opp) = evaluate_direction(pool_b, pool_a, config, None) {
                emit(opp);
            }
        }
    }
}

/// SIMD pair enumeration: for each buy candidate, spreads against four
/// sell candidates at a time. The diagonal lane (sell == buy) is masked
/// out; admission past the spread check is shared with the scalar path.
fn scan_group_simd(
    registry: &PoolRegistry,
    group: &PairGroup,
    config: &ScannerConfig,
    emit: &mut dyn FnMut(ArbitrageOpportunity),
) {
    let indices = group.pool_indices();
    let count = indices.len();

    let mut prices = [0.0f64; POOLS_PER_GROUP];
    for (lane, &index) in indices.iter().enumerate() {
        prices[lane] = registry.entry(index).price.price.to_f64();
    }

    for (a, &index_a) in indices.iter().enumerate() {
        let pool_a = registry.entry(index_a);
        if !pool_a.valid {
            continue;
        }
        let buy_price = prices[a];

        let mut b = 0;
        while b + SIMD_LANES <= count {
            let quad = [prices[b], prices[b + 1], prices[b + 2], prices[b + 3]];
            let spreads = simd::spread_bps_x4(buy_price, &quad);

            for (lane, &spread) in spreads.iter().enumerate() {
                if b + lane == a {
                    continue; // masked diagonal: a pool cannot trade against itself
                }
                let pool_b = registry.entry(indices[b + lane]);
                if !pool_b.valid {
                    continue;
                }
                if let Some(opp) =
                    evaluate_direction(pool_a, pool_b, config, Some(spread as i64))
                {
                    emit(opp);
                }
            }
            b += SIMD_LANES;
        }

        // Scalar tail for the remainder lanes.
        while b < count {
            if b != a {
                let pool_b = registry.entry(indices[b]);
                if pool_b.valid {
                    if let Some(opp) = evaluate_direction(pool_a, pool_b, config, None) {
                        emit(opp);
                    }
                }
            }
            b += 1;
        }
    }
}

/// Evaluate one ordered (buy, sell) direction. `precomputed_spread` lets
/// the SIMD path reuse its lane result; admission is identical either way.
fn evaluate_direction(
    buy: &PoolEntry,
    sell: &PoolEntry,
    config: &ScannerConfig,
    precomputed_spread: Option<i64>,
) -> Option<ArbitrageOpportunity> {
    if !buy.price.is_priced() || !sell.price.is_priced() {
        return None;
    }

    let spread_bps = match precomputed_spread {
        Some(spread) => spread,
        None => spread_bps(buy.price.price.to_f64(), sell.price.price.to_f64()),
    };
    if spread_bps < config.min_spread_bps {
        return None;
    }

    if !config.allow_same_venue && buy.reserves.venue_id == sell.reserves.venue_id {
        return None;
    }

    let max_amount = calculate_optimal_trade_size(
        &buy.reserves.reserve0,
        &buy.reserves.reserve1,
        &sell.reserves.reserve0,
        &sell.reserves.reserve1,
    );
    if max_amount.is_zero() || max_amount > config.max_position_size {
        return None;
    }

    let estimated_profit = calculate_arbitrage_profit(&buy.reserves, &sell.reserves, &max_amount);
    if estimated_profit.is_zero() {
        return None;
    }

    Some(ArbitrageOpportunity::new(
        (buy.reserves.pool_id, buy.reserves.venue_id, buy.price.price),
        (
            sell.reserves.pool_id,
            sell.reserves.venue_id,
            sell.price.price,
        ),
        spread_bps,
        max_amount,
        estimated_profit,
        buy.reserves.timestamp_ms.max(sell.reserves.timestamp_ms),
    ))
}

/// `(sell - buy) / buy * 10_000`, truncated toward zero.
fn spread_bps(buy_price: f64, sell_price: f64) -> i64 {
    if buy_price <= 0.0 {
        return 0;
    }
    ((sell_price - buy_price) / buy_price * 10_000.0) as i64
}
