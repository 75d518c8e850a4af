//! Cycle search over the token graph
//!
//! Builds an integer-keyed adjacency map from the registry (token id to
//! neighbouring tokens and the pools touching it) and enumerates 3-hop and
//! 4-hop cycles from a base token. Pools are resolved through the registry
//! on every hop; the graph holds indices, never back-pointers. Per-path
//! input is sized by a bracket search over the exact hop-by-hop
//! simulation.

use std::collections::HashMap;

use dexarb_calculator::swap::calculate_swap_output;
use dexarb_core::U256;

use crate::registry::PoolRegistry;

/// One hop of a cycle: which pool, and in which token direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleHop {
    pub pool_index: u32,
    pub token_in: u64,
    pub token_out: u64,
}

/// A profitable cycle with its sized input.
#[derive(Debug, Clone)]
pub struct CycleOpportunity {
    pub hops: Vec<CycleHop>,
    pub input: U256,
    pub profit: U256,
    pub timestamp_ms: u64,
}

#[derive(Debug, Default)]
struct TokenNode {
    neighbors: Vec<u64>,
    pools: Vec<u32>,
}

/// Token adjacency rebuilt from the registry on demand.
pub struct TokenGraph {
    nodes: HashMap<u64, TokenNode>,
}

impl TokenGraph {
    pub fn build(registry: &PoolRegistry) -> Self {
        let mut nodes: HashMap<u64, TokenNode> = HashMap::new();
        for (index, entry) in registry.valid_entries() {
            if entry.reserves.is_priceless() {
                continue;
            }
            let t0 = entry.reserves.token0;
            let t1 = entry.reserves.token1;
            if t0 == t1 {
                continue;
            }
            let node0 = nodes.entry(t0).or_default();
            if !node0.neighbors.contains(&t1) {
                node0.neighbors.push(t1);
            }
            node0.pools.push(index);

            let node1 = nodes.entry(t1).or_default();
            if !node1.neighbors.contains(&t0) {
                node1.neighbors.push(t0);
            }
            node1.pools.push(index);
        }
        Self { nodes }
    }

    pub fn token_count(&self) -> usize {
        self.nodes.len()
    }

    fn neighbors(&self, token: u64) -> &[u64] {
        self.nodes
            .get(&token)
            .map(|node| node.neighbors.as_slice())
            .unwrap_or(&[])
    }

    fn connects(&self, a: u64, b: u64) -> bool {
        self.neighbors(a).contains(&b)
    }

    /// Best pool carrying `token_in -> token_out`, by cached spot rate.
    fn best_pool(&self, registry: &PoolRegistry, token_in: u64, token_out: u64) -> Option<u32> {
        let node = self.nodes.get(&token_in)?;
        let mut best: Option<(u32, f64)> = None;
        for &index in &node.pools {
            let entry = registry.entry(index);
            let r = &entry.reserves;
            let rate = if r.token0 == token_in && r.token1 == token_out {
                r.reserve1.to_f64() / r.reserve0.to_f64()
            } else if r.token1 == token_in && r.token0 == token_out {
                r.reserve0.to_f64() / r.reserve1.to_f64()
            } else {
                continue;
            };
            if best.map_or(true, |(_, best_rate)| rate > best_rate) {
                best = Some((index, rate));
            }
        }
        best.map(|(index, _)| index)
    }
}

/// Cycle enumerator and sizer.
pub struct CycleSearch {
    /// Upper bound on the bracket-searched input per path.
    pub max_input: U256,
}

impl Default for CycleSearch {
    fn default() -> Self {
        Self {
            // One thousand base tokens at 18 decimals.
            max_input: U256::from_u128(10u128.pow(21)),
        }
    }
}

impl CycleSearch {
    pub fn new(max_input: U256) -> Self {
        Self { max_input }
    }

    /// Enumerate 3-hop cycles `base -> a -> b -> base` and return the
    /// profitable ones, ranked by profit descending.
    pub fn find_triangular(&self, registry: &PoolRegistry, base: u64) -> Vec<CycleOpportunity> {
        let graph = TokenGraph::build(registry);
        let mut found = Vec::new();

        for &a in graph.neighbors(base) {
            for &b in graph.neighbors(a) {
                if b == base || b == a {
                    continue;
                }
                if !graph.connects(b, base) {
                    continue;
                }
                if let Some(opp) = self.size_path(registry, &graph, &[base, a, b, base]) {
                    found.push(opp);
                }
            }
        }

        rank(&mut found);
        found
    }

    /// Enumerate 4-hop cycles `base -> a -> b -> c -> base` with a visited
    /// set, returning to base only at the final hop.
    pub fn find_four_hop(&self, registry: &PoolRegistry, base: u64) -> Vec<CycleOpportunity> {
        let graph = TokenGraph::build(registry);
        let mut found = Vec::new();

        for &a in graph.neighbors(base) {
            for &b in graph.neighbors(a) {
                if b == base || b == a {
                    continue;
                }
                for &c in graph.neighbors(b) {
                    if c == base || c == a || c == b {
                        continue;
                    }
                    if !graph.connects(c, base) {
                        continue;
                    }
                    if let Some(opp) = self.size_path(registry, &graph, &[base, a, b, c, base]) {
                        found.push(opp);
                    }
                }
            }
        }

        rank(&mut found);
        found
    }

    /// Resolve the token walk to hops, size the input by bracket search
    /// and keep the path only when the round trip profits.
    fn size_path(
        &self,
        registry: &PoolRegistry,
        graph: &TokenGraph,
        tokens: &[u64],
    ) -> Option<CycleOpportunity> {
        let mut hops = Vec::with_capacity(tokens.len() - 1);
        let mut timestamp_ms = 0;
        for pair in tokens.windows(2) {
            let pool_index = graph.best_pool(registry, pair[0], pair[1])?;
            timestamp_ms = timestamp_ms.max(registry.entry(pool_index).reserves.timestamp_ms);
            hops.push(CycleHop {
                pool_index,
                token_in: pair[0],
                token_out: pair[1],
            });
        }

        let (input, profit) = self.optimize_input(registry, &hops);
        if profit.is_zero() {
            return None;
        }
        Some(CycleOpportunity {
            hops,
            input,
            profit,
            timestamp_ms,
        })
    }

    /// Ternary search for the profit-maximising input over the exact path
    /// simulation; the profit curve is unimodal in the input.
    fn optimize_input(&self, registry: &PoolRegistry, hops: &[CycleHop]) -> (U256, U256) {
        let mut lo = 0.0f64;
        let mut hi = self.max_input.to_f64();
        for _ in 0..48 {
            let third = (hi - lo) / 3.0;
            let m1 = U256::from_f64(lo + third);
            let m2 = U256::from_f64(hi - third);
            let p1 = path_profit(registry, hops, &m1);
            let p2 = path_profit(registry, hops, &m2);
            if p1 < p2 {
                lo += third;
            } else {
                hi -= third;
            }
        }
        let input = U256::from_f64((lo + hi) / 2.0);
        (input, path_profit(registry, hops, &input))
    }
}

/// Compose per-hop swap outputs along the path.
pub fn simulate_path(registry: &PoolRegistry, hops: &[CycleHop], input: &U256) -> U256 {
    let mut amount = *input;
    for hop in hops {
        if amount.is_zero() {
            return U256::ZERO;
        }
        let reserves = &registry.entry(hop.pool_index).reserves;
        amount = if reserves.token0 == hop.token_in {
            calculate_swap_output(&reserves.reserve0, &reserves.reserve1, &amount)
        } else {
            calculate_swap_output(&reserves.reserve1, &reserves.reserve0, &amount)
        };
    }
    amount
}

fn path_profit(registry: &PoolRegistry, hops: &[CycleHop], input: &U256) -> U256 {
    simulate_path(registry, hops, input).saturating_sub(input)
}

fn rank(found: &mut [CycleOpportunity]) {
    found.sort_unstable_by(|a, b| b.profit.cmp(&a.profit));
}
