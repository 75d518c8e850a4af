//! Core type definitions
//!
//! Hot-path value types are `#[repr(C)]`, cache-line aligned and explicitly
//! padded so they can be shared with the C ABI and batched through SIMD
//! lanes without conversion.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::u256::U256;

/// Price precision: 18 decimals, like wei.
pub const PRICE_PRECISION: u64 = 1_000_000_000_000_000_000;

/// Basis-point precision.
pub const BPS_PRECISION: i64 = 10_000;

/// Pools tracked by a registry instance.
pub const MAX_POOLS: usize = 4096;

/// Token-pair groups tracked by a registry instance.
pub const MAX_PAIR_GROUPS: usize = 512;

/// Pools per token-pair group.
pub const POOLS_PER_GROUP: usize = 32;

/// Pools per batch-calculator accumulation buffer.
pub const BATCH_CAPACITY: usize = 1024;

/// Default price-update ring capacity (power of two).
pub const RING_CAPACITY: usize = 65536;

/// Lanes in the f64 SIMD kernel.
pub const SIMD_LANES: usize = 4;

/// Well-known venues. Hot-path structs carry raw `u32` ids; this
/// enumeration exists for tests, logs and FFI documentation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Venue {
    UniswapV2 = 1,
    SushiSwap = 2,
    PancakeSwap = 3,
    Camelot = 4,
    Aerodrome = 5,
    QuickSwap = 6,
}

impl Venue {
    pub fn id(&self) -> u32 {
        *self as u32
    }

    pub fn from_id(id: u32) -> Option<Venue> {
        match id {
            1 => Some(Venue::UniswapV2),
            2 => Some(Venue::SushiSwap),
            3 => Some(Venue::PancakeSwap),
            4 => Some(Venue::Camelot),
            5 => Some(Venue::Aerodrome),
            6 => Some(Venue::QuickSwap),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Venue::UniswapV2 => "uniswap-v2",
            Venue::SushiSwap => "sushiswap",
            Venue::PancakeSwap => "pancakeswap",
            Venue::Camelot => "camelot",
            Venue::Aerodrome => "aerodrome",
            Venue::QuickSwap => "quickswap",
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Immutable snapshot of a pool's reserves for one calculation cycle.
///
/// Exactly 128 bytes, one cache-line pair. `token0`/`token1` are the token
/// identifier hashes from the originating update; the registry derives the
/// pair grouping from them. `decimals0`/`decimals1` are informational —
/// prices are always normalised to 18 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(C, align(64))]
pub struct PoolReserves {
    pub reserve0: U256,
    pub reserve1: U256,
    pub timestamp_ms: u64,
    pub token0: u64,
    pub token1: u64,
    pub pool_id: u32,
    pub venue_id: u32,
    pub decimals0: u8,
    pub decimals1: u8,
    _pad: [u8; 30],
}

const _: () = assert!(std::mem::size_of::<PoolReserves>() == 128);

impl PoolReserves {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reserve0: U256,
        reserve1: U256,
        timestamp_ms: u64,
        pool_id: u32,
        venue_id: u32,
        token0: u64,
        token1: u64,
        decimals0: u8,
        decimals1: u8,
    ) -> Self {
        Self {
            reserve0,
            reserve1,
            timestamp_ms,
            token0,
            token1,
            pool_id,
            venue_id,
            decimals0,
            decimals1,
            _pad: [0; 30],
        }
    }

    /// A pool with an empty side cannot be priced.
    #[inline]
    pub fn is_priceless(&self) -> bool {
        self.reserve0.is_zero() || self.reserve1.is_zero()
    }

    /// The token pair this pool trades, in normalised order.
    #[inline]
    pub fn token_pair(&self) -> TokenPair {
        TokenPair::new(self.token0, self.token1)
    }

    /// Fast spot approximation over the low limbs, for SIMD pre-passes.
    #[inline]
    pub fn spot_price_approx(&self) -> f64 {
        let r0 = self.reserve0.low_u64();
        if r0 == 0 {
            return 0.0;
        }
        self.reserve1.low_u64() as f64 / r0 as f64
    }
}

impl Default for PoolReserves {
    fn default() -> Self {
        Self::new(U256::ZERO, U256::ZERO, 0, 0, 0, 0, 0, 18, 18)
    }
}

/// Result of a single price calculation. 64 bytes, cache-line aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(C, align(64))]
pub struct PriceResult {
    /// reserve1 / reserve0, scaled by 10^18.
    pub price: U256,
    pub timestamp_ms: u64,
    pub pool_id: u32,
    pub venue_id: u32,
    /// Advisory liquidity-depth score in basis points (0..=10_000).
    pub confidence: i64,
    _pad: [u8; 8],
}

const _: () = assert!(std::mem::size_of::<PriceResult>() == 64);

impl PriceResult {
    pub fn new(
        price: U256,
        timestamp_ms: u64,
        pool_id: u32,
        venue_id: u32,
        confidence: i64,
    ) -> Self {
        Self {
            price,
            timestamp_ms,
            pool_id,
            venue_id,
            confidence,
            _pad: [0; 8],
        }
    }

    /// A zero price marks a priceless pool; scanners skip these.
    #[inline]
    pub fn is_priced(&self) -> bool {
        !self.price.is_zero() && self.confidence > 0
    }
}

impl Default for PriceResult {
    fn default() -> Self {
        Self::new(U256::ZERO, 0, 0, 0, 0)
    }
}

/// A ranked cross-venue arbitrage opportunity. Value type, owned by the
/// caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(C, align(64))]
pub struct ArbitrageOpportunity {
    pub buy_price: U256,
    pub sell_price: U256,
    /// Optimal input amount for the round trip.
    pub max_amount: U256,
    pub estimated_profit: U256,
    pub spread_bps: i64,
    pub timestamp_ms: u64,
    pub buy_pool_id: u32,
    pub buy_venue_id: u32,
    pub sell_pool_id: u32,
    pub sell_venue_id: u32,
    _pad: [u8; 32],
}

const _: () = assert!(std::mem::size_of::<ArbitrageOpportunity>() == 192);

impl ArbitrageOpportunity {
    pub fn new(
        buy: (u32, u32, U256),
        sell: (u32, u32, U256),
        spread_bps: i64,
        max_amount: U256,
        estimated_profit: U256,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            buy_price: buy.2,
            sell_price: sell.2,
            max_amount,
            estimated_profit,
            spread_bps,
            timestamp_ms,
            buy_pool_id: buy.0,
            buy_venue_id: buy.1,
            sell_pool_id: sell.0,
            sell_venue_id: sell.1,
            _pad: [0; 32],
        }
    }

    /// Return on input in basis points, as an f64 approximation.
    pub fn roi_bps(&self) -> i64 {
        let input = self.max_amount.to_f64();
        if input <= 0.0 {
            return 0;
        }
        (self.estimated_profit.to_f64() / input * BPS_PRECISION as f64) as i64
    }

    /// Crosses two venues.
    #[inline]
    pub fn is_cross_venue(&self) -> bool {
        self.buy_venue_id != self.sell_venue_id
    }
}

/// Pair of token identifier hashes in normalised (sorted) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub token0: u64,
    pub token1: u64,
}

impl TokenPair {
    /// Build a pair key; order of the arguments does not matter.
    #[inline]
    pub fn new(a: u64, b: u64) -> Self {
        if a <= b {
            Self {
                token0: a,
                token1: b,
            }
        } else {
            Self {
                token0: b,
                token1: a,
            }
        }
    }

    /// Single-word key used for hashing and group lookup.
    #[inline]
    pub fn key(&self) -> u64 {
        self.token0 ^ (self.token1 << 1)
    }
}

impl Hash for TokenPair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.key());
    }
}

/// Reserve update record carried through the SPSC ring. 64 bytes.
///
/// `reserve0`/`reserve1` are the low 64 bits of the true reserves; the
/// registry promotes them to `U256`. `price` is a producer-side hint; the
/// registry recomputes it exactly. A zero `pool_hash` is reserved and
/// dropped on ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(C)]
pub struct PriceUpdate {
    pub timestamp_ns: u64,
    pub pool_hash: u64,
    pub chain_id: u32,
    pub venue_id: u32,
    pub token0: u64,
    pub token1: u64,
    pub reserve0: u64,
    pub reserve1: u64,
    pub price: u64,
}

const _: () = assert!(std::mem::size_of::<PriceUpdate>() == 64);

impl PriceUpdate {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.pool_hash != 0
    }

    /// Fold the 64-bit pool hash into the registry's 32-bit pool id.
    #[inline]
    pub fn pool_id(&self) -> u32 {
        (self.pool_hash ^ (self.pool_hash >> 32)) as u32
    }

    /// Promote the wire record to a full reserves snapshot.
    pub fn to_reserves(&self) -> PoolReserves {
        PoolReserves::new(
            U256::from(self.reserve0),
            U256::from(self.reserve1),
            self.timestamp_ns / 1_000_000,
            self.pool_id(),
            self.venue_id,
            self.token0,
            self.token1,
            18,
            18,
        )
    }
}
