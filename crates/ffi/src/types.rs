//! C-compatible mirrors of the core value types
//!
//! Every struct is `#[repr(C)]` with explicit padding to 64-bit
//! boundaries, so the layout is identical from C, and converted to and
//! from the native types by value at the boundary.

use dexarb_core::{ArbitrageOpportunity, PoolReserves, PriceResult, ScannerConfig, U256};

/// 256-bit unsigned integer: four little-endian limbs.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FfiU256 {
    pub limbs: [u64; 4],
}

impl From<U256> for FfiU256 {
    fn from(value: U256) -> Self {
        Self { limbs: value.limbs }
    }
}

impl From<FfiU256> for U256 {
    fn from(value: FfiU256) -> Self {
        U256::from_limbs(value.limbs)
    }
}

/// Pool reserves snapshot.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfiPoolReserves {
    pub reserve0: FfiU256,
    pub reserve1: FfiU256,
    pub timestamp_ms: u64,
    pub token0: u64,
    pub token1: u64,
    pub pool_id: u32,
    pub venue_id: u32,
    pub decimals0: u8,
    pub decimals1: u8,
    pub _pad: [u8; 6],
}

impl From<&FfiPoolReserves> for PoolReserves {
    fn from(value: &FfiPoolReserves) -> Self {
        PoolReserves::new(
            value.reserve0.into(),
            value.reserve1.into(),
            value.timestamp_ms,
            value.pool_id,
            value.venue_id,
            value.token0,
            value.token1,
            value.decimals0,
            value.decimals1,
        )
    }
}

impl From<&PoolReserves> for FfiPoolReserves {
    fn from(value: &PoolReserves) -> Self {
        Self {
            reserve0: value.reserve0.into(),
            reserve1: value.reserve1.into(),
            timestamp_ms: value.timestamp_ms,
            token0: value.token0,
            token1: value.token1,
            pool_id: value.pool_id,
            venue_id: value.venue_id,
            decimals0: value.decimals0,
            decimals1: value.decimals1,
            _pad: [0; 6],
        }
    }
}

/// Price calculation result.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FfiPriceResult {
    pub price: FfiU256,
    pub timestamp_ms: u64,
    pub pool_id: u32,
    pub venue_id: u32,
    pub confidence: i64,
}

impl From<&PriceResult> for FfiPriceResult {
    fn from(value: &PriceResult) -> Self {
        Self {
            price: value.price.into(),
            timestamp_ms: value.timestamp_ms,
            pool_id: value.pool_id,
            venue_id: value.venue_id,
            confidence: value.confidence,
        }
    }
}

/// Arbitrage opportunity.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FfiArbitrageOpportunity {
    pub buy_pool_id: u32,
    pub buy_venue_id: u32,
    pub sell_pool_id: u32,
    pub sell_venue_id: u32,
    pub buy_price: FfiU256,
    pub sell_price: FfiU256,
    pub spread_bps: i64,
    pub max_amount: FfiU256,
    pub estimated_profit: FfiU256,
    pub timestamp_ms: u64,
}

impl From<&ArbitrageOpportunity> for FfiArbitrageOpportunity {
    fn from(value: &ArbitrageOpportunity) -> Self {
        Self {
            buy_pool_id: value.buy_pool_id,
            buy_venue_id: value.buy_venue_id,
            sell_pool_id: value.sell_pool_id,
            sell_venue_id: value.sell_venue_id,
            buy_price: value.buy_price.into(),
            sell_price: value.sell_price.into(),
            spread_bps: value.spread_bps,
            max_amount: value.max_amount.into(),
            estimated_profit: value.estimated_profit.into(),
            timestamp_ms: value.timestamp_ms,
        }
    }
}

/// Scanner configuration.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfiScannerConfig {
    pub min_spread_bps: i64,
    pub max_slippage_bps: i64,
    pub min_liquidity: FfiU256,
    pub max_position_size: FfiU256,
    pub allow_same_venue: u8,
    pub _pad: [u8; 7],
}

impl From<&FfiScannerConfig> for ScannerConfig {
    fn from(value: &FfiScannerConfig) -> Self {
        ScannerConfig {
            min_spread_bps: value.min_spread_bps,
            max_slippage_bps: value.max_slippage_bps,
            min_liquidity: value.min_liquidity.into(),
            max_position_size: value.max_position_size.into(),
            allow_same_venue: value.allow_same_venue != 0,
        }
    }
}

impl From<&ScannerConfig> for FfiScannerConfig {
    fn from(value: &ScannerConfig) -> Self {
        Self {
            min_spread_bps: value.min_spread_bps,
            max_slippage_bps: value.max_slippage_bps,
            min_liquidity: value.min_liquidity.into(),
            max_position_size: value.max_position_size.into(),
            allow_same_venue: value.allow_same_venue as u8,
            _pad: [0; 7],
        }
    }
}
