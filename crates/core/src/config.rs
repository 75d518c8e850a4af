//! Configuration types

use serde::{Deserialize, Serialize};

use crate::errors::{CoreError, CoreResult};
use crate::u256::U256;

/// Opportunity scanner configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Minimum spread to report, in basis points.
    pub min_spread_bps: i64,
    /// Maximum acceptable slippage, in basis points.
    pub max_slippage_bps: i64,
    /// Minimum pool liquidity considered tradeable.
    pub min_liquidity: U256,
    /// Maximum position size per opportunity.
    pub max_position_size: U256,
    /// Report opportunities whose legs share a venue.
    pub allow_same_venue: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            min_spread_bps: 10,                               // 0.1%
            max_slippage_bps: 50,                             // 0.5%
            min_liquidity: U256::from_u128(10u128.pow(19)),   // ~10 tokens at 18 decimals
            max_position_size: U256::from_u128(10u128.pow(22)), // ~10k tokens
            allow_same_venue: false,
        }
    }
}

impl ScannerConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.min_spread_bps < 0 {
            return Err(CoreError::InvalidConfig(
                "min_spread_bps must be non-negative".into(),
            ));
        }
        if self.max_slippage_bps < 0 {
            return Err(CoreError::InvalidConfig(
                "max_slippage_bps must be non-negative".into(),
            ));
        }
        if self.max_position_size.is_zero() {
            return Err(CoreError::InvalidConfig(
                "max_position_size must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Liquidity-depth thresholds for the advisory confidence score.
///
/// The score is a monotone step function of the product of the reserves'
/// low 64-bit limbs. The thresholds have no derivation beyond operational
/// tuning, which is why they live in configuration rather than as
/// constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBands {
    pub shallow: f64,
    pub medium: f64,
    pub deep: f64,
}

impl Default for ConfidenceBands {
    fn default() -> Self {
        Self {
            shallow: 1e18,
            medium: 1e21,
            deep: 1e24,
        }
    }
}

impl ConfidenceBands {
    /// Score a liquidity depth in basis points.
    pub fn score(&self, depth: f64) -> i64 {
        if depth >= self.deep {
            10_000
        } else if depth >= self.medium {
            9_000
        } else if depth >= self.shallow {
            7_000
        } else {
            3_000
        }
    }
}

/// Consumer-thread engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ring records drained per cycle before scanning.
    pub max_drain_per_cycle: usize,
    /// Reset the scratch arena at the end of each cycle.
    pub reset_arena_each_cycle: bool,
    /// Scratch arena size in bytes.
    pub arena_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_drain_per_cycle: 4096,
            reset_arena_each_cycle: true,
            arena_bytes: 64 * 1024 * 1024,
        }
    }
}
