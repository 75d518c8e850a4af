//! Spot price calculation over pool reserves
//!
//! Prices are reserve1 / reserve0 normalised to 18 decimals. The fast path
//! runs in 128-bit intermediates; when `reserve1 * 10^18` would overflow,
//! both reserves are right-shifted together by the minimal power of two
//! that averts it, trading at most one low-limb ULP for availability.

use dexarb_core::{
    simd, ConfidenceBands, PoolReserves, PriceResult, U256, PRICE_PRECISION, SIMD_LANES,
};

/// Calculate the price of a single pool with default confidence bands.
pub fn calculate_price(reserves: &PoolReserves) -> PriceResult {
    calculate_price_with_bands(reserves, &ConfidenceBands::default())
}

/// Calculate the price of a single pool.
///
/// A zero `reserve0` yields a zero price with zero confidence; everything
/// else yields a priced result with an advisory confidence score.
pub fn calculate_price_with_bands(
    reserves: &PoolReserves,
    bands: &ConfidenceBands,
) -> PriceResult {
    if reserves.reserve0.is_zero() {
        return PriceResult::new(
            U256::ZERO,
            reserves.timestamp_ms,
            reserves.pool_id,
            reserves.venue_id,
            0,
        );
    }

    let (mut r0, mut r1) = scale_to_u128(&reserves.reserve0, &reserves.reserve1);

    // Scale both sides down until the numerator fits 128 bits.
    let limit = u128::MAX / PRICE_PRECISION as u128;
    while r1 > limit {
        r1 >>= 1;
        r0 >>= 1;
    }
    let r0 = r0.max(1);

    let price = r1 * PRICE_PRECISION as u128 / r0;

    // Liquidity depth over the low limbs drives the advisory confidence.
    let depth = reserves.reserve0.low_u64() as f64 * reserves.reserve1.low_u64() as f64;

    PriceResult::new(
        U256::from_u128(price),
        reserves.timestamp_ms,
        reserves.pool_id,
        reserves.venue_id,
        bands.score(depth),
    )
}

/// Bring both reserves into 128-bit range with one shared right shift,
/// preserving their ratio.
fn scale_to_u128(r0: &U256, r1: &U256) -> (u128, u128) {
    let bits = r0.bit_len().max(r1.bit_len());
    if bits <= 128 {
        (r0.low_u128(), r1.low_u128())
    } else {
        let shift = bits - 128;
        (r0.shr(shift).low_u128(), r1.shr(shift).low_u128())
    }
}

/// Calculate prices for a slice of pools, writing one result per pool.
///
/// A 4-wide f64 pre-pass over the low limbs flags pools that cannot be
/// priced so they skip the wide division; every emitted price equals the
/// single-pool result. Returns the number of results written.
pub fn calculate_prices_batch(pools: &[PoolReserves], out: &mut [PriceResult]) -> usize {
    calculate_prices_batch_with_bands(pools, out, &ConfidenceBands::default())
}

/// Batch price calculation with explicit confidence bands.
pub fn calculate_prices_batch_with_bands(
    pools: &[PoolReserves],
    out: &mut [PriceResult],
    bands: &ConfidenceBands,
) -> usize {
    let n = pools.len().min(out.len());

    let mut r0_low = [0u64; SIMD_LANES];
    let mut r1_low = [0u64; SIMD_LANES];
    let mut approx = [0f64; SIMD_LANES];

    let mut i = 0;
    while i + SIMD_LANES <= n {
        for lane in 0..SIMD_LANES {
            r0_low[lane] = pools[i + lane].reserve0.low_u64();
            r1_low[lane] = pools[i + lane].reserve1.low_u64();
        }
        simd::price_approx_batch(&r0_low, &r1_low, &mut approx);

        for lane in 0..SIMD_LANES {
            let pool = &pools[i + lane];
            // A zero approximation is only trusted once the full reserve
            // confirms it; high limbs may still carry liquidity.
            if approx[lane] == 0.0 && pool.reserve0.is_zero() {
                out[i + lane] = PriceResult::new(
                    U256::ZERO,
                    pool.timestamp_ms,
                    pool.pool_id,
                    pool.venue_id,
                    0,
                );
            } else {
                out[i + lane] = calculate_price_with_bands(pool, bands);
            }
        }
        i += SIMD_LANES;
    }

    while i < n {
        out[i] = calculate_price_with_bands(&pools[i], bands);
        i += 1;
    }

    n
}
