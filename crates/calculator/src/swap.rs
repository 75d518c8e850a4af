//! Constant-product swap math and arbitrage sizing
//!
//! All swaps model the 30 bps fee as the 997/1000 split applied to the
//! input. Outputs truncate toward zero. The u128 fast path covers typical
//! reserves; anything larger runs through the 512-bit widening multiply so
//! 128-bit reserves can never overflow.

use dexarb_core::{PoolReserves, U256, PRICE_PRECISION};

const FEE_NUMERATOR: u64 = 997;
const FEE_DENOMINATOR: u64 = 1000;

/// Output amount of a constant-product swap under the 30 bps fee:
/// `out = (reserve_out * amount_in * 997) / (reserve_in * 1000 + amount_in * 997)`.
///
/// Returns zero when the input reserve or the input amount is zero.
pub fn calculate_swap_output(reserve_in: &U256, reserve_out: &U256, amount_in: &U256) -> U256 {
    if reserve_in.is_zero() || amount_in.is_zero() {
        return U256::ZERO;
    }

    let amount_with_fee = amount_in.mul_u64(FEE_NUMERATOR);
    let denominator = reserve_in
        .mul_u64(FEE_DENOMINATOR)
        .wrapping_add(&amount_with_fee);
    if denominator.is_zero() {
        return U256::ZERO;
    }

    // Fast path: everything fits 128 bits and the product does too.
    if let (Some(r_out), Some(a_fee), Some(den)) = (
        reserve_out.to_u128(),
        amount_with_fee.to_u128(),
        denominator.to_u128(),
    ) {
        if let Some(numerator) = r_out.checked_mul(a_fee) {
            return U256::from_u128(numerator / den);
        }
    }

    U256::mul_div(reserve_out, &amount_with_fee, &denominator)
}

/// Slippage of a trade against the spot price, in basis points:
/// `(spot - exec) / spot * 10_000`. Zero for degenerate inputs, positive
/// for any non-zero trade against a non-empty pool.
pub fn calculate_slippage_bps(reserve_in: &U256, reserve_out: &U256, amount_in: &U256) -> i64 {
    if reserve_in.is_zero() || reserve_out.is_zero() || amount_in.is_zero() {
        return 0;
    }

    let r_in = reserve_in.to_f64();
    let r_out = reserve_out.to_f64();
    let a_in = amount_in.to_f64();

    let spot = r_out / r_in;
    if spot <= 0.0 {
        return 0;
    }

    let amount_out = calculate_swap_output(reserve_in, reserve_out, amount_in);
    let exec = amount_out.to_f64() / a_in;

    let slippage = (spot - exec) / spot * 10_000.0;
    (slippage as i64).max(0)
}

/// Simulate the two-pool round trip that realises a cross-venue spread:
/// sell `amount_in` of token1 into the buy pool (where token0 is cheap),
/// then sell the received token0 into the sell pool. Returns the final
/// token1 amount.
fn simulate_round_trip(buy: &PoolReserves, sell: &PoolReserves, amount_in: &U256) -> U256 {
    let token0_received = calculate_swap_output(&buy.reserve1, &buy.reserve0, amount_in);
    calculate_swap_output(&sell.reserve0, &sell.reserve1, &token0_received)
}

/// Round-trip arbitrage profit for a given trade size, clamped to zero.
pub fn calculate_arbitrage_profit(
    buy: &PoolReserves,
    sell: &PoolReserves,
    trade_size: &U256,
) -> U256 {
    if trade_size.is_zero() {
        return U256::ZERO;
    }
    simulate_round_trip(buy, sell, trade_size).saturating_sub(trade_size)
}

/// Optimal input for the two-pool round trip.
///
/// The closed form `sqrt(r0b * r1b * r0s * r1s * 0.997^2) - r_buy` over
/// 1e18-normalised reserves seeds an upper bracket; a ternary search over
/// the exact round-trip simulation then locates the profit maximum (the
/// profit curve is unimodal in the input). Returns zero when no positive
/// seed exists.
pub fn calculate_optimal_trade_size(
    reserve0_buy: &U256,
    reserve1_buy: &U256,
    reserve0_sell: &U256,
    reserve1_sell: &U256,
) -> U256 {
    const NORM: f64 = PRICE_PRECISION as f64;
    let r0b = reserve0_buy.to_f64() / NORM;
    let r1b = reserve1_buy.to_f64() / NORM;
    let r0s = reserve0_sell.to_f64() / NORM;
    let r1s = reserve1_sell.to_f64() / NORM;

    let fee_factor = 0.997 * 0.997; // two swaps
    let seed = (r0b * r1b * r0s * r1s * fee_factor).sqrt() - r0b;
    if !(seed > 0.0) {
        return U256::ZERO;
    }

    let buy = synthetic_pool(reserve0_buy, reserve1_buy);
    let sell = synthetic_pool(reserve0_sell, reserve1_sell);

    // Ternary search over [0, seed]; 48 halvings of the bracket by 2/3
    // push the interval far below one base unit.
    let mut lo = 0.0f64;
    let mut hi = seed * NORM;
    for _ in 0..48 {
        let third = (hi - lo) / 3.0;
        let m1 = lo + third;
        let m2 = hi - third;
        let p1 = calculate_arbitrage_profit(&buy, &sell, &U256::from_f64(m1));
        let p2 = calculate_arbitrage_profit(&buy, &sell, &U256::from_f64(m2));
        if p1 < p2 {
            lo = m1;
        } else {
            hi = m2;
        }
    }

    let best = U256::from_f64((lo + hi) / 2.0);
    if calculate_arbitrage_profit(&buy, &sell, &best).is_zero() {
        U256::ZERO
    } else {
        best
    }
}

/// Reserves-only snapshot for sizing simulations.
fn synthetic_pool(reserve0: &U256, reserve1: &U256) -> PoolReserves {
    PoolReserves::new(*reserve0, *reserve1, 0, 0, 0, 0, 0, 18, 18)
}

#[cfg(test)]
mod tests {
    use super::*;

    const E18: u64 = PRICE_PRECISION;

    fn pool(reserve0: u64, reserve1: u64) -> PoolReserves {
        PoolReserves::new(U256::from(reserve0), U256::from(reserve1), 0, 0, 0, 1, 2, 18, 18)
    }

    #[test]
    fn swap_output_is_in_expected_range() {
        // r_in = 1e18, r_out = 2e18, a_in = 1e17
        let out = calculate_swap_output(
            &U256::from(E18),
            &U256::from(2 * E18),
            &U256::from(E18 / 10),
        );
        assert!(out > U256::from(15 * E18 / 100));
        assert!(out < U256::from(2 * E18 / 10));
    }

    #[test]
    fn swap_degenerate_inputs_yield_zero() {
        let r = U256::from(E18);
        assert!(calculate_swap_output(&U256::ZERO, &r, &r).is_zero());
        assert!(calculate_swap_output(&r, &r, &U256::ZERO).is_zero());
        assert!(calculate_swap_output(&r, &U256::ZERO, &r).is_zero());
    }

    #[test]
    fn swap_output_is_monotone_in_input() {
        let r_in = U256::from(E18);
        let r_out = U256::from(3 * E18);
        let mut last = U256::ZERO;
        for step in 1..50u64 {
            let out = calculate_swap_output(&r_in, &r_out, &U256::from(step * (E18 / 100)));
            assert!(out >= last);
            last = out;
        }
        // Output approaches but never reaches the output reserve.
        assert!(last < r_out);
    }

    #[test]
    fn swap_output_survives_wide_reserves() {
        // 128-bit scale reserves force the widening path.
        let r_in = U256::from_u128(1u128 << 100);
        let r_out = U256::from_u128(3u128 << 100);
        let a_in = U256::from_u128(1u128 << 90);
        let out = calculate_swap_output(&r_in, &r_out, &a_in);
        // Small trade: out ~= a_in * 3 * 0.997
        let expected = 3.0 * 0.997 * (1u128 << 90) as f64;
        assert!((out.to_f64() - expected).abs() < expected * 2e-3);
    }

    #[test]
    fn wide_path_agrees_with_fast_path_at_the_boundary() {
        // Amounts small enough for u128 but with reserves near 2^64 so
        // both paths are exercised by neighbouring inputs.
        let r_in = U256::from(u64::MAX);
        let r_out = U256::from(u64::MAX / 2);
        let a = U256::from(1_000_000_007u64);
        let fast = calculate_swap_output(&r_in, &r_out, &a);
        let wide = U256::mul_div(
            &r_out,
            &a.mul_u64(997),
            &r_in.mul_u64(1000).wrapping_add(&a.mul_u64(997)),
        );
        assert_eq!(fast, wide);
    }

    #[test]
    fn slippage_is_positive_and_monotone() {
        let r_in = U256::from(E18);
        let r_out = U256::from(2 * E18);
        let mut last = 0;
        for pct in [1u64, 2, 5, 10, 20, 50] {
            let slippage = calculate_slippage_bps(&r_in, &r_out, &U256::from(E18 / 100 * pct));
            assert!(slippage > 0, "slippage must be positive, got {slippage}");
            assert!(slippage >= last);
            last = slippage;
        }
    }

    #[test]
    fn slippage_degenerate_inputs_yield_zero() {
        let r = U256::from(E18);
        assert_eq!(calculate_slippage_bps(&U256::ZERO, &r, &r), 0);
        assert_eq!(calculate_slippage_bps(&r, &r, &U256::ZERO), 0);
    }

    #[test]
    fn symmetric_pools_have_no_optimal_size() {
        let r = U256::from(E18);
        assert!(calculate_optimal_trade_size(&r, &r, &r, &r).is_zero());
    }

    #[test]
    fn dislocated_pools_have_a_profitable_optimal_size() {
        // Buy pool prices token0 at 2.0, sell pool at 2.1.
        let buy = pool(E18, 2 * E18);
        let sell = pool(E18, 2 * E18 + E18 / 10);
        let size = calculate_optimal_trade_size(
            &buy.reserve0,
            &buy.reserve1,
            &sell.reserve0,
            &sell.reserve1,
        );
        assert!(!size.is_zero());
        let profit = calculate_arbitrage_profit(&buy, &sell, &size);
        assert!(!profit.is_zero());

        // The optimum beats nearby sizes.
        let smaller = size.div_u64(2);
        let larger = size.mul_u64(2);
        assert!(calculate_arbitrage_profit(&buy, &sell, &smaller) <= profit);
        assert!(calculate_arbitrage_profit(&buy, &sell, &larger) <= profit);
    }

    #[test]
    fn round_trip_profit_is_clamped_at_zero() {
        // Balanced pools: the fee guarantees a loss, reported as zero.
        let a = pool(E18, 2 * E18);
        let b = pool(E18, 2 * E18);
        let profit = calculate_arbitrage_profit(&a, &b, &U256::from(E18 / 10));
        assert!(profit.is_zero());
    }

    #[test]
    fn profit_direction_buys_cheap_and_sells_dear() {
        let cheap = pool(E18, 2 * E18); // token0 at 2.0
        let dear = pool(E18, 3 * E18); // token0 at 3.0
        let size = U256::from(E18 / 50);
        let forward = calculate_arbitrage_profit(&cheap, &dear, &size);
        let backward = calculate_arbitrage_profit(&dear, &cheap, &size);
        assert!(!forward.is_zero());
        assert!(backward.is_zero());
    }
}
